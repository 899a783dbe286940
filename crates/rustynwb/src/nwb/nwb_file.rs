//! The root `core::NWBFile` object and the file-level builders that lay out
//! devices, electrodes and acquisition series.

use std::sync::Arc;

use tracing::{debug, info};

use crate::channel::Channel;
use crate::config::{
    ACQUISITION_PATH, CHUNK_XSIZE, DEVICES_PATH, ELECTRODES_TABLE_PATH, ELECTRODE_GROUP_PATH,
    NWB_VERSION, SPIKE_CHUNK_XSIZE,
};
use crate::error::{Error, Result};
use crate::io::{ArrayDataSetConfig, AttrValue, BaseDataType, SharedIo, StorageObjectType};
use crate::nwb::base::{NwbContainer, ProcessingModule, TimeSeriesSettings};
use crate::nwb::device::Device;
use crate::nwb::ecephys::{ElectricalSeries, ElectricalSeriesSettings, SpikeEventSeries};
use crate::nwb::file::{ElectrodeGroup, ElectrodesTable};
use crate::nwb::hdmf::typed_children;
use crate::nwb::misc::AnnotationSeries;
use crate::nwb::registry::create_typed;
use crate::nwb::{RegisteredType, TypeBase};
use crate::spec;
use crate::utils::{current_time, generate_uuid, merge_paths};

const SPECIFICATIONS_PATH: &str = "/specifications";

/// Groups every file carries.
const FILE_GROUPS: &[&str] = &[
    ACQUISITION_PATH,
    "/analysis",
    "/processing",
    "/stimulus/presentation",
    "/stimulus/templates",
    DEVICES_PATH,
    ELECTRODE_GROUP_PATH,
    SPECIFICATIONS_PATH,
];

/// Session metadata written by [`NwbFile::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NwbFileSettings {
    pub identifier: String,
    pub session_description: String,
    /// ISO 8601; the creation time when unset.
    pub session_start_time: Option<String>,
    /// ISO 8601; the session start time when unset.
    pub timestamps_reference_time: Option<String>,
}

impl Default for NwbFileSettings {
    fn default() -> Self {
        Self::new(generate_uuid())
    }
}

impl NwbFileSettings {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            session_description: "a recording session".to_string(),
            session_start_time: None,
            timestamps_reference_time: None,
        }
    }

    pub fn with_session_description(mut self, description: impl Into<String>) -> Self {
        self.session_description = description.into();
        self
    }

    pub fn with_session_start_time(mut self, time: impl Into<String>) -> Self {
        self.session_start_time = Some(time.into());
        self
    }

    pub fn with_timestamps_reference_time(mut self, time: impl Into<String>) -> Self {
        self.timestamps_reference_time = Some(time.into());
        self
    }
}

/// `core::NWBFile`: the root group of a file.
///
/// ```
/// use std::sync::Arc;
/// use rustynwb::io::{BaseDataType, BaseIo, FileMode, MemoryIo, SharedIo};
/// use rustynwb::nwb::registry::create_typed;
/// use rustynwb::nwb::{NwbFile, NwbFileSettings};
/// use rustynwb::Channel;
///
/// let io: SharedIo = Arc::new(MemoryIo::new("session.nwb"));
/// io.open(FileMode::Overwrite).unwrap();
/// let file = create_typed::<NwbFile>("/", &io);
/// file.initialize(&NwbFileSettings::new("session-1")).unwrap();
///
/// let channels = vec![Channel::new("ch0", "array0", 0, 0, 0)];
/// let series = file
///     .create_electrical_series(&[channels], BaseDataType::I16)
///     .unwrap();
/// assert_eq!(series.len(), 1);
/// ```
#[derive(Debug)]
pub struct NwbFile {
    pub(crate) nwb_container: NwbContainer,
}

fn require_modifiable(io: &SharedIo, path: &str) -> Result<()> {
    if io.can_modify_objects() {
        Ok(())
    } else {
        Err(Error::StructuralMutationDenied(path.to_string()))
    }
}

fn group_name(channels: &[Channel]) -> Result<&str> {
    channels
        .first()
        .map(|channel| channel.group_name.as_str())
        .ok_or_else(|| Error::InvalidArgument("empty channel group".to_string()))
}

impl NwbFile {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            nwb_container: NwbContainer::with_base(base),
        }
    }

    /// Lay out a new file: type attributes on the root, the standard groups,
    /// the cached schema namespaces and the session metadata datasets.
    ///
    /// Does nothing on a file that is already initialized.
    pub fn initialize(&self, settings: &NwbFileSettings) -> Result<()> {
        let io = self.io()?;
        if self.is_initialized() {
            debug!(file = io.file_name(), "file already initialized");
            return Ok(());
        }
        require_modifiable(&io, self.path())?;

        self.base().initialize_group()?;
        io.create_attribute(self.path(), "nwb_version", AttrValue::from(NWB_VERSION))?;
        for group in FILE_GROUPS {
            io.create_group(group)?;
        }
        io.create_reference_attribute(SPECIFICATIONS_PATH, self.path(), ".specloc")?;
        self.cache_specifications(&io)?;

        let now = current_time();
        let start = settings.session_start_time.clone().unwrap_or_else(|| now.clone());
        let reference = settings
            .timestamps_reference_time
            .clone()
            .unwrap_or_else(|| start.clone());
        io.create_string_array_data_set("/file_create_date", &[now])?;
        io.create_string_data_set("/session_description", &settings.session_description)?;
        io.create_string_data_set("/session_start_time", &start)?;
        io.create_string_data_set("/timestamps_reference_time", &reference)?;
        io.create_string_data_set("/identifier", &settings.identifier)?;

        info!(file = io.file_name(), identifier = %settings.identifier, "initialized NWB file");
        Ok(())
    }

    fn cache_specifications(&self, io: &SharedIo) -> Result<()> {
        for namespace in spec::namespaces().all() {
            let version_path = merge_paths(
                &merge_paths(SPECIFICATIONS_PATH, namespace.name),
                namespace.version,
            );
            io.create_group(&version_path)?;
            for (source, text) in namespace.sources {
                io.create_string_data_set(&merge_paths(&version_path, source), text)?;
            }
            debug!(namespace = namespace.name, version = namespace.version, "cached specification");
        }
        Ok(())
    }

    /// Whether the root carries the file's type tag, version and identifier.
    pub fn is_initialized(&self) -> bool {
        let Ok(io) = self.io() else {
            return false;
        };
        if !io.is_open() {
            return false;
        }
        let typed = io
            .read_string_attribute(&self.base().child_path("neurodata_type"))
            .is_ok_and(|ty| ty == <Self as crate::nwb::SchemaType>::TYPE_NAME);
        typed
            && io.attribute_exists(&self.base().child_path("nwb_version"))
            && io.get_storage_object_type("/identifier") == StorageObjectType::Dataset
            && FILE_GROUPS
                .iter()
                .all(|group| io.get_storage_object_type(group) == StorageObjectType::Group)
    }

    /// Create the device, electrode group and electrodes table entries for
    /// each channel group that does not have them yet.
    fn create_electrode_structure(&self, io: &SharedIo, arrays: &[Vec<Channel>]) -> Result<()> {
        for channels in arrays {
            let name = group_name(channels)?;
            let device = create_typed::<Device>(&merge_paths(DEVICES_PATH, name), io);
            if !device.exists() {
                device.initialize("description", "unknown")?;
            }
            let group = create_typed::<ElectrodeGroup>(&merge_paths(ELECTRODE_GROUP_PATH, name), io);
            if !group.exists() {
                group.initialize("description", "unknown", &device)?;
            }
        }

        if io.object_exists(ELECTRODES_TABLE_PATH) {
            return Ok(());
        }
        let table = create_typed::<ElectrodesTable>(ELECTRODES_TABLE_PATH, io);
        table.initialize("metadata about extracellular electrodes")?;
        for channels in arrays {
            table.add_electrodes(channels)?;
        }
        table.finalize()
    }

    /// Create one `ElectricalSeries` per channel group under `/acquisition`,
    /// named after the group, and return their recording-object indices.
    ///
    /// Missing devices, electrode groups and the electrodes table are created
    /// first. An existing electrodes table is left as is; every channel's
    /// global index must then already be one of its rows.
    pub fn create_electrical_series(
        &self,
        arrays: &[Vec<Channel>],
        data_type: BaseDataType,
    ) -> Result<Vec<usize>> {
        let io = self.io()?;
        require_modifiable(&io, ACQUISITION_PATH)?;
        self.create_electrode_structure(&io, arrays)?;

        let settings = ElectricalSeriesSettings::new();
        let mut indices = Vec::with_capacity(arrays.len());
        for channels in arrays {
            let path = merge_paths(ACQUISITION_PATH, group_name(channels)?);
            let series = create_typed::<ElectricalSeries>(&path, &io);
            let config = ArrayDataSetConfig::new(
                data_type,
                vec![0, channels.len()],
                vec![CHUNK_XSIZE, 0],
            );
            series.initialize(config, channels, &settings)?;
            indices.push(io.recording_objects().add(series));
        }
        Ok(indices)
    }

    /// Create one `SpikeEventSeries` per channel group under `/acquisition`,
    /// each event holding `samples_per_event` samples per channel.
    pub fn create_spike_event_series(
        &self,
        arrays: &[Vec<Channel>],
        samples_per_event: usize,
        data_type: BaseDataType,
    ) -> Result<Vec<usize>> {
        let io = self.io()?;
        require_modifiable(&io, ACQUISITION_PATH)?;
        if samples_per_event == 0 {
            return Err(Error::InvalidArgument(
                "spike events need at least one sample".to_string(),
            ));
        }
        self.create_electrode_structure(&io, arrays)?;

        let settings = ElectricalSeriesSettings::new().with_series(
            TimeSeriesSettings::new()
                .with_description("Stores spike waveforms from an extracellular ephys recording"),
        );
        let mut indices = Vec::with_capacity(arrays.len());
        for channels in arrays {
            let path = merge_paths(ACQUISITION_PATH, group_name(channels)?);
            let (shape, chunking) = match channels.len() {
                1 => (
                    vec![0, samples_per_event],
                    vec![SPIKE_CHUNK_XSIZE, samples_per_event],
                ),
                n => (
                    vec![0, n, samples_per_event],
                    vec![SPIKE_CHUNK_XSIZE, n, samples_per_event],
                ),
            };
            let series = create_typed::<SpikeEventSeries>(&path, &io);
            series.initialize(
                ArrayDataSetConfig::new(data_type, shape, chunking),
                channels,
                &settings,
            )?;
            indices.push(io.recording_objects().add(series));
        }
        Ok(indices)
    }

    /// Create an empty `AnnotationSeries` at `/acquisition/<name>`.
    pub fn create_annotation_series(&self, name: &str) -> Result<usize> {
        let io = self.io()?;
        require_modifiable(&io, ACQUISITION_PATH)?;
        let series = create_typed::<AnnotationSeries>(&merge_paths(ACQUISITION_PATH, name), &io);
        series.initialize(
            "Stores user annotations made during an experiment",
            "no comments",
            CHUNK_XSIZE,
        )?;
        Ok(io.recording_objects().add(series))
    }

    /// Create and initialize a processing module at `/processing/<name>`.
    pub fn create_processing_module(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<ProcessingModule>> {
        let io = self.io()?;
        let module = create_typed::<ProcessingModule>(&merge_paths("/processing", name), &io);
        module.initialize(description)?;
        Ok(module)
    }

    /// Typed objects in `/acquisition`.
    pub fn acquisition(&self) -> Result<Vec<Arc<dyn RegisteredType>>> {
        typed_children(&self.io()?, ACQUISITION_PATH)
    }

    /// Devices in `/general/devices`.
    pub fn devices(&self) -> Result<Vec<Arc<dyn RegisteredType>>> {
        typed_children(&self.io()?, DEVICES_PATH)
    }
}

deref_to!(NwbFile => NwbContainer, nwb_container);
impl_registered_type!(NwbFile, "core", "NWBFile", base = nwb_container.container.base);

define_fields! {
    NwbFile {
        attribute nwb_version: String = "nwb_version", "Version of the NWB schema the file follows.";
        dataset identifier: String = "identifier", "Unique identifier of the file.";
        dataset session_description: String = "session_description", "Description of the recording session.";
        dataset session_start_time: String = "session_start_time", "Start of the session, ISO 8601.";
        dataset timestamps_reference_time: String = "timestamps_reference_time", "Time all timestamps are relative to, ISO 8601.";
        dataset file_create_date: String = "file_create_date", "Times the file was created or modified.";
        registered electrodes_table: ElectrodesTable = "general/extracellular_ephys/electrodes", "Table of recorded electrodes.";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BaseIo, FileMode, MemoryIo};
    use crate::nwb::registry;

    fn open_file() -> (SharedIo, Arc<NwbFile>) {
        let io: SharedIo = Arc::new(MemoryIo::new("file.nwb"));
        io.open(FileMode::Overwrite).unwrap();
        let file = create_typed::<NwbFile>("/", &io);
        file.initialize(&NwbFileSettings::new("abc")).unwrap();
        (io, file)
    }

    fn arrays() -> Vec<Vec<Channel>> {
        vec![
            (0..2).map(|i| Channel::new(format!("a{i}"), "array0", 0, i, i)).collect(),
            (0..3).map(|i| Channel::new(format!("b{i}"), "array1", 1, i, i + 2)).collect(),
        ]
    }

    #[test]
    fn initialize_lays_out_file() {
        let (io, file) = open_file();
        assert!(file.is_initialized());
        assert_eq!(file.identifier().values().unwrap().data(), &["abc".to_string()]);
        assert_eq!(file.nwb_version().values().unwrap().data(), &[NWB_VERSION.to_string()]);
        assert_eq!(
            file.session_description().values().unwrap().data(),
            &["a recording session".to_string()]
        );
        assert_eq!(
            file.session_start_time().values().unwrap().data(),
            file.timestamps_reference_time().values().unwrap().data()
        );
        assert_eq!(file.file_create_date().values().unwrap().len(), 1);
        assert_eq!(io.read_reference_attribute("/.specloc").unwrap(), SPECIFICATIONS_PATH);
        assert_eq!(
            io.get_storage_object_type("/specifications/core/2.8.0/namespace"),
            StorageObjectType::Dataset
        );
        assert_eq!(
            io.get_storage_object_type("/specifications/hdmf-common/1.8.0/table"),
            StorageObjectType::Dataset
        );
        assert_eq!(
            io.get_storage_object_type("/stimulus/templates"),
            StorageObjectType::Group
        );
    }

    #[test]
    fn initialize_twice_is_a_no_op() {
        let (_io, file) = open_file();
        file.initialize(&NwbFileSettings::new("other")).unwrap();
        assert_eq!(file.identifier().values().unwrap().data(), &["abc".to_string()]);
    }

    #[test]
    fn uninitialized_file() {
        let io: SharedIo = Arc::new(MemoryIo::new("empty.nwb"));
        let file = create_typed::<NwbFile>("/", &io);
        assert!(!file.is_initialized());

        io.open(FileMode::Overwrite).unwrap();
        assert!(!file.is_initialized());
        io.close().unwrap();
    }

    #[test]
    fn settings_builders() {
        let settings = NwbFileSettings::new("id")
            .with_session_description("sleep")
            .with_session_start_time("2024-01-01T00:00:00+00:00")
            .with_timestamps_reference_time("2024-01-01T00:00:01+00:00");
        assert_eq!(settings.session_description, "sleep");
        assert_eq!(settings.session_start_time.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_ne!(NwbFileSettings::default().identifier, NwbFileSettings::default().identifier);
    }

    #[test]
    fn electrical_series_per_group() {
        let (io, file) = open_file();
        let indices = file.create_electrical_series(&arrays(), BaseDataType::I16).unwrap();
        assert_eq!(indices.len(), 2);

        let first = registry::downcast::<ElectricalSeries>(
            io.recording_objects().get(indices[0]).unwrap(),
        )
        .unwrap();
        assert_eq!(first.path(), "/acquisition/array0");
        assert_eq!(first.data().shape().unwrap(), vec![0, 2]);
        let second = registry::downcast::<ElectricalSeries>(
            io.recording_objects().get(indices[1]).unwrap(),
        )
        .unwrap();
        assert_eq!(second.electrodes_index().values().unwrap().data(), &[2, 3, 4]);

        let table = file.electrodes_table().unwrap();
        assert_eq!(table.num_rows().unwrap(), 5);
        assert_eq!(file.devices().unwrap().len(), 2);
        let names: Vec<_> = file
            .acquisition()
            .unwrap()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(names, ["array0", "array1"]);
        assert!(io.is_link("/general/extracellular_ephys/array0/device"));
    }

    #[test]
    fn existing_electrodes_table_is_reused() {
        let (io, file) = open_file();
        let arrays = arrays();
        file.create_electrical_series(&arrays[..1], BaseDataType::F32).unwrap();
        // rows 2..5 were never added to the table
        assert!(matches!(
            file.create_electrical_series(&arrays[1..], BaseDataType::F32),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(file.electrodes_table().unwrap().num_rows().unwrap(), 2);
        assert!(io.object_exists("/general/devices/array1"));
    }

    #[test]
    fn spike_and_annotation_series() {
        let (io, file) = open_file();
        let arrays = vec![
            vec![Channel::new("s0", "single", 0, 0, 0)],
            (0..4).map(|i| Channel::new(format!("t{i}"), "tetrode", 1, i, i + 1)).collect(),
        ];
        let indices = file
            .create_spike_event_series(&arrays, 32, BaseDataType::I16)
            .unwrap();
        let single = io.recording_objects().get(indices[0]).unwrap();
        assert_eq!(single.type_name(), "SpikeEventSeries");
        assert_eq!(io.get_storage_object_shape("/acquisition/single/data").unwrap(), vec![0, 32]);
        assert_eq!(
            io.get_storage_object_shape("/acquisition/tetrode/data").unwrap(),
            vec![0, 4, 32]
        );
        assert!(file.create_spike_event_series(&arrays, 0, BaseDataType::I16).is_err());

        let notes = file.create_annotation_series("notes").unwrap();
        assert_eq!(io.recording_objects().get(notes).unwrap().path(), "/acquisition/notes");
    }

    #[test]
    fn empty_channel_group_rejected() {
        let (_io, file) = open_file();
        assert!(matches!(
            file.create_electrical_series(&[Vec::new()], BaseDataType::F32),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn structure_frozen_while_recording() {
        let (io, file) = open_file();
        io.start_recording().unwrap();
        assert!(matches!(
            file.create_electrical_series(&arrays(), BaseDataType::I16),
            Err(Error::StructuralMutationDenied(_))
        ));
        assert!(matches!(
            file.create_annotation_series("notes"),
            Err(Error::StructuralMutationDenied(_))
        ));
    }

    #[test]
    fn processing_module_created() {
        let (_io, file) = open_file();
        let module = file.create_processing_module("ecephys", "spike sorting").unwrap();
        assert_eq!(module.path(), "/processing/ecephys");
        assert!(module.exists());
    }
}

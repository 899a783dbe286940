//! In-process storage backend.
//!
//! [`MemoryIo`] implements [`BaseIo`] over a [`MemoryStore`]: a hierarchy of
//! groups, extendable datasets, attributes, soft links and object references
//! with the same recording rules a SWMR-capable file has. A store can be
//! shared between IO instances to reopen what a writer produced.
//!
//! ```
//! use rustynwb::io::{BaseIo, FileMode, MemoryIo};
//!
//! let io = MemoryIo::new("session.nwb");
//! io.open(FileMode::Overwrite).unwrap();
//! io.create_group("/acquisition").unwrap();
//! io.start_recording().unwrap();
//! assert!(!io.can_modify_objects());
//! assert!(io.create_group("/analysis").is_err());
//! io.stop_recording().unwrap();
//! assert!(!io.is_open());
//! ```

mod recording_data;
mod store;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

pub use store::MemoryStore;

use crate::config::IoConfig;
use crate::error::{Error, Result};
use crate::io::base::BaseIo;
use crate::io::data_block::{DataBlockGeneric, DataValues};
use crate::io::data_type::BaseDataType;
use crate::io::recording_data::RecordingData;
use crate::io::recording_objects::RecordingObjects;
use crate::io::selection::Selection;
use crate::io::types::{ArrayDataSetConfig, AttrValue, FileMode, RecordState, StorageObjectType};
use recording_data::MemoryRecordingData;
use store::{normalize, ObjectKind, StoredDataset};

/// Open/recording state of one IO instance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Session {
    pub(crate) mode: Option<FileMode>,
    pub(crate) state: RecordState,
}

/// Storage backend holding the file contents in memory.
pub struct MemoryIo {
    file_name: String,
    config: IoConfig,
    store: Arc<MemoryStore>,
    session: Arc<RwLock<Session>>,
    recording_objects: RecordingObjects,
}

impl MemoryIo {
    /// A closed IO over a fresh, empty store.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self::with_store(file_name, Arc::new(MemoryStore::new()))
    }

    /// A closed IO over an existing store, e.g. to reopen a written file.
    pub fn with_store(file_name: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        Self {
            file_name: file_name.into(),
            config: IoConfig::default(),
            store,
            session: Arc::new(RwLock::new(Session {
                mode: None,
                state: RecordState::Closed,
            })),
            recording_objects: RecordingObjects::new(),
        }
    }

    /// Replace the backend options. Takes effect on the next transition.
    pub fn with_config(mut self, config: IoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    /// The store this IO reads and writes.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Chunk shape a dataset was created with.
    pub fn chunking(&self, path: &str) -> Result<Vec<usize>> {
        Ok(self.store.inner.read().dataset(path)?.chunking.clone())
    }

    fn require_open(&self) -> Result<Session> {
        let session = *self.session.read();
        if session.mode.is_none() {
            return Err(Error::NotOpen(self.file_name.clone()));
        }
        Ok(session)
    }

    /// Fail unless structure may change right now.
    fn require_mutable(&self, path: &str) -> Result<()> {
        self.require_open()?;
        if !self.can_modify_objects() {
            return Err(Error::StructuralMutationDenied(normalize(path)));
        }
        Ok(())
    }

    fn release_writer(&self, mode: Option<FileMode>) {
        if matches!(mode, Some(FileMode::Overwrite | FileMode::ReadWrite)) {
            self.store.inner.write().writer_attached = false;
        }
    }
}

impl fmt::Debug for MemoryIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = *self.session.read();
        f.debug_struct("MemoryIo")
            .field("file_name", &self.file_name)
            .field("mode", &session.mode)
            .field("state", &session.state)
            .field("recording_objects", &self.recording_objects.len())
            .finish()
    }
}

impl Drop for MemoryIo {
    fn drop(&mut self) {
        let mode = self.session.read().mode;
        self.release_writer(mode);
    }
}

impl BaseIo for MemoryIo {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn file_mode(&self) -> Option<FileMode> {
        self.session.read().mode
    }

    fn record_state(&self) -> RecordState {
        self.session.read().state
    }

    fn open(&self, mode: FileMode) -> Result<()> {
        let mut session = self.session.write();
        if session.mode.is_some() {
            return Err(Error::AlreadyOpen(self.file_name.clone()));
        }
        {
            let mut inner = self.store.inner.write();
            if mode != FileMode::ReadOnly && inner.writer_attached {
                return Err(Error::AlreadyOpen(format!(
                    "{}: another writer is attached",
                    self.file_name
                )));
            }
            match mode {
                FileMode::Overwrite => inner.truncate(),
                FileMode::ReadWrite | FileMode::ReadOnly if !inner.exists => {
                    return Err(Error::ObjectNotFound(self.file_name.clone()));
                }
                _ => {}
            }
            if mode != FileMode::ReadOnly {
                inner.writer_attached = true;
            }
        }
        session.mode = Some(mode);
        session.state = RecordState::Open;
        info!(file = %self.file_name, ?mode, "opened file");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mode = {
            let mut session = self.session.write();
            let Some(mode) = session.mode.take() else {
                return Ok(());
            };
            session.state = RecordState::Closed;
            mode
        };
        self.recording_objects.clear_recording_data_cache();
        self.recording_objects.clear();
        self.release_writer(Some(mode));
        info!(file = %self.file_name, "closed file");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.require_open()?;
        debug!(file = %self.file_name, "flushed file");
        Ok(())
    }

    fn can_modify_objects(&self) -> bool {
        let session = *self.session.read();
        match session.mode {
            None | Some(FileMode::ReadOnly) => false,
            Some(_) => session.state != RecordState::Recording || self.config.disable_swmr_mode,
        }
    }

    fn start_recording(&self) -> Result<()> {
        let session = self.require_open()?;
        if session.mode == Some(FileMode::ReadOnly) {
            return Err(Error::ReadOnly(self.file_name.clone()));
        }
        if session.state == RecordState::Recording {
            return Ok(());
        }
        let finalized = self.recording_objects.finalize();
        if let Err(e) = &finalized {
            warn!(file = %self.file_name, error = %e, "entering recording with unfinalized objects");
        }
        self.session.write().state = RecordState::Recording;
        info!(
            file = %self.file_name,
            swmr = !self.config.disable_swmr_mode,
            "started recording"
        );
        finalized
    }

    fn stop_recording(&self) -> Result<()> {
        self.require_open()?;
        let finalized = self.recording_objects.finalize();
        info!(file = %self.file_name, "stopped recording");
        if self.config.disable_swmr_mode {
            self.flush()?;
            self.session.write().state = RecordState::Open;
        } else {
            self.close()?;
        }
        finalized
    }

    fn recording_objects(&self) -> &RecordingObjects {
        &self.recording_objects
    }

    fn create_group(&self, path: &str) -> Result<()> {
        self.require_mutable(path)?;
        self.store.inner.write().ensure_group(path)?;
        Ok(())
    }

    fn create_attribute(&self, path: &str, name: &str, value: AttrValue) -> Result<()> {
        self.require_mutable(path)?;
        self.store.inner.write().set_attribute(path, name, value)
    }

    fn create_array_data_set(
        &self,
        config: &ArrayDataSetConfig,
        path: &str,
    ) -> Result<Arc<dyn RecordingData>> {
        self.require_mutable(path)?;
        let chunking = if config.chunking.is_empty() {
            self.config.default_chunking.clone()
        } else {
            config.chunking.clone()
        };
        let dataset = StoredDataset {
            data_type: config.data_type,
            shape: config.shape.clone(),
            chunking,
            values: DataValues::zeros(
                config.data_type.element_type(),
                config.shape.iter().product(),
            ),
        };
        let stored_at = self.store.inner.write().insert_dataset(path, dataset)?;
        debug!(path = %stored_at, data_type = %config.data_type, shape = ?config.shape, "created array dataset");
        Ok(Arc::new(MemoryRecordingData::new(
            stored_at,
            Arc::clone(&self.store),
            Arc::clone(&self.session),
            config.shape.len(),
        )))
    }

    fn create_data_set(&self, path: &str, block: DataBlockGeneric) -> Result<()> {
        self.require_mutable(path)?;
        let data_type = block.base_data_type();
        let (values, shape) = block.into_parts();
        let dataset = StoredDataset {
            data_type,
            chunking: Vec::new(),
            shape,
            values,
        };
        self.store.inner.write().insert_dataset(path, dataset)?;
        Ok(())
    }

    fn create_link(&self, path: &str, target: &str) -> Result<()> {
        self.require_mutable(path)?;
        self.store.inner.write().insert_link(path, target)
    }

    fn create_reference_data_set(&self, path: &str, targets: &[String]) -> Result<()> {
        self.require_mutable(path)?;
        let mut inner = self.store.inner.write();
        if let Some(missing) = targets.iter().find(|t| inner.resolve(t).is_none()) {
            return Err(Error::ObjectNotFound(missing.clone()));
        }
        let dataset = StoredDataset {
            data_type: BaseDataType::VarStr,
            chunking: Vec::new(),
            shape: vec![targets.len()],
            values: DataValues::Str(targets.iter().map(|t| normalize(t)).collect()),
        };
        inner.insert_dataset(path, dataset)?;
        Ok(())
    }

    fn read_attribute(&self, path: &str) -> Result<DataBlockGeneric> {
        self.require_open()?;
        let inner = self.store.inner.read();
        let attribute = inner.attribute(path)?;
        DataBlockGeneric::new(attribute.values.clone(), attribute.shape.clone())
    }

    fn read_reference_attribute(&self, path: &str) -> Result<String> {
        self.require_open()?;
        let inner = self.store.inner.read();
        let attribute = inner.attribute(path)?;
        match (&attribute.values, attribute.is_reference) {
            (DataValues::Str(targets), true) if targets.len() == 1 => Ok(targets[0].clone()),
            _ => Err(Error::InvalidArgument(format!(
                "{}: attribute is not an object reference",
                normalize(path)
            ))),
        }
    }

    fn read_dataset(&self, path: &str, selection: &Selection) -> Result<DataBlockGeneric> {
        self.require_open()?;
        self.store.inner.read().read_dataset(path, selection)
    }

    fn object_exists(&self, path: &str) -> bool {
        self.is_open() && self.store.inner.read().get(path).is_some()
    }

    fn attribute_exists(&self, path: &str) -> bool {
        self.is_open() && self.store.inner.read().attribute(path).is_ok()
    }

    fn is_link(&self, path: &str) -> bool {
        self.is_open() && self.store.inner.read().is_link(path)
    }

    fn get_storage_object_type(&self, path: &str) -> StorageObjectType {
        if !self.is_open() {
            return StorageObjectType::Undefined;
        }
        self.store.inner.read().object_type(path)
    }

    fn get_storage_objects(
        &self,
        path: &str,
        filter: StorageObjectType,
    ) -> Result<Vec<(String, StorageObjectType)>> {
        self.require_open()?;
        self.store.inner.read().children(path, filter)
    }

    fn get_storage_object_shape(&self, path: &str) -> Result<Vec<usize>> {
        self.require_open()?;
        let inner = self.store.inner.read();
        if let Ok(dataset) = inner.dataset(path) {
            return Ok(dataset.shape.clone());
        }
        Ok(inner.attribute(path)?.shape.clone())
    }

    fn get_storage_object_data_type(&self, path: &str) -> Result<BaseDataType> {
        self.require_open()?;
        let inner = self.store.inner.read();
        if let Ok(dataset) = inner.dataset(path) {
            return Ok(dataset.data_type);
        }
        Ok(BaseDataType::from(inner.attribute(path)?.values.element_type()))
    }

    fn get_data_set(&self, path: &str) -> Result<Arc<dyn RecordingData>> {
        self.require_open()?;
        let inner = self.store.inner.read();
        let resolved = inner
            .resolve(path)
            .ok_or_else(|| Error::ObjectNotFound(path.to_string()))?;
        let rank = match inner.objects.get(&resolved).map(|o| &o.kind) {
            Some(ObjectKind::Dataset(dataset)) => dataset.shape.len(),
            _ => return Err(Error::ObjectNotFound(path.to_string())),
        };
        if inner.is_link(path) {
            return Err(Error::DatasetNotWritable(normalize(path)));
        }
        Ok(Arc::new(MemoryRecordingData::new(
            resolved,
            Arc::clone(&self.store),
            Arc::clone(&self.session),
            rank,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::data_block::DataRef;
    use std::collections::HashSet;

    fn open_io() -> MemoryIo {
        let io = MemoryIo::new("test.nwb");
        io.open(FileMode::Overwrite).unwrap();
        io
    }

    // ---------------------------------------------------------------------
    // lifecycle
    // ---------------------------------------------------------------------

    #[test]
    fn open_twice_fails() {
        let io = open_io();
        assert_eq!(
            io.open(FileMode::Overwrite).unwrap_err(),
            Error::AlreadyOpen("test.nwb".into())
        );
    }

    #[test]
    fn close_is_idempotent() {
        let io = open_io();
        io.close().unwrap();
        io.close().unwrap();
        assert_eq!(io.record_state(), RecordState::Closed);
    }

    #[test]
    fn read_only_requires_existing_store() {
        let io = MemoryIo::new("missing.nwb");
        assert!(io.open(FileMode::ReadOnly).is_err());
        assert!(io.open(FileMode::ReadWrite).is_err());
    }

    #[test]
    fn single_writer_per_store() {
        let writer = open_io();
        let second = MemoryIo::with_store("test.nwb", writer.store());
        assert!(second.open(FileMode::ReadWrite).is_err());

        let reader = MemoryIo::with_store("test.nwb", writer.store());
        reader.open(FileMode::ReadOnly).unwrap();
        assert!(!reader.can_modify_objects());
        assert!(reader.create_group("/x").is_err());

        writer.close().unwrap();
        second.open(FileMode::ReadWrite).unwrap();
    }

    #[test]
    fn recording_freezes_structure() {
        let io = open_io();
        assert!(io.can_modify_objects());
        io.create_group("/before").unwrap();

        io.start_recording().unwrap();
        assert!(!io.can_modify_objects());
        assert_eq!(
            io.create_group("/after").unwrap_err(),
            Error::StructuralMutationDenied("/after".into())
        );
        assert!(io
            .create_attribute("/before", "x", AttrValue::from("y"))
            .is_err());

        io.stop_recording().unwrap();
        assert!(!io.is_open());
    }

    #[test]
    fn appends_allowed_while_recording() {
        let io = open_io();
        let config = ArrayDataSetConfig::new(BaseDataType::I16, vec![0], vec![8]);
        let handle = io.create_array_data_set(&config, "/data").unwrap();
        io.start_recording().unwrap();
        handle
            .write_data_block(&[3], &[0], DataRef::I16(&[1, 2, 3]))
            .unwrap();
        assert_eq!(handle.shape(), vec![3]);
        assert_eq!(handle.position(), vec![3]);
        let block = io.read_dataset("/data", &Selection::All).unwrap();
        assert_eq!(block.data(), &DataValues::I16(vec![1, 2, 3]));
    }

    #[test]
    fn disabled_swmr_returns_to_open() {
        let io = MemoryIo::new("test.nwb").with_config(IoConfig::new().disable_swmr_mode());
        io.open(FileMode::Overwrite).unwrap();
        io.start_recording().unwrap();
        assert!(io.can_modify_objects());
        io.stop_recording().unwrap();
        assert_eq!(io.record_state(), RecordState::Open);
        io.start_recording().unwrap();
        assert_eq!(io.record_state(), RecordState::Recording);
    }

    #[test]
    fn handle_fails_after_close() {
        let io = open_io();
        let config = ArrayDataSetConfig::new(BaseDataType::F32, vec![0], vec![]);
        let handle = io.create_array_data_set(&config, "/data").unwrap();
        io.close().unwrap();
        assert!(handle
            .write_data_block(&[1], &[0], DataRef::F32(&[1.0]))
            .is_err());
    }

    // ---------------------------------------------------------------------
    // objects
    // ---------------------------------------------------------------------

    #[test]
    fn default_chunking_applies() {
        let io = open_io();
        let config = ArrayDataSetConfig::new(BaseDataType::F32, vec![0], vec![]);
        io.create_array_data_set(&config, "/data").unwrap();
        assert_eq!(io.chunking("/data").unwrap(), vec![crate::config::CHUNK_XSIZE]);
    }

    #[test]
    fn attributes_read_back() {
        let io = open_io();
        io.create_group("/g").unwrap();
        io.create_attribute("/g", "rate", AttrValue::f32(30000.0)).unwrap();
        io.create_attribute("/g", "names", AttrValue::StringArray(vec!["a".into(), "b".into()]))
            .unwrap();

        let rate = io.read_attribute("/g/rate").unwrap();
        assert!(rate.shape().is_empty());
        assert_eq!(rate.data(), &DataValues::F32(vec![30000.0]));
        let names = io.read_attribute("/g/names").unwrap();
        assert_eq!(names.shape(), &[2]);
        assert!(io.attribute_exists("/g/rate"));
        assert!(!io.attribute_exists("/g/missing"));
        assert_eq!(io.get_storage_object_type("/g/rate"), StorageObjectType::Attribute);
        assert_eq!(io.get_storage_object_shape("/g/names").unwrap(), vec![2]);
    }

    #[test]
    fn references() {
        let io = open_io();
        io.create_group("/target").unwrap();
        io.create_group("/holder").unwrap();
        io.create_reference_attribute("/target", "/holder", "table").unwrap();
        assert_eq!(io.read_reference_attribute("/holder/table").unwrap(), "/target");

        io.create_reference_data_set("/holder/refs", &["/target".to_string()])
            .unwrap();
        let refs = io.read_dataset("/holder/refs", &Selection::All).unwrap();
        assert_eq!(refs.as_strings().unwrap(), ["/target".to_string()]);

        assert!(io
            .create_reference_data_set("/holder/bad", &["/nowhere".to_string()])
            .is_err());
        io.create_attribute("/holder", "plain", AttrValue::from("/target")).unwrap();
        assert!(io.read_reference_attribute("/holder/plain").is_err());
    }

    #[test]
    fn linked_dataset_is_read_only_through_link() {
        let io = open_io();
        let config = ArrayDataSetConfig::new(BaseDataType::I32, vec![2], vec![]);
        let handle = io.create_array_data_set(&config, "/source").unwrap();
        handle.write_data_block(&[2], &[0], DataRef::I32(&[4, 5])).unwrap();
        io.create_link("/alias", "/source").unwrap();

        assert!(io.is_link("/alias"));
        let block = io.read_dataset("/alias", &Selection::All).unwrap();
        assert_eq!(block.data(), &DataValues::I32(vec![4, 5]));
        assert!(matches!(
            io.get_data_set("/alias").unwrap_err(),
            Error::DatasetNotWritable(_)
        ));
    }

    #[test]
    fn find_types_stops_on_match() {
        let io = open_io();
        for path in ["/a", "/a/b", "/c"] {
            io.create_group(path).unwrap();
        }
        io.create_common_nwb_attributes("/a", "core", "TimeSeries").unwrap();
        io.create_common_nwb_attributes("/a/b", "core", "TimeSeries").unwrap();
        io.create_common_nwb_attributes("/c", "core", "Device").unwrap();

        let types: HashSet<String> = ["core::TimeSeries".to_string()].into();
        let found = io
            .find_types("/", &types, crate::io::SearchMode::StopOnType, false)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["/a"], "core::TimeSeries");

        let found = io
            .find_types("/", &types, crate::io::SearchMode::ContinueOnType, false)
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = io
            .find_types("/a", &HashSet::new(), crate::io::SearchMode::StopOnType, true)
            .unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["/a/b"]);
    }

    #[test]
    fn slice_read_through_args() {
        let io = open_io();
        let config = ArrayDataSetConfig::new(BaseDataType::I32, vec![10], vec![]);
        let handle = io.create_array_data_set(&config, "/x").unwrap();
        let values: Vec<i32> = (1..=10).collect();
        handle
            .write_data_block(&[10], &[0], DataRef::I32(&values))
            .unwrap();
        let block = io.read_dataset_args("/x", &[2], &[3], &[], &[]).unwrap();
        assert_eq!(block.shape(), &[3]);
        assert_eq!(block.data(), &DataValues::I32(vec![3, 4, 5]));
    }
}

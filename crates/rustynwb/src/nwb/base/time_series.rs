use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{
    ArrayDataSetConfig, AttrValue, BaseDataType, DataBlockGeneric, DataSetConfig, DataValues,
    Element, Untyped,
};
use crate::nwb::base::NwbDataInterface;
use crate::nwb::{RegisteredType, TypeBase};

/// How values between samples are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuity {
    Continuous,
    Instantaneous,
    Step,
}

impl Continuity {
    pub fn as_str(self) -> &'static str {
        match self {
            Continuity::Continuous => "continuous",
            Continuity::Instantaneous => "instantaneous",
            Continuity::Step => "step",
        }
    }
}

impl fmt::Display for Continuity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where sample times come from. A series has exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBase {
    /// One timestamp per sample in a `timestamps` dataset.
    Timestamps,
    /// Regular sampling from `start` seconds at `rate` Hz.
    StartingTime { start: f64, rate: f32 },
}

/// Metadata written by [`TimeSeries::initialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesSettings {
    pub unit: String,
    pub description: String,
    pub comments: String,
    /// Scale from stored values to `unit`.
    pub conversion: f32,
    /// Smallest meaningful difference between values; -1 if unknown.
    pub resolution: f32,
    /// Added to scaled values to get `unit`.
    pub offset: f32,
    pub continuity: Option<Continuity>,
    pub time_base: TimeBase,
    /// Meaning of each `control` value; a `control` dataset is created only
    /// when this is non-empty.
    pub control_description: Vec<String>,
}

impl Default for TimeSeriesSettings {
    fn default() -> Self {
        Self {
            unit: "unknown".to_string(),
            description: "no description".to_string(),
            comments: "no comments".to_string(),
            conversion: 1.0,
            resolution: -1.0,
            offset: 0.0,
            continuity: None,
            time_base: TimeBase::Timestamps,
            control_description: Vec::new(),
        }
    }
}

impl TimeSeriesSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    pub fn with_conversion(mut self, conversion: f32) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_continuity(mut self, continuity: Continuity) -> Self {
        self.continuity = Some(continuity);
        self
    }

    /// Use regular sampling instead of per-sample timestamps.
    pub fn with_starting_time(mut self, start: f64, rate: f32) -> Self {
        self.time_base = TimeBase::StartingTime { start, rate };
        self
    }

    pub fn with_control_description(mut self, control_description: Vec<String>) -> Self {
        self.control_description = control_description;
        self
    }

    /// A starting time must be non-negative and the rate positive.
    pub fn validate(&self) -> Result<()> {
        if let TimeBase::StartingTime { start, rate } = self.time_base {
            if !(start.is_finite() && start >= 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "starting time must be >= 0, got {start}"
                )));
            }
            if !(rate.is_finite() && rate > 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "sampling rate must be > 0, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

/// `core::TimeSeries`: values sampled over time.
#[derive(Debug)]
pub struct TimeSeries {
    pub(crate) interface: NwbDataInterface,
}

impl TimeSeries {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            interface: NwbDataInterface::with_base(base),
        }
    }

    /// Create the series group, its `data` dataset (or link), the time base
    /// and the optional control datasets.
    ///
    /// Data attributes are not written through a link; the linked dataset
    /// already carries them.
    pub fn initialize(
        &self,
        data: impl Into<DataSetConfig>,
        settings: &TimeSeriesSettings,
    ) -> Result<()> {
        settings.validate()?;
        let base = self.base();
        base.initialize_group()?;
        let io = self.io()?;
        io.create_attribute(self.path(), "description", AttrValue::from(settings.description.as_str()))?;
        io.create_attribute(self.path(), "comments", AttrValue::from(settings.comments.as_str()))?;

        let data_path = base.child_path("data");
        let (shape, chunking) = match data.into() {
            DataSetConfig::Array(config) => {
                base.create_array("data", &config)?;
                io.create_attribute(&data_path, "conversion", AttrValue::f32(settings.conversion))?;
                io.create_attribute(&data_path, "resolution", AttrValue::f32(settings.resolution))?;
                io.create_attribute(&data_path, "offset", AttrValue::f32(settings.offset))?;
                io.create_attribute(&data_path, "unit", AttrValue::from(settings.unit.as_str()))?;
                if let Some(continuity) = settings.continuity {
                    io.create_attribute(&data_path, "continuity", AttrValue::from(continuity.as_str()))?;
                }
                (config.shape, config.chunking)
            }
            DataSetConfig::Link(link) => {
                let shape = io.get_storage_object_shape(&link.target)?;
                io.create_link(&data_path, &link.target)?;
                (shape, Vec::new())
            }
        };
        let samples = shape.first().copied().unwrap_or(0);
        let time_chunking: Vec<usize> = chunking.first().copied().into_iter().collect();

        match settings.time_base {
            TimeBase::Timestamps => {
                let config = ArrayDataSetConfig::new(BaseDataType::F64, vec![samples], time_chunking.clone());
                base.create_array("timestamps", &config)?;
                let ts_path = base.child_path("timestamps");
                io.create_attribute(&ts_path, "interval", AttrValue::i32(1))?;
                io.create_attribute(&ts_path, "unit", AttrValue::from("seconds"))?;
            }
            TimeBase::StartingTime { start, rate } => {
                let st_path = base.child_path("starting_time");
                io.create_data_set(&st_path, DataBlockGeneric::new(DataValues::F64(vec![start]), Vec::new())?)?;
                io.create_attribute(&st_path, "rate", AttrValue::f32(rate))?;
                io.create_attribute(&st_path, "unit", AttrValue::from("seconds"))?;
            }
        }

        if !settings.control_description.is_empty() {
            let config = ArrayDataSetConfig::new(BaseDataType::U8, vec![samples], time_chunking);
            base.create_array("control", &config)?;
            io.create_string_array_data_set(
                &base.child_path("control_description"),
                &settings.control_description,
            )?;
        }
        debug!(path = %self.path(), ty = %self.type_name(), time_base = ?settings.time_base, "initialized time series");
        Ok(())
    }

    /// Write a block of samples, plus the matching timestamps and control
    /// values along the first dimension.
    ///
    /// Timestamps and control values are written only where the series has
    /// those datasets; otherwise they are ignored.
    pub fn write_data<T: Element>(
        &self,
        data_shape: &[usize],
        position_offset: &[usize],
        data: &[T],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        if data_shape.len() != position_offset.len() || data_shape.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{}: shape {data_shape:?} does not match offset {position_offset:?}",
                self.path()
            )));
        }
        let base = self.base();
        let data_handle = base.recording_data("data")?;
        let timestamps = match timestamps {
            Some(t) if self.timestamps().exists() => Some((base.recording_data("timestamps")?, t)),
            Some(_) => {
                debug!(path = %self.path(), "no timestamps dataset, skipping timestamps");
                None
            }
            None => None,
        };
        let control = match control {
            Some(c) if self.control().exists() => Some((base.recording_data("control")?, c)),
            Some(_) => {
                debug!(path = %self.path(), "no control dataset, skipping control");
                None
            }
            None => None,
        };

        if let Some((handle, timestamps)) = timestamps {
            handle.write(&data_shape[..1], &position_offset[..1], timestamps)?;
        }
        if let Some((handle, control)) = control {
            handle.write(&data_shape[..1], &position_offset[..1], control)?;
        }
        data_handle.write(data_shape, position_offset, data)
    }

    /// The stored time base.
    pub fn time_base(&self) -> Result<TimeBase> {
        if self.timestamps().exists() {
            return Ok(TimeBase::Timestamps);
        }
        let start = self.starting_time().values()?;
        let rate = self.starting_time_rate().values()?;
        match (start.data().first(), rate.data().first()) {
            (Some(&start), Some(&rate)) => Ok(TimeBase::StartingTime { start, rate }),
            _ => Err(Error::ObjectNotFound(self.base().child_path("starting_time"))),
        }
    }
}

deref_to!(TimeSeries => NwbDataInterface, interface);
impl_registered_type!(
    TimeSeries,
    "core",
    "TimeSeries",
    base = interface.nwb_container.container.base
);

define_fields! {
    TimeSeries {
        dataset data / record_data: Untyped = "data", "Data values; the first dimension is time.";
        attribute data_conversion: f32 = "data/conversion", "Scale from stored values to the data unit.";
        attribute data_resolution: f32 = "data/resolution", "Smallest meaningful difference between values.";
        attribute data_offset: f32 = "data/offset", "Offset added after scaling.";
        attribute data_unit: String = "data/unit", "Base unit of measurement.";
        attribute data_continuity: String = "data/continuity", "How values between samples are interpreted.";
        dataset timestamps / record_timestamps: f64 = "timestamps", "Sample times in seconds.";
        attribute timestamps_interval: i32 = "timestamps/interval", "Sampling interval, always 1.";
        attribute timestamps_unit: String = "timestamps/unit", "Unit of the timestamps.";
        dataset starting_time: f64 = "starting_time", "Time of the first sample in seconds.";
        attribute starting_time_rate: f32 = "starting_time/rate", "Sampling rate in Hz.";
        attribute starting_time_unit: String = "starting_time/unit", "Unit of the starting time.";
        dataset control / record_control: u8 = "control", "Per-sample control values.";
        dataset control_description: String = "control_description", "Meaning of each control value.";
        attribute description: String = "description", "Description of the series.";
        attribute comments: String = "comments", "Human-readable comments.";
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::io::{BaseIo, FileMode, LinkArrayDataSetConfig, MemoryIo, SharedIo};
    use crate::nwb::registry::create_typed;

    fn open_io() -> SharedIo {
        let io: SharedIo = Arc::new(MemoryIo::new("ts.nwb"));
        io.open(FileMode::Overwrite).unwrap();
        io
    }

    fn data_config() -> ArrayDataSetConfig {
        ArrayDataSetConfig::new(BaseDataType::F32, vec![0], vec![16])
    }

    #[test]
    fn timestamps_time_base() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/ts", &io);
        ts.initialize(data_config(), &TimeSeriesSettings::new().with_unit("mV"))
            .unwrap();
        assert!(ts.timestamps().exists());
        assert!(!ts.starting_time().exists());
        assert_eq!(ts.time_base().unwrap(), TimeBase::Timestamps);
        assert_eq!(ts.timestamps_unit().values().unwrap().data(), &["seconds".to_string()]);
        assert_eq!(ts.data_unit().values().unwrap().data(), &["mV".to_string()]);
        assert_eq!(ts.data_resolution().values().unwrap().data(), &[-1.0]);
    }

    #[test]
    fn starting_time_time_base() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/ts", &io);
        let settings = TimeSeriesSettings::new().with_starting_time(1.5, 1000.0);
        ts.initialize(data_config(), &settings).unwrap();
        assert!(!ts.timestamps().exists());
        assert!(ts.starting_time().exists());
        assert_eq!(
            ts.time_base().unwrap(),
            TimeBase::StartingTime { start: 1.5, rate: 1000.0 }
        );
    }

    #[test]
    fn invalid_starting_time_rejected_before_any_write() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/ts", &io);
        for settings in [
            TimeSeriesSettings::new().with_starting_time(-1.0, 10.0),
            TimeSeriesSettings::new().with_starting_time(0.0, 0.0),
            TimeSeriesSettings::new().with_starting_time(f64::NAN, 10.0),
        ] {
            assert!(matches!(
                ts.initialize(data_config(), &settings),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(!io.object_exists("/acquisition/ts"));
    }

    #[test]
    fn write_data_with_timestamps_and_control() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/ts", &io);
        let settings = TimeSeriesSettings::new()
            .with_control_description(vec!["ok".into(), "bad".into()])
            .with_continuity(Continuity::Continuous);
        ts.initialize(data_config(), &settings).unwrap();
        ts.write_data(&[3], &[0], &[1.0f32, 2.0, 3.0], Some(&[0.0, 0.1, 0.2]), Some(&[0, 1, 0]))
            .unwrap();
        ts.write_data(&[1], &[3], &[4.0f32], Some(&[0.3]), None).unwrap();

        assert_eq!(ts.data().values_as::<f32>().unwrap().data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ts.timestamps().values().unwrap().data(), &[0.0, 0.1, 0.2, 0.3]);
        assert_eq!(ts.control().values().unwrap().data(), &[0, 1, 0]);
        assert_eq!(ts.data_continuity().values().unwrap().data(), &["continuous".to_string()]);
    }

    #[test]
    fn missing_timestamps_and_control_are_skipped() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/regular", &io);
        let settings = TimeSeriesSettings::new().with_starting_time(0.5, 1000.0);
        ts.initialize(data_config(), &settings).unwrap();
        ts.write_data(&[2], &[0], &[1.0f32, 2.0], Some(&[0.0, 0.001]), Some(&[1, 1]))
            .unwrap();

        assert_eq!(ts.data().values_as::<f32>().unwrap().data(), &[1.0, 2.0]);
        assert!(!ts.timestamps().exists());
        assert!(!ts.control().exists());
    }

    #[test]
    fn write_before_initialize_fails() {
        let io = open_io();
        let ts = create_typed::<TimeSeries>("/acquisition/ts", &io);
        assert!(matches!(
            ts.write_data(&[1], &[0], &[1.0f32], None, None),
            Err(Error::DatasetNotWritable(_))
        ));
    }

    #[test]
    fn linked_data() {
        let io = open_io();
        let source = create_typed::<TimeSeries>("/acquisition/source", &io);
        source.initialize(data_config(), &TimeSeriesSettings::new()).unwrap();
        source.write_data(&[2], &[0], &[1.0f32, 2.0], Some(&[0.0, 1.0]), None).unwrap();

        let linked = create_typed::<TimeSeries>("/acquisition/linked", &io);
        let link: LinkArrayDataSetConfig = source.data().to_link_array_dataset_config();
        linked.initialize(link, &TimeSeriesSettings::new()).unwrap();

        assert!(io.is_link("/acquisition/linked/data"));
        assert_eq!(linked.data().values_as::<f32>().unwrap().data(), &[1.0, 2.0]);
        assert_eq!(linked.timestamps().shape().unwrap(), vec![2]);
        assert!(matches!(
            linked.write_data(&[1], &[2], &[3.0f32], None, None),
            Err(Error::DatasetNotWritable(_))
        ));
    }

    #[test]
    fn fields_table() {
        let names: Vec<_> = TimeSeries::FIELDS.iter().map(|f| f.name).collect();
        assert!(names.contains(&"timestamps"));
        assert!(names.contains(&"starting_time_rate"));
        let data = TimeSeries::FIELDS.iter().find(|f| f.name == "data").unwrap();
        assert_eq!(data.path, "data");
        assert_eq!(data.kind, crate::nwb::FieldKind::Dataset);
    }
}

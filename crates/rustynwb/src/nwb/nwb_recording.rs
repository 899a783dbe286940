//! A recording session: one file, its electrical series, and the writes that
//! stream into them.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::io::{BaseDataType, Element, FileMode, MemoryIo, RecordState, SharedIo};
use crate::nwb::base::TimeSeries;
use crate::nwb::ecephys::{ElectricalSeries, SpikeEventSeries};
use crate::nwb::misc::AnnotationSeries;
use crate::nwb::registry::{self, create_typed};
use crate::nwb::{NwbFile, NwbFileSettings, RegisteredType};
use crate::utils::transform_to_i16;

/// The time series inside a tracked recording object, whatever series type
/// wraps it.
fn time_series(object: &dyn RegisteredType) -> Option<&TimeSeries> {
    let any = object.as_any();
    any.downcast_ref::<TimeSeries>()
        .or_else(|| any.downcast_ref::<ElectricalSeries>().map(|s| &s.series))
        .or_else(|| any.downcast_ref::<SpikeEventSeries>().map(|s| &s.electrical.series))
        .or_else(|| any.downcast_ref::<AnnotationSeries>().map(|s| &s.series))
}

/// Open file, create one electrical series per channel group, record.
///
/// ```
/// use rustynwb::io::BaseDataType;
/// use rustynwb::nwb::NwbRecording;
/// use rustynwb::Channel;
///
/// let channels = vec![Channel::new("ch0", "array0", 0, 0, 0)];
/// let recording =
///     NwbRecording::create("session.nwb", &[channels.clone()], BaseDataType::I16).unwrap();
/// let index = recording.series_indices()[0];
/// let timestamps = [0.0, 1.0 / 30000.0];
/// recording
///     .write_scaled(index, &channels[0], &[0.05, 0.10], Some(&timestamps))
///     .unwrap();
/// recording.close().unwrap();
/// ```
#[derive(Debug)]
pub struct NwbRecording {
    io: SharedIo,
    file: Arc<NwbFile>,
    series: Vec<usize>,
}

impl NwbRecording {
    /// Start a session in a new in-memory file named `file_name`.
    pub fn create(
        file_name: &str,
        arrays: &[Vec<Channel>],
        data_type: BaseDataType,
    ) -> Result<Self> {
        Self::open(Arc::new(MemoryIo::new(file_name)), arrays, data_type)
    }

    /// Start a session on `io`, opening it for overwrite when it is closed.
    ///
    /// The file is initialized with a fresh identifier unless it already is,
    /// then one electrical series per channel group is created and the IO
    /// starts recording.
    pub fn open(io: SharedIo, arrays: &[Vec<Channel>], data_type: BaseDataType) -> Result<Self> {
        if !io.is_open() {
            io.open(FileMode::Overwrite)?;
        }
        let file = create_typed::<NwbFile>("/", &io);
        file.initialize(&NwbFileSettings::default())?;
        let series = file.create_electrical_series(arrays, data_type)?;
        io.start_recording()?;
        info!(file = io.file_name(), series = series.len(), "recording session started");
        Ok(Self { io, file, series })
    }

    pub fn io(&self) -> &SharedIo {
        &self.io
    }

    pub fn file(&self) -> &Arc<NwbFile> {
        &self.file
    }

    /// Recording-object indices of the electrical series, in channel-group
    /// order.
    pub fn series_indices(&self) -> &[usize] {
        &self.series
    }

    fn object(&self, index: usize) -> Result<Arc<dyn RegisteredType>> {
        self.io.recording_objects().get(index).ok_or_else(|| {
            Error::InvalidArgument(format!("no recording object at index {index}"))
        })
    }

    /// Write a block into the time series at `index`. Timestamps and control
    /// values are written only for the channel with local index 0.
    #[allow(clippy::too_many_arguments)]
    pub fn write_timeseries<T: Element>(
        &self,
        index: usize,
        channel: &Channel,
        data_shape: &[usize],
        position_offset: &[usize],
        data: &[T],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        let object = self.object(index)?;
        let series = time_series(object.as_ref()).ok_or_else(|| {
            Error::InvalidArgument(format!("{} is not a time series", object.path()))
        })?;
        if channel.local_index == 0 {
            series.write_data(data_shape, position_offset, data, timestamps, control)
        } else {
            series.write_data(data_shape, position_offset, data, None, None)
        }
    }

    /// Append `num_samples` samples of `channel` to the electrical series at
    /// `index`.
    pub fn write_electrical_series<T: Element>(
        &self,
        index: usize,
        channel: &Channel,
        num_samples: usize,
        data: &[T],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        let object = self.object(index)?;
        let path = object.path().to_string();
        let series = registry::downcast::<ElectricalSeries>(object).ok_or_else(|| {
            Error::InvalidArgument(format!("{path} is not an electrical series"))
        })?;
        series.write_channel(channel.local_index, num_samples, data, timestamps, control)
    }

    /// Convert voltage samples to 16-bit counts with the channel's bit volts
    /// and append them.
    pub fn write_scaled(
        &self,
        index: usize,
        channel: &Channel,
        samples: &[f32],
        timestamps: Option<&[f64]>,
    ) -> Result<()> {
        let counts = transform_to_i16(channel.bit_volts, samples);
        self.write_electrical_series(index, channel, counts.len(), &counts, timestamps, None)
    }

    /// Append one spike event to the spike event series at `index`.
    pub fn write_spike<T: Element>(
        &self,
        index: usize,
        num_samples: usize,
        num_channels: usize,
        data: &[T],
        timestamp: Option<f64>,
        control: Option<u8>,
    ) -> Result<()> {
        let object = self.object(index)?;
        let path = object.path().to_string();
        let series = registry::downcast::<SpikeEventSeries>(object).ok_or_else(|| {
            Error::InvalidArgument(format!("{path} is not a spike event series"))
        })?;
        series.write_spike(num_samples, num_channels, data, timestamp, control)
    }

    /// Append annotations to the annotation series at `index`.
    pub fn write_annotation(
        &self,
        index: usize,
        annotations: &[String],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        let object = self.object(index)?;
        let path = object.path().to_string();
        let series = registry::downcast::<AnnotationSeries>(object).ok_or_else(|| {
            Error::InvalidArgument(format!("{path} is not an annotation series"))
        })?;
        series.write_annotation(annotations.len(), annotations, timestamps, control)
    }

    /// Stop recording and close the file.
    pub fn close(&self) -> Result<()> {
        let stopped = match self.io.record_state() {
            RecordState::Recording => self.io.stop_recording(),
            RecordState::Open | RecordState::Closed => Ok(()),
        };
        self.io.close()?;
        stopped
    }
}

impl Drop for NwbRecording {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(file = self.io.file_name(), error = %e, "failed to close recording session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IoConfig;
    use crate::io::{BaseIo, DataValues};

    fn channels(group: &str, offset: usize, n: usize) -> Vec<Channel> {
        (0..n)
            .map(|i| Channel::new(format!("{group}{i}"), group, 0, i, offset + i))
            .collect()
    }

    #[test]
    fn session_records_and_closes() {
        let io = Arc::new(MemoryIo::new("session.nwb"));
        let shared: SharedIo = io.clone();
        let arrays = vec![channels("a", 0, 2), channels("b", 2, 1)];
        let recording = NwbRecording::open(shared, &arrays, BaseDataType::I16).unwrap();
        assert_eq!(recording.io().record_state(), RecordState::Recording);
        assert!(recording.file().is_initialized());

        let first = recording.series_indices()[0];
        recording
            .write_electrical_series(first, &arrays[0][0], 2, &[1i16, 2], Some(&[0.0, 0.5]), None)
            .unwrap();
        recording
            .write_electrical_series(first, &arrays[0][1], 2, &[3i16, 4], None, None)
            .unwrap();
        recording
            .write_scaled(recording.series_indices()[1], &arrays[1][0], &[0.05, -0.1], Some(&[0.0, 0.5]))
            .unwrap();
        recording.close().unwrap();
        assert_eq!(io.record_state(), RecordState::Closed);

        let reader: SharedIo = Arc::new(MemoryIo::with_store("session.nwb", io.store()));
        reader.open(FileMode::ReadOnly).unwrap();
        let block = reader
            .read_dataset_args("/acquisition/a/data", &[], &[], &[], &[])
            .unwrap();
        assert_eq!(block.data(), &DataValues::I16(vec![1, 3, 2, 4]));
        let block = reader
            .read_dataset_args("/acquisition/b/data", &[], &[], &[], &[])
            .unwrap();
        assert_eq!(block.data(), &DataValues::I16(vec![1, -2]));
    }

    #[test]
    fn write_timeseries_gives_timestamps_to_first_channel() {
        let arrays = vec![channels("a", 0, 2)];
        let recording = NwbRecording::create("ts.nwb", &arrays, BaseDataType::F32).unwrap();
        let index = recording.series_indices()[0];
        recording
            .write_timeseries(index, &arrays[0][0], &[2, 1], &[0, 0], &[1.0f32, 2.0], Some(&[0.0, 1.0]), None)
            .unwrap();
        recording
            .write_timeseries(index, &arrays[0][1], &[2, 1], &[0, 1], &[3.0f32, 4.0], Some(&[9.0, 9.0]), None)
            .unwrap();
        let series = registry::downcast::<ElectricalSeries>(
            recording.io().recording_objects().get(index).unwrap(),
        )
        .unwrap();
        assert_eq!(series.timestamps().values().unwrap().data(), &[0.0, 1.0]);
        assert_eq!(series.data().shape().unwrap(), vec![2, 2]);
    }

    #[test]
    fn wrong_object_kind_or_index() {
        let arrays = vec![channels("a", 0, 1)];
        let recording = NwbRecording::create("bad.nwb", &arrays, BaseDataType::F32).unwrap();
        let index = recording.series_indices()[0];
        assert!(recording
            .write_spike(index, 1, 1, &[1.0f32], None, None)
            .is_err());
        assert!(recording
            .write_annotation(index, &["note".to_string()], None, None)
            .is_err());
        assert!(matches!(
            recording.write_electrical_series(99, &arrays[0][0], 1, &[1.0f32], None, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn swmr_disabled_session_keeps_file_open_until_close() {
        let io = Arc::new(MemoryIo::new("open.nwb").with_config(IoConfig::new().disable_swmr_mode()));
        let shared: SharedIo = io.clone();
        let recording =
            NwbRecording::open(shared, &[channels("a", 0, 1)], BaseDataType::I16).unwrap();
        assert!(recording.io().can_modify_objects());
        let notes = recording.file().create_annotation_series("notes").unwrap();
        recording
            .write_annotation(notes, &["start".to_string()], Some(&[0.0]), None)
            .unwrap();
        drop(recording);
        assert_eq!(io.record_state(), RecordState::Closed);
    }
}

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::config::ELECTRODES_TABLE_PATH;
use crate::error::{Error, Result};
use crate::io::{ArrayDataSetConfig, AttrValue, BaseDataType, DataSetConfig, Element};
use crate::nwb::base::{TimeSeries, TimeSeriesSettings};
use crate::nwb::hdmf::DynamicTableRegion;
use crate::nwb::registry::create_typed;
use crate::nwb::{RegisteredType, TypeBase};
use crate::utils::merge_paths;

/// Settings for [`ElectricalSeries::initialize`].
///
/// The series unit is always volts; any unit set on `series` is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricalSeriesSettings {
    pub series: TimeSeriesSettings,
    /// Description of the `electrodes` region.
    pub electrodes_description: String,
    /// Filtering applied to the signal, if any.
    pub filtering: Option<String>,
}

impl Default for ElectricalSeriesSettings {
    fn default() -> Self {
        Self {
            series: TimeSeriesSettings::default().with_description(
                "Stores continuously sampled voltage data from an extracellular ephys recording",
            ),
            electrodes_description: "the electrodes that generated this electrical series"
                .to_string(),
            filtering: None,
        }
    }
}

impl ElectricalSeriesSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: TimeSeriesSettings) -> Self {
        self.series = series;
        self
    }

    pub fn with_electrodes_description(mut self, description: impl Into<String>) -> Self {
        self.electrodes_description = description.into();
        self
    }

    pub fn with_filtering(mut self, filtering: impl Into<String>) -> Self {
        self.filtering = Some(filtering.into());
        self
    }
}

/// `core::ElectricalSeries`: voltage samples from a set of electrodes, one
/// column per channel.
#[derive(Debug)]
pub struct ElectricalSeries {
    pub(crate) series: TimeSeries,
    channels: Mutex<Vec<Channel>>,
    samples_recorded: Mutex<Vec<usize>>,
}

impl ElectricalSeries {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            series: TimeSeries::with_base(base),
            channels: Mutex::new(Vec::new()),
            samples_recorded: Mutex::new(Vec::new()),
        }
    }

    /// Create the series for `channels`.
    ///
    /// Every channel's global index must be a row of the electrodes table
    /// when the table's ids have been written.
    pub fn initialize(
        &self,
        data: impl Into<DataSetConfig>,
        channels: &[Channel],
        settings: &ElectricalSeriesSettings,
    ) -> Result<()> {
        if channels.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{}: an electrical series needs at least one channel",
                self.path()
            )));
        }
        let io = self.io()?;
        let id_path = merge_paths(ELECTRODES_TABLE_PATH, "id");
        if io.object_exists(&id_path) {
            let rows = io.get_storage_object_shape(&id_path)?.first().copied().unwrap_or(0);
            if let Some(channel) = channels.iter().find(|c| c.global_index >= rows) {
                warn!(
                    path = %self.path(),
                    channel = %channel.name,
                    global_index = channel.global_index,
                    rows,
                    "electrode index out of range"
                );
                return Err(Error::InvalidArgument(format!(
                    "electrode index {} out of range for {rows} electrodes",
                    channel.global_index
                )));
            }
        }

        let indices = channels
            .iter()
            .map(|c| {
                i32::try_from(c.global_index).map_err(|_| {
                    Error::InvalidArgument(format!(
                        "electrode index {} exceeds the region range",
                        c.global_index
                    ))
                })
            })
            .collect::<Result<Vec<i32>>>()?;

        let series_settings = settings.series.clone().with_unit("volts");
        self.series.initialize(data, &series_settings)?;
        let base = self.base();
        if let Some(filtering) = &settings.filtering {
            io.create_attribute(self.path(), "filtering", AttrValue::from(filtering.as_str()))?;
        }

        let n = channels.len();
        let conversions: Vec<f32> = channels.iter().map(Channel::conversion).collect();
        let conversion_config = ArrayDataSetConfig::new(BaseDataType::F32, vec![n], Vec::new());
        base.create_array("channel_conversion", &conversion_config)?
            .write(&[n], &[0], &conversions)?;
        io.create_attribute(&base.child_path("channel_conversion"), "axis", AttrValue::i32(1))?;

        let region = create_typed::<DynamicTableRegion>(&base.child_path("electrodes"), &io);
        region.initialize(
            &ArrayDataSetConfig::new(BaseDataType::I32, vec![n], Vec::new()),
            &settings.electrodes_description,
            ELECTRODES_TABLE_PATH,
        )?;
        region.record_data()?.write(&[n], &[0], &indices)?;

        *self.channels.lock() = channels.to_vec();
        *self.samples_recorded.lock() = vec![0; n];
        debug!(path = %self.path(), channels = n, "initialized electrical series");
        Ok(())
    }

    /// Write `num_samples` samples of one channel.
    ///
    /// Channel 0 owns the timestamps and control values. When a timestamps
    /// dataset exists, other channels may not run ahead of what channel 0
    /// has written.
    pub fn write_channel<T: Element>(
        &self,
        channel: usize,
        num_samples: usize,
        data: &[T],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        let mut samples = self.samples_recorded.lock();
        let Some(&recorded) = samples.get(channel) else {
            return Err(Error::InvalidArgument(format!(
                "{}: channel {channel} out of range for {} channels",
                self.path(),
                samples.len()
            )));
        };
        if data.len() != num_samples {
            return Err(Error::ShapeMismatch {
                shape: vec![num_samples, 1],
                expected: num_samples,
                actual: data.len(),
            });
        }
        if channel != 0 && self.timestamps().exists() && recorded + num_samples > samples[0] {
            warn!(
                path = %self.path(),
                channel,
                recorded,
                num_samples,
                committed = samples[0],
                "channel ran ahead of channel 0 timestamps"
            );
            return Err(Error::InvalidArgument(format!(
                "channel {channel} would hold {} samples but channel 0 has written {}",
                recorded + num_samples,
                samples[0]
            )));
        }

        let shape = [num_samples, 1];
        let offset = [recorded, channel];
        if channel == 0 {
            self.series.write_data(&shape, &offset, data, timestamps, control)?;
        } else {
            self.series.write_data(&shape, &offset, data, None, None)?;
        }
        samples[channel] += num_samples;
        Ok(())
    }

    /// Samples written so far, per channel.
    pub fn samples_recorded(&self) -> Vec<usize> {
        self.samples_recorded.lock().clone()
    }

    /// Channels the series was initialized with.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.lock().clone()
    }
}

deref_to!(ElectricalSeries => TimeSeries, series);
impl_registered_type!(
    ElectricalSeries,
    "core",
    "ElectricalSeries",
    base = series.interface.nwb_container.container.base
);

define_fields! {
    ElectricalSeries {
        dataset channel_conversion: f32 = "channel_conversion", "Per-channel scale to volts, applied after data conversion.";
        attribute channel_conversion_axis: i32 = "channel_conversion/axis", "Data axis the channel conversion applies to.";
        dataset electrodes_index: i32 = "electrodes", "Electrodes table rows of the channels.";
        registered electrodes: DynamicTableRegion = "electrodes", "Region of the electrodes table for the channels.";
        attribute electrodes_description: String = "electrodes/description", "Description of the electrodes region.";
        attribute filtering: String = "filtering", "Filtering applied to the signal.";
    }
}

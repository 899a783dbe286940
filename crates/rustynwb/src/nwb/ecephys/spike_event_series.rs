use parking_lot::Mutex;

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::io::{DataSetConfig, Element};
use crate::nwb::ecephys::{ElectricalSeries, ElectricalSeriesSettings};
use crate::nwb::TypeBase;

/// `core::SpikeEventSeries`: snippets of voltage around detected spikes.
///
/// Data is `[events, samples]` for a single channel and
/// `[events, channels, samples]` otherwise; each call to
/// [`write_spike`](Self::write_spike) appends one event.
#[derive(Debug)]
pub struct SpikeEventSeries {
    pub(crate) electrical: ElectricalSeries,
    events_recorded: Mutex<usize>,
}

impl SpikeEventSeries {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            electrical: ElectricalSeries::with_base(base),
            events_recorded: Mutex::new(0),
        }
    }

    pub fn initialize(
        &self,
        data: impl Into<DataSetConfig>,
        channels: &[Channel],
        settings: &ElectricalSeriesSettings,
    ) -> Result<()> {
        self.electrical.initialize(data, channels, settings)
    }

    /// Append one event of `num_samples` samples on `num_channels` channels,
    /// with its timestamp and optional control value.
    pub fn write_spike<T: Element>(
        &self,
        num_samples: usize,
        num_channels: usize,
        data: &[T],
        timestamp: Option<f64>,
        control: Option<u8>,
    ) -> Result<()> {
        let mut events = self.events_recorded.lock();
        let (shape, offset) = if num_channels == 1 {
            (vec![1, num_samples], vec![*events, 0])
        } else {
            (vec![1, num_channels, num_samples], vec![*events, 0, 0])
        };
        if data.len() != num_samples * num_channels {
            return Err(Error::ShapeMismatch {
                shape,
                expected: num_samples * num_channels,
                actual: data.len(),
            });
        }
        let timestamps = timestamp.map(|t| [t]);
        let controls = control.map(|c| [c]);
        self.electrical.series.write_data(
            &shape,
            &offset,
            data,
            timestamps.as_ref().map(|t| t.as_slice()),
            controls.as_ref().map(|c| c.as_slice()),
        )?;
        *events += 1;
        Ok(())
    }

    pub fn events_recorded(&self) -> usize {
        *self.events_recorded.lock()
    }
}

deref_to!(SpikeEventSeries => ElectricalSeries, electrical);
impl_registered_type!(
    SpikeEventSeries,
    "core",
    "SpikeEventSeries",
    base = electrical.series.interface.nwb_container.container.base
);

//! Extracellular electrophysiology types.

mod electrical_series;
mod spike_event_series;

pub use electrical_series::{ElectricalSeries, ElectricalSeriesSettings};
pub use spike_event_series::SpikeEventSeries;

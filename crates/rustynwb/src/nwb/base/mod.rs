//! Core base types: containers, data interfaces, time series and
//! processing modules.

mod nwb_container;
mod nwb_data_interface;
mod processing_module;
mod time_series;

pub use nwb_container::NwbContainer;
pub use nwb_data_interface::NwbDataInterface;
pub use processing_module::ProcessingModule;
pub use time_series::{Continuity, TimeBase, TimeSeries, TimeSeriesSettings};

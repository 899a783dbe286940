//! File-level metadata types: electrode groups and the electrodes table.

mod electrode_group;
mod electrodes_table;

pub use electrode_group::ElectrodeGroup;
pub use electrodes_table::ElectrodesTable;

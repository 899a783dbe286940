//! NWB schema types.
//!
//! Types compose rather than inherit: an `ElectricalSeries` holds a
//! `TimeSeries`, which holds an `NWBDataInterface`, down to the
//! `Container` that owns the [`TypeBase`]. Each level derefs to the one it
//! wraps, so the fields of every ancestor are reachable from the concrete
//! type.
//!
//! Constructing a type touches no storage; `initialize` creates its groups,
//! datasets and attributes.

#[macro_use]
mod macros;

pub mod base;
pub mod device;
pub mod ecephys;
pub mod file;
pub mod hdmf;
pub mod misc;
pub mod nwb_file;
pub mod nwb_recording;
pub mod registered_type;
pub mod registry;

pub use base::{
    Continuity, NwbContainer, NwbDataInterface, ProcessingModule, TimeBase, TimeSeries,
    TimeSeriesSettings,
};
pub use device::Device;
pub use ecephys::{ElectricalSeries, ElectricalSeriesSettings, SpikeEventSeries};
pub use file::{ElectrodeGroup, ElectrodesTable};
pub use hdmf::{Container, Data, DynamicTable, DynamicTableRegion, ElementIdentifiers, VectorData};
pub use misc::AnnotationSeries;
pub use nwb_file::{NwbFile, NwbFileSettings};
pub use nwb_recording::NwbRecording;
pub use registered_type::{FieldDef, FieldKind, RegisteredType, SchemaType, TypeBase};
pub use registry::TypeName;

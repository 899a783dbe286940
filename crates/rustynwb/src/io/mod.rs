//! Storage layer: the [`BaseIo`] interface, data blocks, selections, write
//! handles and the in-memory backend.

pub mod base;
pub mod data_block;
pub mod data_type;
pub mod memory;
pub mod read;
pub mod recording_data;
pub mod recording_objects;
pub mod selection;
pub mod types;

pub use base::{BaseIo, SharedIo};
pub use data_block::{element_count, ArrayView, DataBlock, DataBlockGeneric, DataRef, DataValues, Element};
pub use data_type::{BaseDataType, ElementType};
pub use memory::{MemoryIo, MemoryStore};
pub use read::{Attribute, Dataset, ReadDataWrapper, StorageKind, Untyped};
pub use recording_data::RecordingData;
pub use recording_objects::RecordingObjects;
pub use selection::Selection;
pub use types::{
    ArrayDataSetConfig, AttrValue, DataSetConfig, FileMode, LinkArrayDataSetConfig, RecordState,
    SearchMode, StorageObjectType,
};

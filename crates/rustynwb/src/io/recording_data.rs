//! Write handles for extendable array datasets.

use std::fmt;

use crate::error::Result;
use crate::io::data_block::{DataRef, Element};

/// Handle to an extendable array dataset created by the storage backend.
///
/// The handle tracks the dataset's current extent; writes past the extent
/// grow the dataset. Handles stay valid while the file is recording, which is
/// the only way data reaches the file once structure is frozen.
pub trait RecordingData: Send + Sync + fmt::Debug {
    /// Path of the dataset this handle writes to.
    fn path(&self) -> &str;

    /// Current extent of the dataset.
    fn shape(&self) -> Vec<usize>;

    /// Position just past the last block written, per dimension.
    fn position(&self) -> Vec<usize>;

    /// Write a block of `data_shape` elements at `position_offset`.
    ///
    /// `data` must hold exactly `product(data_shape)` elements in row-major
    /// order. Numeric data is converted to the dataset's element type.
    fn write_data_block(
        &self,
        data_shape: &[usize],
        position_offset: &[usize],
        data: DataRef<'_>,
    ) -> Result<()>;
}

impl dyn RecordingData {
    /// Typed convenience over [`RecordingData::write_data_block`].
    pub fn write<T: Element>(
        &self,
        data_shape: &[usize],
        position_offset: &[usize],
        data: &[T],
    ) -> Result<()> {
        self.write_data_block(data_shape, position_offset, T::slice_ref(data))
    }
}

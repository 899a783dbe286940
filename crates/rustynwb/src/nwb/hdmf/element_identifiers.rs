use crate::error::Result;
use crate::io::{ArrayDataSetConfig, BaseDataType};
use crate::nwb::hdmf::Data;
use crate::nwb::TypeBase;

/// `hdmf-common::ElementIdentifiers`: the row ids of a dynamic table.
#[derive(Debug)]
pub struct ElementIdentifiers {
    pub(crate) data: Data,
}

impl ElementIdentifiers {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            data: Data::with_base(base),
        }
    }

    /// Create an empty, extendable `i32` id dataset.
    pub fn initialize(&self) -> Result<()> {
        self.data
            .initialize(&ArrayDataSetConfig::new(BaseDataType::I32, vec![0], Vec::new()))
    }

    /// Append ids after those already stored.
    pub fn append(&self, ids: &[i32]) -> Result<()> {
        let handle = self.data.base.recording_data("")?;
        let start = handle.shape().first().copied().unwrap_or(0);
        handle.write(&[ids.len()], &[start], ids)
    }
}

deref_to!(ElementIdentifiers => Data, data);
impl_registered_type!(ElementIdentifiers, "hdmf-common", "ElementIdentifiers", base = data.base);

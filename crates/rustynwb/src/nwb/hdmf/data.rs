use crate::error::Result;
use crate::io::{ArrayDataSetConfig, Untyped};
use crate::nwb::TypeBase;

/// `hdmf-common::Data`: base of every dataset-backed type.
///
/// The object's own path is the dataset; its write handle is cached under
/// the empty relative path.
#[derive(Debug)]
pub struct Data {
    pub(crate) base: TypeBase,
}

impl Data {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self { base }
    }

    /// Create the dataset and tag it with its type.
    pub fn initialize(&self, config: &ArrayDataSetConfig) -> Result<()> {
        self.base.create_array("", config)?;
        self.base.io()?.create_common_nwb_attributes(
            self.base.path(),
            self.base.namespace(),
            self.base.type_name(),
        )
    }
}

impl_registered_type!(Data, "hdmf-common", "Data", base = base);

define_fields! {
    Data {
        dataset data / record_data: Untyped = "", "The stored values.";
    }
}

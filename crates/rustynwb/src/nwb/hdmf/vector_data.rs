use crate::error::Result;
use crate::io::{ArrayDataSetConfig, AttrValue, DataValues};
use crate::nwb::hdmf::Data;
use crate::nwb::TypeBase;

/// `hdmf-common::VectorData`: one column of a dynamic table.
#[derive(Debug)]
pub struct VectorData {
    pub(crate) data: Data,
}

impl VectorData {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            data: Data::with_base(base),
        }
    }

    pub fn initialize(&self, config: &ArrayDataSetConfig, description: &str) -> Result<()> {
        self.data.initialize(config)?;
        self.data
            .base
            .io()?
            .create_attribute(self.data.base.path(), "description", AttrValue::from(description))
    }

    /// Create the column and write all its values at once.
    pub fn initialize_with_values(&self, values: &DataValues, description: &str) -> Result<()> {
        let config = ArrayDataSetConfig::new(
            values.element_type().into(),
            vec![values.len()],
            Vec::new(),
        );
        self.initialize(&config, description)?;
        self.data
            .base
            .recording_data("")?
            .write_data_block(&[values.len()], &[0], values.as_data_ref())
    }
}

deref_to!(VectorData => Data, data);
impl_registered_type!(VectorData, "hdmf-common", "VectorData", base = data.base);

define_fields! {
    VectorData {
        attribute description: String = "description", "Description of what the column holds.";
    }
}

use std::sync::Arc;

use crate::error::Result;
use crate::io::ArrayDataSetConfig;
use crate::nwb::hdmf::VectorData;
use crate::nwb::registry;
use crate::nwb::{RegisteredType, TypeBase};

/// `hdmf-common::DynamicTableRegion`: row indices into another table.
#[derive(Debug)]
pub struct DynamicTableRegion {
    pub(crate) vector: VectorData,
}

impl DynamicTableRegion {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            vector: VectorData::with_base(base),
        }
    }

    /// Create the index dataset with a `table` reference to `table_path`.
    pub fn initialize(
        &self,
        config: &ArrayDataSetConfig,
        description: &str,
        table_path: &str,
    ) -> Result<()> {
        self.vector.initialize(config, description)?;
        self.io()?
            .create_reference_attribute(table_path, self.path(), "table")
    }

    /// Path of the referenced table.
    pub fn table_path(&self) -> Result<String> {
        self.io()?
            .read_reference_attribute(&self.base().child_path("table"))
    }

    /// The referenced table, rebuilt through the registry.
    pub fn table(&self) -> Option<Arc<dyn RegisteredType>> {
        let io = self.io().ok()?;
        let path = self.table_path().ok()?;
        registry::create(&path, &io, true)
    }
}

deref_to!(DynamicTableRegion => VectorData, vector);
impl_registered_type!(DynamicTableRegion, "hdmf-common", "DynamicTableRegion", base = vector.data.base);

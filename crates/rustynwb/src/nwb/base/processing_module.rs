use std::sync::Arc;

use crate::error::Result;
use crate::io::AttrValue;
use crate::nwb::base::NwbContainer;
use crate::nwb::registry::{self, create_typed};
use crate::nwb::{DynamicTable, RegisteredType, SchemaType, TypeBase};

/// `core::ProcessingModule`: a named group of processed data interfaces and
/// tables.
#[derive(Debug)]
pub struct ProcessingModule {
    pub(crate) nwb_container: NwbContainer,
}

impl ProcessingModule {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            nwb_container: NwbContainer::with_base(base),
        }
    }

    pub fn initialize(&self, description: &str) -> Result<()> {
        self.base().initialize_group()?;
        self.io()?
            .create_attribute(self.path(), "description", AttrValue::from(description))
    }

    /// Bind a new child object of type `T` named `name`. The caller
    /// initializes it.
    pub fn create_child<T: SchemaType>(&self, name: &str) -> Result<Arc<T>> {
        Ok(create_typed::<T>(&self.base().child_path(name), &self.io()?))
    }

    /// Typed children that are not tables.
    pub fn data_interfaces(&self) -> Result<Vec<Arc<dyn RegisteredType>>> {
        Ok(self
            .children()?
            .into_iter()
            .filter(|child| registry::downcast::<DynamicTable>(Arc::clone(child)).is_none())
            .collect())
    }

    /// Children that are dynamic tables.
    pub fn dynamic_tables(&self) -> Result<Vec<Arc<DynamicTable>>> {
        Ok(self
            .children()?
            .into_iter()
            .filter_map(registry::downcast::<DynamicTable>)
            .collect())
    }
}

deref_to!(ProcessingModule => NwbContainer, nwb_container);
impl_registered_type!(
    ProcessingModule,
    "core",
    "ProcessingModule",
    base = nwb_container.container.base
);

define_fields! {
    ProcessingModule {
        attribute description: String = "description", "Description of this collection of processed data.";
    }
}

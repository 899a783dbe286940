//! Recording devices.

use crate::error::Result;
use crate::io::AttrValue;
use crate::nwb::base::NwbContainer;
use crate::nwb::{RegisteredType, TypeBase};

/// `core::Device`: a piece of acquisition hardware.
#[derive(Debug)]
pub struct Device {
    pub(crate) nwb_container: NwbContainer,
}

impl Device {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            nwb_container: NwbContainer::with_base(base),
        }
    }

    pub fn initialize(&self, description: &str, manufacturer: &str) -> Result<()> {
        self.base().initialize_group()?;
        let io = self.io()?;
        io.create_attribute(self.path(), "description", AttrValue::from(description))?;
        io.create_attribute(self.path(), "manufacturer", AttrValue::from(manufacturer))
    }
}

deref_to!(Device => NwbContainer, nwb_container);
impl_registered_type!(Device, "core", "Device", base = nwb_container.container.base);

define_fields! {
    Device {
        attribute description: String = "description", "Description of the device.";
        attribute manufacturer: String = "manufacturer", "Maker of the device.";
    }
}

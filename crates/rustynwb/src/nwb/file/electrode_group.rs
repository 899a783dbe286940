use crate::error::Result;
use crate::io::AttrValue;
use crate::nwb::base::NwbContainer;
use crate::nwb::device::Device;
use crate::nwb::{RegisteredType, TypeBase};

/// `core::ElectrodeGroup`: electrodes that share a device and location.
#[derive(Debug)]
pub struct ElectrodeGroup {
    pub(crate) nwb_container: NwbContainer,
}

impl ElectrodeGroup {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            nwb_container: NwbContainer::with_base(base),
        }
    }

    /// Create the group with a `device` link to an initialized device.
    pub fn initialize(&self, description: &str, location: &str, device: &Device) -> Result<()> {
        self.base().initialize_group()?;
        let io = self.io()?;
        io.create_attribute(self.path(), "description", AttrValue::from(description))?;
        io.create_attribute(self.path(), "location", AttrValue::from(location))?;
        io.create_link(&self.base().child_path("device"), device.path())
    }
}

deref_to!(ElectrodeGroup => NwbContainer, nwb_container);
impl_registered_type!(
    ElectrodeGroup,
    "core",
    "ElectrodeGroup",
    base = nwb_container.container.base
);

define_fields! {
    ElectrodeGroup {
        attribute description: String = "description", "Description of the electrode group.";
        attribute location: String = "location", "Brain region the electrodes are in.";
        registered device: Device = "device", "Device the electrodes belong to.";
    }
}

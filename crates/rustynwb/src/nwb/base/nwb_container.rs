use crate::nwb::hdmf::Container;
use crate::nwb::TypeBase;

/// `core::NWBContainer`: base of the core group types.
#[derive(Debug)]
pub struct NwbContainer {
    pub(crate) container: Container,
}

impl NwbContainer {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            container: Container::with_base(base),
        }
    }
}

deref_to!(NwbContainer => Container, container);
impl_registered_type!(NwbContainer, "core", "NWBContainer", base = container.base);

use crate::nwb::base::NwbContainer;
use crate::nwb::TypeBase;

/// `core::NWBDataInterface`: base of acquired and processed data types.
#[derive(Debug)]
pub struct NwbDataInterface {
    pub(crate) nwb_container: NwbContainer,
}

impl NwbDataInterface {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            nwb_container: NwbContainer::with_base(base),
        }
    }
}

deref_to!(NwbDataInterface => NwbContainer, nwb_container);
impl_registered_type!(
    NwbDataInterface,
    "core",
    "NWBDataInterface",
    base = nwb_container.container.base
);

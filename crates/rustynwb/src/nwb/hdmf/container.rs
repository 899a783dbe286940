use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::io::{SearchMode, SharedIo};
use crate::nwb::registry;
use crate::nwb::{RegisteredType, TypeBase};

/// `hdmf-common::Container`: base of every group-backed type.
#[derive(Debug)]
pub struct Container {
    pub(crate) base: TypeBase,
}

impl Container {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self { base }
    }

    /// Create the group and its type attributes.
    pub fn initialize(&self) -> Result<()> {
        self.base.initialize_group()
    }

    /// Typed objects directly below this container.
    ///
    /// Nested typed objects are not descended into; unknown types come back
    /// as their storage base type.
    pub fn children(&self) -> Result<Vec<Arc<dyn RegisteredType>>> {
        typed_children(&self.base.io()?, self.base.path())
    }
}

/// Outermost typed objects below `path`, sorted by path.
pub(crate) fn typed_children(io: &SharedIo, path: &str) -> Result<Vec<Arc<dyn RegisteredType>>> {
    let mut found: Vec<_> = io
        .find_types(path, &HashSet::new(), SearchMode::StopOnType, true)?
        .into_keys()
        .collect();
    found.sort();
    Ok(found
        .iter()
        .filter_map(|path| registry::create(path, io, true))
        .collect())
}

impl_registered_type!(Container, "hdmf-common", "Container", base = base);

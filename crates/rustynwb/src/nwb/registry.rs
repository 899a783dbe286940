//! Process-wide type registry and polymorphic object creation.
//!
//! Every schema type is registered under its `namespace::TypeName` key with a
//! factory that builds it from `(path, io)`. Reading code uses
//! [`create`] to rebuild the right concrete type from the `namespace` and
//! `neurodata_type` attributes stored at a path, without knowing the type at
//! compile time.
//!
//! ```
//! use std::sync::Arc;
//! use rustynwb::io::{BaseIo, FileMode, MemoryIo, SharedIo};
//! use rustynwb::nwb::registry::{self, TypeName};
//! use rustynwb::nwb::{Device, RegisteredType};
//!
//! let io: SharedIo = Arc::new(MemoryIo::new("registry.nwb"));
//! io.open(FileMode::Overwrite).unwrap();
//! registry::create_typed::<Device>("/general/devices/probe", &io)
//!     .initialize("probe", "acme")
//!     .unwrap();
//! io.recording_objects().clear();
//!
//! let object = registry::create("/general/devices/probe", &io, false).unwrap();
//! assert_eq!(object.full_type_name(), TypeName::new("core", "Device"));
//! assert!(registry::downcast::<Device>(object).is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::{SharedIo, StorageObjectType};
use crate::nwb::{RegisteredType, SchemaType};
use crate::utils::{merge_paths, normalize_path};

/// Namespace-qualified schema type name, e.g. `core::TimeSeries`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub namespace: String,
    pub name: String,
}

impl TypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

impl FromStr for TypeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once("::") {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(Error::InvalidArgument(format!(
                "type name must be `namespace::TypeName`, got {s:?}"
            ))),
        }
    }
}

/// Builds a registered type bound to `(path, io)`.
pub type Factory = fn(&str, &SharedIo) -> Arc<dyn RegisteredType>;

fn construct<T: SchemaType>(path: &str, io: &SharedIo) -> Arc<dyn RegisteredType> {
    Arc::new(T::new(path, io))
}

/// Map from type name to factory.
#[derive(Default)]
pub struct TypeRegistry {
    factories: RwLock<HashMap<TypeName, Factory>>,
}

impl TypeRegistry {
    /// An empty registry. The global one is [`registry()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema type under its own name. Re-registering overwrites.
    pub fn register<T: SchemaType>(&self) {
        self.register_factory(T::schema_type_name(), construct::<T>);
    }

    pub fn register_factory(&self, name: TypeName, factory: Factory) {
        if self.factories.write().insert(name.clone(), factory).is_some() {
            debug!(ty = %name, "replaced registered type");
        }
    }

    pub fn factory(&self, name: &TypeName) -> Option<Factory> {
        self.factories.read().get(name).copied()
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.factories.read().contains_key(name)
    }

    /// All registered names, sorted.
    pub fn registered_types(&self) -> Vec<TypeName> {
        let mut names: Vec<_> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}

fn register_builtin_types(registry: &TypeRegistry) {
    use crate::nwb::*;

    registry.register::<Container>();
    registry.register::<Data>();
    registry.register::<VectorData>();
    registry.register::<ElementIdentifiers>();
    registry.register::<DynamicTableRegion>();
    registry.register::<DynamicTable>();
    registry.register::<NwbContainer>();
    registry.register::<NwbDataInterface>();
    registry.register::<TimeSeries>();
    registry.register::<ProcessingModule>();
    registry.register::<ElectricalSeries>();
    registry.register::<SpikeEventSeries>();
    registry.register::<AnnotationSeries>();
    registry.register::<Device>();
    registry.register::<ElectrodeGroup>();
    registry.register::<ElectrodesTable>();
    registry.register::<NwbFile>();
}

static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(|| {
    let registry = TypeRegistry::new();
    register_builtin_types(&registry);
    registry
});

/// The process-wide registry, populated with the builtin types on first use.
pub fn registry() -> &'static TypeRegistry {
    &REGISTRY
}

/// Register a type with the global registry.
pub fn register<T: SchemaType>() {
    registry().register::<T>();
}

/// Downcast a registered object to its concrete type.
pub fn downcast<T: RegisteredType>(object: Arc<dyn RegisteredType>) -> Option<Arc<T>> {
    object.into_any().downcast::<T>().ok()
}

fn fallback_type(kind: StorageObjectType) -> Option<TypeName> {
    use crate::nwb::{Container, Data};
    match kind {
        StorageObjectType::Group => Some(Container::schema_type_name()),
        StorageObjectType::Dataset => Some(Data::schema_type_name()),
        _ => None,
    }
}

/// Build the object at `path` as type `name`.
///
/// A live object already tracked at `path` is returned as is. Otherwise the
/// registered factory builds it; unknown types fall back to
/// `hdmf-common::Container` (groups) or `hdmf-common::Data` (datasets) when
/// `fallback_to_base` is set. Every created object is tracked in the IO's
/// recording objects.
pub fn try_create_by_name(
    name: &TypeName,
    path: &str,
    io: &SharedIo,
    fallback_to_base: bool,
) -> Result<Arc<dyn RegisteredType>> {
    let path = normalize_path(path);
    let objects = io.recording_objects();
    if let Some(existing) = objects.get_by_path(&path) {
        return Ok(existing);
    }
    if let Some(factory) = registry().factory(name) {
        let object = factory(&path, io);
        objects.add(Arc::clone(&object));
        debug!(path = %path, ty = %name, "created registered object");
        return Ok(object);
    }
    if fallback_to_base {
        if let Some(base) = fallback_type(io.get_storage_object_type(&path)) {
            if base != *name {
                debug!(path = %path, ty = %name, fallback = %base, "falling back to base type");
                return try_create_by_name(&base, &path, io, false);
            }
        }
    }
    Err(Error::TypeNotRegistered(name.to_string()))
}

/// [`try_create_by_name`] that logs failures and returns `None`.
pub fn create_by_name(
    name: &TypeName,
    path: &str,
    io: &SharedIo,
    fallback_to_base: bool,
) -> Option<Arc<dyn RegisteredType>> {
    match try_create_by_name(name, path, io, fallback_to_base) {
        Ok(object) => Some(object),
        Err(e) => {
            warn!(path = %path, ty = %name, error = %e, "could not create registered object");
            None
        }
    }
}

/// Rebuild the object at `path` from its stored `namespace` and
/// `neurodata_type` attributes.
pub fn try_create(path: &str, io: &SharedIo, fallback_to_base: bool) -> Result<Arc<dyn RegisteredType>> {
    let namespace = io.read_string_attribute(&merge_paths(path, "namespace"));
    let type_name = io.read_string_attribute(&merge_paths(path, "neurodata_type"));
    match (namespace, type_name) {
        (Ok(namespace), Ok(type_name)) => {
            try_create_by_name(&TypeName::new(namespace, type_name), path, io, fallback_to_base)
        }
        _ => Err(Error::MissingTypeMetadata(normalize_path(path))),
    }
}

/// [`try_create`] that logs failures and returns `None`.
pub fn create(path: &str, io: &SharedIo, fallback_to_base: bool) -> Option<Arc<dyn RegisteredType>> {
    match try_create(path, io, fallback_to_base) {
        Ok(object) => Some(object),
        Err(e) => {
            warn!(path = %path, error = %e, "could not create registered object");
            None
        }
    }
}

/// Build `T` at `path` directly, without a registry lookup.
///
/// Returns the live tracked object when it already is a `T`; otherwise the
/// new object replaces whatever was tracked at `path`.
pub fn create_typed<T: SchemaType>(path: &str, io: &SharedIo) -> Arc<T> {
    let path = normalize_path(path);
    let objects = io.recording_objects();
    if let Some(existing) = objects.get_by_path(&path).and_then(downcast::<T>) {
        return existing;
    }
    let object = Arc::new(T::new(&path, io));
    objects.add(Arc::clone(&object) as Arc<dyn RegisteredType>);
    object
}

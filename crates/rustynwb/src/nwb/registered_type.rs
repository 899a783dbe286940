//! Base capability of every schema-backed object.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{
    ArrayDataSetConfig, Attribute, BaseIo, Dataset, ReadDataWrapper, RecordingData, SharedIo,
    StorageObjectType,
};
use crate::nwb::registry::{create_typed, TypeName};
use crate::utils::{merge_paths, normalize_path, path_name};

/// Storage capability a declared field binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Attribute,
    Dataset,
    /// A typed sub-object (group or dataset) created through the registry.
    Registered,
}

/// One entry of a type's `FIELDS` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    /// Path relative to the owning object.
    pub path: &'static str,
    pub kind: FieldKind,
    /// Expected element or object type, as written in the declaration.
    pub type_name: &'static str,
    pub doc: &'static str,
}

/// State shared by every registered type: its path, a weak IO reference and
/// the cache of write handles acquired for its datasets.
pub struct TypeBase {
    path: String,
    io: Weak<dyn BaseIo>,
    namespace: &'static str,
    type_name: &'static str,
    recording_data: Mutex<HashMap<String, Arc<dyn RecordingData>>>,
}

impl TypeBase {
    /// `namespace` and `type_name` name the outermost type; they are what
    /// gets written to storage when the object is initialized.
    pub fn new(path: &str, io: &SharedIo, namespace: &'static str, type_name: &'static str) -> Self {
        Self {
            path: normalize_path(path),
            io: Arc::downgrade(io),
            namespace,
            type_name,
            recording_data: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The IO, or [`Error::DanglingIo`] once it has been dropped.
    pub fn io(&self) -> Result<SharedIo> {
        self.io
            .upgrade()
            .ok_or_else(|| Error::DanglingIo(self.path.clone()))
    }

    pub fn weak_io(&self) -> Weak<dyn BaseIo> {
        self.io.clone()
    }

    /// Absolute path of a field.
    pub fn child_path(&self, relative: &str) -> String {
        merge_paths(&self.path, relative)
    }

    /// Create the object's group and tag it with its schema type.
    pub fn initialize_group(&self) -> Result<()> {
        let io = self.io()?;
        io.create_group(&self.path)?;
        io.create_common_nwb_attributes(&self.path, self.namespace, self.type_name)?;
        debug!(path = %self.path, ty = %self.type_name, "initialized group");
        Ok(())
    }

    /// Create an array dataset for a field and cache its write handle.
    pub fn create_array(
        &self,
        relative: &str,
        config: &ArrayDataSetConfig,
    ) -> Result<Arc<dyn RecordingData>> {
        let handle = self
            .io()?
            .create_array_data_set(config, &self.child_path(relative))?;
        self.recording_data
            .lock()
            .insert(relative.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Write handle for a field dataset.
    ///
    /// Returns the cached handle, or acquires one from the IO and caches it.
    /// Fails with [`Error::DatasetNotWritable`] when the dataset does not
    /// exist or cannot be written through this path.
    pub fn recording_data(&self, relative: &str) -> Result<Arc<dyn RecordingData>> {
        if let Some(handle) = self.recording_data.lock().get(relative) {
            return Ok(Arc::clone(handle));
        }
        self.reset_recording_data(relative)
    }

    /// Drop any cached handle for a field and acquire a fresh one.
    pub fn reset_recording_data(&self, relative: &str) -> Result<Arc<dyn RecordingData>> {
        let path = self.child_path(relative);
        let handle = self.io()?.get_data_set(&path).map_err(|e| match e {
            Error::ObjectNotFound(_) => Error::DatasetNotWritable(path.clone()),
            other => other,
        })?;
        self.recording_data
            .lock()
            .insert(relative.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn has_recording_data(&self, relative: &str) -> bool {
        self.recording_data.lock().contains_key(relative)
    }

    pub fn clear_recording_data_cache(&self) {
        self.recording_data.lock().clear();
    }

    pub fn dataset<T>(&self, relative: &str) -> ReadDataWrapper<Dataset, T> {
        ReadDataWrapper::new(self.weak_io(), self.child_path(relative))
    }

    pub fn attribute<T>(&self, relative: &str) -> ReadDataWrapper<Attribute, T> {
        ReadDataWrapper::new(self.weak_io(), self.child_path(relative))
    }

    /// The typed sub-object at `relative`, if it exists in storage.
    pub fn registered<T: crate::nwb::SchemaType>(&self, relative: &str) -> Option<Arc<T>> {
        let io = self.io().ok()?;
        let path = self.child_path(relative);
        match io.get_storage_object_type(&path) {
            StorageObjectType::Group | StorageObjectType::Dataset => Some(create_typed::<T>(&path, &io)),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBase")
            .field("path", &self.path)
            .field("type", &format_args!("{}::{}", self.namespace, self.type_name))
            .field("recording_data", &self.recording_data.lock().len())
            .finish()
    }
}

/// A schema-backed object bound to a path in a storage backend.
///
/// Objects hold only a weak reference to their IO and never close it.
/// Methods that touch storage fail with [`Error::DanglingIo`] once the IO has
/// been dropped.
pub trait RegisteredType: Any + Send + Sync + fmt::Debug {
    fn base(&self) -> &TypeBase;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn type_name(&self) -> &'static str {
        self.base().type_name()
    }

    fn namespace(&self) -> &'static str {
        self.base().namespace()
    }

    /// `namespace::type_name` of the concrete type.
    fn full_type_name(&self) -> TypeName {
        TypeName::new(self.namespace(), self.type_name())
    }

    fn path(&self) -> &str {
        self.base().path()
    }

    /// Last component of the path.
    fn name(&self) -> &str {
        path_name(self.path())
    }

    fn io(&self) -> Result<SharedIo> {
        self.base().io()
    }

    /// Write anything the object has deferred. Must be idempotent.
    fn finalize(&self) -> Result<()> {
        Ok(())
    }

    fn clear_recording_data_cache(&self) {
        self.base().clear_recording_data_cache();
    }

    /// Whether the object's group or dataset exists in storage.
    fn exists(&self) -> bool {
        self.io()
            .map(|io| io.object_exists(self.path()))
            .unwrap_or(false)
    }

    /// The stored `neurodata_type` attribute.
    fn read_neurodata_type(&self) -> ReadDataWrapper<Attribute, String> {
        self.base().attribute("neurodata_type")
    }

    /// The stored `namespace` attribute.
    fn read_namespace(&self) -> ReadDataWrapper<Attribute, String> {
        self.base().attribute("namespace")
    }

    /// The stored `object_id` attribute.
    fn read_object_id(&self) -> ReadDataWrapper<Attribute, String> {
        self.base().attribute("object_id")
    }
}

/// A registered type with a fixed schema name that can be built from
/// `(path, io)` alone. Only schema types can be added to the registry.
pub trait SchemaType: RegisteredType + Sized {
    const NAMESPACE: &'static str;
    const TYPE_NAME: &'static str;

    /// Bind a new, uninitialized object to `path`. Touches no storage.
    fn new(path: &str, io: &SharedIo) -> Self;

    fn schema_type_name() -> TypeName {
        TypeName::new(Self::NAMESPACE, Self::TYPE_NAME)
    }
}

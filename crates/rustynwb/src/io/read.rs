//! Lazy read wrappers for dataset and attribute fields.
//!
//! A [`ReadDataWrapper`] names one dataset or attribute without touching
//! storage. Probing ([`exists`](ReadDataWrapper::exists),
//! [`shape`](ReadDataWrapper::shape)) and reading happen only when asked.
//! Slicing exists only on dataset wrappers: attributes are always read whole,
//! so the methods are simply not defined for `ReadDataWrapper<Attribute, _>`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use crate::error::{Error, Result};
use crate::io::base::{BaseIo, SharedIo};
use crate::io::data_block::{DataBlock, DataBlockGeneric, Element};
use crate::io::selection::Selection;
use crate::io::types::{LinkArrayDataSetConfig, StorageObjectType};

mod sealed {
    pub trait Sealed {}
}

/// Storage kind a wrapper reads from.
pub trait StorageKind: sealed::Sealed + Send + Sync + 'static {
    const OBJECT_TYPE: StorageObjectType;
}

/// Marker for dataset-backed wrappers.
#[derive(Debug, Clone, Copy)]
pub struct Dataset;

/// Marker for attribute-backed wrappers.
#[derive(Debug, Clone, Copy)]
pub struct Attribute;

impl sealed::Sealed for Dataset {}
impl sealed::Sealed for Attribute {}

impl StorageKind for Dataset {
    const OBJECT_TYPE: StorageObjectType = StorageObjectType::Dataset;
}

impl StorageKind for Attribute {
    const OBJECT_TYPE: StorageObjectType = StorageObjectType::Attribute;
}

/// Element type marker for fields whose type is only known at run time.
#[derive(Debug, Clone, Copy)]
pub struct Untyped;

/// Lazy handle to a dataset or attribute of element type `T`.
pub struct ReadDataWrapper<K: StorageKind, T = Untyped> {
    io: Weak<dyn BaseIo>,
    path: String,
    _marker: PhantomData<fn() -> (K, T)>,
}

impl<K: StorageKind, T> Clone for ReadDataWrapper<K, T> {
    fn clone(&self) -> Self {
        Self {
            io: self.io.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: StorageKind, T> fmt::Debug for ReadDataWrapper<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadDataWrapper")
            .field("kind", &K::OBJECT_TYPE)
            .field("path", &self.path)
            .finish()
    }
}

impl<K: StorageKind, T> ReadDataWrapper<K, T> {
    pub fn new(io: Weak<dyn BaseIo>, path: impl Into<String>) -> Self {
        Self {
            io,
            path: path.into(),
            _marker: PhantomData,
        }
    }

    fn io(&self) -> Result<SharedIo> {
        self.io
            .upgrade()
            .ok_or_else(|| Error::DanglingIo(self.path.clone()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Kind of storage object the wrapper reads from.
    pub fn storage_object_type(&self) -> StorageObjectType {
        K::OBJECT_TYPE
    }

    /// Whether the dataset or attribute is present. False if the IO is gone.
    pub fn exists(&self) -> bool {
        let Ok(io) = self.io() else {
            return false;
        };
        match K::OBJECT_TYPE {
            StorageObjectType::Attribute => io.attribute_exists(&self.path),
            _ => io.get_storage_object_type(&self.path) == StorageObjectType::Dataset,
        }
    }

    pub fn shape(&self) -> Result<Vec<usize>> {
        self.io()?.get_storage_object_shape(&self.path)
    }

    /// Read the full contents without a static element type.
    pub fn values_generic(&self) -> Result<DataBlockGeneric> {
        let io = self.io()?;
        match K::OBJECT_TYPE {
            StorageObjectType::Attribute => io.read_attribute(&self.path),
            _ => io.read_dataset(&self.path, &Selection::All),
        }
    }

    /// Read the full contents as element type `U`.
    pub fn values_as<U: Element>(&self) -> Result<DataBlock<U>> {
        DataBlock::from_generic(self.values_generic()?)
    }
}

impl<K: StorageKind, T: Element> ReadDataWrapper<K, T> {
    /// Read the full contents as the field's declared element type.
    pub fn values(&self) -> Result<DataBlock<T>> {
        self.values_as::<T>()
    }
}

impl<T> ReadDataWrapper<Dataset, T> {
    /// Read a hyperslab. Empty arguments read everything.
    pub fn values_generic_slice(
        &self,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        block: &[usize],
    ) -> Result<DataBlockGeneric> {
        self.io()?
            .read_dataset_args(&self.path, start, count, stride, block)
    }

    /// Read a prepared selection.
    pub fn values_generic_selection(&self, selection: &Selection) -> Result<DataBlockGeneric> {
        self.io()?.read_dataset(&self.path, selection)
    }

    /// Link configuration that points a new dataset at this one.
    pub fn to_link_array_dataset_config(&self) -> LinkArrayDataSetConfig {
        LinkArrayDataSetConfig::new(self.path.clone())
    }
}

impl<T: Element> ReadDataWrapper<Dataset, T> {
    /// Typed hyperslab read.
    pub fn values_slice(
        &self,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        block: &[usize],
    ) -> Result<DataBlock<T>> {
        DataBlock::from_generic(self.values_generic_slice(start, count, stride, block)?)
    }
}

//! Value types shared by the storage interface and its callers.

use std::fmt;

use crate::io::data_block::DataValues;
use crate::io::data_type::BaseDataType;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Create the file, discarding any existing contents.
    Overwrite,
    /// Open an existing file for reading and writing.
    ReadWrite,
    /// Open an existing file for reading only.
    ReadOnly,
}

/// Recording state of an IO instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordState {
    /// No file is open.
    Closed,
    /// Open; groups, datasets and attributes may be created.
    Open,
    /// Streaming mode; only appends to existing datasets are allowed.
    Recording,
}

/// Kind of object found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageObjectType {
    Group,
    Dataset,
    Attribute,
    Undefined,
}

impl fmt::Display for StorageObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageObjectType::Group => write!(f, "group"),
            StorageObjectType::Dataset => write!(f, "dataset"),
            StorageObjectType::Attribute => write!(f, "attribute"),
            StorageObjectType::Undefined => write!(f, "undefined"),
        }
    }
}

/// Whether a type search descends into objects that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Record a typed object and do not search below it.
    StopOnType,
    /// Record a typed object and keep searching its children.
    ContinueOnType,
}

/// Value written by `create_attribute`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Numeric scalar or array; a single element is written as a scalar.
    Numeric(DataValues),
    /// Variable-length string scalar.
    String(String),
    /// Array of variable-length strings.
    StringArray(Vec<String>),
    /// Object reference to another path in the file.
    Reference(String),
}

impl AttrValue {
    pub fn f32(value: f32) -> Self {
        AttrValue::Numeric(DataValues::F32(vec![value]))
    }

    pub fn f64(value: f64) -> Self {
        AttrValue::Numeric(DataValues::F64(vec![value]))
    }

    pub fn i32(value: i32) -> Self {
        AttrValue::Numeric(DataValues::I32(vec![value]))
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

/// Type, initial shape and chunking of an extendable array dataset.
///
/// Every dimension is extendable; `shape` is the initial extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDataSetConfig {
    pub data_type: BaseDataType,
    pub shape: Vec<usize>,
    pub chunking: Vec<usize>,
}

impl ArrayDataSetConfig {
    pub fn new(data_type: BaseDataType, shape: Vec<usize>, chunking: Vec<usize>) -> Self {
        Self {
            data_type,
            shape,
            chunking,
        }
    }
}

/// A dataset that is a soft link to an existing dataset elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkArrayDataSetConfig {
    pub target: String,
}

impl LinkArrayDataSetConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Either a new array dataset or a link to an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSetConfig {
    Array(ArrayDataSetConfig),
    Link(LinkArrayDataSetConfig),
}

impl From<ArrayDataSetConfig> for DataSetConfig {
    fn from(config: ArrayDataSetConfig) -> Self {
        DataSetConfig::Array(config)
    }
}

impl From<LinkArrayDataSetConfig> for DataSetConfig {
    fn from(config: LinkArrayDataSetConfig) -> Self {
        DataSetConfig::Link(config)
    }
}

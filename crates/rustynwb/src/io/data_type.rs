//! Element type descriptions for datasets and attributes.

use std::fmt;

/// Element type tag carried by every generic data block.
///
/// This is the closed set of element types the store can hold; fixed and
/// variable length strings share the `Str` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
}

impl ElementType {
    /// True for every tag except `Str`.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ElementType::Str)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::U8 => write!(f, "u8"),
            ElementType::U16 => write!(f, "u16"),
            ElementType::U32 => write!(f, "u32"),
            ElementType::U64 => write!(f, "u64"),
            ElementType::I8 => write!(f, "i8"),
            ElementType::I16 => write!(f, "i16"),
            ElementType::I32 => write!(f, "i32"),
            ElementType::I64 => write!(f, "i64"),
            ElementType::F32 => write!(f, "f32"),
            ElementType::F64 => write!(f, "f64"),
            ElementType::Str => write!(f, "string"),
        }
    }
}

/// On-disk data type of a dataset, including string storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseDataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Fixed-length string with the given byte length.
    FixedStr(usize),
    /// Variable-length string.
    VarStr,
}

impl BaseDataType {
    /// The element tag values of this type are read back as.
    pub fn element_type(self) -> ElementType {
        match self {
            BaseDataType::U8 => ElementType::U8,
            BaseDataType::U16 => ElementType::U16,
            BaseDataType::U32 => ElementType::U32,
            BaseDataType::U64 => ElementType::U64,
            BaseDataType::I8 => ElementType::I8,
            BaseDataType::I16 => ElementType::I16,
            BaseDataType::I32 => ElementType::I32,
            BaseDataType::I64 => ElementType::I64,
            BaseDataType::F32 => ElementType::F32,
            BaseDataType::F64 => ElementType::F64,
            BaseDataType::FixedStr(_) | BaseDataType::VarStr => ElementType::Str,
        }
    }

    /// Size of one element in bytes (0 for variable-length strings).
    pub fn type_size(self) -> usize {
        match self {
            BaseDataType::U8 | BaseDataType::I8 => 1,
            BaseDataType::U16 | BaseDataType::I16 => 2,
            BaseDataType::U32 | BaseDataType::I32 | BaseDataType::F32 => 4,
            BaseDataType::U64 | BaseDataType::I64 | BaseDataType::F64 => 8,
            BaseDataType::FixedStr(n) => n,
            BaseDataType::VarStr => 0,
        }
    }
}

impl From<ElementType> for BaseDataType {
    fn from(t: ElementType) -> Self {
        match t {
            ElementType::U8 => BaseDataType::U8,
            ElementType::U16 => BaseDataType::U16,
            ElementType::U32 => BaseDataType::U32,
            ElementType::U64 => BaseDataType::U64,
            ElementType::I8 => BaseDataType::I8,
            ElementType::I16 => BaseDataType::I16,
            ElementType::I32 => BaseDataType::I32,
            ElementType::I64 => BaseDataType::I64,
            ElementType::F32 => BaseDataType::F32,
            ElementType::F64 => BaseDataType::F64,
            ElementType::Str => BaseDataType::VarStr,
        }
    }
}

impl fmt::Display for BaseDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseDataType::FixedStr(n) => write!(f, "string[{n}]"),
            BaseDataType::VarStr => write!(f, "vlen_string"),
            other => write!(f, "{}", other.element_type()),
        }
    }
}

//! Generic and typed data blocks.
//!
//! A [`DataBlockGeneric`] is the result of one read: a tagged vector of
//! elements plus the shape it was read with. [`DataBlock<T>`] is the same
//! data with a static element type, obtained through
//! [`DataBlock::from_generic`], which refuses to reinterpret elements of a
//! different type.
//!
//! ```
//! use rustynwb::io::{DataBlock, DataBlockGeneric, DataValues};
//!
//! let generic = DataBlockGeneric::new(DataValues::I32(vec![1, 2, 3, 4, 5, 6]), vec![2, 3]).unwrap();
//! let block = DataBlock::<i32>::from_generic(generic).unwrap();
//! let view = block.as_view();
//! assert_eq!(view.get(&[1, 2]), Some(&6));
//! assert!(DataBlock::<f32>::from_generic(block.into_generic()).is_err());
//! ```

use crate::error::{Error, Result};
use crate::io::data_type::{BaseDataType, ElementType};

/// Owned element storage, one variant per supported element type.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValues {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Str(Vec<String>),
}

/// Borrowed element storage used on the write path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataRef<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    U64(&'a [u64]),
    I8(&'a [i8]),
    I16(&'a [i16]),
    I32(&'a [i32]),
    I64(&'a [i64]),
    F32(&'a [f32]),
    F64(&'a [f64]),
    Str(&'a [String]),
}

/// Apply the same expression to the payload of every variant.
macro_rules! with_values {
    ($value:expr, $enum:ident, |$v:ident| $body:expr) => {
        match $value {
            $enum::U8($v) => $body,
            $enum::U16($v) => $body,
            $enum::U32($v) => $body,
            $enum::U64($v) => $body,
            $enum::I8($v) => $body,
            $enum::I16($v) => $body,
            $enum::I32($v) => $body,
            $enum::I64($v) => $body,
            $enum::F32($v) => $body,
            $enum::F64($v) => $body,
            $enum::Str($v) => $body,
        }
    };
}

/// Map every variant of one enum onto the same variant of another.
macro_rules! map_values {
    ($value:expr, $src:ident => $dst:ident, |$v:ident| $body:expr) => {
        match $value {
            $src::U8($v) => $dst::U8($body),
            $src::U16($v) => $dst::U16($body),
            $src::U32($v) => $dst::U32($body),
            $src::U64($v) => $dst::U64($body),
            $src::I8($v) => $dst::I8($body),
            $src::I16($v) => $dst::I16($body),
            $src::I32($v) => $dst::I32($body),
            $src::I64($v) => $dst::I64($body),
            $src::F32($v) => $dst::F32($body),
            $src::F64($v) => $dst::F64($body),
            $src::Str($v) => $dst::Str($body),
        }
    };
}

impl DataValues {
    /// An empty vector of the given element type.
    pub fn empty(element_type: ElementType) -> Self {
        match element_type {
            ElementType::U8 => DataValues::U8(Vec::new()),
            ElementType::U16 => DataValues::U16(Vec::new()),
            ElementType::U32 => DataValues::U32(Vec::new()),
            ElementType::U64 => DataValues::U64(Vec::new()),
            ElementType::I8 => DataValues::I8(Vec::new()),
            ElementType::I16 => DataValues::I16(Vec::new()),
            ElementType::I32 => DataValues::I32(Vec::new()),
            ElementType::I64 => DataValues::I64(Vec::new()),
            ElementType::F32 => DataValues::F32(Vec::new()),
            ElementType::F64 => DataValues::F64(Vec::new()),
            ElementType::Str => DataValues::Str(Vec::new()),
        }
    }

    /// A vector of `len` zero values (empty strings for `Str`).
    pub fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::U8 => DataValues::U8(vec![0; len]),
            ElementType::U16 => DataValues::U16(vec![0; len]),
            ElementType::U32 => DataValues::U32(vec![0; len]),
            ElementType::U64 => DataValues::U64(vec![0; len]),
            ElementType::I8 => DataValues::I8(vec![0; len]),
            ElementType::I16 => DataValues::I16(vec![0; len]),
            ElementType::I32 => DataValues::I32(vec![0; len]),
            ElementType::I64 => DataValues::I64(vec![0; len]),
            ElementType::F32 => DataValues::F32(vec![0.0; len]),
            ElementType::F64 => DataValues::F64(vec![0.0; len]),
            ElementType::Str => DataValues::Str(vec![String::new(); len]),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            DataValues::U8(_) => ElementType::U8,
            DataValues::U16(_) => ElementType::U16,
            DataValues::U32(_) => ElementType::U32,
            DataValues::U64(_) => ElementType::U64,
            DataValues::I8(_) => ElementType::I8,
            DataValues::I16(_) => ElementType::I16,
            DataValues::I32(_) => ElementType::I32,
            DataValues::I64(_) => ElementType::I64,
            DataValues::F32(_) => ElementType::F32,
            DataValues::F64(_) => ElementType::F64,
            DataValues::Str(_) => ElementType::Str,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, DataValues, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the payload.
    pub fn as_data_ref(&self) -> DataRef<'_> {
        map_values!(self, DataValues => DataRef, |v| v.as_slice())
    }

    /// Copy out the elements at the given flat indices.
    pub(crate) fn gather(&self, indices: &[usize]) -> DataValues {
        map_values!(self, DataValues => DataValues, |v| indices
            .iter()
            .map(|&i| v[i].clone())
            .collect())
    }

    /// Overwrite the elements at `indices` with `src`, converting numerics to
    /// this vector's element type.
    pub(crate) fn scatter(&mut self, indices: &[usize], src: DataRef<'_>) -> Result<()> {
        let converted = src.convert(self.element_type())?;
        macro_rules! put {
            ($dst:expr, $src:expr) => {{
                for (&i, value) in indices.iter().zip($src.into_iter()) {
                    $dst[i] = value;
                }
            }};
        }
        match (self, converted) {
            (DataValues::U8(d), DataValues::U8(s)) => put!(d, s),
            (DataValues::U16(d), DataValues::U16(s)) => put!(d, s),
            (DataValues::U32(d), DataValues::U32(s)) => put!(d, s),
            (DataValues::U64(d), DataValues::U64(s)) => put!(d, s),
            (DataValues::I8(d), DataValues::I8(s)) => put!(d, s),
            (DataValues::I16(d), DataValues::I16(s)) => put!(d, s),
            (DataValues::I32(d), DataValues::I32(s)) => put!(d, s),
            (DataValues::I64(d), DataValues::I64(s)) => put!(d, s),
            (DataValues::F32(d), DataValues::F32(s)) => put!(d, s),
            (DataValues::F64(d), DataValues::F64(s)) => put!(d, s),
            (DataValues::Str(d), DataValues::Str(s)) => put!(d, s),
            (d, s) => {
                return Err(Error::TypeMismatch {
                    expected: d.element_type(),
                    actual: s.element_type(),
                })
            }
        }
        Ok(())
    }
}

/// Intermediate representation for numeric casts.
enum Widened {
    Int(Vec<i128>),
    Float(Vec<f64>),
}

trait CastFrom: Sized {
    fn from_i128(v: i128) -> Self;
    fn from_f64(v: f64) -> Self;
}

// Conversions saturate at the target bounds; NaN becomes 0.
macro_rules! impl_cast_from_int {
    ($($t:ty),*) => {
        $(impl CastFrom for $t {
            fn from_i128(v: i128) -> Self {
                <$t>::try_from(v).unwrap_or(if v < 0 { <$t>::MIN } else { <$t>::MAX })
            }
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        })*
    };
}

macro_rules! impl_cast_from_float {
    ($($t:ty),*) => {
        $(impl CastFrom for $t {
            fn from_i128(v: i128) -> Self {
                v as $t
            }
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        })*
    };
}

impl_cast_from_int!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_cast_from_float!(f32, f64);

impl Widened {
    fn cast<T: CastFrom>(&self) -> Vec<T> {
        match self {
            Widened::Int(v) => v.iter().map(|&x| T::from_i128(x)).collect(),
            Widened::Float(v) => v.iter().map(|&x| T::from_f64(x)).collect(),
        }
    }
}

impl<'a> DataRef<'a> {
    pub fn element_type(&self) -> ElementType {
        match self {
            DataRef::U8(_) => ElementType::U8,
            DataRef::U16(_) => ElementType::U16,
            DataRef::U32(_) => ElementType::U32,
            DataRef::U64(_) => ElementType::U64,
            DataRef::I8(_) => ElementType::I8,
            DataRef::I16(_) => ElementType::I16,
            DataRef::I32(_) => ElementType::I32,
            DataRef::I64(_) => ElementType::I64,
            DataRef::F32(_) => ElementType::F32,
            DataRef::F64(_) => ElementType::F64,
            DataRef::Str(_) => ElementType::Str,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, DataRef, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_values(&self) -> DataValues {
        map_values!(self, DataRef => DataValues, |v| v.to_vec())
    }

    fn widen(&self) -> Option<Widened> {
        Some(match *self {
            DataRef::U8(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::U16(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::U32(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::U64(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::I8(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::I16(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::I32(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::I64(v) => Widened::Int(v.iter().map(|&x| x as i128).collect()),
            DataRef::F32(v) => Widened::Float(v.iter().map(|&x| x as f64).collect()),
            DataRef::F64(v) => Widened::Float(v.to_vec()),
            DataRef::Str(_) => return None,
        })
    }

    /// Copy into an owned vector of `target` type.
    ///
    /// Numeric types cast into each other the way a store converts between
    /// memory and file types; strings only convert to strings.
    pub fn convert(&self, target: ElementType) -> Result<DataValues> {
        let actual = self.element_type();
        if actual == target {
            return Ok(self.to_values());
        }
        let wide = match (target.is_numeric(), self.widen()) {
            (true, Some(wide)) => wide,
            _ => {
                return Err(Error::TypeMismatch {
                    expected: target,
                    actual,
                })
            }
        };
        Ok(match target {
            ElementType::U8 => DataValues::U8(wide.cast()),
            ElementType::U16 => DataValues::U16(wide.cast()),
            ElementType::U32 => DataValues::U32(wide.cast()),
            ElementType::U64 => DataValues::U64(wide.cast()),
            ElementType::I8 => DataValues::I8(wide.cast()),
            ElementType::I16 => DataValues::I16(wide.cast()),
            ElementType::I32 => DataValues::I32(wide.cast()),
            ElementType::I64 => DataValues::I64(wide.cast()),
            ElementType::F32 => DataValues::F32(wide.cast()),
            ElementType::F64 => DataValues::F64(wide.cast()),
            ElementType::Str => {
                return Err(Error::TypeMismatch {
                    expected: target,
                    actual,
                })
            }
        })
    }
}

mod sealed {
    pub trait Sealed {}
}

/// An element type that can live in a [`DataBlock`].
///
/// Implemented for the primitive numeric types and `String`; the set is
/// closed.
pub trait Element: Clone + Send + Sync + 'static + sealed::Sealed {
    const ELEMENT_TYPE: ElementType;

    fn into_values(data: Vec<Self>) -> DataValues;

    /// Unwrap a matching variant, handing the values back on mismatch.
    fn from_values(values: DataValues) -> std::result::Result<Vec<Self>, DataValues>;

    fn slice_ref(data: &[Self]) -> DataRef<'_>;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn into_values(data: Vec<Self>) -> DataValues {
                    DataValues::$variant(data)
                }

                fn from_values(values: DataValues) -> std::result::Result<Vec<Self>, DataValues> {
                    match values {
                        DataValues::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }

                fn slice_ref(data: &[Self]) -> DataRef<'_> {
                    DataRef::$variant(data)
                }
            }
        )*
    };
}

impl_element!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
);

/// Number of elements a shape holds; an empty shape is a scalar.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

fn check_shape(shape: &[usize], len: usize) -> Result<()> {
    let expected = element_count(shape);
    if expected != len {
        return Err(Error::ShapeMismatch {
            shape: shape.to_vec(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Type-erased result of reading a dataset or attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlockGeneric {
    data: DataValues,
    shape: Vec<usize>,
    base_data_type: BaseDataType,
}

impl DataBlockGeneric {
    /// Build a block, checking that `data` fills `shape` exactly.
    pub fn new(data: DataValues, shape: Vec<usize>) -> Result<Self> {
        let base_data_type = BaseDataType::from(data.element_type());
        Self::with_type(data, shape, base_data_type)
    }

    /// Build a block that records the stored data type, e.g. a fixed string.
    pub fn with_type(data: DataValues, shape: Vec<usize>, base_data_type: BaseDataType) -> Result<Self> {
        check_shape(&shape, data.len())?;
        if base_data_type.element_type() != data.element_type() {
            return Err(Error::TypeMismatch {
                expected: base_data_type.element_type(),
                actual: data.element_type(),
            });
        }
        Ok(Self {
            data,
            shape,
            base_data_type,
        })
    }

    /// A scalar block holding one string.
    pub fn scalar_string(value: impl Into<String>) -> Self {
        Self {
            data: DataValues::Str(vec![value.into()]),
            shape: Vec::new(),
            base_data_type: BaseDataType::VarStr,
        }
    }

    pub fn data(&self) -> &DataValues {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn base_data_type(&self) -> BaseDataType {
        self.base_data_type
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (DataValues, Vec<usize>) {
        (self.data, self.shape)
    }

    /// The string payload, if this block holds strings.
    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.data {
            DataValues::Str(v) => Some(v),
            _ => None,
        }
    }

    /// The first string of a string block; used for scalar string attributes.
    pub fn first_string(&self) -> Option<&str> {
        self.as_strings().and_then(|v| v.first()).map(String::as_str)
    }
}

/// A data block with a static element type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock<T: Element> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Element> DataBlock<T> {
    /// Build a block, checking that `data` fills `shape` exactly.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        check_shape(&shape, data.len())?;
        Ok(Self { data, shape })
    }

    /// A one-dimensional block.
    pub fn from_vec(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Convert a generic block, failing if the stored element type is not `T`.
    pub fn from_generic(generic: DataBlockGeneric) -> Result<Self> {
        let actual = generic.element_type();
        let (values, shape) = generic.into_parts();
        let data = T::from_values(values).map_err(|_| Error::TypeMismatch {
            expected: T::ELEMENT_TYPE,
            actual,
        })?;
        Ok(Self { data, shape })
    }

    pub fn into_generic(self) -> DataBlockGeneric {
        DataBlockGeneric {
            data: T::into_values(self.data),
            shape: self.shape,
            base_data_type: BaseDataType::from(T::ELEMENT_TYPE),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Row-major multi-dimensional view over the data.
    pub fn as_view(&self) -> ArrayView<'_, T> {
        ArrayView {
            data: &self.data,
            shape: &self.shape,
        }
    }
}

/// Borrowed row-major view of a block; the last dimension varies fastest.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    shape: &'a [usize],
}

impl<'a, T> ArrayView<'a, T> {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &'a [usize] {
        self.shape
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Element at a full multi-index.
    pub fn get(&self, index: &[usize]) -> Option<&'a T> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&i, &dim) in index.iter().zip(self.shape) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        self.data.get(flat)
    }

    /// View of the `i`-th slab along the first dimension.
    pub fn subview(&self, i: usize) -> Option<ArrayView<'a, T>> {
        let (&first, rest) = self.shape.split_first()?;
        if i >= first {
            return None;
        }
        let stride = element_count(rest);
        Some(ArrayView {
            data: &self.data[i * stride..(i + 1) * stride],
            shape: rest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generic_checks_shape() {
        assert!(DataBlockGeneric::new(DataValues::F32(vec![1.0, 2.0, 3.0]), vec![3]).is_ok());
        let err = DataBlockGeneric::new(DataValues::F32(vec![1.0, 2.0]), vec![3]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn scalar_holds_one_element() {
        let scalar = DataBlockGeneric::new(DataValues::I64(vec![7]), vec![]).unwrap();
        assert_eq!(scalar.len(), 1);
        assert!(DataBlockGeneric::new(DataValues::I64(vec![7, 8]), vec![]).is_err());
    }

    #[test]
    fn from_generic_rejects_wrong_type() {
        let generic = DataBlockGeneric::new(DataValues::I32(vec![1, 2]), vec![2]).unwrap();
        let err = DataBlock::<f64>::from_generic(generic).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: ElementType::F64,
                actual: ElementType::I32
            }
        );
    }

    #[test]
    fn from_generic_strings() {
        let generic = DataBlockGeneric::scalar_string("core");
        let block = DataBlock::<String>::from_generic(generic).unwrap();
        assert!(block.is_scalar());
        assert_eq!(block.data(), ["core".to_string()]);
    }

    #[test]
    fn fixed_string_type_must_hold_strings() {
        let bad = DataBlockGeneric::with_type(DataValues::U8(vec![1]), vec![1], BaseDataType::FixedStr(4));
        assert!(bad.is_err());
        let ok = DataBlockGeneric::with_type(
            DataValues::Str(vec!["abcd".into()]),
            vec![1],
            BaseDataType::FixedStr(4),
        )
        .unwrap();
        assert_eq!(ok.base_data_type(), BaseDataType::FixedStr(4));
    }

    #[test]
    fn view_indexing() {
        let block = DataBlock::new((0..24).collect::<Vec<u32>>(), vec![2, 3, 4]).unwrap();
        let view = block.as_view();
        assert_eq!(view.ndim(), 3);
        assert_eq!(view.get(&[1, 2, 3]), Some(&23));
        assert_eq!(view.get(&[0, 1, 0]), Some(&4));
        assert_eq!(view.get(&[2, 0, 0]), None);
        assert_eq!(view.get(&[0, 0]), None);

        let second = view.subview(1).unwrap();
        assert_eq!(second.shape(), &[3, 4]);
        assert_eq!(second.subview(0).unwrap().as_slice(), &[12, 13, 14, 15]);
        assert!(view.subview(2).is_none());
    }

    #[test]
    fn numeric_conversion() {
        let src = [1i32, -2, 300];
        let converted = DataRef::I32(&src).convert(ElementType::F64).unwrap();
        assert_eq!(converted, DataValues::F64(vec![1.0, -2.0, 300.0]));

        let floats = [1.9f32, 2.1];
        let converted = DataRef::F32(&floats).convert(ElementType::I16).unwrap();
        assert_eq!(converted, DataValues::I16(vec![1, 2]));
    }

    #[test]
    fn out_of_range_values_saturate() {
        let src = [300i32, -5, 200];
        let converted = DataRef::I32(&src).convert(ElementType::U8).unwrap();
        assert_eq!(converted, DataValues::U8(vec![255, 0, 200]));

        let src = [u64::MAX];
        let converted = DataRef::U64(&src).convert(ElementType::I64).unwrap();
        assert_eq!(converted, DataValues::I64(vec![i64::MAX]));

        let floats = [1e10f64, -1e10, f64::NAN];
        let converted = DataRef::F64(&floats).convert(ElementType::I16).unwrap();
        assert_eq!(converted, DataValues::I16(vec![i16::MAX, i16::MIN, 0]));
    }

    #[test]
    fn string_conversion_rejected() {
        let src = vec!["a".to_string()];
        assert!(DataRef::Str(&src).convert(ElementType::I32).is_err());
        assert!(DataRef::U8(&[1]).convert(ElementType::Str).is_err());
    }

    #[test]
    fn gather_and_scatter() {
        let values = DataValues::U16(vec![10, 20, 30, 40]);
        assert_eq!(values.gather(&[3, 0]), DataValues::U16(vec![40, 10]));

        let mut target = DataValues::zeros(ElementType::F32, 4);
        target.scatter(&[1, 3], DataRef::I32(&[5, 6])).unwrap();
        assert_eq!(target, DataValues::F32(vec![0.0, 5.0, 0.0, 6.0]));
    }

    proptest! {
        #[test]
        fn typed_block_shape_invariant(dims in proptest::collection::vec(0usize..5, 0..4)) {
            let len = element_count(&dims);
            let block = DataBlock::new(vec![0.5f64; len], dims.clone()).unwrap();
            if block.shape().is_empty() {
                prop_assert_eq!(block.len(), 1);
            } else {
                prop_assert_eq!(block.shape().iter().product::<usize>(), block.len());
            }
            prop_assert!(DataBlock::new(vec![0.5f64; len + 1], dims).is_err());
        }
    }
}

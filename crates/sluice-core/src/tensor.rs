//! Device-typed tensors layered over type-erased blob payloads.
//!
//! `Tensor<C>` bundles a shape with tagged element storage and is
//! parameterized by execution context, so a blob holding a CPU tensor is
//! distinguishable from one holding a GPU tensor of the same shape. Storage
//! here is host memory; anything fancier (pinned, device-resident) is a
//! backend concern layered behind the context.

use crate::context::Context;
use crate::{Error, Result};
use std::fmt;
use std::marker::PhantomData;

/// Runtime element-type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    I32,
    I64,
    Bool,
    U8,
}

impl DataType {
    /// Element size in bytes.
    pub fn size(self) -> usize {
        match self {
            DataType::F32 | DataType::I32 => 4,
            DataType::I64 => 8,
            DataType::Bool | DataType::U8 => 1,
        }
    }

    /// Short lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::Bool => "bool",
            DataType::U8 => "u8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw element storage, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
    U8(Vec<u8>),
}

impl TensorData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::U8(v) => v.len(),
        }
    }

    /// Check if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of this storage.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::F32(_) => DataType::F32,
            TensorData::I32(_) => DataType::I32,
            TensorData::I64(_) => DataType::I64,
            TensorData::Bool(_) => DataType::Bool,
            TensorData::U8(_) => DataType::U8,
        }
    }
}

/// Ties a Rust element type to its runtime descriptor and storage variant.
///
/// This is what the closed-type dispatch ladder matches against; see
/// [`crate::dispatch_tensor_types!`].
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: DataType;

    fn from_data(data: &TensorData) -> Option<&[Self]>;
    fn from_data_mut(data: &mut TensorData) -> Option<&mut Vec<Self>>;
    fn into_data(values: Vec<Self>) -> TensorData;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DataType = DataType::$variant;

            fn from_data(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_data_mut(data: &mut TensorData) -> Option<&mut Vec<Self>> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_data(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }
        }
    };
}

impl_element!(f32, F32);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(bool, Bool);
impl_element!(u8, U8);

/// A shaped, element-typed array bound to an execution context kind.
///
/// The context parameter never holds an instance; it tags the tensor so
/// device-typed operators can narrow a blob to "a tensor on my kind of
/// device" in one checked step.
pub struct Tensor<C: Context> {
    dims: Vec<usize>,
    data: TensorData,
    _context: PhantomData<fn() -> C>,
}

impl<C: Context> Tensor<C> {
    /// Create a tensor from dims and elements.
    ///
    /// Fails with a shape error when the element count does not match the
    /// product of the dims.
    pub fn new<E: Element>(dims: Vec<usize>, values: Vec<E>) -> Result<Self> {
        let expected: usize = dims.iter().product();
        if values.len() != expected {
            return Err(Error::shape(format!(
                "data length {} does not match shape {:?} (product = {})",
                values.len(),
                dims,
                expected
            )));
        }
        Ok(Self {
            dims,
            data: E::into_data(values),
            _context: PhantomData,
        })
    }

    /// Create a tensor with every element set to `value`.
    pub fn filled<E: Element>(dims: &[usize], value: E) -> Self {
        let numel = dims.iter().product();
        Self {
            dims: dims.to_vec(),
            data: E::into_data(vec![value; numel]),
            _context: PhantomData,
        }
    }

    /// The shape dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// The runtime element-type descriptor.
    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    /// Borrow the elements as `&[E]`.
    ///
    /// Fails with a type-mismatch error naming the stored element type.
    pub fn data<E: Element>(&self) -> Result<&[E]> {
        E::from_data(&self.data).ok_or_else(|| {
            Error::type_mismatch(format!(
                "tensor holds {} elements but {} was requested",
                self.dtype(),
                E::DTYPE
            ))
        })
    }

    /// Mutably borrow the elements as a `Vec<E>`.
    pub fn data_mut<E: Element>(&mut self) -> Result<&mut Vec<E>> {
        let dtype = self.dtype();
        E::from_data_mut(&mut self.data).ok_or_else(|| {
            Error::type_mismatch(format!(
                "tensor holds {} elements but {} was requested",
                dtype,
                E::DTYPE
            ))
        })
    }
}

/// An empty f32 tensor, so outputs can be allocated-or-reused in a blob.
impl<C: Context> Default for Tensor<C> {
    fn default() -> Self {
        Self {
            dims: vec![0],
            data: TensorData::F32(Vec::new()),
            _context: PhantomData,
        }
    }
}

impl<C: Context> Clone for Tensor<C> {
    fn clone(&self) -> Self {
        Self {
            dims: self.dims.clone(),
            data: self.data.clone(),
            _context: PhantomData,
        }
    }
}

impl<C: Context> PartialEq for Tensor<C> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.data == other.data
    }
}

impl<C: Context> fmt::Debug for Tensor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dims", &self.dims)
            .field("dtype", &self.dtype())
            .field("numel", &self.numel())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CpuContext;

    #[test]
    fn test_new_validates_shape_product() {
        let err = Tensor::<CpuContext>::new(vec![2, 4], vec![1.0f32; 6]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Shape);

        let t = Tensor::<CpuContext>::new(vec![2, 3], vec![1.0f32; 6]).unwrap();
        assert_eq!(t.numel(), 6);
        assert_eq!(t.ndim(), 2);
    }

    #[test]
    fn test_filled() {
        let t = Tensor::<CpuContext>::filled(&[5, 10], 3.14f32);
        assert_eq!(t.numel(), 50);
        assert_eq!(t.dtype(), DataType::F32);
        assert!(t.data::<f32>().unwrap().iter().all(|&v| v == 3.14));
    }

    #[test]
    fn test_data_type_mismatch() {
        let t = Tensor::<CpuContext>::new(vec![3], vec![1i64, 2, 3]).unwrap();
        let err = t.data::<f32>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("i64"));
    }

    #[test]
    fn test_data_mut() {
        let mut t = Tensor::<CpuContext>::new(vec![2], vec![1i32, 2]).unwrap();
        t.data_mut::<i32>().unwrap().iter_mut().for_each(|v| *v += 10);
        assert_eq!(t.data::<i32>().unwrap(), &[11, 12]);
    }

    #[test]
    fn test_default_is_empty() {
        let t = Tensor::<CpuContext>::default();
        assert_eq!(t.numel(), 0);
        assert_eq!(t.dtype(), DataType::F32);
    }

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(DataType::F32.size(), 4);
        assert_eq!(DataType::I64.size(), 8);
        assert_eq!(DataType::U8.size(), 1);
    }
}

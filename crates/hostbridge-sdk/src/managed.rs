//! Managed-side value model
//!
//! Managed values are statically typed. Arrays own their storage outright;
//! direct buffers borrow a byte region; references are handles to host values.

use crate::descriptor::{ElementKind, ScalarKind};
use crate::error::{BridgeError, BridgeResult};
use crate::host::HostValue;
use crate::region::{BufferElement, ByteOrder, ByteRegion, Region};

// ============================================================================
// ManagedValue
// ============================================================================

/// A value on the managed side of a call boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedValue<'r> {
    /// Null reference (text, boxed scalars, arrays, buffers, references)
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    Int8(i8),
    /// 16-bit integer
    Int16(i16),
    /// UTF-16 code unit
    Char(u16),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// Text
    Text(String),
    /// Rectangular array, owned
    Array(ManagedArray<'r>),
    /// Direct buffer, borrowed
    Buffer(DirectBuffer<'r>),
    /// Handle to a host value
    Ref(HostHandle<'r>),
}

impl ManagedValue<'_> {
    /// Type name used in diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            ManagedValue::Null => "null",
            ManagedValue::Bool(_) => "bool",
            ManagedValue::Int8(_) => "i8",
            ManagedValue::Int16(_) => "i16",
            ManagedValue::Char(_) => "char",
            ManagedValue::Int32(_) => "i32",
            ManagedValue::Int64(_) => "i64",
            ManagedValue::Float32(_) => "f32",
            ManagedValue::Float64(_) => "f64",
            ManagedValue::Text(_) => "text",
            ManagedValue::Array(_) => "array",
            ManagedValue::Buffer(_) => "buffer",
            ManagedValue::Ref(_) => "ref",
        }
    }

    /// Scalar kind of a scalar value
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            ManagedValue::Bool(_) => ScalarKind::Bool,
            ManagedValue::Int8(_) => ScalarKind::Int8,
            ManagedValue::Int16(_) => ScalarKind::Int16,
            ManagedValue::Char(_) => ScalarKind::Char,
            ManagedValue::Int32(_) => ScalarKind::Int32,
            ManagedValue::Int64(_) => ScalarKind::Int64,
            ManagedValue::Float32(_) => ScalarKind::Float32,
            ManagedValue::Float64(_) => ScalarKind::Float64,
            ManagedValue::Text(_) => ScalarKind::Text,
            _ => return None,
        })
    }

    /// Whether this is the null reference
    pub const fn is_null(&self) -> bool {
        matches!(self, ManagedValue::Null)
    }
}

// ============================================================================
// ManagedArray
// ============================================================================

/// Managed array: typed storage at depth 1, nested arrays above.
///
/// A `Nested` array is expected to be rectangular; the array converter
/// rejects jagged ones.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedArray<'r> {
    /// `bool[]`
    Bool(Vec<bool>),
    /// `i8[]`
    Int8(Vec<i8>),
    /// `i16[]`
    Int16(Vec<i16>),
    /// `char[]`
    Char(Vec<u16>),
    /// `i32[]`
    Int32(Vec<i32>),
    /// `i64[]`
    Int64(Vec<i64>),
    /// `f32[]`
    Float32(Vec<f32>),
    /// `f64[]`
    Float64(Vec<f64>),
    /// `text[]`, elements nullable
    Text(Vec<Option<String>>),
    /// `buffer<_>[]`, elements nullable
    Buffer(Vec<Option<DirectBuffer<'r>>>),
    /// `ref[]`, elements nullable
    Ref(Vec<Option<HostHandle<'r>>>),
    /// One more dimension
    Nested(Vec<ManagedArray<'r>>),
}

impl<'r> ManagedArray<'r> {
    /// Length of the outermost dimension
    pub fn len(&self) -> usize {
        match self {
            ManagedArray::Bool(v) => v.len(),
            ManagedArray::Int8(v) => v.len(),
            ManagedArray::Int16(v) => v.len(),
            ManagedArray::Char(v) => v.len(),
            ManagedArray::Int32(v) => v.len(),
            ManagedArray::Int64(v) => v.len(),
            ManagedArray::Float32(v) => v.len(),
            ManagedArray::Float64(v) => v.len(),
            ManagedArray::Text(v) => v.len(),
            ManagedArray::Buffer(v) => v.len(),
            ManagedArray::Ref(v) => v.len(),
            ManagedArray::Nested(v) => v.len(),
        }
    }

    /// Whether the outermost dimension is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage name used in diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            ManagedArray::Bool(_) => "bool[]",
            ManagedArray::Int8(_) => "i8[]",
            ManagedArray::Int16(_) => "i16[]",
            ManagedArray::Char(_) => "char[]",
            ManagedArray::Int32(_) => "i32[]",
            ManagedArray::Int64(_) => "i64[]",
            ManagedArray::Float32(_) => "f32[]",
            ManagedArray::Float64(_) => "f64[]",
            ManagedArray::Text(_) => "text[]",
            ManagedArray::Buffer(_) => "buffer[]",
            ManagedArray::Ref(_) => "ref[]",
            ManagedArray::Nested(_) => "nested array",
        }
    }

    /// Wrap `inner` in `levels` more single-element dimensions
    pub fn nest(inner: ManagedArray<'r>, levels: usize) -> Self {
        (0..levels).fold(inner, |acc, _| ManagedArray::Nested(vec![acc]))
    }

    /// Descend through the first element of each nested dimension
    pub fn innermost(&self) -> &ManagedArray<'r> {
        match self {
            ManagedArray::Nested(children) => match children.first() {
                Some(child) => child.innermost(),
                None => self,
            },
            leaf => leaf,
        }
    }
}

// ============================================================================
// DirectBuffer
// ============================================================================

/// Managed direct buffer: a byte region read as elements of one kind in an
/// explicit byte order.
///
/// Buffers are handles; cloning one aliases the same bytes.
#[derive(Debug, Clone)]
pub struct DirectBuffer<'r> {
    region: Region<'r>,
    kind: ElementKind,
    order: ByteOrder,
}

impl<'r> DirectBuffer<'r> {
    /// Buffer over `region`
    pub fn new(region: Region<'r>, kind: ElementKind, order: ByteOrder) -> Self {
        Self {
            region,
            kind,
            order,
        }
    }

    /// Buffer over a managed allocation
    pub fn over(owner: &'r ByteRegion, kind: ElementKind, order: ByteOrder) -> Self {
        Self::new(owner.region(), kind, order)
    }

    /// Underlying bytes
    pub fn region(&self) -> &Region<'r> {
        &self.region
    }

    /// Element kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Byte order
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Number of elements (byte length ÷ element width)
    pub fn len(&self) -> usize {
        self.region.element_count(self.kind)
    }

    /// Whether the buffer has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read element `index`
    pub fn get<T: BufferElement>(&self, index: usize) -> BridgeResult<T> {
        self.check_kind::<T>()?;
        self.region
            .read_element(self.kind, self.order, index)
            .map(T::from_bits)
            .ok_or(BridgeError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    /// Write element `index`
    pub fn put<T: BufferElement>(&self, index: usize, value: T) -> BridgeResult<()> {
        self.check_kind::<T>()?;
        if self
            .region
            .write_element(self.kind, self.order, index, value.to_bits())
        {
            Ok(())
        } else {
            Err(BridgeError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }

    fn check_kind<T: BufferElement>(&self) -> BridgeResult<()> {
        if T::KIND == self.kind {
            Ok(())
        } else {
            Err(BridgeError::mismatch(
                format!("{} element", self.kind),
                T::KIND.name(),
            ))
        }
    }
}

impl PartialEq for DirectBuffer<'_> {
    /// Buffers are equal when they alias the same bytes the same way
    fn eq(&self, other: &Self) -> bool {
        self.region.same_bytes(&other.region) && self.kind == other.kind && self.order == other.order
    }
}

// ============================================================================
// HostHandle
// ============================================================================

/// Managed handle to an opaque host value.
///
/// The handle carries the host value itself; nothing is copied and the value
/// is never inspected. `slot` is set when the handle was interned.
#[derive(Debug, Clone)]
pub struct HostHandle<'r> {
    target: HostValue<'r>,
    slot: Option<u64>,
}

impl<'r> HostHandle<'r> {
    /// Handle around `target`
    pub fn new(target: HostValue<'r>, slot: Option<u64>) -> Self {
        Self { target, slot }
    }

    /// The host value
    pub fn target(&self) -> &HostValue<'r> {
        &self.target
    }

    /// Consume the handle, returning the host value
    pub fn into_target(self) -> HostValue<'r> {
        self.target
    }

    /// Interning slot, if interned
    pub fn slot(&self) -> Option<u64> {
        self.slot
    }

    /// Whether both handles name the same host value.
    ///
    /// Interned handles compare by slot; otherwise by host identity.
    pub fn same_handle(&self, other: &HostHandle<'_>) -> bool {
        match (self.slot, other.slot) {
            (Some(a), Some(b)) => a == b,
            _ => self.target.same_identity(&other.target),
        }
    }
}

impl PartialEq for HostHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_access() {
        let owner = ByteRegion::allocate(8);
        let buffer = DirectBuffer::over(&owner, ElementKind::Int32, ByteOrder::native());
        assert_eq!(buffer.len(), 2);
        buffer.put(0, 2i32).unwrap();
        buffer.put(1, 3i32).unwrap();
        assert_eq!(buffer.get::<i32>(0).unwrap() + buffer.get::<i32>(1).unwrap(), 5);

        assert_eq!(
            buffer.get::<i32>(2),
            Err(BridgeError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert!(matches!(
            buffer.put(0, 1.0f32),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_buffer_clone_aliases() {
        let owner = ByteRegion::allocate(4);
        let buffer = DirectBuffer::over(&owner, ElementKind::Uint8, ByteOrder::Little);
        let alias = buffer.clone();
        alias.put(3, 0xFFu8).unwrap();
        assert_eq!(buffer.get::<u8>(3).unwrap(), 0xFF);
        assert_eq!(buffer, alias);
    }

    #[test]
    fn test_array_shape_helpers() {
        let array = ManagedArray::nest(ManagedArray::Float32(vec![5.5]), 2);
        assert_eq!(array.len(), 1);
        assert_eq!(array.innermost(), &ManagedArray::Float32(vec![5.5]));
        assert_eq!(array.type_name(), "nested array");
    }

    #[test]
    fn test_scalar_kind_and_null() {
        assert_eq!(ManagedValue::Char(65).scalar_kind(), Some(ScalarKind::Char));
        assert_eq!(ManagedValue::Text("x".into()).scalar_kind(), Some(ScalarKind::Text));
        assert_eq!(ManagedValue::Int64(1).scalar_kind(), Some(ScalarKind::Int64));
        assert_eq!(ManagedValue::Null.scalar_kind(), None);
        assert_eq!(ManagedValue::Array(ManagedArray::Int8(vec![])).scalar_kind(), None);

        assert!(ManagedValue::Null.is_null());
        assert!(!ManagedValue::Bool(false).is_null());
        assert!(!ManagedValue::Text(String::new()).is_null());
    }

    #[test]
    fn test_empty_buffers_do_not_alias() {
        let a = ByteRegion::allocate(0);
        let b = ByteRegion::allocate(0);
        let left = DirectBuffer::over(&a, ElementKind::Uint8, ByteOrder::native());
        let right = DirectBuffer::over(&b, ElementKind::Uint8, ByteOrder::native());
        assert_eq!(left.len(), 0);
        assert_ne!(left, right);
    }

    #[test]
    fn test_handle_same_handle() {
        let target = HostValue::array(vec![]);
        let a = HostHandle::new(target.clone(), None);
        let b = HostHandle::new(target, None);
        assert!(a.same_handle(&b));

        let other = HostHandle::new(HostValue::array(vec![]), None);
        assert!(!a.same_handle(&other));
        // Structurally equal, different identity
        assert_eq!(a, other);

        let x = HostHandle::new(HostValue::Number(1.0), Some(4));
        let y = HostHandle::new(HostValue::Number(1.0), Some(5));
        assert!(!x.same_handle(&y));
    }
}

//! Host-side value model
//!
//! The host runtime is dynamically typed: numbers are `f64`, 64-bit integers
//! travel as arbitrary-precision integers, arrays and objects are shared
//! references with identity, and typed views interpret a byte region without
//! owning a copy of it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::descriptor::ElementKind;
use crate::region::{BufferElement, ByteOrder, Region};

// ============================================================================
// HostValue
// ============================================================================

/// A value owned by the host runtime
#[derive(Clone, Default)]
pub enum HostValue<'r> {
    /// Absent value
    #[default]
    Undefined,
    /// Null reference
    Null,
    /// Boolean
    Boolean(bool),
    /// Number (always a 64-bit float)
    Number(f64),
    /// Arbitrary-precision integer
    BigInt(i128),
    /// String
    String(Rc<str>),
    /// Dynamic array
    Array(HostArray<'r>),
    /// Typed binary view
    View(TypedView<'r>),
    /// Object with named properties
    Object(HostObject<'r>),
}

impl<'r> HostValue<'r> {
    /// Create a string value
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        HostValue::String(s.into())
    }

    /// Create a fresh array holding `items`
    pub fn array(items: Vec<HostValue<'r>>) -> Self {
        HostValue::Array(HostArray::from_vec(items))
    }

    /// Type name used in diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::BigInt(_) => "bigint",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::View(_) => "typed view",
            HostValue::Object(_) => "object",
        }
    }

    /// Whether this is `null` or `undefined`
    pub const fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract an arbitrary-precision integer
    pub fn as_bigint(&self) -> Option<i128> {
        match self {
            HostValue::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as array
    pub fn as_array(&self) -> Option<&HostArray<'r>> {
        match self {
            HostValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as typed view
    pub fn as_view(&self) -> Option<&TypedView<'r>> {
        match self {
            HostValue::View(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as object
    pub fn as_object(&self) -> Option<&HostObject<'r>> {
        match self {
            HostValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Identity of a host reference; primitives have none.
    ///
    /// A view is identified by its bytes together with its interpretation, so
    /// two views of different kinds over one region are distinct. A view over
    /// an empty borrowed region has no identity.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            HostValue::String(s) => Some(Identity::Address(Rc::as_ptr(s) as *const u8 as usize)),
            HostValue::Array(a) => Some(Identity::Address(a.address())),
            HostValue::View(v) => Some(Identity::View {
                address: v.region().address()?,
                bytes: v.region().len(),
                kind: v.kind(),
                order: v.order(),
            }),
            HostValue::Object(o) => Some(Identity::Address(o.address())),
            _ => None,
        }
    }

    /// Strict identity: references compare by address, primitives by value
    pub fn same_identity(&self, other: &HostValue<'_>) -> bool {
        match (self, other) {
            (HostValue::View(a), HostValue::View(b)) => a.same_view(b),
            (HostValue::String(_), HostValue::String(_))
            | (HostValue::Array(_), HostValue::Array(_))
            | (HostValue::Object(_), HostValue::Object(_)) => self.identity() == other.identity(),
            _ => self == other,
        }
    }
}

/// Identity key of a host reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Heap address of a string, array or object
    Address(usize),
    /// Region start and length plus the view's interpretation
    View {
        /// Start of the viewed bytes
        address: usize,
        /// Length of the viewed bytes
        bytes: usize,
        /// Element kind
        kind: ElementKind,
        /// Byte order
        order: ByteOrder,
    },
}

impl PartialEq<HostValue<'_>> for HostValue<'_> {
    /// Structural for primitives, strings and arrays; identity for views and
    /// objects.
    fn eq(&self, other: &HostValue<'_>) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Boolean(a), HostValue::Boolean(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::BigInt(a), HostValue::BigInt(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => {
                a.ptr_eq(b) || *a.0.borrow() == *b.0.borrow()
            }
            (HostValue::View(a), HostValue::View(b)) => a.same_view(b),
            (HostValue::Object(a), HostValue::Object(b)) => a.address() == b.address(),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::BigInt(i) => write!(f, "{}n", i),
            HostValue::String(s) => write!(f, "{:?}", s),
            HostValue::Array(a) => fmt::Debug::fmt(a, f),
            HostValue::View(v) => fmt::Debug::fmt(v, f),
            HostValue::Object(o) => fmt::Debug::fmt(o, f),
        }
    }
}

/// Host number → integer bits.
///
/// Truncates toward zero and reduces modulo 2^64, so the low bytes of the
/// result are the two's-complement wraparound for any narrower width.
/// NaN and infinities become 0.
pub fn wrap_integer(x: f64) -> u64 {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

    if !x.is_finite() {
        return 0;
    }
    let t = x.trunc();
    if t.abs() < TWO_POW_63 {
        return t as i64 as u64;
    }
    // |t| >= 2^63 is a multiple of 2^11, so the reduction is exact
    t.rem_euclid(TWO_POW_64) as u64
}

// ============================================================================
// HostArray
// ============================================================================

/// Shared, growable host array
#[derive(Clone, Default)]
pub struct HostArray<'r>(Rc<RefCell<Vec<HostValue<'r>>>>);

impl<'r> HostArray<'r> {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(Vec::with_capacity(capacity))))
    }

    /// Create an array holding `items`
    pub fn from_vec(items: Vec<HostValue<'r>>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Element at `index`, `undefined` past the end
    pub fn get(&self, index: usize) -> HostValue<'r> {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Store at `index`, filling any gap with `undefined`
    pub fn set(&self, index: usize, value: HostValue<'r>) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, HostValue::Undefined);
        }
        items[index] = value;
    }

    /// Append an element
    pub fn push(&self, value: HostValue<'r>) {
        self.0.borrow_mut().push(value);
    }

    /// Snapshot of the elements (elements themselves are shared, not copied)
    pub fn to_vec(&self) -> Vec<HostValue<'r>> {
        self.0.borrow().clone()
    }

    /// Whether both handles refer to the same array
    pub fn ptr_eq(&self, other: &HostArray<'_>) -> bool {
        self.address() == other.address()
    }

    /// Address used as the array's identity
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl fmt::Debug for HostArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

// ============================================================================
// HostObject
// ============================================================================

/// Shared host object with named properties
#[derive(Clone, Default)]
pub struct HostObject<'r>(Rc<RefCell<FxHashMap<String, HostValue<'r>>>>);

impl<'r> HostObject<'r> {
    /// Create an object with no properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Property value, `undefined` when absent
    pub fn get(&self, name: &str) -> HostValue<'r> {
        self.0.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Set a property
    pub fn set(&self, name: impl Into<String>, value: HostValue<'r>) {
        self.0.borrow_mut().insert(name.into(), value);
    }

    /// Whether the property exists
    pub fn has(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Property names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &HostObject<'_>) -> bool {
        self.address() == other.address()
    }

    /// Address used as the object's identity
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl fmt::Debug for HostObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("keys", &self.keys())
            .finish()
    }
}

// ============================================================================
// TypedView
// ============================================================================

/// Host typed binary view over a byte region.
///
/// The view never owns a private copy of its bytes: cloning it, or building a
/// managed buffer from it, shares the same region. Elements are decoded in the
/// view's byte order on every access.
#[derive(Clone)]
pub struct TypedView<'r> {
    region: Region<'r>,
    kind: ElementKind,
    order: ByteOrder,
}

impl TypedView<'static> {
    /// Allocate a zero-filled host view of `len` elements in native order
    pub fn allocate(kind: ElementKind, len: usize) -> Self {
        Self::new(Region::allocate(len * kind.width()), kind, ByteOrder::native())
    }
}

impl<'r> TypedView<'r> {
    /// View `region` as elements of `kind` stored in `order`
    pub fn new(region: Region<'r>, kind: ElementKind, order: ByteOrder) -> Self {
        Self {
            region,
            kind,
            order,
        }
    }

    /// Underlying bytes
    pub fn region(&self) -> &Region<'r> {
        &self.region
    }

    /// Element kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Byte order of stored elements
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.region.element_count(self.kind)
    }

    /// Whether the view has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both views cover the same bytes with the same interpretation
    pub fn same_view(&self, other: &TypedView<'_>) -> bool {
        self.region.same_bytes(&other.region) && self.kind == other.kind && self.order == other.order
    }

    /// Element at `index` as a host value; `undefined` past the end.
    pub fn get(&self, index: usize) -> HostValue<'r> {
        match self.region.read_element(self.kind, self.order, index) {
            Some(bits) => decode_element(self.kind, bits),
            None => HostValue::Undefined,
        }
    }

    /// Store a host value at `index` with typed-array coercion.
    ///
    /// Numbers wrap (integer kinds) or round (`Float32`); `Int64` views take
    /// only arbitrary-precision integers. Writes past the end and values with
    /// no numeric reading are ignored; the return value reports whether the
    /// store happened.
    pub fn set(&self, index: usize, value: &HostValue<'_>) -> bool {
        match encode_element(self.kind, value) {
            Some(bits) => self.region.write_element(self.kind, self.order, index, bits),
            None => false,
        }
    }

    /// Typed read; `None` past the end or when `T` is not the view's kind
    pub fn get_as<T: BufferElement>(&self, index: usize) -> Option<T> {
        if T::KIND != self.kind {
            return None;
        }
        self.region
            .read_element(self.kind, self.order, index)
            .map(T::from_bits)
    }

    /// Typed write; `false` past the end or when `T` is not the view's kind
    pub fn set_as<T: BufferElement>(&self, index: usize, value: T) -> bool {
        T::KIND == self.kind
            && self
                .region
                .write_element(self.kind, self.order, index, value.to_bits())
    }
}

impl fmt::Debug for TypedView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.view_name())?;
        f.debug_list()
            .entries((0..self.len()).map(|i| self.get(i)))
            .finish()?;
        write!(f, ")")
    }
}

fn decode_element<'r>(kind: ElementKind, bits: u64) -> HostValue<'r> {
    match kind {
        ElementKind::Int8 => HostValue::Number(f64::from(i8::from_bits(bits))),
        ElementKind::Uint8 => HostValue::Number(f64::from(u8::from_bits(bits))),
        ElementKind::Int16 => HostValue::Number(f64::from(i16::from_bits(bits))),
        ElementKind::Uint16 => HostValue::Number(f64::from(u16::from_bits(bits))),
        ElementKind::Int32 => HostValue::Number(f64::from(i32::from_bits(bits))),
        ElementKind::Uint32 => HostValue::Number(f64::from(u32::from_bits(bits))),
        ElementKind::Int64 => HostValue::BigInt(i128::from(i64::from_bits(bits))),
        ElementKind::Float32 => {
            HostValue::Number(f64::from(<f32 as BufferElement>::from_bits(bits)))
        }
        ElementKind::Float64 => HostValue::Number(<f64 as BufferElement>::from_bits(bits)),
    }
}

fn encode_element(kind: ElementKind, value: &HostValue<'_>) -> Option<u64> {
    if kind == ElementKind::Int64 {
        return value.as_bigint().map(|i| i as i64 as u64);
    }
    let n = match value {
        HostValue::Number(n) => *n,
        HostValue::Boolean(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    Some(match kind {
        ElementKind::Float32 => BufferElement::to_bits(n as f32),
        ElementKind::Float64 => BufferElement::to_bits(n),
        _ => wrap_integer(n),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_integer() {
        assert_eq!(wrap_integer(300.0) as u8 as i8, 44);
        assert_eq!(wrap_integer(200.0) as u8 as i8, -56);
        assert_eq!(wrap_integer(-1.0) as u16, u16::MAX);
        assert_eq!(wrap_integer(3.9), 3);
        assert_eq!(wrap_integer(-3.9) as i64, -3);
        assert_eq!(wrap_integer(f64::NAN), 0);
        assert_eq!(wrap_integer(f64::INFINITY), 0);
        assert_eq!(wrap_integer(4_294_967_296.0 + 5.0) as u32, 5);
        assert_eq!(wrap_integer(-9_223_372_036_854_775_808.0) as i64, i64::MIN);
        assert_eq!(wrap_integer(18_446_744_073_709_551_616.0 * 3.0), 0);
    }

    #[test]
    fn test_array_is_shared() {
        let array = HostArray::from_vec(vec![HostValue::Number(1.0)]);
        let alias = array.clone();
        alias.set(0, HostValue::Number(2.0));
        assert_eq!(array.get(0), HostValue::Number(2.0));
        assert!(array.ptr_eq(&alias));
        assert_eq!(array.get(5), HostValue::Undefined);

        alias.set(2, HostValue::Boolean(true));
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(1), HostValue::Undefined);
    }

    #[test]
    fn test_array_equality_is_structural() {
        let a = HostValue::array(vec![HostValue::string("x"), HostValue::Number(1.0)]);
        let b = HostValue::array(vec![HostValue::string("x"), HostValue::Number(1.0)]);
        assert_eq!(a, b);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }

    #[test]
    fn test_object_properties() {
        let obj = HostObject::new();
        obj.set("b", HostValue::Number(2.0));
        obj.set("a", HostValue::Boolean(true));
        assert_eq!(obj.get("a"), HostValue::Boolean(true));
        assert_eq!(obj.get("missing"), HostValue::Undefined);
        assert!(obj.has("b"));
        assert_eq!(obj.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_view_coercion() {
        let view = TypedView::allocate(ElementKind::Int8, 2);
        assert!(view.set(0, &HostValue::Number(300.0)));
        assert_eq!(view.get(0), HostValue::Number(44.0));
        assert!(!view.set(2, &HostValue::Number(1.0)));
        assert_eq!(view.get(2), HostValue::Undefined);
        assert!(!view.set(1, &HostValue::string("7")));

        let floats = TypedView::allocate(ElementKind::Float32, 1);
        floats.set(0, &HostValue::Number(0.1));
        assert_eq!(floats.get(0), HostValue::Number(f64::from(0.1f32)));

        let longs = TypedView::allocate(ElementKind::Int64, 1);
        assert!(!longs.set(0, &HostValue::Number(1.0)));
        assert!(longs.set(0, &HostValue::BigInt(i128::from(i64::MAX))));
        assert_eq!(longs.get(0), HostValue::BigInt(i128::from(i64::MAX)));
    }

    #[test]
    fn test_view_typed_access() {
        let view = TypedView::allocate(ElementKind::Int32, 2);
        assert!(view.set_as::<i32>(1, -7));
        assert_eq!(view.get_as::<i32>(1), Some(-7));
        assert_eq!(view.get_as::<u32>(1), None);
        assert!(!view.set_as::<f32>(0, 1.0));
    }

    #[test]
    fn test_view_identity_includes_kind() {
        let region = Region::allocate(8);
        let bytes = HostValue::View(TypedView::new(region.clone(), ElementKind::Uint8, ByteOrder::native()));
        let floats = HostValue::View(TypedView::new(region.clone(), ElementKind::Float32, ByteOrder::native()));
        let again = HostValue::View(TypedView::new(region, ElementKind::Uint8, ByteOrder::native()));
        assert_ne!(bytes.identity(), floats.identity());
        assert_eq!(bytes.identity(), again.identity());
        assert!(!bytes.same_identity(&floats));
        assert!(bytes.same_identity(&again));
    }

    #[test]
    fn test_empty_views_have_no_identity() {
        let a = crate::region::ByteRegion::allocate(0);
        let b = crate::region::ByteRegion::allocate(0);
        let left = HostValue::View(TypedView::new(a.region(), ElementKind::Uint8, ByteOrder::native()));
        let right = HostValue::View(TypedView::new(b.region(), ElementKind::Uint8, ByteOrder::native()));
        assert_eq!(left.identity(), None);
        assert!(!left.same_identity(&right));
        assert_ne!(left, right);

        let owned = HostValue::View(TypedView::allocate(ElementKind::Uint8, 0));
        assert!(owned.identity().is_some());
        assert!(owned.same_identity(&owned.clone()));
    }

    #[test]
    fn test_array_built_by_push() {
        let array = HostArray::with_capacity(2);
        assert!(array.is_empty());
        array.push(HostValue::Number(1.0));
        array.push(HostValue::string("two"));
        assert_eq!(array.len(), 2);
        assert_eq!(
            HostValue::Array(array),
            HostValue::array(vec![HostValue::Number(1.0), HostValue::string("two")])
        );
    }

    #[test]
    fn test_view_debug_format() {
        let view = TypedView::allocate(ElementKind::Uint16, 2);
        view.set(1, &HostValue::Number(64.0));
        assert_eq!(format!("{:?}", view), "Uint16Array([0, 64])");
    }
}

//! Byte regions shared between direct buffers and typed views
//!
//! A region is a run of `Cell<u8>`, so both the managed buffer and the host
//! view can read and write the same bytes through shared borrows. Regions are
//! `!Sync`; a buffer and its view can only be used from one thread.
//!
//! Element access always goes through an explicit [`ByteOrder`]. Nothing in
//! this module assumes native order.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::descriptor::ElementKind;

// ============================================================================
// ByteOrder
// ============================================================================

/// Byte order of multi-byte elements in a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the running platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// Whether this is the platform's byte order
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

// ============================================================================
// Region
// ============================================================================

/// Storage behind a buffer or view.
///
/// `Borrowed` regions come from a managed [`ByteRegion`] and cannot outlive
/// it. `Shared` regions are host-allocated and reference counted. Cloning a
/// region never copies the bytes.
#[derive(Clone)]
pub enum Region<'r> {
    /// Borrowed from a managed allocation
    Borrowed(&'r [Cell<u8>]),
    /// Host-allocated
    Shared(Rc<[Cell<u8>]>),
}

impl Region<'static> {
    /// Allocate a zero-filled host region
    pub fn allocate(len: usize) -> Self {
        Region::Shared(vec![Cell::new(0); len].into())
    }

    /// Allocate a host region holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Region::Shared(bytes.iter().copied().map(Cell::new).collect())
    }
}

impl<'r> Region<'r> {
    /// Whether both regions are the very same bytes.
    ///
    /// Shared regions compare by allocation. An empty borrowed region has no
    /// address of its own and is never the same as any other region.
    pub fn same_bytes(&self, other: &Region<'_>) -> bool {
        match (self, other) {
            (Region::Shared(a), Region::Shared(b)) => Rc::ptr_eq(a, b),
            _ => match (self.address(), other.address()) {
                (Some(a), Some(b)) => a == b && self.len() == other.len(),
                _ => false,
            },
        }
    }

    /// Start address, used as the region's identity.
    ///
    /// `None` for an empty borrowed region, whose pointer is dangling and
    /// shared by every other empty allocation.
    pub fn address(&self) -> Option<usize> {
        match self {
            Region::Borrowed(bytes) if bytes.is_empty() => None,
            _ => Some(self.as_ptr() as usize),
        }
    }

    /// Snapshot of the current contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().map(Cell::get).collect()
    }

    /// Read the element at `index` as raw bits in the given order.
    ///
    /// Returns `None` past the end of the region.
    pub fn read_element(&self, kind: ElementKind, order: ByteOrder, index: usize) -> Option<u64> {
        let bytes = self.element_bytes(kind, index)?;
        let mut raw = [0u8; 8];
        Some(match order {
            ByteOrder::Little => {
                copy_out(bytes, &mut raw[..bytes.len()]);
                u64::from_le_bytes(raw)
            }
            ByteOrder::Big => {
                copy_out(bytes, &mut raw[8 - bytes.len()..]);
                u64::from_be_bytes(raw)
            }
        })
    }

    /// Write raw bits to the element at `index` in the given order.
    ///
    /// Returns `false` (and writes nothing) past the end of the region.
    pub fn write_element(
        &self,
        kind: ElementKind,
        order: ByteOrder,
        index: usize,
        bits: u64,
    ) -> bool {
        let Some(bytes) = self.element_bytes(kind, index) else {
            return false;
        };
        let width = bytes.len();
        match order {
            ByteOrder::Little => copy_in(&bits.to_le_bytes()[..width], bytes),
            ByteOrder::Big => copy_in(&bits.to_be_bytes()[8 - width..], bytes),
        }
        true
    }

    /// Number of whole elements of `kind` that fit in the region
    pub fn element_count(&self, kind: ElementKind) -> usize {
        self.len() / kind.width()
    }

    fn element_bytes(&self, kind: ElementKind, index: usize) -> Option<&[Cell<u8>]> {
        let width = kind.width();
        let start = index.checked_mul(width)?;
        let end = start.checked_add(width)?;
        self.get(start..end)
    }
}

fn copy_out(from: &[Cell<u8>], to: &mut [u8]) {
    for (dst, src) in to.iter_mut().zip(from) {
        *dst = src.get();
    }
}

fn copy_in(from: &[u8], to: &[Cell<u8>]) {
    for (dst, src) in to.iter().zip(from) {
        dst.set(*src);
    }
}

impl Deref for Region<'_> {
    type Target = [Cell<u8>];

    fn deref(&self) -> &Self::Target {
        match self {
            Region::Borrowed(bytes) => *bytes,
            Region::Shared(bytes) => &bytes[..],
        }
    }
}

impl fmt::Debug for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("address", &format_args!("{:#x}", self.as_ptr() as usize))
            .field("len", &self.len())
            .field("shared", &matches!(self, Region::Shared(_)))
            .finish()
    }
}

// ============================================================================
// ByteRegion
// ============================================================================

/// Managed direct allocation.
///
/// Buffers over a `ByteRegion` borrow it, so the compiler keeps every buffer
/// and every host view derived from one inside the allocation's lifetime.
pub struct ByteRegion {
    bytes: Box<[Cell<u8>]>,
}

impl ByteRegion {
    /// Allocate `len` zeroed bytes
    pub fn allocate(len: usize) -> Self {
        Self {
            bytes: vec![Cell::new(0); len].into_boxed_slice(),
        }
    }

    /// Allocate a region holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().map(Cell::new).collect(),
        }
    }

    /// Borrow the region
    pub fn region(&self) -> Region<'_> {
        Region::Borrowed(&self.bytes)
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region has no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Snapshot of the current contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.iter().map(Cell::get).collect()
    }
}

impl fmt::Debug for ByteRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRegion").field("len", &self.len()).finish()
    }
}

// ============================================================================
// BufferElement
// ============================================================================

/// Rust type stored in a region as one element of [`BufferElement::KIND`]
pub trait BufferElement: Copy {
    /// Element kind this type is stored as
    const KIND: ElementKind;

    /// Decode from the low `KIND.width()` bytes of `bits`
    fn from_bits(bits: u64) -> Self;

    /// Encode into the low `KIND.width()` bytes
    fn to_bits(self) -> u64;
}

macro_rules! int_element {
    ($ty:ty, $unsigned:ty, $kind:ident) => {
        impl BufferElement for $ty {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn from_bits(bits: u64) -> Self {
                bits as $unsigned as $ty
            }

            #[inline]
            fn to_bits(self) -> u64 {
                self as $unsigned as u64
            }
        }
    };
}

int_element!(i8, u8, Int8);
int_element!(u8, u8, Uint8);
int_element!(i16, u16, Int16);
int_element!(u16, u16, Uint16);
int_element!(i32, u32, Int32);
int_element!(u32, u32, Uint32);
int_element!(i64, u64, Int64);

impl BufferElement for f32 {
    const KIND: ElementKind = ElementKind::Float32;

    #[inline]
    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }

    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }
}

impl BufferElement for f64 {
    const KIND: ElementKind = ElementKind::Float64;

    #[inline]
    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    #[inline]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }
}

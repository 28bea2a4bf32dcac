//! Type classifier and dispatcher
//!
//! Classification is purely structural: an exhaustive match over the closed
//! descriptor set picks one category per slot, and the call scope routes the
//! value to the converter for that category.

use std::fmt;

use tracing::debug;

use hostbridge_sdk::{
    BridgeError, BridgeResult, ElementKind, HostValue, ManagedValue, ScalarKind, TypeDescriptor,
};

use crate::array::ArrayConverter;
use crate::buffer::{buffer_to_host, buffer_to_managed};
use crate::config::BridgeConfig;
use crate::reference::ReferenceBridge;
use crate::scalar::{boxed_to_host, boxed_to_managed, scalar_to_host, scalar_to_managed};

/// Which way a value crosses the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Managed → host
    ToHost,
    /// Host → managed
    ToManaged,
}

/// Element category of an array at depth 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    /// Scalars (text included)
    Scalar(ScalarKind),
    /// Direct buffers
    Buffer(ElementKind),
    /// Opaque references
    Reference,
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Scalar(kind) => write!(f, "{}", kind),
            Leaf::Buffer(kind) => write!(f, "buffer<{}>", kind),
            Leaf::Reference => f.write_str("ref"),
        }
    }
}

/// Conversion strategy chosen for a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Scalar converter
    Scalar(ScalarKind),
    /// Scalar converter with null passthrough
    Boxed(ScalarKind),
    /// Array converter over `depth` dimensions
    Array {
        /// Element category at depth 1
        leaf: Leaf,
        /// Number of dimensions
        depth: u8,
    },
    /// Buffer view adapter
    Buffer(ElementKind),
    /// Reference bridge
    Reference,
}

/// A value on either side of the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryValue<'r> {
    /// Managed side
    Managed(ManagedValue<'r>),
    /// Host side
    Host(HostValue<'r>),
}

/// Entry point of the bridge: classifies descriptors and opens call scopes
#[derive(Debug, Clone, Default)]
pub struct Marshaller {
    config: BridgeConfig,
}

impl Marshaller {
    /// Create a marshaller with `config`
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Pick the conversion strategy for `descriptor`.
    ///
    /// Fails with `UnsupportedTypeKind` for arrays of depth 0 or deeper than
    /// `max_array_depth`, arrays of arrays or boxed scalars, and `boxed<text>`.
    pub fn classify(&self, descriptor: &TypeDescriptor) -> BridgeResult<Category> {
        let unsupported = |why: &str| {
            Err(BridgeError::UnsupportedTypeKind(format!("{} ({})", descriptor, why)))
        };

        match descriptor {
            TypeDescriptor::Scalar(kind) => Ok(Category::Scalar(*kind)),
            TypeDescriptor::Boxed(ScalarKind::Text) => unsupported("text is already nullable"),
            TypeDescriptor::Boxed(kind) => Ok(Category::Boxed(*kind)),
            TypeDescriptor::Buffer(kind) => Ok(Category::Buffer(*kind)),
            TypeDescriptor::Reference => Ok(Category::Reference),
            TypeDescriptor::Array { element, depth } => {
                if *depth == 0 {
                    return unsupported("array depth 0");
                }
                if *depth > self.config.max_array_depth {
                    return unsupported("array too deep");
                }
                let leaf = match element.as_ref() {
                    TypeDescriptor::Scalar(kind) => Leaf::Scalar(*kind),
                    TypeDescriptor::Buffer(kind) => Leaf::Buffer(*kind),
                    TypeDescriptor::Reference => Leaf::Reference,
                    TypeDescriptor::Boxed(_) => return unsupported("boxed array element"),
                    TypeDescriptor::Array { .. } => return unsupported("nested array element"),
                };
                Ok(Category::Array {
                    leaf,
                    depth: *depth,
                })
            }
        }
    }

    /// Open a scope for one call
    pub fn scope<'r>(&self) -> CallScope<'_, 'r> {
        CallScope {
            marshaller: self,
            references: ReferenceBridge::new(self.config.intern_references),
        }
    }

    /// Convert one managed value to the host in a scope of its own
    pub fn to_host<'r>(
        &self,
        descriptor: &TypeDescriptor,
        value: &ManagedValue<'r>,
    ) -> BridgeResult<HostValue<'r>> {
        self.scope().to_host(descriptor, value)
    }

    /// Convert one host value to the managed side in a scope of its own
    pub fn to_managed<'r>(
        &self,
        descriptor: &TypeDescriptor,
        value: &HostValue<'r>,
    ) -> BridgeResult<ManagedValue<'r>> {
        self.scope().to_managed(descriptor, value)
    }
}

/// Conversions belonging to one call.
///
/// Reference interning, when enabled, is shared by every conversion made
/// through the same scope and dropped with it.
#[derive(Debug)]
pub struct CallScope<'m, 'r> {
    marshaller: &'m Marshaller,
    references: ReferenceBridge<'r>,
}

impl<'m, 'r> CallScope<'m, 'r> {
    /// Reference bridge of this scope
    pub fn references(&self) -> &ReferenceBridge<'r> {
        &self.references
    }

    fn arrays(&self) -> ArrayConverter<'_, 'r> {
        ArrayConverter::new(&self.marshaller.config, &self.references)
    }

    /// Managed → host
    pub fn to_host(
        &self,
        descriptor: &TypeDescriptor,
        value: &ManagedValue<'r>,
    ) -> BridgeResult<HostValue<'r>> {
        let category = self.marshaller.classify(descriptor)?;
        debug!(direction = ?Direction::ToHost, descriptor = %descriptor, "dispatch");

        match category {
            Category::Scalar(kind) => scalar_to_host(kind, value),
            Category::Boxed(kind) => boxed_to_host(kind, value),
            Category::Array { leaf, depth } => match value {
                ManagedValue::Null => Ok(HostValue::Null),
                ManagedValue::Array(array) => self.arrays().to_host(leaf, depth, array),
                other => Err(BridgeError::mismatch(descriptor.to_string(), other.type_name())),
            },
            Category::Buffer(kind) => buffer_to_host(kind, value),
            Category::Reference => self.references.unwrap(value),
        }
    }

    /// Host → managed
    pub fn to_managed(
        &self,
        descriptor: &TypeDescriptor,
        value: &HostValue<'r>,
    ) -> BridgeResult<ManagedValue<'r>> {
        let category = self.marshaller.classify(descriptor)?;
        debug!(direction = ?Direction::ToManaged, descriptor = %descriptor, "dispatch");

        match category {
            Category::Scalar(kind) => scalar_to_managed(kind, value),
            Category::Boxed(kind) => boxed_to_managed(kind, value),
            Category::Array { leaf, depth } => {
                if value.is_nullish() {
                    return Ok(ManagedValue::Null);
                }
                Ok(ManagedValue::Array(self.arrays().to_managed(leaf, depth, value)?))
            }
            Category::Buffer(kind) => buffer_to_managed(kind, value),
            Category::Reference => Ok(self.references.wrap(value)),
        }
    }

    /// Convert `value` in `direction`; the value must be on the source side
    pub fn convert(
        &self,
        direction: Direction,
        descriptor: &TypeDescriptor,
        value: &BoundaryValue<'r>,
    ) -> BridgeResult<BoundaryValue<'r>> {
        match (direction, value) {
            (Direction::ToHost, BoundaryValue::Managed(v)) => {
                self.to_host(descriptor, v).map(BoundaryValue::Host)
            }
            (Direction::ToManaged, BoundaryValue::Host(v)) => {
                self.to_managed(descriptor, v).map(BoundaryValue::Managed)
            }
            (Direction::ToHost, BoundaryValue::Host(_)) => {
                Err(BridgeError::mismatch("managed value", "host value"))
            }
            (Direction::ToManaged, BoundaryValue::Managed(_)) => {
                Err(BridgeError::mismatch("host value", "managed value"))
            }
        }
    }
}

//! Call-boundary type descriptors
//!
//! A descriptor is fixed per parameter/return/property slot and is known
//! before any value exists. Descriptors have a compact text form:
//!
//! ```text
//! scalars:    bool i8 i16 char i32 i64 f32 f64 text
//! wrappers:   boxed<i32>
//! buffers:    buffer<f32>      (i8 u8 i16 u16 i32 u32 i64 f32 f64)
//! references: ref
//! arrays:     f32[][]          (one [] per dimension)
//! signatures: (i32[], buffer<f32>) -> f64      (or -> void)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

// ============================================================================
// ScalarKind
// ============================================================================

/// Primitive value categories of the managed side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Boolean
    Bool,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// UTF-16 code unit
    Char,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer (host side: arbitrary-precision integer)
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Text
    Text,
}

impl ScalarKind {
    /// Descriptor spelling of this kind
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int8 => "i8",
            ScalarKind::Int16 => "i16",
            ScalarKind::Char => "char",
            ScalarKind::Int32 => "i32",
            ScalarKind::Int64 => "i64",
            ScalarKind::Float32 => "f32",
            ScalarKind::Float64 => "f64",
            ScalarKind::Text => "text",
        }
    }

    /// Typed-view element kind with the same storage, if any.
    ///
    /// Booleans and text have no typed-view counterpart.
    pub const fn element_kind(self) -> Option<ElementKind> {
        match self {
            ScalarKind::Int8 => Some(ElementKind::Int8),
            ScalarKind::Int16 => Some(ElementKind::Int16),
            ScalarKind::Char => Some(ElementKind::Uint16),
            ScalarKind::Int32 => Some(ElementKind::Int32),
            ScalarKind::Int64 => Some(ElementKind::Int64),
            ScalarKind::Float32 => Some(ElementKind::Float32),
            ScalarKind::Float64 => Some(ElementKind::Float64),
            ScalarKind::Bool | ScalarKind::Text => None,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => ScalarKind::Bool,
            "i8" => ScalarKind::Int8,
            "i16" => ScalarKind::Int16,
            "char" => ScalarKind::Char,
            "i32" => ScalarKind::Int32,
            "i64" => ScalarKind::Int64,
            "f32" => ScalarKind::Float32,
            "f64" => ScalarKind::Float64,
            "text" => ScalarKind::Text,
            _ => return None,
        })
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ElementKind
// ============================================================================

/// Fixed-width element interpretation of a byte region.
///
/// Shared by managed direct buffers and host typed views; the width is the
/// element stride in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Signed 8-bit
    Int8,
    /// Unsigned 8-bit
    Uint8,
    /// Signed 16-bit
    Int16,
    /// Unsigned 16-bit
    Uint16,
    /// Signed 32-bit
    Int32,
    /// Unsigned 32-bit
    Uint32,
    /// Signed 64-bit, read as a host arbitrary-precision integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
}

impl ElementKind {
    /// Element stride in bytes
    pub const fn width(self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 => 1,
            ElementKind::Int16 | ElementKind::Uint16 => 2,
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float32 => 4,
            ElementKind::Int64 | ElementKind::Float64 => 8,
        }
    }

    /// Descriptor spelling of this kind
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "i8",
            ElementKind::Uint8 => "u8",
            ElementKind::Int16 => "i16",
            ElementKind::Uint16 => "u16",
            ElementKind::Int32 => "i32",
            ElementKind::Uint32 => "u32",
            ElementKind::Int64 => "i64",
            ElementKind::Float32 => "f32",
            ElementKind::Float64 => "f64",
        }
    }

    /// Name of the host typed view over elements of this kind
    pub const fn view_name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Int64 => "BigInt64Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "i8" => ElementKind::Int8,
            "u8" => ElementKind::Uint8,
            "i16" => ElementKind::Int16,
            "u16" => ElementKind::Uint16,
            "i32" => ElementKind::Int32,
            "u32" => ElementKind::Uint32,
            "i64" => ElementKind::Int64,
            "f32" => ElementKind::Float32,
            "f64" => ElementKind::Float64,
            _ => return None,
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Declared type of a call-boundary slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Primitive scalar (or non-nullable text)
    Scalar(ScalarKind),
    /// Nullable wrapper around a scalar
    Boxed(ScalarKind),
    /// Homogeneous array of `depth` dimensions over `element`
    Array {
        /// Leaf element descriptor
        element: Box<TypeDescriptor>,
        /// Number of dimensions
        depth: u8,
    },
    /// Direct buffer viewed with the given element kind
    Buffer(ElementKind),
    /// Opaque host reference
    Reference,
}

impl TypeDescriptor {
    /// Array descriptor over `element` with `depth` dimensions
    pub fn array(element: TypeDescriptor, depth: u8) -> Self {
        TypeDescriptor::Array {
            element: Box::new(element),
            depth,
        }
    }

    /// Descriptor of one element of this array, one dimension shallower.
    ///
    /// Returns `None` for non-array descriptors.
    pub fn component(&self) -> Option<TypeDescriptor> {
        match self {
            TypeDescriptor::Array { element, depth } if *depth > 1 => {
                Some(TypeDescriptor::array((**element).clone(), depth - 1))
            }
            TypeDescriptor::Array { element, .. } => Some((**element).clone()),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(kind) => write!(f, "{}", kind),
            TypeDescriptor::Boxed(kind) => write!(f, "boxed<{}>", kind),
            TypeDescriptor::Array { element, depth } => {
                write!(f, "{}", element)?;
                for _ in 0..*depth {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeDescriptor::Buffer(kind) => write!(f, "buffer<{}>", kind),
            TypeDescriptor::Reference => f.write_str("ref"),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || BridgeError::UnsupportedTypeKind(s.to_string());

        let mut base = s.trim();
        let mut depth: usize = 0;
        while let Some(rest) = base.strip_suffix("[]") {
            base = rest.trim_end();
            depth += 1;
        }

        let leaf = if base == "ref" {
            TypeDescriptor::Reference
        } else if let Some(inner) = generic_arg(base, "boxed") {
            TypeDescriptor::Boxed(ScalarKind::parse(inner).ok_or_else(unsupported)?)
        } else if let Some(inner) = generic_arg(base, "buffer") {
            TypeDescriptor::Buffer(ElementKind::parse(inner).ok_or_else(unsupported)?)
        } else {
            TypeDescriptor::Scalar(ScalarKind::parse(base).ok_or_else(unsupported)?)
        };

        if depth == 0 {
            return Ok(leaf);
        }
        let depth = u8::try_from(depth).map_err(|_| unsupported())?;
        Ok(TypeDescriptor::array(leaf, depth))
    }
}

/// `name<arg>` → `arg`
fn generic_arg<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
        .map(str::trim)
}

// ============================================================================
// Signature
// ============================================================================

/// Parameter and return descriptors of one host operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameter descriptors in call order
    pub params: Vec<TypeDescriptor>,
    /// Return descriptor; `None` for `void`
    pub ret: Option<TypeDescriptor>,
}

impl Signature {
    /// Build a signature from parts
    pub fn new(params: Vec<TypeDescriptor>, ret: Option<TypeDescriptor>) -> Self {
        Self { params, ret }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(") -> ")?;
        match &self.ret {
            Some(ret) => write!(f, "{}", ret),
            None => f.write_str("void"),
        }
    }
}

impl FromStr for Signature {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || BridgeError::UnsupportedTypeKind(s.to_string());

        let (params, ret) = s.split_once("->").ok_or_else(unsupported)?;
        let params = params
            .trim()
            .strip_prefix('(')
            .and_then(|p| p.strip_suffix(')'))
            .ok_or_else(unsupported)?
            .trim();

        let params = if params.is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(str::parse)
                .collect::<Result<Vec<TypeDescriptor>, _>>()?
        };

        let ret = match ret.trim() {
            "void" => None,
            other => Some(other.parse()?),
        };

        Ok(Signature { params, ret })
    }
}

//! Error types for bridge conversions

use crate::descriptor::ScalarKind;

/// Result type for bridge conversions
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while converting a call-boundary slot.
///
/// Every failure is fatal to the conversion that raised it: no partially
/// converted value is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The descriptor matches no conversion category
    #[error("Unsupported type kind: {0}")]
    UnsupportedTypeKind(String),

    /// A multi-dimensional array is jagged where a rectangular one is required
    #[error("Shape mismatch at nesting level {level}: expected length {expected}, got {found}")]
    ShapeMismatch {
        /// Nesting level (0 is the outermost sequence)
        level: usize,
        /// Length established by the first sibling at this level
        expected: usize,
        /// Length of the offending sibling
        found: usize,
    },

    /// The host value cannot be interpreted as the target scalar at all
    #[error("Cannot convert {found} to {kind}")]
    ScalarRange {
        /// Target scalar kind
        kind: ScalarKind,
        /// Host type name of the rejected value
        found: &'static str,
    },

    /// A value's representation disagrees with its declared descriptor
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        /// Expected representation
        expected: String,
        /// Actual representation
        found: &'static str,
    },

    /// Element index outside a direct buffer
    #[error("Index {index} out of bounds for buffer of {len} elements")]
    IndexOutOfBounds {
        /// Requested element index
        index: usize,
        /// Element count of the buffer
        len: usize,
    },

    /// Argument count differs from the call signature
    #[error("Arity mismatch: expected {expected} arguments, got {found}")]
    ArityMismatch {
        /// Parameter count of the signature
        expected: usize,
        /// Number of arguments supplied
        found: usize,
    },
}

impl BridgeError {
    /// Shorthand for a [`BridgeError::TypeMismatch`]
    pub fn mismatch(expected: impl Into<String>, found: &'static str) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.into(),
            found,
        }
    }
}

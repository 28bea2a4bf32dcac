//! Scalar converter
//!
//! Per-type conversions between managed scalars and host values:
//!
//! | kind            | host form | host → managed                        |
//! |-----------------|-----------|---------------------------------------|
//! | bool            | boolean   | verbatim                              |
//! | i8 / i16 / i32  | number    | truncate, wrap to width (also bigint) |
//! | char            | number    | truncate, wrap to 16 bits unsigned    |
//! | i64             | bigint    | wrap to 64 bits; numbers rejected     |
//! | f32             | number    | round to nearest f32                  |
//! | f64             | number    | verbatim                              |
//! | text            | string    | verbatim; null/undefined → null       |
//!
//! Narrowing is never an error. `ScalarRange` is raised only for host values
//! with no reading as the target kind at all.

use hostbridge_sdk::{
    wrap_integer, BridgeError, BridgeResult, HostValue, ManagedValue, ScalarKind,
};

/// Convert a managed scalar into a host value.
pub trait ToHost {
    /// Convert to a host value
    fn to_host<'r>(self) -> HostValue<'r>;
}

/// Convert a host value into a managed scalar.
pub trait FromHost: Sized {
    /// Scalar kind produced
    const KIND: ScalarKind;

    /// Convert, failing only when the value has no reading as `KIND`
    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self>;
}

fn range_error(kind: ScalarKind, value: &HostValue<'_>) -> BridgeError {
    BridgeError::ScalarRange {
        kind,
        found: value.type_name(),
    }
}

// ============================================================================
// Primitive implementations
// ============================================================================

impl ToHost for bool {
    fn to_host<'r>(self) -> HostValue<'r> {
        HostValue::Boolean(self)
    }
}

impl FromHost for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        value.as_bool().ok_or_else(|| range_error(Self::KIND, value))
    }
}

macro_rules! narrow_int {
    ($ty:ty, $unsigned:ty, $kind:ident) => {
        impl ToHost for $ty {
            fn to_host<'r>(self) -> HostValue<'r> {
                HostValue::Number(f64::from(self))
            }
        }

        impl FromHost for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
                match value {
                    HostValue::Number(n) => Ok(wrap_integer(*n) as $unsigned as $ty),
                    HostValue::BigInt(i) => Ok(*i as $unsigned as $ty),
                    _ => Err(range_error(Self::KIND, value)),
                }
            }
        }
    };
}

narrow_int!(i8, u8, Int8);
narrow_int!(i16, u16, Int16);
narrow_int!(u16, u16, Char);
narrow_int!(i32, u32, Int32);

impl ToHost for i64 {
    fn to_host<'r>(self) -> HostValue<'r> {
        HostValue::BigInt(i128::from(self))
    }
}

impl FromHost for i64 {
    const KIND: ScalarKind = ScalarKind::Int64;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        // Only the arbitrary-precision form is exact for every i64
        match value {
            HostValue::BigInt(i) => Ok(*i as i64),
            _ => Err(range_error(Self::KIND, value)),
        }
    }
}

impl ToHost for f32 {
    fn to_host<'r>(self) -> HostValue<'r> {
        HostValue::Number(f64::from(self))
    }
}

impl FromHost for f32 {
    const KIND: ScalarKind = ScalarKind::Float32;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        value
            .as_number()
            .map(|n| n as f32)
            .ok_or_else(|| range_error(Self::KIND, value))
    }
}

impl ToHost for f64 {
    fn to_host<'r>(self) -> HostValue<'r> {
        HostValue::Number(self)
    }
}

impl FromHost for f64 {
    const KIND: ScalarKind = ScalarKind::Float64;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        value.as_number().ok_or_else(|| range_error(Self::KIND, value))
    }
}

impl ToHost for &str {
    fn to_host<'r>(self) -> HostValue<'r> {
        HostValue::string(self)
    }
}

impl FromHost for String {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| range_error(Self::KIND, value))
    }
}

impl ToHost for Option<&str> {
    fn to_host<'r>(self) -> HostValue<'r> {
        match self {
            Some(s) => s.to_host(),
            None => HostValue::Null,
        }
    }
}

impl FromHost for Option<String> {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_host(value: &HostValue<'_>) -> BridgeResult<Self> {
        if value.is_nullish() {
            Ok(None)
        } else {
            String::from_host(value).map(Some)
        }
    }
}

// ============================================================================
// Kind-directed conversion
// ============================================================================

/// Convert a managed scalar declared as `kind` to the host.
///
/// Text accepts `Null`; every other kind requires the matching variant.
pub fn scalar_to_host<'r>(kind: ScalarKind, value: &ManagedValue<'_>) -> BridgeResult<HostValue<'r>> {
    match (kind, value) {
        (ScalarKind::Bool, ManagedValue::Bool(b)) => Ok(b.to_host()),
        (ScalarKind::Int8, ManagedValue::Int8(i)) => Ok(i.to_host()),
        (ScalarKind::Int16, ManagedValue::Int16(i)) => Ok(i.to_host()),
        (ScalarKind::Char, ManagedValue::Char(c)) => Ok(c.to_host()),
        (ScalarKind::Int32, ManagedValue::Int32(i)) => Ok(i.to_host()),
        (ScalarKind::Int64, ManagedValue::Int64(i)) => Ok(i.to_host()),
        (ScalarKind::Float32, ManagedValue::Float32(f)) => Ok(f.to_host()),
        (ScalarKind::Float64, ManagedValue::Float64(f)) => Ok(f.to_host()),
        (ScalarKind::Text, ManagedValue::Text(s)) => Ok(s.as_str().to_host()),
        (ScalarKind::Text, ManagedValue::Null) => Ok(HostValue::Null),
        (kind, other) => Err(BridgeError::mismatch(kind.name(), other.type_name())),
    }
}

/// Convert a host value into a managed scalar of `kind`.
pub fn scalar_to_managed<'r>(kind: ScalarKind, value: &HostValue<'_>) -> BridgeResult<ManagedValue<'r>> {
    Ok(match kind {
        ScalarKind::Bool => ManagedValue::Bool(bool::from_host(value)?),
        ScalarKind::Int8 => ManagedValue::Int8(i8::from_host(value)?),
        ScalarKind::Int16 => ManagedValue::Int16(i16::from_host(value)?),
        ScalarKind::Char => ManagedValue::Char(u16::from_host(value)?),
        ScalarKind::Int32 => ManagedValue::Int32(i32::from_host(value)?),
        ScalarKind::Int64 => ManagedValue::Int64(i64::from_host(value)?),
        ScalarKind::Float32 => ManagedValue::Float32(f32::from_host(value)?),
        ScalarKind::Float64 => ManagedValue::Float64(f64::from_host(value)?),
        ScalarKind::Text => match Option::<String>::from_host(value)? {
            Some(s) => ManagedValue::Text(s),
            None => ManagedValue::Null,
        },
    })
}

/// Boxed scalar to host: `Null` passes through
pub fn boxed_to_host<'r>(kind: ScalarKind, value: &ManagedValue<'_>) -> BridgeResult<HostValue<'r>> {
    if value.is_null() {
        Ok(HostValue::Null)
    } else {
        scalar_to_host(kind, value)
    }
}

/// Host to boxed scalar: `null`/`undefined` become `Null`
pub fn boxed_to_managed<'r>(kind: ScalarKind, value: &HostValue<'_>) -> BridgeResult<ManagedValue<'r>> {
    if value.is_nullish() {
        Ok(ManagedValue::Null)
    } else {
        scalar_to_managed(kind, value)
    }
}

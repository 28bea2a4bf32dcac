//! HostBridge Core
//!
//! This crate provides the conversion engine between managed values and host
//! values:
//! - Scalar converter (exact int64, wraparound narrowing)
//! - Array converter (recursive, rectangular, by copy)
//! - Buffer view adapter (aliasing, byte-order aware)
//! - Reference bridge (identity preserving, optional interning)
//! - Type classifier and dispatcher
//! - Call sites and property slots

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod array;
pub mod boundary;
pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod reference;
pub mod scalar;

pub use array::{managed_from_typed_array, typed_array_from_managed, ArrayConverter};
pub use boundary::{CallSite, PropertySlot};
pub use buffer::{buffer_of, view_of};
pub use config::{BridgeConfig, ConfigError, DEFAULT_MAX_ARRAY_DEPTH};
pub use dispatch::{BoundaryValue, CallScope, Category, Direction, Leaf, Marshaller};
pub use logging::init_logging;
pub use reference::{ReferenceBridge, ReferenceTable};
pub use scalar::{FromHost, ToHost};

pub use hostbridge_sdk as sdk;

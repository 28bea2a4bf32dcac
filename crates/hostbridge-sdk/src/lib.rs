//! HostBridge SDK - value model for the managed/host call boundary
//!
//! This crate provides the types both sides of the bridge agree on, without
//! any conversion logic:
//!
//! - [`TypeDescriptor`] / [`Signature`]: declared types of call-boundary slots
//! - [`ManagedValue`]: statically typed scalars, owned arrays, direct buffers
//!   and handles to host values
//! - [`HostValue`]: numbers, arbitrary-precision integers, shared arrays and
//!   objects, typed views
//! - [`Region`] / [`ByteRegion`]: byte storage aliased by buffers and views
//!
//! # Example
//!
//! ```ignore
//! use hostbridge_sdk::{ByteOrder, ByteRegion, DirectBuffer, ElementKind};
//!
//! let memory = ByteRegion::allocate(8);
//! let ints = DirectBuffer::over(&memory, ElementKind::Int32, ByteOrder::native());
//! ints.put(0, 2i32)?;
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod host;
pub mod managed;
pub mod region;

pub use descriptor::{ElementKind, ScalarKind, Signature, TypeDescriptor};
pub use error::{BridgeError, BridgeResult};
pub use host::{wrap_integer, HostArray, HostObject, HostValue, Identity, TypedView};
pub use managed::{DirectBuffer, HostHandle, ManagedArray, ManagedValue};
pub use region::{BufferElement, ByteOrder, ByteRegion, Region};

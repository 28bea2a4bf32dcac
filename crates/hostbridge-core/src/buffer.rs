//! Buffer view adapter
//!
//! A managed direct buffer and a host typed view over the same bytes. Neither
//! direction copies: the view and the buffer hold the same region, so writes
//! through one are visible through the other.

use tracing::{debug, trace};

use hostbridge_sdk::{
    BridgeError, BridgeResult, DirectBuffer, ElementKind, HostValue, ManagedValue, TypedView,
};

/// Host view over `buffer`'s bytes, read as `kind`.
///
/// `kind` may differ from the buffer's own kind; the bytes are then
/// reinterpreted. The view keeps the buffer's byte order.
pub fn view_of<'r>(buffer: &DirectBuffer<'r>, kind: ElementKind) -> TypedView<'r> {
    if !buffer.order().is_native() {
        debug!(
            order = ?buffer.order(),
            kind = %kind,
            "view reorders bytes on access"
        );
    }
    if kind != buffer.kind() {
        trace!(from = %buffer.kind(), to = %kind, "reinterpreting buffer");
    }
    TypedView::new(buffer.region().clone(), kind, buffer.order())
}

/// Managed buffer over `view`'s bytes. The view must hold `kind` elements.
pub fn buffer_of<'r>(view: &TypedView<'r>, kind: ElementKind) -> BridgeResult<DirectBuffer<'r>> {
    if view.kind() != kind {
        return Err(BridgeError::mismatch(kind.view_name(), view.kind().view_name()));
    }
    Ok(DirectBuffer::new(view.region().clone(), kind, view.order()))
}

/// Managed buffer slot → host. `Null` passes through.
pub fn buffer_to_host<'r>(kind: ElementKind, value: &ManagedValue<'r>) -> BridgeResult<HostValue<'r>> {
    match value {
        ManagedValue::Null => Ok(HostValue::Null),
        ManagedValue::Buffer(buffer) => Ok(HostValue::View(view_of(buffer, kind))),
        other => Err(BridgeError::mismatch(format!("buffer<{}>", kind), other.type_name())),
    }
}

/// Host value → managed buffer slot. `null`/`undefined` become `Null`.
pub fn buffer_to_managed<'r>(kind: ElementKind, value: &HostValue<'r>) -> BridgeResult<ManagedValue<'r>> {
    match value {
        HostValue::Null | HostValue::Undefined => Ok(ManagedValue::Null),
        HostValue::View(view) => Ok(ManagedValue::Buffer(buffer_of(view, kind)?)),
        other => Err(BridgeError::mismatch(kind.view_name(), other.type_name())),
    }
}

//! Call sites and property slots
//!
//! A call site converts a whole argument list for one host operation and its
//! return value back. A property slot does the same for one named property of
//! a host object.

use tracing::{debug, instrument};

use hostbridge_sdk::{
    BridgeError, BridgeResult, HostObject, HostValue, ManagedValue, Signature, TypeDescriptor,
};

use crate::dispatch::{CallScope, Marshaller};

/// One host operation with a fixed signature
#[derive(Debug, Clone)]
pub struct CallSite<'m> {
    marshaller: &'m Marshaller,
    name: String,
    signature: Signature,
}

impl<'m> CallSite<'m> {
    /// Create a call site for `name`
    pub fn new(marshaller: &'m Marshaller, name: impl Into<String>, signature: Signature) -> Self {
        Self {
            marshaller,
            name: name.into(),
            signature,
        }
    }

    /// Operation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Convert `args` to the host, run `body`, convert its result back.
    ///
    /// All conversions share one call scope. Buffer arguments reach `body` as
    /// views over the caller's bytes, so writes made by `body` are visible to
    /// the caller afterwards. A `void` return yields `Null`.
    #[instrument(level = "debug", skip_all, fields(call = %self.name))]
    pub fn invoke<'r, F>(&self, args: &[ManagedValue<'r>], body: F) -> BridgeResult<ManagedValue<'r>>
    where
        F: FnOnce(&[HostValue<'r>]) -> HostValue<'r>,
    {
        if args.len() != self.signature.arity() {
            return Err(BridgeError::ArityMismatch {
                expected: self.signature.arity(),
                found: args.len(),
            });
        }

        let scope = self.marshaller.scope();
        let host_args = self
            .signature
            .params
            .iter()
            .zip(args)
            .map(|(descriptor, arg)| scope.to_host(descriptor, arg))
            .collect::<BridgeResult<Vec<_>>>()?;

        debug!(args = host_args.len(), "calling host");
        let result = body(&host_args);

        match &self.signature.ret {
            Some(descriptor) => scope.to_managed(descriptor, &result),
            None => Ok(ManagedValue::Null),
        }
    }
}

/// A named, typed property of host objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySlot {
    name: String,
    descriptor: TypeDescriptor,
}

impl PropertySlot {
    /// Create a slot for property `name`
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Read the property as a managed value; a missing property reads as
    /// `undefined`.
    pub fn get<'r>(&self, scope: &CallScope<'_, 'r>, object: &HostObject<'r>) -> BridgeResult<ManagedValue<'r>> {
        scope.to_managed(&self.descriptor, &object.get(&self.name))
    }

    /// Store a managed value into the property
    pub fn set<'r>(
        &self,
        scope: &CallScope<'_, 'r>,
        object: &HostObject<'r>,
        value: &ManagedValue<'r>,
    ) -> BridgeResult<()> {
        let host = scope.to_host(&self.descriptor, value)?;
        object.set(self.name.clone(), host);
        Ok(())
    }
}

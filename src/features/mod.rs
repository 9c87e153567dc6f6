//! Capability features
//!
//! Each domain is data: a [`FeatureDescriptor`] naming the message set it
//! owns, its capability key, and a provider builder. One generic
//! registration engine ([`Feature`]) drives every domain the same way:
//! validate the offered message set, build the provider, track the
//! resulting handle for later disposal.

pub mod admin;
pub mod backup;
pub mod capabilities;
pub mod connection;
pub mod file_browser;
pub mod metadata;
pub mod object_explorer;
pub mod profiler;
pub mod query;
pub mod restore;
pub mod scripting;
pub mod tasks;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use uuid::Uuid;

use crate::capabilities::{ClientCapabilities, ServerCapabilities};
use crate::client::ClientContext;
use crate::error::ClientError;
use crate::messages::{MessageIdentifier, validate_ownership};
use crate::registry::{ProviderHandle, ProviderRegistry};

/// Callback invoked with a typed notification payload.
pub type Handler<T> = Box<dyn Fn(T) + Send + Sync>;

/// Builds the domain provider and performs the host-registry call.
///
/// Returns `None` when there is nothing to track for this registration.
pub type ProviderBuilder =
    fn(&Arc<ClientContext>, &dyn ProviderRegistry) -> Option<ProviderHandle>;

/// Static description of one capability domain.
pub struct FeatureDescriptor {
    pub name: &'static str,
    pub domain_key: &'static str,
    pub messages: &'static [MessageIdentifier],
    pub build: ProviderBuilder,
}

impl fmt::Debug for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDescriptor")
            .field("name", &self.name)
            .field("domain_key", &self.domain_key)
            .field("messages", &self.messages.len())
            .finish()
    }
}

/// Descriptor for one activation of a feature.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: String,
    /// Always `None` for the built-in features; the hook exists for future
    /// option-bearing registrations.
    pub register_options: Option<Value>,
}

impl Registration {
    pub fn fresh() -> Self {
        Self {
            id: registration_id(),
            register_options: None,
        }
    }
}

/// Globally-unique registration id. A collision would let one registration
/// silently overwrite another's disposal entry, so ids are never reused.
pub fn registration_id() -> String {
    Uuid::new_v4().to_string()
}

/// The generic registration engine: one instance per enabled domain.
pub struct Feature {
    descriptor: &'static FeatureDescriptor,
    registrations: Mutex<HashMap<String, ProviderHandle>>,
}

impl Feature {
    pub fn new(descriptor: &'static FeatureDescriptor) -> Self {
        Self {
            descriptor,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn domain_key(&self) -> &'static str {
        self.descriptor.domain_key
    }

    pub fn messages(&self) -> &'static [MessageIdentifier] {
        self.descriptor.messages
    }

    /// Contribute this domain's capability flag. Idempotent.
    pub fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
        capabilities.enable_dynamic_registration(self.descriptor.domain_key);
    }

    /// Activate the feature once the server's capabilities are known.
    ///
    /// The built-in features register unconditionally (dynamic
    /// registration); the server capability structure is accepted so
    /// partial-support gating has a place to live later.
    pub fn initialize(
        &self,
        ctx: &Arc<ClientContext>,
        registry: &dyn ProviderRegistry,
        _server_capabilities: &ServerCapabilities,
    ) -> Result<(), ClientError> {
        self.register(self.descriptor.messages, Registration::fresh(), ctx, registry)
    }

    /// Validate ownership of `offered`, then build and track the provider.
    ///
    /// A mismatched message set is a wiring error and is surfaced
    /// immediately; nothing is registered in that case.
    pub fn register(
        &self,
        offered: &[MessageIdentifier],
        registration: Registration,
        ctx: &Arc<ClientContext>,
        registry: &dyn ProviderRegistry,
    ) -> Result<(), ClientError> {
        validate_ownership(self.descriptor.messages, offered)?;

        tracing::debug!(
            feature = self.descriptor.name,
            id = %registration.id,
            "registering provider"
        );

        if let Some(handle) = (self.descriptor.build)(ctx, registry) {
            self.registrations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(registration.id, handle);
        }
        Ok(())
    }

    /// Release and forget one registration. No-op when the id is unknown.
    pub fn unregister(&self, id: &str) {
        let handle = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(handle) = handle {
            tracing::debug!(feature = self.descriptor.name, id, "unregistering provider");
            handle.release();
        }
    }

    /// Release every tracked registration. Message ownership is untouched,
    /// so the feature remains valid for future registrations.
    pub fn dispose(&self) {
        let drained: Vec<(String, ProviderHandle)> = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (id, handle) in drained {
            tracing::debug!(feature = self.descriptor.name, id = %id, "disposing provider");
            handle.release();
        }
    }

    pub fn registration_count(&self) -> usize {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.descriptor.name)
            .field("registrations", &self.registration_count())
            .finish()
    }
}

/// The built-in feature list covering every capability domain, in the order
/// they are registered at client construction.
pub fn default_features() -> Vec<&'static FeatureDescriptor> {
    vec![
        &connection::DESCRIPTOR,
        &capabilities::DESCRIPTOR,
        &query::DESCRIPTOR,
        &metadata::DESCRIPTOR,
        &admin::DESCRIPTOR,
        &backup::DESCRIPTOR,
        &restore::DESCRIPTOR,
        &object_explorer::DESCRIPTOR,
        &scripting::DESCRIPTOR,
        &tasks::DESCRIPTOR,
        &file_browser::DESCRIPTOR,
        &profiler::DESCRIPTOR,
    ]
}

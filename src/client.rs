//! Client composition root
//!
//! Owns the transport, the payload converter pair, the provider identifier,
//! and the active features. Orchestrates capability declaration and feature
//! registration at startup and routes disposal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::capabilities::{ClientCapabilities, ServerCapabilities};
use crate::converters::{DefaultConverters, InboundConverter, OutboundConverter};
use crate::error::{ClientError, RpcError};
use crate::features::{Feature, FeatureDescriptor, default_features};
use crate::messages::{NotificationType, RequestType};
use crate::registry::ProviderRegistry;
use crate::rpc::RpcTransport;

/// Shared state every feature provider needs: the transport, the converter
/// pair, the provider identifier, and failure diagnostics.
pub struct ClientContext {
    transport: Arc<dyn RpcTransport>,
    outbound: Arc<dyn OutboundConverter>,
    inbound: Arc<dyn InboundConverter>,
    provider_id: String,
    failed_requests: AtomicU64,
}

impl ClientContext {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        outbound: Arc<dyn OutboundConverter>,
        inbound: Arc<dyn InboundConverter>,
        provider_id: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            outbound,
            inbound,
            provider_id,
            failed_requests: AtomicU64::new(0),
        })
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    pub fn outbound(&self) -> &dyn OutboundConverter {
        self.outbound.as_ref()
    }

    pub fn inbound(&self) -> &dyn InboundConverter {
        self.inbound.as_ref()
    }

    /// The backend provider every registration of this client is attributed
    /// to.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Diagnostic hook invoked on every transport failure.
    pub fn log_failed_request(&self, method: &str, error: &RpcError) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        tracing::error!(method, %error, "request failed");
    }

    /// Number of failed requests observed so far.
    pub fn failed_request_count(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    /// Send a typed request and decode the typed response.
    pub async fn request<P, R>(
        &self,
        request_type: &RequestType<P, R>,
        params: &P,
    ) -> Result<R, RpcError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self
            .transport
            .send_request(request_type.method(), Some(params))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Read-style request: on failure, log and degrade to `None` so callers
    /// can proceed in an empty/disabled state.
    pub async fn read_request<P, R>(
        &self,
        request_type: &RequestType<P, R>,
        params: &P,
    ) -> Option<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        match self.request(request_type, params).await {
            Ok(result) => Some(result),
            Err(error) => {
                self.log_failed_request(request_type.method(), &error);
                None
            }
        }
    }

    /// Command-style request: on failure, log and propagate so callers can
    /// surface or retry the error.
    pub async fn command_request<P, R>(
        &self,
        request_type: &RequestType<P, R>,
        params: &P,
    ) -> Result<R, ClientError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.request(request_type, params).await.map_err(|error| {
            self.log_failed_request(request_type.method(), &error);
            ClientError::from(error)
        })
    }

    /// Fire-and-forget notification. Always resolves; failures are logged.
    pub async fn notify<P>(&self, notification_type: &NotificationType<P>, params: &P)
    where
        P: Serialize + Sync,
    {
        let params = match serde_json::to_value(params) {
            Ok(value) => Some(value),
            Err(error) => {
                self.log_failed_request(notification_type.method(), &error.into());
                return;
            }
        };
        if let Err(error) = self
            .transport
            .send_notification(notification_type.method(), params)
            .await
        {
            self.log_failed_request(notification_type.method(), &error);
        }
    }

    /// Subscribe a typed handler to an incoming notification method.
    pub async fn subscribe<P, F>(&self, notification_type: &NotificationType<P>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) + Send + Sync + 'static,
    {
        let method = notification_type.method();
        self.transport
            .on_notification(
                method,
                Box::new(move |raw| match serde_json::from_value::<P>(raw) {
                    Ok(params) => handler(params),
                    Err(error) => {
                        tracing::warn!(method, %error, "malformed notification payload");
                    }
                }),
            )
            .await;
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("provider_id", &self.provider_id)
            .field("failed_requests", &self.failed_request_count())
            .finish()
    }
}

/// Construction options for [`Client`].
#[derive(Default)]
pub struct ClientOptions {
    /// Backend provider identifier; derived from the client name when
    /// absent.
    pub provider_id: Option<String>,
    /// Enabled features; the built-in full list when absent.
    pub features: Option<Vec<&'static FeatureDescriptor>>,
    pub outbound: Option<Arc<dyn OutboundConverter>>,
    pub inbound: Option<Arc<dyn InboundConverter>>,
}

/// The data protocol client: one transport, one converter pair, one provider
/// identifier, and a fixed set of features registered at construction.
pub struct Client {
    name: String,
    ctx: Arc<ClientContext>,
    registry: Arc<dyn ProviderRegistry>,
    features: Vec<Feature>,
}

impl Client {
    /// Construct with the default provider identifier and feature list.
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn RpcTransport>,
        registry: Arc<dyn ProviderRegistry>,
    ) -> Self {
        Self::with_options(name, transport, registry, ClientOptions::default())
    }

    /// Construct with an explicit provider identifier, feature list, or
    /// converter pair.
    pub fn with_options(
        name: impl Into<String>,
        transport: Arc<dyn RpcTransport>,
        registry: Arc<dyn ProviderRegistry>,
        options: ClientOptions,
    ) -> Self {
        let name = name.into();
        let provider_id = options
            .provider_id
            .unwrap_or_else(|| derive_provider_id(&name));
        let outbound = options
            .outbound
            .unwrap_or_else(|| Arc::new(DefaultConverters));
        let inbound = options
            .inbound
            .unwrap_or_else(|| Arc::new(DefaultConverters));

        let ctx = ClientContext::new(transport, outbound, inbound, provider_id);
        let features = options
            .features
            .unwrap_or_else(default_features)
            .into_iter()
            .map(Feature::new)
            .collect();

        Self {
            name,
            ctx,
            registry,
            features,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn failed_request_count(&self) -> u64 {
        self.ctx.failed_request_count()
    }

    /// Merge every feature's capability contribution. Additive and
    /// collision-free: each feature owns a distinct domain key.
    pub fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
        for feature in &self.features {
            feature.fill_client_capabilities(capabilities);
        }
    }

    /// Drive every feature's registration once the server's capabilities
    /// are known. Features are independent, so list order is the only
    /// ordering; a wiring error aborts startup because it is a composition
    /// defect, while transport failures inside providers never do.
    pub fn initialize(&self, server_capabilities: &ServerCapabilities) -> Result<(), ClientError> {
        for feature in &self.features {
            feature.initialize(&self.ctx, self.registry.as_ref(), server_capabilities)?;
            tracing::info!(feature = feature.name(), "feature registered");
        }
        Ok(())
    }

    /// Release one registration wherever it is tracked. Unknown ids are
    /// ignored.
    pub fn unregister(&self, id: &str) {
        for feature in &self.features {
            feature.unregister(id);
        }
    }

    /// Release every registration of every feature.
    pub fn dispose(&self) {
        for feature in &self.features {
            feature.dispose();
        }
        tracing::info!(client = %self.name, "client disposed");
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.name)
            .field("provider_id", &self.ctx.provider_id())
            .field("features", &self.features.len())
            .finish()
    }
}

fn derive_provider_id(name: &str) -> String {
    let id: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    id.trim_matches('-').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockRegistry, MockTransport};

    fn test_client(registry: Arc<MockRegistry>) -> (Client, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let client = Client::new(
            "Example Data Tools",
            Arc::clone(&transport) as Arc<dyn RpcTransport>,
            registry,
        );
        (client, transport)
    }

    #[test]
    fn provider_id_is_derived_from_name() {
        let (client, _) = test_client(Arc::new(MockRegistry::default()));
        assert_eq!(client.provider_id(), "example-data-tools");
    }

    #[test]
    fn explicit_provider_id_wins() {
        let transport = Arc::new(MockTransport::new());
        let client = Client::with_options(
            "Example Data Tools",
            transport,
            Arc::new(MockRegistry::default()),
            ClientOptions {
                provider_id: Some("MSSQL".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(client.provider_id(), "MSSQL");
    }

    #[test]
    fn capabilities_cover_all_default_features() {
        let (client, _) = test_client(Arc::new(MockRegistry::default()));
        let mut caps = ClientCapabilities::default();
        client.fill_client_capabilities(&mut caps);
        assert_eq!(caps.declared_domains().len(), client.features().len());
    }

    #[test]
    fn initialize_registers_every_feature_and_dispose_releases() {
        let registry = Arc::new(MockRegistry::default());
        let (client, _) = test_client(Arc::clone(&registry));

        client.initialize(&ServerCapabilities::default()).unwrap();
        assert_eq!(registry.registered(), client.features().len());
        for feature in client.features() {
            assert_eq!(feature.registration_count(), 1);
        }

        client.dispose();
        assert_eq!(registry.released(), client.features().len());
        for feature in client.features() {
            assert_eq!(feature.registration_count(), 0);
        }
    }

    #[test]
    fn custom_feature_list_is_honored() {
        let registry = Arc::new(MockRegistry::default());
        let transport = Arc::new(MockTransport::new());
        let client = Client::with_options(
            "slim",
            transport,
            Arc::clone(&registry) as Arc<dyn ProviderRegistry>,
            ClientOptions {
                features: Some(vec![&crate::features::connection::DESCRIPTOR]),
                ..Default::default()
            },
        );

        client.initialize(&ServerCapabilities::default()).unwrap();
        assert_eq!(client.features().len(), 1);
        assert_eq!(registry.registered(), 1);
    }
}

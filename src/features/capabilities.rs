//! Capability discovery feature

use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDescriptor;
use crate::client::ClientContext;
use crate::contracts::capabilities::{
    CapabilitiesRequestParams, CapabilitiesResult, DataProtocolCapabilities,
};
use crate::messages::{MessageIdentifier, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const LIST_CAPABILITIES: RequestType<CapabilitiesRequestParams, CapabilitiesResult> =
    RequestType::new("capabilities/list");

pub const MESSAGES: &[MessageIdentifier] = &[LIST_CAPABILITIES.identifier()];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "capabilities",
    domain_key: "capabilities",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(CapabilitiesService::new(Arc::clone(ctx)));
    Some(registry.register_capabilities_provider(service))
}

#[async_trait]
pub trait CapabilitiesProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Ask the backend what it supports. The wire result runs through the
    /// inbound converter before reaching the host.
    async fn get_capabilities(
        &self,
        host_name: &str,
        host_version: &str,
    ) -> Option<DataProtocolCapabilities>;
}

pub struct CapabilitiesService {
    ctx: Arc<ClientContext>,
}

impl CapabilitiesService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CapabilitiesProvider for CapabilitiesService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn get_capabilities(
        &self,
        host_name: &str,
        host_version: &str,
    ) -> Option<DataProtocolCapabilities> {
        let params = CapabilitiesRequestParams {
            host_name: host_name.to_string(),
            host_version: host_version.to_string(),
        };
        let result = self.ctx.read_request(&LIST_CAPABILITIES, &params).await?;
        Some(self.ctx.inbound().capabilities(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn capabilities_run_through_inbound_converter() {
        let (ctx, transport) = test_context();
        transport.stub(
            LIST_CAPABILITIES.method(),
            serde_json::json!({
                "capabilities": {
                    "protocolVersion": "1.1",
                    "providerName": "MSSQL"
                }
            }),
        );

        let service = CapabilitiesService::new(ctx);
        let capabilities = service.get_capabilities("host", "1.0").await.unwrap();
        assert_eq!(capabilities.provider_name, "MSSQL");
        assert_eq!(capabilities.protocol_version, "1.1");
    }

    #[tokio::test]
    async fn capabilities_degrade_to_none_on_failure() {
        let (ctx, _transport) = failing_context();
        let service = CapabilitiesService::new(Arc::clone(&ctx));
        assert!(service.get_capabilities("host", "1.0").await.is_none());
        assert_eq!(ctx.failed_request_count(), 1);
    }
}

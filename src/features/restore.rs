//! Restore feature

use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDescriptor;
use crate::client::ClientContext;
use crate::contracts::restore::{
    RestoreConfigInfoParams, RestoreConfigInfoResult, RestoreParams, RestorePlanResponse,
    RestoreResponse,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const RESTORE: RequestType<RestoreParams, RestoreResponse> = RequestType::new("restore/restore");
pub const RESTORE_PLAN: RequestType<RestoreParams, RestorePlanResponse> =
    RequestType::new("restore/restoreplan");
pub const CANCEL_RESTORE_PLAN: RequestType<RestoreParams, bool> =
    RequestType::new("restore/cancelrestoreplan");
pub const RESTORE_CONFIG_INFO: RequestType<RestoreConfigInfoParams, RestoreConfigInfoResult> =
    RequestType::new("restore/restoreconfiginfo");

pub const MESSAGES: &[MessageIdentifier] = &[
    RESTORE.identifier(),
    RESTORE_PLAN.identifier(),
    CANCEL_RESTORE_PLAN.identifier(),
    RESTORE_CONFIG_INFO.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "restore",
    domain_key: "restore",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(RestoreService::new(Arc::clone(ctx)));
    Some(registry.register_restore_provider(service))
}

#[async_trait]
pub trait RestoreProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Run a restore. Mutating, so failures propagate.
    async fn restore(&self, params: RestoreParams) -> ClientResult<RestoreResponse>;

    /// Compute a restore plan for the given options. Failures propagate so
    /// the host can distinguish "no plan" from "planning failed".
    async fn get_restore_plan(&self, params: RestoreParams) -> ClientResult<RestorePlanResponse>;

    async fn cancel_restore_plan(&self, params: RestoreParams) -> ClientResult<bool>;

    async fn get_restore_config_info(&self, owner_uri: &str) -> Option<RestoreConfigInfoResult>;
}

pub struct RestoreService {
    ctx: Arc<ClientContext>,
}

impl RestoreService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl RestoreProvider for RestoreService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn restore(&self, params: RestoreParams) -> ClientResult<RestoreResponse> {
        self.ctx.command_request(&RESTORE, &params).await
    }

    async fn get_restore_plan(&self, params: RestoreParams) -> ClientResult<RestorePlanResponse> {
        self.ctx.command_request(&RESTORE_PLAN, &params).await
    }

    async fn cancel_restore_plan(&self, params: RestoreParams) -> ClientResult<bool> {
        self.ctx.command_request(&CANCEL_RESTORE_PLAN, &params).await
    }

    async fn get_restore_config_info(&self, owner_uri: &str) -> Option<RestoreConfigInfoResult> {
        let params = RestoreConfigInfoParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.read_request(&RESTORE_CONFIG_INFO, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn restore_plan_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = RestoreService::new(Arc::clone(&ctx));

        let outcome = service.get_restore_plan(RestoreParams::default()).await;
        assert!(outcome.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn restore_plan_reports_blockers() {
        let (ctx, transport) = test_context();
        transport.stub(
            RESTORE_PLAN.method(),
            serde_json::json!({
                "sessionId": "plan-1",
                "canRestore": false,
                "errors": ["target database is in use"]
            }),
        );
        let service = RestoreService::new(ctx);

        let plan = service
            .get_restore_plan(RestoreParams::default())
            .await
            .unwrap();
        assert!(!plan.can_restore);
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(plan.session_id, "plan-1");
    }
}

//! Scripting feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::scripting::{ScriptingCompleteParams, ScriptingParams, ScriptingResult};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const SCRIPT: RequestType<ScriptingParams, ScriptingResult> =
    RequestType::new("scripting/script");
pub const SCRIPT_COMPLETE: NotificationType<ScriptingCompleteParams> =
    NotificationType::new("scripting/scriptComplete");

pub const MESSAGES: &[MessageIdentifier] =
    &[SCRIPT.identifier(), SCRIPT_COMPLETE.identifier()];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "scripting",
    domain_key: "scripting",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(ScriptingService::new(Arc::clone(ctx)));
    Some(registry.register_scripting_provider(service))
}

#[async_trait]
pub trait ScriptingProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Generate a script for the requested objects. Failures propagate;
    /// completion is reported through `on_script_complete`.
    async fn script(&self, params: ScriptingParams) -> ClientResult<ScriptingResult>;

    async fn on_script_complete(&self, handler: Handler<ScriptingCompleteParams>);
}

pub struct ScriptingService {
    ctx: Arc<ClientContext>,
}

impl ScriptingService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ScriptingProvider for ScriptingService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn script(&self, params: ScriptingParams) -> ClientResult<ScriptingResult> {
        self.ctx.command_request(&SCRIPT, &params).await
    }

    async fn on_script_complete(&self, handler: Handler<ScriptingCompleteParams>) {
        self.ctx
            .subscribe(&SCRIPT_COMPLETE, move |params| handler(params))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::scripting::ScriptOperation;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn script_returns_operation_id() {
        let (ctx, transport) = test_context();
        transport.stub(
            SCRIPT.method(),
            serde_json::json!({"operationId": "op-3", "script": "CREATE TABLE t (id int)"}),
        );
        let service = ScriptingService::new(ctx);

        let params = ScriptingParams {
            owner_uri: "uri1".to_string(),
            operation: ScriptOperation::Create,
            scripting_objects: None,
            script_destination: None,
            script_options: Default::default(),
        };
        let result = service.script(params).await.unwrap();
        assert_eq!(result.operation_id, "op-3");
        assert!(result.script.unwrap().starts_with("CREATE TABLE"));
    }

    #[tokio::test]
    async fn script_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = ScriptingService::new(Arc::clone(&ctx));

        let params = ScriptingParams {
            owner_uri: "uri1".to_string(),
            operation: ScriptOperation::Select,
            scripting_objects: None,
            script_destination: None,
            script_options: Default::default(),
        };
        assert!(service.script(params).await.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }
}

//! Object explorer feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::connection::ConnectionDetails;
use crate::contracts::object_explorer::{
    CloseSessionParams, CloseSessionResponse, CreateSessionParams, CreateSessionResponse,
    ExpandParams, ExpandResponse, ExplorerSession, FindNodesParams, FindNodesResponse, NodeInfo,
    SessionStatusWire,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const CREATE_SESSION: RequestType<CreateSessionParams, CreateSessionResponse> =
    RequestType::new("objectexplorer/createsession");
pub const EXPAND: RequestType<ExpandParams, bool> = RequestType::new("objectexplorer/expand");
pub const REFRESH: RequestType<ExpandParams, bool> = RequestType::new("objectexplorer/refresh");
pub const CLOSE_SESSION: RequestType<CloseSessionParams, CloseSessionResponse> =
    RequestType::new("objectexplorer/closesession");
pub const FIND_NODES: RequestType<FindNodesParams, FindNodesResponse> =
    RequestType::new("objectexplorer/findnodes");
pub const SESSION_CREATED: NotificationType<SessionStatusWire> =
    NotificationType::new("objectexplorer/sessioncreated");
pub const SESSION_DISCONNECTED: NotificationType<SessionStatusWire> =
    NotificationType::new("objectexplorer/sessiondisconnected");
pub const EXPAND_COMPLETED: NotificationType<ExpandResponse> =
    NotificationType::new("objectexplorer/expandCompleted");

pub const MESSAGES: &[MessageIdentifier] = &[
    CREATE_SESSION.identifier(),
    EXPAND.identifier(),
    REFRESH.identifier(),
    CLOSE_SESSION.identifier(),
    FIND_NODES.identifier(),
    SESSION_CREATED.identifier(),
    SESSION_DISCONNECTED.identifier(),
    EXPAND_COMPLETED.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "objectExplorer",
    domain_key: "objectExplorer",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(ObjectExplorerService::new(Arc::clone(ctx)));
    Some(registry.register_object_explorer_provider(service))
}

/// Object tree browsing. Session and expansion requests are commands;
/// results arrive through the session notifications.
#[async_trait]
pub trait ObjectExplorerProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn create_session(
        &self,
        connection: ConnectionDetails,
    ) -> ClientResult<CreateSessionResponse>;

    async fn expand_node(&self, session_id: &str, node_path: &str) -> ClientResult<bool>;

    async fn refresh_node(&self, session_id: &str, node_path: &str) -> ClientResult<bool>;

    async fn close_session(&self, session_id: &str) -> ClientResult<CloseSessionResponse>;

    async fn find_nodes(&self, params: FindNodesParams) -> ClientResult<Vec<NodeInfo>>;

    /// Session creation completed; the wire payload runs through the
    /// inbound converter first.
    async fn on_session_created(&self, handler: Handler<ExplorerSession>);

    async fn on_session_disconnected(&self, handler: Handler<ExplorerSession>);

    async fn on_expand_completed(&self, handler: Handler<ExpandResponse>);
}

pub struct ObjectExplorerService {
    ctx: Arc<ClientContext>,
}

impl ObjectExplorerService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ObjectExplorerProvider for ObjectExplorerService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn create_session(
        &self,
        connection: ConnectionDetails,
    ) -> ClientResult<CreateSessionResponse> {
        let params = CreateSessionParams { connection };
        self.ctx.command_request(&CREATE_SESSION, &params).await
    }

    async fn expand_node(&self, session_id: &str, node_path: &str) -> ClientResult<bool> {
        let params = ExpandParams {
            session_id: session_id.to_string(),
            node_path: node_path.to_string(),
        };
        self.ctx.command_request(&EXPAND, &params).await
    }

    async fn refresh_node(&self, session_id: &str, node_path: &str) -> ClientResult<bool> {
        let params = ExpandParams {
            session_id: session_id.to_string(),
            node_path: node_path.to_string(),
        };
        self.ctx.command_request(&REFRESH, &params).await
    }

    async fn close_session(&self, session_id: &str) -> ClientResult<CloseSessionResponse> {
        let params = CloseSessionParams {
            session_id: session_id.to_string(),
        };
        self.ctx.command_request(&CLOSE_SESSION, &params).await
    }

    async fn find_nodes(&self, params: FindNodesParams) -> ClientResult<Vec<NodeInfo>> {
        let response: FindNodesResponse = self.ctx.command_request(&FIND_NODES, &params).await?;
        Ok(response.nodes)
    }

    async fn on_session_created(&self, handler: Handler<ExplorerSession>) {
        let ctx = Arc::clone(&self.ctx);
        self.ctx
            .subscribe(&SESSION_CREATED, move |wire: SessionStatusWire| {
                handler(ctx.inbound().explorer_session(wire));
            })
            .await;
    }

    async fn on_session_disconnected(&self, handler: Handler<ExplorerSession>) {
        let ctx = Arc::clone(&self.ctx);
        self.ctx
            .subscribe(&SESSION_DISCONNECTED, move |wire: SessionStatusWire| {
                handler(ctx.inbound().explorer_session(wire));
            })
            .await;
    }

    async fn on_expand_completed(&self, handler: Handler<ExpandResponse>) {
        self.ctx
            .subscribe(&EXPAND_COMPLETED, move |params| handler(params))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn create_session_returns_session_id() {
        let (ctx, transport) = test_context();
        transport.stub(
            CREATE_SESSION.method(),
            serde_json::json!({"sessionId": "session-9"}),
        );
        let service = ObjectExplorerService::new(ctx);

        let response = service
            .create_session(ConnectionDetails::default())
            .await
            .unwrap();
        assert_eq!(response.session_id, "session-9");
    }

    #[tokio::test]
    async fn expand_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = ObjectExplorerService::new(Arc::clone(&ctx));
        assert!(service.expand_node("s", "/db/tables").await.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn session_created_payload_is_converted() {
        let (ctx, transport) = test_context();
        let service = ObjectExplorerService::new(ctx);

        static RECEIVED: AtomicUsize = AtomicUsize::new(0);
        service
            .on_session_created(Box::new(|session| {
                assert!(session.success);
                assert_eq!(session.session_id, "session-1");
                assert_eq!(
                    session.root_node.as_ref().map(|n| n.node_path.as_str()),
                    Some("/")
                );
                RECEIVED.fetch_add(1, Ordering::SeqCst);
            }))
            .await;

        transport
            .emit(
                SESSION_CREATED.method(),
                serde_json::json!({
                    "success": true,
                    "sessionId": "session-1",
                    "rootNode": {"nodePath": "/", "nodeType": "Server", "label": "srv"}
                }),
            )
            .await;
        assert_eq!(RECEIVED.load(Ordering::SeqCst), 1);
    }
}

//! Server-side file browser feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::file_browser::{
    FileBrowserCloseParams, FileBrowserCloseResponse, FileBrowserExpandParams,
    FileBrowserExpandedParams, FileBrowserOpenParams, FileBrowserOpenedParams,
    FileBrowserValidateParams, FileBrowserValidatedParams,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const OPEN: RequestType<FileBrowserOpenParams, bool> = RequestType::new("filebrowser/open");
pub const EXPAND: RequestType<FileBrowserExpandParams, bool> =
    RequestType::new("filebrowser/expand");
pub const VALIDATE: RequestType<FileBrowserValidateParams, bool> =
    RequestType::new("filebrowser/validate");
pub const CLOSE: RequestType<FileBrowserCloseParams, FileBrowserCloseResponse> =
    RequestType::new("filebrowser/close");
pub const OPEN_COMPLETE: NotificationType<FileBrowserOpenedParams> =
    NotificationType::new("filebrowser/opencomplete");
pub const EXPAND_COMPLETE: NotificationType<FileBrowserExpandedParams> =
    NotificationType::new("filebrowser/expandcomplete");
pub const VALIDATE_COMPLETE: NotificationType<FileBrowserValidatedParams> =
    NotificationType::new("filebrowser/validatecomplete");

pub const MESSAGES: &[MessageIdentifier] = &[
    OPEN.identifier(),
    EXPAND.identifier(),
    VALIDATE.identifier(),
    CLOSE.identifier(),
    OPEN_COMPLETE.identifier(),
    EXPAND_COMPLETE.identifier(),
    VALIDATE_COMPLETE.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "fileBrowser",
    domain_key: "fileBrowser",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(FileBrowserService::new(Arc::clone(ctx)));
    Some(registry.register_file_browser_provider(service))
}

/// Remote file browsing. Requests acknowledge with a boolean; tree content
/// arrives through the completion notifications.
#[async_trait]
pub trait FileBrowserProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn open(&self, params: FileBrowserOpenParams) -> ClientResult<bool>;

    async fn expand(&self, owner_uri: &str, expand_path: &str) -> ClientResult<bool>;

    async fn validate(&self, params: FileBrowserValidateParams) -> ClientResult<bool>;

    async fn close(&self, owner_uri: &str) -> ClientResult<FileBrowserCloseResponse>;

    async fn on_open_complete(&self, handler: Handler<FileBrowserOpenedParams>);

    async fn on_expand_complete(&self, handler: Handler<FileBrowserExpandedParams>);

    async fn on_validate_complete(&self, handler: Handler<FileBrowserValidatedParams>);
}

pub struct FileBrowserService {
    ctx: Arc<ClientContext>,
}

impl FileBrowserService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl FileBrowserProvider for FileBrowserService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn open(&self, params: FileBrowserOpenParams) -> ClientResult<bool> {
        self.ctx.command_request(&OPEN, &params).await
    }

    async fn expand(&self, owner_uri: &str, expand_path: &str) -> ClientResult<bool> {
        let params = FileBrowserExpandParams {
            owner_uri: owner_uri.to_string(),
            expand_path: expand_path.to_string(),
        };
        self.ctx.command_request(&EXPAND, &params).await
    }

    async fn validate(&self, params: FileBrowserValidateParams) -> ClientResult<bool> {
        self.ctx.command_request(&VALIDATE, &params).await
    }

    async fn close(&self, owner_uri: &str) -> ClientResult<FileBrowserCloseResponse> {
        let params = FileBrowserCloseParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.command_request(&CLOSE, &params).await
    }

    async fn on_open_complete(&self, handler: Handler<FileBrowserOpenedParams>) {
        self.ctx
            .subscribe(&OPEN_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_expand_complete(&self, handler: Handler<FileBrowserExpandedParams>) {
        self.ctx
            .subscribe(&EXPAND_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_validate_complete(&self, handler: Handler<FileBrowserValidatedParams>) {
        self.ctx
            .subscribe(&VALIDATE_COMPLETE, move |params| handler(params))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn open_sends_filters() {
        let (ctx, transport) = test_context();
        transport.stub(OPEN.method(), serde_json::json!(true));
        let service = FileBrowserService::new(ctx);

        let accepted = service
            .open(FileBrowserOpenParams {
                owner_uri: "uri1".to_string(),
                expand_path: "/backups".to_string(),
                file_filters: vec!["*.bak".to_string()],
                change_filter: false,
            })
            .await
            .unwrap();
        assert!(accepted);

        let (_, params) = transport.last_request().unwrap();
        assert_eq!(params.unwrap()["fileFilters"][0], "*.bak");
    }

    #[tokio::test]
    async fn expand_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = FileBrowserService::new(Arc::clone(&ctx));
        assert!(service.expand("uri1", "/backups").await.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn open_complete_delivers_tree() {
        let (ctx, transport) = test_context();
        let service = FileBrowserService::new(ctx);

        static RECEIVED: AtomicUsize = AtomicUsize::new(0);
        service
            .on_open_complete(Box::new(|params| {
                assert!(params.succeeded);
                let tree = params.file_tree.as_ref().unwrap();
                assert_eq!(tree.root_node.full_path, "/");
                RECEIVED.fetch_add(1, Ordering::SeqCst);
            }))
            .await;

        transport
            .emit(
                OPEN_COMPLETE.method(),
                serde_json::json!({
                    "ownerUri": "uri1",
                    "succeeded": true,
                    "fileTree": {"rootNode": {"name": "", "fullPath": "/"}}
                }),
            )
            .await;
        assert_eq!(RECEIVED.load(Ordering::SeqCst), 1);
    }
}

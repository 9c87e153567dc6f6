//! Connection management feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::connection::{
    BuildConnectionInfoParams, CancelConnectParams, ChangeDatabaseParams, ConnectParams,
    ConnectionChangedParams, ConnectionCompleteParams, ConnectionDetails, ConnectionProfile,
    DisconnectParams, GetConnectionStringParams, LanguageFlavorChangedParams, ListDatabasesParams,
    ListDatabasesResult,
};
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const CONNECT: RequestType<ConnectParams, bool> = RequestType::new("connection/connect");
pub const DISCONNECT: RequestType<DisconnectParams, bool> =
    RequestType::new("connection/disconnect");
pub const CANCEL_CONNECT: RequestType<CancelConnectParams, bool> =
    RequestType::new("connection/cancelconnect");
pub const CHANGE_DATABASE: RequestType<ChangeDatabaseParams, bool> =
    RequestType::new("connection/changedatabase");
pub const LIST_DATABASES: RequestType<ListDatabasesParams, ListDatabasesResult> =
    RequestType::new("connection/listdatabases");
pub const GET_CONNECTION_STRING: RequestType<GetConnectionStringParams, String> =
    RequestType::new("connection/getconnectionstring");
pub const BUILD_CONNECTION_INFO: RequestType<BuildConnectionInfoParams, ConnectionDetails> =
    RequestType::new("connection/buildconnectioninfo");
pub const LANGUAGE_FLAVOR_CHANGED: NotificationType<LanguageFlavorChangedParams> =
    NotificationType::new("connection/languageflavorchanged");
pub const CONNECTION_COMPLETE: NotificationType<ConnectionCompleteParams> =
    NotificationType::new("connection/complete");
pub const CONNECTION_CHANGED: NotificationType<ConnectionChangedParams> =
    NotificationType::new("connection/connectionchanged");

pub const MESSAGES: &[MessageIdentifier] = &[
    CONNECT.identifier(),
    DISCONNECT.identifier(),
    CANCEL_CONNECT.identifier(),
    CHANGE_DATABASE.identifier(),
    LIST_DATABASES.identifier(),
    GET_CONNECTION_STRING.identifier(),
    BUILD_CONNECTION_INFO.identifier(),
    LANGUAGE_FLAVOR_CHANGED.identifier(),
    CONNECTION_COMPLETE.identifier(),
    CONNECTION_CHANGED.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "connection",
    domain_key: "connection",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(ConnectionService::new(Arc::clone(ctx)));
    Some(registry.register_connection_provider(service))
}

/// Connection capability as the host registry sees it.
///
/// All requests here are reads from the caller's perspective: on transport
/// failure they degrade to a safe default instead of propagating, and
/// connection progress is reported through the completion notifications.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn connect(&self, owner_uri: &str, profile: &ConnectionProfile) -> bool;

    async fn disconnect(&self, owner_uri: &str) -> bool;

    async fn cancel_connect(&self, owner_uri: &str) -> bool;

    async fn change_database(&self, owner_uri: &str, new_database: &str) -> bool;

    async fn list_databases(&self, owner_uri: &str) -> Option<ListDatabasesResult>;

    async fn get_connection_string(
        &self,
        owner_uri: &str,
        include_password: bool,
    ) -> Option<String>;

    async fn build_connection_info(&self, connection_string: &str) -> Option<ConnectionDetails>;

    /// Tell the backend which language flavor a document should be treated
    /// as. Fire-and-forget.
    async fn language_flavor_changed(&self, params: LanguageFlavorChangedParams);

    async fn on_connection_complete(&self, handler: Handler<ConnectionCompleteParams>);

    async fn on_connection_changed(&self, handler: Handler<ConnectionChangedParams>);
}

pub struct ConnectionService {
    ctx: Arc<ClientContext>,
}

impl ConnectionService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ConnectionProvider for ConnectionService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn connect(&self, owner_uri: &str, profile: &ConnectionProfile) -> bool {
        let params = ConnectParams {
            owner_uri: owner_uri.to_string(),
            connection: self.ctx.outbound().connection_details(profile),
        };
        self.ctx.read_request(&CONNECT, &params).await.unwrap_or(false)
    }

    async fn disconnect(&self, owner_uri: &str) -> bool {
        let params = DisconnectParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .read_request(&DISCONNECT, &params)
            .await
            .unwrap_or(false)
    }

    async fn cancel_connect(&self, owner_uri: &str) -> bool {
        let params = CancelConnectParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .read_request(&CANCEL_CONNECT, &params)
            .await
            .unwrap_or(false)
    }

    async fn change_database(&self, owner_uri: &str, new_database: &str) -> bool {
        let params = ChangeDatabaseParams {
            owner_uri: owner_uri.to_string(),
            new_database: new_database.to_string(),
        };
        self.ctx
            .read_request(&CHANGE_DATABASE, &params)
            .await
            .unwrap_or(false)
    }

    async fn list_databases(&self, owner_uri: &str) -> Option<ListDatabasesResult> {
        let params = ListDatabasesParams {
            owner_uri: owner_uri.to_string(),
            include_details: None,
        };
        self.ctx.read_request(&LIST_DATABASES, &params).await
    }

    async fn get_connection_string(
        &self,
        owner_uri: &str,
        include_password: bool,
    ) -> Option<String> {
        let params = GetConnectionStringParams {
            owner_uri: owner_uri.to_string(),
            include_password,
        };
        self.ctx.read_request(&GET_CONNECTION_STRING, &params).await
    }

    async fn build_connection_info(&self, connection_string: &str) -> Option<ConnectionDetails> {
        let params = BuildConnectionInfoParams {
            connection_string: connection_string.to_string(),
        };
        self.ctx.read_request(&BUILD_CONNECTION_INFO, &params).await
    }

    async fn language_flavor_changed(&self, params: LanguageFlavorChangedParams) {
        self.ctx.notify(&LANGUAGE_FLAVOR_CHANGED, &params).await;
    }

    async fn on_connection_complete(&self, handler: Handler<ConnectionCompleteParams>) {
        self.ctx
            .subscribe(&CONNECTION_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_connection_changed(&self, handler: Handler<ConnectionChangedParams>) {
        self.ctx
            .subscribe(&CONNECTION_CHANGED, move |params| handler(params))
            .await;
    }
}

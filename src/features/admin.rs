//! Administration services feature

use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDescriptor;
use crate::client::ClientContext;
use crate::contracts::admin::{
    CreateDatabaseParams, CreateDatabaseResult, CreateLoginParams, CreateLoginResult,
    DatabaseInfo, DefaultDatabaseInfoParams, DefaultDatabaseInfoResult, GetDatabaseInfoParams,
    GetDatabaseInfoResult, LoginInfo,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const CREATE_DATABASE: RequestType<CreateDatabaseParams, CreateDatabaseResult> =
    RequestType::new("admin/createdatabase");
pub const CREATE_LOGIN: RequestType<CreateLoginParams, CreateLoginResult> =
    RequestType::new("admin/createlogin");
pub const GET_DATABASE_INFO: RequestType<GetDatabaseInfoParams, GetDatabaseInfoResult> =
    RequestType::new("admin/getdatabaseinfo");
pub const GET_DEFAULT_DATABASE_INFO: RequestType<
    DefaultDatabaseInfoParams,
    DefaultDatabaseInfoResult,
> = RequestType::new("admin/getdefaultdatabaseinfo");

pub const MESSAGES: &[MessageIdentifier] = &[
    CREATE_DATABASE.identifier(),
    CREATE_LOGIN.identifier(),
    GET_DATABASE_INFO.identifier(),
    GET_DEFAULT_DATABASE_INFO.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "adminServices",
    domain_key: "adminServices",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(AdminService::new(Arc::clone(ctx)));
    Some(registry.register_admin_services_provider(service))
}

#[async_trait]
pub trait AdminServicesProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Create a database. Mutating, so failures propagate.
    async fn create_database(
        &self,
        owner_uri: &str,
        database_info: DatabaseInfo,
    ) -> ClientResult<CreateDatabaseResult>;

    /// Create a login. Mutating, so failures propagate.
    async fn create_login(
        &self,
        owner_uri: &str,
        login_info: LoginInfo,
    ) -> ClientResult<CreateLoginResult>;

    async fn get_database_info(&self, owner_uri: &str) -> Option<DatabaseInfo>;

    async fn get_default_database_info(&self, owner_uri: &str) -> Option<DatabaseInfo>;
}

pub struct AdminService {
    ctx: Arc<ClientContext>,
}

impl AdminService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl AdminServicesProvider for AdminService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn create_database(
        &self,
        owner_uri: &str,
        database_info: DatabaseInfo,
    ) -> ClientResult<CreateDatabaseResult> {
        let params = CreateDatabaseParams {
            owner_uri: owner_uri.to_string(),
            database_info,
        };
        self.ctx.command_request(&CREATE_DATABASE, &params).await
    }

    async fn create_login(
        &self,
        owner_uri: &str,
        login_info: LoginInfo,
    ) -> ClientResult<CreateLoginResult> {
        let params = CreateLoginParams {
            owner_uri: owner_uri.to_string(),
            login_info,
        };
        self.ctx.command_request(&CREATE_LOGIN, &params).await
    }

    async fn get_database_info(&self, owner_uri: &str) -> Option<DatabaseInfo> {
        let params = GetDatabaseInfoParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .read_request(&GET_DATABASE_INFO, &params)
            .await?
            .database_info
    }

    async fn get_default_database_info(&self, owner_uri: &str) -> Option<DatabaseInfo> {
        let params = DefaultDatabaseInfoParams {
            owner_uri: owner_uri.to_string(),
        };
        let result: DefaultDatabaseInfoResult = self
            .ctx
            .read_request(&GET_DEFAULT_DATABASE_INFO, &params)
            .await?;
        Some(result.default_database_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn create_database_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = AdminService::new(Arc::clone(&ctx));

        let outcome = service
            .create_database("uri1", DatabaseInfo::default())
            .await;
        assert!(outcome.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn database_info_reads_degrade() {
        let (ctx, _transport) = failing_context();
        let service = AdminService::new(ctx);
        assert!(service.get_database_info("uri1").await.is_none());
    }

    #[tokio::test]
    async fn get_database_info_unwraps_payload() {
        let (ctx, transport) = test_context();
        transport.stub(
            GET_DATABASE_INFO.method(),
            serde_json::json!({"databaseInfo": {"options": {"name": "orders"}}}),
        );
        let service = AdminService::new(ctx);

        let info = service.get_database_info("uri1").await.unwrap();
        assert_eq!(info.options["name"], "orders");
    }
}

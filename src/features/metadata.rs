//! Metadata browsing feature

use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDescriptor;
use crate::client::ClientContext;
use crate::contracts::metadata::{
    DatabaseListing, DatabaseListingParams, MetadataQueryParams, MetadataQueryResult,
    TableMetadataParams, TableMetadataResult,
};
use crate::messages::{MessageIdentifier, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const LIST_METADATA: RequestType<MetadataQueryParams, MetadataQueryResult> =
    RequestType::new("metadata/list");
pub const LIST_DATABASES: RequestType<DatabaseListingParams, DatabaseListing> =
    RequestType::new("metadata/listdatabases");
pub const TABLE_METADATA: RequestType<TableMetadataParams, TableMetadataResult> =
    RequestType::new("metadata/table");
pub const VIEW_METADATA: RequestType<TableMetadataParams, TableMetadataResult> =
    RequestType::new("metadata/view");

pub const MESSAGES: &[MessageIdentifier] = &[
    LIST_METADATA.identifier(),
    LIST_DATABASES.identifier(),
    TABLE_METADATA.identifier(),
    VIEW_METADATA.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "metadata",
    domain_key: "metadata",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(MetadataService::new(Arc::clone(ctx)));
    Some(registry.register_metadata_provider(service))
}

/// Metadata reads degrade to `None` on failure so browsing UIs can render
/// empty states.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn get_metadata(&self, owner_uri: &str) -> Option<MetadataQueryResult>;

    async fn get_databases(&self, owner_uri: &str) -> Option<DatabaseListing>;

    async fn get_table_info(
        &self,
        owner_uri: &str,
        schema: &str,
        object_name: &str,
    ) -> Option<TableMetadataResult>;

    async fn get_view_info(
        &self,
        owner_uri: &str,
        schema: &str,
        object_name: &str,
    ) -> Option<TableMetadataResult>;
}

pub struct MetadataService {
    ctx: Arc<ClientContext>,
}

impl MetadataService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetadataProvider for MetadataService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn get_metadata(&self, owner_uri: &str) -> Option<MetadataQueryResult> {
        let params = MetadataQueryParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.read_request(&LIST_METADATA, &params).await
    }

    async fn get_databases(&self, owner_uri: &str) -> Option<DatabaseListing> {
        let params = DatabaseListingParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.read_request(&LIST_DATABASES, &params).await
    }

    async fn get_table_info(
        &self,
        owner_uri: &str,
        schema: &str,
        object_name: &str,
    ) -> Option<TableMetadataResult> {
        let params = TableMetadataParams {
            owner_uri: owner_uri.to_string(),
            schema: schema.to_string(),
            object_name: object_name.to_string(),
        };
        self.ctx.read_request(&TABLE_METADATA, &params).await
    }

    async fn get_view_info(
        &self,
        owner_uri: &str,
        schema: &str,
        object_name: &str,
    ) -> Option<TableMetadataResult> {
        let params = TableMetadataParams {
            owner_uri: owner_uri.to_string(),
            schema: schema.to_string(),
            object_name: object_name.to_string(),
        };
        self.ctx.read_request(&VIEW_METADATA, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn get_databases_degrades_to_none_on_failure() {
        let (ctx, transport) = failing_context();
        let service = MetadataService::new(Arc::clone(&ctx));

        assert!(service.get_databases("uri1").await.is_none());
        assert_eq!(ctx.failed_request_count(), 1);
        assert_eq!(transport.request_count(LIST_DATABASES.method()), 1);
    }

    #[tokio::test]
    async fn get_table_info_returns_columns() {
        let (ctx, transport) = test_context();
        transport.stub(
            TABLE_METADATA.method(),
            serde_json::json!({
                "columns": [
                    {"name": "id", "dataType": "int", "isKey": true},
                    {"name": "label", "dataType": "nvarchar"}
                ]
            }),
        );
        let service = MetadataService::new(ctx);

        let info = service.get_table_info("uri1", "dbo", "Orders").await.unwrap();
        assert_eq!(info.columns.len(), 2);
        assert_eq!(info.columns[0].is_key, Some(true));
    }
}

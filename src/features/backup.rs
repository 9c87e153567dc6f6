//! Backup feature

use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDescriptor;
use crate::client::ClientContext;
use crate::contracts::backup::{
    BackupConfigInfo, BackupConfigInfoParams, BackupConfigInfoResult, BackupInfo, BackupParams,
    BackupResponse,
};
use crate::contracts::tasks::TaskExecutionMode;
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const BACKUP: RequestType<BackupParams, BackupResponse> = RequestType::new("backup/backup");
pub const BACKUP_CONFIG_INFO: RequestType<BackupConfigInfoParams, BackupConfigInfoResult> =
    RequestType::new("backup/backupconfiginfo");

pub const MESSAGES: &[MessageIdentifier] =
    &[BACKUP.identifier(), BACKUP_CONFIG_INFO.identifier()];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "backup",
    domain_key: "backup",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(BackupService::new(Arc::clone(ctx)));
    Some(registry.register_backup_provider(service))
}

#[async_trait]
pub trait BackupProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Start a backup. Mutating, so failures propagate.
    async fn backup(
        &self,
        owner_uri: &str,
        backup_info: BackupInfo,
        task_execution_mode: TaskExecutionMode,
    ) -> ClientResult<BackupResponse>;

    async fn get_backup_config_info(&self, owner_uri: &str) -> Option<BackupConfigInfo>;
}

pub struct BackupService {
    ctx: Arc<ClientContext>,
}

impl BackupService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BackupProvider for BackupService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn backup(
        &self,
        owner_uri: &str,
        backup_info: BackupInfo,
        task_execution_mode: TaskExecutionMode,
    ) -> ClientResult<BackupResponse> {
        let params = BackupParams {
            owner_uri: owner_uri.to_string(),
            backup_info,
            task_execution_mode,
        };
        self.ctx.command_request(&BACKUP, &params).await
    }

    async fn get_backup_config_info(&self, owner_uri: &str) -> Option<BackupConfigInfo> {
        let params = BackupConfigInfoParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .read_request(&BACKUP_CONFIG_INFO, &params)
            .await?
            .backup_config_info
    }
}

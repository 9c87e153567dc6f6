//! Backup payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tasks::TaskExecutionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub database_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupParams {
    pub owner_uri: String,
    pub backup_info: BackupInfo,
    pub task_execution_mode: TaskExecutionMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfigInfoParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_backup_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_model: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub latest_backups: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfigInfoResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_config_info: Option<BackupConfigInfo>,
}

//! Restore payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tasks::TaskExecutionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreParams {
    pub owner_uri: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
    #[serde(default)]
    pub task_execution_mode: TaskExecutionMode,
    /// Identifies a previously computed restore plan, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePlanResponse {
    pub session_id: String,
    pub can_restore: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_files: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub plan_details: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreConfigInfoParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreConfigInfoResult {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config_info: HashMap<String, Value>,
}

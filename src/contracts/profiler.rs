//! Profiler session payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilerSessionTemplate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_statement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionParams {
    pub owner_uri: String,
    pub session_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<ProfilerSessionTemplate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionParams {
    pub owner_uri: String,
    pub session_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopSessionResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseSessionParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseSessionResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectSessionParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisconnectSessionResult {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilerEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub values: HashMap<String, Value>,
}

/// Payload of `profiler/eventsavailable`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsAvailableParams {
    pub owner_uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ProfilerEvent>,
    #[serde(default)]
    pub events_lost: bool,
}

/// Payload of `profiler/sessionstopped`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStoppedParams {
    pub owner_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
}

/// Payload of `profiler/sessioncreated`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedParams {
    pub owner_uri: String,
    pub session_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
}

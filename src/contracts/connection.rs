//! Connection management payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Application-facing connection description.
///
/// The outbound converter flattens this into the [`ConnectionDetails`]
/// option bag the backend expects; the named fields exist so hosts get a
/// typed surface for the common properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    pub server_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_type: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

/// Wire-shape connection description: a flat option bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub options: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub owner_uri: String,
    pub connection: ConnectionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelConnectParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDatabaseParams {
    pub owner_uri: String,
    pub new_database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDatabasesParams {
    pub owner_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_details: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDatabasesResult {
    pub database_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConnectionStringParams {
    pub owner_uri: String,
    pub include_password: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConnectionInfoParams {
    pub connection_string: String,
}

/// Summary of an established connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub server_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Backend build details reported on connection completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_edition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cloud: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

/// Payload of the `connection/complete` notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCompleteParams {
    pub owner_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_summary: Option<ConnectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<ServerInfo>,
}

/// Payload of the `connection/connectionchanged` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionChangedParams {
    pub owner_uri: String,
    pub connection: ConnectionSummary,
}

/// Payload of the outbound `connection/languageflavorchanged` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageFlavorChangedParams {
    pub uri: String,
    pub language: String,
    pub flavor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_params_wire_shape() {
        let params = ConnectParams {
            owner_uri: "file:///q.sql".to_string(),
            connection: ConnectionDetails {
                options: HashMap::from([(
                    "server".to_string(),
                    Value::String("tcp:localhost".to_string()),
                )]),
            },
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["ownerUri"], "file:///q.sql");
        assert_eq!(json["connection"]["options"]["server"], "tcp:localhost");
    }

    #[test]
    fn connection_complete_tolerates_minimal_payload() {
        let params: ConnectionCompleteParams =
            serde_json::from_value(serde_json::json!({"ownerUri": "u"})).unwrap();
        assert_eq!(params.owner_uri, "u");
        assert!(params.connection_id.is_none());
        assert!(params.server_info.is_none());
    }
}

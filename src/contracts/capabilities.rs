//! Capability discovery payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequestParams {
    pub host_name: String,
    pub host_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesResult {
    pub capabilities: DataProtocolCapabilities,
}

/// What one backend provider can do, as reported by `capabilities/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtocolCapabilities {
    pub protocol_version: String,
    pub provider_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_provider: Option<ConnectionProviderOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeatureMetadata>,
}

/// Connection option metadata used by hosts to render connection dialogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProviderOptions {
    pub options: Vec<ConnectionOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOption {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMetadata {
    pub feature_name: String,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_round_trip_minimal() {
        let result: CapabilitiesResult = serde_json::from_value(serde_json::json!({
            "capabilities": {
                "protocolVersion": "1.0",
                "providerName": "MSSQL",
                "features": [{"featureName": "backup", "enabled": true}]
            }
        }))
        .unwrap();
        assert_eq!(result.capabilities.provider_name, "MSSQL");
        assert_eq!(result.capabilities.features.len(), 1);
        assert!(result.capabilities.connection_provider.is_none());
    }
}

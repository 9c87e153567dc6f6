//! Capability declaration structures
//!
//! Before the initial handshake every feature merges its contribution into a
//! shared client-capabilities structure under
//! `connection.<domainKey>.dynamicRegistration`. Domain keys never collide
//! across features by construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Client capability declaration sent during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<BTreeMap<String, DomainCapability>>,
}

impl ClientCapabilities {
    /// Ensure the nested path for `domain_key` exists and flag dynamic
    /// registration. Idempotent.
    pub fn enable_dynamic_registration(&mut self, domain_key: &str) {
        self.connection
            .get_or_insert_with(BTreeMap::new)
            .insert(
                domain_key.to_string(),
                DomainCapability {
                    dynamic_registration: true,
                },
            );
    }

    /// Domain keys declared so far, in stable order.
    pub fn declared_domains(&self) -> Vec<&str> {
        self.connection
            .as_ref()
            .map(|domains| domains.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Leaf capability flag for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCapability {
    pub dynamic_registration: bool,
}

/// Provider support advertised by the backend during the handshake.
///
/// Unknown fields are ignored so older clients keep working against newer
/// backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_services_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_explorer_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripting_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_services_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_browser_provider: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiler_provider: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_is_idempotent() {
        let mut once = ClientCapabilities::default();
        once.enable_dynamic_registration("query");

        let mut twice = ClientCapabilities::default();
        twice.enable_dynamic_registration("query");
        twice.enable_dynamic_registration("query");

        assert_eq!(once, twice);
    }

    #[test]
    fn domains_do_not_collide() {
        let mut caps = ClientCapabilities::default();
        caps.enable_dynamic_registration("connection");
        caps.enable_dynamic_registration("query");
        caps.enable_dynamic_registration("metadata");
        assert_eq!(caps.declared_domains(), ["connection", "metadata", "query"]);
    }

    #[test]
    fn serializes_with_camel_case_leaf() {
        let mut caps = ClientCapabilities::default();
        caps.enable_dynamic_registration("fileBrowser");
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(
            json["connection"]["fileBrowser"]["dynamicRegistration"],
            serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn server_capabilities_tolerate_unknown_fields() {
        let caps: ServerCapabilities = serde_json::from_value(serde_json::json!({
            "connectionProvider": true,
            "somethingNewer": {"nested": 1}
        }))
        .unwrap();
        assert_eq!(caps.connection_provider, Some(true));
        assert_eq!(caps.profiler_provider, None);
    }
}

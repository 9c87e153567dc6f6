//! Payload converters
//!
//! Pure, synchronous, stateless transforms between the shapes the host
//! application works with and the shapes the wire protocol carries. Both
//! converters are supplied by the host; [`DefaultConverters`] covers the
//! common case where the two shapes line up field-for-field.

use serde_json::Value;

use crate::contracts::capabilities::{CapabilitiesResult, DataProtocolCapabilities};
use crate::contracts::connection::{ConnectionDetails, ConnectionProfile};
use crate::contracts::object_explorer::{ExplorerSession, SessionStatusWire};

/// Application shape → wire shape, for requests the client sends.
pub trait OutboundConverter: Send + Sync {
    /// Flatten a typed connection profile into the option bag the backend
    /// expects.
    fn connection_details(&self, profile: &ConnectionProfile) -> ConnectionDetails;
}

/// Wire shape → application shape, for payloads the client receives.
pub trait InboundConverter: Send + Sync {
    fn capabilities(&self, result: CapabilitiesResult) -> DataProtocolCapabilities;

    fn explorer_session(&self, wire: SessionStatusWire) -> ExplorerSession;
}

/// Field-for-field converters used when the host supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverters;

impl OutboundConverter for DefaultConverters {
    fn connection_details(&self, profile: &ConnectionProfile) -> ConnectionDetails {
        let mut options = profile.options.clone();
        options.insert("server".to_string(), Value::String(profile.server_name.clone()));
        if let Some(database) = &profile.database_name {
            options.insert("database".to_string(), Value::String(database.clone()));
        }
        if let Some(user) = &profile.user_name {
            options.insert("user".to_string(), Value::String(user.clone()));
        }
        if let Some(password) = &profile.password {
            options.insert("password".to_string(), Value::String(password.clone()));
        }
        if let Some(auth) = &profile.authentication_type {
            options.insert("authenticationType".to_string(), Value::String(auth.clone()));
        }
        ConnectionDetails { options }
    }
}

impl InboundConverter for DefaultConverters {
    fn capabilities(&self, result: CapabilitiesResult) -> DataProtocolCapabilities {
        result.capabilities
    }

    fn explorer_session(&self, wire: SessionStatusWire) -> ExplorerSession {
        ExplorerSession {
            success: wire.success,
            session_id: wire.session_id,
            root_node: wire.root_node,
            error_message: wire.error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_flattens_into_options() {
        let profile = ConnectionProfile {
            server_name: "tcp:db.internal".to_string(),
            database_name: Some("orders".to_string()),
            user_name: Some("svc".to_string()),
            password: None,
            authentication_type: Some("Integrated".to_string()),
            options: Default::default(),
        };

        let details = DefaultConverters.connection_details(&profile);
        assert_eq!(details.options["server"], "tcp:db.internal");
        assert_eq!(details.options["database"], "orders");
        assert_eq!(details.options["authenticationType"], "Integrated");
        assert!(!details.options.contains_key("password"));
    }

    #[test]
    fn explicit_options_survive_flattening() {
        let profile = ConnectionProfile {
            server_name: "s".to_string(),
            options: std::collections::HashMap::from([(
                "applicationName".to_string(),
                Value::String("dataproto".to_string()),
            )]),
            ..Default::default()
        };
        let details = DefaultConverters.connection_details(&profile);
        assert_eq!(details.options["applicationName"], "dataproto");
        assert_eq!(details.options["server"], "s");
    }
}

//! Global Configuration Singleton

use std::sync::OnceLock;
use std::time::Duration;

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Runtime tunables for the transport substrate.
///
/// Populated once from the environment. The extension layer itself has no
/// timeouts; these only govern wire tracing and how long process shutdown
/// is allowed to take.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Log every framed message at TRACE level.
    pub trace_wire: bool,
    /// How long to wait for the backend to honor a shutdown request.
    pub shutdown_grace: Duration,
    /// How long to wait for process exit before forcing a kill.
    pub kill_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trace_wire: false,
            shutdown_grace: Duration::from_secs(2),
            kill_grace: Duration::from_secs(5),
        }
    }
}

impl RuntimeConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trace_wire: env_flag("DATAPROTO_TRACE_WIRE").unwrap_or(defaults.trace_wire),
            shutdown_grace: env_millis("DATAPROTO_SHUTDOWN_GRACE_MS")
                .unwrap_or(defaults.shutdown_grace),
            kill_grace: env_millis("DATAPROTO_KILL_GRACE_MS").unwrap_or(defaults.kill_grace),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

pub fn get() -> &'static RuntimeConfig {
    CONFIG.get_or_init(RuntimeConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RuntimeConfig::default();
        assert!(!config.trace_wire);
        assert_eq!(config.shutdown_grace, Duration::from_secs(2));
        assert!(config.kill_grace > config.shutdown_grace);
    }

    #[test]
    fn env_flag_parsing() {
        // SAFETY: tests in this module do not race on these variables
        unsafe { std::env::set_var("DATAPROTO_TEST_FLAG", "on") };
        assert_eq!(env_flag("DATAPROTO_TEST_FLAG"), Some(true));
        unsafe { std::env::set_var("DATAPROTO_TEST_FLAG", "garbage") };
        assert_eq!(env_flag("DATAPROTO_TEST_FLAG"), None);
        unsafe { std::env::remove_var("DATAPROTO_TEST_FLAG") };
    }
}

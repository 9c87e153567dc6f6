//! Shared test doubles: a scriptable transport and a recording registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use crate::client::ClientContext;
use crate::converters::DefaultConverters;
use crate::error::RpcError;
use crate::features::admin::AdminServicesProvider;
use crate::features::backup::BackupProvider;
use crate::features::capabilities::CapabilitiesProvider;
use crate::features::connection::ConnectionProvider;
use crate::features::file_browser::FileBrowserProvider;
use crate::features::metadata::MetadataProvider;
use crate::features::object_explorer::ObjectExplorerProvider;
use crate::features::profiler::ProfilerProvider;
use crate::features::query::QueryProvider;
use crate::features::restore::RestoreProvider;
use crate::features::scripting::ScriptingProvider;
use crate::features::tasks::TaskServicesProvider;
use crate::registry::{ProviderHandle, ProviderRegistry};
use crate::rpc::{RawNotificationHandler, RpcTransport};

type Recorded = (String, Option<Value>);

/// Transport double: stubbed responses, recorded traffic, injectable
/// failures, and manual notification emission.
#[derive(Default)]
pub struct MockTransport {
    fail_requests: AtomicBool,
    stubs: std::sync::Mutex<HashMap<String, Value>>,
    requests: std::sync::Mutex<Vec<Recorded>>,
    notifications: std::sync::Mutex<Vec<Recorded>>,
    handlers: AsyncMutex<HashMap<String, Vec<RawNotificationHandler>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail_requests.store(true, Ordering::SeqCst);
        transport
    }

    pub fn stub(&self, method: &str, result: Value) {
        self.stubs
            .lock()
            .unwrap()
            .insert(method.to_string(), result);
    }

    pub fn last_request(&self) -> Option<Recorded> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_notification(&self) -> Option<Recorded> {
        self.notifications.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(recorded, _)| recorded == method)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn total_notifications(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    /// Deliver an incoming notification to subscribed handlers.
    pub async fn emit(&self, method: &str, params: Value) {
        let handlers = self.handlers.lock().await;
        if let Some(subscribed) = handlers.get(method) {
            for handler in subscribed {
                handler(params.clone());
            }
        }
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(RpcError::Server {
                code: -32603,
                message: "injected failure".to_string(),
            });
        }

        let stubbed = self.stubs.lock().unwrap().get(method).cloned();
        Ok(stubbed.unwrap_or(Value::Null))
    }

    async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), RpcError> {
        self.notifications
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        Ok(())
    }

    async fn on_notification(&self, method: &str, handler: RawNotificationHandler) {
        self.handlers
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push(handler);
    }
}

/// Registry double: counts registrations and handle releases.
#[derive(Default)]
pub struct MockRegistry {
    registered: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MockRegistry {
    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn handle(&self) -> ProviderHandle {
        self.registered.fetch_add(1, Ordering::SeqCst);
        let released = Arc::clone(&self.released);
        ProviderHandle::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

impl ProviderRegistry for MockRegistry {
    fn register_connection_provider(
        &self,
        _provider: Arc<dyn ConnectionProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_capabilities_provider(
        &self,
        _provider: Arc<dyn CapabilitiesProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_query_provider(&self, _provider: Arc<dyn QueryProvider>) -> ProviderHandle {
        self.handle()
    }

    fn register_metadata_provider(&self, _provider: Arc<dyn MetadataProvider>) -> ProviderHandle {
        self.handle()
    }

    fn register_admin_services_provider(
        &self,
        _provider: Arc<dyn AdminServicesProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_backup_provider(&self, _provider: Arc<dyn BackupProvider>) -> ProviderHandle {
        self.handle()
    }

    fn register_restore_provider(&self, _provider: Arc<dyn RestoreProvider>) -> ProviderHandle {
        self.handle()
    }

    fn register_object_explorer_provider(
        &self,
        _provider: Arc<dyn ObjectExplorerProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_scripting_provider(
        &self,
        _provider: Arc<dyn ScriptingProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_task_services_provider(
        &self,
        _provider: Arc<dyn TaskServicesProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_file_browser_provider(
        &self,
        _provider: Arc<dyn FileBrowserProvider>,
    ) -> ProviderHandle {
        self.handle()
    }

    fn register_profiler_provider(&self, _provider: Arc<dyn ProfilerProvider>) -> ProviderHandle {
        self.handle()
    }
}

/// A context over a fresh recording transport.
pub fn test_context() -> (Arc<ClientContext>, Arc<MockTransport>) {
    context_with(Arc::new(MockTransport::new()))
}

/// A context whose transport rejects every request.
pub fn failing_context() -> (Arc<ClientContext>, Arc<MockTransport>) {
    context_with(Arc::new(MockTransport::failing()))
}

/// Route crate logs through the test harness. Safe to call repeatedly;
/// enable with RUST_LOG when a test needs wire-level detail.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context_with(transport: Arc<MockTransport>) -> (Arc<ClientContext>, Arc<MockTransport>) {
    init_tracing();
    let ctx = ClientContext::new(
        Arc::clone(&transport) as Arc<dyn RpcTransport>,
        Arc::new(DefaultConverters),
        Arc::new(DefaultConverters),
        "test-provider".to_string(),
    );
    (ctx, transport)
}

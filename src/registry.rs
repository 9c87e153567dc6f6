//! Host provider registry boundary
//!
//! The host runtime stores and dispatches to registered providers; this
//! module only defines the seam. Registering a provider yields a
//! [`ProviderHandle`], a capability token whose release function is the only
//! way to relinquish the registration.

use std::fmt;
use std::sync::Arc;

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

/// Disposable token for one installed provider.
///
/// Ownership moves from the registry to the feature's tracking map on
/// successful registration. The release function runs at most once, either
/// through [`release`](Self::release) or on drop.
pub struct ProviderHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Relinquish the registration now.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ProviderHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// The host's provider registry.
///
/// One registration call per capability domain. Each takes the provider the
/// feature built and returns the handle that controls its lifetime.
pub trait ProviderRegistry: Send + Sync {
    fn register_connection_provider(&self, provider: Arc<dyn ConnectionProvider>)
    -> ProviderHandle;

    fn register_capabilities_provider(
        &self,
        provider: Arc<dyn CapabilitiesProvider>,
    ) -> ProviderHandle;

    fn register_query_provider(&self, provider: Arc<dyn QueryProvider>) -> ProviderHandle;

    fn register_metadata_provider(&self, provider: Arc<dyn MetadataProvider>) -> ProviderHandle;

    fn register_admin_services_provider(
        &self,
        provider: Arc<dyn AdminServicesProvider>,
    ) -> ProviderHandle;

    fn register_backup_provider(&self, provider: Arc<dyn BackupProvider>) -> ProviderHandle;

    fn register_restore_provider(&self, provider: Arc<dyn RestoreProvider>) -> ProviderHandle;

    fn register_object_explorer_provider(
        &self,
        provider: Arc<dyn ObjectExplorerProvider>,
    ) -> ProviderHandle;

    fn register_scripting_provider(&self, provider: Arc<dyn ScriptingProvider>) -> ProviderHandle;

    fn register_task_services_provider(
        &self,
        provider: Arc<dyn TaskServicesProvider>,
    ) -> ProviderHandle;

    fn register_file_browser_provider(
        &self,
        provider: Arc<dyn FileBrowserProvider>,
    ) -> ProviderHandle;

    fn register_profiler_provider(&self, provider: Arc<dyn ProfilerProvider>) -> ProviderHandle;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn release_runs_exactly_once() {
        static RELEASES: AtomicUsize = AtomicUsize::new(0);
        let handle = ProviderHandle::new(|| {
            RELEASES.fetch_add(1, Ordering::SeqCst);
        });
        handle.release();
        assert_eq!(RELEASES.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_armed_handle() {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&releases);
        {
            let _handle = ProviderHandle::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_handle_is_inert() {
        let handle = ProviderHandle::noop();
        handle.release();
    }
}

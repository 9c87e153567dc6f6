//! Profiler feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::profiler::{
    CreateSessionParams, CreateSessionResult, DisconnectSessionParams, DisconnectSessionResult,
    EventsAvailableParams, ListSessionsParams, ListSessionsResult, PauseSessionParams,
    PauseSessionResult, ProfilerSessionTemplate, SessionCreatedParams, SessionStoppedParams,
    StartSessionParams, StartSessionResult, StopSessionParams, StopSessionResult,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const CREATE_SESSION: RequestType<CreateSessionParams, CreateSessionResult> =
    RequestType::new("profiler/createsession");
pub const START: RequestType<StartSessionParams, StartSessionResult> =
    RequestType::new("profiler/start");
pub const STOP: RequestType<StopSessionParams, StopSessionResult> =
    RequestType::new("profiler/stop");
pub const PAUSE: RequestType<PauseSessionParams, PauseSessionResult> =
    RequestType::new("profiler/pause");
pub const LIST_SESSIONS: RequestType<ListSessionsParams, ListSessionsResult> =
    RequestType::new("profiler/getsessions");
pub const DISCONNECT: RequestType<DisconnectSessionParams, DisconnectSessionResult> =
    RequestType::new("profiler/disconnect");
pub const EVENTS_AVAILABLE: NotificationType<EventsAvailableParams> =
    NotificationType::new("profiler/eventsavailable");
pub const SESSION_STOPPED: NotificationType<SessionStoppedParams> =
    NotificationType::new("profiler/sessionstopped");
pub const SESSION_CREATED: NotificationType<SessionCreatedParams> =
    NotificationType::new("profiler/sessioncreated");

pub const MESSAGES: &[MessageIdentifier] = &[
    CREATE_SESSION.identifier(),
    START.identifier(),
    STOP.identifier(),
    PAUSE.identifier(),
    LIST_SESSIONS.identifier(),
    DISCONNECT.identifier(),
    EVENTS_AVAILABLE.identifier(),
    SESSION_STOPPED.identifier(),
    SESSION_CREATED.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "profiler",
    domain_key: "profiler",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(ProfilerService::new(Arc::clone(ctx)));
    Some(registry.register_profiler_provider(service))
}

#[async_trait]
pub trait ProfilerProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn create_session(
        &self,
        owner_uri: &str,
        session_name: &str,
        template: Option<ProfilerSessionTemplate>,
    ) -> ClientResult<()>;

    async fn start_session(&self, owner_uri: &str, session_name: &str) -> ClientResult<()>;

    async fn stop_session(&self, owner_uri: &str) -> ClientResult<()>;

    async fn pause_session(&self, owner_uri: &str) -> ClientResult<()>;

    async fn get_sessions(&self, owner_uri: &str) -> ClientResult<Vec<String>>;

    async fn disconnect_session(&self, owner_uri: &str) -> ClientResult<()>;

    /// Attach to an already-running session.
    ///
    /// Currently a no-op: no backend call is made and no result is
    /// produced.
    async fn connect_session(&self, session_name: &str);

    async fn on_events_available(&self, handler: Handler<EventsAvailableParams>);

    async fn on_session_stopped(&self, handler: Handler<SessionStoppedParams>);

    async fn on_session_created(&self, handler: Handler<SessionCreatedParams>);
}

pub struct ProfilerService {
    ctx: Arc<ClientContext>,
}

impl ProfilerService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ProfilerProvider for ProfilerService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn create_session(
        &self,
        owner_uri: &str,
        session_name: &str,
        template: Option<ProfilerSessionTemplate>,
    ) -> ClientResult<()> {
        let params = CreateSessionParams {
            owner_uri: owner_uri.to_string(),
            session_name: session_name.to_string(),
            template,
        };
        self.ctx
            .command_request(&CREATE_SESSION, &params)
            .await
            .map(|_: CreateSessionResult| ())
    }

    async fn start_session(&self, owner_uri: &str, session_name: &str) -> ClientResult<()> {
        let params = StartSessionParams {
            owner_uri: owner_uri.to_string(),
            session_name: session_name.to_string(),
        };
        self.ctx
            .command_request(&START, &params)
            .await
            .map(|_: StartSessionResult| ())
    }

    async fn stop_session(&self, owner_uri: &str) -> ClientResult<()> {
        let params = StopSessionParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&STOP, &params)
            .await
            .map(|_: StopSessionResult| ())
    }

    async fn pause_session(&self, owner_uri: &str) -> ClientResult<()> {
        let params = PauseSessionParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&PAUSE, &params)
            .await
            .map(|_: PauseSessionResult| ())
    }

    async fn get_sessions(&self, owner_uri: &str) -> ClientResult<Vec<String>> {
        let params = ListSessionsParams {
            owner_uri: owner_uri.to_string(),
        };
        let result: ListSessionsResult = self.ctx.command_request(&LIST_SESSIONS, &params).await?;
        Ok(result.sessions)
    }

    async fn disconnect_session(&self, owner_uri: &str) -> ClientResult<()> {
        let params = DisconnectSessionParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&DISCONNECT, &params)
            .await
            .map(|_: DisconnectSessionResult| ())
    }

    async fn connect_session(&self, _session_name: &str) {
        // No backend call yet; the wire method does not exist.
    }

    async fn on_events_available(&self, handler: Handler<EventsAvailableParams>) {
        self.ctx
            .subscribe(&EVENTS_AVAILABLE, move |params| handler(params))
            .await;
    }

    async fn on_session_stopped(&self, handler: Handler<SessionStoppedParams>) {
        self.ctx
            .subscribe(&SESSION_STOPPED, move |params| handler(params))
            .await;
    }

    async fn on_session_created(&self, handler: Handler<SessionCreatedParams>) {
        self.ctx
            .subscribe(&SESSION_CREATED, move |params| handler(params))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn start_session_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = ProfilerService::new(Arc::clone(&ctx));
        assert!(service.start_session("uri1", "trace").await.is_err());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn get_sessions_unwraps_names() {
        let (ctx, transport) = test_context();
        transport.stub(
            LIST_SESSIONS.method(),
            serde_json::json!({"sessions": ["standard", "tsql"]}),
        );
        let service = ProfilerService::new(ctx);

        let sessions = service.get_sessions("uri1").await.unwrap();
        assert_eq!(sessions, ["standard", "tsql"]);
    }

    #[tokio::test]
    async fn connect_session_makes_no_backend_call() {
        let (ctx, transport) = test_context();
        let service = ProfilerService::new(ctx);

        service.connect_session("trace").await;
        assert_eq!(transport.total_requests(), 0);
        assert_eq!(transport.total_notifications(), 0);
    }
}

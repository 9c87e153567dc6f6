//! Task services feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::tasks::{
    CancelTaskParams, ListTasksParams, ListTasksResult, TaskInfo, TaskProgressInfo,
};
use crate::error::ClientResult;
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const LIST_TASKS: RequestType<ListTasksParams, ListTasksResult> =
    RequestType::new("tasks/listtasks");
pub const CANCEL_TASK: RequestType<CancelTaskParams, bool> = RequestType::new("tasks/canceltask");
pub const TASK_CREATED: NotificationType<TaskInfo> =
    NotificationType::new("tasks/newtaskcreated");
pub const TASK_STATUS_CHANGED: NotificationType<TaskProgressInfo> =
    NotificationType::new("tasks/statuschanged");

pub const MESSAGES: &[MessageIdentifier] = &[
    LIST_TASKS.identifier(),
    CANCEL_TASK.identifier(),
    TASK_CREATED.identifier(),
    TASK_STATUS_CHANGED.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "taskServices",
    domain_key: "taskServices",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(TaskService::new(Arc::clone(ctx)));
    Some(registry.register_task_services_provider(service))
}

#[async_trait]
pub trait TaskServicesProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn list_tasks(&self, active_only: bool) -> Option<ListTasksResult>;

    /// Request cancellation of a running task. A command: failures
    /// propagate so the host can tell "cancel rejected" from "task gone".
    async fn cancel_task(&self, task_id: &str) -> ClientResult<bool>;

    async fn on_task_created(&self, handler: Handler<TaskInfo>);

    async fn on_task_status_changed(&self, handler: Handler<TaskProgressInfo>);
}

pub struct TaskService {
    ctx: Arc<ClientContext>,
}

impl TaskService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl TaskServicesProvider for TaskService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn list_tasks(&self, active_only: bool) -> Option<ListTasksResult> {
        let params = ListTasksParams {
            list_active_tasks_only: active_only.then_some(true),
        };
        self.ctx.read_request(&LIST_TASKS, &params).await
    }

    async fn cancel_task(&self, task_id: &str) -> ClientResult<bool> {
        let params = CancelTaskParams {
            task_id: task_id.to_string(),
        };
        self.ctx.command_request(&CANCEL_TASK, &params).await
    }

    async fn on_task_created(&self, handler: Handler<TaskInfo>) {
        self.ctx
            .subscribe(&TASK_CREATED, move |params| handler(params))
            .await;
    }

    async fn on_task_status_changed(&self, handler: Handler<TaskProgressInfo>) {
        self.ctx
            .subscribe(&TASK_STATUS_CHANGED, move |params| handler(params))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::contracts::tasks::TaskStatus;
    use crate::test_support::{failing_context, test_context};

    #[tokio::test]
    async fn list_tasks_degrades_to_none() {
        let (ctx, _transport) = failing_context();
        let service = TaskService::new(Arc::clone(&ctx));
        assert!(service.list_tasks(true).await.is_none());
        assert_eq!(ctx.failed_request_count(), 1);
    }

    #[tokio::test]
    async fn cancel_task_propagates_failure() {
        let (ctx, _transport) = failing_context();
        let service = TaskService::new(ctx);
        assert!(service.cancel_task("t-1").await.is_err());
    }

    #[tokio::test]
    async fn status_change_subscription_decodes_enum() {
        let (ctx, transport) = test_context();
        let service = TaskService::new(ctx);

        static RECEIVED: AtomicUsize = AtomicUsize::new(0);
        service
            .on_task_status_changed(Box::new(|progress| {
                assert_eq!(progress.status, TaskStatus::Succeeded);
                RECEIVED.fetch_add(1, Ordering::SeqCst);
            }))
            .await;

        transport
            .emit(
                TASK_STATUS_CHANGED.method(),
                serde_json::json!({"taskId": "t-1", "status": 2}),
            )
            .await;
        assert_eq!(RECEIVED.load(Ordering::SeqCst), 1);
    }
}

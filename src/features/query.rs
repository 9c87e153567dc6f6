//! Query execution and edit-data feature

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeatureDescriptor, Handler};
use crate::client::ClientContext;
use crate::contracts::query::{
    BatchNotificationParams, EditCommitParams, EditCommitResult, EditCreateRowParams,
    EditCreateRowResult, EditDeleteRowParams, EditDeleteRowResult, EditDisposeParams,
    EditDisposeResult, EditInitializeParams, EditInitializeResult, EditRevertCellParams,
    EditRevertCellResult, EditRevertRowParams, EditRevertRowResult, EditSessionReadyParams,
    EditSubsetParams, EditSubsetResult, EditUpdateCellParams, EditUpdateCellResult,
    ExecuteDocumentSelectionParams, ExecuteDocumentStatementParams, ExecuteResult,
    ExecuteStringParams, MessageNotificationParams, QueryCancelParams, QueryCancelResult,
    QueryCompleteNotificationParams, QueryDisposeParams, QueryDisposeResult, QuerySubsetParams,
    QuerySubsetResult, ResultSetNotificationParams, SaveResultsParams, SaveResultsResult,
    SelectionData, SimpleExecuteParams, SimpleExecuteResult, save_formats,
};
use crate::error::{ClientError, ClientResult};
use crate::messages::{MessageIdentifier, NotificationType, RequestType};
use crate::registry::{ProviderHandle, ProviderRegistry};

pub const EXECUTE_DOCUMENT_SELECTION: RequestType<ExecuteDocumentSelectionParams, ExecuteResult> =
    RequestType::new("query/executeDocumentSelection");
pub const EXECUTE_DOCUMENT_STATEMENT: RequestType<ExecuteDocumentStatementParams, ExecuteResult> =
    RequestType::new("query/executedocumentstatement");
pub const EXECUTE_STRING: RequestType<ExecuteStringParams, ExecuteResult> =
    RequestType::new("query/executeString");
pub const SIMPLE_EXECUTE: RequestType<SimpleExecuteParams, SimpleExecuteResult> =
    RequestType::new("query/simpleexecute");
pub const CANCEL: RequestType<QueryCancelParams, QueryCancelResult> =
    RequestType::new("query/cancel");
pub const DISPOSE: RequestType<QueryDisposeParams, QueryDisposeResult> =
    RequestType::new("query/dispose");
pub const SUBSET: RequestType<QuerySubsetParams, QuerySubsetResult> =
    RequestType::new("query/subset");
pub const SAVE_AS_CSV: RequestType<SaveResultsParams, SaveResultsResult> =
    RequestType::new("query/saveCsv");
pub const SAVE_AS_JSON: RequestType<SaveResultsParams, SaveResultsResult> =
    RequestType::new("query/saveJson");
pub const SAVE_AS_EXCEL: RequestType<SaveResultsParams, SaveResultsResult> =
    RequestType::new("query/saveExcel");

pub const BATCH_START: NotificationType<BatchNotificationParams> =
    NotificationType::new("query/batchStart");
pub const BATCH_COMPLETE: NotificationType<BatchNotificationParams> =
    NotificationType::new("query/batchComplete");
pub const RESULT_SET_AVAILABLE: NotificationType<ResultSetNotificationParams> =
    NotificationType::new("query/resultSetAvailable");
pub const RESULT_SET_UPDATED: NotificationType<ResultSetNotificationParams> =
    NotificationType::new("query/resultSetUpdated");
pub const RESULT_SET_COMPLETE: NotificationType<ResultSetNotificationParams> =
    NotificationType::new("query/resultSetComplete");
pub const MESSAGE: NotificationType<MessageNotificationParams> =
    NotificationType::new("query/message");
pub const QUERY_COMPLETE: NotificationType<QueryCompleteNotificationParams> =
    NotificationType::new("query/complete");

pub const EDIT_INITIALIZE: RequestType<EditInitializeParams, EditInitializeResult> =
    RequestType::new("edit/initialize");
pub const EDIT_SUBSET: RequestType<EditSubsetParams, EditSubsetResult> =
    RequestType::new("edit/subset");
pub const EDIT_COMMIT: RequestType<EditCommitParams, EditCommitResult> =
    RequestType::new("edit/commit");
pub const EDIT_CREATE_ROW: RequestType<EditCreateRowParams, EditCreateRowResult> =
    RequestType::new("edit/createRow");
pub const EDIT_DELETE_ROW: RequestType<EditDeleteRowParams, EditDeleteRowResult> =
    RequestType::new("edit/deleteRow");
pub const EDIT_UPDATE_CELL: RequestType<EditUpdateCellParams, EditUpdateCellResult> =
    RequestType::new("edit/updateCell");
pub const EDIT_REVERT_CELL: RequestType<EditRevertCellParams, EditRevertCellResult> =
    RequestType::new("edit/revertCell");
pub const EDIT_REVERT_ROW: RequestType<EditRevertRowParams, EditRevertRowResult> =
    RequestType::new("edit/revertRow");
pub const EDIT_DISPOSE: RequestType<EditDisposeParams, EditDisposeResult> =
    RequestType::new("edit/dispose");
pub const EDIT_SESSION_READY: NotificationType<EditSessionReadyParams> =
    NotificationType::new("edit/sessionReady");

pub const MESSAGES: &[MessageIdentifier] = &[
    EXECUTE_DOCUMENT_SELECTION.identifier(),
    EXECUTE_DOCUMENT_STATEMENT.identifier(),
    EXECUTE_STRING.identifier(),
    SIMPLE_EXECUTE.identifier(),
    CANCEL.identifier(),
    DISPOSE.identifier(),
    SUBSET.identifier(),
    SAVE_AS_CSV.identifier(),
    SAVE_AS_JSON.identifier(),
    SAVE_AS_EXCEL.identifier(),
    BATCH_START.identifier(),
    BATCH_COMPLETE.identifier(),
    RESULT_SET_AVAILABLE.identifier(),
    RESULT_SET_UPDATED.identifier(),
    RESULT_SET_COMPLETE.identifier(),
    MESSAGE.identifier(),
    QUERY_COMPLETE.identifier(),
    EDIT_INITIALIZE.identifier(),
    EDIT_SUBSET.identifier(),
    EDIT_COMMIT.identifier(),
    EDIT_CREATE_ROW.identifier(),
    EDIT_DELETE_ROW.identifier(),
    EDIT_UPDATE_CELL.identifier(),
    EDIT_REVERT_CELL.identifier(),
    EDIT_REVERT_ROW.identifier(),
    EDIT_DISPOSE.identifier(),
    EDIT_SESSION_READY.identifier(),
];

pub static DESCRIPTOR: FeatureDescriptor = FeatureDescriptor {
    name: "query",
    domain_key: "query",
    messages: MESSAGES,
    build: build_provider,
};

fn build_provider(
    ctx: &Arc<ClientContext>,
    registry: &dyn ProviderRegistry,
) -> Option<ProviderHandle> {
    let service = Arc::new(QueryService::new(Arc::clone(ctx)));
    Some(registry.register_query_provider(service))
}

/// Query execution capability.
///
/// Every request here is a command: failures propagate to the caller so
/// error surfacing and retry decisions stay with the host UI.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn run_query(&self, owner_uri: &str, selection: Option<SelectionData>)
    -> ClientResult<()>;

    async fn run_query_statement(
        &self,
        owner_uri: &str,
        line: u32,
        column: u32,
    ) -> ClientResult<()>;

    async fn run_query_string(&self, owner_uri: &str, query: &str) -> ClientResult<()>;

    async fn run_query_and_return(
        &self,
        owner_uri: &str,
        query: &str,
    ) -> ClientResult<SimpleExecuteResult>;

    async fn cancel_query(&self, owner_uri: &str) -> ClientResult<QueryCancelResult>;

    async fn dispose_query(&self, owner_uri: &str) -> ClientResult<()>;

    async fn get_query_rows(&self, params: QuerySubsetParams) -> ClientResult<QuerySubsetResult>;

    /// Materialize a result set to disk. Unknown formats are rejected
    /// before any request is sent.
    async fn save_results(&self, params: SaveResultsParams) -> ClientResult<SaveResultsResult>;

    async fn initialize_edit(&self, params: EditInitializeParams) -> ClientResult<()>;

    async fn get_edit_rows(&self, params: EditSubsetParams) -> ClientResult<EditSubsetResult>;

    async fn commit_edit(&self, owner_uri: &str) -> ClientResult<()>;

    async fn create_row(&self, owner_uri: &str) -> ClientResult<EditCreateRowResult>;

    async fn delete_row(&self, owner_uri: &str, row_id: u64) -> ClientResult<()>;

    async fn update_cell(
        &self,
        owner_uri: &str,
        row_id: u64,
        column_id: u32,
        new_value: &str,
    ) -> ClientResult<EditUpdateCellResult>;

    async fn revert_cell(
        &self,
        owner_uri: &str,
        row_id: u64,
        column_id: u32,
    ) -> ClientResult<EditRevertCellResult>;

    async fn revert_row(&self, owner_uri: &str, row_id: u64) -> ClientResult<()>;

    async fn dispose_edit(&self, owner_uri: &str) -> ClientResult<()>;

    async fn on_batch_start(&self, handler: Handler<BatchNotificationParams>);

    async fn on_batch_complete(&self, handler: Handler<BatchNotificationParams>);

    async fn on_result_set_available(&self, handler: Handler<ResultSetNotificationParams>);

    async fn on_result_set_updated(&self, handler: Handler<ResultSetNotificationParams>);

    async fn on_result_set_complete(&self, handler: Handler<ResultSetNotificationParams>);

    async fn on_message(&self, handler: Handler<MessageNotificationParams>);

    async fn on_query_complete(&self, handler: Handler<QueryCompleteNotificationParams>);

    async fn on_edit_session_ready(&self, handler: Handler<EditSessionReadyParams>);
}

pub struct QueryService {
    ctx: Arc<ClientContext>,
}

impl QueryService {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl QueryProvider for QueryService {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    async fn run_query(
        &self,
        owner_uri: &str,
        selection: Option<SelectionData>,
    ) -> ClientResult<()> {
        let params = ExecuteDocumentSelectionParams {
            owner_uri: owner_uri.to_string(),
            query_selection: selection,
        };
        self.ctx
            .command_request(&EXECUTE_DOCUMENT_SELECTION, &params)
            .await
            .map(|_: ExecuteResult| ())
    }

    async fn run_query_statement(
        &self,
        owner_uri: &str,
        line: u32,
        column: u32,
    ) -> ClientResult<()> {
        let params = ExecuteDocumentStatementParams {
            owner_uri: owner_uri.to_string(),
            line,
            column,
        };
        self.ctx
            .command_request(&EXECUTE_DOCUMENT_STATEMENT, &params)
            .await
            .map(|_: ExecuteResult| ())
    }

    async fn run_query_string(&self, owner_uri: &str, query: &str) -> ClientResult<()> {
        let params = ExecuteStringParams {
            owner_uri: owner_uri.to_string(),
            query: query.to_string(),
        };
        self.ctx
            .command_request(&EXECUTE_STRING, &params)
            .await
            .map(|_: ExecuteResult| ())
    }

    async fn run_query_and_return(
        &self,
        owner_uri: &str,
        query: &str,
    ) -> ClientResult<SimpleExecuteResult> {
        let params = SimpleExecuteParams {
            owner_uri: owner_uri.to_string(),
            query_string: query.to_string(),
        };
        self.ctx.command_request(&SIMPLE_EXECUTE, &params).await
    }

    async fn cancel_query(&self, owner_uri: &str) -> ClientResult<QueryCancelResult> {
        let params = QueryCancelParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.command_request(&CANCEL, &params).await
    }

    async fn dispose_query(&self, owner_uri: &str) -> ClientResult<()> {
        let params = QueryDisposeParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&DISPOSE, &params)
            .await
            .map(|_: QueryDisposeResult| ())
    }

    async fn get_query_rows(&self, params: QuerySubsetParams) -> ClientResult<QuerySubsetResult> {
        self.ctx.command_request(&SUBSET, &params).await
    }

    async fn save_results(&self, params: SaveResultsParams) -> ClientResult<SaveResultsResult> {
        let request = match params.result_format.as_str() {
            save_formats::CSV => &SAVE_AS_CSV,
            save_formats::JSON => &SAVE_AS_JSON,
            save_formats::EXCEL => &SAVE_AS_EXCEL,
            other => return Err(ClientError::UnsupportedFormat(other.to_string())),
        };
        self.ctx.command_request(request, &params).await
    }

    async fn initialize_edit(&self, params: EditInitializeParams) -> ClientResult<()> {
        self.ctx
            .command_request(&EDIT_INITIALIZE, &params)
            .await
            .map(|_: EditInitializeResult| ())
    }

    async fn get_edit_rows(&self, params: EditSubsetParams) -> ClientResult<EditSubsetResult> {
        self.ctx.command_request(&EDIT_SUBSET, &params).await
    }

    async fn commit_edit(&self, owner_uri: &str) -> ClientResult<()> {
        let params = EditCommitParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&EDIT_COMMIT, &params)
            .await
            .map(|_: EditCommitResult| ())
    }

    async fn create_row(&self, owner_uri: &str) -> ClientResult<EditCreateRowResult> {
        let params = EditCreateRowParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx.command_request(&EDIT_CREATE_ROW, &params).await
    }

    async fn delete_row(&self, owner_uri: &str, row_id: u64) -> ClientResult<()> {
        let params = EditDeleteRowParams {
            owner_uri: owner_uri.to_string(),
            row_id,
        };
        self.ctx
            .command_request(&EDIT_DELETE_ROW, &params)
            .await
            .map(|_: EditDeleteRowResult| ())
    }

    async fn update_cell(
        &self,
        owner_uri: &str,
        row_id: u64,
        column_id: u32,
        new_value: &str,
    ) -> ClientResult<EditUpdateCellResult> {
        let params = EditUpdateCellParams {
            owner_uri: owner_uri.to_string(),
            row_id,
            column_id,
            new_value: new_value.to_string(),
        };
        self.ctx.command_request(&EDIT_UPDATE_CELL, &params).await
    }

    async fn revert_cell(
        &self,
        owner_uri: &str,
        row_id: u64,
        column_id: u32,
    ) -> ClientResult<EditRevertCellResult> {
        let params = EditRevertCellParams {
            owner_uri: owner_uri.to_string(),
            row_id,
            column_id,
        };
        self.ctx.command_request(&EDIT_REVERT_CELL, &params).await
    }

    async fn revert_row(&self, owner_uri: &str, row_id: u64) -> ClientResult<()> {
        let params = EditRevertRowParams {
            owner_uri: owner_uri.to_string(),
            row_id,
        };
        self.ctx
            .command_request(&EDIT_REVERT_ROW, &params)
            .await
            .map(|_: EditRevertRowResult| ())
    }

    async fn dispose_edit(&self, owner_uri: &str) -> ClientResult<()> {
        let params = EditDisposeParams {
            owner_uri: owner_uri.to_string(),
        };
        self.ctx
            .command_request(&EDIT_DISPOSE, &params)
            .await
            .map(|_: EditDisposeResult| ())
    }

    async fn on_batch_start(&self, handler: Handler<BatchNotificationParams>) {
        self.ctx
            .subscribe(&BATCH_START, move |params| handler(params))
            .await;
    }

    async fn on_batch_complete(&self, handler: Handler<BatchNotificationParams>) {
        self.ctx
            .subscribe(&BATCH_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_result_set_available(&self, handler: Handler<ResultSetNotificationParams>) {
        self.ctx
            .subscribe(&RESULT_SET_AVAILABLE, move |params| handler(params))
            .await;
    }

    async fn on_result_set_updated(&self, handler: Handler<ResultSetNotificationParams>) {
        self.ctx
            .subscribe(&RESULT_SET_UPDATED, move |params| handler(params))
            .await;
    }

    async fn on_result_set_complete(&self, handler: Handler<ResultSetNotificationParams>) {
        self.ctx
            .subscribe(&RESULT_SET_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_message(&self, handler: Handler<MessageNotificationParams>) {
        self.ctx
            .subscribe(&MESSAGE, move |params| handler(params))
            .await;
    }

    async fn on_query_complete(&self, handler: Handler<QueryCompleteNotificationParams>) {
        self.ctx
            .subscribe(&QUERY_COMPLETE, move |params| handler(params))
            .await;
    }

    async fn on_edit_session_ready(&self, handler: Handler<EditSessionReadyParams>) {
        self.ctx
            .subscribe(&EDIT_SESSION_READY, move |params| handler(params))
            .await;
    }
}

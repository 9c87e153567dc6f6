//! Query execution and edit-data payloads

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Zero-based selection within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionData {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteDocumentSelectionParams {
    pub owner_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_selection: Option<SelectionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteDocumentStatementParams {
    pub owner_uri: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStringParams {
    pub owner_uri: String,
    pub query: String,
}

/// Execution requests acknowledge with an empty body; progress arrives via
/// notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleExecuteParams {
    pub owner_uri: String,
    pub query_string: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleExecuteResult {
    pub rows_affected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_info: Option<Vec<ColumnInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<ResultSetSubset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCancelParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCancelResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDisposeParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDisposeResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySubsetParams {
    pub owner_uri: String,
    pub batch_index: u32,
    pub result_set_index: u32,
    pub rows_start_index: u64,
    pub rows_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySubsetResult {
    pub result_subset: ResultSetSubset,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetSubset {
    pub row_count: u64,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    pub display_value: String,
    #[serde(default)]
    pub is_null: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetSummary {
    pub id: u32,
    pub batch_id: u32,
    pub row_count: u64,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_info: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_elapsed: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_set_summaries: Vec<ResultSetSummary>,
    #[serde(default)]
    pub has_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchNotificationParams {
    pub owner_uri: String,
    pub batch_summary: BatchSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetNotificationParams {
    pub owner_uri: String,
    pub result_set_summary: ResultSetSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<u32>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotificationParams {
    pub owner_uri: String,
    pub message: ResultMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCompleteNotificationParams {
    pub owner_uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batch_summaries: Vec<BatchSummary>,
}

// ---------------------------------------------------------------------------
// Save-as requests
// ---------------------------------------------------------------------------

/// Formats the backend can materialize result sets into.
pub mod save_formats {
    pub const CSV: &str = "csv";
    pub const JSON: &str = "json";
    pub const EXCEL: &str = "excel";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultsParams {
    pub owner_uri: String,
    pub file_path: String,
    pub batch_index: u32,
    pub result_set_index: u32,
    /// One of [`save_formats`]; checked before any request is sent.
    pub result_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_start_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_end_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_headers: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultsResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<String>,
}

// ---------------------------------------------------------------------------
// Edit-data session payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInitializeParams {
    pub owner_uri: String,
    pub object_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_results: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditInitializeResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionReadyParams {
    pub owner_uri: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum EditRowState {
    Clean = 0,
    DirtyInsert = 1,
    DirtyDelete = 2,
    DirtyUpdate = 3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCell {
    pub display_value: String,
    #[serde(default)]
    pub is_null: bool,
    #[serde(default)]
    pub is_dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRow {
    pub id: u64,
    pub cells: Vec<EditCell>,
    pub state: EditRowState,
    #[serde(default)]
    pub is_dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSubsetParams {
    pub owner_uri: String,
    pub row_start_index: u64,
    pub row_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSubsetResult {
    pub row_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subset: Vec<EditRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCommitParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditCommitResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCreateRowParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCreateRowResult {
    pub new_row_id: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDeleteRowParams {
    pub owner_uri: String,
    pub row_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditDeleteRowResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUpdateCellParams {
    pub owner_uri: String,
    pub row_id: u64,
    pub column_id: u32,
    pub new_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUpdateCellResult {
    pub cell: EditCell,
    #[serde(default)]
    pub is_row_dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRevertCellParams {
    pub owner_uri: String,
    pub row_id: u64,
    pub column_id: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRevertCellResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<EditCell>,
    #[serde(default)]
    pub is_row_dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRevertRowParams {
    pub owner_uri: String,
    pub row_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditRevertRowResult {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDisposeParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditDisposeResult {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_serializes_camel_case() {
        let selection = SelectionData {
            start_line: 0,
            start_column: 4,
            end_line: 2,
            end_column: 0,
        };
        let json = serde_json::to_value(selection).unwrap();
        assert_eq!(json["startLine"], 0);
        assert_eq!(json["endColumn"], 0);
    }

    #[test]
    fn edit_row_state_is_integer_coded() {
        let row: EditRow = serde_json::from_value(serde_json::json!({
            "id": 3,
            "cells": [],
            "state": 2
        }))
        .unwrap();
        assert_eq!(row.state, EditRowState::DirtyDelete);
        assert!(!row.is_dirty);
    }

    #[test]
    fn batch_summary_defaults() {
        let summary: BatchSummary =
            serde_json::from_value(serde_json::json!({"id": 0})).unwrap();
        assert!(!summary.has_error);
        assert!(summary.result_set_summaries.is_empty());
    }
}

//! Server-side file browser payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserOpenParams {
    pub owner_uri: String,
    pub expand_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_filters: Vec<String>,
    #[serde(default)]
    pub change_filter: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTreeNode {
    pub name: String,
    pub full_path: String,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTree {
    pub root_node: FileTreeNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_node: Option<FileTreeNode>,
}

/// Payload of `filebrowser/opencomplete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserOpenedParams {
    pub owner_uri: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_tree: Option<FileTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserExpandParams {
    pub owner_uri: String,
    pub expand_path: String,
}

/// Payload of `filebrowser/expandcomplete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserExpandedParams {
    pub owner_uri: String,
    pub expand_path: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserValidateParams {
    pub owner_uri: String,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_files: Vec<String>,
}

/// Payload of `filebrowser/validatecomplete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserValidatedParams {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserCloseParams {
    pub owner_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBrowserCloseResponse {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

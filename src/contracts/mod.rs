//! Wire payload contracts
//!
//! Typed structures crossing the converter boundary, one module per
//! capability domain. Method names and payload shapes are an external
//! contract with the backend service and must remain stable.

pub mod admin;
pub mod backup;
pub mod capabilities;
pub mod connection;
pub mod file_browser;
pub mod metadata;
pub mod object_explorer;
pub mod profiler;
pub mod query;
pub mod restore;
pub mod scripting;
pub mod tasks;

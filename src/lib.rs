//! dataproto - Typed Data Management Protocol Client
//!
//! Augments a generic JSON-RPC language-server transport with data-platform
//! capabilities: connection management, query execution, metadata browsing,
//! administration, backup/restore, object exploration, scripting, task
//! tracking, file browsing, and profiling.
//!
//! Each capability domain is a feature: a fixed set of protocol message
//! types bound to a provider implementation, registered with the host's
//! provider registry once the server's capabilities are known.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod contracts;
pub mod converters;
pub mod error;
pub mod features;
pub mod messages;
pub mod registry;
pub mod rpc;

#[cfg(test)]
pub(crate) mod test_support;

pub use capabilities::{ClientCapabilities, ServerCapabilities};
pub use client::{Client, ClientContext, ClientOptions};
pub use converters::{DefaultConverters, InboundConverter, OutboundConverter};
pub use error::{ClientError, ClientResult, RpcError};
pub use features::{Feature, FeatureDescriptor, Registration, default_features};
pub use messages::{MessageIdentifier, MessageKind, NotificationType, RequestType};
pub use registry::{ProviderHandle, ProviderRegistry};
pub use rpc::{RpcTransport, ServerConnection};

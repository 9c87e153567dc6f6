//! Backend server connection
//!
//! Owns the spawned backend process and multiplexes JSON-RPC traffic over
//! its stdio: atomic request ids, a pending-request map resolved by the
//! background read loop, and a per-method notification handler table.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::time::timeout;

use super::protocol::{
    Message, Notification, Request, RequestId, Response, ResponseError, error_codes,
};
use super::transport::{MessageReader, MessageWriter};
use super::{RawNotificationHandler, RpcTransport};
use crate::error::RpcError;

type PendingRequest = oneshot::Sender<Response>;

pub struct ServerConnection {
    process: Mutex<Option<Child>>,
    writer: Mutex<Option<MessageWriter<ChildStdin>>>,
    next_id: AtomicU64,
    pending: RwLock<HashMap<RequestId, PendingRequest>>,
    handlers: RwLock<HashMap<String, Vec<RawNotificationHandler>>>,
    shutting_down: AtomicBool,
    terminated: AtomicBool,
}

impl ServerConnection {
    /// Spawn the backend process and start the read loop.
    pub async fn spawn(command: &str, args: &[&str]) -> Result<Arc<Self>, RpcError> {
        tracing::info!("Starting backend service: {} {:?}", command, args);

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RpcError::ProcessStart(format!("{command}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RpcError::ProcessStart("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RpcError::ProcessStart("Failed to capture stdout".to_string()))?;

        let connection = Arc::new(Self {
            process: Mutex::new(Some(child)),
            writer: Mutex::new(Some(MessageWriter::new(stdin))),
            next_id: AtomicU64::new(1),
            pending: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            shutting_down: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        });

        let reader_conn = Arc::clone(&connection);
        tokio::spawn(async move {
            reader_conn.read_loop(MessageReader::new(stdout)).await;
        });

        Ok(connection)
    }

    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        if let Some(ref mut child) = *process {
            matches!(child.try_wait(), Ok(None))
        } else {
            false
        }
    }

    /// Background task that reads and dispatches incoming messages.
    async fn read_loop(self: Arc<Self>, mut reader: MessageReader<ChildStdout>) {
        loop {
            if self.shutting_down.load(Ordering::Acquire) {
                break;
            }

            match reader.read_message().await {
                Ok(message) => {
                    self.handle_message(message).await;
                }
                Err(e) => {
                    if !self.shutting_down.load(Ordering::Acquire) {
                        tracing::error!("Backend read error: {}", e);
                        self.fail_pending_requests_terminated().await;
                    }
                    break;
                }
            }
        }
    }

    async fn handle_message(&self, message: Message) {
        match message {
            Message::Response(response) => {
                if let Some(id) = response.id.clone() {
                    let sender = {
                        let mut pending = self.pending.write().await;
                        // Direct match first, then string->number coercion for
                        // backends that echo numeric ids as strings
                        pending.remove(&id).or_else(|| {
                            if let RequestId::String(s) = &id {
                                s.parse::<u64>()
                                    .ok()
                                    .and_then(|n| pending.remove(&RequestId::Number(n)))
                            } else {
                                None
                            }
                        })
                    };
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => {
                            tracing::debug!("Response for unknown request id {:?}", id);
                        }
                    }
                }
            }
            Message::Notification(notification) => {
                let params = notification.params.unwrap_or(Value::Null);
                let handlers = self.handlers.read().await;
                match handlers.get(notification.method.as_str()) {
                    Some(subscribed) => {
                        for handler in subscribed {
                            handler(params.clone());
                        }
                    }
                    None => {
                        tracing::trace!("Unhandled notification: {}", notification.method);
                    }
                }
            }
            Message::Request(request) => {
                self.handle_server_request(request).await;
            }
        }
    }

    /// The data protocol has no server-to-client requests; answer anything
    /// that arrives so the backend does not wait forever.
    async fn handle_server_request(&self, request: Request) {
        tracing::debug!("Rejecting server request: {}", request.method);
        let response = Response::failure(
            Some(request.id),
            ResponseError {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Method not found: {}", request.method),
                data: None,
            },
        );
        if let Ok(mut writer_guard) = self.writer.try_lock()
            && let Some(writer) = writer_guard.as_mut()
        {
            let _ = writer.write(&response).await;
        }
    }

    /// Fail all in-flight requests with a synthetic terminated response.
    async fn fail_pending_requests_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
        let mut pending = self.pending.write().await;
        let count = pending.len();
        if count > 0 {
            tracing::debug!("Failing {} pending requests: backend terminated", count);
            for (id, sender) in pending.drain() {
                let response = Response::failure(
                    Some(id),
                    ResponseError {
                        code: error_codes::SERVER_TERMINATED,
                        message: "Backend service terminated unexpectedly".to_string(),
                        data: None,
                    },
                );
                let _ = sender.send(response);
            }
        }
    }

    /// Graceful termination: shutdown request, stdin EOF, then force kill.
    pub async fn shutdown(&self) -> Result<(), RpcError> {
        self.shutting_down.store(true, Ordering::Release);
        let config = crate::config::get();

        let shutdown_result = timeout(config.shutdown_grace, async {
            if self.send_request("shutdown", None).await.is_ok() {
                let _ = self.send_notification("exit", None).await;
            }
        })
        .await;

        if shutdown_result.is_err() {
            tracing::debug!("Backend shutdown request timed out");
        }

        // Close stdin to signal EOF
        self.writer.lock().await.take();

        if let Some(mut child) = self.process.lock().await.take() {
            match timeout(config.kill_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!("Backend exited: {:?}", status);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Backend wait error: {}", e);
                }
                Err(_) => {
                    tracing::warn!("Backend termination timed out, forcing kill");
                    let _ = child.kill().await;
                }
            }
        }

        let mut pending = self.pending.write().await;
        for (id, sender) in pending.drain() {
            let response = Response::failure(
                Some(id),
                ResponseError {
                    code: error_codes::REQUEST_CANCELLED,
                    message: "Connection shut down".to_string(),
                    data: None,
                },
            );
            let _ = sender.send(response);
        }

        tracing::info!("Backend service stopped");
        Ok(())
    }
}

#[async_trait]
impl RpcTransport for ServerConnection {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(RpcError::Terminated);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.write().await;
            pending.insert(RequestId::Number(id), tx);
        }

        let request = Request::new(id, method, params);
        tracing::trace!("rpc request {}: {}", id, method);

        let write_result = {
            let mut writer_guard = self.writer.lock().await;
            match writer_guard.as_mut() {
                Some(writer) => writer.write(&request).await.map_err(RpcError::from),
                None => Err(RpcError::NotConnected),
            }
        };
        if let Err(error) = write_result {
            self.pending.write().await.remove(&RequestId::Number(id));
            return Err(error);
        }

        // No timeout here: the caller suspends until the backend answers or
        // the connection dies, which fans out a synthetic error response.
        match rx.await {
            Ok(response) => match response.into_result() {
                Ok(result) => Ok(result),
                Err(err) if err.code == error_codes::SERVER_TERMINATED => Err(RpcError::Terminated),
                Err(err) => Err(err.into()),
            },
            Err(_) => Err(RpcError::Cancelled),
        }
    }

    async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), RpcError> {
        let notification = Notification::new(method, params);

        let mut writer_guard = self.writer.lock().await;
        let writer = writer_guard.as_mut().ok_or(RpcError::NotConnected)?;
        writer.write(&notification).await?;

        Ok(())
    }

    async fn on_notification(&self, method: &str, handler: RawNotificationHandler) {
        self.handlers
            .write()
            .await
            .entry(method.to_string())
            .or_default()
            .push(handler);
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        if let Ok(mut process_guard) = self.process.try_lock() {
            if let Some(ref mut child) = *process_guard {
                let _ = child.start_kill();
                tracing::debug!("ServerConnection dropped, backend killed");
            }
        } else {
            tracing::warn!("ServerConnection dropped while process lock held");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_generation_is_monotonic() {
        let counter = AtomicU64::new(1);
        assert_eq!(counter.fetch_add(1, Ordering::Relaxed), 1);
        assert_eq!(counter.fetch_add(1, Ordering::Relaxed), 2);
        assert_eq!(counter.fetch_add(1, Ordering::Relaxed), 3);
    }

    #[test]
    fn terminated_response_maps_to_rpc_error() {
        let response = Response::failure(
            Some(RequestId::Number(4)),
            ResponseError {
                code: error_codes::SERVER_TERMINATED,
                message: "gone".to_string(),
                data: None,
            },
        );
        let err: RpcError = response.into_result().unwrap_err().into();
        assert!(err.is_terminated());
    }
}

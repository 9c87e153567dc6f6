//! Wire framing layer
//!
//! Backend messages are framed with Content-Length headers, the same
//! convention language servers use:
//!
//! ```text
//! Content-Length: 123\r\n
//! \r\n
//! {"jsonrpc":"2.0",...}
//! ```

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::Message;

/// Reads framed messages from the backend's output stream.
pub struct MessageReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    /// Read the next framed message.
    pub async fn read_message(&mut self) -> io::Result<Message> {
        let content_length = self.read_headers().await?;

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        let json =
            String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if crate::config::get().trace_wire {
            tracing::trace!("rpc <- {}", json);
        }

        Message::parse(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Read headers and return Content-Length
    async fn read_headers(&mut self) -> io::Result<usize> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Backend closed connection",
                ));
            }

            let line = line.trim();

            // Empty line marks end of headers
            if line.is_empty() {
                break;
            }

            if let Some(value) = line.strip_prefix("Content-Length:") {
                content_length = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
                );
            }
            // Ignore other headers (Content-Type, etc.)
        }

        content_length
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing Content-Length"))
    }
}

/// Writes framed messages to the backend's input stream.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(stream: W) -> Self {
        Self { writer: stream }
    }

    pub async fn write<T: serde::Serialize>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_raw(&json).await
    }

    async fn write_raw(&mut self, json: &str) -> io::Result<()> {
        if crate::config::get().trace_wire {
            tracing::trace!("rpc -> {}", json);
        }

        let framed = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
        self.writer.write_all(framed.as_bytes()).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::protocol::{Notification, Request};

    #[tokio::test]
    async fn round_trip_through_framing() {
        let mut buffer = Vec::new();
        {
            let mut writer = MessageWriter::new(&mut buffer);
            let req = Request::new(7, "metadata/list", Some(serde_json::json!({"ownerUri": "u"})));
            writer.write(&req).await.unwrap();
        }

        let mut reader = MessageReader::new(buffer.as_slice());
        match reader.read_message().await.unwrap() {
            Message::Request(req) => {
                assert_eq!(req.method, "metadata/list");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_consecutive_messages() {
        let mut buffer = Vec::new();
        {
            let mut writer = MessageWriter::new(&mut buffer);
            writer
                .write(&Notification::new("query/batchStart", None))
                .await
                .unwrap();
            writer
                .write(&Notification::new("query/complete", None))
                .await
                .unwrap();
        }

        let mut reader = MessageReader::new(buffer.as_slice());
        for expected in ["query/batchStart", "query/complete"] {
            match reader.read_message().await.unwrap() {
                Message::Notification(n) => assert_eq!(n.method, expected),
                other => panic!("unexpected message: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn missing_content_length_is_an_error() {
        let raw = b"Content-Type: application/json\r\n\r\n{}";
        let mut reader = MessageReader::new(raw.as_slice());
        let err = reader.read_message().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

//! The one persistent connection to the remote store.
//!
//! Requests are serialized through a mutex held for the whole
//! write-then-read exchange: the protocol carries no request ids, so a
//! second request must never be written before the first response is in.
//! After any failure the connection is dropped rather than reused, since a
//! late response would otherwise be taken as the answer to the next
//! request. There is no automatic reconnect.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use pap_shared::constants::MAX_RESPONSE_SIZE;
use pap_shared::protocol::Request;

use crate::error::NetError;

/// Upper bound for a newline-framed response.
pub const MAX_LINE_LEN: usize = 1 << 20;

/// How requests and responses are delimited on the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Legacy: the request is written as-is and whatever a single read
    /// returns (up to 64 KiB) is the whole response.
    #[default]
    SingleRead,
    /// Request and response are each terminated by `\n`.
    Line,
}

impl std::str::FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_read" => Ok(Self::SingleRead),
            "line" => Ok(Self::Line),
            other => Err(format!("unknown framing '{other}'")),
        }
    }
}

/// Connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub framing: Framing,
    /// Per-request limit; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            framing: Framing::SingleRead,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Something that can carry one request and hand back the raw response.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> impl Future<Output = Result<String, NetError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(&self, request: &Request) -> impl Future<Output = Result<String, NetError>> + Send {
        (**self).send(request)
    }
}

/// TCP client holding the single connection.
pub struct ProtocolClient {
    conn: Mutex<Option<BufReader<TcpStream>>>,
    options: ConnectionOptions,
    peer: String,
}

impl ProtocolClient {
    /// Open the connection to `addr` (`host:port`).
    pub async fn connect(addr: &str, options: ConnectionOptions) -> Result<Self, NetError> {
        let connecting = TcpStream::connect(addr);
        let stream = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| NetError::Timeout(limit))??,
            None => connecting.await?,
        };
        stream.set_nodelay(true)?;

        info!(peer = %addr, framing = ?options.framing, "Connected to server");

        Ok(Self {
            conn: Mutex::new(Some(BufReader::with_capacity(MAX_RESPONSE_SIZE, stream))),
            options,
            peer: addr.to_string(),
        })
    }

    /// A client whose connection could not be established. Every request
    /// fails with [`NetError::NotConnected`].
    pub fn offline(addr: &str, options: ConnectionOptions) -> Self {
        Self {
            conn: Mutex::new(None),
            options,
            peer: addr.to_string(),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Write `command` and wait for its response.
    pub async fn send_line(&self, command: &str) -> Result<String, NetError> {
        let mut guard = self.conn.lock().await;
        let Some(stream) = guard.as_mut() else {
            error!(peer = %self.peer, "Cannot send request: not connected");
            return Err(NetError::NotConnected);
        };

        let framing = self.options.framing;
        let result = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange(stream, command, framing))
                .await
                .unwrap_or(Err(NetError::Timeout(limit))),
            None => exchange(stream, command, framing).await,
        };

        if let Err(e) = &result {
            error!(peer = %self.peer, error = %e, "Error communicating with server");
            *guard = None;
        }
        result
    }
}

impl Transport for ProtocolClient {
    async fn send(&self, request: &Request) -> Result<String, NetError> {
        debug!(verb = %request.verb(), "Sending request");
        let response = self.send_line(&request.encode()).await?;
        debug!(verb = %request.verb(), bytes = response.len(), "Received response");
        Ok(response)
    }
}

async fn exchange(
    stream: &mut BufReader<TcpStream>,
    command: &str,
    framing: Framing,
) -> Result<String, NetError> {
    let mut frame = command.as_bytes().to_vec();
    if framing == Framing::Line {
        frame.push(b'\n');
    }
    stream.get_mut().write_all(&frame).await?;
    stream.get_mut().flush().await?;

    let bytes = match framing {
        Framing::SingleRead => {
            let chunk = stream.fill_buf().await?;
            if chunk.is_empty() {
                return Err(NetError::Closed);
            }
            let bytes = chunk.to_vec();
            stream.consume(bytes.len());
            bytes
        }
        Framing::Line => {
            let mut line = Vec::new();
            let read = (&mut *stream)
                .take(MAX_LINE_LEN as u64)
                .read_until(b'\n', &mut line)
                .await?;
            if read == 0 {
                return Err(NetError::Closed);
            }
            match line.last() {
                Some(b'\n') => {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                _ if read >= MAX_LINE_LEN => return Err(NetError::TooLarge(MAX_LINE_LEN)),
                _ => return Err(NetError::Closed),
            }
            line
        }
    };

    String::from_utf8(bytes).map_err(|_| NetError::InvalidUtf8)
}

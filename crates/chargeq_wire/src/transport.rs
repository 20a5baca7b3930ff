//! Line-delimited JSON over TCP.
//!
//! Every exchange is one request line answered by one reply line. Servers
//! handle each connection on its own task; callers open a fresh connection
//! per request and bound the whole exchange with a timeout.

use crate::codec::{ProtocolError, decode, encode};
use crate::message::{Catalog, ErrorReply};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not reach {addr}: {source}")]
    Io {
        addr: String,
        source: std::io::Error,
    },
    #[error("{addr} did not answer within {timeout:?}")]
    Timeout { addr: String, timeout: Duration },
    #[error("{addr} closed the connection without answering")]
    Closed { addr: String },
    #[error("bad exchange with {addr}: {source}")]
    Protocol {
        addr: String,
        source: ProtocolError,
    },
}

/// A remote service reached with one-shot requests.
#[derive(Debug, Clone)]
pub struct Endpoint {
    addr: String,
    timeout: Duration,
}

impl Endpoint {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Endpoint {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends `message` and waits for the reply. Connecting, writing and
    /// reading all count against the endpoint's timeout.
    pub async fn call<Req, Rep>(&self, message: &Req) -> Result<Rep, TransportError>
    where
        Req: Serialize,
        Rep: Catalog,
    {
        tokio::time::timeout(self.timeout, self.exchange(message))
            .await
            .map_err(|_| TransportError::Timeout {
                addr: self.addr.clone(),
                timeout: self.timeout,
            })?
    }

    async fn exchange<Req, Rep>(&self, message: &Req) -> Result<Rep, TransportError>
    where
        Req: Serialize,
        Rep: Catalog,
    {
        let io_error = |source| TransportError::Io {
            addr: self.addr.clone(),
            source,
        };
        let protocol_error = |source| TransportError::Protocol {
            addr: self.addr.clone(),
            source,
        };

        let line = encode(message).map_err(protocol_error)?;
        let stream = TcpStream::connect(&self.addr).await.map_err(io_error)?;
        let (reader, mut writer) = stream.into_split();
        writer.write_all(line.as_bytes()).await.map_err(io_error)?;
        debug!("Sent to {}: {}", self.addr, line.trim_end());

        let mut reply = String::new();
        let read = BufReader::new(reader)
            .read_line(&mut reply)
            .await
            .map_err(io_error)?;
        if read == 0 {
            return Err(TransportError::Closed {
                addr: self.addr.clone(),
            });
        }
        debug!("Received from {}: {}", self.addr, reply.trim_end());
        decode(&reply).map_err(protocol_error)
    }
}

/// Accepts connections forever, answering each request line with `handler`.
///
/// Unknown actions and bad payloads are answered with an `ERRO` reply; a line
/// that is not a message at all drops the connection.
pub async fn serve<Req, Rep, H, Fut>(listener: TcpListener, handler: H) -> std::io::Result<()>
where
    Req: Catalog + Send + 'static,
    Rep: ErrorReply + Send + 'static,
    H: Fn(Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Rep> + Send,
{
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, peer, handler).await {
                        warn!("Connection with {} failed: {}", peer, e);
                    }
                });
            }
            Err(e) => error!("Incoming TCP connection errored: {}", e),
        }
    }
}

async fn handle_connection<Req, Rep, H, Fut>(
    stream: TcpStream,
    peer: SocketAddr,
    handler: H,
) -> std::io::Result<()>
where
    Req: Catalog,
    Rep: ErrorReply,
    H: Fn(Req) -> Fut,
    Fut: Future<Output = Rep>,
{
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received from {}: {}", peer, line);

        let reply = match decode::<Req>(&line) {
            Ok(request) => handler(request).await,
            Err(ProtocolError::Malformed(e)) => {
                warn!("Dropping {}: malformed message {:?}: {}", peer, line, e);
                return Ok(());
            }
            Err(e) => {
                warn!("Rejecting message from {}: {}", peer, e);
                Rep::error(e.to_string())
            }
        };

        let encoded = encode(&reply).map_err(std::io::Error::other)?;
        writer.write_all(encoded.as_bytes()).await?;
        debug!("Replied to {} with {}", peer, reply.action());
    }
    Ok(())
}

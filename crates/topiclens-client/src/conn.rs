//! Framed request/response connection to a broker
//!
//! Messages are postcard-encoded and framed with a u32 big-endian length
//! prefix. Each connection is short-lived: it is opened for one operation,
//! used for a handful of round trips at most, and released when dropped.

use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use topiclens_protocol::{Request, Response, MAX_MESSAGE_SIZE};
use tracing::debug;

/// A single framed connection to one broker
pub(crate) struct Connection {
    stream: TcpStream,
}

impl Connection {
    /// Connect to the first reachable bootstrap server.
    ///
    /// Servers are tried in configuration order, each under the configured
    /// connect timeout; only when every server fails does the call report
    /// `ClusterUnavailable`.
    pub(crate) async fn connect(config: &BrokerConfig) -> Result<Self> {
        if config.bootstrap_servers.is_empty() {
            return Err(Error::ClusterUnavailable(
                "no bootstrap servers configured".to_string(),
            ));
        }

        let mut last_error = String::new();
        for addr in &config.bootstrap_servers {
            match timeout(config.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    debug!(addr = %addr, "connected to broker");
                    return Ok(Self { stream });
                }
                Ok(Err(e)) => {
                    last_error = format!("{addr}: {e}");
                }
                Err(_) => {
                    last_error = format!("{addr}: connect timed out");
                }
            }
        }

        Err(Error::ClusterUnavailable(last_error))
    }

    /// Send one request and wait for its response.
    pub(crate) async fn call(&mut self, request: Request) -> Result<Response> {
        let request_bytes = request.to_bytes()?;

        let len = request_bytes.len() as u32;
        self.write(&len.to_be_bytes()).await?;
        self.write(&request_bytes).await?;
        self.stream
            .flush()
            .await
            .map_err(|e| Error::ClusterUnavailable(e.to_string()))?;

        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf).await?;
        let msg_len = u32::from_be_bytes(len_buf) as usize;

        // Guard before allocating; a hostile or corrupt peer must not be
        // able to drive a huge allocation.
        if msg_len > MAX_MESSAGE_SIZE {
            return Err(Error::Protocol(
                topiclens_protocol::ProtocolError::MessageTooLarge(msg_len, MAX_MESSAGE_SIZE),
            ));
        }

        let mut response_buf = vec![0u8; msg_len];
        self.read_exact(&mut response_buf).await?;

        Ok(Response::from_bytes(&response_buf)?)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(|e| Error::ClusterUnavailable(e.to_string()))
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream
            .read_exact(buf)
            .await
            .map(|_| ())
            .map_err(|e| Error::ClusterUnavailable(e.to_string()))
    }
}

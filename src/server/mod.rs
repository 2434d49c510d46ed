//! The TCP front end.
//!
//! Requests and responses are null-byte delimited frames: each request
//! carries one SQL statement, each response one JSON object. The engine
//! lives behind a mutex so statements execute serially in submission
//! order, whatever the connection they arrive on.

mod response;

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Error as SqlError;
use crate::execution::Engine;

/// The default listen port.
pub const DEFAULT_PORT: u16 = 3003;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The SQL server: a TCP listener in front of a shared engine.
pub struct Server {
    listener: TcpListener,
    engine: Arc<Mutex<Engine>>,
}

impl Server {
    /// Binds the listener. Serving starts with [`Server::serve`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            engine: Arc::new(Mutex::new(Engine::new())),
        })
    }

    /// The bound address. Useful when binding port 0 in tests.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve(self) -> Result<(), ServerError> {
        tracing::info!(addr = %self.listener.local_addr()?, "server listening");
        loop {
            let (stream, peer_addr) = self.listener.accept().await?;
            let engine = self.engine.clone();
            tokio::spawn(async move {
                tracing::debug!(%peer_addr, "client connected");
                if let Err(e) = serve_connection(stream, engine).await {
                    tracing::warn!(%peer_addr, error = %e, "connection failed");
                }
                tracing::debug!(%peer_addr, "client disconnected");
            });
        }
    }
}

/// Reads null-delimited statements off one connection and writes back one
/// JSON envelope per statement. Empty frames are ignored.
async fn serve_connection(stream: TcpStream, engine: Arc<Mutex<Engine>>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();
    loop {
        frame.clear();
        if reader.read_until(b'\0', &mut frame).await? == 0 {
            return Ok(());
        }
        if frame.last() == Some(&b'\0') {
            frame.pop();
        }
        if frame.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        let reply = match std::str::from_utf8(&frame) {
            Ok(sql) => {
                let result = engine.lock().execute_sql(sql);
                match &result {
                    Ok(_) => tracing::debug!(sql, "statement ok"),
                    Err(e) => tracing::debug!(sql, error = %e, "statement failed"),
                }
                response::encode(result)
            }
            Err(_) => {
                tracing::debug!("dropping non-UTF-8 frame");
                response::encode(Err(SqlError::Parse("statement is not valid UTF-8".into())))
            }
        };
        writer.write_all(reply.to_string().as_bytes()).await?;
        writer.write_all(b"\0").await?;
        writer.flush().await?;
    }
}

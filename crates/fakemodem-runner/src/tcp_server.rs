//! TCP Server Module
//!
//! Exposes the emulated modem's control channel over TCP, the way a virtual
//! serial port would. Every accepted connection gets its own
//! [`ModemSession`] (input buffer, compose state, message store); the
//! [`ModemProfile`] is the only thing shared between them.

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use fakemodem_core::{ModemProfile, ModemSession, SessionStats};
use fakemodem_metrics::metric_defs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, trace, warn};

use crate::error::TransportError;
use crate::transport::log_session_end;

/// Shared set of connected session ids.
type ConnectedSessions = Arc<RwLock<HashSet<u64>>>;

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(250);

/// Pause after a failed accept, so descriptor exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Bytes requested per read.
const READ_CHUNK: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Settings for the TCP server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Maximum number of concurrently connected sessions.
    pub max_sessions: usize,
    /// Read timeout; a read that yields nothing in this time is retried.
    pub read_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            max_sessions: 1,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// A TCP listener serving one emulator session per connection.
pub struct TcpModemServer {
    listener: TcpListener,
    profile: Arc<ModemProfile>,
    options: ServerOptions,
    /// Permits for concurrent sessions.
    slots: Arc<Semaphore>,
    /// Ids of currently connected sessions.
    connected: ConnectedSessions,
    /// Id given to the next accepted connection.
    next_session_id: u64,
}

impl TcpModemServer {
    /// Bind the listener.
    pub async fn bind(
        addr: &str,
        profile: Arc<ModemProfile>,
        options: ServerOptions,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Open {
                path: addr.to_string(),
                source,
            })?;
        let max_sessions = options.max_sessions.max(1);

        Ok(TcpModemServer {
            listener,
            profile,
            options: ServerOptions {
                max_sessions,
                ..options
            },
            slots: Arc::new(Semaphore::new(max_sessions)),
            connected: Arc::new(RwLock::new(HashSet::new())),
            next_session_id: 1,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get the connected sessions tracker.
    ///
    /// The handle stays valid after [`TcpModemServer::run`] takes the server.
    pub fn connected_sessions(&self) -> ConnectedSessions {
        self.connected.clone()
    }

    /// Accept connections until `shutdown` is set.
    ///
    /// Connections beyond `max_sessions` are closed immediately.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) -> Result<(), TransportError> {
        info!(
            max_sessions = self.options.max_sessions,
            commands = self.profile.table.len(),
            "accepting connections"
        );

        while !shutdown.load(Ordering::Relaxed) {
            let accepted = match tokio::time::timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(result) => result,
                Err(_) => continue,
            };
            let Some((stream, peer)) = accepted_connection(accepted) else {
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            };

            let Ok(permit) = self.slots.clone().try_acquire_owned() else {
                warn!(%peer, "session limit reached, refusing connection");
                metrics::counter!(metric_defs::SESSIONS_REFUSED.name, "transport" => "tcp")
                    .increment(1);
                drop(stream);
                continue;
            };

            let id = self.next_session_id;
            self.next_session_id += 1;

            let session = ModemSession::with_transport(id, self.profile.clone(), "tcp");
            let connected = self.connected.clone();
            let read_timeout = self.options.read_timeout;
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let active = match connected.write() {
                    Ok(mut sessions) => {
                        sessions.insert(id);
                        sessions.len()
                    }
                    Err(_) => 0,
                };
                info!(session = id, %peer, active, "session started");
                metrics::gauge!(metric_defs::SESSIONS_ACTIVE.name, "transport" => "tcp")
                    .increment(1.0);

                let result = handle_connection(stream, session, read_timeout, &shutdown).await;

                metrics::gauge!(metric_defs::SESSIONS_ACTIVE.name, "transport" => "tcp")
                    .decrement(1.0);
                if let Ok(mut sessions) = connected.write() {
                    sessions.remove(&id);
                }

                match result {
                    Ok(stats) => log_session_end(id, &stats),
                    Err(e) => warn!(session = id, error = %e, "session failed"),
                }
            });
        }

        debug!("accept loop stopped");
        Ok(())
    }
}

/// Unwrap an accept result.
///
/// Accept failures (an aborted handshake, descriptor exhaustion) concern one
/// pending connection; they are logged and the listener keeps running.
fn accepted_connection(
    result: io::Result<(TcpStream, SocketAddr)>,
) -> Option<(TcpStream, SocketAddr)> {
    match result {
        Ok(connection) => Some(connection),
        Err(e) => {
            warn!(error = %e, "accept failed");
            None
        }
    }
}

/// Run one session over a TCP connection.
async fn handle_connection(
    mut stream: TcpStream,
    mut session: ModemSession,
    read_timeout: Duration,
    shutdown: &AtomicBool,
) -> Result<SessionStats, TransportError> {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = [0u8; READ_CHUNK];

    while !shutdown.load(Ordering::Relaxed) {
        let n = match tokio::time::timeout(read_timeout, reader.read(&mut read_buf)).await {
            // Nothing within the timeout
            Err(_) => continue,
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(TransportError::Read(e)),
        };
        trace!(session = session.id(), rx = %hex::encode(&read_buf[..n]));

        for &byte in &read_buf[..n] {
            if let Some(reply) = session.feed(byte) {
                writer
                    .write_all(reply.as_bytes())
                    .await
                    .map_err(TransportError::Write)?;
                writer.flush().await.map_err(TransportError::Write)?;
            }
        }
    }

    Ok(session.stats())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_errors_are_not_fatal() {
        for kind in [
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::OutOfMemory,
            io::ErrorKind::Other,
        ] {
            assert!(accepted_connection(Err(io::Error::from(kind))).is_none());
        }
    }

    #[tokio::test]
    async fn test_accepted_connection_passes_stream_through() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();

        let (stream, peer) = accepted_connection(listener.accept().await).unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
        assert_eq!(stream.local_addr().unwrap(), addr);
    }
}

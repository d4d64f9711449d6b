//! Blocking transports.
//!
//! [`run_session`] is the synchronous read loop: it pulls bytes from any
//! `Read + Write` channel, frames them one at a time and writes each reply
//! before framing the next byte. A read that times out is "no data" and is
//! simply retried; end-of-stream ends the session; any other I/O error is a
//! [`TransportError`] and ends it too. No retry or reconnect happens here.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use fakemodem_core::{ModemSession, SessionStats};
use tracing::{debug, info, trace};

use crate::error::TransportError;

/// Bytes requested per read.
const READ_CHUNK: usize = 64;

/// Drive `session` over `transport` until end-of-stream, shutdown or error.
pub fn run_session<T: Read + Write>(
    transport: &mut T,
    session: &mut ModemSession,
    shutdown: &AtomicBool,
) -> Result<SessionStats, TransportError> {
    let mut buf = [0u8; READ_CHUNK];

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!(session = session.id(), "shutdown requested");
            break;
        }

        let n = match transport.read(&mut buf) {
            Ok(0) => {
                debug!(session = session.id(), "transport closed");
                break;
            }
            Ok(n) => n,
            Err(e) if is_no_data(&e) => continue,
            Err(e) => return Err(TransportError::Read(e)),
        };
        trace!(session = session.id(), rx = %hex::encode(&buf[..n]));

        for &byte in &buf[..n] {
            if let Some(reply) = session.feed(byte) {
                transport
                    .write_all(reply.as_bytes())
                    .map_err(TransportError::Write)?;
                transport.flush().map_err(TransportError::Write)?;
            }
        }
    }

    Ok(session.stats())
}

/// Log a session's traffic counters when it ends.
pub fn log_session_end(session: u64, stats: &SessionStats) {
    info!(
        session,
        lines = stats.lines,
        unknown = stats.unknown_commands,
        stored = stats.messages_stored,
        overflowed = stats.overflowed_lines,
        discarded_bytes = stats.discarded_bytes,
        "session ended"
    );
}

/// Check whether a read error only means nothing arrived in time.
pub fn is_no_data(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

// ============================================================================
// Timed Transport
// ============================================================================

/// A duplex transport whose reads give up after a timeout.
///
/// Blocking sources such as stdin or a tty have no portable read timeout, so
/// a reader thread pulls from the source and hands chunks over a channel.
/// [`Read::read`] waits on that channel for at most `read_timeout` and then
/// fails with [`io::ErrorKind::TimedOut`], which [`run_session`] treats as
/// "no data". The shutdown flag is therefore checked at least once per
/// timeout even when the peer is silent.
///
/// The reader thread is detached. When the session ends while it is blocked,
/// it stays parked until the process exits.
#[derive(Debug)]
pub struct TimedTransport<W> {
    incoming: Receiver<io::Result<Vec<u8>>>,
    /// Bytes received but not yet handed to the caller.
    pending: Vec<u8>,
    writer: W,
    read_timeout: Duration,
    closed: bool,
}

impl<W: Write> TimedTransport<W> {
    /// Start a reader thread on `reader` and pair it with `writer`.
    pub fn spawn<R>(reader: R, writer: W, read_timeout: Duration) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, incoming) = crossbeam_channel::bounded(READER_QUEUE);
        thread::Builder::new()
            .name("fakemodem-reader".to_string())
            .spawn(move || reader_loop(reader, tx))?;

        Ok(TimedTransport {
            incoming,
            pending: Vec::new(),
            writer,
            read_timeout,
            closed: false,
        })
    }

    /// The write half.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

/// Number of chunks buffered between the reader thread and the session.
const READER_QUEUE: usize = 16;

fn reader_loop<R: Read>(mut reader: R, tx: Sender<io::Result<Vec<u8>>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let message = match reader.read(&mut buf) {
            // An empty chunk marks end-of-stream.
            Ok(0) => {
                let _ = tx.send(Ok(Vec::new()));
                return;
            }
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };
        let failed = message.is_err();
        if tx.send(message).is_err() || failed {
            return;
        }
    }
}

impl<W> Read for TimedTransport<W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            if self.closed {
                return Ok(0);
            }
            match self.incoming.recv_timeout(self.read_timeout) {
                Ok(Ok(chunk)) if chunk.is_empty() => {
                    self.closed = true;
                    return Ok(0);
                }
                Ok(Ok(chunk)) => self.pending = chunk,
                Ok(Err(e)) => {
                    self.closed = true;
                    return Err(e);
                }
                Err(RecvTimeoutError::Timeout) => return Err(io::ErrorKind::TimedOut.into()),
                Err(RecvTimeoutError::Disconnected) => {
                    self.closed = true;
                    return Ok(0);
                }
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl<W: Write> Write for TimedTransport<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Standard input and output as one duplex transport.
pub fn stdio(read_timeout: Duration) -> Result<TimedTransport<io::Stdout>, TransportError> {
    TimedTransport::spawn(io::stdin(), io::stdout(), read_timeout).map_err(|source| {
        TransportError::Open {
            path: "stdio".to_string(),
            source,
        }
    })
}

/// Open a character device (for example one end of a virtual serial pair)
/// for reading and writing.
pub fn open_device(
    path: &Path,
    read_timeout: Duration,
) -> Result<TimedTransport<File>, TransportError> {
    let open_error = |source| TransportError::Open {
        path: path.display().to_string(),
        source,
    };

    let device = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(open_error)?;
    let reader = device.try_clone().map_err(open_error)?;
    TimedTransport::spawn(reader, device, read_timeout).map_err(open_error)
}

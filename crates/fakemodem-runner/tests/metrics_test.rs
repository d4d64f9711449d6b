//! Metrics integration tests.
//!
//! In-process tests scope an [`InMemoryRecorder`] to one session with
//! `metrics::with_local_recorder`, so they never touch the global recorder.
//! The binary test runs `fakemodem` as a subprocess and reads the JSON it
//! writes on exit.

use std::io::{self, Cursor, Read, Write};
use std::process::{Command, Stdio};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fakemodem_core::{ModemConfig, ModemSession};
use fakemodem_metrics::metric_defs;
use fakemodem_runner::metrics_export::{InMemoryRecorder, MetricsSnapshot};
use fakemodem_runner::transport::run_session;

// ============================================================================
// Helpers
// ============================================================================

/// A duplex in-memory transport: reads from `input`, collects writes.
struct Loopback {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl Read for Loopback {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run one session over `input` with a recorder scoped to it.
fn record_session(config: ModemConfig, input: &[u8]) -> MetricsSnapshot {
    let recorder = InMemoryRecorder::new();
    let profile = Arc::new(config.build_profile().unwrap());
    let mut session = ModemSession::with_transport(7, profile, "stdio");
    let mut transport = Loopback {
        input: Cursor::new(input.to_vec()),
        output: Vec::new(),
    };

    metrics::with_local_recorder(&recorder, || {
        run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap();
    });
    recorder.snapshot()
}

// ============================================================================
// Session Metrics
// ============================================================================

#[test]
fn test_command_metrics_after_session() {
    let snapshot = record_session(
        ModemConfig::default(),
        b"AT\rATI\rAT+BOGUS\rAT+CMGS=\"555\"\rhello there\rAT+CMGR=1\r",
    );

    // Message text counts as a dispatched line.
    assert_eq!(snapshot.counter(metric_defs::COMMANDS_RECEIVED.name), 6);
    assert_eq!(snapshot.counter(metric_defs::COMMANDS_UNKNOWN.name), 1);
    assert_eq!(snapshot.counter(metric_defs::SMS_STORED.name), 1);

    let length = snapshot.histogram(metric_defs::SMS_LENGTH.name).unwrap();
    assert_eq!(length.count, 1);
    assert_eq!(length.sum, 11.0);
}

#[test]
fn test_metrics_carry_session_labels() {
    let snapshot = record_session(ModemConfig::default(), b"AT\rAT\r");
    let name = metric_defs::COMMANDS_RECEIVED.name;
    assert_eq!(snapshot.counter_for(name, "session", "7"), 2);
    assert_eq!(snapshot.counter_for(name, "transport", "stdio"), 2);
    assert_eq!(snapshot.counter_for(name, "transport", "tcp"), 0);
}

#[test]
fn test_framer_metrics() {
    let config = ModemConfig {
        max_line_length: 8,
        ..Default::default()
    };
    let snapshot = record_session(config, b"AT+\xff\xfeX\rAT+CGMI-TOO-LONG\rAT\r");

    assert_eq!(snapshot.counter(metric_defs::DISCARDED_BYTES.name), 2);
    assert_eq!(snapshot.counter(metric_defs::LINES_OVERFLOWED.name), 1);
    // The overflowing line is answered but never dispatched.
    assert_eq!(snapshot.counter(metric_defs::COMMANDS_RECEIVED.name), 2);
}

#[test]
fn test_quiet_session_records_nothing() {
    let snapshot = record_session(ModemConfig::default(), b"\r\n\r\n");
    assert!(snapshot.metrics.is_empty());
}

// ============================================================================
// Binary Export
// ============================================================================

#[test]
fn test_binary_writes_metrics_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("metrics.json");

    let mut child = Command::new(env!("CARGO_BIN_EXE_fakemodem"))
        .arg("--metrics-output")
        .arg(&output)
        .arg("--log-level")
        .arg("warn")
        .arg("stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start fakemodem");

    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"AT\rAT+NOPE\rAT+CMGS=\"1\"\rhi\r").unwrap();
        // Dropping stdin closes it; end-of-stream ends the session.
    }
    let result = child.wait_with_output().unwrap();
    assert!(
        result.status.success(),
        "fakemodem failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&result.stdout),
        "OK\r\nERROR\r\n> \r\n+CMGS: 1\r\nOK\r\n"
    );

    let json = std::fs::read_to_string(&output).unwrap();
    let snapshot: MetricsSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.counter(metric_defs::COMMANDS_RECEIVED.name), 4);
    assert_eq!(snapshot.counter(metric_defs::COMMANDS_UNKNOWN.name), 1);
    assert_eq!(snapshot.counter(metric_defs::SMS_STORED.name), 1);
    assert_eq!(
        snapshot.counter_for(metric_defs::SMS_STORED.name, "transport", "stdio"),
        1
    );
}

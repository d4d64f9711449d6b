//! Integration tests for the blocking session loop.
//!
//! These drive a full session (framer, dispatcher, store) through
//! `run_session` over a scripted in-memory transport and check the exact
//! bytes written back.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fakemodem_core::{CmeeMode, ModemConfig, ModemSession, REFERENCE_COMMANDS};
use fakemodem_protocol::{Directive, ReadReply};
use fakemodem_runner::transport::{run_session, TimedTransport};
use fakemodem_runner::TransportError;

// ============================================================================
// Helpers
// ============================================================================

/// A transport that replays scripted reads and records everything written.
#[derive(Default)]
struct ScriptedTransport {
    reads: VecDeque<io::Result<Vec<u8>>>,
    written: Vec<u8>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn data(mut self, bytes: &[u8]) -> Self {
        self.reads.push_back(Ok(bytes.to_vec()));
        self
    }

    fn error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(Err(io::Error::from(kind)));
        self
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(&self.written).to_string()
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    self.reads.push_front(Ok(rest));
                }
                Ok(n)
            }
        }
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session_with(config: ModemConfig) -> ModemSession {
    ModemSession::new(1, Arc::new(config.build_profile().unwrap()))
}

fn run(config: ModemConfig, input: &[u8]) -> (String, ModemSession) {
    let mut transport = ScriptedTransport::new().data(input);
    let mut session = session_with(config);
    run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap();
    (transport.output(), session)
}

fn reply_to(input: &[u8]) -> String {
    run(ModemConfig::default(), input).0
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_at_ok() {
    assert_eq!(reply_to(b"AT\r\n"), "OK\r\n");
}

#[test]
fn test_scenario_compose_and_store() {
    let (output, session) = run(
        ModemConfig::default(),
        b"AT+CMGS=\"12345\"\rHi there\r",
    );
    assert_eq!(output, "> \r\n+CMGS: 1\r\nOK\r\n");

    let message = session.store().get(1).unwrap();
    assert_eq!(message.address, "12345");
    assert_eq!(message.text, "Hi there");
}

#[test]
fn test_prompt_is_unterminated() {
    let (output, session) = run(ModemConfig::default(), b"AT+CMGS=\"12345\"\r");
    assert_eq!(output, "> ");
    assert!(session.state().is_composing());
}

// ============================================================================
// Table Replies
// ============================================================================

#[test]
fn test_every_table_command_any_case_and_terminator() {
    for (command, template) in REFERENCE_COMMANDS {
        for terminator in ["\r", "\n", "\r\n"] {
            let upper = format!("{}{}", command, terminator);
            assert_eq!(reply_to(upper.as_bytes()), *template, "{:?}", upper);

            let lower = format!("  {} \t{}", command.to_lowercase(), terminator);
            assert_eq!(reply_to(lower.as_bytes()), *template, "{:?}", lower);
        }
    }
}

#[test]
fn test_repeated_lookup_is_identical() {
    let output = reply_to(b"ATI\rATI\rATI\rATI\r");
    let single = "CelerFake v1.0\r\nManufacturer: CelerLab\r\nRevision: 2025.01\r\nOK\r\n";
    assert_eq!(output, single.repeat(4));
}

#[test]
fn test_mixed_terminator_templates_verbatim() {
    assert_eq!(reply_to(b"AT+CPIN?\r"), "+CPIN: READY\rOK\r\n");
    assert_eq!(reply_to(b"AT+CREG?\r"), "+CREG: 0,1\nOK\r\n");
    assert_eq!(reply_to(b"AT+QISEND\r"), "> \r\n");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_command_terse() {
    assert_eq!(reply_to(b"AT+NOTREAL\r"), "ERROR\r\n");
    assert_eq!(reply_to(b"hello\r"), "ERROR\r\n");
}

#[test]
fn test_unknown_command_verbose() {
    let config = ModemConfig {
        verbose_errors: true,
        ..Default::default()
    };
    let (output, session) = run(config, b"AT+NOTREAL\rAT\r");
    assert_eq!(output, "+CME ERROR: invalid command\r\nOK\r\n");
    assert_eq!(session.stats().unknown_commands, 1);
}

#[test]
fn test_cmee_cosmetic_does_not_change_errors() {
    assert_eq!(reply_to(b"AT+CMEE=2\rAT+X\r"), "OK\r\nERROR\r\n");
}

#[test]
fn test_cmee_live_changes_errors() {
    let config = ModemConfig {
        cmee_mode: CmeeMode::Live,
        ..Default::default()
    };
    let (output, _) = run(config, b"AT+X\rAT+CMEE=1\rAT+X\rAT+CMEE=0\rAT+X\r");
    assert_eq!(
        output,
        "ERROR\r\nOK\r\n+CME ERROR: invalid command\r\nOK\r\nERROR\r\n"
    );
}

// ============================================================================
// SMS Sub-protocol
// ============================================================================

#[test]
fn test_read_empty_slot() {
    let output = reply_to(b"AT+CMGR=1\r");
    assert_eq!(output, "+CMGR: 0\r\nOK\r\n");
    assert_eq!(ReadReply::parse(&output).unwrap(), ReadReply::Empty);
}

#[test]
fn test_read_directive_rejects_inner_whitespace() {
    assert_eq!(reply_to(b"AT+CMGR= 1\r"), "ERROR\r\n");
    assert_eq!(reply_to(b"  at+cmgr=1  \r"), "+CMGR: 0\r\nOK\r\n");
}

#[test]
fn test_compose_then_read_round_trip() {
    let mut input = Vec::new();
    input.extend(Directive::SendMessage { address: "+15550001".to_string() }.encode());
    input.extend(b"Hello\r");
    input.extend(Directive::ReadMessage { slot: 1 }.encode());

    let (output, _) = run(ModemConfig::default(), &input);
    let read = output
        .strip_prefix("> \r\n+CMGS: 1\r\nOK\r\n")
        .expect("compose replies first");

    match ReadReply::parse(read).unwrap() {
        ReadReply::Message { address, text, .. } => {
            assert_eq!(address, "+15550001");
            assert_eq!(text, "Hello");
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[test]
fn test_compose_consumes_table_command() {
    let (output, session) = run(ModemConfig::default(), b"AT+CMGS=\"1\"\rAT\rAT\r");
    assert_eq!(output, "> \r\n+CMGS: 1\r\nOK\r\nOK\r\n");
    assert_eq!(session.store().get(1).unwrap().text, "AT");
}

#[test]
fn test_compose_consumes_directive_text() {
    let (output, session) = run(ModemConfig::default(), b"AT+CMGS=\"1\"\rAT+CMGS=\"2\"\r");
    assert_eq!(output, "> \r\n+CMGS: 1\r\nOK\r\n");
    assert_eq!(session.store().get(1).unwrap().text, "AT+CMGS=\"2\"");
    assert!(!session.state().is_composing());
}

#[test]
fn test_compose_survives_empty_lines() {
    let (output, session) = run(ModemConfig::default(), b"AT+CMGS=\"1\"\r\n\r\n\n\rtext\r\n");
    assert_eq!(output, "> \r\n+CMGS: 1\r\nOK\r\n");
    assert_eq!(session.store().get(1).unwrap().text, "text");
}

#[test]
fn test_second_compose_overwrites_single_slot() {
    let (_, session) = run(
        ModemConfig::default(),
        b"AT+CMGS=\"1\"\rfirst\rAT+CMGS=\"2\"\rsecond\r",
    );
    let message = session.store().get(1).unwrap();
    assert_eq!(message.address, "2");
    assert_eq!(message.text, "second");
    assert_eq!(session.stats().messages_stored, 2);
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn test_empty_lines_produce_nothing() {
    assert_eq!(reply_to(b"\r\n\r\n\n\r   \r"), "");
    assert_eq!(reply_to(b"\r\n\r\nAT\r\n\r\n"), "OK\r\n");
}

#[test]
fn test_command_split_across_reads() {
    let mut transport = ScriptedTransport::new()
        .data(b"A")
        .data(b"T+CG")
        .data(b"MI\r")
        .data(b"\n");
    let mut session = session_with(ModemConfig::default());
    run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap();
    assert_eq!(transport.output(), "CelerLab\r\nOK\r\n");
}

#[test]
fn test_long_input_chunk() {
    let input = "AT\r".repeat(100);
    assert_eq!(reply_to(input.as_bytes()), "OK\r\n".repeat(100));
}

#[test]
fn test_invalid_bytes_discarded() {
    let (output, session) = run(ModemConfig::default(), b"\xffA\xfeT\r");
    assert_eq!(output, "OK\r\n");
    assert_eq!(session.stats().discarded_bytes, 2);
}

#[test]
fn test_overflow_rejected_with_error() {
    let config = ModemConfig {
        max_line_length: 16,
        ..Default::default()
    };
    let long = format!("AT+{}\rAT\r", "X".repeat(40));
    let (output, session) = run(config, long.as_bytes());
    assert_eq!(output, "ERROR\r\nOK\r\n");
    assert_eq!(session.stats().overflowed_lines, 1);
}

// ============================================================================
// Transport Behavior
// ============================================================================

#[test]
fn test_timeouts_are_retried() {
    let mut transport = ScriptedTransport::new()
        .data(b"A")
        .error(io::ErrorKind::TimedOut)
        .error(io::ErrorKind::WouldBlock)
        .error(io::ErrorKind::Interrupted)
        .data(b"T\r");
    let mut session = session_with(ModemConfig::default());
    let stats = run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap();
    assert_eq!(transport.output(), "OK\r\n");
    assert_eq!(stats.lines, 1);
}

#[test]
fn test_transport_failure_ends_session() {
    let mut transport = ScriptedTransport::new()
        .data(b"AT\r")
        .error(io::ErrorKind::BrokenPipe)
        .data(b"ATI\r");
    let mut session = session_with(ModemConfig::default());
    let err = run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap_err();
    assert!(matches!(err, TransportError::Read(_)));
    // The reply before the failure was still written.
    assert_eq!(transport.output(), "OK\r\n");
}

#[test]
fn test_shutdown_flag_stops_loop() {
    let mut transport = ScriptedTransport::new().data(b"AT\r");
    let mut session = session_with(ModemConfig::default());
    let stats = run_session(&mut transport, &mut session, &AtomicBool::new(true)).unwrap();
    assert_eq!(stats.lines, 0);
    assert_eq!(transport.output(), "");
}

/// A source that stays connected but never sends anything.
struct SilentPeer;

impl Read for SilentPeer {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }
}

#[test]
fn test_shutdown_while_peer_is_silent() {
    let mut transport =
        TimedTransport::spawn(SilentPeer, Vec::new(), Duration::from_millis(20)).unwrap();
    let mut session = session_with(ModemConfig::default());
    let shutdown = Arc::new(AtomicBool::new(false));

    let flag = shutdown.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        flag.store(true, Ordering::Relaxed);
    });

    let started = Instant::now();
    let stats = run_session(&mut transport, &mut session, &shutdown).unwrap();
    stopper.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(stats.lines, 0);
    assert!(transport.writer().is_empty());
}

#[test]
fn test_timed_transport_session_until_eof() {
    let source = io::Cursor::new(b"AT\rAT+CMGS=\"9\"\rhi\r".to_vec());
    let mut transport =
        TimedTransport::spawn(source, Vec::new(), Duration::from_millis(50)).unwrap();
    let mut session = session_with(ModemConfig::default());

    let stats = run_session(&mut transport, &mut session, &AtomicBool::new(false)).unwrap();
    assert_eq!(
        String::from_utf8_lossy(transport.writer()),
        "OK\r\n> \r\n+CMGS: 1\r\nOK\r\n"
    );
    assert_eq!(stats.messages_stored, 1);
}

use benchlink_communication::{ConnectionManager, ConnectionParams, Transport};
use benchlink_core::{Command, ConnectionError, ConnectionState};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Mock transport with scripted receive chunks and recorded sends
struct MockTransport {
    rx: Arc<Mutex<VecDeque<Vec<u8>>>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_sends: Arc<AtomicBool>,
    fail_receives: Arc<AtomicBool>,
    connected: bool,
}

impl Transport for MockTransport {
    fn connect(&mut self, _params: &ConnectionParams) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "wire gone"));
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        if self.fail_receives.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "wire gone"));
        }
        Ok(self.rx.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

struct Harness {
    manager: ConnectionManager,
    rx: Arc<Mutex<VecDeque<Vec<u8>>>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_sends: Arc<AtomicBool>,
    fail_receives: Arc<AtomicBool>,
}

fn harness() -> Harness {
    let rx = Arc::new(Mutex::new(VecDeque::new()));
    let sent = Arc::new(Mutex::new(Vec::new()));
    let fail_sends = Arc::new(AtomicBool::new(false));
    let fail_receives = Arc::new(AtomicBool::new(false));
    let mock = MockTransport {
        rx: rx.clone(),
        sent: sent.clone(),
        fail_sends: fail_sends.clone(),
        fail_receives: fail_receives.clone(),
        connected: false,
    };
    Harness {
        manager: ConnectionManager::new(Box::new(mock)),
        rx,
        sent,
        fail_sends,
        fail_receives,
    }
}

fn fast_params() -> ConnectionParams {
    ConnectionParams {
        port: "/dev/ttyTEST".to_string(),
        baud_rate: 57600,
        timeout_ms: 10,
        settle_delay_ms: 0,
    }
}

fn push(h: &Harness, chunk: &str) {
    h.rx.lock().unwrap().push_back(chunk.as_bytes().to_vec());
}

#[test]
fn connect_transitions_to_connected() {
    let h = harness();
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    h.manager.connect(&fast_params()).unwrap();
    assert_eq!(h.manager.state(), ConnectionState::Connected);
}

#[test]
fn double_connect_rejected_without_replacing_handle() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();
    let err = h.manager.connect(&fast_params()).unwrap_err();
    assert!(matches!(err, ConnectionError::AlreadyConnected));
    assert_eq!(h.manager.state(), ConnectionState::Connected);
}

#[test]
fn disconnect_is_idempotent_from_any_state() {
    let h = harness();
    h.manager.disconnect();
    h.manager.disconnect();
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);

    h.manager.connect(&fast_params()).unwrap();
    h.manager.disconnect();
    h.manager.disconnect();
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn write_requires_active_connection() {
    let h = harness();
    let err = h.manager.write(b"S\n").unwrap_err();
    assert!(matches!(err, ConnectionError::NotConnected));
    assert!(h.sent.lock().unwrap().is_empty());
}

#[test]
fn write_failure_enters_error_and_subsequent_writes_fail_fast() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();
    h.fail_sends.store(true, Ordering::SeqCst);

    let err = h.manager.write(b"S\n").unwrap_err();
    assert!(matches!(err, ConnectionError::Io { .. }));
    assert_eq!(h.manager.state(), ConnectionState::Error);

    // No retry happens under the hood; the next write fails immediately.
    h.fail_sends.store(false, Ordering::SeqCst);
    let err = h.manager.write(b"S\n").unwrap_err();
    assert!(matches!(err, ConnectionError::NotConnected));
    assert!(h.sent.lock().unwrap().is_empty());
}

#[test]
fn reconnect_after_error() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();
    h.fail_sends.store(true, Ordering::SeqCst);
    let _ = h.manager.write(b"S\n");
    assert_eq!(h.manager.state(), ConnectionState::Error);

    h.manager.disconnect();
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    h.manager.connect(&fast_params()).unwrap();
    assert_eq!(h.manager.state(), ConnectionState::Connected);

    h.fail_sends.store(false, Ordering::SeqCst);
    h.manager.write(b"S\n").unwrap();
    assert_eq!(h.sent.lock().unwrap().len(), 1);
}

#[test]
fn direct_reconnect_from_error_state() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();
    h.fail_sends.store(true, Ordering::SeqCst);
    let _ = h.manager.write(b"S\n");
    assert_eq!(h.manager.state(), ConnectionState::Error);

    // Reconnection is valid straight from Error; the stale handle is
    // released before the port is reopened.
    h.manager.connect(&fast_params()).unwrap();
    assert_eq!(h.manager.state(), ConnectionState::Connected);
}

#[test]
fn poll_returns_complete_lines_only() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();

    push(&h, "Motor sto");
    assert!(h.manager.poll().unwrap().is_empty());

    push(&h, "pped\nStopping motor grad");
    assert_eq!(h.manager.poll().unwrap(), vec!["Motor stopped".to_string()]);

    push(&h, "ually\n");
    assert_eq!(
        h.manager.poll().unwrap(),
        vec!["Stopping motor gradually".to_string()]
    );
}

#[test]
fn poll_splits_multiple_lines_in_one_chunk() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();

    push(&h, "Motor stopped\r\nMotor speed adjusted to 70%\n");
    assert_eq!(
        h.manager.poll().unwrap(),
        vec![
            "Motor stopped".to_string(),
            "Motor speed adjusted to 70%".to_string()
        ]
    );
}

#[test]
fn poll_when_not_connected_returns_empty() {
    let h = harness();
    push(&h, "Motor stopped\n");
    assert!(h.manager.poll().unwrap().is_empty());
}

#[test]
fn poll_discards_lines_during_settle_window() {
    let h = harness();
    let params = ConnectionParams {
        settle_delay_ms: 60,
        ..fast_params()
    };
    h.manager.connect(&params).unwrap();
    assert!(h.manager.in_settle_window());

    push(&h, "Calibrating\n");
    assert!(h.manager.poll().unwrap().is_empty());

    std::thread::sleep(std::time::Duration::from_millis(80));
    assert!(!h.manager.in_settle_window());
    push(&h, "Motor stopped\n");
    assert_eq!(h.manager.poll().unwrap(), vec!["Motor stopped".to_string()]);
}

#[test]
fn receive_failure_moves_connection_to_error() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();
    h.fail_receives.store(true, Ordering::SeqCst);

    let err = h.manager.poll().unwrap_err();
    assert!(matches!(err, ConnectionError::Io { .. }));
    assert_eq!(h.manager.state(), ConnectionState::Error);
}

#[test]
fn send_command_encodes_before_writing() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();

    h.manager.send_command(&Command::Stop).unwrap();
    assert_eq!(h.sent.lock().unwrap().as_slice(), &[b"S\n".to_vec()]);
}

#[test]
fn invalid_command_is_never_transmitted() {
    let h = harness();
    h.manager.connect(&fast_params()).unwrap();

    let err = h.manager.send_command(&Command::SetSpeedPercent(5)).unwrap_err();
    assert!(err.is_command_error());
    assert!(h.sent.lock().unwrap().is_empty());
    // Validation failures do not disturb the connection
    assert_eq!(h.manager.state(), ConnectionState::Connected);
}

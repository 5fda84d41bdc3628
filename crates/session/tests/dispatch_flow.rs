//! End-to-end dispatch scenarios against a scripted backend worker
//!
//! The worker thread stands in for the HID backend: it services bridge
//! commands from a canned script and records every call it sees, so the
//! tests can assert exactly which backend operations a user action caused.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use session::{
    BackendCommand, BackendWorker, DispatchState, EventBridge, LogCategory, Session, SessionEvent,
    dispatch,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Calls observed by the scripted worker, in order
type CallLog = Arc<Mutex<Vec<String>>>;

/// Worker behavior for one test
#[derive(Clone, Copy)]
struct Script {
    /// Response returned by SendCommand, or None to fail the send
    send_response: Option<&'static [u8]>,
    /// Whether StartListening succeeds
    listener_ok: bool,
    /// Push an inbound frame before answering each SendCommand
    push_before_response: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            send_response: Some(&[]),
            listener_ok: true,
            push_before_response: false,
        }
    }
}

fn spawn_scripted_worker(worker: BackendWorker, script: Script) -> CallLog {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let calls_inner = calls.clone();

    std::thread::spawn(move || {
        while let Ok(cmd) = worker.recv_command() {
            match cmd {
                BackendCommand::ScanDevices { response } => {
                    calls_inner.lock().unwrap().push("scan".to_string());
                    let _ = response.send(Ok(vec![descriptor("dev-1")]));
                }
                BackendCommand::StartListening { path, response } => {
                    calls_inner.lock().unwrap().push(format!("listen:{}", path));
                    let result = if script.listener_ok {
                        Ok(())
                    } else {
                        Err("open failed".to_string())
                    };
                    let _ = response.send(result);
                }
                BackendCommand::SendCommand { path, data, response } => {
                    calls_inner
                        .lock()
                        .unwrap()
                        .push(format!("send:{}:{:02X?}", path, data));
                    if script.push_before_response {
                        worker
                            .send_event(session::BackendEvent::InboundFrame {
                                data: vec![0xBE, 0xEF],
                            })
                            .unwrap();
                        // Leave the push a head start over the response
                        std::thread::sleep(Duration::from_millis(50));
                    }
                    let result = match script.send_response {
                        Some(bytes) => Ok(bytes.to_vec()),
                        None => Err("write failed".to_string()),
                    };
                    let _ = response.send(result);
                }
                BackendCommand::Shutdown => break,
            }
        }
    });

    calls
}

fn descriptor(path: &str) -> session::DeviceDescriptor {
    session::DeviceDescriptor {
        path: path.to_string(),
        vendor_id: "0xfeed".to_string(),
        product_id: "0x0803".to_string(),
        product_string: Some("Scripted".to_string()),
        manufacturer_string: None,
        usage_page: 0xff60,
        interface_number: 0,
    }
}

/// Run one full send through begin/execute/finish
async fn run_send(session: &mut Session, bridge: &session::BackendBridge, text: &str) {
    let ticket = session.begin_dispatch(text).unwrap();
    let report = dispatch::execute(bridge, ticket).await;
    session.finish_dispatch(report);
}

#[tokio::test]
async fn test_scan_select_send_logs_outgoing_and_response() {
    let (bridge, worker) = session::create_backend_bridge();
    let calls = spawn_scripted_worker(
        worker,
        Script {
            send_response: Some(&[0xAA]),
            ..Script::default()
        },
    );

    let mut session = Session::new();
    let devices = bridge.scan_devices().await.unwrap();
    assert_eq!(session.apply_scan(devices), 1);
    session.select("dev-1");

    run_send(&mut session, &bridge, "01 02").await;
    assert_eq!(session.dispatch_state(), DispatchState::Ready);

    let entries: Vec<(LogCategory, &str)> = session
        .log()
        .entries()
        .iter()
        .map(|e| (e.category, e.message.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (LogCategory::Info, "Scan complete: 1 device(s)"),
            (LogCategory::Outgoing, "01 02"),
            (LogCategory::Info, "Response: AA"),
        ]
    );

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec!["scan", "listen:dev-1", "send:dev-1:[01, 02]"]
    );
}

#[tokio::test]
async fn test_listener_started_once_across_sends() {
    let (bridge, worker) = session::create_backend_bridge();
    let calls = spawn_scripted_worker(worker, Script::default());

    let mut session = Session::new();
    session.apply_scan(vec![descriptor("dev-1")]);
    session.select("dev-1");

    run_send(&mut session, &bridge, "01").await;
    run_send(&mut session, &bridge, "02").await;

    let listens = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("listen:"))
        .count();
    assert_eq!(listens, 1);
}

#[tokio::test]
async fn test_send_failure_forces_listener_restart() {
    let (bridge, worker) = session::create_backend_bridge();
    let calls = spawn_scripted_worker(
        worker,
        Script {
            send_response: None,
            ..Script::default()
        },
    );

    let mut session = Session::new();
    session.apply_scan(vec![descriptor("dev-1")]);
    session.select("dev-1");

    run_send(&mut session, &bridge, "01").await;
    assert!(!session.registry().has_listener("dev-1"));
    assert!(
        session
            .log()
            .entries()
            .iter()
            .any(|e| e.category == LogCategory::Error)
    );

    run_send(&mut session, &bridge, "01").await;

    let listens = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("listen:"))
        .count();
    assert_eq!(listens, 2);
}

#[tokio::test]
async fn test_listener_failure_aborts_before_write() {
    let (bridge, worker) = session::create_backend_bridge();
    let calls = spawn_scripted_worker(
        worker,
        Script {
            listener_ok: false,
            ..Script::default()
        },
    );

    let mut session = Session::new();
    session.apply_scan(vec![descriptor("dev-1")]);
    session.select("dev-1");

    run_send(&mut session, &bridge, "01").await;

    assert!(!session.registry().has_listener("dev-1"));
    let calls = calls.lock().unwrap();
    assert!(calls.iter().all(|c| !c.starts_with("send:")));
}

#[tokio::test]
async fn test_inbound_push_logged_in_arrival_order_during_send() {
    let (mut bridge, worker) = session::create_backend_bridge();
    let calls = spawn_scripted_worker(
        worker,
        Script {
            send_response: Some(&[0xAA]),
            push_before_response: true,
            ..Script::default()
        },
    );

    let mut event_bridge = EventBridge::new(bridge.take_events().unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();
    event_bridge.subscribe(tx);

    let mut session = Session::new();
    session.apply_scan(vec![descriptor("dev-1")]);
    session.select("dev-1");
    session.clear_log();

    let ticket = session.begin_dispatch("01").unwrap();
    let bridge = Arc::new(bridge);
    let exec_bridge = bridge.clone();
    let pending = tokio::spawn(async move { dispatch::execute(&exec_bridge, ticket).await });

    // The push arrives while the send is still in flight
    let SessionEvent::Inbound(data) = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(session.dispatch_state() == DispatchState::Dispatching);
    session.record_inbound(&data);

    let report = timeout(Duration::from_secs(2), pending).await.unwrap().unwrap();
    session.finish_dispatch(report);

    let entries: Vec<(LogCategory, &str)> = session
        .log()
        .entries()
        .iter()
        .map(|e| (e.category, e.message.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (LogCategory::Outgoing, "01"),
            (LogCategory::Incoming, "BE EF"),
            (LogCategory::Info, "Response: AA"),
        ]
    );
    assert!(!calls.lock().unwrap().is_empty());
}

//! Async channel bridge between the Tokio runtime and the HID worker thread
//!
//! The backend is reachable only through this boundary: request/response
//! commands carrying oneshot responders, plus an independent push channel
//! for asynchronously read inbound frames. The bridge half lives on the
//! Tokio side; the worker half lives on the blocking HID thread.

use async_channel::{Receiver, Sender, bounded};

use crate::descriptor::DeviceDescriptor;
use crate::error::{Result, SessionError};

/// Commands from the Tokio runtime to the HID worker thread
#[derive(Debug)]
pub enum BackendCommand {
    /// Enumerate currently visible devices
    ScanDevices {
        /// Channel to send response back
        response: tokio::sync::oneshot::Sender<std::result::Result<Vec<DeviceDescriptor>, String>>,
    },

    /// Start the asynchronous read listener for a device path (idempotent)
    StartListening {
        path: String,
        /// Channel to send response back
        response: tokio::sync::oneshot::Sender<std::result::Result<(), String>>,
    },

    /// Write a command frame to a device and read back the synchronous
    /// response (possibly empty)
    SendCommand {
        path: String,
        data: Vec<u8>,
        /// Channel to send response back
        response: tokio::sync::oneshot::Sender<std::result::Result<Vec<u8>, String>>,
    },

    /// Shutdown the HID worker thread gracefully
    Shutdown,
}

/// Events pushed by the HID worker, independent of any pending request
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// Inbound device data read by a listener. Carries no correlation to
    /// any prior send.
    InboundFrame { data: Vec<u8> },
}

/// Handle for the Tokio runtime (async)
pub struct BackendBridge {
    cmd_tx: Sender<BackendCommand>,
    event_rx: Option<Receiver<BackendEvent>>,
}

impl BackendBridge {
    /// Request a fresh enumeration
    pub async fn scan_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(BackendCommand::ScanDevices { response: tx }).await?;
        rx.await
            .map_err(|e| SessionError::Channel(e.to_string()))?
            .map_err(SessionError::Scan)
    }

    /// Start the backend read listener for `path`
    pub async fn start_listening(&self, path: &str) -> Result<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(BackendCommand::StartListening {
            path: path.to_string(),
            response: tx,
        })
        .await?;
        rx.await
            .map_err(|e| SessionError::Channel(e.to_string()))?
            .map_err(SessionError::ListenerStart)
    }

    /// Write `data` to the device at `path` and return the response bytes
    pub async fn send_command(&self, path: &str, data: Vec<u8>) -> Result<Vec<u8>> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(BackendCommand::SendCommand {
            path: path.to_string(),
            data,
            response: tx,
        })
        .await?;
        rx.await
            .map_err(|e| SessionError::Channel(e.to_string()))?
            .map_err(SessionError::Dispatch)
    }

    /// Ask the worker thread to shut down
    pub async fn shutdown(&self) -> Result<()> {
        self.send(BackendCommand::Shutdown).await
    }

    /// Take the push-event receiver.
    ///
    /// The receiver can be taken exactly once; subscribing again goes
    /// through [`crate::events::EventBridge`], which owns it afterwards.
    pub fn take_events(&mut self) -> Option<Receiver<BackendEvent>> {
        self.event_rx.take()
    }

    async fn send(&self, cmd: BackendCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))
    }
}

/// Handle for the HID worker thread (blocking)
pub struct BackendWorker {
    cmd_rx: Receiver<BackendCommand>,
    /// Event sender (public for listener threads to clone)
    pub event_tx: Sender<BackendEvent>,
}

impl BackendWorker {
    /// Receive a command from the Tokio runtime (blocking)
    pub fn recv_command(&self) -> Result<BackendCommand> {
        self.cmd_rx
            .recv_blocking()
            .map_err(|e| SessionError::Channel(e.to_string()))
    }

    /// Try to receive a command without blocking
    pub fn try_recv_command(&self) -> Option<BackendCommand> {
        self.cmd_rx.try_recv().ok()
    }

    /// Push an event to the Tokio runtime (blocking)
    pub fn send_event(&self, event: BackendEvent) -> Result<()> {
        self.event_tx
            .send_blocking(event)
            .map_err(|e| SessionError::Channel(e.to_string()))
    }
}

/// Create the channel bridge between Tokio and the HID worker thread
///
/// Returns (BackendBridge for Tokio, BackendWorker for the HID thread)
pub fn create_backend_bridge() -> (BackendBridge, BackendWorker) {
    let (cmd_tx, cmd_rx) = bounded(64);
    let (event_tx, event_rx) = bounded(256);

    (
        BackendBridge {
            cmd_tx,
            event_rx: Some(event_rx),
        },
        BackendWorker { cmd_rx, event_tx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_round_trip() {
        let (bridge, worker) = create_backend_bridge();

        let handle = std::thread::spawn(move || match worker.recv_command().unwrap() {
            BackendCommand::ScanDevices { response } => {
                let _ = response.send(Ok(Vec::new()));
                true
            }
            _ => false,
        });

        let devices = bridge.scan_devices().await.unwrap();
        assert!(devices.is_empty());
        assert!(handle.join().unwrap());
    }

    #[tokio::test]
    async fn test_send_command_failure_maps_to_dispatch_error() {
        let (bridge, worker) = create_backend_bridge();

        let handle = std::thread::spawn(move || match worker.recv_command().unwrap() {
            BackendCommand::SendCommand { path, data, response } => {
                assert_eq!(path, "dev-1");
                assert_eq!(data, vec![0x01, 0x02]);
                let _ = response.send(Err("write failed".to_string()));
            }
            _ => panic!("unexpected command"),
        });

        let err = bridge.send_command("dev-1", vec![0x01, 0x02]).await.unwrap_err();
        assert!(matches!(err, SessionError::Dispatch(ref m) if m == "write failed"));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_event_receiver_taken_once() {
        let (mut bridge, worker) = create_backend_bridge();

        let rx = bridge.take_events().expect("first take succeeds");
        assert!(bridge.take_events().is_none());

        worker
            .send_event(BackendEvent::InboundFrame { data: vec![0xAA] })
            .unwrap();
        match rx.recv().await.unwrap() {
            BackendEvent::InboundFrame { data } => assert_eq!(data, vec![0xAA]),
        }
    }
}

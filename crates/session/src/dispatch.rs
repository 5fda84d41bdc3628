//! Command dispatch state machine
//!
//! Ties a send action to a backend conversation and its outcome. A
//! dispatch runs in three phases so that catalog, registry, and log are
//! only ever touched by the session's owning task:
//!
//! 1. [`DispatchController::begin`] validates on the owning task and
//!    produces a [`DispatchTicket`];
//! 2. [`execute`] runs the backend conversation on a spawned task;
//! 3. [`DispatchController::complete`] applies the [`DispatchReport`] back
//!    on the owning task.
//!
//! The controller is reusable for the whole session; a second send while
//! one is outstanding is rejected, never queued.

use crate::bridge::BackendBridge;
use crate::catalog::DeviceCatalog;
use crate::encoder;
use crate::error::{Result, SessionError};
use crate::listeners::ListenerRegistry;
use crate::log::{LogCategory, SessionLog};

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No device selected
    Idle,
    /// Device selected, no send in flight
    Ready,
    /// Send in flight
    Dispatching,
}

/// Validated send request, produced on the owning task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTicket {
    /// Target device path
    pub path: String,
    /// Encoded command frame
    pub frame: Vec<u8>,
    /// Whether a backend listener must be started before the write
    pub needs_listener: bool,
}

/// Outcome of the backend conversation for one ticket
#[derive(Debug)]
pub struct DispatchReport {
    /// Target device path
    pub path: String,
    /// Whether a listener start was requested and succeeded
    pub listener_started: bool,
    /// Response bytes on success (possibly empty), or the failure
    pub outcome: Result<Vec<u8>>,
}

/// Orchestrates send actions across their three phases
#[derive(Debug, Default)]
pub struct DispatchController {
    in_flight: bool,
}

impl DispatchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a send request and move to `Dispatching`.
    ///
    /// Rejects without any backend call when a dispatch is already
    /// outstanding, when no device is selected, or when the command text
    /// does not encode.
    pub fn begin(
        &mut self,
        catalog: &DeviceCatalog,
        registry: &ListenerRegistry,
        text: &str,
    ) -> Result<DispatchTicket> {
        if self.in_flight {
            return Err(SessionError::DispatchBusy);
        }

        let path = catalog
            .selected_path()
            .ok_or(SessionError::SelectionMissing)?
            .to_string();
        let frame = encoder::encode_command(text)?;
        let needs_listener = !registry.has_listener(&path);

        self.in_flight = true;
        Ok(DispatchTicket {
            path,
            frame,
            needs_listener,
        })
    }

    /// Apply a finished dispatch back to session state and return to
    /// `Ready`.
    pub fn complete(
        &mut self,
        report: DispatchReport,
        registry: &mut ListenerRegistry,
        log: &mut SessionLog,
    ) {
        self.in_flight = false;

        if report.listener_started {
            registry.mark_started(&report.path);
        }

        match report.outcome {
            Ok(response) if !response.is_empty() => {
                log.append(
                    LogCategory::Info,
                    format!("Response: {}", encoder::format_frame(&response)),
                );
            }
            Ok(_) => {
                tracing::debug!("Empty response from {}", report.path);
            }
            Err(err @ SessionError::ListenerStart(_)) => {
                // Send was aborted before any write; registry stays
                // unmarked so the next attempt retries the start.
                log.append(LogCategory::Error, err.to_string());
            }
            Err(err) => {
                log.append(LogCategory::Error, err.to_string());
                registry.mark_failed(&report.path);
            }
        }
    }

    pub fn is_dispatching(&self) -> bool {
        self.in_flight
    }

    /// Controller state as observed with the given catalog
    pub fn state(&self, catalog: &DeviceCatalog) -> DispatchState {
        if self.in_flight {
            DispatchState::Dispatching
        } else if catalog.selected_path().is_some() {
            DispatchState::Ready
        } else {
            DispatchState::Idle
        }
    }
}

/// Run the backend conversation for a validated ticket.
///
/// Listener start is a precondition for the write: when it fails, the
/// send is aborted and no write is attempted.
pub async fn execute(bridge: &BackendBridge, ticket: DispatchTicket) -> DispatchReport {
    let mut listener_started = false;

    if ticket.needs_listener {
        match bridge.start_listening(&ticket.path).await {
            Ok(()) => listener_started = true,
            Err(err) => {
                return DispatchReport {
                    path: ticket.path,
                    listener_started: false,
                    outcome: Err(err),
                };
            }
        }
    }

    let outcome = bridge.send_command(&ticket.path, ticket.frame).await;
    DispatchReport {
        path: ticket.path,
        listener_started,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DeviceDescriptor;

    fn catalog_with(path: &str) -> DeviceCatalog {
        let mut catalog = DeviceCatalog::new();
        catalog.apply_scan(vec![DeviceDescriptor {
            path: path.to_string(),
            vendor_id: "0xfeed".to_string(),
            product_id: "0x0803".to_string(),
            product_string: None,
            manufacturer_string: None,
            usage_page: 0xff60,
            interface_number: 0,
        }]);
        catalog.select(path);
        catalog
    }

    #[test]
    fn test_begin_without_selection() {
        let mut controller = DispatchController::new();
        let catalog = DeviceCatalog::new();
        let registry = ListenerRegistry::new();

        let err = controller.begin(&catalog, &registry, "01 02").unwrap_err();
        assert!(matches!(err, SessionError::SelectionMissing));
        assert!(!controller.is_dispatching());
        assert_eq!(controller.state(&catalog), DispatchState::Idle);
    }

    #[test]
    fn test_begin_rejects_bad_command_text() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let registry = ListenerRegistry::new();

        assert!(matches!(
            controller.begin(&catalog, &registry, "  "),
            Err(SessionError::NoCommand)
        ));
        assert!(matches!(
            controller.begin(&catalog, &registry, "ZZ"),
            Err(SessionError::InvalidHex { .. })
        ));
        assert_eq!(controller.state(&catalog), DispatchState::Ready);
    }

    #[test]
    fn test_begin_produces_ticket_and_serializes() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let registry = ListenerRegistry::new();

        let ticket = controller.begin(&catalog, &registry, "01 02").unwrap();
        assert_eq!(ticket.path, "dev-1");
        assert_eq!(ticket.frame, vec![0x01, 0x02]);
        assert!(ticket.needs_listener);
        assert_eq!(controller.state(&catalog), DispatchState::Dispatching);

        // Second send while one is outstanding is rejected
        assert!(matches!(
            controller.begin(&catalog, &registry, "03"),
            Err(SessionError::DispatchBusy)
        ));
    }

    #[test]
    fn test_known_listener_skips_start() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let mut registry = ListenerRegistry::new();
        registry.mark_started("dev-1");

        let ticket = controller.begin(&catalog, &registry, "01").unwrap();
        assert!(!ticket.needs_listener);
    }

    #[test]
    fn test_complete_success_logs_response() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let mut registry = ListenerRegistry::new();
        let mut log = SessionLog::new();

        controller.begin(&catalog, &registry, "01").unwrap();
        controller.complete(
            DispatchReport {
                path: "dev-1".to_string(),
                listener_started: true,
                outcome: Ok(vec![0xAA]),
            },
            &mut registry,
            &mut log,
        );

        assert!(!controller.is_dispatching());
        assert!(registry.has_listener("dev-1"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].category, LogCategory::Info);
        assert_eq!(log.entries()[0].message, "Response: AA");
    }

    #[test]
    fn test_complete_empty_response_logs_nothing() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let mut registry = ListenerRegistry::new();
        let mut log = SessionLog::new();

        controller.begin(&catalog, &registry, "01").unwrap();
        controller.complete(
            DispatchReport {
                path: "dev-1".to_string(),
                listener_started: true,
                outcome: Ok(Vec::new()),
            },
            &mut registry,
            &mut log,
        );

        assert!(log.is_empty());
        assert!(registry.has_listener("dev-1"));
    }

    #[test]
    fn test_complete_listener_failure_leaves_registry_unmarked() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let mut registry = ListenerRegistry::new();
        let mut log = SessionLog::new();

        controller.begin(&catalog, &registry, "01").unwrap();
        controller.complete(
            DispatchReport {
                path: "dev-1".to_string(),
                listener_started: false,
                outcome: Err(SessionError::ListenerStart("open failed".to_string())),
            },
            &mut registry,
            &mut log,
        );

        assert!(!registry.has_listener("dev-1"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].category, LogCategory::Error);
    }

    #[test]
    fn test_complete_dispatch_failure_removes_listener() {
        let mut controller = DispatchController::new();
        let catalog = catalog_with("dev-1");
        let mut registry = ListenerRegistry::new();
        registry.mark_started("dev-1");
        let mut log = SessionLog::new();

        controller.begin(&catalog, &registry, "01").unwrap();
        controller.complete(
            DispatchReport {
                path: "dev-1".to_string(),
                listener_started: false,
                outcome: Err(SessionError::Dispatch("device unplugged".to_string())),
            },
            &mut registry,
            &mut log,
        );

        // Next send re-requests the listener
        assert!(!registry.has_listener("dev-1"));
        assert_eq!(log.entries()[0].category, LogCategory::Error);

        let ticket = controller.begin(&catalog, &registry, "01").unwrap();
        assert!(ticket.needs_listener);
    }
}

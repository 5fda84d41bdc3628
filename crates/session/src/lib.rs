//! Session core for the HID control panel
//!
//! This crate holds the client-side session and command-dispatch logic:
//! the device catalog and selection state, strict hex command encoding,
//! listener lifecycle bookkeeping, the dispatch state machine, the
//! operator-facing session log, and the channel boundary behind which the
//! backend does all actual device I/O.

pub mod bridge;
pub mod catalog;
pub mod descriptor;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod events;
pub mod listeners;
pub mod log;
pub mod logging;

pub use bridge::{BackendBridge, BackendCommand, BackendEvent, BackendWorker, create_backend_bridge};
pub use catalog::DeviceCatalog;
pub use descriptor::DeviceDescriptor;
pub use dispatch::{DispatchController, DispatchReport, DispatchState, DispatchTicket};
pub use error::{Result, SessionError};
pub use events::{EventBridge, SessionEvent};
pub use listeners::ListenerRegistry;
pub use log::{LogCategory, LogEntry, SessionLog};
pub use logging::setup_logging;

/// One owned session: catalog, listener registry, log, and dispatch state.
///
/// Constructed once at startup and owned by a single task; all mutation
/// goes through that task. Backend conversations run elsewhere and report
/// back through [`DispatchReport`] and [`SessionEvent`] values.
#[derive(Debug, Default)]
pub struct Session {
    catalog: DeviceCatalog,
    registry: ListenerRegistry,
    log: SessionLog,
    controller: DispatchController,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a successful scan: replace the catalog and log the count
    pub fn apply_scan(&mut self, devices: Vec<DeviceDescriptor>) -> usize {
        let count = self.catalog.apply_scan(devices);
        self.log.append(
            LogCategory::Info,
            format!("Scan complete: {} device(s)", count),
        );
        count
    }

    /// Record a failed scan. The catalog is left untouched.
    pub fn scan_failed(&mut self, err: &SessionError) {
        self.log.append(LogCategory::Error, err.to_string());
    }

    /// Select a device by path (no-op for unknown paths)
    pub fn select(&mut self, path: &str) {
        self.catalog.select(path);
    }

    /// Validate a send and hand back the ticket for [`dispatch::execute`].
    ///
    /// On success the outgoing frame is logged; on rejection exactly one
    /// error entry is logged and no backend call is made.
    pub fn begin_dispatch(&mut self, text: &str) -> Result<DispatchTicket> {
        match self.controller.begin(&self.catalog, &self.registry, text) {
            Ok(ticket) => {
                self.log.append(
                    LogCategory::Outgoing,
                    encoder::format_frame(&ticket.frame),
                );
                Ok(ticket)
            }
            Err(err) => {
                self.log.append(LogCategory::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Apply a finished dispatch
    pub fn finish_dispatch(&mut self, report: DispatchReport) {
        self.controller
            .complete(report, &mut self.registry, &mut self.log);
    }

    /// Record an asynchronously pushed inbound frame
    pub fn record_inbound(&mut self, data: &[u8]) {
        self.log
            .append(LogCategory::Incoming, encoder::format_frame(data));
    }

    /// Clear the session log. Catalog, registry, and any in-flight
    /// dispatch are unaffected.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.controller.state(&self.catalog)
    }
}

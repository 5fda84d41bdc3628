//! Terminal User Interface
//!
//! Interactive control panel over the session core and the HID backend.
//!
//! # Layout
//!
//! - **Top Panel**: Status bar with device count, selection, and dispatch state
//! - **Center Panel**: Two-pane view with devices (left) and session log (right)
//! - **Command Line**: Hex command input for the selected device
//! - **Bottom Panel**: Help bar with context-sensitive keybindings
//!
//! # Keybindings
//!
//! - `Tab`: Switch between device and log pane
//! - `j/k` or arrow keys: Navigate lists
//! - `Enter`: Select device under cursor
//! - `r`/`s`: Rescan devices
//! - `i`/`e`: Edit the hex command line
//! - `c`: Clear the session log
//! - `q`: Quit (with confirmation)
//! - `?`: Show help

pub mod app;
pub mod events;
pub mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::Event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use session::{
    BackendBridge, DeviceDescriptor, DispatchReport, EventBridge, SessionError, SessionEvent,
    dispatch,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub use app::{App, AppAction, InputMode};
pub use events::EventHandler;

/// Messages sent from async tasks to the TUI
#[derive(Debug)]
pub enum TuiMessage {
    /// Device scan finished
    ScanCompleted(Result<Vec<DeviceDescriptor>, SessionError>),
    /// Command dispatch finished
    DispatchFinished(DispatchReport),
}

/// TUI runner that manages the terminal and event loop
pub struct TuiRunner {
    /// Terminal instance
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    app: App,
    /// Event handler
    event_handler: EventHandler,
    /// Backend channel boundary
    bridge: Arc<BackendBridge>,
    /// Channel for receiving messages from async tasks
    message_rx: mpsc::Receiver<TuiMessage>,
    /// Channel for sending messages from async tasks
    message_tx: mpsc::Sender<TuiMessage>,
    /// Inbound frames from the push subscription
    inbound_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Keeps the push subscription alive for the lifetime of the TUI
    _event_bridge: EventBridge,
}

impl TuiRunner {
    /// Create a new TUI runner and take over the terminal
    pub fn new(bridge: Arc<BackendBridge>, mut event_bridge: EventBridge) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        let (message_tx, message_rx) = mpsc::channel(100);

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        event_bridge.subscribe(inbound_tx);

        Ok(Self {
            terminal,
            app: App::new(),
            event_handler: EventHandler::new(),
            bridge,
            message_rx,
            message_tx,
            inbound_rx,
            _event_bridge: event_bridge,
        })
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting TUI");

        self.terminal.draw(|f| ui::render(f, &self.app))?;

        loop {
            // Process any pending messages from async tasks
            while let Ok(msg) = self.message_rx.try_recv() {
                self.handle_message(msg);
            }

            // Record pushed inbound frames in arrival order
            while let Ok(event) = self.inbound_rx.try_recv() {
                let SessionEvent::Inbound(data) = event;
                self.app.session.record_inbound(&data);
            }

            // Poll for terminal events
            if let Some(event) = self.event_handler.poll()? {
                let action = match event {
                    Event::Key(key) => self.event_handler.handle_key(&mut self.app, key),
                    Event::Resize(_, _) => AppAction::None,
                    _ => AppAction::None,
                };

                self.handle_action(action);
            }

            if self.app.should_quit {
                break;
            }

            self.terminal.draw(|f| ui::render(f, &self.app))?;
        }

        info!("TUI shutting down");
        Ok(())
    }

    /// Handle TUI message from async task
    fn handle_message(&mut self, msg: TuiMessage) {
        match msg {
            TuiMessage::ScanCompleted(Ok(devices)) => {
                let count = self.app.session.apply_scan(devices);
                self.app.clamp_device_cursor();
                self.app.scanning = false;
                self.app.set_status(format!("{} device(s) found", count));
            }
            TuiMessage::ScanCompleted(Err(e)) => {
                self.app.session.scan_failed(&e);
                self.app.scanning = false;
                self.app.set_status("Scan failed".to_string());
            }
            TuiMessage::DispatchFinished(report) => {
                self.app.session.finish_dispatch(report);
            }
        }
    }

    /// Handle an application action
    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::None => {}
            AppAction::Quit => {
                self.app.should_quit = true;
            }
            AppAction::Scan => {
                if self.app.scanning {
                    return;
                }
                self.app.scanning = true;
                self.app.set_status("Scanning...".to_string());
                self.spawn_scan();
            }
            AppAction::Send(text) => match self.app.session.begin_dispatch(&text) {
                Ok(ticket) => {
                    self.spawn_dispatch(ticket);
                }
                Err(e) => {
                    self.app.set_status(e.to_string());
                }
            },
        }
    }

    /// Spawn async task to scan devices
    fn spawn_scan(&self) {
        let bridge = self.bridge.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let result = bridge.scan_devices().await;
            let _ = tx.send(TuiMessage::ScanCompleted(result)).await;
        });
    }

    /// Spawn async task to execute a dispatch ticket
    fn spawn_dispatch(&self, ticket: session::DispatchTicket) {
        let bridge = self.bridge.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let report = dispatch::execute(&bridge, ticket).await;
            let _ = tx.send(TuiMessage::DispatchFinished(report)).await;
        });
    }
}

impl Drop for TuiRunner {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the TUI application
///
/// Takes over the terminal, runs the main event loop, and restores the
/// terminal on exit. The push subscription is held for the whole run and
/// released when the runner drops.
pub async fn run(bridge: Arc<BackendBridge>, event_bridge: EventBridge) -> Result<()> {
    let mut runner = TuiRunner::new(bridge, event_bridge)?;
    runner.run().await
}

//! TUI application state
//!
//! Owns the session and everything the renderer needs: device cursor,
//! pane focus, the command input buffer, and popup dialogs.

use session::{DeviceDescriptor, DispatchState, Session};

/// Active pane in the two-pane layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    /// Device list pane (left)
    Devices,
    /// Session log pane (right)
    Log,
}

/// Input mode for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Editing the hex command line
    EditCommand,
    /// Showing help overlay
    Help,
    /// Confirm quit dialog
    ConfirmQuit,
}

/// User action to be processed by the main loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// No action
    None,
    /// Quit the application
    Quit,
    /// Rescan the device catalog
    Scan,
    /// Dispatch the given command text to the selected device
    Send(String),
}

/// Main application state
pub struct App {
    /// Session core: catalog, listeners, dispatch state, log
    pub session: Session,
    /// Currently active pane
    pub active_pane: ActivePane,
    /// Device cursor index
    pub selected_device: usize,
    /// Log scroll offset in lines from the tail (0 follows the tail)
    pub log_offset: usize,
    /// Hex command input buffer
    pub command_input: String,
    /// Current input mode
    pub input_mode: InputMode,
    /// Status message to display
    pub status_message: Option<String>,
    /// Scan currently in flight
    pub scanning: bool,
    /// Should quit flag
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new application state
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            active_pane: ActivePane::Devices,
            selected_device: 0,
            log_offset: 0,
            command_input: String::new(),
            input_mode: InputMode::Normal,
            status_message: None,
            scanning: false,
            should_quit: false,
        }
    }

    /// Set the status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    /// Toggle between the device and log panes
    pub fn toggle_pane(&mut self) {
        self.active_pane = match self.active_pane {
            ActivePane::Devices => ActivePane::Log,
            ActivePane::Log => ActivePane::Devices,
        };
    }

    /// Navigate up in the active pane
    pub fn navigate_up(&mut self) {
        match self.active_pane {
            ActivePane::Devices => {
                self.selected_device = self.selected_device.saturating_sub(1);
            }
            ActivePane::Log => {
                let max = self.session.log().len().saturating_sub(1);
                if self.log_offset < max {
                    self.log_offset += 1;
                }
            }
        }
    }

    /// Navigate down in the active pane
    pub fn navigate_down(&mut self) {
        match self.active_pane {
            ActivePane::Devices => {
                let count = self.session.catalog().devices().len();
                if count > 0 && self.selected_device < count - 1 {
                    self.selected_device += 1;
                }
            }
            ActivePane::Log => {
                self.log_offset = self.log_offset.saturating_sub(1);
            }
        }
    }

    /// Device under the cursor, if any
    pub fn device_under_cursor(&self) -> Option<&DeviceDescriptor> {
        self.session.catalog().devices().get(self.selected_device)
    }

    /// Select the device under the cursor
    pub fn select_under_cursor(&mut self) {
        let Some(device) = self.device_under_cursor() else {
            return;
        };
        let path = device.path.clone();
        let label = device.label();
        self.session.select(&path);
        self.set_status(format!("Selected {}", label));
    }

    /// Clamp the device cursor after the catalog changed
    pub fn clamp_device_cursor(&mut self) {
        let count = self.session.catalog().devices().len();
        if count == 0 {
            self.selected_device = 0;
        } else if self.selected_device >= count {
            self.selected_device = count - 1;
        }
    }

    /// Enter command edit mode
    pub fn start_edit_command(&mut self) {
        self.input_mode = InputMode::EditCommand;
    }

    /// Append a character to the command input
    pub fn handle_command_input(&mut self, c: char) {
        self.command_input.push(c);
    }

    /// Remove the last character from the command input
    pub fn handle_command_backspace(&mut self) {
        self.command_input.pop();
    }

    /// Confirm the command input and request a dispatch
    pub fn confirm_command(&mut self) -> AppAction {
        self.input_mode = InputMode::Normal;
        AppAction::Send(self.command_input.clone())
    }

    /// Show the help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Show the quit confirmation dialog
    pub fn show_quit_confirm(&mut self) {
        self.input_mode = InputMode::ConfirmQuit;
    }

    /// Confirm quit
    pub fn confirm_quit(&mut self) {
        self.should_quit = true;
    }

    /// Cancel the current dialog or input and return to normal mode
    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Clear the session log and reset the log scroll
    pub fn clear_log(&mut self) {
        self.session.clear_log();
        self.log_offset = 0;
        self.set_status("Log cleared".to_string());
    }

    /// Current dispatch state for the header
    pub fn dispatch_state(&self) -> DispatchState {
        self.session.dispatch_state()
    }
}

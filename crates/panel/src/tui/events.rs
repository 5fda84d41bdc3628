//! TUI event handling
//!
//! Handles keyboard input using crossterm and dispatches actions to the application.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use super::app::{App, AppAction, InputMode};

/// Event handler for TUI input
pub struct EventHandler {
    /// Tick rate for polling events
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Poll for next event
    ///
    /// Returns Some(Event) if an event occurred, None if tick timeout elapsed.
    pub fn poll(&self) -> Result<Option<Event>> {
        if event::poll(self.tick_rate)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Handle a key event and return the resulting action
    pub fn handle_key(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match &app.input_mode {
            InputMode::Normal => self.handle_normal_mode(app, key),
            InputMode::EditCommand => self.handle_edit_command_mode(app, key),
            InputMode::Help => self.handle_help_mode(app, key),
            InputMode::ConfirmQuit => self.handle_confirm_quit_mode(app, key),
        }
    }

    /// Handle key events in normal navigation mode
    fn handle_normal_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            // Quit
            KeyCode::Char('q') => {
                app.show_quit_confirm();
                AppAction::None
            }
            // Ctrl+C for immediate quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => AppAction::Quit,

            // Navigation
            KeyCode::Tab => {
                app.toggle_pane();
                AppAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.navigate_up();
                AppAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.navigate_down();
                AppAction::None
            }

            // Actions
            KeyCode::Enter => {
                app.select_under_cursor();
                AppAction::None
            }
            KeyCode::Char('r') | KeyCode::Char('s') => AppAction::Scan,
            KeyCode::Char('i') | KeyCode::Char('e') => {
                app.start_edit_command();
                AppAction::None
            }
            KeyCode::Char('c') => {
                app.clear_log();
                AppAction::None
            }

            // Help
            KeyCode::Char('?') => {
                app.show_help();
                AppAction::None
            }

            _ => AppAction::None,
        }
    }

    /// Handle key events in command edit mode
    fn handle_edit_command_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => {
                app.cancel_input();
                AppAction::None
            }
            KeyCode::Enter => app.confirm_command(),
            KeyCode::Backspace => {
                app.handle_command_backspace();
                AppAction::None
            }
            KeyCode::Char(c) => {
                // Hex digits, whitespace, and the 0x prefix
                if c.is_ascii_hexdigit() || c == ' ' || c == 'x' || c == 'X' {
                    app.handle_command_input(c);
                }
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in help overlay mode
    fn handle_help_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q') => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in quit confirmation mode
    fn handle_confirm_quit_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_quit();
                AppAction::Quit
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }
}

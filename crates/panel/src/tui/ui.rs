//! TUI rendering with ratatui
//!
//! Renders the terminal user interface using ratatui widgets and layouts.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use session::{DispatchState, LogCategory};

use super::app::{ActivePane, App, InputMode};

/// Colors used in the UI
mod colors {
    use ratatui::style::Color;

    pub const SELECTED: Color = Color::Green;
    pub const LISTENING: Color = Color::Cyan;

    pub const LOG_INFO: Color = Color::White;
    pub const LOG_INCOMING: Color = Color::Green;
    pub const LOG_OUTGOING: Color = Color::Cyan;
    pub const LOG_ERROR: Color = Color::Red;

    pub const STATE_IDLE: Color = Color::Gray;
    pub const STATE_READY: Color = Color::Green;
    pub const STATE_DISPATCHING: Color = Color::Yellow;

    pub const ACTIVE_BORDER: Color = Color::Cyan;
    pub const INACTIVE_BORDER: Color = Color::Gray;

    pub const HIGHLIGHT_BG: Color = Color::DarkGray;
    pub const STATUS_BAR_BG: Color = Color::Blue;
    pub const HELP_BAR_BG: Color = Color::DarkGray;
}

/// Render the complete UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(10),   // Main content (two panes)
            Constraint::Length(3), // Command input
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_command_input(frame, app, chunks[2]);
    render_help_bar(frame, app, chunks[3]);

    match &app.input_mode {
        InputMode::Help => render_help_overlay(frame),
        InputMode::ConfirmQuit => render_quit_dialog(frame),
        InputMode::Normal | InputMode::EditCommand => {}
    }
}

/// Render the top status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (state_label, state_color) = match app.dispatch_state() {
        DispatchState::Idle => ("idle", colors::STATE_IDLE),
        DispatchState::Ready => ("ready", colors::STATE_READY),
        DispatchState::Dispatching => ("dispatching", colors::STATE_DISPATCHING),
    };

    let selected = app
        .session
        .catalog()
        .selected()
        .map(|d| d.label())
        .unwrap_or_else(|| "none".to_string());

    let scan_marker = if app.scanning { " | scanning..." } else { "" };

    let status_text = format!(
        " Devices: {} | Selected: {} | State: ",
        app.session.catalog().devices().len(),
        selected
    );

    let status_message = app
        .status_message
        .as_ref()
        .map(|m| format!(" | {}", m))
        .unwrap_or_default();

    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(status_text, Style::default().fg(Color::White)),
        Span::styled(state_label, Style::default().fg(state_color)),
        Span::styled(scan_marker, Style::default().fg(Color::Yellow)),
        Span::styled(status_message, Style::default().fg(Color::Yellow)),
    ]))
    .style(Style::default().bg(colors::STATUS_BAR_BG))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" HID Control Panel ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(paragraph, area);
}

/// Render the two-pane main content area
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45), // Device list
            Constraint::Percentage(55), // Session log
        ])
        .split(area);

    render_device_list(frame, app, chunks[0]);
    render_session_log(frame, app, chunks[1]);
}

/// Render the device list pane
fn render_device_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Devices;
    let border_color = if is_active {
        colors::ACTIVE_BORDER
    } else {
        colors::INACTIVE_BORDER
    };

    let selected_path = app.session.catalog().selected_path();

    let items: Vec<ListItem> = app
        .session
        .catalog()
        .devices()
        .iter()
        .map(|device| {
            let is_selected = selected_path == Some(device.path.as_str());
            let is_listening = app.session.registry().has_listener(&device.path);

            let marker = if is_selected { "[*]" } else { "[ ]" };
            let listen_marker = if is_listening { " [L]" } else { "" };

            let color = if is_selected {
                colors::SELECTED
            } else {
                Color::White
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(color)),
                Span::styled(device.label(), Style::default().fg(color)),
                Span::styled(listen_marker, Style::default().fg(colors::LISTENING)),
            ]))
        })
        .collect();

    let title = format!(" Devices ({}) ", app.session.catalog().devices().len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border_color)),
        )
        .highlight_style(
            Style::default()
                .bg(colors::HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.session.catalog().devices().is_empty() {
        state.select(Some(app.selected_device));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the session log pane
fn render_session_log(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Log;
    let border_color = if is_active {
        colors::ACTIVE_BORDER
    } else {
        colors::INACTIVE_BORDER
    };

    let entries = app.session.log().entries();
    // Window ending log_offset lines above the tail
    let visible_height = area.height.saturating_sub(2) as usize;
    let end = entries.len().saturating_sub(app.log_offset);
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = entries[start..end]
        .iter()
        .map(|entry| {
            let color = match entry.category {
                LogCategory::Info => colors::LOG_INFO,
                LogCategory::Incoming => colors::LOG_INCOMING,
                LogCategory::Outgoing => colors::LOG_OUTGOING,
                LogCategory::Error => colors::LOG_ERROR,
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp_display()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<5} ", entry.category.tag()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let title = if app.log_offset > 0 {
        format!(" Log ({}, -{} lines) ", entries.len(), app.log_offset)
    } else {
        format!(" Log ({}) ", entries.len())
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color)),
    );

    frame.render_widget(list, area);
}

/// Render the command input line
fn render_command_input(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::EditCommand;
    let border_color = if editing {
        colors::ACTIVE_BORDER
    } else {
        colors::INACTIVE_BORDER
    };

    let paragraph = Paragraph::new(app.command_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Command (hex bytes) ")
            .border_style(Style::default().fg(border_color)),
    );

    frame.render_widget(paragraph, area);

    if editing {
        frame.set_cursor_position(Position::new(
            area.x + 1 + app.command_input.len() as u16,
            area.y + 1,
        ));
    }
}

/// Render the bottom help bar
fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.input_mode {
        InputMode::Normal => {
            " Tab: pane | j/k: navigate | Enter: select | r: rescan | i: edit command | c: clear log | ?: help | q: quit"
        }
        InputMode::EditCommand => " Enter: send | Esc: cancel | Backspace: delete",
        InputMode::Help => " Esc/?: close help",
        InputMode::ConfirmQuit => " y: quit | n: cancel",
    };

    let paragraph = Paragraph::new(help_text)
        .style(Style::default().bg(colors::HELP_BAR_BG).fg(Color::White));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "Keybindings",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  Tab        Switch between device and log pane"),
        Line::from("  j/k, Up/Dn Navigate the active pane"),
        Line::from("  Enter      Select device under cursor"),
        Line::from("  r, s       Rescan devices"),
        Line::from("  i, e       Edit the hex command line"),
        Line::from("  c          Clear the session log"),
        Line::from("  q          Quit (with confirmation)"),
        Line::from(""),
        Line::from("Commands are whitespace-separated hex bytes,"),
        Line::from("e.g. \"00 C0 0A 00 00\". An optional 0x prefix"),
        Line::from("per byte is accepted."),
        Line::from(""),
        Line::from("The first listener for a device starts on the"),
        Line::from("first send; pushed frames appear in the log as"),
        Line::from("they arrive."),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Help "));
    frame.render_widget(paragraph, area);
}

/// Render the quit confirmation dialog
fn render_quit_dialog(frame: &mut Frame) {
    let area = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new("Quit? (y/n)")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Confirm "));
    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect using percentages of the available area
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

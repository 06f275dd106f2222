//! Application core — event loop, action dispatch, global keys.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hc3log_core::{ConnectionState, LogSession};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::LogScreen;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    session: LogSession,
    screen: LogScreen,
    running: bool,
    help_visible: bool,
    /// Set when the configuration is unusable; replaces the log screen.
    config_error: Option<String>,
    connection: ConnectionState,
    bridge_cancel: Option<CancellationToken>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(session: LogSession, config_error: Option<String>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            session,
            screen: LogScreen::new(),
            running: true,
            help_visible: false,
            config_error,
            connection: ConnectionState::Idle,
            bridge_cancel: None,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.screen.init(self.action_tx.clone())?;
        self.screen.set_focused(true);

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        if self.config_error.is_none() {
            self.spawn_bridge();
        }

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        if let Some(cancel) = &self.bridge_cancel {
            cancel.cancel();
        }
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Start (or restart) the background data bridge.
    fn spawn_bridge(&mut self) {
        if let Some(cancel) = self.bridge_cancel.take() {
            cancel.cancel();
        }
        let cancel = CancellationToken::new();
        self.bridge_cancel = Some(cancel.clone());
        tokio::spawn(spawn_data_bridge(
            self.session.clone(),
            self.action_tx.clone(),
            cancel,
        ));
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // While the screen is in an input mode (value filter, popup,
        // filter panel), it sees every key, including 'q'.
        if self.screen.captures_input() {
            return self.screen.handle_key_event(key);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::StreamState(state) => {
                self.connection = *state;
                self.screen.update(action)?;
            }

            Action::Reconnect => {
                if self.config_error.is_none()
                    && !matches!(
                        self.connection,
                        ConnectionState::Connecting | ConnectionState::Streaming
                    )
                {
                    debug!("reconnect requested");
                    self.spawn_bridge();
                }
            }

            Action::FetchDetails { event_type, id } => {
                // The screen shows the loading popup; the fetch runs here.
                self.screen.update(action)?;
                let session = self.session.clone();
                let tx = self.action_tx.clone();
                let event_type = event_type.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let result = session.fetch_details(&event_type, &id).await;
                    let _ = tx.send(match result {
                        Ok(body) => Action::DetailsLoaded(Arc::from(body.as_str())),
                        Err(e) => Action::DetailsFailed(e.to_string()),
                    });
                });
            }

            // Render is handled in the main loop, not here
            Action::Render | Action::Resize(..) => {}

            other => {
                if let Some(follow_up) = self.screen.update(other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // screen content
            Constraint::Length(1), // status bar
        ])
        .split(area);

        if let Some(message) = &self.config_error {
            render_config_error(frame, layout[0], message);
        } else {
            self.screen.render(frame, layout[0]);
        }

        self.render_status_bar(frame, layout[1]);

        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection = match self.connection {
            ConnectionState::Streaming => {
                Span::styled("\u{25cf} connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionState::Connecting => Span::styled(
                "\u{25d0} connecting",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            ConnectionState::Lost => {
                Span::styled("\u{25cb} lost", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionState::Idle => {
                Span::styled("\u{25cb} idle", Style::default().fg(theme::BORDER_GRAY))
            }
        };

        let hints = Span::styled(
            " \u{2502} s/t/i sort  a follow  f filters  / value  ? help  q quit",
            theme::key_hint(),
        );

        let line = Line::from(vec![Span::raw(" "), connection, hints]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let width = 58u16.min(area.width.saturating_sub(4));
        let height = 22u16.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let entry = |keys: &str, what: &str| {
            Line::from(vec![
                Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
                Span::styled(what.to_owned(), theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Table",
                Style::default().fg(theme::NEON_CYAN),
            )),
            entry("s / t / i", "Sort by type / time / id (repeat to flip)"),
            entry("a", "Toggle follow (auto-scroll)"),
            entry("j/k \u{2191}/\u{2193}", "Move selection"),
            entry("g / G", "Top / bottom"),
            entry("Enter", "Fetch details for selected event"),
            entry("y", "Show raw event JSON"),
            entry("c", "Clear the log"),
            Line::from(""),
            Line::from(Span::styled(
                "  Filters",
                Style::default().fg(theme::NEON_CYAN),
            )),
            entry("f", "Toggle filter panel"),
            entry("/", "Edit value filter (regex)"),
            entry("C", "Clear all filters"),
            Line::from(""),
            Line::from(Span::styled(
                "  Session",
                Style::default().fg(theme::NEON_CYAN),
            )),
            entry("r", "Reconnect after a lost stream"),
            entry("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "                        Esc or ? to close",
                theme::key_hint(),
            )),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}

/// Full-screen notice shown when credentials are missing or malformed.
fn render_config_error(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .title(" Configuration ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::ERROR_RED));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_owned(),
            Style::default().fg(theme::ERROR_RED),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Set HC3_HOST, HC3_USER, and HC3_PASSWORD (and optionally",
            theme::key_hint(),
        )),
        Line::from(Span::styled(
            "HC3_PROTOCOL), or fill in the config file, then restart.",
            theme::key_hint(),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}

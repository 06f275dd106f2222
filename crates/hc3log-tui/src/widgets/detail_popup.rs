//! Detail popup — the full resource behind an event, as ordered JSON.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::theme;

/// Centered popup showing a fetched resource. Starts in the loading
/// state; the fetch task fills in the body or the error.
pub struct DetailPopup {
    title: &'static str,
    body: Option<Arc<str>>,
    error: Option<String>,
    scroll: u16,
}

impl DetailPopup {
    pub fn loading() -> Self {
        Self {
            title: " Details ",
            body: None,
            error: None,
            scroll: 0,
        }
    }

    /// A popup that already has its content, e.g. the raw event JSON.
    pub fn with_body(title: &'static str, body: Arc<str>) -> Self {
        Self {
            title,
            body: Some(body),
            error: None,
            scroll: 0,
        }
    }

    pub fn set_body(&mut self, body: Arc<str>) {
        self.body = Some(body);
        self.error = None;
        self.scroll = 0;
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        let lines = self.body.as_deref().map_or(0, |b| b.lines().count());
        let max = u16::try_from(lines).unwrap_or(u16::MAX).saturating_sub(1);
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 72u16.min(area.width.saturating_sub(4));
        let height = 24u16.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let popup_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(self.title)
            .title_style(theme::title_style())
            .title_bottom(Line::from(vec![
                Span::styled(" j/k ", theme::key_hint_key()),
                Span::styled("scroll ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("close ", theme::key_hint()),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let paragraph = match (&self.body, &self.error) {
            (_, Some(error)) => Paragraph::new(Line::from(Span::styled(
                format!(" {error}"),
                Style::default().fg(theme::ERROR_RED),
            ))),
            (Some(body), None) => Paragraph::new(
                body.lines()
                    .map(|l| Line::from(Span::styled(l.to_owned(), theme::table_row())))
                    .collect::<Vec<_>>(),
            )
            .scroll((self.scroll, 0)),
            (None, None) => Paragraph::new(Line::from(Span::styled(
                " Loading\u{2026}",
                theme::key_hint(),
            ))),
        };
        frame.render_widget(paragraph, inner);
    }
}

//! Filter panel — checkbox lists for event types and ids.
//!
//! A plain widget owned by the log screen rather than a full component:
//! it borrows the store and filter engine for the duration of each key
//! press or render, so no state is duplicated.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use hc3log_core::{EventStore, FilterEngine};

use crate::theme;

/// Which checkbox list holds the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pane {
    #[default]
    Types,
    Ids,
}

#[derive(Default)]
pub struct FilterPanel {
    pane: Pane,
    cursor: usize,
}

impl FilterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press. Returns true when the filter changed and the
    /// visible set must be rebuilt.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        store: &EventStore,
        filter: &mut FilterEngine,
    ) -> bool {
        let count = match self.pane {
            Pane::Types => store.known_types().count(),
            Pane::Ids => store.known_ids().count(),
        };

        match key.code {
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::Types => Pane::Ids,
                    Pane::Ids => Pane::Types,
                };
                self.cursor = 0;
                false
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if count > 0 {
                    self.cursor = (self.cursor + 1).min(count - 1);
                }
                false
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => match self.pane {
                Pane::Types => {
                    if let Some(tag) = store.known_types().nth(self.cursor) {
                        let tag = tag.to_owned();
                        let visible = filter.is_type_visible(&tag);
                        filter.set_type_visible(&tag, !visible);
                        true
                    } else {
                        false
                    }
                }
                Pane::Ids => {
                    if let Some(id) = store.known_ids().nth(self.cursor) {
                        let id = id.to_owned();
                        let visible = filter.is_id_visible(&id);
                        filter.set_id_visible(&id, !visible);
                        true
                    } else {
                        false
                    }
                }
            },
            // Bulk toggles for the whole types list
            KeyCode::Char('a') => {
                filter.set_all_types_visible(store.known_types().map(str::to_owned), true);
                true
            }
            KeyCode::Char('n') => {
                filter.set_all_types_visible(store.known_types().map(str::to_owned), false);
                true
            }
            _ => false,
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        store: &EventStore,
        filter: &FilterEngine,
    ) {
        let block = Block::default()
            .title(" Filters ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Percentage(60), // types
            Constraint::Min(3),         // ids
            Constraint::Length(1),      // hints
        ])
        .split(inner);

        self.render_list(
            frame,
            layout[0],
            "Event types",
            self.pane == Pane::Types,
            store
                .known_types()
                .map(|t| (display_name(t).to_owned(), filter.is_type_visible(t))),
        );
        self.render_list(
            frame,
            layout[1],
            "IDs",
            self.pane == Pane::Ids,
            store
                .known_ids()
                .map(|id| (id.to_owned(), filter.is_id_visible(id))),
        );

        let hints = Line::from(vec![
            Span::styled(" Spc ", theme::key_hint_key()),
            Span::styled("toggle ", theme::key_hint()),
            Span::styled("Tab ", theme::key_hint_key()),
            Span::styled("pane ", theme::key_hint()),
            Span::styled("a/n ", theme::key_hint_key()),
            Span::styled("all/none", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        active: bool,
        entries: impl Iterator<Item = (String, bool)>,
    ) {
        let mut lines = vec![Line::from(Span::styled(
            format!(" {title}"),
            if active {
                theme::title_style()
            } else {
                theme::key_hint()
            },
        ))];

        let height = area.height.saturating_sub(1) as usize;
        // Keep the cursor in view by sliding the window.
        let skip = if active {
            self.cursor.saturating_sub(height.saturating_sub(1))
        } else {
            0
        };

        for (index, (label, visible)) in entries.enumerate().skip(skip).take(height) {
            let mark = if visible { "[x]" } else { "[ ]" };
            let style = if active && index == self.cursor {
                theme::table_selected()
            } else if visible {
                theme::table_row()
            } else {
                theme::key_hint()
            };
            lines.push(Line::from(Span::styled(
                format!(" {mark} {label}"),
                style,
            )));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }
}

/// Type tags are filtered by their full name but listed without the
/// redundant `Event` suffix.
fn display_name(tag: &str) -> &str {
    tag.strip_suffix("Event").unwrap_or(tag)
}

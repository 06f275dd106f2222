//! Log screen — the live event table with sorting, filtering, and the
//! details popup. Owns the event store and filter engine; every mutation
//! arrives as an [`Action`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use hc3log_core::{
    ConnectionState, EventRecord, EventStore, FilterEngine, RenderPlan, SortColumn, SortDirection,
    SortState, sort_events, view,
};

use crate::action::Action;
use crate::component::Component;
use crate::screens::filters::FilterPanel;
use crate::theme;
use crate::widgets::detail_popup::DetailPopup;

/// Keystrokes settle for this long before the value pattern is applied.
const PATTERN_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct LogScreen {
    focused: bool,
    store: EventStore,
    filter: FilterEngine,
    sort: SortState,
    auto_scroll: bool,
    /// Set by a sort-column change, consumed by the next rebuild.
    needs_sort: bool,
    /// Filtered (and sorted) view of the store.
    visible: Vec<Arc<EventRecord>>,
    table_state: TableState,
    connection: ConnectionState,
    last_error: Option<String>,

    // Value filter input line
    value_input: Input,
    value_editing: bool,
    pending_pattern: Option<Instant>,

    filter_panel: FilterPanel,
    filter_panel_open: bool,

    detail: Option<DetailPopup>,
    action_tx: Option<UnboundedSender<Action>>,
}

impl LogScreen {
    pub fn new() -> Self {
        Self {
            focused: true,
            store: EventStore::new(),
            filter: FilterEngine::new(),
            sort: SortState::default(),
            auto_scroll: true,
            needs_sort: true,
            visible: Vec::new(),
            table_state: TableState::default(),
            connection: ConnectionState::Idle,
            last_error: None,
            value_input: Input::default(),
            value_editing: false,
            pending_pattern: None,
            filter_panel: FilterPanel::new(),
            filter_panel_open: false,
            detail: None,
            action_tx: None,
        }
    }

    /// Rebuild the visible set from scratch: filter everything, then sort.
    /// The selected row is re-anchored by record identity so the content
    /// under the cursor does not jump.
    fn rebuild(&mut self) {
        let anchor = self
            .table_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .cloned();

        self.visible = self
            .store
            .all()
            .iter()
            .filter(|r| self.filter.matches(r))
            .cloned()
            .collect();
        sort_events(&mut self.visible, self.sort);
        self.needs_sort = false;

        if self.auto_scroll {
            self.select_tail();
        } else if let Some(anchor) = anchor {
            let index = self
                .visible
                .iter()
                .position(|r| Arc::ptr_eq(r, &anchor));
            self.table_state.select(index.or_else(|| {
                if self.visible.is_empty() {
                    None
                } else {
                    Some(self.visible.len() - 1)
                }
            }));
        }
    }

    fn select_tail(&mut self) {
        if self.visible.is_empty() {
            self.table_state.select(None);
        } else {
            // With descending time sort the newest row is at the top.
            let tail = if self.sort.column == SortColumn::Time
                && self.sort.direction == SortDirection::Desc
            {
                0
            } else {
                self.visible.len() - 1
            };
            self.table_state.select(Some(tail));
        }
    }

    fn ingest(&mut self, record: &Arc<EventRecord>) {
        let appended = self.store.append(EventRecord::clone(record));
        if let Some(new_type) = &appended.new_type {
            // Unfamiliar event types stay hidden until opted into.
            self.filter.register_type(new_type);
        }

        match view::plan(true, self.auto_scroll, self.needs_sort) {
            RenderPlan::FullRender => self.rebuild(),
            RenderPlan::Append => {
                if self.filter.matches(&appended.record) {
                    self.visible.push(appended.record);
                    if self.auto_scroll {
                        self.select_tail();
                    }
                }
            }
        }
    }

    fn apply_pattern(&mut self) {
        self.filter.set_pattern(self.value_input.value());
        self.pending_pattern = None;
        self.rebuild();
    }

    /// Whether the screen currently consumes every key press (value
    /// filter editing, filter panel, or the details popup).
    pub fn captures_input(&self) -> bool {
        self.value_editing || self.filter_panel_open || self.detail.is_some()
    }

    fn selected_record(&self) -> Option<&Arc<EventRecord>> {
        self.table_state.selected().and_then(|i| self.visible.get(i))
    }

    fn move_selection(&mut self, delta: i64) {
        if self.visible.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i64;
        let max = (self.visible.len() - 1) as i64;
        let next = (current + delta).clamp(0, max);
        self.table_state.select(Some(next as usize));
        // Manual movement implies the user wants to stay put.
        self.auto_scroll = false;
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('t') => Some(Action::SortBy(SortColumn::Time)),
            KeyCode::Char('s') => Some(Action::SortBy(SortColumn::Type)),
            KeyCode::Char('i') => Some(Action::SortBy(SortColumn::Id)),
            KeyCode::Char('a') => Some(Action::ToggleAutoScroll),
            KeyCode::Char('f') => Some(Action::ToggleFilterPanel),
            KeyCode::Char('/') => Some(Action::OpenValueFilter),
            KeyCode::Char('c') => Some(Action::ClearLog),
            KeyCode::Char('C') => Some(Action::ClearFilters),
            KeyCode::Char('r') => Some(Action::Reconnect),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('g') => Some(Action::ScrollToTop),
            KeyCode::Char('G') => Some(Action::ScrollToBottom),
            KeyCode::Enter => {
                let record = self.selected_record()?;
                let id = record.row.id.clone()?;
                Some(Action::FetchDetails {
                    event_type: record.type_tag().to_owned(),
                    id,
                })
            }
            // Terminal clipboards vary, so the raw JSON is shown in a
            // popup for manual selection rather than copied directly.
            KeyCode::Char('y') => {
                let record = self.selected_record()?;
                Some(Action::ShowEventJson(Arc::from(
                    record.pretty_json().as_str(),
                )))
            }
            _ => None,
        }
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from(self.column_title("Event", SortColumn::Type)),
            Cell::from(self.column_title("Time", SortColumn::Time)),
            Cell::from(self.column_title("ID", SortColumn::Id)),
            Cell::from("Value"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .visible
            .iter()
            .map(|record| {
                let row = &record.row;
                Row::new(vec![
                    Cell::from(row.display_type.clone()).style(theme::table_row()),
                    Cell::from(row.time.clone())
                        .style(Style::default().fg(theme::ELECTRIC_YELLOW)),
                    Cell::from(row.id_text().to_owned()).style(theme::table_row()),
                    Cell::from(row.short_value.text.clone())
                        .style(theme::value_cell(row.short_value.tone)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(26),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn column_title(&self, label: &str, column: SortColumn) -> String {
        if self.sort.column == column {
            let arrow = match self.sort.direction {
                SortDirection::Asc => "\u{2191}",
                SortDirection::Desc => "\u{2193}",
            };
            format!("{label} {arrow}")
        } else {
            label.to_owned()
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let connection = match self.connection {
            ConnectionState::Streaming => {
                Span::styled("\u{25cf} LIVE", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionState::Connecting => Span::styled(
                "\u{25d0} connecting",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            ConnectionState::Lost => Span::styled(
                "\u{25cb} Connection Lost \u{2014} press r to reconnect",
                Style::default().fg(theme::ERROR_RED),
            ),
            ConnectionState::Idle => {
                Span::styled("\u{25cb} idle", Style::default().fg(theme::BORDER_GRAY))
            }
        };

        let mut spans = vec![Span::raw(" "), connection];

        if let Some(error) = &self.last_error {
            spans.push(Span::styled(
                format!("  {error}"),
                Style::default().fg(theme::ERROR_RED),
            ));
        }

        let scroll = if self.auto_scroll { "on" } else { "off" };
        spans.push(Span::styled(
            format!("  auto-scroll: {scroll}"),
            theme::key_hint(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_value_filter(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled("  value filter: ", theme::key_hint())];
        if self.value_editing {
            spans.push(Span::styled(
                format!("{}\u{2588}", self.value_input.value()),
                Style::default().fg(theme::NEON_CYAN),
            ));
        } else if !self.value_input.value().is_empty() {
            spans.push(Span::styled(
                self.value_input.value().to_owned(),
                Style::default().fg(theme::NEON_CYAN),
            ));
        } else {
            spans.push(Span::styled("(none)", theme::key_hint()));
        }
        if self.filter.pattern_error() {
            spans.push(Span::styled(
                "  [invalid regex]",
                Style::default().fg(theme::ERROR_RED),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Component for LogScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Popup, filter panel, and input line take precedence over table keys.
        if let Some(popup) = &mut self.detail {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                    return Ok(Some(Action::CloseDetails));
                }
                KeyCode::Char('j') | KeyCode::Down => popup.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => popup.scroll_up(),
                _ => {}
            }
            return Ok(None);
        }

        if self.value_editing {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => return Ok(Some(Action::CloseValueFilter)),
                _ => {
                    self.value_input
                        .handle_event(&crossterm::event::Event::Key(key));
                    self.pending_pattern = Some(Instant::now());
                    return Ok(None);
                }
            }
        }

        if self.filter_panel_open {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('f')) {
                return Ok(Some(Action::ToggleFilterPanel));
            }
            if self
                .filter_panel
                .handle_key(key, &self.store, &mut self.filter)
            {
                self.rebuild();
            }
            return Ok(None);
        }

        Ok(self.handle_table_key(key))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::EventIngested(record) => self.ingest(record),

            Action::StreamState(state) => {
                self.connection = *state;
                if *state == ConnectionState::Streaming {
                    self.last_error = None;
                }
            }
            Action::StreamError(message) => {
                self.last_error = Some(message.clone());
            }

            Action::SortBy(column) => {
                self.sort.activate(*column);
                self.needs_sort = true;
                self.rebuild();
            }
            Action::ToggleAutoScroll => {
                self.auto_scroll = !self.auto_scroll;
                if self.auto_scroll {
                    self.select_tail();
                }
            }
            Action::ScrollDown => self.move_selection(1),
            Action::ScrollUp => self.move_selection(-1),
            Action::PageDown => self.move_selection(10),
            Action::PageUp => self.move_selection(-10),
            Action::ScrollToTop => {
                if !self.visible.is_empty() {
                    self.table_state.select(Some(0));
                    self.auto_scroll = false;
                }
            }
            Action::ScrollToBottom => {
                if !self.visible.is_empty() {
                    self.table_state.select(Some(self.visible.len() - 1));
                }
            }

            Action::ClearLog => {
                self.store.clear();
                // The store forgot its ids, so stale deny entries would
                // silently hide any id that re-appears.
                self.filter.reset_ids();
                self.visible.clear();
                self.table_state.select(None);
            }
            Action::ClearFilters => {
                self.filter.clear();
                self.value_input.reset();
                self.pending_pattern = None;
                self.rebuild();
            }
            Action::ToggleFilterPanel => {
                self.filter_panel_open = !self.filter_panel_open;
            }
            Action::OpenValueFilter => {
                self.value_editing = true;
            }
            Action::CloseValueFilter => {
                self.value_editing = false;
                self.apply_pattern();
            }

            Action::FetchDetails { .. } => {
                self.detail = Some(DetailPopup::loading());
            }
            Action::ShowEventJson(body) => {
                self.detail = Some(DetailPopup::with_body(" Event JSON ", Arc::clone(body)));
            }
            Action::DetailsLoaded(body) => {
                if let Some(popup) = &mut self.detail {
                    popup.set_body(Arc::clone(body));
                }
            }
            Action::DetailsFailed(message) => {
                if let Some(popup) = &mut self.detail {
                    popup.set_error(message.clone());
                }
            }
            Action::CloseDetails => {
                self.detail = None;
            }

            Action::Tick => {
                // Debounced value-pattern application.
                if let Some(since) = self.pending_pattern {
                    if since.elapsed() >= PATTERN_DEBOUNCE {
                        self.apply_pattern();
                    }
                }
            }

            _ => {}
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(
                " Events ({} shown / {} total) ",
                self.visible.len(),
                self.store.len()
            ))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (table_area, panel_area) = if self.filter_panel_open {
            let chunks =
                Layout::horizontal([Constraint::Min(40), Constraint::Length(34)]).split(inner);
            (chunks[0], Some(chunks[1]))
        } else {
            (inner, None)
        };

        let layout = Layout::vertical([
            Constraint::Length(1), // status line
            Constraint::Min(1),    // table
            Constraint::Length(1), // value filter
        ])
        .split(table_area);

        self.render_status(frame, layout[0]);
        self.render_table(frame, layout[1]);
        self.render_value_filter(frame, layout[2]);

        if let Some(panel_area) = panel_area {
            self.filter_panel
                .render(frame, panel_area, &self.store, &self.filter);
        }

        if let Some(popup) = &self.detail {
            popup.render(frame, area);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

use crate::{
    data::{Cell, Row},
    detail::RowDetail,
    filter::{SearchAction, SearchBar},
    float::Float,
    hint::Shortcut,
    loader::{LoadEvent, LoadMode, LoadState, Pipeline, Poller, spawn_once},
    loading::LoadingFloat,
    terminal_check::{draw_too_small_warning, is_too_small},
    theme::Theme,
    view::{PageInfo, ViewState, Visible},
};
use anyhow::Result;
use ratatui::{
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    layout::{Constraint, Layout, Rect},
    prelude::*,
    widgets::{self, Block, BorderType, Borders, Paragraph, TableState},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::info;
use unicode_width::UnicodeWidthStr;

/// Column widths are weighted by content, capped so one long answer
/// cannot starve the others.
const MAX_COLUMN_WEIGHT: u16 = 40;

/// Who produces load events for the dashboard.
enum Loader {
    Once {
        pipeline: Arc<Pipeline>,
        tx: UnboundedSender<LoadEvent>,
    },
    Polling(Poller),
}

pub struct App {
    theme: Theme,
    title: String,
    source: String,
    load: LoadState,
    view: ViewState,
    rx: UnboundedReceiver<LoadEvent>,
    loader: Loader,
    focused_col: usize,
    selected: usize,
    search: SearchBar,
    loading_float: Option<Float<LoadingFloat>>,
    detail_float: Option<Float<RowDetail>>,
}

impl App {
    /// Start loading in the background and build the dashboard around it.
    /// Must be called inside a tokio runtime.
    pub fn start(title: impl Into<String>, pipeline: Arc<Pipeline>, mode: LoadMode, view: ViewState) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = pipeline.describe();
        let loader = match mode {
            LoadMode::Once => {
                spawn_once(pipeline.clone(), tx.clone());
                Loader::Once { pipeline, tx }
            }
            LoadMode::Polling(period) => Loader::Polling(Poller::spawn(pipeline, period, tx)),
        };
        Self {
            theme: Theme::Default,
            title: title.into(),
            loading_float: Some(Self::loading_float(&source)),
            source,
            load: LoadState::new(mode),
            view,
            rx,
            loader,
            focused_col: 0,
            selected: 0,
            search: SearchBar::default(),
            detail_float: None,
        }
    }

    fn loading_float(source: &str) -> Float<LoadingFloat> {
        Float::new_absolute(Box::new(LoadingFloat::new(source)), 64, 3)
    }

    pub fn run(
        &mut self,
        term: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        loop {
            self.drain_events();
            term.draw(|f| self.draw(f))?;
            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Release {
                    continue;
                }
                if !self.handle_key(k) {
                    break;
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Apply every load result that arrived since the last frame.
    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.on_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Only possible once the poller has exited.
                    break;
                }
            }
        }
    }

    fn on_event(&mut self, event: LoadEvent) {
        self.load.apply(event);
        if !self.load.is_loading() {
            self.loading_float = None;
        }
        let total = self.view.visible(self.load.rows()).total;
        self.view.reclamp(total);
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let columns = self.load.headers().len();
        self.focused_col = self.focused_col.min(columns.saturating_sub(1));
        let shown = self.view.visible(self.load.rows()).rows.len();
        self.selected = self.selected.min(shown.saturating_sub(1));
    }

    fn shutdown(&mut self) {
        if let Loader::Polling(poller) = &mut self.loader {
            poller.stop();
        }
        info!(cycles = self.load.cycles(), "dashboard closed");
    }

    /// Returns `false` when the dashboard should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Some(ref mut float) = self.detail_float {
            if float.handle_key_event(&key) {
                self.detail_float = None;
            }
            return true;
        }

        if self.search.active() {
            match self.search.handle_key(&key) {
                SearchAction::Exit => self.search.deactivate(),
                SearchAction::Changed => {
                    self.view.set_term(self.search.term());
                    self.selected = 0;
                }
                SearchAction::None => {}
            }
            return true;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        use KeyCode::*;
        match key.code {
            Char('q') | Esc => return false,
            Char('/') => self.search.activate(),
            Char('r') => self.reload(),
            _ if self.load.is_loading() => {}
            Left | Char('h') => self.focused_col = self.focused_col.saturating_sub(1),
            Right | Char('l') => {
                let last = self.load.headers().len().saturating_sub(1);
                self.focused_col = (self.focused_col + 1).min(last);
            }
            Char('s') => {
                if let Some(column) = self.load.headers().get(self.focused_col).cloned() {
                    self.view.on_sort(&column);
                    self.selected = 0;
                }
            }
            Down | Char('j') => {
                let shown = self.view.visible(self.load.rows()).rows.len();
                if self.selected + 1 < shown {
                    self.selected += 1;
                }
            }
            Up | Char('k') => self.selected = self.selected.saturating_sub(1),
            Char('n') | PageDown => {
                let total = self.view.visible(self.load.rows()).total;
                self.view.next_page(total);
                self.selected = 0;
            }
            Char('p') | PageUp => {
                self.view.prev_page();
                self.selected = 0;
            }
            Char('g') | Home => {
                self.view.first_page();
                self.selected = 0;
            }
            Char('G') | End => {
                let total = self.view.visible(self.load.rows()).total;
                self.view.last_page(total);
                self.selected = 0;
            }
            Enter => {
                let row = self
                    .view
                    .visible(self.load.rows())
                    .rows
                    .get(self.selected)
                    .map(|row| (*row).clone());
                if let Some(row) = row {
                    self.detail_float = Some(Float::new(Box::new(RowDetail::new(row)), 70, 60));
                }
            }
            _ => {}
        }
        true
    }

    /// Re-trigger a single-shot load. Polling reloads on its own.
    fn reload(&mut self) {
        let Loader::Once { pipeline, tx } = &self.loader else {
            return;
        };
        if self.load.is_loading() {
            return;
        }
        info!(source = %self.source, "manual reload");
        self.load.begin();
        spawn_once(pipeline.clone(), tx.clone());
        self.loading_float = Some(Self::loading_float(&self.source));
    }

    fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        if is_too_small(area) {
            draw_too_small_warning(f, area, &self.theme);
            return;
        }

        let (_title, shortcuts) = self.get_current_shortcuts();
        let hint_lines = crate::hint::create_shortcut_list(shortcuts, area.width);
        let hint_height = (hint_lines.len() as u16 + 2).clamp(3, 8);

        let banner = self.banner();
        let visible = self.view.visible(self.load.rows());

        let [title_area, bar_area, banner_area, table_area, pager_area, hint_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(u16::from(banner.is_some())),
                Constraint::Min(3),
                Constraint::Length(u16::from(visible.page.is_some())),
                Constraint::Length(hint_height),
            ])
            .areas(area);

        f.render_widget(
            Paragraph::new(self.title_line()).style(
                Style::default()
                    .fg(self.theme.title_color())
                    .add_modifier(Modifier::BOLD),
            ),
            title_area,
        );

        let [search_area, info_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(bar_area);
        self.search.draw(f, search_area);
        self.draw_info(f, info_area, visible.total);

        if let Some((text, color)) = banner {
            f.render_widget(
                Paragraph::new(text).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
                banner_area,
            );
        }

        self.draw_table(f, table_area, &visible);
        if let Some(ref page) = visible.page {
            f.render_widget(self.pager_line(page), pager_area);
        }

        self.draw_hint(f, hint_area);

        if let Some(ref mut float) = self.detail_float {
            float.draw(f, area, &self.theme);
        }
        if let Some(ref mut float) = self.loading_float {
            float.draw(f, area, &self.theme);
        }
    }

    fn title_line(&self) -> String {
        let mode = match self.load.mode() {
            LoadMode::Once => "Snapshot".to_string(),
            LoadMode::Polling(period) => format!("Live, every {}s", period.as_secs()),
        };
        let updated = self
            .load
            .last_loaded()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".into());
        format!(
            " {}  |  {}  |  {}  |  Updated: {}",
            self.title, self.source, mode, updated
        )
    }

    fn banner(&self) -> Option<(String, Color)> {
        if let Some(err) = self.load.error() {
            return Some((format!(" {err} Press r to retry."), self.theme.error_color()));
        }
        self.load
            .stale()
            .map(|stale| (format!(" {stale}"), self.theme.stale_color()))
    }

    fn draw_info(&self, f: &mut Frame, area: Rect, total: usize) {
        let sort = self.view.sort_config();
        let sort_text = match sort.key.as_deref() {
            Some(key) => format!("{key} {}", sort.order.arrow()),
            None => "none".into(),
        };
        let info = Paragraph::new(format!("Total Entries: {total}   |   Sort: {sort_text}"))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" Responses "),
            );
        f.render_widget(info, area);
    }

    fn draw_table(&self, f: &mut Frame, area: Rect, visible: &Visible<'_>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.border_color()));

        if visible.rows.is_empty() {
            let msg = if self.load.is_loading() { "" } else { "No data found" };
            let p = Paragraph::new(msg)
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.info_color()))
                .block(block);
            f.render_widget(p, area);
            return;
        }

        let headers = self.load.headers();
        let sort = self.view.sort_config();
        let header = widgets::Row::new(headers.iter().enumerate().map(|(i, h)| {
            let sorted = sort.is_sorted_by(h);
            let text = if sorted {
                format!("{h} {}", sort.order.arrow())
            } else {
                h.clone()
            };
            let bg = if i == self.focused_col {
                self.theme.focused_header_bg()
            } else if sorted {
                self.theme.sorted_header_bg()
            } else {
                self.theme.table_header_bg()
            };
            widgets::Cell::from(text).style(
                Style::default()
                    .fg(self.theme.table_header_fg())
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )
        }));

        let rows = visible.rows.iter().enumerate().map(|(i, row)| {
            let bg = if i % 2 == 0 {
                self.theme.table_row_even()
            } else {
                self.theme.table_row_odd()
            };
            widgets::Row::new(headers.iter().map(|h| self.cell(row, h))).style(Style::default().bg(bg))
        });

        let table = widgets::Table::new(rows, self.auto_widths(&visible.rows))
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg())
                    .fg(self.theme.selection_fg())
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn cell(&self, row: &Row, column: &str) -> widgets::Cell<'static> {
        match row.get(column) {
            Some(Cell::Plain(s)) => widgets::Cell::from(s.clone()),
            Some(Cell::Link(link)) => widgets::Cell::from(link.text().to_string()).style(
                Style::default()
                    .fg(self.theme.link_color())
                    .add_modifier(Modifier::UNDERLINED),
            ),
            None => widgets::Cell::default(),
        }
    }

    fn auto_widths(&self, rows: &[&Row]) -> Vec<Constraint> {
        self.load
            .headers()
            .iter()
            .map(|h| {
                let widest = rows
                    .iter()
                    .filter_map(|r| r.get(h))
                    .map(|c| c.display_text().width())
                    .max()
                    .unwrap_or(0)
                    .max(h.width() + 2);
                Constraint::Fill((widest as u16).clamp(1, MAX_COLUMN_WEIGHT))
            })
            .collect()
    }

    fn pager_line(&self, page: &PageInfo) -> Paragraph<'static> {
        let mut spans = vec![Span::raw(" « ")];
        for n in &page.window {
            if *n == page.current {
                spans.push(Span::styled(
                    format!("[{n}]"),
                    Style::default()
                        .fg(self.theme.title_color())
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(format!(" {n} ")));
            }
        }
        spans.push(Span::raw(" » "));
        spans.push(Span::styled(
            format!("  Page {} of {}", page.current, page.count),
            Style::default().fg(self.theme.info_color()),
        ));
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn draw_hint(&self, f: &mut Frame, area: Rect) {
        let (title, shortcuts) = self.get_current_shortcuts();
        let lines = crate::hint::create_shortcut_list(shortcuts, area.width);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(format!(" {title} Shortcuts "));

        let para = Paragraph::new(lines.to_vec())
            .block(block)
            .wrap(widgets::Wrap { trim: false });

        f.render_widget(para, area);
    }

    fn get_current_shortcuts(&self) -> (&str, Box<[Shortcut]>) {
        if let Some(ref float) = self.detail_float {
            return float.get_shortcut_list();
        }
        if self.search.active() {
            return (
                "Search",
                crate::shortcuts!(
                    ("Done", ["Esc", "Enter"]),
                    ("Move cursor", ["←", "→"]),
                    ("Clear", ["Ctrl-C"]),
                    ("Delete char", ["Backspace"]),
                ),
            );
        }
        if let Some(ref float) = self.loading_float {
            return float.get_shortcut_list();
        }
        match self.loader {
            Loader::Once { .. } => (
                "Dashboard",
                crate::shortcuts!(
                    ("Search", ["/"]),
                    ("Column", ["h", "l"]),
                    ("Sort", ["s"]),
                    ("Row", ["j", "k"]),
                    ("Page", ["n", "p"]),
                    ("First/last", ["g", "G"]),
                    ("Detail", ["Enter"]),
                    ("Reload", ["r"]),
                    ("Quit", ["q"]),
                ),
            ),
            Loader::Polling(_) => (
                "Dashboard",
                crate::shortcuts!(
                    ("Search", ["/"]),
                    ("Column", ["h", "l"]),
                    ("Sort", ["s"]),
                    ("Row", ["j", "k"]),
                    ("Page", ["n", "p"]),
                    ("First/last", ["g", "G"]),
                    ("Detail", ["Enter"]),
                    ("Quit", ["q"]),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TransportError,
        source::CsvSource,
        transform::ColumnPolicy,
        view::{SortConfig, SortOrder},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed {
        body: &'static str,
        fail: AtomicBool,
    }

    #[async_trait]
    impl CsvSource for Fixed {
        async fn fetch(&self) -> Result<String, TransportError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                });
            }
            Ok(self.body.to_string())
        }
        fn describe(&self) -> String {
            "fixture".into()
        }
    }

    const CSV: &str = "Name,City\nAnn,Oslo\nBob,Rome\nCid,Oslo\n";

    async fn loaded_app(body: &'static str, fail: bool) -> App {
        let source = Arc::new(Fixed {
            body,
            fail: AtomicBool::new(fail),
        });
        let pipeline = Arc::new(Pipeline::new(source, ColumnPolicy::default()).unwrap());
        let mut app = App::start("Test", pipeline, LoadMode::Once, ViewState::new(SortConfig::none(), true));
        let event = app.rx.recv().await.unwrap();
        app.on_event(event);
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::from(code))
    }

    fn shown(app: &App) -> Vec<String> {
        app.view
            .visible(app.load.rows())
            .rows
            .iter()
            .map(|r| r.get("Name").unwrap().display_text().to_string())
            .collect()
    }

    #[tokio::test]
    async fn first_result_closes_the_loading_float() {
        let app = loaded_app(CSV, false).await;
        assert!(app.loading_float.is_none());
        assert_eq!(shown(&app), ["Ann", "Bob", "Cid"]);
    }

    #[tokio::test]
    async fn sort_key_toggles_focused_column() {
        let mut app = loaded_app(CSV, false).await;
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.view.sort_config(), &SortConfig::by("Name", SortOrder::Ascending));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(shown(&app), ["Cid", "Bob", "Ann"]);

        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.focused_col, 1);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.view.sort_config(), &SortConfig::by("City", SortOrder::Ascending));
    }

    #[tokio::test]
    async fn typing_filters_live() {
        let mut app = loaded_app(CSV, false).await;
        press(&mut app, KeyCode::Char('/'));
        for ch in "osl".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert_eq!(shown(&app), ["Ann", "Cid"]);
        // q is text while searching, not quit
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(shown(&app).is_empty());
        press(&mut app, KeyCode::Esc);
        assert!(!app.search.active());
        assert_eq!(app.view.term(), "oslq");
    }

    #[tokio::test]
    async fn enter_opens_detail_and_esc_only_closes_it() {
        let mut app = loaded_app(CSV, false).await;
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert!(app.detail_float.is_some());
        assert!(press(&mut app, KeyCode::Esc));
        assert!(app.detail_float.is_none());
        assert!(!press(&mut app, KeyCode::Esc));
    }

    #[tokio::test]
    async fn failed_single_shot_can_be_retried() {
        let mut app = loaded_app(CSV, true).await;
        assert!(app.load.error().is_some());
        assert!(app.load.rows().is_empty());

        press(&mut app, KeyCode::Char('r'));
        assert!(app.load.is_loading());
        assert!(app.loading_float.is_some());
        let event = app.rx.recv().await.unwrap();
        app.on_event(event);
        assert!(app.load.error().is_some());
        assert_eq!(app.load.cycles(), 2);
    }

    #[tokio::test]
    async fn quitting_stops_the_poller() {
        let source = Arc::new(Fixed {
            body: CSV,
            fail: AtomicBool::new(false),
        });
        let pipeline = Arc::new(Pipeline::new(source, ColumnPolicy::default()).unwrap());
        let mut app = App::start(
            "Test",
            pipeline,
            LoadMode::Polling(Duration::from_secs(30)),
            ViewState::new(SortConfig::none(), false),
        );
        assert!(!press(&mut app, KeyCode::Char('q')));
        app.shutdown();
        let Loader::Polling(ref poller) = app.loader else {
            panic!("expected a poller");
        };
        assert!(poller.is_stopped());
    }
}

use crate::{
    data::{Cell, Row},
    float::FloatContent,
    hint::Shortcut,
    theme::Theme,
};
use ratatui::{
    Frame,
    crossterm::event::{KeyCode, KeyEvent},
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Every column of one row, one per line, with link targets spelled out.
pub struct RowDetail {
    row: Row,
    scroll: u16,
}

impl RowDetail {
    pub fn new(row: Row) -> Self {
        Self { row, scroll: 0 }
    }

    fn lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let label_width = self.row.columns().map(|c| c.chars().count()).max().unwrap_or(0);
        self.row
            .iter()
            .map(|(column, cell)| {
                let label = Span::styled(
                    format!("{column:<label_width$}  "),
                    Style::default().add_modifier(Modifier::BOLD),
                );
                let value = match cell {
                    Cell::Plain(s) => Span::raw(s.clone()),
                    Cell::Link(link) => Span::styled(
                        format!("{} <{}>", link.text(), link.url()),
                        Style::default()
                            .fg(theme.link_color())
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                };
                Line::from(vec![label, value])
            })
            .collect()
    }
}

impl FloatContent for RowDetail {
    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

        frame.render_widget(Clear, area);

        let text = Paragraph::new(self.lines(theme))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Response ")
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme.border_color())),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));

        frame.render_widget(text, area);
    }

    fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                false
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                false
            }
            _ => false,
        }
    }

    fn get_shortcut_list(&self) -> (&str, Box<[Shortcut]>) {
        (
            "Response",
            crate::shortcuts!(("Scroll", ["j", "k", "↑", "↓"]), ("Close", ["q", "Esc", "Enter"])),
        )
    }
}

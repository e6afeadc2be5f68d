use ratatui::{
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    prelude::*,
    symbols::border,
    widgets::{Block, Paragraph},
};
use unicode_width::UnicodeWidthChar;

/// What a key press did to the search bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    None,
    /// Leave the search bar; the term stays applied.
    Exit,
    /// The term changed and the table should refilter.
    Changed,
}

/// Single-line search input. The table filters live on every change.
#[derive(Default)]
pub struct SearchBar {
    in_search: bool,
    input: Vec<char>,
    cursor: usize,
}

impl SearchBar {
    pub fn activate(&mut self) {
        self.in_search = true;
        self.cursor = self.input.len();
    }
    pub fn deactivate(&mut self) {
        self.in_search = false;
    }
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }
    pub fn term(&self) -> String {
        self.input.iter().collect()
    }
    pub fn active(&self) -> bool {
        self.in_search
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let text = if self.in_search || !self.input.is_empty() {
            self.term()
        } else {
            "Press / to search".into()
        };
        let p = Paragraph::new(text).block(
            Block::bordered()
                .title(" Search ")
                .border_set(border::ROUNDED),
        );
        frame.render_widget(p, area);

        if self.in_search {
            let w: u16 = self
                .input
                .iter()
                .take(self.cursor)
                .map(|c| c.width().unwrap_or(1) as u16)
                .sum();
            frame.set_cursor_position(Position::new(area.x + 1 + w, area.y + 1));
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> SearchAction {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => return SearchAction::Exit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
                return SearchAction::Changed;
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return SearchAction::None;
                }
                self.cursor -= 1;
                self.input.remove(self.cursor);
            }
            KeyCode::Delete => {
                if self.cursor >= self.input.len() {
                    return SearchAction::None;
                }
                self.input.remove(self.cursor);
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                return SearchAction::None;
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.input.len());
                return SearchAction::None;
            }
            KeyCode::Home => {
                self.cursor = 0;
                return SearchAction::None;
            }
            KeyCode::End => {
                self.cursor = self.input.len();
                return SearchAction::None;
            }
            KeyCode::Char(ch) => {
                self.input.insert(self.cursor, ch);
                self.cursor += 1;
            }
            _ => return SearchAction::None,
        }
        SearchAction::Changed
    }
}

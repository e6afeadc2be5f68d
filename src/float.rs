use crate::{hint::Shortcut, theme::Theme};
use ratatui::{
    Frame,
    crossterm::event::KeyEvent,
    layout::{Constraint, Flex, Layout, Rect},
};

/// Something drawn on top of the dashboard that takes the keyboard while open.
pub trait FloatContent {
    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
    /// Returns `true` once the float wants to close.
    fn handle_key_event(&mut self, key: &KeyEvent) -> bool;
    fn get_shortcut_list(&self) -> (&str, Box<[Shortcut]>);
}

#[derive(Debug, Clone, Copy)]
pub enum FloatMode {
    /// Share of the parent area, in percent.
    Percent(u16, u16),
    /// Fixed size in terminal cells, shrunk to fit.
    Absolute(u16, u16),
}

pub struct Float<Content: FloatContent + ?Sized> {
    pub content: Box<Content>,
    mode: FloatMode,
}

impl<Content: FloatContent + ?Sized> Float<Content> {
    pub fn new(content: Box<Content>, width_percent: u16, height_percent: u16) -> Self {
        Self {
            content,
            mode: FloatMode::Percent(width_percent, height_percent),
        }
    }

    pub fn new_absolute(content: Box<Content>, width: u16, height: u16) -> Self {
        Self {
            content,
            mode: FloatMode::Absolute(width, height),
        }
    }

    fn floating_window(&self, area: Rect) -> Rect {
        let (w, h) = match self.mode {
            FloatMode::Percent(wp, hp) => (Constraint::Percentage(wp), Constraint::Percentage(hp)),
            FloatMode::Absolute(w, h) => (
                Constraint::Length(w.min(area.width)),
                Constraint::Length(h.min(area.height)),
            ),
        };
        let [column] = Layout::horizontal([w]).flex(Flex::Center).areas(area);
        let [window] = Layout::vertical([h]).flex(Flex::Center).areas(column);
        window
    }

    pub fn draw(&mut self, frame: &mut Frame, parent_area: Rect, theme: &Theme) {
        let popup_area = self.floating_window(parent_area);
        self.content.draw(frame, popup_area, theme);
    }

    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        self.content.handle_key_event(key)
    }

    pub fn get_shortcut_list(&self) -> (&str, Box<[Shortcut]>) {
        self.content.get_shortcut_list()
    }
}

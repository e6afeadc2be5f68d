use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Paragraph, Wrap},
};

use crate::theme::Theme;

/// Smallest area that fits the bars, a page of ten rows and the hint panel.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 24;

pub fn is_too_small(area: Rect) -> bool {
    area.width < MIN_WIDTH || area.height < MIN_HEIGHT
}

pub fn draw_too_small_warning(f: &mut Frame, area: Rect, theme: &Theme) {
    let warning = Paragraph::new(format!(
        "Terminal too small\n\n{}x{} (need {}x{})\n\nResize the window or press q to quit.",
        area.width, area.height, MIN_WIDTH, MIN_HEIGHT
    ))
    .alignment(Alignment::Center)
    .style(
        Style::default()
            .fg(theme.error_color())
            .add_modifier(Modifier::BOLD),
    )
    .wrap(Wrap { trim: true });

    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Fill(1),
    ])
    .areas(area);

    f.render_widget(warning, middle);
}

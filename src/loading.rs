use std::time::Instant;

use crate::{float::FloatContent, hint::Shortcut, theme::Theme};
use ratatui::{Frame, crossterm::event::KeyEvent, layout::Rect};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Shown while the first load of the row set is in flight.
pub struct LoadingFloat {
    source: String,
    started: Instant,
}

impl LoadingFloat {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            started: Instant::now(),
        }
    }

    fn message(&self) -> String {
        let elapsed = self.started.elapsed();
        let frame = SPINNER[(elapsed.as_millis() / 150) as usize % SPINNER.len()];
        format!(
            "{frame} Fetching responses from {} ({}s)",
            self.source,
            elapsed.as_secs()
        )
    }
}

impl FloatContent for LoadingFloat {
    fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        use ratatui::{
            layout::Alignment,
            style::{Modifier, Style},
            widgets::{Block, BorderType, Borders, Clear, Paragraph},
        };

        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Loading ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border_color()));

        let p = Paragraph::new(self.message())
            .block(block)
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(theme.title_color())
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_widget(p, area);
    }

    // Nothing to interact with; the dashboard closes it when data arrives.
    fn handle_key_event(&mut self, _key: &KeyEvent) -> bool {
        false
    }

    fn get_shortcut_list(&self) -> (&str, Box<[Shortcut]>) {
        ("Loading", crate::shortcuts!(("Quit", ["q"])))
    }
}

use ratatui::{
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// One entry of the shortcut panel: what it does and the keys that do it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

impl Shortcut {
    pub const fn new(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self { name, keys }
    }

    fn spans(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::with_capacity(self.keys.len() * 2 + 1);
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("/"));
            }
            spans.push(Span::styled(
                format!("[{key}]"),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::raw(format!(" {}", self.name)).italic());
        spans
    }

    fn width(&self) -> usize {
        let keys: usize = self.keys.iter().map(|k| k.width() + 2).sum();
        keys + self.keys.len().saturating_sub(1) + 1 + self.name.width()
    }
}

/// Build a boxed slice of shortcuts: `shortcuts!(("Quit", ["q"]), ...)`.
#[macro_export]
macro_rules! shortcuts {
    ($(($name:expr, [$($key:expr),+ $(,)?])),* $(,)?) => {
        vec![$($crate::hint::Shortcut::new($name, &[$($key),+])),*].into_boxed_slice()
    };
}

const GAP: &str = "   ";

/// Lay shortcuts out left to right, wrapping before `width` columns
/// (minus two for the panel border).
pub fn create_shortcut_list(shortcuts: Box<[Shortcut]>, width: u16) -> Box<[Line<'static>]> {
    let max = (width as usize).saturating_sub(2).max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;

    for shortcut in shortcuts.iter() {
        let w = shortcut.width();
        if !current.is_empty() && used + GAP.len() + w > max {
            lines.push(Line::from(std::mem::take(&mut current)));
            used = 0;
        }
        if !current.is_empty() {
            current.push(Span::raw(GAP));
            used += GAP.len();
        }
        current.extend(shortcut.spans());
        used += w;
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_builds_entries_in_order() {
        let list = crate::shortcuts!(("Search", ["/"]), ("Page", ["n", "p"]),);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], Shortcut::new("Page", &["n", "p"]));
    }

    #[test]
    fn wraps_when_too_wide() {
        let list = crate::shortcuts!(
            ("Search", ["/"]),
            ("Sort by column", ["s"]),
            ("Quit", ["q", "Esc"]),
        );
        assert_eq!(create_shortcut_list(list.clone(), 200).len(), 1);
        assert_eq!(create_shortcut_list(list, 24).len(), 3);
    }

    #[test]
    fn measures_rendered_width() {
        let s = Shortcut::new("Quit", &["q", "Esc"]);
        let rendered: usize = s.spans().iter().map(|span| span.content.width()).sum();
        assert_eq!(s.width(), rendered);
    }
}

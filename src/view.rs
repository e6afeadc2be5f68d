//! Table view-model: filter -> sort -> paginate over borrowed rows.
//!
//! Nothing here mutates the loaded rows. Every call recomputes the visible
//! sequence from the most recent load and returns references into it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::{Cell, Row};

pub const PAGE_SIZE: usize = 10;
/// How many page numbers the pager shows at once.
pub const PAGE_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Ascending => "▲",
            SortOrder::Descending => "▼",
        }
    }
}

/// Active sort column (if any) and its order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: Option<String>,
    pub order: SortOrder,
}

impl SortConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn by(key: impl Into<String>, order: SortOrder) -> Self {
        Self {
            key: Some(key.into()),
            order,
        }
    }

    /// Column-header click: the active column flips its order, any other
    /// column becomes active in ascending order.
    pub fn on_sort(&mut self, column: &str) {
        if self.key.as_deref() == Some(column) {
            self.order = self.order.flipped();
        } else {
            self.key = Some(column.to_string());
            self.order = SortOrder::Ascending;
        }
    }

    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.key.as_deref() == Some(column)
    }
}

/// Pager position for one derived view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// 1-based current page, already clamped.
    pub current: usize,
    pub count: usize,
    /// Page numbers to show around the current one.
    pub window: Vec<usize>,
}

/// Output of [`apply`].
#[derive(Debug, Clone, Serialize)]
pub struct Visible<'a> {
    pub rows: Vec<&'a Row>,
    /// Rows matching the filter, across all pages.
    pub total: usize,
    pub page: Option<PageInfo>,
}

fn resolve<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get(key).map(Cell::display_text).unwrap_or("")
}

fn matches(row: &Row, needle: &str) -> bool {
    row.values().any(|cell| match cell {
        Cell::Plain(s) => s.to_lowercase().contains(needle),
        Cell::Link(link) => link.text().to_lowercase().contains(needle),
    })
}

/// Case-insensitive substring filter across every value of a row.
/// Links match on their label. A blank term keeps every row.
pub fn filter<'a>(rows: &'a [Row], term: &str) -> Vec<&'a Row> {
    if term.trim().is_empty() {
        return rows.iter().collect();
    }
    let needle = term.to_lowercase();
    rows.iter().filter(|row| matches(row, &needle)).collect()
}

/// Stable sort by the resolved value of `sort.key`. With no key the
/// incoming order is kept.
pub fn sort(rows: &mut [&Row], sort: &SortConfig) {
    let Some(key) = sort.key.as_deref() else {
        return;
    };
    rows.sort_by(|a, b| {
        let ord: Ordering = resolve(a, key).cmp(resolve(b, key));
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(total, page_size))
}

/// Up to [`PAGE_WINDOW`] consecutive page numbers centred on `current`.
pub fn page_window(current: usize, count: usize) -> Vec<usize> {
    let count = count.max(1);
    let current = current.clamp(1, count);
    let half = PAGE_WINDOW / 2;
    let mut start = current.saturating_sub(half).max(1);
    let end = (start + PAGE_WINDOW - 1).min(count);
    start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
    (start..=end).collect()
}

/// Cut one page out of `rows`, clamping `page` into range.
pub fn paginate<'a>(rows: Vec<&'a Row>, page: usize, page_size: usize) -> (Vec<&'a Row>, PageInfo) {
    let page_size = page_size.max(1);
    let count = page_count(rows.len(), page_size);
    let current = clamp_page(page, rows.len(), page_size);
    let visible = rows
        .into_iter()
        .skip((current - 1) * page_size)
        .take(page_size)
        .collect();
    (
        visible,
        PageInfo {
            current,
            count,
            window: page_window(current, count),
        },
    )
}

/// Rows to show for (rows, search term, sort, optional page), page size
/// [`PAGE_SIZE`].
pub fn apply<'a>(
    rows: &'a [Row],
    term: &str,
    sort_config: &SortConfig,
    page: Option<usize>,
) -> Visible<'a> {
    apply_with_page_size(rows, term, sort_config, page, PAGE_SIZE)
}

pub fn apply_with_page_size<'a>(
    rows: &'a [Row],
    term: &str,
    sort_config: &SortConfig,
    page: Option<usize>,
    page_size: usize,
) -> Visible<'a> {
    let mut visible = filter(rows, term);
    sort(&mut visible, sort_config);
    let total = visible.len();
    match page {
        Some(page) => {
            let (rows, info) = paginate(visible, page, page_size);
            Visible {
                rows,
                total,
                page: Some(info),
            }
        }
        None => Visible {
            rows: visible,
            total,
            page: None,
        },
    }
}

/// Presentation-side state that feeds [`apply`]: search term, sort and
/// page. `None` for `page` means pagination is off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    term: String,
    sort: SortConfig,
    page: Option<usize>,
}

impl ViewState {
    pub fn new(sort: SortConfig, paginate: bool) -> Self {
        Self {
            term: String::new(),
            sort,
            page: paginate.then_some(1),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn sort_config(&self) -> &SortConfig {
        &self.sort
    }

    pub fn page(&self) -> Option<usize> {
        self.page
    }

    /// A new term changes the row set, so paging starts over.
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.term {
            self.term = term;
            if let Some(page) = self.page.as_mut() {
                *page = 1;
            }
        }
    }

    pub fn on_sort(&mut self, column: &str) {
        self.sort.on_sort(column);
    }

    /// Keep the page inside the page count for `total` filtered rows,
    /// e.g. after a reload shrank the data set.
    pub fn reclamp(&mut self, total: usize) {
        if let Some(page) = self.page.as_mut() {
            *page = clamp_page(*page, total, PAGE_SIZE);
        }
    }

    pub fn next_page(&mut self, total: usize) {
        if let Some(page) = self.page.as_mut() {
            *page = clamp_page(*page + 1, total, PAGE_SIZE);
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(page) = self.page.as_mut() {
            *page = page.saturating_sub(1).max(1);
        }
    }

    pub fn first_page(&mut self) {
        if let Some(page) = self.page.as_mut() {
            *page = 1;
        }
    }

    pub fn last_page(&mut self, total: usize) {
        if let Some(page) = self.page.as_mut() {
            *page = page_count(total, PAGE_SIZE);
        }
    }

    pub fn visible<'a>(&self, rows: &'a [Row]) -> Visible<'a> {
        apply(rows, &self.term, &self.sort, self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Link;

    fn row(name: &str, city: &str) -> Row {
        [("Name", Cell::from(name)), ("City", Cell::from(city))]
            .into_iter()
            .collect()
    }

    fn names(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.get("Name").unwrap().display_text().to_string())
            .collect()
    }

    #[test]
    fn on_sort_flips_active_column_and_resets_for_new_one() {
        let mut cfg = SortConfig::none();
        cfg.on_sort("Name");
        assert_eq!(cfg, SortConfig::by("Name", SortOrder::Ascending));
        cfg.on_sort("Name");
        assert_eq!(cfg, SortConfig::by("Name", SortOrder::Descending));
        cfg.on_sort("Name");
        assert_eq!(cfg.order, SortOrder::Ascending);
        cfg.on_sort("Name");
        cfg.on_sort("City");
        assert_eq!(cfg, SortConfig::by("City", SortOrder::Ascending));
    }

    #[test]
    fn filter_is_case_insensitive_and_ignores_link_urls() {
        let rows = vec![
            [
                ("Name", Cell::from("Ann")),
                ("Site", Cell::Link(Link::new("https://secret.example", "Profile"))),
            ]
            .into_iter()
            .collect::<Row>(),
            row("Bob", "Oslo"),
        ];
        assert_eq!(names(&filter(&rows, "aNN")), ["Ann"]);
        assert_eq!(names(&filter(&rows, "profile")), ["Ann"]);
        assert!(filter(&rows, "secret").is_empty());
        assert_eq!(filter(&rows, "   ").len(), 2);
    }

    #[test]
    fn missing_sort_key_keeps_order() {
        let rows = vec![row("b", "x"), row("a", "y")];
        let mut visible = filter(&rows, "");
        sort(&mut visible, &SortConfig::by("Nope", SortOrder::Descending));
        assert_eq!(names(&visible), ["b", "a"]);
    }

    #[test]
    fn page_window_is_centred_and_bounded() {
        assert_eq!(page_window(1, 1), [1]);
        assert_eq!(page_window(1, 3), [1, 2, 3]);
        assert_eq!(page_window(1, 9), [1, 2, 3, 4, 5]);
        assert_eq!(page_window(5, 9), [3, 4, 5, 6, 7]);
        assert_eq!(page_window(9, 9), [5, 6, 7, 8, 9]);
        assert_eq!(page_window(12, 9), [5, 6, 7, 8, 9]);
    }

    #[test]
    fn page_count_never_drops_below_one() {
        assert_eq!(page_count(0, PAGE_SIZE), 1);
        assert_eq!(page_count(10, PAGE_SIZE), 1);
        assert_eq!(page_count(11, PAGE_SIZE), 2);
        assert_eq!(clamp_page(0, 25, PAGE_SIZE), 1);
        assert_eq!(clamp_page(7, 25, PAGE_SIZE), 3);
    }

    #[test]
    fn view_state_resets_page_on_new_term() {
        let mut state = ViewState::new(SortConfig::none(), true);
        state.next_page(35);
        state.next_page(35);
        assert_eq!(state.page(), Some(3));
        state.set_term("ann");
        assert_eq!(state.page(), Some(1));
        state.last_page(35);
        assert_eq!(state.page(), Some(4));
        state.reclamp(12);
        assert_eq!(state.page(), Some(2));
        state.prev_page();
        state.prev_page();
        assert_eq!(state.page(), Some(1));
    }

    #[test]
    fn view_state_without_pages_ignores_paging() {
        let mut state = ViewState::new(SortConfig::none(), false);
        state.next_page(100);
        state.reclamp(0);
        assert_eq!(state.page(), None);
        let rows: Vec<Row> = (0..25).map(|i| row(&i.to_string(), "x")).collect();
        let visible = state.visible(&rows);
        assert_eq!(visible.rows.len(), 25);
        assert!(visible.page.is_none());
    }
}

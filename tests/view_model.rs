use sheetdash::{
    data::{Cell, Link, Row},
    view::{self, PAGE_SIZE, SortConfig, SortOrder, ViewState},
};

fn row(name: &str, team: &str) -> Row {
    [("Name", Cell::from(name)), ("Team", Cell::from(team))]
        .into_iter()
        .collect()
}

fn names(rows: &[&Row]) -> Vec<String> {
    rows.iter()
        .map(|r| r.get("Name").unwrap().display_text().to_string())
        .collect()
}

fn sample() -> Vec<Row> {
    vec![
        row("Dee", "red"),
        row("Ann", "blue"),
        row("Cal", "red"),
        row("Bob", "green"),
        row("Eve", "blue"),
    ]
}

#[test]
fn empty_term_keeps_every_row_in_order() {
    let rows = sample();
    let visible = view::apply(&rows, "", &SortConfig::none(), None);
    assert_eq!(names(&visible.rows), ["Dee", "Ann", "Cal", "Bob", "Eve"]);
    assert_eq!(visible.total, 5);
    assert!(visible.page.is_none());

    let blank = view::apply(&rows, "   ", &SortConfig::none(), None);
    assert_eq!(blank.total, 5);
}

#[test]
fn filter_is_case_insensitive_across_columns() {
    let rows = sample();
    let visible = view::apply(&rows, "GREEN", &SortConfig::none(), None);
    assert_eq!(names(&visible.rows), ["Bob"]);
}

#[test]
fn links_are_searched_by_label_not_url() {
    let rows: Vec<Row> = vec![
        [("Name", Cell::from("Ann")), ("Site", Cell::Link(Link::new("https://secret.example", "Portfolio")))]
            .into_iter()
            .collect(),
    ];
    assert_eq!(view::filter(&rows, "portfolio").len(), 1);
    assert!(view::filter(&rows, "secret").is_empty());
}

#[test]
fn reversing_direction_reverses_the_sequence() {
    let rows = sample();
    let up = view::apply(&rows, "", &SortConfig::by("Name", SortOrder::Ascending), None);
    let down = view::apply(&rows, "", &SortConfig::by("Name", SortOrder::Descending), None);
    let mut reversed = names(&up.rows);
    reversed.reverse();
    assert_eq!(names(&down.rows), reversed);
    assert_eq!(names(&up.rows), ["Ann", "Bob", "Cal", "Dee", "Eve"]);
}

fn profile(name: &str, cell: Cell) -> Row {
    [("Name", Cell::from(name)), ("LinkedIn", cell)].into_iter().collect()
}

#[test]
fn links_sort_by_label_alongside_plain_cells() {
    // URL order (a < m < z) disagrees with label order.
    let rows = vec![
        profile("Ann", Cell::Link(Link::new("https://z.example/ann", "Alpha"))),
        profile("Bob", Cell::from("linkedin.com/in/bob")),
        profile("Cal", Cell::Link(Link::new("https://a.example/cal", "Zulu"))),
        profile("Dee", Cell::Link(Link::new("https://m.example/dee", "Mike"))),
    ];

    let up = view::apply(&rows, "", &SortConfig::by("LinkedIn", SortOrder::Ascending), None);
    assert_eq!(names(&up.rows), ["Ann", "Dee", "Cal", "Bob"]);

    let down = view::apply(&rows, "", &SortConfig::by("LinkedIn", SortOrder::Descending), None);
    assert_eq!(names(&down.rows), ["Bob", "Cal", "Dee", "Ann"]);
}

#[test]
fn equal_keys_keep_their_relative_order() {
    let rows = sample();
    let by_team = view::apply(&rows, "", &SortConfig::by("Team", SortOrder::Ascending), None);
    assert_eq!(names(&by_team.rows), ["Ann", "Eve", "Bob", "Dee", "Cal"]);
    let desc = view::apply(&rows, "", &SortConfig::by("Team", SortOrder::Descending), None);
    assert_eq!(names(&desc.rows), ["Dee", "Cal", "Bob", "Ann", "Eve"]);
}

#[test]
fn sorting_never_touches_the_stored_rows() {
    let rows = sample();
    let before = rows.clone();
    let _ = view::apply(&rows, "e", &SortConfig::by("Name", SortOrder::Descending), Some(1));
    assert_eq!(rows, before);
}

#[test]
fn pages_clamp_into_range() {
    let rows: Vec<Row> = (0..23).map(|i| row(&format!("P{i:02}"), "x")).collect();
    let sort = SortConfig::by("Name", SortOrder::Ascending);

    let last = view::apply(&rows, "", &sort, Some(99));
    let page = last.page.unwrap();
    assert_eq!((page.current, page.count), (3, 3));
    assert_eq!(last.rows.len(), 23 - 2 * PAGE_SIZE);

    let first = view::apply(&rows, "", &sort, Some(0));
    assert_eq!(first.page.unwrap().current, 1);
    assert_eq!(names(&first.rows)[0], "P00");
}

#[test]
fn view_state_resets_page_on_new_term() {
    let rows: Vec<Row> = (0..30).map(|i| row(&format!("P{i:02}"), "x")).collect();
    let mut state = ViewState::new(SortConfig::none(), true);
    state.next_page(rows.len());
    state.next_page(rows.len());
    assert_eq!(state.page(), Some(3));

    state.set_term("p0");
    assert_eq!(state.page(), Some(1));
    assert_eq!(state.visible(&rows).total, 10);

    state.last_page(rows.len());
    state.reclamp(4);
    assert_eq!(state.page(), Some(1));
}

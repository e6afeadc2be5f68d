//! Raw string rows to display rows, driven by a per-column action table.

use std::{collections::HashMap, fmt::Write as _, fs, path::Path};

use anyhow::{Context, Result};
use chrono::{
    DateTime, NaiveDate, NaiveDateTime,
    format::{Item, StrftimeItems},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    data::{Cell, Link, RawRow, Row, Table},
    error::TransformError,
};

/// Input layouts tried, in order, when a column is date-formatted.
const DATETIME_INPUTS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_INPUTS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Date,
    DateTime,
    Custom(String),
}

impl FormatKind {
    pub fn pattern(&self) -> &str {
        match self {
            FormatKind::Date => "%Y-%m-%d",
            FormatKind::DateTime => "%Y-%m-%d %H:%M",
            FormatKind::Custom(p) => p,
        }
    }
}

/// What happens to one column on its way to the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAction {
    Passthrough,
    /// Replace a valid absolute URL with a link carrying this label.
    Linkify(String),
    Drop,
    Format(FormatKind),
}

static PASSTHROUGH: ColumnAction = ColumnAction::Passthrough;

/// Column name -> action. Columns without an entry pass through.
///
/// In JSON this is a plain object:
/// `{"LinkedIn": {"linkify": "View Profile"}, "Email Address": "drop", "Timestamp": {"format": "datetime"}}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnPolicy {
    actions: HashMap<String, ColumnAction>,
}

impl ColumnPolicy {
    /// The form-responses layout: profile and resume links, no e-mail
    /// addresses, ISO timestamps (which also sort chronologically).
    pub fn dashboard() -> Self {
        Self::default()
            .with("LinkedIn", ColumnAction::Linkify("View Profile".into()))
            .with("Resume", ColumnAction::Linkify("View Resume".into()))
            .with("Email Address", ColumnAction::Drop)
            .with("Timestamp", ColumnAction::Format(FormatKind::DateTime))
    }

    pub fn with(mut self, column: impl Into<String>, action: ColumnAction) -> Self {
        self.actions.insert(column.into(), action);
        self
    }

    pub fn action(&self, column: &str) -> &ColumnAction {
        self.actions.get(column).unwrap_or(&PASSTHROUGH)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column policy {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid column policy in {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        for (column, action) in &self.actions {
            match action {
                ColumnAction::Linkify(label) if label.trim().is_empty() => {
                    return Err(TransformError::EmptyLabel {
                        column: column.clone(),
                    });
                }
                ColumnAction::Format(FormatKind::Custom(pattern))
                    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) =>
                {
                    return Err(TransformError::InvalidPattern {
                        column: column.clone(),
                        pattern: pattern.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Headers that survive the drops, in source order.
    pub fn output_columns(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .filter(|h| *self.action(h) != ColumnAction::Drop)
            .cloned()
            .collect()
    }
}

/// A validated policy, ready to map rows.
#[derive(Clone, Debug)]
pub struct Transformer {
    policy: ColumnPolicy,
}

impl Transformer {
    pub fn new(policy: ColumnPolicy) -> Result<Self, TransformError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn apply(&self, raw: &RawRow) -> Row {
        raw.iter()
            .filter_map(|(column, value)| {
                let cell = match self.policy.action(column) {
                    ColumnAction::Drop => return None,
                    ColumnAction::Passthrough => Cell::Plain(value.clone()),
                    ColumnAction::Linkify(label) => linkify(value, label),
                    ColumnAction::Format(kind) => Cell::Plain(format_date(value, kind)),
                };
                Some((column, cell))
            })
            .collect()
    }

    pub fn apply_table(&self, raw: &Table<String>) -> Table<Cell> {
        Table {
            headers: self.policy.output_columns(&raw.headers),
            rows: raw.rows.iter().map(|r| self.apply(r)).collect(),
        }
    }
}

/// True when `value` is an absolute URL with a scheme and a host.
pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

fn linkify(value: &str, label: &str) -> Cell {
    if !value.is_empty() && is_valid_url(value) {
        Cell::Link(Link::new(value, label))
    } else {
        Cell::Plain(value.to_string())
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_INPUTS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Reformat a timestamp; anything unparseable is returned unchanged.
fn format_date(value: &str, kind: &FormatKind) -> String {
    let Some(ts) = parse_timestamp(value) else {
        return value.to_string();
    };
    let mut out = String::new();
    match write!(out, "{}", ts.format(kind.pattern())) {
        Ok(()) => out,
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(fields: &[(&str, &str)]) -> RawRow {
        fields.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn url_validity() {
        assert!(is_valid_url("https://x.com/ann"));
        assert!(is_valid_url("http://localhost:8080/cv.pdf"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("x.com/ann"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url("mailto:ann@x.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn linkifies_valid_urls_only() {
        let t = Transformer::new(ColumnPolicy::dashboard()).unwrap();
        let row = t.apply(&raw(&[("Name", "Ann"), ("LinkedIn", "https://x.com/ann")]));
        assert_eq!(
            row.get("LinkedIn"),
            Some(&Cell::Link(Link::new("https://x.com/ann", "View Profile")))
        );

        let row = t.apply(&raw(&[("LinkedIn", "linkedin.com/in/ann"), ("Resume", "")]));
        assert_eq!(row.get("LinkedIn"), Some(&Cell::from("linkedin.com/in/ann")));
        assert_eq!(row.get("Resume"), Some(&Cell::from("")));
    }

    #[test]
    fn drops_columns_from_rows_and_headers() {
        let t = Transformer::new(ColumnPolicy::dashboard()).unwrap();
        let table = Table {
            headers: vec!["Name".into(), "Email Address".into()],
            rows: vec![raw(&[("Name", "Ann"), ("Email Address", "ann@x.com")])],
        };
        let out = t.apply_table(&table);
        assert_eq!(out.headers, ["Name"]);
        assert_eq!(out.rows[0].columns().collect::<Vec<_>>(), ["Name"]);
    }

    #[test]
    fn formats_form_timestamps() {
        let t = Transformer::new(ColumnPolicy::dashboard()).unwrap();
        let row = t.apply(&raw(&[("Timestamp", "1/5/2025 9:03:22")]));
        assert_eq!(row.get("Timestamp"), Some(&Cell::from("2025-01-05 09:03")));

        let row = t.apply(&raw(&[("Timestamp", "yesterday")]));
        assert_eq!(row.get("Timestamp"), Some(&Cell::from("yesterday")));
    }

    #[test]
    fn date_format_is_idempotent() {
        let policy = ColumnPolicy::default().with("When", ColumnAction::Format(FormatKind::Date));
        let t = Transformer::new(policy).unwrap();
        let once = t.apply(&raw(&[("When", "2025-03-04T10:00:00Z")]));
        assert_eq!(once.get("When"), Some(&Cell::from("2025-03-04")));
        let again = t.apply(&raw(&[("When", "2025-03-04")]));
        assert_eq!(once, again);
    }

    #[test]
    fn rejects_bad_policies() {
        let empty_label = ColumnPolicy::default().with("Site", ColumnAction::Linkify(" ".into()));
        assert!(matches!(
            Transformer::new(empty_label),
            Err(TransformError::EmptyLabel { .. })
        ));

        let bad_pattern = ColumnPolicy::default().with(
            "When",
            ColumnAction::Format(FormatKind::Custom("%Q".into())),
        );
        assert!(matches!(
            bad_pattern.validate(),
            Err(TransformError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn policy_reads_from_json() {
        let policy = ColumnPolicy::from_json(
            r#"{
                "Portfolio": {"linkify": "Open"},
                "Phone": "drop",
                "Born": {"format": {"custom": "%d.%m.%Y"}},
                "Name": "passthrough"
            }"#,
        )
        .unwrap();
        assert_eq!(
            policy.action("Portfolio"),
            &ColumnAction::Linkify("Open".into())
        );
        assert_eq!(policy.action("Phone"), &ColumnAction::Drop);
        assert_eq!(policy.action("Unlisted"), &ColumnAction::Passthrough);

        let t = Transformer::new(policy).unwrap();
        let row = t.apply(&raw(&[("Born", "2/29/2000"), ("Phone", "555")]));
        assert_eq!(row.get("Born"), Some(&Cell::from("29.02.2000")));
        assert!(row.get("Phone").is_none());
    }
}

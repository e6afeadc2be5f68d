use serde::{Serialize, Serializer, ser::SerializeMap};

/// A hyperlink produced by the transform. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    url: String,
    text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A display-ready cell value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Plain(String),
    Link(Link),
}

impl Cell {
    /// Text shown to the user; also the value used for search and sort.
    pub fn display_text(&self) -> &str {
        match self {
            Cell::Plain(s) => s,
            Cell::Link(link) => link.text(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Plain(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Plain(s)
    }
}

/// One row: column name -> value, in header order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<V> {
    fields: Vec<(String, V)>,
}

pub type RawRow = Record<String>;
pub type Row = Record<Cell>;

impl<V> Record<V> {
    pub fn new(fields: Vec<(String, V)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&V> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for Record<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<V: Serialize> Serialize for Record<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Headers plus rows of one load. Headers are kept separately so the
/// column set is known even when no rows survive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table<V> {
    pub headers: Vec<String>,
    pub rows: Vec<Record<V>>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl<V> Table<V> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

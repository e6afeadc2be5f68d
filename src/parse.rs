use csv::ReaderBuilder;
use tracing::debug;

use crate::{
    data::{RawRow, Table},
    error::ParseError,
};

/// Parse CSV text whose first line is the header into raw rows.
///
/// Empty lines are skipped by the reader, short rows are padded with empty
/// strings, surplus fields are ignored, and rows with nothing but empty
/// values are dropped.
pub fn parse_rows(text: &str) -> Result<Table<String>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if let Some(line) = unterminated_quote(text) {
        return Err(ParseError::UnterminatedQuote { line });
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr
        .headers()?
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        if rec.len() > headers.len() {
            debug!(
                line = rec.position().map(|p| p.line()),
                extra = rec.len() - headers.len(),
                "ignoring surplus fields"
            );
        }
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), rec.get(i).unwrap_or_default().to_string()))
            .collect();
        if row.values().all(|v| v.is_empty()) {
            blank += 1;
            continue;
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), blank, columns = headers.len(), "parsed csv");
    Ok(Table { headers, rows })
}

/// Line number of a quoted field that never closes, if any.
/// The reader itself accepts such input and swallows the rest of the text
/// into one field, so it is caught here first.
fn unterminated_quote(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut open_at = None;
    let mut field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match (open_at, ch) {
            (Some(_), '"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    open_at = None;
                    field_start = false;
                }
            }
            (Some(_), _) => {}
            (None, '"') if field_start => {
                open_at = Some(line);
                field_start = false;
            }
            (None, ',' | '\n' | '\r') => field_start = true,
            (None, _) => field_start = false,
        }
        if ch == '\n' {
            line += 1;
        }
    }
    open_at
}

//! Quote-aware CSV reading and writing for the sheet exports.
//!
//! The reader is deliberately lenient: it never fails, a stray quote simply
//! switches quoted mode on, and `\r` outside quotes is dropped. Use
//! [`check_rectangular`] when a strict opinion about a file is wanted.

use crate::domain::model::Record;
use crate::utils::error::Result;

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|field| field.trim().is_empty())
}

/// Splits CSV text into rows of raw (untrimmed) fields.
///
/// Trailing all-blank rows are removed, so empty input yields no rows.
/// Blank rows in the middle are kept.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    rows.push(row);

    while rows.last().is_some_and(|row| is_blank_row(row)) {
        rows.pop();
    }

    rows
}

/// Parses CSV text with a header row into header-keyed records.
///
/// Headers and values are trimmed. Columns with a blank header are dropped,
/// all-blank rows are skipped, short rows are padded with empty strings and
/// surplus fields are ignored.
pub fn parse_to_records(text: &str) -> Vec<Record> {
    let mut rows = parse(text).into_iter();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    rows.filter(|row| !is_blank_row(row))
        .map(|values| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(idx, header)| {
                    let value = values.get(idx).map(|v| v.trim()).unwrap_or("");
                    (header.clone(), value.to_string())
                })
                .collect()
        })
        .collect()
}

/// Quotes a field only when it contains a comma, quote, CR or LF.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Joins fields with `,` and rows with `\n` (no trailing newline).
pub fn serialize(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strict check that every record has the same number of fields.
/// Returns the record count; ragged rows surface as [`csv::Error`].
pub fn check_rectangular(text: &str) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(text.as_bytes());

    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }
    Ok(count)
}

//! Parsing and writing engines.
//!
//! The loader talks to TOML text only through two narrow traits:
//! [`DocumentParser`] turns text into a root [`Table`] and [`DocumentWriter`]
//! turns a root table back into text. [`TomlEngine`] implements both on top of
//! the `toml` crate; tests and embedders can plug in their own.
//!
//! The writer keeps key order: a sub-table or array of tables that precedes a
//! plain key of the same table is written inline rather than as a section.
//!
//! ```rust
//! use toml_node::{engine::DocumentParser, engine::DocumentWriter, TomlEngine};
//!
//! let engine = TomlEngine::new();
//! let table = engine.parse("[owner]\nname = \"Tom\"\n").unwrap();
//! assert!(table.get("owner").unwrap().is_table());
//!
//! let text = engine.write(&table).unwrap();
//! assert!(text.contains("[owner]"));
//! ```

use crate::document::{Document, Table};
use crate::error::{Error, Result};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike,
};
use num_bigint::BigInt;
use std::borrow::Cow;
use toml::value::{Date, Datetime, Offset as TomlOffset, Time};

/// Prefix of the string a too-wide integer literal is swapped for while parsing.
const WIDE_INTEGER_MARKER: &str = "\u{0}toml_node:wide-integer:";

/// Turns text into a root table.
pub trait DocumentParser: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed input.
    fn parse(&self, text: &str) -> Result<Table>;
}

/// Turns a root table into text.
pub trait DocumentWriter: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Encode`] when the engine cannot render the table.
    fn write(&self, table: &Table) -> Result<String>;
}

/// The default engine, backed by the `toml` crate.
///
/// # Examples
///
/// ```rust
/// use toml_node::TomlEngine;
///
/// let engine = TomlEngine::new().with_pretty(true).with_fractional_seconds(false);
/// assert!(engine.pretty);
/// assert!(!engine.fractional_seconds);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TomlEngine {
    /// Write arrays one element per line.
    pub pretty: bool,
    /// Keep the sub-second part of times when writing.
    pub fractional_seconds: bool,
}

impl Default for TomlEngine {
    fn default() -> Self {
        TomlEngine {
            pretty: false,
            fractional_seconds: true,
        }
    }
}

impl TomlEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_fractional_seconds(mut self, fractional_seconds: bool) -> Self {
        self.fractional_seconds = fractional_seconds;
        self
    }

    fn to_toml(&self, document: &Document) -> Result<toml::Value> {
        let value = match document {
            Document::Table(table) => toml::Value::Table(self.to_toml_table(table)?),
            Document::Array(items) => toml::Value::Array(
                items
                    .iter()
                    .map(|item| self.to_toml(item))
                    .collect::<Result<_>>()?,
            ),
            Document::Boolean(b) => toml::Value::Boolean(*b),
            Document::Integer(i) => toml::Value::Integer(
                i64::try_from(i)
                    .map_err(|_| Error::Encode(format!("integer {} exceeds 64 bits", i)))?,
            ),
            Document::Float(f) => toml::Value::Float(*f),
            Document::String(s) => toml::Value::String(s.clone()),
            Document::LocalDate(d) => toml::Value::Datetime(Datetime {
                date: Some(toml_date(d)?),
                time: None,
                offset: None,
            }),
            Document::LocalTime(t) => toml::Value::Datetime(Datetime {
                date: None,
                time: Some(self.toml_time(t)),
                offset: None,
            }),
            Document::LocalDateTime(dt) => toml::Value::Datetime(Datetime {
                date: Some(toml_date(&dt.date())?),
                time: Some(self.toml_time(&dt.time())),
                offset: None,
            }),
            Document::OffsetDateTime(dt) => toml::Value::Datetime(Datetime {
                date: Some(toml_date(&dt.date_naive())?),
                time: Some(self.toml_time(&dt.time())),
                offset: Some(toml_offset(dt.offset())?),
            }),
        };
        Ok(value)
    }

    fn to_toml_table(&self, table: &Table) -> Result<toml::Table> {
        let mut out = toml::Table::new();
        for (key, value) in table {
            out.insert(key.clone(), self.to_toml(value)?);
        }
        Ok(out)
    }

    fn toml_time(&self, time: &NaiveTime) -> Time {
        // chrono encodes a leap second as nanosecond >= 1_000_000_000
        let nanosecond = if self.fractional_seconds {
            time.nanosecond() % 1_000_000_000
        } else {
            0
        };
        Time {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second() as u8,
            nanosecond,
        }
    }
}

impl TomlEngine {
    fn write_table(&self, out: &mut String, path: &[&str], table: &Table) -> Result<()> {
        // Entries from here on are all sections; earlier ones are written inline.
        let sections_from = table
            .iter()
            .rposition(|(_, value)| !is_section(value))
            .map_or(0, |i| i + 1);

        for (key, value) in table.iter().take(sections_from) {
            out.push_str(&render_key(key));
            out.push_str(" = ");
            self.write_value(out, value)?;
            out.push('\n');
        }

        for (key, value) in table.iter().skip(sections_from) {
            let mut child_path = path.to_vec();
            child_path.push(key);
            match value {
                Document::Table(child) => {
                    let implicit = !child.is_empty() && child.iter().all(|(_, v)| is_section(v));
                    if !implicit {
                        write_section_header(out, &child_path, false);
                    }
                    self.write_table(out, &child_path, child)?;
                }
                Document::Array(items) => {
                    for item in items {
                        if let Document::Table(child) = item {
                            write_section_header(out, &child_path, true);
                            self.write_table(out, &child_path, child)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn write_value(&self, out: &mut String, value: &Document) -> Result<()> {
        match (self.pretty, value) {
            (true, Document::Array(items)) if !items.is_empty() => {
                out.push_str("[\n");
                for item in items {
                    out.push_str("    ");
                    out.push_str(&self.to_toml(item)?.to_string());
                    out.push_str(",\n");
                }
                out.push(']');
            }
            _ => out.push_str(&self.to_toml(value)?.to_string()),
        }
        Ok(())
    }
}

/// Whether `value` is written as a `[table]` or `[[array]]` section.
fn is_section(value: &Document) -> bool {
    value.is_table() || value.is_array_of_tables()
}

fn write_section_header(out: &mut String, path: &[&str], array: bool) {
    if !out.is_empty() {
        out.push('\n');
    }
    let name = path
        .iter()
        .map(|key| render_key(key))
        .collect::<Vec<_>>()
        .join(".");
    if array {
        out.push_str(&format!("[[{}]]\n", name));
    } else {
        out.push_str(&format!("[{}]\n", name));
    }
}

fn render_key(key: &str) -> Cow<'_, str> {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(toml::Value::String(key.to_string()).to_string())
    }
}

impl DocumentParser for TomlEngine {
    fn parse(&self, text: &str) -> Result<Table> {
        let mut source = Cow::Borrowed(text);
        let mut wide = WideIntegers::default();
        loop {
            let error = match toml::from_str::<toml::Table>(&source) {
                Ok(table) => return from_toml_table(table, &wide.values),
                Err(error) => error,
            };
            let start = error.span().map(|span| span.start);
            if let Some(start) = start.filter(|_| is_out_of_range(&error)) {
                if let Some(replaced) = wide.replace(&source, start) {
                    source = Cow::Owned(replaced);
                    continue;
                }
            }
            let (line, column) = match start {
                Some(start) => line_column(text, wide.original_offset(start)),
                None => (1, 1),
            };
            return Err(Error::parse(line, column, error.message().trim()));
        }
    }
}

impl DocumentWriter for TomlEngine {
    fn write(&self, table: &Table) -> Result<String> {
        let mut out = String::new();
        self.write_table(&mut out, &[], table)?;
        Ok(out)
    }
}

fn is_out_of_range(error: &toml::de::Error) -> bool {
    let message = error.message();
    message.contains("number too large") || message.contains("number too small")
}

/// Integer literals wider than 64 bits, lifted out of the text so the `toml`
/// crate can parse the rest.
///
/// Each literal is swapped for a marker string holding its index; the edits
/// are kept to map error positions back onto the original text.
#[derive(Default)]
struct WideIntegers {
    values: Vec<BigInt>,
    edits: Vec<Edit>,
}

struct Edit {
    start: usize,
    removed: usize,
    inserted: usize,
}

impl WideIntegers {
    fn replace(&mut self, text: &str, span_start: usize) -> Option<String> {
        let in_literal = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-');
        // The reported span may skip a sign or radix prefix.
        let start = text
            .get(..span_start)?
            .char_indices()
            .rev()
            .take_while(|&(_, c)| in_literal(c))
            .last()
            .map_or(span_start, |(i, _)| i);
        let rest = &text[start..];
        let len = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        let value = parse_integer_literal(&rest[..len])?;

        let marker = format!(
            "\"{}{}\"",
            WIDE_INTEGER_MARKER.replace('\u{0}', "\\u0000"),
            self.values.len()
        );
        self.values.push(value);
        self.edits.push(Edit {
            start,
            removed: len,
            inserted: marker.len(),
        });

        let mut replaced = String::with_capacity(text.len() + marker.len());
        replaced.push_str(&text[..start]);
        replaced.push_str(&marker);
        replaced.push_str(&rest[len..]);
        Some(replaced)
    }

    fn original_offset(&self, offset: usize) -> usize {
        self.edits.iter().rev().fold(offset, |offset, edit| {
            if offset >= edit.start + edit.inserted {
                offset - edit.inserted + edit.removed
            } else {
                offset.min(edit.start)
            }
        })
    }
}

fn parse_integer_literal(literal: &str) -> Option<BigInt> {
    let (negative, unsigned) = match literal.as_bytes().first()? {
        b'-' => (true, &literal[1..]),
        b'+' => (false, &literal[1..]),
        _ => (false, literal),
    };
    let (radix, digits) = if let Some(digits) = unsigned.strip_prefix("0x") {
        (16, digits)
    } else if let Some(digits) = unsigned.strip_prefix("0o") {
        (8, digits)
    } else if let Some(digits) = unsigned.strip_prefix("0b") {
        (2, digits)
    } else {
        (10, unsigned)
    };
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -magnitude } else { magnitude })
}

fn wide_integer(value: &str, wide: &[BigInt]) -> Option<BigInt> {
    let index: usize = value.strip_prefix(WIDE_INTEGER_MARKER)?.parse().ok()?;
    wide.get(index).cloned()
}

/// 1-based line and column of a byte offset, counting columns in characters.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn from_toml_table(table: toml::Table, wide: &[BigInt]) -> Result<Table> {
    table
        .into_iter()
        .map(|(key, value)| Ok((key, from_toml(value, wide)?)))
        .collect()
}

fn from_toml(value: toml::Value, wide: &[BigInt]) -> Result<Document> {
    let document = match value {
        toml::Value::String(s) => match wide_integer(&s, wide) {
            Some(i) => Document::Integer(i),
            None => Document::String(s),
        },
        toml::Value::Integer(i) => Document::Integer(BigInt::from(i)),
        toml::Value::Float(f) => Document::Float(f),
        toml::Value::Boolean(b) => Document::Boolean(b),
        toml::Value::Datetime(dt) => from_toml_datetime(&dt)?,
        toml::Value::Array(items) => Document::Array(
            items
                .into_iter()
                .map(|item| from_toml(item, wide))
                .collect::<Result<_>>()?,
        ),
        toml::Value::Table(table) => Document::Table(from_toml_table(table, wide)?),
    };
    Ok(document)
}

fn from_toml_datetime(dt: &Datetime) -> Result<Document> {
    let invalid = || Error::custom(format!("invalid date-time {}", dt));
    let date = dt
        .date
        .map(|d| NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day)));
    let time = dt.time.map(|t| {
        NaiveTime::from_hms_nano_opt(
            u32::from(t.hour),
            u32::from(t.minute),
            u32::from(t.second),
            t.nanosecond,
        )
    });

    let document = match (date, time, dt.offset) {
        (Some(date), None, None) => Document::LocalDate(date.ok_or_else(invalid)?),
        (None, Some(time), None) => Document::LocalTime(time.ok_or_else(invalid)?),
        (Some(date), Some(time), None) => Document::LocalDateTime(NaiveDateTime::new(
            date.ok_or_else(invalid)?,
            time.ok_or_else(invalid)?,
        )),
        (Some(date), Some(time), Some(offset)) => {
            let local = NaiveDateTime::new(date.ok_or_else(invalid)?, time.ok_or_else(invalid)?);
            let zone = match offset {
                TomlOffset::Z => FixedOffset::east_opt(0),
                TomlOffset::Custom { minutes } => FixedOffset::east_opt(i32::from(minutes) * 60),
            }
            .ok_or_else(invalid)?;
            let dt: DateTime<FixedOffset> =
                zone.from_local_datetime(&local).single().ok_or_else(invalid)?;
            Document::OffsetDateTime(dt)
        }
        _ => return Err(invalid()),
    };
    Ok(document)
}

fn toml_date(date: &NaiveDate) -> Result<Date> {
    let year = u16::try_from(date.year())
        .ok()
        .filter(|y| *y <= 9999)
        .ok_or_else(|| Error::Encode(format!("year of {} is outside 0000-9999", date)))?;
    Ok(Date {
        year,
        month: date.month() as u8,
        day: date.day() as u8,
    })
}

fn toml_offset(offset: &FixedOffset) -> Result<TomlOffset> {
    match offset.fix().local_minus_utc() {
        0 => Ok(TomlOffset::Z),
        seconds if seconds % 60 == 0 => Ok(TomlOffset::Custom {
            minutes: (seconds / 60) as i16,
        }),
        _ => Err(Error::Encode(format!(
            "offset {} is not a whole number of minutes",
            offset
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_scalar_types() {
        let text = r#"
b = true
i = -42
f = 6.5
s = "text"
ld = 1979-05-27
lt = 07:32:00.5
ldt = 1979-05-27T07:32:00
odt = 1979-05-27T00:32:00-07:00
"#;
        let table = TomlEngine::new().parse(text).unwrap();
        assert_eq!(table.get("b"), Some(&Document::Boolean(true)));
        assert_eq!(table.get("i"), Some(&Document::from(-42)));
        assert_eq!(table.get("f"), Some(&Document::Float(6.5)));
        assert_eq!(table.get("s"), Some(&Document::from("text")));
        assert_eq!(table.get("ld").unwrap().type_name(), "local date");
        assert_eq!(
            table.get("lt"),
            Some(&Document::LocalTime(
                NaiveTime::from_hms_milli_opt(7, 32, 0, 500).unwrap()
            ))
        );
        assert_eq!(table.get("ldt").unwrap().type_name(), "local date-time");
        match table.get("odt").unwrap() {
            Document::OffsetDateTime(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), -7 * 3600);
                assert_eq!(dt.to_rfc3339(), "1979-05-27T00:32:00-07:00");
            }
            other => panic!("expected an offset date-time, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let table = TomlEngine::new().parse("z = 1\na = 2\nm = 3\n").unwrap();
        let keys: Vec<&String> = table.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    fn error_position(text: &str) -> (usize, usize) {
        match TomlEngine::new().parse(text).unwrap_err() {
            Error::Parse { line, column, .. } => (line, column),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_position() {
        assert_eq!(error_position("a = 1\nb = \n"), (2, 5));
        assert_eq!(error_position("a = 1\nb = [1,\n"), (3, 1));
    }

    #[test]
    fn test_parse_error_position_after_wide_integer() {
        // the literal is swapped for a longer marker before the error is found
        assert_eq!(
            error_position("a = [123456789012345678901234567890, 1]\nb = \n"),
            (2, 5)
        );
    }

    #[test]
    fn test_parse_wide_integers() {
        let text = "big = 1234567890123456789012345678901234567890\n\
                    small = -99_999_999_999_999_999_999\n\
                    list = [1, 0xFFFFFFFFFFFFFFFFFF]\n\
                    after = \"kept\"\n";
        let table = TomlEngine::new().parse(text).unwrap();

        let big: BigInt = "1234567890123456789012345678901234567890".parse().unwrap();
        assert_eq!(table.get("big"), Some(&Document::Integer(big)));
        let small: BigInt = "-99999999999999999999".parse().unwrap();
        assert_eq!(table.get("small"), Some(&Document::Integer(small)));
        let hex = BigInt::parse_bytes(b"FFFFFFFFFFFFFFFFFF", 16).unwrap();
        assert_eq!(
            table.get("list"),
            Some(&Document::Array(vec![Document::from(1), Document::Integer(hex)]))
        );
        assert_eq!(table.get("after"), Some(&Document::from("kept")));
        let keys: Vec<&String> = table.keys().collect();
        assert_eq!(keys, vec!["big", "small", "list", "after"]);
    }

    #[test]
    fn test_parse_integer_literal() {
        assert_eq!(parse_integer_literal("+1_000"), Some(BigInt::from(1000)));
        assert_eq!(parse_integer_literal("-0b101"), Some(BigInt::from(-5)));
        assert_eq!(parse_integer_literal("0o17"), Some(BigInt::from(15)));
        assert_eq!(parse_integer_literal("12abc"), None);
        assert_eq!(parse_integer_literal("-"), None);
    }

    #[test]
    fn test_write_keeps_key_order_around_tables() {
        let mut inner = Table::new();
        inner.insert("x".to_string(), Document::from(1));
        let mut root = Table::new();
        root.insert("z".to_string(), Document::Table(inner.clone()));
        root.insert("a".to_string(), Document::from(2));
        root.insert("m".to_string(), Document::Table(inner));

        let engine = TomlEngine::new();
        let text = engine.write(&root).unwrap();
        assert_eq!(text, "z = { x = 1 }\na = 2\n\n[m]\nx = 1\n");

        let reparsed = engine.parse(&text).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn test_write_nested_sections() {
        let mut leaf = Table::new();
        leaf.insert("ip".to_string(), Document::from("10.0.0.1"));
        let mut servers = Table::new();
        servers.insert("alpha".to_string(), Document::Table(leaf));
        let mut root = Table::new();
        root.insert("title".to_string(), Document::from("x"));
        root.insert("servers".to_string(), Document::Table(servers));
        root.insert("empty".to_string(), Document::Table(Table::new()));
        root.insert("odd key".to_string(), Document::Table(Table::new()));

        let text = TomlEngine::new().write(&root).unwrap();
        assert_eq!(
            text,
            "title = \"x\"\n\n[servers.alpha]\nip = \"10.0.0.1\"\n\n[empty]\n\n[\"odd key\"]\n"
        );
    }

    #[test]
    fn test_write_pretty_arrays() {
        let mut root = Table::new();
        root.insert(
            "ports".to_string(),
            Document::Array(vec![Document::from(8001), Document::from(8002)]),
        );
        root.insert("none".to_string(), Document::Array(vec![]));

        let text = TomlEngine::new().with_pretty(true).write(&root).unwrap();
        assert_eq!(text, "ports = [\n    8001,\n    8002,\n]\nnone = []\n");
    }

    #[test]
    fn test_write_rejects_offset_with_seconds() {
        let zone = FixedOffset::east_opt(3600 + 1).unwrap();
        let dt = zone.with_ymd_and_hms(1979, 5, 27, 7, 32, 0).unwrap();
        let mut root = Table::new();
        root.insert("at".to_string(), Document::OffsetDateTime(dt));
        assert!(matches!(
            TomlEngine::new().write(&root),
            Err(Error::Encode(_))
        ));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
        assert_eq!(line_column("中国\nx", 7), (2, 1));
    }

    #[test]
    fn test_write_array_of_tables() {
        let mut hammer = Table::new();
        hammer.insert("name".to_string(), Document::from("Hammer"));
        let mut nail = Table::new();
        nail.insert("name".to_string(), Document::from("Nail"));
        let mut root = Table::new();
        root.insert(
            "products".to_string(),
            Document::Array(vec![Document::Table(hammer), Document::Table(nail)]),
        );

        let text = TomlEngine::new().write(&root).unwrap();
        assert_eq!(text.matches("[[products]]").count(), 2);
    }

    #[test]
    fn test_write_temporal_values() {
        let time = NaiveTime::from_hms_milli_opt(7, 32, 0, 250).unwrap();
        let mut root = Table::new();
        root.insert("t".to_string(), Document::LocalTime(time));

        let text = TomlEngine::new().write(&root).unwrap();
        assert_eq!(text.trim(), "t = 07:32:00.25");

        let text = TomlEngine::new()
            .with_fractional_seconds(false)
            .write(&root)
            .unwrap();
        assert_eq!(text.trim(), "t = 07:32:00");
    }

    #[test]
    fn test_write_rejects_wide_integer() {
        let mut root = Table::new();
        root.insert(
            "n".to_string(),
            Document::Integer("1".repeat(30).parse().unwrap()),
        );
        assert!(matches!(
            TomlEngine::new().write(&root),
            Err(Error::Encode(_))
        ));
    }
}

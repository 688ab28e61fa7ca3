//! The typed intermediate document exchanged with the TOML engine.
//!
//! A [`Document`] is what the parsing engine produces and what the writing
//! engine consumes. Its root is always a [`Table`]; arrays of tables are
//! arrays whose elements are all tables.
//!
//! ## Why IndexMap?
//!
//! [`Table`] wraps an [`IndexMap`] so keys keep their document order through a
//! load and save. TOML itself is order-insensitive, but configuration files are
//! read by people and reordering keys on every save is hostile.
//!
//! ## Examples
//!
//! ```rust
//! use toml_node::{Document, Table};
//!
//! let mut table = Table::new();
//! table.insert("z".to_string(), Document::from(1));
//! table.insert("a".to_string(), Document::from("x"));
//!
//! let keys: Vec<_> = table.keys().cloned().collect();
//! assert_eq!(keys, vec!["z", "a"]);
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Serialize, Serializer};

/// A node of the intermediate document tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Table(Table),
    Array(Vec<Document>),
    Boolean(bool),
    /// Integers are arbitrary precision; the range check happens on conversion.
    Integer(BigInt),
    Float(f64),
    String(String),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
}

impl Document {
    /// Human-readable name of the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Document::Table(_) => "table",
            Document::Array(_) => "array",
            Document::Boolean(_) => "boolean",
            Document::Integer(_) => "integer",
            Document::Float(_) => "float",
            Document::String(_) => "string",
            Document::LocalDate(_) => "local date",
            Document::LocalTime(_) => "local time",
            Document::LocalDateTime(_) => "local date-time",
            Document::OffsetDateTime(_) => "offset date-time",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Document::Table(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Document::Array(_))
    }

    /// Returns `true` for a non-empty array whose elements are all tables.
    ///
    /// Writers render such arrays with the `[[name]]` syntax.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toml_node::{Document, Table};
    ///
    /// let tables = Document::Array(vec![Document::Table(Table::new())]);
    /// assert!(tables.is_array_of_tables());
    ///
    /// let mixed = Document::Array(vec![Document::Table(Table::new()), Document::from(1)]);
    /// assert!(!mixed.is_array_of_tables());
    /// ```
    #[must_use]
    pub fn is_array_of_tables(&self) -> bool {
        match self {
            Document::Array(items) => !items.is_empty() && items.iter().all(Document::is_table),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Document::Table(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Document>> {
        match self {
            Document::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Document::Table(t) => t.serialize(serializer),
            Document::Array(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Boolean(b) => serializer.serialize_bool(*b),
            Document::Integer(i) => match i64::try_from(i) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_str(&i.to_string()),
            },
            Document::Float(f) => serializer.serialize_f64(*f),
            Document::String(s) => serializer.serialize_str(s),
            Document::LocalDate(d) => serializer.serialize_str(&d.to_string()),
            Document::LocalTime(t) => serializer.serialize_str(&t.to_string()),
            Document::LocalDateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Document::OffsetDateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        }
    }
}

impl From<bool> for Document {
    fn from(value: bool) -> Self {
        Document::Boolean(value)
    }
}

impl From<i32> for Document {
    fn from(value: i32) -> Self {
        Document::Integer(BigInt::from(value))
    }
}

impl From<i64> for Document {
    fn from(value: i64) -> Self {
        Document::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Document {
    fn from(value: BigInt) -> Self {
        Document::Integer(value)
    }
}

impl From<f64> for Document {
    fn from(value: f64) -> Self {
        Document::Float(value)
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::String(value.to_string())
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::String(value)
    }
}

impl From<Table> for Document {
    fn from(value: Table) -> Self {
        Document::Table(value)
    }
}

impl From<Vec<Document>> for Document {
    fn from(value: Vec<Document>) -> Self {
        Document::Array(value)
    }
}

/// An ordered map of keys to documents.
///
/// # Examples
///
/// ```rust
/// use toml_node::{Document, Table};
///
/// let mut table = Table::new();
/// assert!(table.insert("key".to_string(), Document::from(42)).is_none());
/// assert!(table.insert("key".to_string(), Document::from(43)).is_some());
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table(IndexMap<String, Document>);

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Table(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Table(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, keeping the original position of an existing key.
    pub fn insert(&mut self, key: String, value: Document) -> Option<Document> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the table, in document order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Document> {
        self.0.keys()
    }

    /// Returns an iterator over the entries of the table, in document order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Document> {
        self.0.iter()
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl IntoIterator for Table {
    type Item = (String, Document);
    type IntoIter = indexmap::map::IntoIter<String, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a String, &'a Document);
    type IntoIter = indexmap::map::Iter<'a, String, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Document)> for Table {
    fn from_iter<T: IntoIterator<Item = (String, Document)>>(iter: T) -> Self {
        Table(IndexMap::from_iter(iter))
    }
}

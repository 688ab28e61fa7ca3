//! Scalar values held by configuration nodes.
//!
//! This module provides the [`Scalar`] enum, the closed set of leaf values a
//! [`ConfigNode`](crate::ConfigNode) can carry. The set is wider than TOML's own
//! scalar set: it also holds big integers, UTC instants, raw bytes and opaque
//! host objects. Only some of those have a TOML encoding; see
//! [`coerce`](crate::coerce) for the exact rules.
//!
//! ## Creating Values
//!
//! ```rust
//! use toml_node::Scalar;
//!
//! let flag = Scalar::from(true);
//! let port = Scalar::from(8080u16);
//! let name = Scalar::from("alpha");
//!
//! assert!(flag.is_bool());
//! assert_eq!(port.as_i64(), Some(8080));
//! assert_eq!(name.as_str(), Some("alpha"));
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use std::fmt;

/// A host object outside the native scalar set.
///
/// Opaque values are only writable when they carry a string rendering.
///
/// # Examples
///
/// ```rust
/// use toml_node::Opaque;
///
/// let uuid = Opaque::new("Uuid").with_rendering("6f1c7d0e-8c1b-4f5e-9a55-000000000001");
/// assert_eq!(uuid.type_name(), "Uuid");
/// assert!(uuid.rendering().is_some());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Opaque {
    type_name: String,
    rendering: Option<String>,
}

impl Opaque {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Opaque {
            type_name: type_name.into(),
            rendering: None,
        }
    }

    #[must_use]
    pub fn with_rendering(mut self, rendering: impl Into<String>) -> Self {
        self.rendering = Some(rendering.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn rendering(&self) -> Option<&str> {
        self.rendering.as_deref()
    }
}

/// The runtime type of a [`Scalar`], used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Integer,
    BigInteger,
    Float,
    String,
    LocalDate,
    LocalTime,
    LocalDateTime,
    OffsetDateTime,
    Instant,
    Bytes,
    Opaque,
}

impl ScalarKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::Integer => "integer",
            ScalarKind::BigInteger => "big integer",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::LocalDate => "local date",
            ScalarKind::LocalTime => "local time",
            ScalarKind::LocalDateTime => "local date-time",
            ScalarKind::OffsetDateTime => "offset date-time",
            ScalarKind::Instant => "instant",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf value of a configuration node.
///
/// # Examples
///
/// ```rust
/// use toml_node::Scalar;
/// use chrono::NaiveDate;
///
/// let day = Scalar::LocalDate(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap());
/// assert!(day.is_temporal());
/// assert_eq!(day.to_string(), "1979-05-27");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    BigInteger(BigInt),
    Float(f64),
    String(String),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    Instant(DateTime<Utc>),
    Bytes(Vec<u8>),
    Opaque(Opaque),
}

impl Scalar {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::BigInteger(_) => ScalarKind::BigInteger,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::String(_) => ScalarKind::String,
            Scalar::LocalDate(_) => ScalarKind::LocalDate,
            Scalar::LocalTime(_) => ScalarKind::LocalTime,
            Scalar::LocalDateTime(_) => ScalarKind::LocalDateTime,
            Scalar::OffsetDateTime(_) => ScalarKind::OffsetDateTime,
            Scalar::Instant(_) => ScalarKind::Instant,
            Scalar::Bytes(_) => ScalarKind::Bytes,
            Scalar::Opaque(_) => ScalarKind::Opaque,
        }
    }

    /// Name of the runtime type, including the opaque type name when there is one.
    pub fn type_name(&self) -> String {
        match self {
            Scalar::Opaque(o) => format!("opaque {}", o.type_name()),
            other => other.kind().as_str().to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Scalar::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Scalar::Integer(_) | Scalar::BigInteger(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Scalar::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Scalar::LocalDate(_)
                | Scalar::LocalTime(_)
                | Scalar::LocalDateTime(_)
                | Scalar::OffsetDateTime(_)
                | Scalar::Instant(_)
        )
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an `i64` for integers, in-range big integers and
    /// whole-number floats.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toml_node::Scalar;
    ///
    /// assert_eq!(Scalar::Integer(42).as_i64(), Some(42));
    /// assert_eq!(Scalar::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Scalar::Float(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            Scalar::BigInteger(b) => i64::try_from(b).ok(),
            Scalar::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::BigInteger(b) => write!(f, "{}", b),
            Scalar::Float(fl) => write!(f, "{}", fl),
            Scalar::String(s) => f.write_str(s),
            Scalar::LocalDate(d) => write!(f, "{}", d),
            Scalar::LocalTime(t) => write!(f, "{}", t),
            Scalar::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Scalar::OffsetDateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Scalar::Instant(dt) => f.write_str(&dt.to_rfc3339()),
            Scalar::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Scalar::Opaque(o) => match o.rendering() {
                Some(r) => f.write_str(r),
                None => write!(f, "<{}>", o.type_name()),
            },
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Bytes(bytes) => serializer.serialize_bytes(bytes),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i8> for Scalar {
    fn from(value: i8) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<i16> for Scalar {
    fn from(value: i16) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<u8> for Scalar {
    fn from(value: u8) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<u16> for Scalar {
    fn from(value: u16) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(value as i64)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Scalar::Integer(i),
            Err(_) => Scalar::BigInteger(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for Scalar {
    fn from(value: BigInt) -> Self {
        Scalar::BigInteger(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value as f64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::LocalDate(value)
    }
}

impl From<NaiveTime> for Scalar {
    fn from(value: NaiveTime) -> Self {
        Scalar::LocalTime(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::LocalDateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Scalar {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Scalar::OffsetDateTime(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Instant(value)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(value: Vec<u8>) -> Self {
        Scalar::Bytes(value)
    }
}

impl From<Opaque> for Scalar {
    fn from(value: Opaque) -> Self {
        Scalar::Opaque(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Scalar::from(true), Scalar::Bool(true));
        assert_eq!(Scalar::from(42i32), Scalar::Integer(42));
        assert_eq!(Scalar::from(42u8), Scalar::Integer(42));
        assert_eq!(Scalar::from(3.5f64), Scalar::Float(3.5));
        assert_eq!(Scalar::from("test"), Scalar::String("test".to_string()));
    }

    #[test]
    fn test_u64_widens_to_big_integer() {
        assert_eq!(Scalar::from(7u64), Scalar::Integer(7));
        let big = Scalar::from(u64::MAX);
        assert_eq!(big.kind(), ScalarKind::BigInteger);
        assert_eq!(big.as_i64(), None);
        assert_eq!(big.to_string(), u64::MAX.to_string());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Scalar::Bytes(vec![1, 2]).type_name(), "bytes");
        assert_eq!(
            Scalar::Opaque(Opaque::new("Uuid")).type_name(),
            "opaque Uuid"
        );
        assert!(Scalar::Instant(Utc::now()).is_temporal());
        assert!(!Scalar::Integer(1).is_temporal());
    }

    #[test]
    fn test_display_local_date_time() {
        let dt = NaiveDate::from_ymd_opt(1979, 5, 27)
            .unwrap()
            .and_hms_opt(7, 32, 0)
            .unwrap();
        assert_eq!(Scalar::LocalDateTime(dt).to_string(), "1979-05-27T07:32:00");
    }
}

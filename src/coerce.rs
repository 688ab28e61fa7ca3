//! Type coercion rules between document scalars and node scalars.
//!
//! The load direction is total apart from the integer range check:
//!
//! | Document | Node |
//! |---|---|
//! | boolean | [`Scalar::Bool`] |
//! | integer | [`Scalar::Integer`], or by [`IntegerOverflow`] policy when wider than 64 bits |
//! | float | [`Scalar::Float`] |
//! | string | [`Scalar::String`] |
//! | local date / time / date-time | [`Scalar::LocalDate`] / [`Scalar::LocalTime`] / [`Scalar::LocalDateTime`] |
//! | offset date-time | [`Scalar::OffsetDateTime`] |
//!
//! The save direction is partial. Instants are written as offset date-times in
//! the configured zone, opaque values as their string rendering. Bytes, opaque
//! values without a rendering, and integers wider than 64 bits under a
//! non-saturating policy fail with [`Error::UnrepresentableValue`].

use crate::context::ConversionContext;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::options::IntegerOverflow;
use crate::value::Scalar;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use log::debug;
use num_bigint::{BigInt, Sign};

/// Converts a scalar document into a node scalar.
///
/// # Errors
///
/// Fails with [`Error::RangeOverflow`] for an integer wider than 64 bits under
/// [`IntegerOverflow::Fail`], and for tables or arrays, which are not scalars.
pub fn load_scalar(document: &Document, ctx: &ConversionContext<'_>) -> Result<Scalar> {
    let scalar = match document {
        Document::Boolean(b) => Scalar::Bool(*b),
        Document::Integer(i) => load_integer(i, ctx)?,
        Document::Float(f) => Scalar::Float(*f),
        Document::String(s) => Scalar::String(s.clone()),
        Document::LocalDate(d) => Scalar::LocalDate(*d),
        Document::LocalTime(t) => Scalar::LocalTime(*t),
        Document::LocalDateTime(dt) => Scalar::LocalDateTime(*dt),
        Document::OffsetDateTime(dt) => Scalar::OffsetDateTime(*dt),
        Document::Table(_) | Document::Array(_) => {
            return Err(Error::custom(format!(
                "{} at {} is not a scalar",
                document.type_name(),
                ctx.path()
            )))
        }
    };
    Ok(scalar)
}

fn load_integer(value: &BigInt, ctx: &ConversionContext<'_>) -> Result<Scalar> {
    if let Ok(i) = i64::try_from(value) {
        return Ok(Scalar::Integer(i));
    }
    match ctx.integer_overflow() {
        IntegerOverflow::Fail => Err(Error::range_overflow(ctx.path(), value)),
        IntegerOverflow::Promote => {
            debug!("keeping {} at {} as a big integer", value, ctx.path());
            Ok(Scalar::BigInteger(value.clone()))
        }
        IntegerOverflow::Saturate => {
            debug!("clamping {} at {} to the 64-bit range", value, ctx.path());
            Ok(Scalar::Integer(saturate(value)))
        }
    }
}

fn saturate(value: &BigInt) -> i64 {
    match i64::try_from(value) {
        Ok(i) => i,
        Err(_) if value.sign() == Sign::Minus => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Converts a node scalar into a scalar document.
///
/// # Errors
///
/// Fails with [`Error::UnrepresentableValue`] when the scalar has no TOML encoding.
pub fn save_scalar(scalar: &Scalar, ctx: &ConversionContext<'_>) -> Result<Document> {
    let document = match scalar {
        Scalar::Bool(b) => Document::Boolean(*b),
        Scalar::Integer(i) => Document::Integer(BigInt::from(*i)),
        Scalar::BigInteger(b) => save_big_integer(b, ctx)?,
        Scalar::Float(f) => Document::Float(*f),
        Scalar::String(s) => Document::String(s.clone()),
        Scalar::LocalDate(d) => Document::LocalDate(*d),
        Scalar::LocalTime(t) => Document::LocalTime(*t),
        Scalar::LocalDateTime(dt) => Document::LocalDateTime(*dt),
        Scalar::OffsetDateTime(dt) => save_offset_date_time(*dt, scalar, ctx)?,
        Scalar::Instant(dt) => {
            save_offset_date_time(dt.with_timezone(&ctx.zone_offset()), scalar, ctx)?
        }
        Scalar::Bytes(_) => {
            return Err(Error::unrepresentable(
                ctx.path(),
                &scalar.type_name(),
                "TOML has no binary type",
            ))
        }
        Scalar::Opaque(o) => match o.rendering() {
            Some(rendering) => Document::String(rendering.to_string()),
            None => {
                return Err(Error::unrepresentable(
                    ctx.path(),
                    &scalar.type_name(),
                    "no string rendering",
                ))
            }
        },
    };
    Ok(document)
}

// TOML offsets carry hours and minutes only.
fn save_offset_date_time(
    dt: DateTime<FixedOffset>,
    scalar: &Scalar,
    ctx: &ConversionContext<'_>,
) -> Result<Document> {
    if dt.offset().local_minus_utc() % 60 != 0 {
        return Err(Error::unrepresentable(
            ctx.path(),
            &scalar.type_name(),
            &format!("offset {} has a seconds part", dt.offset()),
        ));
    }
    Ok(Document::OffsetDateTime(dt))
}

fn save_big_integer(value: &BigInt, ctx: &ConversionContext<'_>) -> Result<Document> {
    if i64::try_from(value).is_ok() {
        return Ok(Document::Integer(value.clone()));
    }
    match ctx.integer_overflow() {
        IntegerOverflow::Saturate => {
            debug!("clamping {} at {} to the 64-bit range", value, ctx.path());
            Ok(Document::Integer(BigInt::from(saturate(value))))
        }
        IntegerOverflow::Fail | IntegerOverflow::Promote => Err(Error::unrepresentable(
            ctx.path(),
            "big integer",
            "exceeds the 64-bit range of TOML integers",
        )),
    }
}

/// Reads a scalar as a UTC instant.
///
/// Instants and offset date-times convert directly, integers are taken as
/// milliseconds since the Unix epoch, and strings are parsed as RFC 3339.
/// Local temporal values have no offset and therefore no instant.
///
/// # Examples
///
/// ```rust
/// use toml_node::{coerce, Scalar};
///
/// let parsed = coerce::to_instant(&Scalar::from("1979-05-27T07:32:00Z")).unwrap();
/// let millis = coerce::to_instant(&Scalar::Integer(296638320000)).unwrap();
/// assert_eq!(parsed, millis);
/// assert!(coerce::to_instant(&Scalar::Bool(true)).is_none());
/// ```
#[must_use]
pub fn to_instant(scalar: &Scalar) -> Option<DateTime<Utc>> {
    match scalar {
        Scalar::Instant(dt) => Some(*dt),
        Scalar::OffsetDateTime(dt) => Some(dt.with_timezone(&Utc)),
        Scalar::Integer(millis) => Utc.timestamp_millis_opt(*millis).single(),
        Scalar::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConversionSettings;
    use crate::node::NodeKey;
    use crate::value::Opaque;
    use chrono::NaiveDate;

    fn forty_digits() -> BigInt {
        "1234567890123456789012345678901234567890".parse().unwrap()
    }

    #[test]
    fn test_load_scalars() {
        let settings = ConversionSettings::default();
        let ctx = ConversionContext::root(&settings);
        assert_eq!(
            load_scalar(&Document::Boolean(true), &ctx).unwrap(),
            Scalar::Bool(true)
        );
        assert_eq!(
            load_scalar(&Document::from(8001), &ctx).unwrap(),
            Scalar::Integer(8001)
        );
        assert_eq!(
            load_scalar(&Document::from("中国"), &ctx).unwrap(),
            Scalar::String("中国".to_string())
        );
        let day = NaiveDate::from_ymd_opt(1979, 5, 27).unwrap();
        assert_eq!(
            load_scalar(&Document::LocalDate(day), &ctx).unwrap(),
            Scalar::LocalDate(day)
        );
    }

    #[test]
    fn test_load_overflow_policies() {
        let value = Document::Integer(forty_digits());

        let strict = ConversionSettings::default();
        let err = load_scalar(&value, &ConversionContext::root(&strict)).unwrap_err();
        assert!(matches!(err, Error::RangeOverflow { .. }));

        let promote = ConversionSettings::default().with_integer_overflow(IntegerOverflow::Promote);
        assert_eq!(
            load_scalar(&value, &ConversionContext::root(&promote)).unwrap(),
            Scalar::BigInteger(forty_digits())
        );

        let saturate =
            ConversionSettings::default().with_integer_overflow(IntegerOverflow::Saturate);
        let ctx = ConversionContext::root(&saturate);
        assert_eq!(load_scalar(&value, &ctx).unwrap(), Scalar::Integer(i64::MAX));
        assert_eq!(
            load_scalar(&Document::Integer(-forty_digits()), &ctx).unwrap(),
            Scalar::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_save_instant_uses_zone_offset() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let settings = ConversionSettings::default().with_zone_offset(zone);
        let ctx = ConversionContext::root(&settings);
        let instant = Utc.with_ymd_and_hms(1979, 5, 27, 7, 32, 0).unwrap();

        match save_scalar(&Scalar::Instant(instant), &ctx).unwrap() {
            Document::OffsetDateTime(dt) => {
                assert_eq!(dt.offset(), &zone);
                assert_eq!(dt.to_rfc3339(), "1979-05-27T09:32:00+02:00");
            }
            other => panic!("expected an offset date-time, got {:?}", other),
        }
    }

    #[test]
    fn test_save_rejects_offsets_with_seconds() {
        let zone = FixedOffset::east_opt(5 * 3600 + 30 * 60 + 15).unwrap();
        let settings = ConversionSettings::default().with_zone_offset(zone);
        let ctx = ConversionContext::root(&settings).child(NodeKey::from("at"));
        let instant = Utc.with_ymd_and_hms(1979, 5, 27, 7, 32, 0).unwrap();

        match save_scalar(&Scalar::Instant(instant), &ctx).unwrap_err() {
            Error::UnrepresentableValue { path, type_name, .. } => {
                assert_eq!(path.to_string(), "at");
                assert_eq!(type_name, "instant");
            }
            other => panic!("expected an unrepresentable value, got {:?}", other),
        }

        let odt = instant.with_timezone(&zone);
        assert!(save_scalar(&Scalar::OffsetDateTime(odt), &ctx).is_err());

        let minutes = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let odt = instant.with_timezone(&minutes);
        assert_eq!(
            save_scalar(&Scalar::OffsetDateTime(odt), &ctx).unwrap(),
            Document::OffsetDateTime(odt)
        );
    }

    #[test]
    fn test_save_rejects_unrepresentable() {
        let settings = ConversionSettings::default();
        let ctx = ConversionContext::root(&settings);

        let err = save_scalar(&Scalar::Bytes(vec![0xCA, 0xFE]), &ctx).unwrap_err();
        assert!(matches!(err, Error::UnrepresentableValue { ref type_name, .. } if type_name == "bytes"));

        let err = save_scalar(&Scalar::Opaque(Opaque::new("Handle")), &ctx).unwrap_err();
        assert!(err.to_string().contains("opaque Handle"));

        let rendered = Opaque::new("Uuid").with_rendering("abc");
        assert_eq!(
            save_scalar(&Scalar::Opaque(rendered), &ctx).unwrap(),
            Document::from("abc")
        );
    }

    #[test]
    fn test_save_big_integer() {
        let strict = ConversionSettings::default();
        let ctx = ConversionContext::root(&strict);
        assert_eq!(
            save_scalar(&Scalar::BigInteger(BigInt::from(5)), &ctx).unwrap(),
            Document::from(5)
        );
        assert!(save_scalar(&Scalar::BigInteger(forty_digits()), &ctx).is_err());

        let promote = ConversionSettings::default().with_integer_overflow(IntegerOverflow::Promote);
        assert!(
            save_scalar(&Scalar::BigInteger(forty_digits()), &ConversionContext::root(&promote))
                .is_err()
        );

        let saturate =
            ConversionSettings::default().with_integer_overflow(IntegerOverflow::Saturate);
        assert_eq!(
            save_scalar(&Scalar::BigInteger(forty_digits()), &ConversionContext::root(&saturate))
                .unwrap(),
            Document::from(i64::MAX)
        );
    }

    #[test]
    fn test_to_instant_local_values_have_none() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(to_instant(&Scalar::LocalDate(day)).is_none());
        assert!(to_instant(&Scalar::from("not a date")).is_none());
    }
}

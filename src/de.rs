//! Serde deserialization out of node trees.
//!
//! [`from_node`] reads any `T: Deserialize` from a [`ConfigNode`], borrowing
//! strings from the tree where the target type allows it.
//!
//! Temporal scalars are handed to visitors as strings (RFC 3339 for offset
//! date-times and instants, ISO 8601 for local values), which is the form
//! `chrono`'s serde support reads. Null nodes read as `None` or `()`.
//!
//! ```rust
//! use serde::Deserialize;
//! use toml_node::{from_node, Loader};
//!
//! #[derive(Deserialize)]
//! struct Owner { name: String, dob: chrono::DateTime<chrono::Utc> }
//!
//! let root = Loader::builder()
//!     .build()
//!     .load_str("[owner]\nname = \"Tom\"\ndob = 1979-05-27T07:32:00-08:00\n")
//!     .unwrap();
//! let owner: Owner = from_node(root.child("owner").unwrap()).unwrap();
//! assert_eq!(owner.name, "Tom");
//! assert_eq!(owner.dob.to_rfc3339(), "1979-05-27T15:32:00+00:00");
//! ```

use crate::error::{Error, Result};
use crate::node::{ConfigNode, NodeKey, NodeValue};
use crate::value::Scalar;
use serde::de::{self, Deserialize, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Deserializes an instance of `T` from `node`.
///
/// # Errors
///
/// Fails when the node's shape or scalar types do not match `T`.
pub fn from_node<'de, T>(node: &'de ConfigNode) -> Result<T>
where
    T: Deserialize<'de>,
{
    T::deserialize(NodeDeserializer::new(node))
}

/// A serde [`Deserializer`](de::Deserializer) reading from a borrowed [`ConfigNode`].
#[derive(Clone, Copy, Debug)]
pub struct NodeDeserializer<'de> {
    node: &'de ConfigNode,
}

impl<'de> NodeDeserializer<'de> {
    #[must_use]
    pub fn new(node: &'de ConfigNode) -> Self {
        NodeDeserializer { node }
    }
}

fn visit_scalar<'de, V>(scalar: &'de Scalar, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    match scalar {
        Scalar::Bool(b) => visitor.visit_bool(*b),
        Scalar::Integer(i) => visitor.visit_i64(*i),
        Scalar::BigInteger(b) => {
            if let Ok(u) = u64::try_from(b) {
                visitor.visit_u64(u)
            } else if let Ok(i) = i128::try_from(b) {
                visitor.visit_i128(i)
            } else {
                visitor.visit_string(b.to_string())
            }
        }
        Scalar::Float(f) => visitor.visit_f64(*f),
        Scalar::String(s) => visitor.visit_borrowed_str(s),
        Scalar::LocalDate(d) => visitor.visit_string(d.format("%Y-%m-%d").to_string()),
        Scalar::LocalTime(t) => visitor.visit_string(t.format("%H:%M:%S%.f").to_string()),
        Scalar::LocalDateTime(dt) => {
            visitor.visit_string(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        Scalar::OffsetDateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
        Scalar::Instant(dt) => visitor.visit_string(dt.to_rfc3339()),
        Scalar::Bytes(bytes) => visitor.visit_borrowed_bytes(bytes),
        Scalar::Opaque(o) => match o.rendering() {
            Some(rendering) => visitor.visit_borrowed_str(rendering),
            None => Err(Error::custom(format!(
                "opaque {} value has no string rendering",
                o.type_name()
            ))),
        },
    }
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.node.value() {
            NodeValue::Null => visitor.visit_unit(),
            NodeValue::Scalar(scalar) => visit_scalar(scalar, visitor),
            NodeValue::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            NodeValue::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.node.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.node.value() {
            NodeValue::Scalar(Scalar::String(variant)) => {
                visitor.visit_enum(variant.as_str().into_deserializer())
            }
            NodeValue::Map(map) if map.len() == 1 => match map.iter().next() {
                Some((NodeKey::Name(variant), value)) => {
                    visitor.visit_enum(EnumDeserializer {
                        variant: variant.as_str(),
                        value,
                    })
                }
                _ => Err(Error::custom(format!(
                    "enum at {} must be keyed by a variant name",
                    self.node.path()
                ))),
            },
            other => Err(Error::custom(format!(
                "expected a variant name or a single-entry map at {}, found {}",
                self.node.path(),
                other.shape_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer<'de> {
    iter: std::slice::Iter<'de, ConfigNode>,
}

impl<'de> SeqDeserializer<'de> {
    fn new(items: &'de [ConfigNode]) -> Self {
        SeqDeserializer { iter: items.iter() }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(node) => seed.deserialize(NodeDeserializer::new(node)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer<'de> {
    iter: indexmap::map::Iter<'de, NodeKey, ConfigNode>,
    value: Option<&'de ConfigNode>,
}

impl<'de> MapDeserializer<'de> {
    fn new(map: &'de indexmap::IndexMap<NodeKey, ConfigNode>) -> Self {
        MapDeserializer {
            iter: map.iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(KeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(node) => seed.deserialize(NodeDeserializer::new(node)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Map keys read as strings, or as integers when the target key type asks
/// for one.
struct KeyDeserializer<'de> {
    key: &'de NodeKey,
}

impl<'de> KeyDeserializer<'de> {
    fn integer<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.key {
            NodeKey::Index(i) => visitor.visit_i64(*i),
            NodeKey::Name(name) => match name.parse::<i64>() {
                Ok(i) => visitor.visit_i64(i),
                Err(_) => visitor.visit_borrowed_str(name),
            },
        }
    }
}

macro_rules! deserialize_integer_key {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                self.integer(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.key {
            NodeKey::Name(name) => visitor.visit_borrowed_str(name),
            NodeKey::Index(i) => visitor.visit_string(i.to_string()),
        }
    }

    deserialize_integer_key! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    forward_to_deserialize_any! {
        bool i128 u128 f32 f64 char str string bytes byte_buf option unit
        unit_struct newtype_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}

struct EnumDeserializer<'de> {
    variant: &'de str,
    value: &'de ConfigNode,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant =
            seed.deserialize(IntoDeserializer::<'_, Error>::into_deserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer<'de> {
    value: &'de ConfigNode,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        if self.value.is_null() {
            Ok(())
        } else {
            Err(Error::custom(format!(
                "expected a unit variant at {}",
                self.value.path()
            )))
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(NodeDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value.children_list() {
            Some(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            None => Err(Error::custom(format!(
                "expected a tuple variant at {}",
                self.value.path()
            ))),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value.children_map() {
            Some(map) => visitor.visit_map(MapDeserializer::new(map)),
            None => Err(Error::custom(format!(
                "expected a struct variant at {}",
                self.value.path()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::to_node;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Database {
        enabled: bool,
        ports: Vec<u16>,
        temp_targets: HashMap<String, f64>,
        replica: Option<String>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Mode {
        Off,
        Fixed(u8),
        Range { min: i32, max: i32 },
    }

    #[test]
    fn test_struct_roundtrip_through_node() {
        let db = Database {
            enabled: true,
            ports: vec![8001, 8001, 8002],
            temp_targets: HashMap::from([("cpu".to_string(), 79.5)]),
            replica: None,
        };
        let node = to_node(&db).unwrap();
        let back: Database = from_node(&node).unwrap();
        assert_eq!(back, db);
    }

    #[test]
    fn test_enums() {
        for mode in [Mode::Off, Mode::Fixed(7), Mode::Range { min: -1, max: 1 }] {
            let node = to_node(&mode).unwrap();
            let back: Mode = from_node(&node).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_temporal_scalars_read_as_chrono_types() {
        let mut root = ConfigNode::new();
        root.child_mut("day")
            .set(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap());
        root.child_mut("at").set(
            DateTime::parse_from_rfc3339("1979-05-27T00:32:00-07:00").unwrap(),
        );

        let day: NaiveDate = from_node(root.child("day").unwrap()).unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(1979, 5, 27).unwrap());
        let at: DateTime<Utc> = from_node(root.child("at").unwrap()).unwrap();
        assert_eq!(at.to_rfc3339(), "1979-05-27T07:32:00+00:00");
    }

    #[test]
    fn test_integer_map_keys() {
        let mut root = ConfigNode::new();
        root.child_mut("1").set("one");
        root.child_mut(NodeKey::Index(2)).set("two");
        let map: HashMap<u32, String> = from_node(&root).unwrap();
        assert_eq!(map.get(&1).map(String::as_str), Some("one"));
        assert_eq!(map.get(&2).map(String::as_str), Some("two"));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut root = ConfigNode::new();
        root.child_mut("enabled").set("yes");
        root.child_mut("ports").set_empty_list();
        root.child_mut("temp_targets").set_empty_map();
        assert!(from_node::<Database>(&root).is_err());
    }
}

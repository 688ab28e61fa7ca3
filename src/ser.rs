//! Serde serialization into node trees.
//!
//! [`to_node`] turns any `T: Serialize` into a [`ConfigNode`], which can then
//! be saved by a [`Loader`](crate::Loader) or merged into an existing tree.
//!
//! ## Mapping
//!
//! - **Structs and maps** become map nodes, in field order
//! - **Sequences and tuples** become list nodes
//! - **Enums** are externally tagged: unit variants become strings, other
//!   variants a single-entry map `{ variant = value }`
//! - **`None`** struct fields and map values are omitted, since TOML has no
//!   null; a top-level `None` or `()` becomes a null node
//! - **Bytes** become a [`Scalar::Bytes`] node, which saving rejects
//!
//! ```rust
//! use serde::Serialize;
//! use toml_node::to_node;
//!
//! #[derive(Serialize)]
//! struct Server { ip: String, port: u16, backup: Option<String> }
//!
//! let node = to_node(&Server { ip: "10.0.0.1".into(), port: 8080, backup: None }).unwrap();
//! assert_eq!(node.child("port").unwrap().as_i64(), Some(8080));
//! assert!(node.child("backup").is_none());
//! ```

use crate::error::{Error, Result};
use crate::node::{ConfigNode, NodeKey, NodeOptions};
use crate::value::Scalar;
use num_bigint::BigInt;
use serde::{ser, Serialize};

/// Serializes `value` into a new root node with default options.
///
/// # Errors
///
/// Fails for map keys that are neither strings nor integers, and for errors
/// raised by the value's own `Serialize` impl.
pub fn to_node<T>(value: &T) -> Result<ConfigNode>
where
    T: ?Sized + Serialize,
{
    to_node_with_options(value, NodeOptions::default())
}

/// Serializes `value` into a new root node carrying `options`.
///
/// # Errors
///
/// Same as [`to_node`].
pub fn to_node_with_options<T>(value: &T, options: NodeOptions) -> Result<ConfigNode>
where
    T: ?Sized + Serialize,
{
    value.serialize(NodeSerializer::new(options))
}

/// A serde [`Serializer`](ser::Serializer) producing detached [`ConfigNode`]s.
#[derive(Clone, Debug, Default)]
pub struct NodeSerializer {
    options: NodeOptions,
}

impl NodeSerializer {
    #[must_use]
    pub fn new(options: NodeOptions) -> Self {
        NodeSerializer { options }
    }

    fn node(&self) -> ConfigNode {
        ConfigNode::root(self.options.clone())
    }

    fn scalar(&self, value: impl Into<Scalar>) -> ConfigNode {
        let mut node = self.node();
        node.set(value);
        node
    }

    fn serialize_child<T>(&self, value: &T) -> Result<ConfigNode>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.clone())
    }

    fn tagged(&self, variant: &'static str, value: ConfigNode) -> ConfigNode {
        let mut node = self.node();
        node.child_mut(variant).set_node(value);
        node
    }
}

impl ser::Serializer for NodeSerializer {
    type Ok = ConfigNode;
    type Error = Error;

    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeList;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_i8(self, v: i8) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_i16(self, v: i16) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_i32(self, v: i32) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_i64(self, v: i64) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_i128(self, v: i128) -> Result<ConfigNode> {
        Ok(match i64::try_from(v) {
            Ok(i) => self.scalar(i),
            Err(_) => self.scalar(BigInt::from(v)),
        })
    }

    fn serialize_u8(self, v: u8) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_u16(self, v: u16) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_u32(self, v: u32) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_u64(self, v: u64) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_u128(self, v: u128) -> Result<ConfigNode> {
        Ok(match i64::try_from(v) {
            Ok(i) => self.scalar(i),
            Err(_) => self.scalar(BigInt::from(v)),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_f64(self, v: f64) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_char(self, v: char) -> Result<ConfigNode> {
        Ok(self.scalar(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<ConfigNode> {
        Ok(self.scalar(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ConfigNode> {
        Ok(self.scalar(v.to_vec()))
    }

    fn serialize_none(self) -> Result<ConfigNode> {
        Ok(self.node())
    }

    fn serialize_some<T>(self, value: &T) -> Result<ConfigNode>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ConfigNode> {
        Ok(self.node())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ConfigNode> {
        Ok(self.node())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ConfigNode> {
        Ok(self.scalar(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<ConfigNode>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ConfigNode>
    where
        T: ?Sized + Serialize,
    {
        let inner = self.serialize_child(value)?;
        Ok(self.tagged(variant, inner))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SerializeList> {
        Ok(SerializeList::new(self, None))
    }

    fn serialize_tuple(self, _len: usize) -> Result<SerializeList> {
        Ok(SerializeList::new(self, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<SerializeList> {
        Ok(SerializeList::new(self, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeList> {
        Ok(SerializeList::new(self, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(self, None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(self, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(self, Some(variant)))
    }
}

pub struct SerializeList {
    ser: NodeSerializer,
    node: ConfigNode,
    variant: Option<&'static str>,
}

impl SerializeList {
    fn new(ser: NodeSerializer, variant: Option<&'static str>) -> Self {
        let mut node = ser.node();
        node.set_empty_list();
        SerializeList { ser, node, variant }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let item = self.ser.serialize_child(value)?;
        self.node.append_list_node().set_node(item);
        Ok(())
    }

    fn finish(self) -> ConfigNode {
        match self.variant {
            Some(variant) => self.ser.tagged(variant, self.node),
            None => self.node,
        }
    }
}

impl ser::SerializeSeq for SerializeList {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeList {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeList {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeList {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

pub struct SerializeMap {
    ser: NodeSerializer,
    node: ConfigNode,
    variant: Option<&'static str>,
    current_key: Option<NodeKey>,
}

impl SerializeMap {
    fn new(ser: NodeSerializer, variant: Option<&'static str>) -> Self {
        let mut node = ser.node();
        node.set_empty_map();
        SerializeMap {
            ser,
            node,
            variant,
            current_key: None,
        }
    }

    fn insert<T>(&mut self, key: NodeKey, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let child = self.ser.serialize_child(value)?;
        if !child.is_null() {
            self.node.child_mut(key).set_node(child);
        }
        Ok(())
    }

    fn finish(self) -> ConfigNode {
        match self.variant {
            Some(variant) => self.ser.tagged(variant, self.node),
            None => self.node,
        }
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key_node = self.ser.serialize_child(key)?;
        let key = match key_node.scalar() {
            Some(Scalar::String(s)) => NodeKey::Name(s.clone()),
            Some(Scalar::Integer(i)) => NodeKey::Index(*i),
            Some(Scalar::Bool(b)) => NodeKey::Name(b.to_string()),
            _ => return Err(Error::custom("map keys must be strings or integers")),
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(NodeKey::from(key), value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = ConfigNode;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(NodeKey::from(key), value)
    }

    fn end(self) -> Result<ConfigNode> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::KeyOrder;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Product {
        name: String,
        sku: u64,
        color: Option<String>,
    }

    #[derive(Serialize)]
    enum Mode {
        Off,
        Fixed(u8),
        Range { min: i32, max: i32 },
    }

    #[test]
    fn test_struct_and_list() {
        let products = vec![
            Product {
                name: "Hammer".to_string(),
                sku: 738594937,
                color: None,
            },
            Product {
                name: "Nail".to_string(),
                sku: 284758393,
                color: Some("gray".to_string()),
            },
        ];
        let node = to_node(&products).unwrap();
        let items = node.children_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].child("sku").unwrap().as_i64(), Some(738594937));
        assert!(items[0].child("color").is_none());
        assert_eq!(items[1].child("color").unwrap().as_str(), Some("gray"));
        assert_eq!(items[1].child("name").unwrap().path().to_string(), "[1].name");
    }

    #[test]
    fn test_enums_are_externally_tagged() {
        assert_eq!(to_node(&Mode::Off).unwrap().as_str(), Some("Off"));

        let fixed = to_node(&Mode::Fixed(3)).unwrap();
        assert_eq!(fixed.child("Fixed").unwrap().as_i64(), Some(3));

        let range = to_node(&Mode::Range { min: 1, max: 5 }).unwrap();
        assert_eq!(range.at(["Range", "max"]).unwrap().as_i64(), Some(5));
    }

    #[test]
    fn test_integer_keys_and_big_values() {
        let mut map = BTreeMap::new();
        map.insert(2_i64, u64::MAX);
        let node = to_node(&map).unwrap();
        let child = node.child(NodeKey::Index(2)).unwrap();
        assert_eq!(
            child.scalar(),
            Some(&Scalar::BigInteger(BigInt::from(u64::MAX)))
        );
    }

    #[test]
    fn test_options_are_applied() {
        let mut map = indexmap::IndexMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        let node =
            to_node_with_options(&map, NodeOptions::new().with_key_order(KeyOrder::Sorted))
                .unwrap();
        let keys: Vec<String> = node
            .children_map()
            .unwrap()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_rejects_composite_keys() {
        let mut map = BTreeMap::new();
        map.insert(vec![1, 2], "x");
        assert!(to_node(&map).is_err());
    }
}

//! Hierarchical configuration nodes.
//!
//! A [`ConfigNode`] is a mutable tree of maps, lists and scalars. Every node
//! knows its [`NodePath`] from the root, may carry a comment, and hands its
//! [`NodeOptions`] down to every child it creates.
//!
//! ## Addressing
//!
//! ```rust
//! use toml_node::ConfigNode;
//!
//! let mut root = ConfigNode::new();
//! root.at_mut(["database", "server"]).set("192.168.1.1");
//! root.at_mut(["database", "ports"]).append_list_node().set(8001);
//!
//! assert_eq!(root.at(["database", "server"]).and_then(|n| n.as_str()), Some("192.168.1.1"));
//! assert_eq!(root.at(["database", "ports"]).unwrap().path().to_string(), "database.ports");
//! ```
//!
//! Reading with [`ConfigNode::at`] never creates nodes; [`ConfigNode::at_mut`]
//! creates intermediate maps as needed.

use crate::coerce;
use crate::value::Scalar;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A key addressing a child node.
///
/// List children are addressed by [`NodeKey::Index`]. Maps accept both kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Name(String),
    Index(i64),
}

impl NodeKey {
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            NodeKey::Name(name) => Some(name),
            NodeKey::Index(_) => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Name(name) => f.write_str(name),
            NodeKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey::Name(value.to_string())
    }
}

impl From<&String> for NodeKey {
    fn from(value: &String) -> Self {
        NodeKey::Name(value.clone())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        NodeKey::Name(value)
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        NodeKey::Index(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        NodeKey::Index(value as i64)
    }
}

impl From<usize> for NodeKey {
    fn from(value: usize) -> Self {
        NodeKey::Index(value as i64)
    }
}

/// The sequence of keys leading from the root to a node.
///
/// # Examples
///
/// ```rust
/// use toml_node::{NodeKey, NodePath};
///
/// let path = NodePath::root()
///     .child(NodeKey::from("products"))
///     .child(NodeKey::Index(0))
///     .child(NodeKey::from("name"));
/// assert_eq!(path.to_string(), "products[0].name");
/// assert_eq!(NodePath::root().to_string(), "<root>");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<NodeKey>);

impl NodePath {
    #[must_use]
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    /// Returns a new path extended by `key`.
    #[must_use]
    pub fn child(&self, key: NodeKey) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(key);
        NodePath(segments)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[NodeKey] {
        &self.0
    }

    #[must_use]
    pub fn last(&self) -> Option<&NodeKey> {
        self.0.last()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, key) in self.0.iter().enumerate() {
            match key {
                NodeKey::Index(index) => write!(f, "[{}]", index)?,
                NodeKey::Name(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
            }
        }
        Ok(())
    }
}

/// Ordering applied to the children of map nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyOrder {
    /// Children keep the order they were inserted in.
    #[default]
    Insertion,
    /// Children are kept sorted by key.
    Sorted,
}

/// Construction options inherited by every node created beneath a root.
///
/// # Examples
///
/// ```rust
/// use toml_node::{ConfigNode, KeyOrder, NodeOptions};
///
/// let mut root = ConfigNode::root(NodeOptions::new().with_key_order(KeyOrder::Sorted));
/// root.child_mut("b").set(1);
/// root.child_mut("a").set(2);
///
/// let keys: Vec<String> = root.children_map().unwrap().keys().map(|k| k.to_string()).collect();
/// assert_eq!(keys, vec!["a", "b"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeOptions {
    pub key_order: KeyOrder,
}

impl NodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }
}

/// The content of a node.
#[derive(Clone, Debug, Default)]
pub enum NodeValue {
    /// No value. Written nowhere; rejected by the serializer.
    #[default]
    Null,
    Scalar(Scalar),
    List(Vec<ConfigNode>),
    Map(IndexMap<NodeKey, ConfigNode>),
}

impl NodeValue {
    /// Name of the node shape, used in diagnostics.
    #[must_use]
    pub fn shape_name(&self) -> String {
        match self {
            NodeValue::Null => "null".to_string(),
            NodeValue::Scalar(s) => format!("scalar ({})", s.type_name()),
            NodeValue::List(_) => "list".to_string(),
            NodeValue::Map(_) => "map".to_string(),
        }
    }
}

// Maps compare in order: two maps with the same entries in a different order differ.
impl PartialEq for NodeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeValue::Null, NodeValue::Null) => true,
            (NodeValue::Scalar(a), NodeValue::Scalar(b)) => a == b,
            (NodeValue::List(a), NodeValue::List(b)) => a == b,
            (NodeValue::Map(a), NodeValue::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            _ => false,
        }
    }
}

/// A node of a configuration tree.
///
/// Equality compares values and comments; paths and options are ignored.
#[derive(Clone, Debug, Default)]
pub struct ConfigNode {
    path: NodePath,
    comment: Option<String>,
    options: NodeOptions,
    value: NodeValue,
}

impl PartialEq for ConfigNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.comment == other.comment
    }
}

impl ConfigNode {
    /// Creates an empty root node with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::root(NodeOptions::default())
    }

    /// Creates an empty root node with the given options.
    #[must_use]
    pub fn root(options: NodeOptions) -> Self {
        ConfigNode {
            path: NodePath::root(),
            comment: None,
            options,
            value: NodeValue::Null,
        }
    }

    fn detached(path: NodePath, options: NodeOptions) -> Self {
        ConfigNode {
            path,
            comment: None,
            options,
            value: NodeValue::Null,
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// The key of this node within its parent, `None` for the root.
    #[must_use]
    pub fn key(&self) -> Option<&NodeKey> {
        self.path.last()
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn clear_comment(&mut self) -> &mut Self {
        self.comment = None;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.value, NodeValue::Null)
    }

    #[inline]
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self.value, NodeValue::Map(_))
    }

    #[inline]
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self.value, NodeValue::List(_))
    }

    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.value, NodeValue::Scalar(_))
    }

    #[must_use]
    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn children_map(&self) -> Option<&IndexMap<NodeKey, ConfigNode>> {
        match &self.value {
            NodeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn children_list(&self) -> Option<&[ConfigNode]> {
        match &self.value {
            NodeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Replaces the value with a scalar.
    pub fn set(&mut self, value: impl Into<Scalar>) -> &mut Self {
        self.value = NodeValue::Scalar(value.into());
        self
    }

    pub fn set_null(&mut self) -> &mut Self {
        self.value = NodeValue::Null;
        self
    }

    pub fn set_empty_map(&mut self) -> &mut Self {
        self.value = NodeValue::Map(IndexMap::new());
        self
    }

    pub fn set_empty_list(&mut self) -> &mut Self {
        self.value = NodeValue::List(Vec::new());
        self
    }

    /// Replaces value and comment with those of `other`, keeping this node's
    /// position in the tree.
    pub fn set_node(&mut self, other: ConfigNode) -> &mut Self {
        self.comment = other.comment;
        self.value = other.value;
        let path = self.path.clone();
        let options = self.options.clone();
        self.rebase(path, &options);
        self
    }

    /// Gives this node and every node beneath it `options`.
    ///
    /// Maps are re-sorted when the new options ask for sorted keys.
    pub fn set_options(&mut self, options: NodeOptions) -> &mut Self {
        let path = self.path.clone();
        self.rebase(path, &options);
        self
    }

    fn rebase(&mut self, path: NodePath, options: &NodeOptions) {
        self.options = options.clone();
        match &mut self.value {
            NodeValue::List(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    item.rebase(path.child(NodeKey::from(i)), options);
                }
            }
            NodeValue::Map(map) => {
                for (key, child) in map.iter_mut() {
                    child.rebase(path.child(key.clone()), options);
                }
                if options.key_order == KeyOrder::Sorted {
                    map.sort_keys();
                }
            }
            NodeValue::Null | NodeValue::Scalar(_) => {}
        }
        self.path = path;
    }

    fn map_mut(&mut self) -> &mut IndexMap<NodeKey, ConfigNode> {
        if !self.is_map() {
            self.value = NodeValue::Map(IndexMap::new());
        }
        match &mut self.value {
            NodeValue::Map(map) => map,
            _ => unreachable!("node was just converted to a map"),
        }
    }

    fn list_mut(&mut self) -> &mut Vec<ConfigNode> {
        if !self.is_list() {
            self.value = NodeValue::List(Vec::new());
        }
        match &mut self.value {
            NodeValue::List(items) => items,
            _ => unreachable!("node was just converted to a list"),
        }
    }

    /// Appends an empty child to this node, turning it into a list first if needed.
    pub fn append_list_node(&mut self) -> &mut ConfigNode {
        let options = self.options.clone();
        let base = self.path.clone();
        let items = self.list_mut();
        let path = base.child(NodeKey::from(items.len()));
        items.push(ConfigNode::detached(path, options));
        let last = items.len() - 1;
        &mut items[last]
    }

    fn map_child(&mut self, key: NodeKey) -> &mut ConfigNode {
        let path = self.path.child(key.clone());
        let options = self.options.clone();
        let sorted = options.key_order == KeyOrder::Sorted;
        let map = self.map_mut();
        if sorted && !map.contains_key(&key) {
            map.insert(
                key.clone(),
                ConfigNode::detached(path.clone(), options.clone()),
            );
            map.sort_keys();
        }
        map.entry(key)
            .or_insert_with(|| ConfigNode::detached(path, options))
    }

    /// Returns the child at `key`, creating it when missing.
    ///
    /// On a list node, an index key addresses an existing element or, when
    /// equal to the length, appends one. Any other key turns the node into a map.
    pub fn child_mut(&mut self, key: impl Into<NodeKey>) -> &mut ConfigNode {
        let key = key.into();
        let list_slot = match (&key, &self.value) {
            (NodeKey::Index(i), NodeValue::List(items)) => usize::try_from(*i)
                .ok()
                .filter(|index| *index <= items.len())
                .map(|index| (index, items.len())),
            _ => None,
        };
        if let Some((index, len)) = list_slot {
            if index == len {
                return self.append_list_node();
            }
            return &mut self.list_mut()[index];
        }
        self.map_child(key)
    }

    /// Returns the child at `key` without creating anything.
    #[must_use]
    pub fn child(&self, key: impl Into<NodeKey>) -> Option<&ConfigNode> {
        let key = key.into();
        match (&self.value, &key) {
            (NodeValue::Map(map), _) => map.get(&key),
            (NodeValue::List(items), NodeKey::Index(i)) => {
                usize::try_from(*i).ok().and_then(|index| items.get(index))
            }
            _ => None,
        }
    }

    /// Follows `path` from this node, creating missing nodes along the way.
    pub fn at_mut<I, K>(&mut self, path: I) -> &mut ConfigNode
    where
        I: IntoIterator<Item = K>,
        K: Into<NodeKey>,
    {
        path.into_iter()
            .fold(self, |node, key| node.child_mut(key))
    }

    /// Follows `path` from this node.
    #[must_use]
    pub fn at<I, K>(&self, path: I) -> Option<&ConfigNode>
    where
        I: IntoIterator<Item = K>,
        K: Into<NodeKey>,
    {
        path.into_iter()
            .try_fold(self, |node, key| node.child(key))
    }

    /// Removes and returns the child at `key`. Later list elements are re-indexed.
    pub fn remove(&mut self, key: impl Into<NodeKey>) -> Option<ConfigNode> {
        let key = key.into();
        let removed = match (&mut self.value, &key) {
            (NodeValue::Map(map), _) => map.shift_remove(&key),
            (NodeValue::List(items), NodeKey::Index(i)) => match usize::try_from(*i) {
                Ok(index) if index < items.len() => Some(items.remove(index)),
                _ => None,
            },
            _ => None,
        };
        if removed.is_some() && self.is_list() {
            let path = self.path.clone();
            let options = self.options.clone();
            self.rebase(path, &options);
        }
        removed
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.scalar().and_then(Scalar::as_str)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.scalar().and_then(Scalar::as_i64)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.scalar().and_then(Scalar::as_f64)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.scalar().and_then(Scalar::as_bool)
    }

    /// Reads the value as a UTC instant; see [`coerce::to_instant`].
    #[must_use]
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        self.scalar().and_then(coerce::to_instant)
    }
}

impl Serialize for ConfigNode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.value {
            NodeValue::Null => serializer.serialize_unit(),
            NodeValue::Scalar(s) => s.serialize(serializer),
            NodeValue::List(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            NodeValue::Map(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(&k.to_string(), v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_inherit_path_and_options() {
        let options = NodeOptions::new().with_key_order(KeyOrder::Sorted);
        let mut root = ConfigNode::root(options.clone());
        let leaf = root.at_mut(["owner", "name"]);
        leaf.set("Tom");
        assert_eq!(leaf.path().to_string(), "owner.name");
        assert_eq!(leaf.options(), &options);
        assert_eq!(leaf.key(), Some(&NodeKey::from("name")));
    }

    #[test]
    fn test_set_options_resorts_existing_children() {
        let mut root = ConfigNode::new();
        root.child_mut("b").set(1);
        root.at_mut(["a", "z"]).set(2);
        root.at_mut(["a", "c"]).set(3);

        let sorted = NodeOptions::new().with_key_order(KeyOrder::Sorted);
        root.set_options(sorted.clone());

        let keys: Vec<String> = root.children_map().unwrap().keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        let nested: Vec<String> =
            root.child("a").unwrap().children_map().unwrap().keys().map(|k| k.to_string()).collect();
        assert_eq!(nested, vec!["c", "z"]);
        assert_eq!(root.at(["a", "z"]).unwrap().options(), &sorted);
    }

    #[test]
    fn test_append_list_node_indexes_children() {
        let mut root = ConfigNode::new();
        let ports = root.child_mut("ports");
        ports.append_list_node().set(8001);
        ports.append_list_node().set(8002);

        let items = root.child("ports").unwrap().children_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].path().to_string(), "ports[1]");
        assert_eq!(items[1].as_i64(), Some(8002));
    }

    #[test]
    fn test_child_mut_on_list_by_index() {
        let mut list = ConfigNode::new();
        list.set_empty_list();
        list.child_mut(0usize).set("a");
        list.child_mut(0usize).set("b");
        list.child_mut(1usize).set("c");
        assert_eq!(list.children_list().unwrap().len(), 2);
        assert_eq!(list.child(0usize).and_then(|n| n.as_str()), Some("b"));
    }

    #[test]
    fn test_at_does_not_create() {
        let root = ConfigNode::new();
        assert!(root.at(["missing", "deeper"]).is_none());
        assert!(root.is_null());
    }

    #[test]
    fn test_remove_reindexes_list() {
        let mut root = ConfigNode::new();
        for i in 0..3 {
            root.append_list_node().set(i);
        }
        let removed = root.remove(0usize).unwrap();
        assert_eq!(removed.as_i64(), Some(0));
        let items = root.children_list().unwrap();
        assert_eq!(items[0].path().to_string(), "[0]");
        assert_eq!(items[0].as_i64(), Some(1));
    }

    #[test]
    fn test_map_equality_is_order_sensitive() {
        let mut a = ConfigNode::new();
        a.child_mut("x").set(1);
        a.child_mut("y").set(2);
        let mut b = ConfigNode::new();
        b.child_mut("y").set(2);
        b.child_mut("x").set(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_node_rebases_paths() {
        let mut sub = ConfigNode::new();
        sub.at_mut(["inner", "leaf"]).set(true);

        let mut root = ConfigNode::new();
        root.child_mut("outer").set_node(sub);
        let leaf = root.at(["outer", "inner", "leaf"]).unwrap();
        assert_eq!(leaf.path().to_string(), "outer.inner.leaf");
    }

    #[test]
    fn test_serialize_to_json() {
        let mut root = ConfigNode::new();
        root.child_mut("title").set("TOML Example");
        root.at_mut(["ports"]).append_list_node().set(8001);
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(json, r#"{"title":"TOML Example","ports":[8001]}"#);
    }
}

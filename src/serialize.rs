//! Node → document serialization.
//!
//! The serializer validates a whole node tree while building a [`Table`], so
//! nothing reaches the writing engine unless every value has a TOML encoding.
//!
//! - **Map nodes** become tables, in the node's key order
//! - **List nodes** become arrays; a list whose elements are all maps becomes
//!   an array of tables and is written with `[[name]]` headers
//! - **Scalar nodes** go through [`coerce::save_scalar`]
//! - **Null nodes** fail: TOML has no null literal, so absent values must be
//!   removed rather than set to null
//!
//! ```rust
//! use toml_node::{serialize, ConfigNode, ConversionSettings, Error};
//!
//! let mut root = ConfigNode::new();
//! root.child_mut("name").set("alpha");
//! let table = serialize::serialize(&root, &ConversionSettings::default()).unwrap();
//! assert_eq!(table.len(), 1);
//!
//! root.child_mut("missing").set_null();
//! let err = serialize::serialize(&root, &ConversionSettings::default()).unwrap_err();
//! assert!(matches!(err, Error::UnrepresentableValue { .. }));
//! ```

use crate::coerce;
use crate::context::{ConversionContext, ConversionSettings};
use crate::document::{Document, Table};
use crate::error::{Error, Result};
use crate::node::{ConfigNode, NodeKey, NodeValue};
use indexmap::IndexMap;
use log::{trace, warn};

/// Converts a map-shaped node tree into a root table.
///
/// # Errors
///
/// - [`Error::InvalidRootShape`] when `root` is not a map node
/// - [`Error::InvalidKey`] when a key has no TOML key form
/// - [`Error::UnrepresentableValue`] for null nodes and unencodable scalars
pub fn serialize(root: &ConfigNode, settings: &ConversionSettings) -> Result<Table> {
    let ctx = ConversionContext::new(root.path().clone(), settings);
    match root.value() {
        NodeValue::Map(map) => serialize_map(map, &ctx),
        other => Err(Error::invalid_root(&other.shape_name())),
    }
}

/// Converts any node into a document, without the root-shape check.
///
/// # Errors
///
/// Same as [`serialize`], minus [`Error::InvalidRootShape`].
pub fn serialize_value(node: &ConfigNode, settings: &ConversionSettings) -> Result<Document> {
    let ctx = ConversionContext::new(node.path().clone(), settings);
    serialize_node(node, &ctx)
}

fn serialize_node(node: &ConfigNode, ctx: &ConversionContext<'_>) -> Result<Document> {
    trace!("serializing {} at {}", node.value().shape_name(), ctx.path());
    if node.comment().is_some() && !ctx.path().is_root() {
        warn!("dropping comment at {}: TOML output carries no node comments", ctx.path());
    }
    match node.value() {
        NodeValue::Null => Err(Error::unrepresentable(
            ctx.path(),
            "null",
            "TOML has no null literal; remove the key instead",
        )),
        NodeValue::Scalar(scalar) => coerce::save_scalar(scalar, ctx),
        NodeValue::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                array.push(serialize_node(item, &ctx.child(NodeKey::from(i)))?);
            }
            Ok(Document::Array(array))
        }
        NodeValue::Map(map) => serialize_map(map, ctx).map(Document::Table),
    }
}

fn serialize_map(
    map: &IndexMap<NodeKey, ConfigNode>,
    ctx: &ConversionContext<'_>,
) -> Result<Table> {
    let mut table = Table::with_capacity(map.len());
    for (key, child) in map {
        let name = render_key(key, ctx)?;
        let value = serialize_node(child, &ctx.child(key.clone()))?;
        if table.insert(name, value).is_some() {
            return Err(Error::invalid_key(
                ctx.path(),
                key,
                "collides with another key of the same map",
            ));
        }
    }
    Ok(table)
}

fn render_key(key: &NodeKey, ctx: &ConversionContext<'_>) -> Result<String> {
    match key {
        NodeKey::Index(i) => Ok(i.to_string()),
        NodeKey::Name(name) if name.is_empty() => {
            Err(Error::invalid_key(ctx.path(), key, "empty keys are not allowed"))
        }
        NodeKey::Name(name) if name.chars().any(|c| c.is_control() && c != '\t') => Err(
            Error::invalid_key(ctx.path(), key, "keys may not contain control characters"),
        ),
        NodeKey::Name(name) => Ok(name.clone()),
    }
}

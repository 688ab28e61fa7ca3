//! Document → node population.
//!
//! The populator walks a parsed [`Document`] and writes it into an existing
//! [`ConfigNode`]:
//!
//! - **Tables** merge into map nodes, key by key in document order
//! - **Arrays** replace the node with a fresh list, one element per item
//! - **Scalars** overwrite the node value through [`coerce::load_scalar`]
//!
//! Population is staged on a copy of the target and committed only when the
//! whole document converted, so a failure leaves the target untouched.
//!
//! ```rust
//! use toml_node::{populate, ConfigNode, ConversionSettings, Document, Table};
//!
//! let mut table = Table::new();
//! table.insert("title".to_string(), Document::from("TOML Example"));
//!
//! let mut root = ConfigNode::new();
//! populate::populate_table(&table, &mut root, &ConversionSettings::default()).unwrap();
//! assert_eq!(root.child("title").and_then(|n| n.as_str()), Some("TOML Example"));
//! ```

use crate::coerce;
use crate::context::{ConversionContext, ConversionSettings};
use crate::document::{Document, Table};
use crate::error::Result;
use crate::node::{ConfigNode, NodeKey};
use log::trace;

/// Writes `document` into `target`.
///
/// # Errors
///
/// Fails with [`Error::RangeOverflow`](crate::Error::RangeOverflow) when an
/// integer is too wide under the strict policy; `target` is then unchanged.
pub fn populate(
    document: &Document,
    target: &mut ConfigNode,
    settings: &ConversionSettings,
) -> Result<()> {
    let ctx = ConversionContext::new(target.path().clone(), settings);
    let mut staged = staged_copy(target, &ctx);
    populate_node(document, &mut staged, &ctx)?;
    *target = staged;
    Ok(())
}

/// Writes the entries of a root table into `target`, turning it into a map.
///
/// # Errors
///
/// Same as [`populate`].
pub fn populate_table(
    table: &Table,
    target: &mut ConfigNode,
    settings: &ConversionSettings,
) -> Result<()> {
    let ctx = ConversionContext::new(target.path().clone(), settings);
    let mut staged = staged_copy(target, &ctx);
    populate_entries(table, &mut staged, &ctx)?;
    *target = staged;
    Ok(())
}

/// A copy of `target` carrying the conversion's node options, so every node
/// created while populating inherits them.
fn staged_copy(target: &ConfigNode, ctx: &ConversionContext<'_>) -> ConfigNode {
    let mut staged = target.clone();
    if staged.options() != ctx.node_options() {
        staged.set_options(ctx.node_options().clone());
    }
    staged
}

fn populate_node(
    document: &Document,
    node: &mut ConfigNode,
    ctx: &ConversionContext<'_>,
) -> Result<()> {
    trace!("populating {} at {}", document.type_name(), ctx.path());
    match document {
        Document::Table(table) => populate_entries(table, node, ctx),
        Document::Array(items) => {
            node.set_empty_list();
            for (i, item) in items.iter().enumerate() {
                let child_ctx = ctx.child(NodeKey::from(i));
                populate_node(item, node.append_list_node(), &child_ctx)?;
            }
            Ok(())
        }
        scalar => {
            node.set(coerce::load_scalar(scalar, ctx)?);
            Ok(())
        }
    }
}

fn populate_entries(
    table: &Table,
    node: &mut ConfigNode,
    ctx: &ConversionContext<'_>,
) -> Result<()> {
    if !node.is_map() {
        node.set_empty_map();
    }
    for (key, child) in table {
        let key = NodeKey::from(key);
        let child_ctx = ctx.child(key.clone());
        populate_node(child, node.child_mut(key), &child_ctx)?;
    }
    Ok(())
}

//! # toml_node
//!
//! Type-preserving conversion between TOML documents and hierarchical
//! configuration node trees.
//!
//! ## Overview
//!
//! A configuration framework works on a generic tree of map, list and scalar
//! nodes. TOML has its own type system: tables, arrays, arrays of tables, and
//! typed scalars including four kinds of date-time. This crate maps one onto
//! the other in both directions:
//!
//! ```text
//! bytes ─[engine: parse]─▶ Document ─[populate]─▶ ConfigNode
//! bytes ◀─[engine: write]─ Document ◀─[serialize]─ ConfigNode
//! ```
//!
//! Loading never fails on types: every TOML value has a node form. Saving is
//! validated up front. Null nodes, binary values, opaque values without a
//! string rendering and non-map roots are rejected before any byte reaches
//! the sink.
//!
//! ## Key Features
//!
//! - **Lossless temporal values**: local dates, local times, local and offset
//!   date-times keep their TOML kind across a round trip
//! - **Arrays of tables**: lists whose elements are all maps are written with
//!   `[[name]]` headers
//! - **Explicit overflow policy**: integers wider than 64 bits fail, promote
//!   or saturate, see [`IntegerOverflow`]
//! - **Atomic loads and saves**: a failed load leaves the target untouched, a
//!   failed save writes nothing
//! - **Serde bridges**: [`to_node`] and [`from_node`] connect node trees with
//!   your own types
//!
//! ## Quick Start
//!
//! ```rust
//! use toml_node::Loader;
//!
//! let loader = Loader::builder().build();
//! let root = loader
//!     .load_str("title = \"TOML Example\"\n\n[database]\nports = [8001, 8001, 8002]\n")
//!     .unwrap();
//!
//! assert_eq!(root.child("title").and_then(|n| n.as_str()), Some("TOML Example"));
//! let ports = root.at(["database", "ports"]).unwrap();
//! assert_eq!(ports.children_list().unwrap().len(), 3);
//!
//! let text = loader.save_to_string(&root).unwrap();
//! assert!(text.contains("[database]"));
//! ```
//!
//! ### Typed access
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Server { ip: String, role: String }
//!
//! let server = Server { ip: "10.0.0.1".into(), role: "frontend".into() };
//! let text = toml_node::to_string(&server).unwrap();
//! let back: Server = toml_node::from_str(&text).unwrap();
//! assert_eq!(back, server);
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: loader stages at `debug`,
//! per-node conversion steps at `trace`, and dropped node comments at `warn`.

pub mod coerce;
pub mod context;
pub mod de;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod macros;
pub mod node;
pub mod options;
pub mod populate;
pub mod ser;
pub mod serialize;
pub mod value;

pub use context::{ConversionContext, ConversionSettings};
pub use de::{from_node, NodeDeserializer};
pub use document::{Document, Table};
pub use engine::{DocumentParser, DocumentWriter, TomlEngine};
pub use error::{Error, IoOperation, Result};
pub use loader::{
    Loader, LoaderBuilder, LoaderConfig, PathSink, PathSource, Sink, SinkWriter, Source,
    StringSink, StringSource,
};
pub use node::{ConfigNode, KeyOrder, NodeKey, NodeOptions, NodePath, NodeValue};
pub use options::{Charset, HeaderMode, IntegerOverflow};
pub use ser::{to_node, to_node_with_options, NodeSerializer};
pub use value::{Opaque, Scalar, ScalarKind};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize any `T: Serialize` to a TOML string.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use toml_node::to_string;
///
/// #[derive(Serialize)]
/// struct Owner { name: String }
///
/// let toml = to_string(&Owner { name: "Tom".into() }).unwrap();
/// assert_eq!(toml, "name = \"Tom\"\n");
/// ```
///
/// # Errors
///
/// Returns an error if `value` is not a struct or map, or holds values TOML
/// cannot represent.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Loader::builder().build().save_to_string(&to_node(value)?)
}

/// Serialize any `T: Serialize` to a TOML string with one array element per line.
///
/// # Errors
///
/// Same as [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Loader::builder()
        .engine(TomlEngine::new().with_pretty(true))
        .build()
        .save_to_string(&to_node(value)?)
}

/// Deserialize an instance of type `T` from TOML text.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use toml_node::from_str;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid TOML or cannot be deserialized
/// to type `T`. Parse errors carry line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let root = Loader::builder().build().load_str(s)?;
    from_node(&root)
}

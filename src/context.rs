//! Conversion context threaded through the populator and serializer.
//!
//! The context is a value: each recursive step derives a child context with an
//! extended path, so conversions share no mutable state and are reentrant.

use crate::node::{NodeKey, NodeOptions, NodePath};
use crate::options::IntegerOverflow;
use chrono::{FixedOffset, Offset, Utc};

/// Settings shared by every step of one conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionSettings {
    /// Options for nodes created during population.
    pub node_options: NodeOptions,
    pub integer_overflow: IntegerOverflow,
    /// Offset UTC instants are shifted into when written.
    pub zone_offset: FixedOffset,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        ConversionSettings {
            node_options: NodeOptions::default(),
            integer_overflow: IntegerOverflow::default(),
            zone_offset: Utc.fix(),
        }
    }
}

impl ConversionSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_node_options(mut self, node_options: NodeOptions) -> Self {
        self.node_options = node_options;
        self
    }

    #[must_use]
    pub fn with_integer_overflow(mut self, integer_overflow: IntegerOverflow) -> Self {
        self.integer_overflow = integer_overflow;
        self
    }

    #[must_use]
    pub fn with_zone_offset(mut self, zone_offset: FixedOffset) -> Self {
        self.zone_offset = zone_offset;
        self
    }
}

/// The current position of a conversion plus its settings.
#[derive(Clone, Debug)]
pub struct ConversionContext<'a> {
    path: NodePath,
    settings: &'a ConversionSettings,
}

impl<'a> ConversionContext<'a> {
    /// A context positioned at `path`.
    #[must_use]
    pub fn new(path: NodePath, settings: &'a ConversionSettings) -> Self {
        ConversionContext { path, settings }
    }

    /// A context positioned at the root.
    #[must_use]
    pub fn root(settings: &'a ConversionSettings) -> Self {
        Self::new(NodePath::root(), settings)
    }

    #[must_use]
    pub fn child(&self, key: NodeKey) -> Self {
        ConversionContext {
            path: self.path.child(key),
            settings: self.settings,
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn settings(&self) -> &'a ConversionSettings {
        self.settings
    }

    pub fn node_options(&self) -> &'a NodeOptions {
        &self.settings.node_options
    }

    pub fn integer_overflow(&self) -> IntegerOverflow {
        self.settings.integer_overflow
    }

    pub fn zone_offset(&self) -> FixedOffset {
        self.settings.zone_offset
    }
}

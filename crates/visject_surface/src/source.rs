// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data sources backing surface contexts.
//!
//! The asset layer implements [`SurfaceSource`]; the core only reads the
//! encoded graph bytes and the identity used to cache contexts.

use crate::context::{ContextId, ContextKey, SurfaceContext};
use crate::node::NodeId;
use uuid::Uuid;

/// Backing data source of a surface context
pub trait SurfaceSource {
    /// Stable identity; the same key always maps to the same context
    fn key(&self) -> ContextKey;

    /// Display name
    fn surface_name(&self) -> String;

    /// Encoded graph bytes, `None` when the data cannot be read
    fn surface_data(&self) -> Option<Vec<u8>>;

    /// Called once after a context was created for this source
    fn on_context_created(&self, _context: &SurfaceContext) {}
}

/// In-memory data source, used by tools and tests
#[derive(Debug, Clone)]
pub struct MemorySource {
    id: Uuid,
    name: String,
    data: Option<Vec<u8>>,
}

impl MemorySource {
    /// Create a source with a fresh asset ID and an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Create a source for a known asset ID
    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            data: Some(Vec::new()),
        }
    }

    /// Replace the stored bytes
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// Make the data unreadable
    pub fn set_unavailable(&mut self) {
        self.data = None;
    }

    /// Asset ID
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl SurfaceSource for MemorySource {
    fn key(&self) -> ContextKey {
        ContextKey::Asset(self.id)
    }

    fn surface_name(&self) -> String {
        self.name.clone()
    }

    fn surface_data(&self) -> Option<Vec<u8>> {
        self.data.clone()
    }
}

/// Nested graph stored in a node value
#[derive(Debug, Clone)]
pub struct NodeSource {
    pub(crate) parent: ContextId,
    pub(crate) node: NodeId,
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

impl NodeSource {
    /// Owner node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Context holding the owner node
    pub fn parent(&self) -> ContextId {
        self.parent
    }
}

impl SurfaceSource for NodeSource {
    fn key(&self) -> ContextKey {
        ContextKey::Node {
            parent: self.parent,
            node: self.node,
        }
    }

    fn surface_name(&self) -> String {
        self.name.clone()
    }

    fn surface_data(&self) -> Option<Vec<u8>> {
        Some(self.data.clone())
    }
}

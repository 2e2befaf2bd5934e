// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications raised by the surface.
//!
//! The editor shell drains these after each operation to refresh views;
//! the core never calls back into presentation code directly.

use crate::context::{ContextId, Viewport};
use crate::node::NodeId;
use indexmap::IndexMap;
use std::sync::Arc;
use uuid::Uuid;

/// Notification emitted by a surface operation
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A context was marked modified
    ContextModified {
        /// Context
        context: ContextId,
        /// Whether the graph itself changed (not only view state)
        graph_edited: bool,
    },
    /// The top of the navigation stack changed
    ContextChanged {
        /// New top, `None` when the stack emptied
        context: Option<ContextId>,
    },
    /// A context was entered for the first time; the view should frame all nodes
    FitWholeGraph {
        /// Context
        context: ContextId,
    },
    /// A cached view was restored
    ViewRestored {
        /// Context
        context: ContextId,
        /// Restored view
        view: Viewport,
    },
    /// A context finished loading its graph
    SurfaceLoaded {
        /// Context
        context: ContextId,
    },
    /// Node created or restored
    NodeLoaded {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
    },
    /// Node spawned by the user
    NodeSpawned {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
    },
    /// Node created by a paste
    NodePasted {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
        /// Copied node ID to pasted node ID, shared by the whole paste
        mapping: Arc<IndexMap<u32, NodeId>>,
    },
    /// Node removed
    NodeDeleted {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
    },
    /// Connections of a node changed
    ConnectionsChanged {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
    },
    /// Values of a node changed
    ValuesChanged {
        /// Context
        context: ContextId,
        /// Node
        node: NodeId,
    },
    /// A parameter was added, removed or edited
    ParametersChanged {
        /// Parameter
        parameter: Uuid,
    },
}

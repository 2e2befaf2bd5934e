// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history.
//!
//! Actions never hold live graph objects. Contexts are addressed by the
//! chain of owner nodes from the root data source, nodes and ports by ID,
//! so an action stays valid after the context it touches was closed and
//! reopened, or after unrelated structural edits.

use crate::context::ContextKey;
use crate::error::{Result, SurfaceError};
use crate::graph_data::NodeRecord;
use crate::node::NodeId;
use crate::parameter::SurfaceParameter;
use crate::port::PortRef;
use crate::value::Value;
use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default maximum undo depth
pub const MAX_HISTORY: usize = 100;

/// Indirect address of a context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextHandle {
    /// Data source of the root context
    pub root: ContextKey,
    /// Owner nodes from the root down to the context
    pub path: Vec<NodeId>,
}

/// Indirect address of a port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortHandle {
    /// Context
    pub context: ContextHandle,
    /// Port within the context
    pub port: PortRef,
}

/// Connection list of one port before and after an edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChange {
    /// Port
    pub port: PortRef,
    /// Connections before
    pub before: Vec<PortRef>,
    /// Connections after
    pub after: Vec<PortRef>,
}

/// Location of one node before and after a move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMove {
    /// Node
    pub node: NodeId,
    /// Location before
    pub before: Pos2,
    /// Location after
    pub after: Pos2,
}

/// A reversible edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoAction {
    /// Node added (`added`) or removed
    AddRemoveNode {
        /// Context
        context: ContextHandle,
        /// Full node snapshot, connections included
        node: NodeRecord,
        /// Whether the forward direction adds the node
        added: bool,
    },
    /// Connection lists changed
    ConnectPorts {
        /// Context
        context: ContextHandle,
        /// Affected ports on both sides
        changes: Vec<PortChange>,
    },
    /// Node values changed
    EditNodeValues {
        /// Context
        context: ContextHandle,
        /// Node
        node: NodeId,
        /// Values before
        before: Vec<Value>,
        /// Values after
        after: Vec<Value>,
    },
    /// Nodes moved
    MoveNodes {
        /// Context
        context: ContextHandle,
        /// Per-node locations
        moves: Vec<NodeMove>,
    },
    /// Parameter added (`added`) or removed
    AddRemoveParameter {
        /// Root data source
        root: ContextKey,
        /// Parameter snapshot
        parameter: SurfaceParameter,
        /// Position in the parameter list
        index: usize,
        /// Whether the forward direction adds the parameter
        added: bool,
    },
    /// Parameter renamed
    RenameParameter {
        /// Root data source
        root: ContextKey,
        /// Parameter
        id: uuid::Uuid,
        /// Name before
        before: String,
        /// Name after
        after: String,
    },
    /// Parameter value changed
    EditParameter {
        /// Root data source
        root: ContextKey,
        /// Parameter
        id: uuid::Uuid,
        /// Value before
        before: Value,
        /// Value after
        after: Value,
    },
    /// Actions applied as one step, in order
    Batch {
        /// Description
        description: String,
        /// Actions
        actions: Vec<UndoAction>,
    },
}

impl UndoAction {
    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::AddRemoveNode { node, added: true, .. } => format!("Add node {}", node.id.0),
            Self::AddRemoveNode { node, added: false, .. } => format!("Remove node {}", node.id.0),
            Self::ConnectPorts { .. } => "Edit connections".to_string(),
            Self::EditNodeValues { node, .. } => format!("Edit node {} values", node.0),
            Self::MoveNodes { moves, .. } => format!("Move {} nodes", moves.len()),
            Self::AddRemoveParameter { parameter, added: true, .. } => {
                format!("Add parameter {}", parameter.name)
            }
            Self::AddRemoveParameter { parameter, added: false, .. } => {
                format!("Remove parameter {}", parameter.name)
            }
            Self::RenameParameter { after, .. } => format!("Rename parameter to {after}"),
            Self::EditParameter { .. } => "Edit parameter".to_string(),
            Self::Batch { description, .. } => description.clone(),
        }
    }

    /// Whether the action changes nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Batch { actions, .. } => actions.iter().all(Self::is_empty),
            Self::ConnectPorts { changes, .. } => changes.is_empty(),
            Self::MoveNodes { moves, .. } => moves.is_empty(),
            _ => false,
        }
    }
}

/// Unique history entry ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(u64);

impl OperationId {
    /// Raw value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Recorded action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry ID
    pub id: OperationId,
    /// Human-readable description
    pub description: String,
    /// The edit
    pub action: UndoAction,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo stacks
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    next_id: u64,
    max_depth: usize,
}

impl History {
    /// Create a history with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with a custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new action; clears the redo stack
    pub fn push(&mut self, action: UndoAction) -> OperationId {
        let id = OperationId(self.next_id);
        self.next_id += 1;

        self.redo_stack.clear();
        self.undo_stack.push_back(HistoryEntry {
            id,
            description: action.description(),
            action,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        });

        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        id
    }

    /// Take the entry to undo
    pub fn pop_undo(&mut self) -> Result<HistoryEntry> {
        self.undo_stack.pop_back().ok_or(SurfaceError::NothingToUndo)
    }

    /// Take the entry to redo
    pub fn pop_redo(&mut self) -> Result<HistoryEntry> {
        self.redo_stack.pop_back().ok_or(SurfaceError::NothingToRedo)
    }

    /// File an entry that was undone
    pub fn push_undone(&mut self, entry: HistoryEntry) {
        self.redo_stack.push_back(entry);
    }

    /// File an entry that was redone
    pub fn push_redone(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// History statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
        }
    }

    /// Description of the next undo entry
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Description of the next redo entry
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortId;

    fn handle() -> ContextHandle {
        ContextHandle {
            root: ContextKey::Named("graph".into()),
            path: vec![NodeId(5)],
        }
    }

    fn move_action(node: u32) -> UndoAction {
        UndoAction::MoveNodes {
            context: handle(),
            moves: vec![NodeMove {
                node: NodeId(node),
                before: Pos2::ZERO,
                after: Pos2::new(10.0, 0.0),
            }],
        }
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new();
        history.push(move_action(1));
        let entry = history.pop_undo().unwrap();
        history.push_undone(entry);
        assert!(history.can_redo());
        history.push(move_action(2));
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_max_depth() {
        let mut history = History::with_max_depth(2);
        for i in 0..5 {
            history.push(move_action(i));
        }
        assert_eq!(history.stats().undo_count, 2);
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::new();
        assert!(matches!(history.pop_undo(), Err(SurfaceError::NothingToUndo)));
        assert!(matches!(history.pop_redo(), Err(SurfaceError::NothingToRedo)));
    }

    #[test]
    fn test_actions_serialize() {
        let action = UndoAction::ConnectPorts {
            context: handle(),
            changes: vec![PortChange {
                port: PortRef::new(NodeId(1), PortId(0)),
                before: Vec::new(),
                after: vec![PortRef::new(NodeId(2), PortId(1))],
            }],
        };
        let bytes = bincode::serialize(&action).unwrap();
        let decoded: UndoAction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, action);
        assert_eq!(decoded.description(), "Edit connections");
    }
}

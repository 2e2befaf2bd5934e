// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for surface operations.

use crate::context::{ContextId, ContextKey};
use crate::node::NodeId;
use crate::port::PortRef;
use thiserror::Error;
use uuid::Uuid;

/// Result type for surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Errors raised by the graph editing core.
///
/// Resolution and policy failures are not represented here: those surface as
/// `Ok(None)` plus a log entry. Everything below is a structural or
/// persistence failure the caller has to report.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Two groups registered with the same ID
    #[error("Duplicate group archetype: {0}")]
    DuplicateGroup(u16),

    /// Two archetypes in one group share a type ID
    #[error("Duplicate node archetype {type_id} in group {group_id}")]
    DuplicateArchetype {
        /// Group ID
        group_id: u16,
        /// Type ID
        type_id: u16,
    },

    /// Archetype declares more default values than the engine supports
    #[error("Archetype {group_id}:{type_id} declares {count} default values (max {max})")]
    TooManyValues {
        /// Group ID
        group_id: u16,
        /// Type ID
        type_id: u16,
        /// Declared value count
        count: usize,
        /// Engine limit
        max: usize,
    },

    /// A port element references a value slot that does not exist
    #[error("Archetype {group_id}:{type_id} references missing value slot {index}")]
    InvalidValueSlot {
        /// Group ID
        group_id: u16,
        /// Type ID
        type_id: u16,
        /// Referenced slot
        index: usize,
    },

    /// Context not found
    #[error("Context not found: {0:?}")]
    ContextNotFound(ContextId),

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortRef),

    /// Values array length does not match the archetype
    #[error("Values length mismatch: expected {expected}, got {actual}")]
    ValuesLength {
        /// Length required by the archetype
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Value kind does not match the archetype slot
    #[error("Value at index {0} does not match the archetype value type")]
    ValueType(usize),

    /// Value index out of range
    #[error("Value index out of range: {0}")]
    ValueIndex(usize),

    /// The same data source was registered twice
    #[error("Context already registered: {0:?}")]
    DuplicateContext(ContextKey),

    /// Closing a context with nothing open
    #[error("Context stack is empty")]
    EmptyStack,

    /// Operation requires an open root context
    #[error("Surface has no root context")]
    NoRoot,

    /// Parameter not found
    #[error("Parameter not found: {0}")]
    ParameterNotFound(Uuid),

    /// Graph data failed to load
    #[error("Failed to load surface '{name}': {reason}")]
    Load {
        /// Surface name
        name: String,
        /// Failure description
        reason: String,
    },

    /// Graph bytes could not be encoded or decoded
    #[error("Graph data error: {0}")]
    GraphData(#[from] bincode::Error),

    /// Graph bytes written by an unknown format version
    #[error("Unsupported graph data version: {0}")]
    GraphVersion(u32),

    /// Clipboard failure
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] crate::clipboard::ClipboardError),

    /// Node kind has no parameter conversion
    #[error("Node cannot be converted to a parameter: {0:?}")]
    NotConvertible(NodeId),

    /// Undo handle no longer resolves
    #[error("Unresolved handle: {0}")]
    Handle(String),

    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Node does not own a nested graph
    #[error("Node has no nested graph: {0:?}")]
    NoNestedGraph(NodeId),

    /// Parameter value does not match the parameter type
    #[error("Value does not match the type of parameter {0}")]
    ParameterValueType(Uuid),

    /// Configuration text could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Configuration could not be written
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] ron::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

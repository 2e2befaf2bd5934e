// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port (box) definitions for node inputs/outputs.

use crate::archetype::PortArchetype;
use crate::cast::ConnectionsHint;
use crate::node::NodeId;
use crate::types::ScriptType;
use serde::{Deserialize, Serialize};

/// Identifier of a port, unique within its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u32);

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Context-local address of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Port on that node
    pub port: PortId,
}

impl PortRef {
    /// Create a port reference
    pub fn new(node: NodeId, port: PortId) -> Self {
        Self { node, port }
    }
}

/// A port on a node
#[derive(Debug, Clone)]
pub struct Port {
    /// Port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Type declared by the archetype
    pub default_type: ScriptType,
    /// Type currently in effect (follows independent ports)
    pub current_type: ScriptType,
    /// Wildcard categories accepted while the current type is `Null`
    pub hint: ConnectionsHint,
    /// Whether multiple connections are allowed
    pub multi: bool,
    /// Value slot edited inline when the port is unconnected
    pub value_index: Option<usize>,
    /// Connected ports; kept symmetric by the owning context
    connections: Vec<PortRef>,
}

impl Port {
    /// Instantiate a port from its archetype.
    ///
    /// Unless the archetype says otherwise, value inputs and impulse outputs
    /// accept a single connection.
    pub fn from_archetype(archetype: &PortArchetype, direction: PortDirection) -> Self {
        let multi = archetype.multi.unwrap_or(match direction {
            PortDirection::Input => archetype.ty.is_void(),
            PortDirection::Output => !archetype.ty.is_void(),
        });
        Self {
            id: archetype.id,
            name: archetype.name.clone(),
            direction,
            default_type: archetype.ty.clone(),
            current_type: archetype.ty.clone(),
            hint: archetype.hint,
            multi,
            value_index: archetype.value_index,
            connections: Vec::new(),
        }
    }

    /// Whether this is an input port
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Whether this is an output port
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Connected ports
    pub fn connections(&self) -> &[PortRef] {
        &self.connections
    }

    /// Whether the port has any connection
    pub fn has_connections(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Whether the port lists `other`
    pub fn is_connected_with(&self, other: PortRef) -> bool {
        self.connections.contains(&other)
    }

    /// Append a link; returns false when it was already present
    pub(crate) fn add_connection(&mut self, other: PortRef) -> bool {
        if self.connections.contains(&other) {
            return false;
        }
        self.connections.push(other);
        true
    }

    /// Drop a link; returns false when it was not present
    pub(crate) fn remove_connection(&mut self, other: PortRef) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| *c != other);
        before != self.connections.len()
    }

    /// Drop every link touching `node`
    pub(crate) fn remove_connections_to_node(&mut self, node: NodeId) {
        self.connections.retain(|c| c.node != node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cardinality() {
        let value = PortArchetype::new(0, "Value", ScriptType::Float);
        let impulse = PortArchetype::new(1, "Exec", ScriptType::Void);

        assert!(!Port::from_archetype(&value, PortDirection::Input).multi);
        assert!(Port::from_archetype(&value, PortDirection::Output).multi);
        assert!(Port::from_archetype(&impulse, PortDirection::Input).multi);
        assert!(!Port::from_archetype(&impulse, PortDirection::Output).multi);

        let forced = PortArchetype::new(2, "List", ScriptType::Float).multi();
        assert!(Port::from_archetype(&forced, PortDirection::Input).multi);
    }

    #[test]
    fn test_connection_list_is_a_set() {
        let arch = PortArchetype::new(0, "A", ScriptType::Float);
        let mut port = Port::from_archetype(&arch, PortDirection::Output);
        let other = PortRef::new(NodeId(2), PortId(1));

        assert!(port.add_connection(other));
        assert!(!port.add_connection(other));
        assert_eq!(port.connections().len(), 1);
        assert!(port.remove_connection(other));
        assert!(!port.remove_connection(other));
        assert!(!port.has_connections());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances.

use crate::archetype::{GroupArchetype, NodeArchetype, NodeFlags, NodeKind};
use crate::context::ContextId;
use crate::port::{Port, PortDirection, PortId};
use crate::types::ScriptType;
use crate::value::Value;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier of a node, unique within its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A node instance in a surface context
#[derive(Debug, Clone)]
pub struct Node {
    /// Instance ID
    pub id: NodeId,
    /// Owning context
    pub context: ContextId,
    archetype: Arc<NodeArchetype>,
    group: Arc<GroupArchetype>,
    pub(crate) location: Pos2,
    pub(crate) size: Vec2,
    pub(crate) values: Vec<Value>,
    ports: Vec<Port>,
}

impl Node {
    /// Create a node from its archetype with default values
    pub fn new(
        id: NodeId,
        context: ContextId,
        archetype: Arc<NodeArchetype>,
        group: Arc<GroupArchetype>,
    ) -> Self {
        let ports = archetype
            .ports()
            .map(|(port, direction)| Port::from_archetype(port, direction))
            .collect();
        Self {
            id,
            context,
            location: Pos2::ZERO,
            size: archetype.size,
            values: archetype.default_values.clone(),
            ports,
            archetype,
            group,
        }
    }

    /// Override the size (for custom constructors)
    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Override the values (for custom constructors)
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    /// Placeholder for a node whose archetype is not registered
    pub fn missing(id: NodeId, context: ContextId, group_id: u16, type_id: u16) -> Self {
        let archetype = NodeArchetype::new(type_id, "Missing Node")
            .with_description(format!("Unknown node type {group_id}:{type_id}"))
            .with_flags(
                NodeFlags::ALL_GRAPHS
                    | NodeFlags::VARIABLE_VALUES_SIZE
                    | NodeFlags::NO_SPAWN_VIA_GUI
                    | NodeFlags::NO_SPAWN_VIA_PASTE,
            )
            .with_kind(NodeKind::Missing { group_id, type_id });
        let group = GroupArchetype::new(group_id, "Missing");
        Self::new(id, context, Arc::new(archetype), Arc::new(group))
    }

    /// Archetype this node was created from
    pub fn archetype(&self) -> &Arc<NodeArchetype> {
        &self.archetype
    }

    /// Group the archetype belongs to
    pub fn group(&self) -> &Arc<GroupArchetype> {
        &self.group
    }

    /// Group ID as persisted (the original one for missing nodes)
    pub fn group_id(&self) -> u16 {
        match self.archetype.kind {
            NodeKind::Missing { group_id, .. } => group_id,
            _ => self.group.group_id,
        }
    }

    /// Type ID as persisted
    pub fn type_id(&self) -> u16 {
        self.archetype.type_id
    }

    /// Archetype specialization
    pub fn kind(&self) -> &NodeKind {
        &self.archetype.kind
    }

    /// Title
    pub fn title(&self) -> &str {
        &self.archetype.title
    }

    /// Location on the canvas
    pub fn location(&self) -> Pos2 {
        self.location
    }

    /// Size on the canvas
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Bounds on the canvas
    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(self.location, self.size)
    }

    /// Value array
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value by index
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All ports in layout order
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Port by ID
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn ports_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.ports.iter_mut()
    }

    /// Input ports
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
    }

    /// Output ports
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output)
    }

    /// Whether any port is connected
    pub fn has_connections(&self) -> bool {
        self.ports.iter().any(Port::has_connections)
    }

    /// Whether the user may delete this node
    pub fn can_remove(&self) -> bool {
        !self.archetype.flags.contains(NodeFlags::NO_REMOVE)
    }

    /// Whether the user may move this node
    pub fn can_move(&self) -> bool {
        !self.archetype.flags.contains(NodeFlags::NO_MOVE)
    }

    /// Nested graph bytes for nodes owning a sub-graph
    pub fn nested_graph(&self) -> Option<&[u8]> {
        let index = self.kind().nested_graph_value()?;
        self.values.get(index)?.as_bytes()
    }

    /// Display name of the nested graph
    pub fn nested_graph_name(&self) -> String {
        match self.kind() {
            NodeKind::StateMachine { name_value, .. } => self
                .values
                .get(*name_value)
                .and_then(Value::as_str)
                .map_or_else(|| self.title().to_string(), str::to_string),
            _ => self.title().to_string(),
        }
    }

    /// Sync the size with the size value of resizable kinds
    pub(crate) fn apply_size_value(&mut self) {
        let (size_value, min_size) = match self.archetype.kind {
            NodeKind::Resizable {
                size_value,
                min_size,
            } => (size_value, min_size),
            NodeKind::Comment { size_value, .. } => (size_value, Vec2::ZERO),
            _ => return,
        };
        if let Some([w, h]) = self.values.get(size_value).and_then(Value::as_float2) {
            self.size = Vec2::new(w, h).max(min_size);
        }
    }

    /// Apply the type driven by the independent ports.
    ///
    /// `None` restores the declared types.
    pub(crate) fn apply_port_type(&mut self, ty: Option<&ScriptType>) {
        let archetype = Arc::clone(&self.archetype);
        for port in &mut self.ports {
            let follows = archetype.independent_ports.contains(&port.id)
                || archetype.dependent_ports.contains(&port.id);
            if follows {
                port.current_type = ty.cloned().unwrap_or_else(|| port.default_type.clone());
            }
        }
    }

    /// Force the type of the output ports (parameter getters)
    pub(crate) fn set_output_type(&mut self, ty: &ScriptType) {
        for port in self.ports.iter_mut().filter(|p| p.is_output()) {
            port.current_type = ty.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::PortArchetype;
    use crate::cast::ConnectionsHint;

    fn add_archetype() -> NodeArchetype {
        NodeArchetype::new(1, "Add")
            .with_values(vec![Value::Float(0.0), Value::Float(0.0)])
            .with_input(
                PortArchetype::new(0, "A", ScriptType::Null)
                    .with_hint(ConnectionsHint::NUMERIC)
                    .with_value(0),
            )
            .with_input(
                PortArchetype::new(1, "B", ScriptType::Null)
                    .with_hint(ConnectionsHint::NUMERIC)
                    .with_value(1),
            )
            .with_output(PortArchetype::new(2, "Result", ScriptType::Null))
            .with_type_dependency(&[0, 1], &[2])
    }

    fn node(archetype: NodeArchetype) -> Node {
        Node::new(
            NodeId(1),
            ContextId(0),
            Arc::new(archetype),
            Arc::new(GroupArchetype::new(3, "Math")),
        )
    }

    #[test]
    fn test_ports_follow_layout() {
        let node = node(add_archetype());
        assert_eq!(node.inputs().count(), 2);
        assert_eq!(node.outputs().count(), 1);
        assert_eq!(node.values(), &[Value::Float(0.0), Value::Float(0.0)]);
    }

    #[test]
    fn test_apply_port_type() {
        let mut node = node(add_archetype());
        node.apply_port_type(Some(&ScriptType::Float3));
        assert!(node.ports().iter().all(|p| p.current_type == ScriptType::Float3));
        node.apply_port_type(None);
        assert!(node.ports().iter().all(|p| p.current_type == ScriptType::Null));
    }

    #[test]
    fn test_resizable_size() {
        let archetype = NodeArchetype::new(5, "Frame")
            .with_values(vec![Value::Float2([300.0, 10.0])])
            .with_kind(NodeKind::Resizable {
                size_value: 0,
                min_size: Vec2::new(100.0, 50.0),
            });
        let mut node = node(archetype);
        node.apply_size_value();
        assert_eq!(node.size(), Vec2::new(300.0, 50.0));
    }

    #[test]
    fn test_missing_keeps_original_ids() {
        let node = Node::missing(NodeId(4), ContextId(0), 42, 7);
        assert_eq!(node.group_id(), 42);
        assert_eq!(node.type_id(), 7);
        assert!(node.archetype().has_variable_values());
    }
}

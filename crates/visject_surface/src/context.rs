// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface contexts: one level of a possibly nested graph.
//!
//! A context owns its nodes and keeps port connections symmetric. Everything
//! that needs the archetype registry, the policy or the undo log lives on
//! [`Surface`](crate::surface::Surface); the methods here are the primitive
//! graph edits those operations are built from.

use crate::error::{Result, SurfaceError};
use crate::node::{Node, NodeId};
use crate::parameter::SurfaceParameter;
use crate::port::{Port, PortRef};
use crate::types::ScriptType;
use egui::{Rect, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identifier of a context within a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

/// Identity of the data source backing a context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKey {
    /// Asset identified by its ID
    Asset(Uuid),
    /// Source identified by name
    Named(String),
    /// Nested graph owned by a node of another context
    Node {
        /// Context holding the owner node
        parent: ContextId,
        /// Owner node
        node: NodeId,
    },
}

/// Pan and zoom of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pan offset (graph space)
    pub pan: Vec2,
    /// Zoom level
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// One level of a surface graph
#[derive(Debug)]
pub struct SurfaceContext {
    id: ContextId,
    key: ContextKey,
    name: String,
    parent: Option<ContextId>,
    pub(crate) children: Vec<ContextId>,
    nodes: IndexMap<NodeId, Node>,
    pub(crate) parameters: Vec<SurfaceParameter>,
    pub(crate) modified: bool,
    pub(crate) cached_view: Option<Viewport>,
}

impl SurfaceContext {
    pub(crate) fn new(
        id: ContextId,
        key: ContextKey,
        name: impl Into<String>,
        parent: Option<ContextId>,
    ) -> Self {
        Self {
            id,
            key,
            name: name.into(),
            parent,
            children: Vec::new(),
            nodes: IndexMap::new(),
            parameters: Vec::new(),
            modified: false,
            cached_view: None,
        }
    }

    /// Context ID
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Data source identity
    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent context (`None` for the root)
    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// Child contexts
    pub fn children(&self) -> &[ContextId] {
        &self.children
    }

    /// Node owning this context in the parent context
    pub fn owner_node(&self) -> Option<NodeId> {
        match self.key {
            ContextKey::Node { node, .. } if self.parent.is_some() => Some(node),
            _ => None,
        }
    }

    /// Whether this is a root-level context
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the graph changed since the last save
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Viewport remembered from the last visit
    pub fn cached_view(&self) -> Option<Viewport> {
        self.cached_view
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node by ID
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// First node created from the given archetype
    pub fn find_node_by_type(&self, group_id: u16, type_id: u16) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| n.group_id() == group_id && n.type_id() == type_id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Parameters (only populated on the root context)
    pub fn parameters(&self) -> &[SurfaceParameter] {
        &self.parameters
    }

    /// Parameter by ID
    pub fn find_parameter(&self, id: Uuid) -> Option<&SurfaceParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    /// Parameter by name
    pub fn find_parameter_by_name(&self, name: &str) -> Option<&SurfaceParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Smallest positive node ID not in use
    pub fn next_free_node_id(&self) -> NodeId {
        self.free_node_id(&HashSet::new())
    }

    /// Smallest positive node ID used neither by a node nor by `reserved`
    pub(crate) fn free_node_id(&self, reserved: &HashSet<NodeId>) -> NodeId {
        (1..=u32::MAX)
            .map(NodeId)
            .find(|id| !self.nodes.contains_key(id) && !reserved.contains(id))
            .unwrap_or(NodeId(u32::MAX))
    }

    /// Bounding box of the given nodes
    pub fn bounds_of(&self, nodes: &[NodeId]) -> Option<Rect> {
        nodes
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(Node::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Port by reference
    pub fn port(&self, port: PortRef) -> Option<&Port> {
        self.nodes.get(&port.node)?.port(port.port)
    }

    pub(crate) fn port_mut(&mut self, port: PortRef) -> Option<&mut Port> {
        self.nodes.get_mut(&port.node)?.port_mut(port.port)
    }

    /// Connection list of a port, empty when the port is missing
    pub fn connections_of(&self, port: PortRef) -> Vec<PortRef> {
        self.port(port)
            .map(|p| p.connections().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(SurfaceError::Handle(format!(
                "node {:?} already exists in context {:?}",
                node.id, self.id
            )));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Remove a node after detaching it; returns the node and the peers that lost a link
    pub(crate) fn take_node(&mut self, id: NodeId) -> Option<(Node, Vec<NodeId>)> {
        let peers = self.detach_node(id);
        self.nodes.shift_remove(&id).map(|node| (node, peers))
    }

    pub(crate) fn take_all_nodes(&mut self) -> Vec<Node> {
        self.nodes.drain(..).map(|(_, node)| node).collect()
    }

    /// Unlink every connection of a node on both sides
    pub(crate) fn detach_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let peers: Vec<PortRef> = node
            .ports()
            .iter()
            .flat_map(|p| p.connections().iter().copied())
            .collect();
        let mut affected = Vec::new();
        for peer in peers {
            if let Some(port) = self.port_mut(peer) {
                port.remove_connections_to_node(id);
            }
            if peer.node != id && !affected.contains(&peer.node) {
                affected.push(peer.node);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            for port in node.ports_mut() {
                let targets: Vec<PortRef> = port.connections().to_vec();
                for target in targets {
                    port.remove_connection(target);
                }
            }
        }
        affected
    }

    /// Link two ports on both sides.
    ///
    /// Single-connection ports drop their previous link first. Returns the
    /// nodes whose connection lists changed (empty when already linked).
    pub(crate) fn link(&mut self, a: PortRef, b: PortRef) -> Result<Vec<NodeId>> {
        let port_a = self.port(a).ok_or(SurfaceError::PortNotFound(a))?;
        let port_b = self.port(b).ok_or(SurfaceError::PortNotFound(b))?;
        if port_a.is_connected_with(b) && port_b.is_connected_with(a) {
            return Ok(Vec::new());
        }
        let mut changed = vec![a.node];
        if !changed.contains(&b.node) {
            changed.push(b.node);
        }
        for (port, other) in [(a, b), (b, a)] {
            let single = self.port(port).is_some_and(|p| !p.multi);
            if single {
                for displaced in self.clear_port_except(port, other) {
                    if !changed.contains(&displaced.node) {
                        changed.push(displaced.node);
                    }
                }
            }
        }
        if let Some(port) = self.port_mut(a) {
            port.add_connection(b);
        }
        if let Some(port) = self.port_mut(b) {
            port.add_connection(a);
        }
        Ok(changed)
    }

    /// Unlink two ports on both sides; returns whether a link existed
    pub(crate) fn unlink(&mut self, a: PortRef, b: PortRef) -> bool {
        let removed_a = self.port_mut(a).is_some_and(|p| p.remove_connection(b));
        let removed_b = self.port_mut(b).is_some_and(|p| p.remove_connection(a));
        removed_a || removed_b
    }

    /// Unlink every connection of a port; returns the former peers
    pub(crate) fn clear_port(&mut self, port: PortRef) -> Vec<PortRef> {
        let peers = self.connections_of(port);
        for peer in &peers {
            self.unlink(port, *peer);
        }
        peers
    }

    fn clear_port_except(&mut self, port: PortRef, keep: PortRef) -> Vec<PortRef> {
        let peers: Vec<PortRef> = self
            .connections_of(port)
            .into_iter()
            .filter(|p| *p != keep)
            .collect();
        for peer in &peers {
            self.unlink(port, *peer);
        }
        peers
    }

    /// Make a port's connection list equal `targets`, keeping both sides in sync.
    ///
    /// Targets that no longer exist are skipped. Returns the nodes whose
    /// connection lists changed.
    pub(crate) fn set_connections(
        &mut self,
        port: PortRef,
        targets: &[PortRef],
    ) -> Result<Vec<NodeId>> {
        if self.port(port).is_none() {
            return Err(SurfaceError::PortNotFound(port));
        }
        let mut changed = Vec::new();
        let note = |node: NodeId, changed: &mut Vec<NodeId>| {
            if !changed.contains(&node) {
                changed.push(node);
            }
        };
        for current in self.connections_of(port) {
            if !targets.contains(&current) && self.unlink(port, current) {
                note(port.node, &mut changed);
                note(current.node, &mut changed);
            }
        }
        for target in targets {
            if self.port(*target).is_none() {
                tracing::warn!("Skipping link to missing port {:?}", target);
                continue;
            }
            for node in self.link(port, *target)? {
                note(node, &mut changed);
            }
        }
        Ok(changed)
    }

    /// Recompute the types of ports driven by independent ports
    pub(crate) fn refresh_port_types(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.archetype().independent_ports.is_empty() {
            return;
        }
        let driven: Option<ScriptType> = node
            .archetype()
            .independent_ports
            .iter()
            .filter_map(|port_id| node.port(*port_id))
            .flat_map(|port| port.connections().iter())
            .filter_map(|peer| self.port(*peer))
            .map(|peer| peer.current_type.clone())
            .find(|ty| !ty.is_null());
        if let Some(node) = self.nodes.get_mut(&id) {
            node.apply_port_type(driven.as_ref());
        }
    }

    /// Drop all nodes and parameters
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.parameters.clear();
    }

    /// List connection invariant violations (asymmetric links, overfull single ports)
    pub fn check_connections(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for node in self.nodes.values() {
            for port in node.ports() {
                let here = PortRef::new(node.id, port.id);
                if !port.multi && port.connections().len() > 1 {
                    problems.push(format!(
                        "{here:?} is single but has {} connections",
                        port.connections().len()
                    ));
                }
                for peer in port.connections() {
                    match self.port(*peer) {
                        Some(other) if other.is_connected_with(here) => {}
                        Some(_) => problems.push(format!("{here:?} -> {peer:?} is not mirrored")),
                        None => problems.push(format!("{here:?} -> {peer:?} points nowhere")),
                    }
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{GroupArchetype, NodeArchetype, PortArchetype};
    use crate::port::PortId;
    use std::sync::Arc;

    fn context_with(count: u32) -> SurfaceContext {
        let group = Arc::new(GroupArchetype::new(3, "Math"));
        let archetype = Arc::new(
            NodeArchetype::new(1, "Pass")
                .with_input(PortArchetype::new(0, "In", ScriptType::Float))
                .with_output(PortArchetype::new(1, "Out", ScriptType::Float)),
        );
        let mut ctx = SurfaceContext::new(ContextId(0), ContextKey::Named("test".into()), "test", None);
        for i in 1..=count {
            let node = Node::new(NodeId(i), ContextId(0), archetype.clone(), group.clone());
            ctx.insert_node(node).unwrap();
        }
        ctx
    }

    fn input(node: u32) -> PortRef {
        PortRef::new(NodeId(node), PortId(0))
    }

    fn output(node: u32) -> PortRef {
        PortRef::new(NodeId(node), PortId(1))
    }

    #[test]
    fn test_free_id_is_first_fit() {
        let mut ctx = context_with(3);
        assert_eq!(ctx.next_free_node_id(), NodeId(4));
        ctx.take_node(NodeId(2));
        assert_eq!(ctx.next_free_node_id(), NodeId(2));
        let reserved: HashSet<NodeId> = [NodeId(2), NodeId(4)].into_iter().collect();
        assert_eq!(ctx.free_node_id(&reserved), NodeId(5));
    }

    #[test]
    fn test_link_is_symmetric_and_idempotent() {
        let mut ctx = context_with(2);
        let changed = ctx.link(output(1), input(2)).unwrap();
        assert_eq!(changed, vec![NodeId(1), NodeId(2)]);
        assert!(ctx.link(output(1), input(2)).unwrap().is_empty());
        assert_eq!(ctx.connections_of(output(1)), vec![input(2)]);
        assert_eq!(ctx.connections_of(input(2)), vec![output(1)]);
        assert!(ctx.check_connections().is_empty());
    }

    #[test]
    fn test_link_displaces_single_connection() {
        let mut ctx = context_with(3);
        ctx.link(output(1), input(3)).unwrap();
        let changed = ctx.link(output(2), input(3)).unwrap();
        assert!(changed.contains(&NodeId(1)));
        assert_eq!(ctx.connections_of(input(3)), vec![output(2)]);
        assert!(ctx.connections_of(output(1)).is_empty());
        assert!(ctx.check_connections().is_empty());
    }

    #[test]
    fn test_link_missing_port_fails() {
        let mut ctx = context_with(1);
        assert!(matches!(
            ctx.link(output(1), input(9)),
            Err(SurfaceError::PortNotFound(_))
        ));
    }

    #[test]
    fn test_take_node_detaches_peers() {
        let mut ctx = context_with(3);
        ctx.link(output(1), input(2)).unwrap();
        ctx.link(output(1), input(3)).unwrap();
        let (_, peers) = ctx.take_node(NodeId(1)).unwrap();
        assert_eq!(peers, vec![NodeId(2), NodeId(3)]);
        assert!(ctx.connections_of(input(2)).is_empty());
        assert!(ctx.check_connections().is_empty());
    }

    #[test]
    fn test_set_connections() {
        let mut ctx = context_with(3);
        ctx.link(output(1), input(2)).unwrap();
        ctx.set_connections(output(1), &[input(3)]).unwrap();
        assert_eq!(ctx.connections_of(output(1)), vec![input(3)]);
        assert!(ctx.connections_of(input(2)).is_empty());
        assert!(ctx.check_connections().is_empty());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node creation, removal and editing, plus the lifecycle hooks.

use super::Surface;
use crate::archetype::NodeKind;
use crate::connecting::ConnectingState;
use crate::context::{ContextId, ContextKey};
use crate::error::{Result, SurfaceError};
use crate::events::SurfaceEvent;
use crate::graph_data::NodeRecord;
use crate::groups;
use crate::node::NodeId;
use crate::parameter::{unique_parameter_name, SurfaceParameter};
use crate::port::{PortId, PortRef};
use crate::types::ScriptType;
use crate::undo::{NodeMove, UndoAction};
use crate::value::Value;
use egui::{Pos2, Vec2};
use indexmap::IndexMap;
use std::sync::Arc;
use uuid::Uuid;

impl Surface {
    /// Spawn a node from an archetype.
    ///
    /// Returns `Ok(None)` (and logs) when the archetype is unknown or the
    /// policy forbids it here. Custom values must match the archetype's
    /// value shape.
    pub fn spawn_node(
        &mut self,
        context: ContextId,
        group_id: u16,
        type_id: u16,
        location: Pos2,
        custom_values: Option<Vec<Value>>,
    ) -> Result<Option<NodeId>> {
        self.ctx(context)?;
        self.sync_factory();
        let Some((group, archetype)) = self.factory.resolve(group_id, type_id) else {
            return Ok(None);
        };
        if !self.policy.can_use_node_type(&group, &archetype) {
            tracing::warn!(
                "Node type {} ({}:{}) is not allowed in this surface",
                archetype.title,
                group_id,
                type_id
            );
            return Ok(None);
        }
        if let Some(values) = &custom_values {
            archetype.check_values(values)?;
        }

        let id = self.ctx(context)?.next_free_node_id();
        let kind = archetype.kind.clone();
        let mut node = kind.create(id, context, archetype, group);
        node.location = location;
        if let Some(values) = custom_values {
            node.values = values;
            node.apply_size_value();
        }
        let record = NodeRecord::from_node(&node);
        let handle = self.context_handle(context)?;
        self.ctx_mut(context)?.insert_node(node)?;

        self.on_loaded(context, id);
        self.on_spawned(context, id);
        self.record(UndoAction::AddRemoveNode {
            context: handle,
            node: record,
            added: true,
        });
        self.mark_as_modified(context, true);
        Ok(Some(id))
    }

    /// Remove a node, detaching all its connections.
    ///
    /// A nested graph owned by the node is saved into the node first, so
    /// undo brings it back, then torn down.
    pub fn remove_node(&mut self, context: ContextId, node: NodeId) -> Result<()> {
        if self.ctx(context)?.find_node(node).is_none() {
            return Err(SurfaceError::NodeNotFound(node));
        }
        if let Some(sub) = self.find_context(&ContextKey::Node { parent: context, node }) {
            self.write_back_children(context)?;
            let on_stack = self.stack.contains(&sub);
            self.destroy_context(sub);
            if on_stack {
                self.stack_changed();
            }
        }

        let handle = self.context_handle(context)?;
        let ctx = self.ctx_mut(context)?;
        let record = ctx.find_node(node).map(NodeRecord::from_node);
        let Some((_, peers)) = ctx.take_node(node) else {
            return Err(SurfaceError::NodeNotFound(node));
        };
        if matches!(self.connecting.instigator(), Some((c, p)) if c == context && p.node == node) {
            self.connecting = ConnectingState::Idle;
        }

        self.on_deleted(context, node);
        for peer in peers {
            self.on_connections_changed(context, peer);
        }
        if let Some(record) = record {
            self.record(UndoAction::AddRemoveNode {
                context: handle,
                node: record,
                added: false,
            });
        }
        self.mark_as_modified(context, true);
        Ok(())
    }

    /// User delete: removes the removable nodes of a selection as one undo step
    pub fn delete(&mut self, context: ContextId, nodes: &[NodeId]) -> Result<usize> {
        self.batch("Delete nodes", |surface| {
            let mut removed = 0;
            for id in nodes {
                let removable = surface
                    .ctx(context)?
                    .find_node(*id)
                    .map(|n| n.can_remove());
                match removable {
                    Some(true) => {
                        surface.remove_node(context, *id)?;
                        removed += 1;
                    }
                    Some(false) => tracing::debug!("Node {:?} cannot be removed", id),
                    None => tracing::debug!("Node {:?} already gone", id),
                }
            }
            Ok(removed)
        })
    }

    /// Set one value of a node
    pub fn set_node_value(
        &mut self,
        context: ContextId,
        node: NodeId,
        index: usize,
        value: Value,
    ) -> Result<()> {
        let current = self
            .ctx(context)?
            .find_node(node)
            .ok_or(SurfaceError::NodeNotFound(node))?;
        let slot = current
            .values()
            .get(index)
            .ok_or(SurfaceError::ValueIndex(index))?;
        if !current.archetype().has_variable_values() && !slot.same_kind(&value) {
            return Err(SurfaceError::ValueType(index));
        }
        let mut values = current.values().to_vec();
        values[index] = value;
        self.set_node_values(context, node, values)
    }

    /// Replace all values of a node
    pub fn set_node_values(
        &mut self,
        context: ContextId,
        node: NodeId,
        values: Vec<Value>,
    ) -> Result<()> {
        let handle = self.context_handle(context)?;
        let target = self
            .ctx_mut(context)?
            .node_mut(node)
            .ok_or(SurfaceError::NodeNotFound(node))?;
        target.archetype().check_values(&values)?;
        if target.values == values {
            return Ok(());
        }
        let before = std::mem::replace(&mut target.values, values.clone());

        self.on_values_changed(context, node);
        self.record(UndoAction::EditNodeValues {
            context: handle,
            node,
            before,
            after: values,
        });
        self.mark_as_modified(context, true);
        Ok(())
    }

    /// Move nodes by `delta`; fixed nodes stay in place
    pub fn move_nodes(&mut self, context: ContextId, nodes: &[NodeId], delta: Vec2) -> Result<()> {
        let handle = self.context_handle(context)?;
        let ctx = self.ctx_mut(context)?;
        if let Some(missing) = nodes.iter().find(|id| ctx.find_node(**id).is_none()) {
            return Err(SurfaceError::NodeNotFound(*missing));
        }
        let mut moves = Vec::new();
        for id in nodes {
            let Some(node) = ctx.node_mut(*id) else {
                continue;
            };
            if !node.can_move() {
                continue;
            }
            let before = node.location;
            node.location += delta;
            moves.push(NodeMove {
                node: *id,
                before,
                after: node.location,
            });
        }
        if moves.is_empty() {
            return Ok(());
        }
        self.record(UndoAction::MoveNodes {
            context: handle,
            moves,
        });
        self.mark_as_modified(context, true);
        Ok(())
    }

    /// Place a node at an exact location
    pub fn set_node_location(&mut self, context: ContextId, node: NodeId, location: Pos2) -> Result<()> {
        let current = self
            .ctx(context)?
            .find_node(node)
            .ok_or(SurfaceError::NodeNotFound(node))?
            .location();
        self.move_nodes(context, &[node], location - current)
    }

    /// Replace a constant node with a new parameter and a getter wired the same way
    pub fn convert_to_parameter(&mut self, context: ContextId, node: NodeId) -> Result<Uuid> {
        let source = self
            .ctx(context)?
            .find_node(node)
            .ok_or(SurfaceError::NodeNotFound(node))?;
        let NodeKind::ConvertibleToParameter {
            value_index,
            parameter_type,
        } = source.kind().clone()
        else {
            return Err(SurfaceError::NotConvertible(node));
        };
        let value = source
            .value(value_index)
            .cloned()
            .ok_or(SurfaceError::ValueIndex(value_index))?;
        let location = source.location();
        let title = source.title().to_string();
        let targets: Vec<PortRef> = source
            .outputs()
            .flat_map(|port| port.connections().iter().copied())
            .collect();

        let getter_allowed = self
            .factory
            .resolve(groups::PARAMETERS, groups::parameters::GET)
            .is_some_and(|(group, archetype)| self.policy.can_use_node_type(&group, &archetype));
        if !getter_allowed {
            return Err(SurfaceError::NotConvertible(node));
        }

        self.batch("Convert to parameter", |surface| {
            let root = surface.root.ok_or(SurfaceError::NoRoot)?;
            let name = unique_parameter_name(surface.ctx(root)?.parameters(), &title);
            let id = surface.add_parameter(SurfaceParameter::new(name, parameter_type, value))?;
            let getter = surface
                .spawn_node(
                    context,
                    groups::PARAMETERS,
                    groups::parameters::GET,
                    location,
                    Some(vec![Value::Guid(id)]),
                )?
                .ok_or(SurfaceError::NotConvertible(node))?;
            surface.remove_node(context, node)?;
            let output = PortRef::new(getter, PortId(0));
            for target in targets {
                if surface.can_connect_with(context, output, target) {
                    surface.connect(context, output, target)?;
                }
            }
            Ok(id)
        })
    }

    /// Re-create a node from a snapshot (undo of a removal, redo of a spawn)
    pub(crate) fn restore_node(&mut self, context: ContextId, record: &NodeRecord) -> Result<()> {
        if self.ctx(context)?.find_node(record.id).is_some() {
            return Err(SurfaceError::Handle(format!(
                "node {:?} already exists in context {:?}",
                record.id, context
            )));
        }
        let node = self.instantiate_record(context, record);
        self.ctx_mut(context)?.insert_node(node)?;
        let touched = self.link_record(context, record)?;
        self.on_loaded(context, record.id);
        for peer in touched {
            self.on_connections_changed(context, peer);
        }
        self.mark_as_modified(context, true);
        Ok(())
    }

    // Lifecycle hooks

    pub(crate) fn on_loaded(&mut self, context: ContextId, node: NodeId) {
        self.refresh_node_state(context, node);
        self.emit(SurfaceEvent::NodeLoaded { context, node });
    }

    pub(crate) fn on_spawned(&mut self, context: ContextId, node: NodeId) {
        self.emit(SurfaceEvent::NodeSpawned { context, node });
    }

    pub(crate) fn on_pasted(&mut self, context: ContextId, node: NodeId, mapping: Arc<IndexMap<u32, NodeId>>) {
        self.emit(SurfaceEvent::NodePasted {
            context,
            node,
            mapping,
        });
    }

    pub(crate) fn on_deleted(&mut self, context: ContextId, node: NodeId) {
        self.emit(SurfaceEvent::NodeDeleted { context, node });
    }

    pub(crate) fn on_connections_changed(&mut self, context: ContextId, node: NodeId) {
        if let Some(ctx) = self.contexts.get_mut(&context) {
            ctx.refresh_port_types(node);
        }
        self.emit(SurfaceEvent::ConnectionsChanged { context, node });
    }

    pub(crate) fn on_values_changed(&mut self, context: ContextId, node: NodeId) {
        self.refresh_node_state(context, node);
        self.emit(SurfaceEvent::ValuesChanged { context, node });
    }

    /// Sync state derived from values: size, parameter getter type
    fn refresh_node_state(&mut self, context: ContextId, node: NodeId) {
        let parameter_type = self.getter_type(context, node);
        let Some(target) = self
            .contexts
            .get_mut(&context)
            .and_then(|ctx| ctx.node_mut(node))
        else {
            return;
        };
        target.apply_size_value();
        if let Some(ty) = parameter_type {
            target.set_output_type(&ty);
        }
    }

    /// Output type of a parameter getter; `Null` when the parameter is missing
    fn getter_type(&self, context: ContextId, node: NodeId) -> Option<ScriptType> {
        let target = self.contexts.get(&context)?.find_node(node)?;
        let NodeKind::ParameterGetter { id_value } = *target.kind() else {
            return None;
        };
        let id = target.value(id_value).and_then(Value::as_guid);
        let parameter = self
            .root
            .and_then(|root| self.contexts.get(&root))
            .and_then(|root| id.and_then(|id| root.find_parameter(id)));
        Some(parameter.map_or(ScriptType::Null, |p| p.ty.clone()))
    }

    /// Refresh every parameter getter in every context
    pub(crate) fn refresh_parameter_getters(&mut self) {
        let getters: Vec<(ContextId, NodeId)> = self
            .contexts
            .values()
            .flat_map(|ctx| {
                ctx.nodes()
                    .filter(|n| matches!(n.kind(), NodeKind::ParameterGetter { .. }))
                    .map(|n| (ctx.id(), n.id))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (context, node) in getters {
            self.refresh_node_state(context, node);
        }
    }
}

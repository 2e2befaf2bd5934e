// SPDX-License-Identifier: MIT OR Apache-2.0
//! Context navigation stack, loading and saving.

use super::Surface;
use crate::connecting::ConnectingState;
use crate::context::{ContextId, ContextKey, SurfaceContext};
use crate::error::{Result, SurfaceError};
use crate::events::SurfaceEvent;
use crate::graph_data::{GraphData, NodeRecord};
use crate::node::{Node, NodeId};
use crate::port::PortRef;
use crate::source::{NodeSource, SurfaceSource};
use crate::value::Value;

impl Surface {
    /// Open the context of a data source.
    ///
    /// A context already on the stack is re-entered (levels above it are
    /// popped); a cached context off the stack is pushed; otherwise a new
    /// context is created as a child of the current one and, when a root
    /// exists, loaded from the source. A nested graph cannot become the
    /// bottom of an empty stack.
    pub fn open_context(&mut self, source: &dyn SurfaceSource) -> Result<ContextId> {
        let key = source.key();
        if self.stack.is_empty() {
            let nested = match self.find_context(&key) {
                Some(id) => self.ctx(id)?.parent().is_some(),
                None => matches!(key, ContextKey::Node { .. }),
            };
            if nested {
                tracing::warn!("Cannot open nested graph {:?} without its root", key);
                return Err(SurfaceError::NoRoot);
            }
        }
        if let Some(id) = self.find_context(&key) {
            self.leave_current();
            match self.stack.iter().position(|c| *c == id) {
                Some(pos) => self.stack.truncate(pos + 1),
                None => self.stack.push(id),
            }
            self.stack_changed();
            return Ok(id);
        }

        let parent = match key {
            ContextKey::Node { parent, .. } => Some(parent),
            _ => self.current(),
        };
        let id = self.create_context(key, source.surface_name(), parent)?;
        source.on_context_created(self.ctx(id)?);

        if parent.is_some() {
            if let Err(err) = self.load_from_source(id, source) {
                self.destroy_context(id);
                return Err(err);
            }
        }

        self.leave_current();
        self.stack.push(id);
        self.stack_changed();
        Ok(id)
    }

    /// Pop one navigation level
    pub fn close_context(&mut self) -> Result<()> {
        if self.stack.is_empty() {
            return Err(SurfaceError::EmptyStack);
        }
        self.leave_current();
        self.stack.pop();
        self.stack_changed();
        Ok(())
    }

    /// Evict the context of a data source.
    ///
    /// Removing the root's source closes every level first. A node-owned
    /// graph is written back into its owner before it goes.
    pub fn remove_context(&mut self, source: &dyn SurfaceSource) -> Result<()> {
        let key = source.key();
        let is_root = self
            .root
            .and_then(|root| self.contexts.get(&root))
            .is_some_and(|root| *root.key() == key);
        if is_root {
            while !self.stack.is_empty() {
                self.close_context()?;
            }
        }
        if let Some(id) = self.find_context(&key) {
            if let ContextKey::Node { parent, .. } = key {
                if self.contexts.contains_key(&parent) {
                    self.write_back_children(parent)?;
                }
            }
            self.destroy_context(id);
            self.stack_changed();
        }
        Ok(())
    }

    /// Replace the whole surface with the graph of `source`
    pub fn load(&mut self, source: &dyn SurfaceSource) -> Result<ContextId> {
        self.clear();
        let id = self.open_context(source)?;
        if let Err(err) = self.load_from_source(id, source) {
            self.clear();
            return Err(err);
        }
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
        Ok(id)
    }

    /// Encode the root graph, writing nested graphs into their owner nodes first
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        self.write_back_children(root)?;
        let bytes = self.encode_context(root)?;
        for ctx in self.contexts.values_mut() {
            ctx.modified = false;
        }
        Ok(bytes)
    }

    /// Encode one context
    pub fn encode_context(&self, context: ContextId) -> Result<Vec<u8>> {
        let ctx = self.ctx(context)?;
        GraphData::capture(ctx.nodes(), ctx.parameters()).to_bytes()
    }

    /// Data source of the graph owned by a node
    pub fn node_source(&self, context: ContextId, node: NodeId) -> Result<NodeSource> {
        let owner = self
            .ctx(context)?
            .find_node(node)
            .ok_or(SurfaceError::NodeNotFound(node))?;
        let data = owner
            .nested_graph()
            .ok_or(SurfaceError::NoNestedGraph(node))?;
        Ok(NodeSource {
            parent: context,
            node,
            name: owner.nested_graph_name(),
            data: data.to_vec(),
        })
    }

    /// Open the graph owned by a node
    pub fn open_node(&mut self, context: ContextId, node: NodeId) -> Result<ContextId> {
        let source = self.node_source(context, node)?;
        self.open_context(&source)
    }

    /// Context of the graph owned by a node, created off-stack if needed
    pub(crate) fn ensure_node_context(&mut self, parent: ContextId, node: NodeId) -> Result<ContextId> {
        let key = ContextKey::Node { parent, node };
        if let Some(id) = self.find_context(&key) {
            return Ok(id);
        }
        let source = self.node_source(parent, node)?;
        let id = self.create_context(key, source.surface_name(), Some(parent))?;
        if let Err(err) = self.load_from_source(id, &source) {
            self.destroy_context(id);
            return Err(err);
        }
        Ok(id)
    }

    fn create_context(
        &mut self,
        key: ContextKey,
        name: String,
        parent: Option<ContextId>,
    ) -> Result<ContextId> {
        if self.cache.contains_key(&key) {
            return Err(SurfaceError::DuplicateContext(key));
        }
        let id = ContextId(self.next_context_id);
        self.next_context_id += 1;
        if let Some(parent) = parent {
            self.ctx_mut(parent)?.children.push(id);
        }
        tracing::debug!("Creating context {:?} '{}' for {:?}", id, name, key);
        self.contexts
            .insert(id, SurfaceContext::new(id, key.clone(), name, parent));
        self.cache.insert(key, id);
        Ok(id)
    }

    /// Tear down a context and its children, evicting them from the cache
    pub(crate) fn destroy_context(&mut self, id: ContextId) {
        let Some(mut ctx) = self.contexts.shift_remove(&id) else {
            return;
        };
        for child in std::mem::take(&mut ctx.children) {
            self.destroy_context(child);
        }
        if let Some(parent) = ctx.parent().and_then(|p| self.contexts.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        self.cache.shift_remove(ctx.key());
        self.stack.retain(|c| *c != id);
        if self.connecting.instigator().is_some_and(|(c, _)| c == id) {
            self.connecting = ConnectingState::Idle;
        }
        ctx.clear();
        tracing::debug!("Destroyed context {:?} '{}'", id, ctx.name());
    }

    fn clear(&mut self) {
        self.contexts.clear();
        self.cache.clear();
        self.stack.clear();
        self.root = None;
        self.connecting = ConnectingState::Idle;
    }

    fn leave_current(&mut self) {
        let view = self.view;
        if let Some(ctx) = self.current().and_then(|id| self.contexts.get_mut(&id)) {
            ctx.cached_view = Some(view);
        }
    }

    pub(super) fn stack_changed(&mut self) {
        self.root = self.stack.first().copied();
        let top = self.current();
        self.emit(SurfaceEvent::ContextChanged { context: top });
        let Some(top) = top else {
            return;
        };
        match self.contexts.get(&top).and_then(SurfaceContext::cached_view) {
            Some(view) => {
                self.view = view;
                self.emit(SurfaceEvent::ViewRestored { context: top, view });
            }
            None => {
                self.view = Default::default();
                self.emit(SurfaceEvent::FitWholeGraph { context: top });
            }
        }
    }

    fn load_from_source(&mut self, id: ContextId, source: &dyn SurfaceSource) -> Result<()> {
        let name = source.surface_name();
        let bytes = source.surface_data().ok_or_else(|| SurfaceError::Load {
            name: name.clone(),
            reason: "surface data is unavailable".to_string(),
        })?;
        let data = GraphData::from_bytes(&bytes).map_err(|err| SurfaceError::Load {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        self.load_graph(id, data)?;
        tracing::info!("Loaded surface '{}' ({} nodes)", name, self.ctx(id)?.node_count());
        Ok(())
    }

    fn load_graph(&mut self, id: ContextId, data: GraphData) -> Result<()> {
        self.sync_factory();
        let is_root = self.ctx(id)?.is_root();
        let mut loaded = Vec::with_capacity(data.nodes.len());
        for record in &data.nodes {
            let node = self.instantiate_record(id, record);
            loaded.push(node.id);
            self.ctx_mut(id)?.insert_node(node)?;
        }
        for record in &data.nodes {
            self.link_record(id, record)?;
        }
        if is_root {
            self.ctx_mut(id)?.parameters = data.parameters;
        } else if !data.parameters.is_empty() {
            tracing::warn!("Ignoring {} parameters stored in a nested graph", data.parameters.len());
        }
        for node in &loaded {
            self.ctx_mut(id)?.refresh_port_types(*node);
            self.on_loaded(id, *node);
        }
        self.ctx_mut(id)?.modified = false;
        self.emit(SurfaceEvent::SurfaceLoaded { context: id });
        Ok(())
    }

    /// Build a node from a snapshot; unknown archetypes become placeholders
    pub(crate) fn instantiate_record(&self, context: ContextId, record: &NodeRecord) -> Node {
        let Some((group, archetype)) = self.factory.resolve(record.group_id, record.type_id) else {
            let mut node = Node::missing(record.id, context, record.group_id, record.type_id);
            node.location = record.location;
            node.values = record.values.clone();
            return node;
        };
        let kind = archetype.kind.clone();
        let mut node = kind.create(record.id, context, archetype, group);
        node.location = record.location;
        if node.archetype().check_values(&record.values).is_ok() {
            node.values = record.values.clone();
        } else {
            tracing::warn!(
                "Node {:?} ({}) values do not match its archetype, keeping matching entries",
                record.id,
                node.title()
            );
            for (slot, saved) in node.values.iter_mut().zip(&record.values) {
                if slot.same_kind(saved) {
                    *slot = saved.clone();
                }
            }
        }
        node.apply_size_value();
        node
    }

    /// Restore the links of a snapshot to ports that exist; returns touched nodes
    pub(crate) fn link_record(&mut self, context: ContextId, record: &NodeRecord) -> Result<Vec<NodeId>> {
        let ctx = self.ctx_mut(context)?;
        let mut touched = Vec::new();
        for port in &record.ports {
            let here = PortRef::new(record.id, port.id);
            for target in &port.connections {
                if ctx.port(here).is_none() || ctx.port(*target).is_none() {
                    tracing::warn!("Dropping connection {:?} -> {:?}: port not found", here, target);
                    continue;
                }
                for node in ctx.link(here, *target)? {
                    if !touched.contains(&node) {
                        touched.push(node);
                    }
                }
            }
        }
        Ok(touched)
    }

    /// Write modified nested graphs back into their owner nodes, deepest first
    pub(crate) fn write_back_children(&mut self, id: ContextId) -> Result<()> {
        let children = self.ctx(id)?.children().to_vec();
        for child in children {
            self.write_back_children(child)?;
            let ctx = self.ctx(child)?;
            if !ctx.is_modified() {
                continue;
            }
            let Some(owner) = ctx.owner_node() else {
                continue;
            };
            let bytes = self.encode_context(child)?;
            let parent = self.ctx_mut(id)?;
            let Some(node) = parent.node_mut(owner) else {
                tracing::warn!("Owner node {:?} of context {:?} is gone", owner, child);
                continue;
            };
            if let Some(index) = node.kind().nested_graph_value() {
                if let Some(slot) = node.values.get_mut(index) {
                    *slot = Value::Bytes(bytes);
                }
            }
            parent.modified = true;
            self.ctx_mut(child)?.modified = false;
        }
        Ok(())
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy, cut, paste and duplicate.

use super::Surface;
use crate::archetype::{NodeFlags, NodeKind};
use crate::clipboard::{ClipboardData, ClipboardError};
use crate::context::{ContextId, ContextKey, SurfaceContext};
use crate::error::{Result, SurfaceError};
use crate::graph_data::NodeRecord;
use crate::node::{Node, NodeId};
use crate::port::{PortId, PortRef};
use crate::undo::UndoAction;
use crate::value::MAX_VALUES;
use egui::{Pos2, Vec2};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of a paste
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteResult {
    /// Pasted nodes, in clipboard order
    pub nodes: Vec<NodeId>,
    /// The subset of `nodes` that are comments
    pub comments: Vec<NodeId>,
    /// Clipboard node ID to new node ID
    pub mapping: IndexMap<u32, NodeId>,
}

impl PasteResult {
    /// Whether nothing was pasted
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Surface {
    /// Serialize a selection to clipboard text
    pub fn copy_to_text(&self, context: ContextId, selection: &[NodeId]) -> Result<String> {
        let ctx = self.ctx(context)?;
        let nodes: Vec<&Node> = selection
            .iter()
            .filter_map(|id| ctx.find_node(*id))
            .collect();
        Ok(ClipboardData::capture(&nodes, self.cast.types()).to_text()?)
    }

    /// Copy a selection to the clipboard
    pub fn copy(&mut self, context: ContextId, selection: &[NodeId]) -> Result<()> {
        let text = self.copy_to_text(context, selection)?;
        self.clipboard.set_text(text);
        tracing::debug!("Copied {} nodes", selection.len());
        Ok(())
    }

    /// Copy a selection, then delete it
    pub fn cut(&mut self, context: ContextId, selection: &[NodeId]) -> Result<usize> {
        self.copy(context, selection)?;
        self.delete(context, selection)
    }

    /// Paste the clipboard contents with their top-left corner at `location`
    pub fn paste(&mut self, context: ContextId, location: Pos2) -> Result<PasteResult> {
        let text = self
            .clipboard
            .get_text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ClipboardError::Empty)?;
        self.paste_text(context, &text, location)
    }

    /// Copy and paste a selection without touching the clipboard.
    ///
    /// Without a location the copy lands offset from the original.
    pub fn duplicate(
        &mut self,
        context: ContextId,
        selection: &[NodeId],
        location: Option<Pos2>,
    ) -> Result<PasteResult> {
        let bounds = self.ctx(context)?.bounds_of(selection);
        let Some(bounds) = bounds else {
            return Ok(PasteResult::default());
        };
        let text = self.copy_to_text(context, selection)?;
        let location = location.unwrap_or(bounds.min + self.config.duplicate_offset);
        self.paste_text(context, &text, location)
    }

    /// Paste clipboard text into a context.
    ///
    /// Every node is built and wired in a scratch context first, so a
    /// failure leaves the target untouched. Unknown archetypes, types the
    /// policy forbids and types flagged as not pasteable are skipped.
    /// Values that cannot be converted keep the archetype default.
    pub fn paste_text(&mut self, context: ContextId, text: &str, location: Pos2) -> Result<PasteResult> {
        let data = ClipboardData::from_text(text)?;
        self.ctx(context)?;
        self.sync_factory();

        let staged = self.stage_paste(context, &data, location)?;
        if staged.result.is_empty() {
            return Ok(staged.result);
        }
        let PastePlan { mut scratch, result } = staged;

        let handle = self.context_handle(context)?;
        let nodes = scratch.take_all_nodes();
        let records: Vec<NodeRecord> = nodes.iter().map(NodeRecord::from_node).collect();
        let ctx = self.ctx_mut(context)?;
        for node in nodes {
            ctx.insert_node(node)?;
        }

        for id in &result.nodes {
            self.ctx_mut(context)?.refresh_port_types(*id);
            self.on_loaded(context, *id);
        }
        for id in &result.nodes {
            self.on_spawned(context, *id);
        }
        let mapping = Arc::new(result.mapping.clone());
        for id in &result.nodes {
            self.on_pasted(context, *id, Arc::clone(&mapping));
        }

        self.batch("Paste", |surface| {
            for record in records {
                surface.record(UndoAction::AddRemoveNode {
                    context: handle.clone(),
                    node: record,
                    added: true,
                });
            }
            Ok(())
        })?;
        self.mark_as_modified(context, true);
        tracing::info!("Pasted {} nodes", result.nodes.len());
        Ok(result)
    }

    fn stage_paste(&self, context: ContextId, data: &ClipboardData, location: Pos2) -> Result<PastePlan> {
        let live = self.ctx(context)?;
        let mut scratch = SurfaceContext::new(
            ContextId(0),
            ContextKey::Named("paste".to_string()),
            String::new(),
            None,
        );
        let mut reserved = HashSet::new();
        let mut result = PasteResult::default();

        let origin = data
            .nodes
            .iter()
            .map(|n| Vec2::new(n.location[0], n.location[1]))
            .reduce(|a, b| a.min(b))
            .unwrap_or(Vec2::ZERO);

        for entry in &data.nodes {
            let Some((group, archetype)) = self.factory.resolve(entry.group_id, entry.type_id) else {
                continue;
            };
            if !self.policy.can_use_node_type(&group, &archetype) {
                tracing::warn!("Skipping pasted node {}: not allowed in this surface", archetype.title);
                continue;
            }
            if archetype.flags.contains(NodeFlags::NO_SPAWN_VIA_PASTE) {
                tracing::debug!("Skipping pasted node {}: cannot be pasted", archetype.title);
                continue;
            }

            let id = live.free_node_id(&reserved);
            reserved.insert(id);
            let variable = archetype.has_variable_values();
            let kind = archetype.kind.clone();
            let mut node = kind.create(id, context, archetype, group);
            node.location = location + (Vec2::new(entry.location[0], entry.location[1]) - origin);

            let kept = if variable {
                entry.values.len().min(MAX_VALUES)
            } else {
                node.values.len()
            };
            if entry.values.len() > kept {
                tracing::debug!(
                    "Dropping {} extra values of pasted node {}",
                    entry.values.len() - kept,
                    node.title()
                );
            }
            for (index, value) in entry.values.iter().take(kept).enumerate() {
                let Some(slot) = node.values.get(index) else {
                    node.values.push(value.to_value());
                    continue;
                };
                match value.convert(slot, self.cast.types()) {
                    Ok(converted) => node.values[index] = converted,
                    Err(err) => tracing::warn!(
                        "Pasted node {:?} value {} kept its default: {}",
                        id,
                        index,
                        err
                    ),
                }
            }
            if variable {
                node.values.truncate(kept);
            }
            node.apply_size_value();

            if matches!(node.kind(), NodeKind::Comment { .. }) {
                result.comments.push(id);
            }
            result.nodes.push(id);
            result.mapping.insert(entry.id, id);
            scratch.insert_node(node)?;
        }

        for entry in &data.nodes {
            let Some(node) = result.mapping.get(&entry.id).copied() else {
                continue;
            };
            for port in &entry.ports {
                let here = PortRef::new(node, PortId(port.id));
                for (other, other_port) in &port.connections {
                    let Some(other) = result.mapping.get(other).copied() else {
                        continue;
                    };
                    let there = PortRef::new(other, PortId(*other_port));
                    if scratch.port(here).is_none() || scratch.port(there).is_none() {
                        tracing::debug!("Skipping pasted connection {:?} -> {:?}", here, there);
                        continue;
                    }
                    scratch.link(here, there).map_err(|err| {
                        SurfaceError::Handle(format!("paste connection {here:?} -> {there:?}: {err}"))
                    })?;
                }
            }
        }

        Ok(PastePlan { scratch, result })
    }
}

struct PastePlan {
    scratch: SurfaceContext,
    result: PasteResult,
}

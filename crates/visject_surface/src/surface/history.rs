// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo replay and handle resolution.

use super::Surface;
use crate::context::{ContextId, ContextKey};
use crate::error::{Result, SurfaceError};
use crate::port::PortRef;
use crate::undo::{ContextHandle, PortHandle, UndoAction};

impl Surface {
    /// Revert the last recorded action
    pub fn undo(&mut self) -> Result<()> {
        let entry = self
            .history
            .as_mut()
            .ok_or(SurfaceError::NothingToUndo)?
            .pop_undo()?;
        tracing::debug!("Undo: {}", entry.description);
        match self.replay(&entry.action, false) {
            Ok(()) => {
                if let Some(history) = self.history.as_mut() {
                    history.push_undone(entry);
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Discarding history entry '{}': {}", entry.description, err);
                Err(err)
            }
        }
    }

    /// Re-apply the last undone action
    pub fn redo(&mut self) -> Result<()> {
        let entry = self
            .history
            .as_mut()
            .ok_or(SurfaceError::NothingToRedo)?
            .pop_redo()?;
        tracing::debug!("Redo: {}", entry.description);
        match self.replay(&entry.action, true) {
            Ok(()) => {
                if let Some(history) = self.history.as_mut() {
                    history.push_redone(entry);
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Discarding history entry '{}': {}", entry.description, err);
                Err(err)
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_undo())
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_redo())
    }

    fn replay(&mut self, action: &UndoAction, forward: bool) -> Result<()> {
        self.replaying = true;
        let result = self.apply(action, forward);
        self.replaying = false;
        result
    }

    fn apply(&mut self, action: &UndoAction, forward: bool) -> Result<()> {
        match action {
            UndoAction::AddRemoveNode {
                context,
                node,
                added,
            } => {
                let context = self.resolve_context(context)?;
                if *added == forward {
                    self.restore_node(context, node)
                } else {
                    self.remove_node(context, node.id)
                }
            }
            UndoAction::ConnectPorts { context, changes } => {
                let context = self.resolve_context(context)?;
                let mut touched = Vec::new();
                for change in changes {
                    let targets = if forward { &change.after } else { &change.before };
                    for node in self.ctx_mut(context)?.set_connections(change.port, targets)? {
                        if !touched.contains(&node) {
                            touched.push(node);
                        }
                    }
                }
                for node in touched {
                    self.on_connections_changed(context, node);
                }
                self.mark_as_modified(context, true);
                Ok(())
            }
            UndoAction::EditNodeValues {
                context,
                node,
                before,
                after,
            } => {
                let context = self.resolve_context(context)?;
                let values = if forward { after } else { before };
                self.set_node_values(context, *node, values.clone())
            }
            UndoAction::MoveNodes { context, moves } => {
                let context = self.resolve_context(context)?;
                let ctx = self.ctx_mut(context)?;
                for step in moves {
                    let node = ctx
                        .node_mut(step.node)
                        .ok_or(SurfaceError::NodeNotFound(step.node))?;
                    node.location = if forward { step.after } else { step.before };
                }
                self.mark_as_modified(context, true);
                Ok(())
            }
            UndoAction::AddRemoveParameter {
                root,
                parameter,
                index,
                added,
            } => {
                self.check_root(root)?;
                if *added == forward {
                    self.insert_parameter(*index, parameter.clone())
                } else {
                    self.take_parameter(parameter.id).map(|_| ())
                }
            }
            UndoAction::RenameParameter {
                root,
                id,
                before,
                after,
            } => {
                self.check_root(root)?;
                let name = if forward { after } else { before };
                self.set_parameter_name(*id, name.clone())
            }
            UndoAction::EditParameter {
                root,
                id,
                before,
                after,
            } => {
                self.check_root(root)?;
                let value = if forward { after } else { before };
                self.replace_parameter_value(*id, value.clone()).map(|_| ())
            }
            UndoAction::Batch { actions, .. } => {
                if forward {
                    actions.iter().try_for_each(|a| self.apply(a, true))
                } else {
                    actions.iter().rev().try_for_each(|a| self.apply(a, false))
                }
            }
        }
    }

    fn check_root(&self, key: &ContextKey) -> Result<()> {
        let current = self.root.and_then(|root| self.contexts.get(&root));
        match current {
            Some(root) if root.key() == key => Ok(()),
            _ => Err(SurfaceError::Handle(format!("root {key:?} is not loaded"))),
        }
    }

    /// Indirect address of a context: root data source plus owner-node path
    pub fn context_handle(&self, context: ContextId) -> Result<ContextHandle> {
        let mut path = Vec::new();
        let mut current = context;
        loop {
            match self.ctx(current)?.key() {
                ContextKey::Node { parent, node } => {
                    path.push(*node);
                    current = *parent;
                }
                root => {
                    path.reverse();
                    return Ok(ContextHandle {
                        root: root.clone(),
                        path,
                    });
                }
            }
        }
    }

    /// Find or re-create the context a handle points at
    pub fn resolve_context(&mut self, handle: &ContextHandle) -> Result<ContextId> {
        let mut context = self
            .find_context(&handle.root)
            .ok_or_else(|| SurfaceError::Handle(format!("context {:?} is not loaded", handle.root)))?;
        for node in &handle.path {
            context = self.ensure_node_context(context, *node)?;
        }
        Ok(context)
    }

    /// Indirect address of a port
    pub fn port_handle(&self, context: ContextId, port: PortRef) -> Result<PortHandle> {
        if self.ctx(context)?.port(port).is_none() {
            return Err(SurfaceError::PortNotFound(port));
        }
        Ok(PortHandle {
            context: self.context_handle(context)?,
            port,
        })
    }

    /// Find the port a handle points at
    pub fn resolve_port(&mut self, handle: &PortHandle) -> Result<(ContextId, PortRef)> {
        let context = self.resolve_context(&handle.context)?;
        if self.ctx(context)?.port(handle.port).is_none() {
            return Err(SurfaceError::PortNotFound(handle.port));
        }
        Ok((context, handle.port))
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection validation, editing and the connect gesture.

use super::Surface;
use crate::connecting::ConnectingState;
use crate::context::{ContextId, SurfaceContext};
use crate::error::{Result, SurfaceError};
use crate::node::NodeId;
use crate::port::{Port, PortRef};
use crate::undo::{PortChange, UndoAction};

impl Surface {
    /// Whether two ports may be connected.
    ///
    /// Rejects missing ports, the same port or node, and same-direction
    /// pairs; then checks the input side's type and hint, then the output
    /// side's.
    pub fn can_connect_with(&self, context: ContextId, a: PortRef, b: PortRef) -> bool {
        let Some(ctx) = self.contexts.get(&context) else {
            return false;
        };
        let (Some(port_a), Some(port_b)) = (ctx.port(a), ctx.port(b)) else {
            return false;
        };
        if a == b || a.node == b.node || port_a.direction == port_b.direction {
            return false;
        }
        let (input, output) = if port_a.is_input() {
            (port_a, port_b)
        } else {
            (port_b, port_a)
        };
        self.accepts(input, output) || self.accepts(output, input)
    }

    fn accepts(&self, port: &Port, other: &Port) -> bool {
        self.cast
            .full_cast_check(&port.current_type, &other.current_type, port.hint)
    }

    /// Connect two ports.
    ///
    /// Single-connection ports drop their current link first (target, then
    /// instigator). Connecting an already linked pair changes nothing.
    pub fn connect(&mut self, context: ContextId, instigator: PortRef, target: PortRef) -> Result<()> {
        let ctx = self.ctx(context)?;
        let from = ctx.port(instigator).ok_or(SurfaceError::PortNotFound(instigator))?;
        let to = ctx.port(target).ok_or(SurfaceError::PortNotFound(target))?;
        if from.is_connected_with(target) && to.is_connected_with(instigator) {
            return Ok(());
        }
        let mut affected = vec![target, instigator];
        for port in [to, from] {
            if !port.multi {
                affected.extend(port.connections().iter().copied());
            }
        }
        self.edit_connections(context, &affected, |ctx| ctx.link(target, instigator))
    }

    /// Connect when the ports are compatible; returns whether a link was made
    pub fn try_connect(&mut self, context: ContextId, a: PortRef, b: PortRef) -> Result<bool> {
        if !self.can_connect_with(context, a, b) {
            return Ok(false);
        }
        self.connect(context, a, b)?;
        Ok(true)
    }

    /// Remove the link between two ports; returns whether it existed
    pub fn disconnect(&mut self, context: ContextId, a: PortRef, b: PortRef) -> Result<bool> {
        let ctx = self.ctx(context)?;
        let port_a = ctx.port(a).ok_or(SurfaceError::PortNotFound(a))?;
        if ctx.port(b).is_none() {
            return Err(SurfaceError::PortNotFound(b));
        }
        if !port_a.is_connected_with(b) {
            return Ok(false);
        }
        self.edit_connections(context, &[a, b], |ctx| {
            ctx.unlink(a, b);
            Ok(vec![a.node, b.node])
        })?;
        Ok(true)
    }

    /// Remove every link of a port
    pub fn break_port_connections(&mut self, context: ContextId, port: PortRef) -> Result<()> {
        let peers = self
            .ctx(context)?
            .port(port)
            .ok_or(SurfaceError::PortNotFound(port))?
            .connections()
            .to_vec();
        if peers.is_empty() {
            return Ok(());
        }
        let mut affected = vec![port];
        affected.extend(peers.iter().copied());
        self.edit_connections(context, &affected, |ctx| {
            let mut nodes = vec![port.node];
            for peer in ctx.clear_port(port) {
                if !nodes.contains(&peer.node) {
                    nodes.push(peer.node);
                }
            }
            Ok(nodes)
        })
    }

    /// Apply a connection edit, then notify, record and mark modified
    fn edit_connections(
        &mut self,
        context: ContextId,
        affected: &[PortRef],
        edit: impl FnOnce(&mut SurfaceContext) -> Result<Vec<NodeId>>,
    ) -> Result<()> {
        let handle = self.context_handle(context)?;
        let ctx = self.ctx_mut(context)?;
        let before: Vec<(PortRef, Vec<PortRef>)> = affected
            .iter()
            .map(|port| (*port, ctx.connections_of(*port)))
            .collect();
        let touched = edit(ctx)?;
        let changes: Vec<PortChange> = before
            .into_iter()
            .filter_map(|(port, before)| {
                let after = ctx.connections_of(port);
                (before != after).then_some(PortChange {
                    port,
                    before,
                    after,
                })
            })
            .collect();

        for node in touched {
            self.on_connections_changed(context, node);
        }
        self.record(UndoAction::ConnectPorts {
            context: handle,
            changes,
        });
        self.mark_as_modified(context, true);
        Ok(())
    }

    /// Begin a connect gesture from `instigator`
    pub fn connecting_start(&mut self, context: ContextId, instigator: PortRef) {
        if self.connecting.instigator() == Some((context, instigator)) {
            return;
        }
        let exists = self
            .contexts
            .get(&context)
            .is_some_and(|ctx| ctx.port(instigator).is_some());
        if !exists {
            tracing::warn!("Cannot start connecting from missing port {:?}", instigator);
            return;
        }
        self.connecting = ConnectingState::Connecting {
            context,
            instigator,
        };
    }

    /// Track the hovered candidate of the gesture
    pub fn connecting_over(&mut self, candidate: Option<PortRef>) {
        let Some((context, instigator)) = self.connecting.instigator() else {
            return;
        };
        self.connecting = match candidate {
            Some(candidate) => ConnectingState::Hover {
                context,
                instigator,
                candidate,
            },
            None => ConnectingState::Connecting {
                context,
                instigator,
            },
        };
    }

    /// Finish the gesture on `target`; returns whether a link was made.
    ///
    /// The gesture always ends, whatever the outcome.
    pub fn connecting_end(&mut self, target: Option<PortRef>) -> Result<bool> {
        let state = std::mem::take(&mut self.connecting);
        let Some((context, instigator)) = state.instigator() else {
            return Ok(false);
        };
        let Some(target) = target.filter(|t| *t != instigator) else {
            return Ok(false);
        };
        if !self.can_connect_with(context, instigator, target) {
            tracing::debug!("Rejected connection {:?} -> {:?}", instigator, target);
            return Ok(false);
        }
        self.connect(context, instigator, target)?;
        Ok(true)
    }

    /// Abort the gesture
    pub fn connecting_cancel(&mut self) {
        self.connecting = ConnectingState::Idle;
    }
}

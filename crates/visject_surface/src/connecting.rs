// SPDX-License-Identifier: MIT OR Apache-2.0
//! State of an in-progress connect gesture.

use crate::context::ContextId;
use crate::port::PortRef;

/// Wire-dragging state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectingState {
    /// No gesture in progress
    #[default]
    Idle,
    /// A port started the gesture
    Connecting {
        /// Context of the instigator
        context: ContextId,
        /// Port that started the gesture
        instigator: PortRef,
    },
    /// The gesture hovers a candidate port
    Hover {
        /// Context of the instigator
        context: ContextId,
        /// Port that started the gesture
        instigator: PortRef,
        /// Hovered port
        candidate: PortRef,
    },
}

impl ConnectingState {
    /// Whether a gesture is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Context and instigator of the active gesture
    pub fn instigator(&self) -> Option<(ContextId, PortRef)> {
        match *self {
            Self::Idle => None,
            Self::Connecting {
                context,
                instigator,
            }
            | Self::Hover {
                context,
                instigator,
                ..
            } => Some((context, instigator)),
        }
    }

    /// Hovered candidate
    pub fn candidate(&self) -> Option<PortRef> {
        match *self {
            Self::Hover { candidate, .. } => Some(candidate),
            _ => None,
        }
    }
}

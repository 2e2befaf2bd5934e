// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-graph-kind policy.

use crate::archetype::{GroupArchetype, NodeArchetype, NodeFlags};
use serde::{Deserialize, Serialize};

/// Rules a surface specialization supplies to the core
pub trait SurfacePolicy: Send + Sync {
    /// Whether an archetype may be spawned in this surface
    fn can_use_node_type(&self, group: &GroupArchetype, archetype: &NodeArchetype) -> bool;

    /// Whether object references implicitly cast to booleans
    fn supports_implicit_cast_from_object_to_boolean(&self) -> bool {
        true
    }
}

/// Built-in graph kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    /// Material graph
    Material,
    /// Particle emitter graph
    ParticleEmitter,
    /// Animation graph
    Animation,
    /// Visual script
    VisualScript,
    /// Behavior tree
    BehaviorTree,
}

impl GraphKind {
    /// Usability flag archetypes must carry for this kind
    pub fn flag(self) -> NodeFlags {
        match self {
            Self::Material => NodeFlags::MATERIAL_GRAPH,
            Self::ParticleEmitter => NodeFlags::PARTICLE_EMITTER_GRAPH,
            Self::Animation => NodeFlags::ANIM_GRAPH,
            Self::VisualScript => NodeFlags::VISUAL_SCRIPT_GRAPH,
            Self::BehaviorTree => NodeFlags::BEHAVIOR_TREE_GRAPH,
        }
    }
}

impl SurfacePolicy for GraphKind {
    fn can_use_node_type(&self, _group: &GroupArchetype, archetype: &NodeArchetype) -> bool {
        archetype.is_usable_in(self.flag())
    }

    fn supports_implicit_cast_from_object_to_boolean(&self) -> bool {
        // Data graphs have no notion of object validity
        !matches!(self, Self::Material | Self::ParticleEmitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_kind_filters_by_flag() {
        let group = GroupArchetype::new(3, "Math");
        let anim_only = NodeArchetype::new(1, "Pose").with_flags(NodeFlags::ANIM_GRAPH);
        assert!(GraphKind::Animation.can_use_node_type(&group, &anim_only));
        assert!(!GraphKind::Material.can_use_node_type(&group, &anim_only));

        let everywhere = NodeArchetype::new(2, "Add");
        assert!(GraphKind::BehaviorTree.can_use_node_type(&group, &everywhere));
    }

    #[test]
    fn test_object_to_bool_disabled_for_materials() {
        assert!(!GraphKind::Material.supports_implicit_cast_from_object_to_boolean());
        assert!(GraphKind::VisualScript.supports_implicit_cast_from_object_to_boolean());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation graph nodes.
//!
//! State machines and their states own nested graphs stored in a byte
//! value; opening them pushes a node-owned context.

use crate::archetype::{EditorKind, GroupArchetype, NodeArchetype, NodeFlags, NodeKind, PortArchetype};
use crate::types::ScriptType;
use crate::value::Value;

/// Final pose output
pub const OUTPUT: u16 = 1;
/// Blend between two poses
pub const BLEND: u16 = 9;
/// State machine container
pub const STATE_MACHINE: u16 = 18;
/// State inside a state machine
pub const STATE: u16 = 20;

/// Pose type flowing through animation ports
pub fn pose_type() -> ScriptType {
    ScriptType::Structure("AnimationPose".to_string())
}

fn nested(type_id: u16, title: &str, description: &str) -> NodeArchetype {
    NodeArchetype::new(type_id, title)
        .with_description(description)
        .with_size(270.0, 120.0)
        .with_flags(NodeFlags::ANIM_GRAPH)
        .with_values(vec![Value::string(title), Value::Bytes(Vec::new())])
        .with_editor(EditorKind::Text, 0)
        .with_kind(NodeKind::StateMachine {
            name_value: 0,
            data_value: 1,
        })
}

/// Animations group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::ANIMATIONS, "Animations")
        .with_color([179, 109, 55])
        .with_archetype(
            NodeArchetype::new(OUTPUT, "Animation Output")
                .with_description("Main animation graph output")
                .with_flags(
                    NodeFlags::ANIM_GRAPH
                        | NodeFlags::NO_REMOVE
                        | NodeFlags::NO_SPAWN_VIA_GUI
                        | NodeFlags::NO_SPAWN_VIA_PASTE,
                )
                .with_input(PortArchetype::new(0, "Pose", pose_type())),
        )
        .with_archetype(
            NodeArchetype::new(BLEND, "Blend")
                .with_description("Blend between two poses")
                .with_flags(NodeFlags::ANIM_GRAPH)
                .with_values(vec![Value::Float(0.5)])
                .with_input(PortArchetype::new(0, "Pose A", pose_type()))
                .with_input(PortArchetype::new(1, "Pose B", pose_type()))
                .with_input(PortArchetype::new(2, "Alpha", ScriptType::Float).with_value(0))
                .with_output(PortArchetype::new(3, "Pose", pose_type())),
        )
        .with_archetype(
            nested(STATE_MACHINE, "State Machine", "Animation states machine")
                .with_output(PortArchetype::new(0, "Pose", pose_type())),
        )
        .with_archetype(nested(STATE, "State", "Animation state"))
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant value nodes.
//!
//! Every constant except the enum template can be converted into a surface
//! parameter holding the same value.

use crate::archetype::{EditorKind, GroupArchetype, NodeArchetype, NodeFlags, NodeKind, PortArchetype};
use crate::types::ScriptType;
use crate::value::Value;

/// Boolean constant
pub const BOOL: u16 = 1;
/// Integer constant
pub const INTEGER: u16 = 2;
/// Float constant
pub const FLOAT: u16 = 3;
/// 2D vector constant
pub const FLOAT2: u16 = 4;
/// 3D vector constant
pub const FLOAT3: u16 = 5;
/// 4D vector constant
pub const FLOAT4: u16 = 6;
/// Color constant
pub const COLOR: u16 = 7;
/// Text constant
pub const STRING: u16 = 8;
/// Enum constant template, specialized per enum type
pub const ENUM: u16 = 9;

fn constant(type_id: u16, title: &str, value: Value, editor: EditorKind) -> NodeArchetype {
    let ty = value.script_type();
    NodeArchetype::new(type_id, title)
        .with_description(format!("Constant {} value", title.to_lowercase()))
        .with_size(110.0, 40.0)
        .with_values(vec![value])
        .with_output(PortArchetype::new(0, "Value", ty.clone()))
        .with_editor(editor, 0)
        .with_kind(NodeKind::ConvertibleToParameter {
            value_index: 0,
            parameter_type: ty,
        })
}

/// Constants group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::CONSTANTS, "Constants")
        .with_color([94, 130, 74])
        .with_archetype(constant(BOOL, "Bool", Value::Bool(false), EditorKind::Bool))
        .with_archetype(constant(INTEGER, "Integer", Value::Int(0), EditorKind::Integer))
        .with_archetype(constant(FLOAT, "Float", Value::Float(0.0), EditorKind::Float))
        .with_archetype(constant(FLOAT2, "Float2", Value::Float2([0.0; 2]), EditorKind::Vector))
        .with_archetype(constant(FLOAT3, "Float3", Value::Float3([0.0; 3]), EditorKind::Vector))
        .with_archetype(constant(FLOAT4, "Float4", Value::Float4([0.0; 4]), EditorKind::Vector))
        .with_archetype(constant(COLOR, "Color", Value::Color([1.0; 4]), EditorKind::Color))
        .with_archetype(
            constant(STRING, "String", Value::string(""), EditorKind::Text)
                .with_flags(NodeFlags::VISUAL_SCRIPT_GRAPH | NodeFlags::BEHAVIOR_TREE_GRAPH),
        )
        .with_archetype(
            NodeArchetype::new(ENUM, "Enum")
                .with_description("Constant enum entry")
                .with_flags(NodeFlags::ALL_GRAPHS | NodeFlags::NO_SPAWN_VIA_GUI)
                .with_values(vec![Value::enumeration("", 0)])
                .with_output(PortArchetype::new(0, "Value", ScriptType::enumeration("")))
                .with_editor(EditorKind::Enum, 0),
        )
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boolean logic nodes.

use crate::archetype::{GroupArchetype, NodeArchetype, PortArchetype};
use crate::types::ScriptType;
use crate::value::Value;

/// !A
pub const NOT: u16 = 1;
/// A && B
pub const AND: u16 = 2;
/// A || B
pub const OR: u16 = 3;
/// A ^ B
pub const XOR: u16 = 4;

fn binary(type_id: u16, title: &str) -> NodeArchetype {
    NodeArchetype::new(type_id, title)
        .with_description(format!("Result is A {} B", title.to_lowercase()))
        .with_size(100.0, 40.0)
        .with_values(vec![Value::Bool(false), Value::Bool(false)])
        .with_input(PortArchetype::new(0, "A", ScriptType::Bool).with_value(0))
        .with_input(PortArchetype::new(1, "B", ScriptType::Bool).with_value(1))
        .with_output(PortArchetype::new(2, "Result", ScriptType::Bool))
}

/// Boolean group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::BOOLEAN, "Boolean")
        .with_color([140, 84, 150])
        .with_archetype(
            NodeArchetype::new(NOT, "NOT")
                .with_description("Result is !A")
                .with_size(100.0, 20.0)
                .with_values(vec![Value::Bool(false)])
                .with_input(PortArchetype::new(0, "A", ScriptType::Bool).with_value(0))
                .with_output(PortArchetype::new(1, "Result", ScriptType::Bool)),
        )
        .with_archetype(binary(AND, "AND"))
        .with_archetype(binary(OR, "OR"))
        .with_archetype(binary(XOR, "XOR"))
}


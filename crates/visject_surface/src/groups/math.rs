// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arithmetic nodes.
//!
//! Operands are untyped numeric ports; the result takes the type of the
//! first connected operand.

use crate::archetype::{GroupArchetype, NodeArchetype, PortArchetype};
use crate::cast::ConnectionsHint;
use crate::types::ScriptType;
use crate::value::Value;

/// A + B
pub const ADD: u16 = 1;
/// A - B
pub const SUBTRACT: u16 = 2;
/// A * B
pub const MULTIPLY: u16 = 3;
/// A % B
pub const MODULO: u16 = 4;
/// A / B
pub const DIVIDE: u16 = 5;
/// |A|
pub const ABS: u16 = 7;
/// ceil(A)
pub const CEIL: u16 = 8;
/// floor(A)
pub const FLOOR: u16 = 10;
/// -A
pub const NEGATE: u16 = 14;

fn binary(type_id: u16, title: &str, description: &str, default_b: f32) -> NodeArchetype {
    NodeArchetype::new(type_id, title)
        .with_description(description)
        .with_size(110.0, 40.0)
        .with_values(vec![Value::Float(0.0), Value::Float(default_b)])
        .with_input(
            PortArchetype::new(0, "A", ScriptType::Null)
                .with_hint(ConnectionsHint::NUMERIC)
                .with_value(0),
        )
        .with_input(
            PortArchetype::new(1, "B", ScriptType::Null)
                .with_hint(ConnectionsHint::NUMERIC)
                .with_value(1),
        )
        .with_output(PortArchetype::new(2, "Result", ScriptType::Null))
        .with_type_dependency(&[0, 1], &[2])
}

fn unary(type_id: u16, title: &str, description: &str) -> NodeArchetype {
    NodeArchetype::new(type_id, title)
        .with_description(description)
        .with_size(110.0, 20.0)
        .with_input(PortArchetype::new(0, "Input", ScriptType::Null).with_hint(ConnectionsHint::NUMERIC))
        .with_output(PortArchetype::new(1, "Output", ScriptType::Null))
        .with_type_dependency(&[0], &[1])
}

/// Math group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::MATH, "Math")
        .with_color([81, 120, 168])
        .with_archetype(binary(ADD, "Add", "Result is A + B", 0.0))
        .with_archetype(binary(SUBTRACT, "Subtract", "Result is A - B", 0.0))
        .with_archetype(binary(MULTIPLY, "Multiply", "Result is A * B", 1.0))
        .with_archetype(binary(MODULO, "Modulo", "Result is remainder A from A / B", 1.0))
        .with_archetype(binary(DIVIDE, "Divide", "Result is A / B", 1.0))
        .with_archetype(unary(ABS, "Abs", "Result is absolute value of A"))
        .with_archetype(unary(CEIL, "Ceil", "Returns the smallest integer value greater than or equal to A"))
        .with_archetype(unary(FLOOR, "Floor", "Returns the largest integer value less than or equal to A"))
        .with_archetype(unary(NEGATE, "Negate", "Result is -A"))
}

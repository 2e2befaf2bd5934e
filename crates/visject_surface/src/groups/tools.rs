// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing tools: comments and reroute points.

use crate::archetype::{EditorKind, GroupArchetype, NodeArchetype, NodeKind, PortArchetype};
use crate::cast::ConnectionsHint;
use crate::types::ScriptType;
use crate::value::Value;

/// Comment frame
pub const COMMENT: u16 = 11;
/// Reroute point
pub const REROUTE: u16 = 29;

/// Tools group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::TOOLS, "Tools")
        .with_color([110, 110, 110])
        .with_archetype(
            NodeArchetype::new(COMMENT, "Comment")
                .with_description("Comment")
                .with_size(400.0, 300.0)
                .with_values(vec![
                    Value::string("Comment"),
                    Value::Color([1.0, 1.0, 1.0, 0.2]),
                    Value::Float2([400.0, 300.0]),
                ])
                .with_editor(EditorKind::Text, 0)
                .with_editor(EditorKind::Color, 1)
                .with_kind(NodeKind::Comment {
                    title_value: 0,
                    color_value: 1,
                    size_value: 2,
                }),
        )
        .with_archetype(
            NodeArchetype::new(REROUTE, "Reroute")
                .with_description("Reroute a connection")
                .with_size(16.0, 16.0)
                .with_input(
                    PortArchetype::new(0, "", ScriptType::Null).with_hint(ConnectionsHint::ANYTHING),
                )
                .with_output(PortArchetype::new(1, "", ScriptType::Null))
                .with_type_dependency(&[0], &[1]),
        )
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface parameter access nodes.

use crate::archetype::{GroupArchetype, NodeArchetype, NodeFlags, NodeKind, PortArchetype};
use crate::cast::ConnectionsHint;
use crate::types::ScriptType;
use crate::value::Value;
use uuid::Uuid;

/// Reads a parameter
pub const GET: u16 = 1;

/// Parameters group
pub fn group() -> GroupArchetype {
    GroupArchetype::new(super::PARAMETERS, "Parameters")
        .with_color([52, 140, 152])
        .with_archetype(
            NodeArchetype::new(GET, "Get Parameter")
                .with_description("Parameter value getter")
                .with_size(140.0, 40.0)
                .with_flags(NodeFlags::ALL_GRAPHS | NodeFlags::NO_SPAWN_VIA_GUI)
                .with_values(vec![Value::Guid(Uuid::nil())])
                .with_output(
                    PortArchetype::new(0, "Value", ScriptType::Null)
                        .with_hint(ConnectionsHint::ANYTHING),
                )
                .with_kind(NodeKind::ParameterGetter { id_value: 0 }),
        )
}

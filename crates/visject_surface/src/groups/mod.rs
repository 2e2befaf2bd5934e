// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node groups shared by every surface kind.
//!
//! Group IDs follow the engine's numbering so persisted graphs resolve to
//! the same archetypes.

use crate::archetype::GroupArchetype;

pub mod animation;
pub mod boolean;
pub mod constants;
pub mod math;
pub mod parameters;
pub mod tools;

/// Constant values
pub const CONSTANTS: u16 = 2;
/// Arithmetic
pub const MATH: u16 = 3;
/// Parameter access
pub const PARAMETERS: u16 = 6;
/// Comments, reroutes
pub const TOOLS: u16 = 7;
/// Animation graph nodes
pub const ANIMATIONS: u16 = 9;
/// Boolean logic
pub const BOOLEAN: u16 = 10;

/// All built-in groups
pub fn builtin_groups() -> Vec<GroupArchetype> {
    vec![
        constants::group(),
        math::group(),
        parameters::group(),
        tools::group(),
        animation::group(),
        boolean::group(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_groups_validate() {
        let groups = builtin_groups();
        for group in &groups {
            group.validate().unwrap();
        }
        let mut ids: Vec<u16> = groups.iter().map(|g| g.group_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), groups.len());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type compatibility rules used to validate connections.
//!
//! Ports pull values, so the full check looks at the target-to-source
//! direction first. Every check is a pure predicate; the order only decides
//! which rule reports success.

use crate::types::{ScriptType, TypeRegistry};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

bitflags! {
    /// Wildcard type categories accepted by an untyped port
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ConnectionsHint: u32 {
        /// Scalar numbers and booleans
        const SCALAR = 1 << 0;
        /// Vectors, colors and quaternions
        const VECTOR = 1 << 1;
        /// Any enum
        const ENUM = 1 << 2;
        /// Any type at all
        const ANYTHING = 1 << 3;
        /// Any type except the impulse type
        const VALUE = 1 << 4;
        /// Any array
        const ARRAY = 1 << 5;
        /// Any dictionary
        const DICTIONARY = 1 << 6;
        /// Scalars and vectors
        const NUMERIC = Self::SCALAR.bits() | Self::VECTOR.bits();
    }
}

impl ConnectionsHint {
    /// Whether a concrete type falls in one of the hinted categories
    pub fn matches(self, ty: &ScriptType) -> bool {
        if self.contains(Self::ANYTHING) {
            return true;
        }
        (self.contains(Self::VALUE) && !ty.is_void())
            || (self.contains(Self::ENUM) && ty.is_enum())
            || (self.contains(Self::ARRAY) && ty.is_array())
            || (self.contains(Self::DICTIONARY) && ty.is_dictionary())
            || (self.contains(Self::VECTOR) && ty.is_vector())
            || (self.contains(Self::SCALAR) && ty.is_scalar())
    }
}

/// Cast rules of one surface
#[derive(Debug, Clone)]
pub struct CastRules {
    types: Arc<TypeRegistry>,
    supports_object_to_bool: bool,
}

impl CastRules {
    /// Create cast rules over a type table
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            supports_object_to_bool: true,
        }
    }

    /// Enable or disable the implicit object reference to boolean cast
    pub fn with_object_to_bool(mut self, enabled: bool) -> Self {
        self.supports_object_to_bool = enabled;
        self
    }

    /// Type table used for assignability and enum lookups
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Whether object references implicitly cast to booleans
    pub fn supports_object_to_bool(&self) -> bool {
        self.supports_object_to_bool
    }

    /// Whether a value of type `from` can be used directly where `to` is expected
    pub fn can_direct_cast(&self, from: &ScriptType, to: &ScriptType) -> bool {
        if from == to || self.types.is_assignable_from(to, from) {
            return true;
        }

        // Same named type where one side is a reference
        if matches!(
            from,
            ScriptType::Object(_) | ScriptType::Structure(_) | ScriptType::Enum(_)
        ) && from.strip_reference() == to.strip_reference()
        {
            return true;
        }

        // Validity test idiom
        if self.supports_object_to_bool && *to == ScriptType::Bool && from.is_object() {
            return true;
        }

        // Implicit numeric casts, narrowing included
        from.is_numeric() && to.is_numeric()
    }

    /// Whether the untyped `from` accepts `to` through its hint
    pub fn is_hint_compatible(
        &self,
        from: &ScriptType,
        to: &ScriptType,
        hint: ConnectionsHint,
    ) -> bool {
        from.is_null() && hint.matches(to)
    }

    /// Full compatibility check used by connection validation
    pub fn full_cast_check(
        &self,
        from: &ScriptType,
        to: &ScriptType,
        hint: ConnectionsHint,
    ) -> bool {
        self.can_direct_cast(to, from)
            || self.is_hint_compatible(from, to, hint)
            || self.types.is_assignable_from(to, from)
    }
}

impl Default for CastRules {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::new()))
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface parameters: named, typed graph inputs owned by the root context.

use crate::types::ScriptType;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-visible graph input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParameter {
    /// Stable identifier referenced by get/set parameter nodes
    pub id: Uuid,
    /// Display name, unique within the surface
    pub name: String,
    /// Parameter type
    pub ty: ScriptType,
    /// Current value
    pub value: Value,
    /// Whether the parameter is exposed outside the asset
    pub is_public: bool,
    /// Free-form editor metadata
    pub meta: IndexMap<String, String>,
}

impl SurfaceParameter {
    /// Create a public parameter with a fresh ID
    pub fn new(name: impl Into<String>, ty: ScriptType, value: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            ty,
            value,
            is_public: true,
            meta: IndexMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// First name of the form `base`, `base 1`, `base 2`, ... not used by `existing`
pub fn unique_parameter_name(existing: &[SurfaceParameter], base: &str) -> String {
    let taken = |name: &str| existing.iter().any(|p| p.name == name);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base} {i}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}

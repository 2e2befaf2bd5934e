// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value types that flow through ports and the type table used to relate them.
//!
//! The engine's reflection layer is external to this crate. It is represented
//! here by [`TypeRegistry`], a plain table of class bases and enum entries
//! that the cast rules query for nominal assignability and enum names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root class every engine object reference derives from
pub const OBJECT_CLASS: &str = "Object";

/// Suffix marking a by-reference decoration of a named type
const REFERENCE_SUFFIX: char = '&';

/// Data type carried by a port or a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    /// Untyped wildcard (matched through connection hints)
    #[default]
    Null,
    /// Impulse / execution flow
    Void,
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int,
    /// 32-bit unsigned integer
    UInt,
    /// 64-bit signed integer
    Int64,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// 2D float vector
    Float2,
    /// 3D float vector
    Float3,
    /// 4D float vector
    Float4,
    /// 2D double vector
    Double2,
    /// 3D double vector
    Double3,
    /// 4D double vector
    Double4,
    /// 2D integer vector
    Int2,
    /// 3D integer vector
    Int3,
    /// 4D integer vector
    Int4,
    /// Linear RGBA color
    Color,
    /// Rotation quaternion
    Quaternion,
    /// Rectangle (x, y, width, height)
    Rect,
    /// 4x4 matrix
    Matrix,
    /// Globally unique identifier
    Guid,
    /// Text
    String,
    /// Raw byte blob
    Bytes,
    /// Named enum type
    Enum(String),
    /// Array of an element type
    Array(Box<ScriptType>),
    /// Dictionary from key type to value type
    Dictionary(Box<ScriptType>, Box<ScriptType>),
    /// Reference to an engine object of the named class
    Object(String),
    /// Named value structure
    Structure(String),
}

impl ScriptType {
    /// Engine object reference of the given class
    pub fn object(class: impl Into<String>) -> Self {
        Self::Object(class.into())
    }

    /// Named enum type
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Array of `element`
    pub fn array(element: ScriptType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Dictionary from `key` to `value`
    pub fn dictionary(key: ScriptType, value: ScriptType) -> Self {
        Self::Dictionary(Box::new(key), Box::new(value))
    }

    /// Whether this is the untyped wildcard
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is the impulse type
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Whether this is an enum
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// Whether this is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Whether this is a dictionary
    pub fn is_dictionary(&self) -> bool {
        matches!(self, Self::Dictionary(..))
    }

    /// Whether this is an engine object reference
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Scalar numeric types (booleans included)
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Int
                | Self::UInt
                | Self::Int64
                | Self::UInt64
                | Self::Float
                | Self::Double
        )
    }

    /// Multi-component numeric types
    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            Self::Float2
                | Self::Float3
                | Self::Float4
                | Self::Double2
                | Self::Double3
                | Self::Double4
                | Self::Int2
                | Self::Int3
                | Self::Int4
                | Self::Color
                | Self::Quaternion
        )
    }

    /// Types on the implicit numeric cast allow-list
    pub fn is_numeric(&self) -> bool {
        self.is_scalar() || self.is_vector()
    }

    /// Display name of the type
    pub fn type_name(&self) -> String {
        match self {
            Self::Enum(name) | Self::Object(name) | Self::Structure(name) => name.clone(),
            Self::Array(element) => format!("{}[]", element.type_name()),
            Self::Dictionary(key, value) => {
                format!("Dictionary<{},{}>", key.type_name(), value.type_name())
            }
            other => format!("{other:?}"),
        }
    }

    /// The same type with any by-reference decoration removed
    pub fn strip_reference(&self) -> ScriptType {
        let strip = |name: &str| name.trim_end_matches(REFERENCE_SUFFIX).to_string();
        match self {
            Self::Enum(name) => Self::Enum(strip(name)),
            Self::Object(name) => Self::Object(strip(name)),
            Self::Structure(name) => Self::Structure(strip(name)),
            other => other.clone(),
        }
    }
}

/// Class hierarchy and enum table supplied by the reflection layer
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    /// Class name to base class name (`None` means it derives from the root)
    classes: HashMap<String, Option<String>>,
    /// Enum name to its (entry name, value) pairs
    enums: HashMap<String, Vec<(String, i64)>>,
}

impl TypeRegistry {
    /// Create an empty type table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class with an optional base class
    pub fn with_class(mut self, name: &str, base: Option<&str>) -> Self {
        self.register_class(name, base);
        self
    }

    /// Register an enum with its entries
    pub fn with_enum(mut self, name: &str, entries: &[(&str, i64)]) -> Self {
        self.register_enum(name, entries);
        self
    }

    /// Register a class with an optional base class
    pub fn register_class(&mut self, name: &str, base: Option<&str>) {
        self.classes
            .insert(name.to_string(), base.map(str::to_string));
    }

    /// Register an enum with its entries
    pub fn register_enum(&mut self, name: &str, entries: &[(&str, i64)]) {
        self.enums.insert(
            name.to_string(),
            entries
                .iter()
                .map(|(entry, value)| ((*entry).to_string(), *value))
                .collect(),
        );
    }

    /// Value of the named entry of an enum
    pub fn enum_value(&self, enum_name: &str, entry: &str) -> Option<i64> {
        self.enums
            .get(enum_name)?
            .iter()
            .find(|(name, _)| name == entry)
            .map(|(_, value)| *value)
    }

    /// Name of the entry holding `value`
    pub fn enum_entry_name(&self, enum_name: &str, value: i64) -> Option<&str> {
        self.enums
            .get(enum_name)?
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    /// Whether `class` is `base` or derives from it
    pub fn is_subclass_of(&self, class: &str, base: &str) -> bool {
        if class == base || base == OBJECT_CLASS {
            return true;
        }
        let mut current = class;
        // Bounded walk so a malformed table with a cycle cannot hang
        for _ in 0..=self.classes.len() {
            match self.classes.get(current) {
                Some(Some(parent)) if parent == base => return true,
                Some(Some(parent)) => current = parent,
                _ => return false,
            }
        }
        false
    }

    /// Whether a value of type `from` can be stored in a slot of type `to`
    pub fn is_assignable_from(&self, to: &ScriptType, from: &ScriptType) -> bool {
        if to == from {
            return true;
        }
        match (to, from) {
            (ScriptType::Object(to), ScriptType::Object(from)) => self.is_subclass_of(from, to),
            (ScriptType::Array(to), ScriptType::Array(from)) if to.is_object() => {
                self.is_assignable_from(to, from)
            }
            _ => false,
        }
    }
}

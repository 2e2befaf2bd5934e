// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node values.

use crate::types::ScriptType;
use serde::{Deserialize, Serialize};
use std::mem::discriminant;
use uuid::Uuid;

/// Maximum number of values a node can carry (native engine limit)
pub const MAX_VALUES: usize = 32;

/// Value stored in a node's value array or a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    UInt(u32),
    /// 64-bit signed integer
    Int64(i64),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// 2D vector
    Float2([f32; 2]),
    /// 3D vector
    Float3([f32; 3]),
    /// 4D vector
    Float4([f32; 4]),
    /// Color (RGBA)
    Color([f32; 4]),
    /// Quaternion (XYZW)
    Quaternion([f32; 4]),
    /// Rectangle (x, y, width, height)
    Rect([f32; 4]),
    /// Identifier
    Guid(Uuid),
    /// Text
    String(String),
    /// 4x4 matrix, row major
    Matrix([f32; 16]),
    /// Byte blob (nested graph data, custom payloads)
    Bytes(Vec<u8>),
    /// Enum entry tagged with its enum type
    Enum {
        /// Enum type name
        type_name: String,
        /// Entry value
        value: i64,
    },
}

impl Value {
    /// Create a text value
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// Create an enum value
    pub fn enumeration(type_name: impl Into<String>, value: i64) -> Self {
        Self::Enum {
            type_name: type_name.into(),
            value,
        }
    }

    /// Get the script type for this value
    pub fn script_type(&self) -> ScriptType {
        match self {
            Self::Bool(_) => ScriptType::Bool,
            Self::Int(_) => ScriptType::Int,
            Self::UInt(_) => ScriptType::UInt,
            Self::Int64(_) => ScriptType::Int64,
            Self::Float(_) => ScriptType::Float,
            Self::Double(_) => ScriptType::Double,
            Self::Float2(_) => ScriptType::Float2,
            Self::Float3(_) => ScriptType::Float3,
            Self::Float4(_) => ScriptType::Float4,
            Self::Color(_) => ScriptType::Color,
            Self::Quaternion(_) => ScriptType::Quaternion,
            Self::Rect(_) => ScriptType::Rect,
            Self::Guid(_) => ScriptType::Guid,
            Self::String(_) => ScriptType::String,
            Self::Matrix(_) => ScriptType::Matrix,
            Self::Bytes(_) => ScriptType::Bytes,
            Self::Enum { type_name, .. } => ScriptType::Enum(type_name.clone()),
        }
    }

    /// Whether both values have the same representation
    pub fn same_kind(&self, other: &Value) -> bool {
        discriminant(self) == discriminant(other)
    }

    /// Scalar view of numeric values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Int(v) => Some(f64::from(*v)),
            Self::UInt(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Enum { value, .. } => Some(*value as f64),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Identifier view
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(id) => Some(*id),
            _ => None,
        }
    }

    /// Byte blob view
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// 2D vector view
    pub fn as_float2(&self) -> Option<[f32; 2]> {
        match self {
            Self::Float2(v) => Some(*v),
            _ => None,
        }
    }

    /// Component breakdown of vector-like values
    pub fn components(&self) -> Option<Vec<f32>> {
        match self {
            Self::Float2(v) => Some(v.to_vec()),
            Self::Float3(v) => Some(v.to_vec()),
            Self::Float4(v) | Self::Color(v) | Self::Quaternion(v) | Self::Rect(v) => {
                Some(v.to_vec())
            }
            Self::Matrix(m) => Some(m.to_vec()),
            _ => None,
        }
    }

    /// Rebuild a value shaped like `self` from components.
    ///
    /// Missing components keep the value of `self`, extra ones are dropped.
    pub fn with_components(&self, components: &[f32]) -> Option<Value> {
        fn fill<const N: usize>(mut base: [f32; N], components: &[f32]) -> [f32; N] {
            for (slot, c) in base.iter_mut().zip(components) {
                *slot = *c;
            }
            base
        }
        match self {
            Self::Float2(v) => Some(Self::Float2(fill(*v, components))),
            Self::Float3(v) => Some(Self::Float3(fill(*v, components))),
            Self::Float4(v) => Some(Self::Float4(fill(*v, components))),
            Self::Color(v) => Some(Self::Color(fill(*v, components))),
            Self::Quaternion(v) => Some(Self::Quaternion(fill(*v, components))),
            Self::Rect(v) => Some(Self::Rect(fill(*v, components))),
            Self::Matrix(m) => Some(Self::Matrix(fill(*m, components))),
            _ => None,
        }
    }

    /// Rebuild a numeric value shaped like `self` from a scalar
    pub fn with_scalar(&self, scalar: f64) -> Option<Value> {
        match self {
            Self::Bool(_) => Some(Self::Bool(scalar != 0.0)),
            Self::Int(_) => Some(Self::Int(scalar as i32)),
            Self::UInt(_) => Some(Self::UInt(scalar.max(0.0) as u32)),
            Self::Int64(_) => Some(Self::Int64(scalar as i64)),
            Self::Float(_) => Some(Self::Float(scalar as f32)),
            Self::Double(_) => Some(Self::Double(scalar)),
            Self::Enum { type_name, .. } => Some(Self::Enum {
                type_name: type_name.clone(),
                value: scalar as i64,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_ignores_payload() {
        assert!(Value::Float(1.0).same_kind(&Value::Float(2.0)));
        assert!(!Value::Float(1.0).same_kind(&Value::Double(1.0)));
        assert!(Value::enumeration("A", 1).same_kind(&Value::enumeration("B", 0)));
    }

    #[test]
    fn test_with_components_pads_and_truncates() {
        let color = Value::Color([0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            color.with_components(&[0.5, 0.25, 0.125]),
            Some(Value::Color([0.5, 0.25, 0.125, 1.0]))
        );
        let v2 = Value::Float2([0.0; 2]);
        assert_eq!(
            v2.with_components(&[1.0, 2.0, 3.0]),
            Some(Value::Float2([1.0, 2.0]))
        );
        assert_eq!(Value::Int(0).with_components(&[1.0]), None);
    }

    #[test]
    fn test_with_scalar_widens_and_narrows() {
        assert_eq!(Value::Double(0.0).with_scalar(3.0), Some(Value::Double(3.0)));
        assert_eq!(Value::Int(0).with_scalar(2.9), Some(Value::Int(2)));
        assert_eq!(Value::Bool(false).with_scalar(1.0), Some(Value::Bool(true)));
        assert_eq!(Value::UInt(0).with_scalar(-4.0), Some(Value::UInt(0)));
    }

    #[test]
    fn test_script_type() {
        assert_eq!(Value::Float3([0.0; 3]).script_type(), ScriptType::Float3);
        assert_eq!(
            Value::enumeration("BlendMode", 0).script_type(),
            ScriptType::enumeration("BlendMode")
        );
    }
}

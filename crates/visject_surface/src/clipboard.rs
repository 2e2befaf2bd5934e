// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy/paste text format.
//!
//! A selection is stored as RON text. Values are kept in a loose
//! representation so a paste can convert them into whatever shape the
//! destination archetype expects, including encodings written by older
//! editors (vectors as text, enums as bare numbers).

use crate::node::Node;
use crate::types::{ScriptType, TypeRegistry};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// System clipboard service
pub trait Clipboard {
    /// Current clipboard text
    fn get_text(&self) -> Option<String>;

    /// Replace the clipboard text
    fn set_text(&mut self, text: String);
}

/// Process-local clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }
}

/// Clipboard text errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Text is not a valid selection
    #[error("Invalid clipboard data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Selection could not be written
    #[error("Failed to serialize selection: {0}")]
    Serialize(#[from] ron::Error),

    /// Clipboard holds no text
    #[error("Clipboard is empty")]
    Empty,
}

/// A single value failed to convert on paste
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// No conversion between the two representations
    #[error("Cannot convert {from} to {to:?}")]
    Incompatible {
        /// Source representation
        from: &'static str,
        /// Destination type
        to: ScriptType,
    },

    /// Enum entry name unknown to the destination enum
    #[error("Enum {enum_name} has no entry {entry}")]
    UnknownEnumEntry {
        /// Destination enum
        enum_name: String,
        /// Entry name
        entry: String,
    },

    /// Integer does not fit the destination
    #[error("Integer {0} out of range")]
    OutOfRange(i64),

    /// Legacy text encoding could not be parsed
    #[error("Cannot parse '{text}' as {to:?}")]
    Parse {
        /// Source text
        text: String,
        /// Destination type
        to: ScriptType,
    },
}

/// Loose value representation used in clipboard text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClipboardValue {
    /// Boolean
    Bool(bool),
    /// Any integer width
    Integer(i64),
    /// Any float width
    Real(f64),
    /// Vector-like value broken down into components
    Vector(Vec<f32>),
    /// Identifier
    Guid(Uuid),
    /// Text
    Text(String),
    /// Byte blob
    Bytes(Vec<u8>),
    /// Enum entry with its type and, when known, its entry name
    Enum {
        /// Enum type
        type_name: String,
        /// Entry value
        value: i64,
        /// Entry name
        name: Option<String>,
    },
}

impl ClipboardValue {
    /// Capture a node value
    pub fn from_value(value: &Value, types: &TypeRegistry) -> Self {
        match value {
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Integer(i64::from(*v)),
            Value::UInt(v) => Self::Integer(i64::from(*v)),
            Value::Int64(v) => Self::Integer(*v),
            Value::Float(v) => Self::Real(f64::from(*v)),
            Value::Double(v) => Self::Real(*v),
            Value::Guid(id) => Self::Guid(*id),
            Value::String(text) => Self::Text(text.clone()),
            Value::Bytes(bytes) => Self::Bytes(bytes.clone()),
            Value::Enum { type_name, value } => Self::Enum {
                type_name: type_name.clone(),
                value: *value,
                name: types.enum_entry_name(type_name, *value).map(str::to_string),
            },
            Value::Float2(_)
            | Value::Float3(_)
            | Value::Float4(_)
            | Value::Color(_)
            | Value::Quaternion(_)
            | Value::Rect(_)
            | Value::Matrix(_) => Self::Vector(value.components().unwrap_or_default()),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Vector(_) => "vector",
            Self::Guid(_) => "guid",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Enum { .. } => "enum",
        }
    }

    /// Natural value for a slot with no destination to convert against
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => i32::try_from(*i).map_or(Value::Int64(*i), Value::Int),
            Self::Real(r) => {
                let narrow = *r as f32;
                if f64::from(narrow) == *r {
                    Value::Float(narrow)
                } else {
                    Value::Double(*r)
                }
            }
            Self::Vector(c) => match c.len() {
                0..=2 => Value::Float2(padded(c)),
                3 => Value::Float3(padded(c)),
                4 => Value::Float4(padded(c)),
                _ => Value::Matrix(padded(c)),
            },
            Self::Guid(id) => Value::Guid(*id),
            Self::Text(text) => Value::String(text.clone()),
            Self::Bytes(bytes) => Value::Bytes(bytes.clone()),
            Self::Enum { type_name, value, .. } => Value::enumeration(type_name.clone(), *value),
        }
    }

    /// Convert into the shape of `target` (the destination's current value)
    pub fn convert(&self, target: &Value, types: &TypeRegistry) -> Result<Value, ConversionError> {
        let incompatible = || ConversionError::Incompatible {
            from: self.kind_name(),
            to: target.script_type(),
        };
        match (self, target) {
            (Self::Enum { type_name, value, name }, Value::Enum { type_name: to, .. }) => {
                convert_enum(type_name, *value, name.as_deref(), to, types)
            }
            (Self::Integer(i), Value::Enum { type_name, .. }) => {
                Ok(Value::enumeration(type_name.clone(), *i))
            }
            (Self::Integer(i), Value::Int(_)) => i32::try_from(*i)
                .map(Value::Int)
                .map_err(|_| ConversionError::OutOfRange(*i)),
            (Self::Integer(i), Value::UInt(_)) => u32::try_from(*i)
                .map(Value::UInt)
                .map_err(|_| ConversionError::OutOfRange(*i)),
            (Self::Integer(i), Value::Int64(_)) => Ok(Value::Int64(*i)),
            (Self::Bool(b), _) if is_scalar(target) => {
                target.with_scalar(if *b { 1.0 } else { 0.0 }).ok_or_else(incompatible)
            }
            (Self::Integer(i), _) if is_scalar(target) => {
                target.with_scalar(*i as f64).ok_or_else(incompatible)
            }
            (Self::Real(r), _) if is_scalar(target) => {
                target.with_scalar(*r).ok_or_else(incompatible)
            }
            (Self::Enum { value, .. }, _) if is_scalar(target) => {
                target.with_scalar(*value as f64).ok_or_else(incompatible)
            }
            (Self::Vector(components), _) if is_scalar(target) => components
                .first()
                .and_then(|c| target.with_scalar(f64::from(*c)))
                .ok_or_else(incompatible),
            (Self::Vector(components), _) => {
                target.with_components(components).ok_or_else(incompatible)
            }
            (Self::Integer(_) | Self::Real(_), _) => {
                // Scalar splat into every component
                let scalar = match self {
                    Self::Integer(i) => *i as f32,
                    Self::Real(r) => *r as f32,
                    _ => 0.0,
                };
                let count = target.components().map_or(0, |c| c.len());
                target
                    .with_components(&vec![scalar; count])
                    .ok_or_else(incompatible)
            }
            (Self::Guid(id), Value::Guid(_)) => Ok(Value::Guid(*id)),
            (Self::Text(text), Value::String(_)) => Ok(Value::String(text.clone())),
            (Self::Text(text), _) => parse_legacy_text(text, target, types),
            (Self::Bytes(bytes), Value::Bytes(_)) => Ok(Value::Bytes(bytes.clone())),
            _ => Err(incompatible()),
        }
    }
}

fn padded<const N: usize>(components: &[f32]) -> [f32; N] {
    let mut out = [0.0; N];
    for (slot, component) in out.iter_mut().zip(components) {
        *slot = *component;
    }
    out
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Int64(_)
            | Value::Float(_)
            | Value::Double(_)
    )
}

fn convert_enum(
    from: &str,
    value: i64,
    name: Option<&str>,
    to: &str,
    types: &TypeRegistry,
) -> Result<Value, ConversionError> {
    // Unspecialized template takes the source enum
    if to.is_empty() {
        return Ok(Value::enumeration(from, value));
    }
    if let Some(name) = name {
        if let Some(mapped) = types.enum_value(to, name) {
            return Ok(Value::enumeration(to, mapped));
        }
        if from != to {
            return Err(ConversionError::UnknownEnumEntry {
                enum_name: to.to_string(),
                entry: name.to_string(),
            });
        }
    }
    Ok(Value::enumeration(to, value))
}

fn parse_legacy_text(
    text: &str,
    target: &Value,
    types: &TypeRegistry,
) -> Result<Value, ConversionError> {
    let parse_error = || ConversionError::Parse {
        text: text.to_string(),
        to: target.script_type(),
    };
    let trimmed = text.trim();
    match target {
        Value::Guid(_) => Uuid::parse_str(trimmed)
            .map(Value::Guid)
            .map_err(|_| parse_error()),
        Value::Bool(_) => trimmed
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| parse_error()),
        Value::Enum { type_name, .. } => types
            .enum_value(type_name, trimmed)
            .or_else(|| trimmed.parse::<i64>().ok())
            .map(|value| Value::enumeration(type_name.clone(), value))
            .ok_or_else(parse_error),
        _ if is_scalar(target) => trimmed
            .parse::<f64>()
            .ok()
            .and_then(|v| target.with_scalar(v))
            .ok_or_else(parse_error),
        _ if target.components().is_some() => {
            let components = trimmed
                .trim_matches(|c| c == '(' || c == ')' || c == '[' || c == ']')
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| {
                    let number = part.rsplit(':').next().unwrap_or(part);
                    number.parse::<f32>()
                })
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|_| parse_error())?;
            target.with_components(&components).ok_or_else(parse_error)
        }
        _ => Err(parse_error()),
    }
}

/// Connections of one port, as (node ID, port ID) pairs inside the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPort {
    /// Port ID
    pub id: u32,
    /// Connected (node, port) pairs
    pub connections: Vec<(u32, u32)>,
}

/// One copied node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardNode {
    /// Group ID
    pub group_id: u16,
    /// Type ID
    pub type_id: u16,
    /// Node ID in the source context
    pub id: u32,
    /// Location in the source context
    pub location: [f32; 2],
    /// Values
    pub values: Vec<ClipboardValue>,
    /// Connected ports only
    #[serde(default)]
    pub ports: Vec<ClipboardPort>,
}

/// A copied selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardData {
    /// Nodes in selection order
    pub nodes: Vec<ClipboardNode>,
}

impl ClipboardData {
    /// Capture nodes; links leaving the selection are dropped
    pub fn capture(nodes: &[&Node], types: &TypeRegistry) -> Self {
        let selected: HashSet<u32> = nodes.iter().map(|n| n.id.0).collect();
        let nodes = nodes
            .iter()
            .map(|node| ClipboardNode {
                group_id: node.group_id(),
                type_id: node.type_id(),
                id: node.id.0,
                location: [node.location().x, node.location().y],
                values: node
                    .values()
                    .iter()
                    .map(|v| ClipboardValue::from_value(v, types))
                    .collect(),
                ports: node
                    .ports()
                    .iter()
                    .filter_map(|port| {
                        let connections: Vec<(u32, u32)> = port
                            .connections()
                            .iter()
                            .filter(|c| selected.contains(&c.node.0))
                            .map(|c| (c.node.0, c.port.0))
                            .collect();
                        (!connections.is_empty()).then_some(ClipboardPort {
                            id: port.id.0,
                            connections,
                        })
                    })
                    .collect(),
            })
            .collect();
        Self { nodes }
    }

    /// Write as RON text
    pub fn to_text(&self) -> Result<String, ClipboardError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Parse RON text
    pub fn from_text(text: &str) -> Result<Self, ClipboardError> {
        Ok(ron::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with_enum("BlendMode", &[("Opaque", 0), ("Masked", 1), ("Transparent", 2)])
            .with_enum("LegacyBlend", &[("Transparent", 5)])
    }

    #[test]
    fn test_numeric_widening() {
        let types = types();
        assert_eq!(
            ClipboardValue::Integer(7).convert(&Value::Double(0.0), &types),
            Ok(Value::Double(7.0))
        );
        assert_eq!(
            ClipboardValue::Real(2.5).convert(&Value::Float(0.0), &types),
            Ok(Value::Float(2.5))
        );
        assert_eq!(
            ClipboardValue::Integer(i64::from(i32::MAX) + 1).convert(&Value::Int(0), &types),
            Err(ConversionError::OutOfRange(i64::from(i32::MAX) + 1))
        );
    }

    #[test]
    fn test_enum_by_name() {
        let types = types();
        let copied = ClipboardValue::from_value(&Value::enumeration("LegacyBlend", 5), &types);
        assert_eq!(
            copied.convert(&Value::enumeration("BlendMode", 0), &types),
            Ok(Value::enumeration("BlendMode", 2))
        );
        assert_eq!(
            ClipboardValue::Text("Masked".into()).convert(&Value::enumeration("BlendMode", 0), &types),
            Ok(Value::enumeration("BlendMode", 1))
        );
    }

    #[test]
    fn test_vector_breakdown() {
        let types = types();
        let copied = ClipboardValue::from_value(&Value::Float4([1.0, 2.0, 3.0, 4.0]), &types);
        assert_eq!(
            copied.convert(&Value::Float2([0.0; 2]), &types),
            Ok(Value::Float2([1.0, 2.0]))
        );
        assert_eq!(
            copied.convert(&Value::Float(0.0), &types),
            Ok(Value::Float(1.0))
        );
        assert_eq!(
            ClipboardValue::Real(0.5).convert(&Value::Color([0.0; 4]), &types),
            Ok(Value::Color([0.5; 4]))
        );
    }

    #[test]
    fn test_legacy_text_vectors() {
        let types = types();
        assert_eq!(
            ClipboardValue::Text("X:1 Y:2 Z:3".into()).convert(&Value::Float3([0.0; 3]), &types),
            Ok(Value::Float3([1.0, 2.0, 3.0]))
        );
        assert_eq!(
            ClipboardValue::Text("(0.5, 0.25)".into()).convert(&Value::Float2([0.0; 2]), &types),
            Ok(Value::Float2([0.5, 0.25]))
        );
        assert!(ClipboardValue::Text("nope".into())
            .convert(&Value::Float(0.0), &types)
            .is_err());
    }

    #[test]
    fn test_incompatible_value() {
        let types = types();
        assert!(matches!(
            ClipboardValue::Bytes(vec![1]).convert(&Value::Float(0.0), &types),
            Err(ConversionError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_text_round_trip() {
        let data = ClipboardData {
            nodes: vec![ClipboardNode {
                group_id: 3,
                type_id: 1,
                id: 4,
                location: [10.0, 20.0],
                values: vec![ClipboardValue::Real(1.0), ClipboardValue::Vector(vec![1.0, 2.0])],
                ports: vec![ClipboardPort {
                    id: 2,
                    connections: vec![(5, 0)],
                }],
            }],
        };
        let text = data.to_text().unwrap();
        assert_eq!(ClipboardData::from_text(&text).unwrap(), data);
        assert!(ClipboardData::from_text("not a selection").is_err());
    }

    #[test]
    fn test_raw_values() {
        assert_eq!(ClipboardValue::Integer(3).to_value(), Value::Int(3));
        assert_eq!(ClipboardValue::Integer(1 << 40).to_value(), Value::Int64(1 << 40));
        assert_eq!(ClipboardValue::Real(0.5).to_value(), Value::Float(0.5));
        assert_eq!(ClipboardValue::Real(0.1).to_value(), Value::Double(0.1));
        assert_eq!(
            ClipboardValue::Vector(vec![1.0, 2.0, 3.0]).to_value(),
            Value::Float3([1.0, 2.0, 3.0])
        );
    }
}

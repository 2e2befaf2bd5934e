// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted graph encoding.
//!
//! A context is stored as a versioned [`GraphData`] record encoded with
//! `bincode`. The same per-node record is reused by the undo log to restore
//! removed nodes exactly.

use crate::error::{Result, SurfaceError};
use crate::node::{Node, NodeId};
use crate::parameter::SurfaceParameter;
use crate::port::{PortId, PortRef};
use crate::value::Value;
use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Current graph data format version
pub const GRAPH_DATA_VERSION: u32 = 1;

/// Connections of one port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    /// Port ID
    pub id: PortId,
    /// Connected ports
    pub connections: Vec<PortRef>,
}

/// Snapshot of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node ID
    pub id: NodeId,
    /// Group ID (original one for missing nodes)
    pub group_id: u16,
    /// Type ID
    pub type_id: u16,
    /// Location on the canvas
    pub location: Pos2,
    /// Value array
    pub values: Vec<Value>,
    /// Connected ports only
    pub ports: Vec<PortRecord>,
}

impl NodeRecord {
    /// Snapshot a node
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id,
            group_id: node.group_id(),
            type_id: node.type_id(),
            location: node.location(),
            values: node.values().to_vec(),
            ports: node
                .ports()
                .iter()
                .filter(|port| port.has_connections())
                .map(|port| PortRecord {
                    id: port.id,
                    connections: port.connections().to_vec(),
                })
                .collect(),
        }
    }
}

/// Encoded contents of a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// Format version
    pub version: u32,
    /// Nodes in order
    pub nodes: Vec<NodeRecord>,
    /// Parameters (root contexts only)
    pub parameters: Vec<SurfaceParameter>,
}

impl Default for GraphData {
    fn default() -> Self {
        Self {
            version: GRAPH_DATA_VERSION,
            nodes: Vec::new(),
            parameters: Vec::new(),
        }
    }
}

impl GraphData {
    /// Snapshot nodes and parameters
    pub fn capture<'a>(
        nodes: impl IntoIterator<Item = &'a Node>,
        parameters: &[SurfaceParameter],
    ) -> Self {
        Self {
            version: GRAPH_DATA_VERSION,
            nodes: nodes.into_iter().map(NodeRecord::from_node).collect(),
            parameters: parameters.to_vec(),
        }
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes; empty input is an empty graph
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let data: Self = bincode::deserialize(bytes)?;
        if data.version != GRAPH_DATA_VERSION {
            return Err(SurfaceError::GraphVersion(data.version));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScriptType;

    #[test]
    fn test_empty_bytes_decode_to_empty_graph() {
        let data = GraphData::from_bytes(&[]).unwrap();
        assert!(data.nodes.is_empty());
        assert_eq!(data.version, GRAPH_DATA_VERSION);
    }

    #[test]
    fn test_bytes_keep_records() {
        let data = GraphData {
            version: GRAPH_DATA_VERSION,
            nodes: vec![NodeRecord {
                id: NodeId(3),
                group_id: 3,
                type_id: 1,
                location: Pos2::new(10.0, -4.0),
                values: vec![Value::Float(1.5), Value::Bytes(vec![1, 2])],
                ports: vec![PortRecord {
                    id: PortId(2),
                    connections: vec![PortRef::new(NodeId(4), PortId(0))],
                }],
            }],
            parameters: vec![SurfaceParameter::new(
                "Tint",
                ScriptType::Color,
                Value::Color([1.0; 4]),
            )],
        };
        let bytes = data.to_bytes().unwrap();
        assert_eq!(GraphData::from_bytes(&bytes).unwrap(), data);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let data = GraphData {
            version: 99,
            ..GraphData::default()
        };
        let bytes = data.to_bytes().unwrap();
        assert!(matches!(
            GraphData::from_bytes(&bytes),
            Err(SurfaceError::GraphVersion(99))
        ));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(GraphData::from_bytes(&[0xff; 3]).is_err());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node archetypes: the immutable templates nodes are instantiated from.

use crate::cast::ConnectionsHint;
use crate::context::ContextId;
use crate::error::{Result, SurfaceError};
use crate::graph_data::GraphData;
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId};
use crate::types::ScriptType;
use crate::value::{Value, MAX_VALUES};
use bitflags::bitflags;
use egui::Vec2;
use std::sync::Arc;

/// Default node size on the canvas
pub const DEFAULT_NODE_SIZE: Vec2 = Vec2::new(140.0, 60.0);

bitflags! {
    /// Archetype usage and editing flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        /// Usable in material graphs
        const MATERIAL_GRAPH = 1 << 0;
        /// Usable in particle emitter graphs
        const PARTICLE_EMITTER_GRAPH = 1 << 1;
        /// Usable in animation graphs
        const ANIM_GRAPH = 1 << 2;
        /// Usable in visual scripts
        const VISUAL_SCRIPT_GRAPH = 1 << 3;
        /// Usable in behavior trees
        const BEHAVIOR_TREE_GRAPH = 1 << 4;
        /// Usable in every graph kind
        const ALL_GRAPHS = Self::MATERIAL_GRAPH.bits()
            | Self::PARTICLE_EMITTER_GRAPH.bits()
            | Self::ANIM_GRAPH.bits()
            | Self::VISUAL_SCRIPT_GRAPH.bits()
            | Self::BEHAVIOR_TREE_GRAPH.bits();
        /// User cannot delete the node
        const NO_REMOVE = 1 << 8;
        /// User cannot move the node
        const NO_MOVE = 1 << 9;
        /// Hidden from the spawn menu
        const NO_SPAWN_VIA_GUI = 1 << 10;
        /// Skipped when pasting
        const NO_SPAWN_VIA_PASTE = 1 << 11;
        /// Value array length may differ from the defaults
        const VARIABLE_VALUES_SIZE = 1 << 12;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::ALL_GRAPHS
    }
}

/// Template of a port
#[derive(Debug, Clone, PartialEq)]
pub struct PortArchetype {
    /// Port ID within the node
    pub id: PortId,
    /// Display name
    pub name: String,
    /// Declared type
    pub ty: ScriptType,
    /// Accepted wildcard categories
    pub hint: ConnectionsHint,
    /// Cardinality override (`None` uses the direction default)
    pub multi: Option<bool>,
    /// Value slot edited inline
    pub value_index: Option<usize>,
}

impl PortArchetype {
    /// Create a port template
    pub fn new(id: u32, name: impl Into<String>, ty: ScriptType) -> Self {
        Self {
            id: PortId(id),
            name: name.into(),
            ty,
            hint: ConnectionsHint::empty(),
            multi: None,
            value_index: None,
        }
    }

    /// Set the connection hint
    pub fn with_hint(mut self, hint: ConnectionsHint) -> Self {
        self.hint = hint;
        self
    }

    /// Bind the port to a value slot
    pub fn with_value(mut self, index: usize) -> Self {
        self.value_index = Some(index);
        self
    }

    /// Allow multiple connections
    pub fn multi(mut self) -> Self {
        self.multi = Some(true);
        self
    }

    /// Allow a single connection
    pub fn single(mut self) -> Self {
        self.multi = Some(false);
        self
    }
}

/// Inline value editor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Checkbox
    Bool,
    /// Integer field
    Integer,
    /// Float field
    Float,
    /// Vector fields
    Vector,
    /// Color picker
    Color,
    /// Text box
    Text,
    /// Enum dropdown
    Enum,
}

/// Element of a node layout
#[derive(Debug, Clone, PartialEq)]
pub enum ElementArchetype {
    /// Input port
    Input(PortArchetype),
    /// Output port
    Output(PortArchetype),
    /// Inline editor bound to a value slot
    Editor {
        /// Editor kind
        kind: EditorKind,
        /// Value slot
        value_index: usize,
    },
    /// Static label
    Text(String),
}

impl ElementArchetype {
    /// Port template and direction of port elements
    pub fn port(&self) -> Option<(&PortArchetype, PortDirection)> {
        match self {
            Self::Input(port) => Some((port, PortDirection::Input)),
            Self::Output(port) => Some((port, PortDirection::Output)),
            Self::Editor { .. } | Self::Text(_) => None,
        }
    }
}

/// Constructor function of a custom node kind
pub type NodeConstructorFn =
    dyn Fn(NodeId, ContextId, Arc<NodeArchetype>, Arc<GroupArchetype>) -> Node + Send + Sync;

/// Shared node constructor supplied by a custom group
#[derive(Clone)]
pub struct NodeConstructor(Arc<NodeConstructorFn>);

impl NodeConstructor {
    /// Wrap a constructor
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn(NodeId, ContextId, Arc<NodeArchetype>, Arc<GroupArchetype>) -> Node
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(constructor))
    }
}

impl std::fmt::Debug for NodeConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NodeConstructor")
    }
}

impl PartialEq for NodeConstructor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Construction and lifecycle specialization of an archetype
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain node
    Default,
    /// Node whose size is stored in a `Float2` value
    Resizable {
        /// Value slot holding the size
        size_value: usize,
        /// Smallest allowed size
        min_size: Vec2,
    },
    /// Comment frame: title, color and size values
    Comment {
        /// Value slot holding the title
        title_value: usize,
        /// Value slot holding the color
        color_value: usize,
        /// Value slot holding the size
        size_value: usize,
    },
    /// Constant that can be turned into a surface parameter
    ConvertibleToParameter {
        /// Value slot holding the constant
        value_index: usize,
        /// Type of the parameter to create
        parameter_type: ScriptType,
    },
    /// Reads a surface parameter referenced by id
    ParameterGetter {
        /// Value slot holding the parameter id
        id_value: usize,
    },
    /// Owns a nested graph stored in a byte value
    StateMachine {
        /// Value slot holding the display name
        name_value: usize,
        /// Value slot holding the nested graph bytes
        data_value: usize,
    },
    /// Stand-in for an archetype that could not be resolved on load
    Missing {
        /// Original group ID
        group_id: u16,
        /// Original type ID
        type_id: u16,
    },
    /// Node built by a constructor of a custom group
    Custom(NodeConstructor),
}

impl NodeKind {
    /// Construct a node of this kind
    pub fn create(
        &self,
        id: NodeId,
        context: ContextId,
        archetype: Arc<NodeArchetype>,
        group: Arc<GroupArchetype>,
    ) -> Node {
        match self {
            Self::Custom(NodeConstructor(constructor)) => constructor(id, context, archetype, group),
            Self::Resizable { .. } | Self::Comment { .. } => {
                let mut node = Node::new(id, context, archetype, group);
                node.apply_size_value();
                node
            }
            Self::StateMachine { data_value, .. } => {
                let mut node = Node::new(id, context, archetype, group);
                seed_nested_graph(&mut node, *data_value);
                node
            }
            Self::ParameterGetter { .. } => {
                // Typed once the referenced parameter is resolved
                let mut node = Node::new(id, context, archetype, group);
                node.set_output_type(&ScriptType::Null);
                node
            }
            Self::Default | Self::ConvertibleToParameter { .. } | Self::Missing { .. } => {
                Node::new(id, context, archetype, group)
            }
        }
    }

    /// Value slot holding a nested graph, if any
    pub fn nested_graph_value(&self) -> Option<usize> {
        match self {
            Self::StateMachine { data_value, .. } => Some(*data_value),
            _ => None,
        }
    }
}

fn seed_nested_graph(node: &mut Node, data_value: usize) {
    let Some(slot) = node.values.get_mut(data_value) else {
        return;
    };
    if slot.as_bytes().is_some_and(|bytes| !bytes.is_empty()) {
        return;
    }
    match GraphData::default().to_bytes() {
        Ok(bytes) => *slot = Value::Bytes(bytes),
        Err(err) => tracing::warn!("Could not seed nested graph of {:?}: {}", node.id, err),
    }
}

/// Template of a node
#[derive(Debug, Clone)]
pub struct NodeArchetype {
    /// Type ID within the group
    pub type_id: u16,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Default size
    pub size: Vec2,
    /// Flags
    pub flags: NodeFlags,
    /// Default value array
    pub default_values: Vec<Value>,
    /// Layout elements (ports, editors, labels)
    pub elements: Vec<ElementArchetype>,
    /// Ports whose connected type drives the node type
    pub independent_ports: Vec<PortId>,
    /// Ports that follow the independent ports' type
    pub dependent_ports: Vec<PortId>,
    /// Construction specialization
    pub kind: NodeKind,
    /// Opaque tag shared between clones (e.g. a reflected member signature)
    pub tag: Option<Arc<str>>,
}

impl NodeArchetype {
    /// Create an archetype with no ports and no values
    pub fn new(type_id: u16, title: impl Into<String>) -> Self {
        Self {
            type_id,
            title: title.into(),
            description: String::new(),
            size: DEFAULT_NODE_SIZE,
            flags: NodeFlags::default(),
            default_values: Vec::new(),
            elements: Vec::new(),
            independent_ports: Vec::new(),
            dependent_ports: Vec::new(),
            kind: NodeKind::Default,
            tag: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the default values
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.default_values = values;
        self
    }

    /// Add an input port
    pub fn with_input(mut self, port: PortArchetype) -> Self {
        self.elements.push(ElementArchetype::Input(port));
        self
    }

    /// Add an output port
    pub fn with_output(mut self, port: PortArchetype) -> Self {
        self.elements.push(ElementArchetype::Output(port));
        self
    }

    /// Add an inline editor
    pub fn with_editor(mut self, kind: EditorKind, value_index: usize) -> Self {
        self.elements.push(ElementArchetype::Editor { kind, value_index });
        self
    }

    /// Add a label
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.elements.push(ElementArchetype::Text(text.into()));
        self
    }

    /// Set the independent and dependent port lists
    pub fn with_type_dependency(mut self, independent: &[u32], dependent: &[u32]) -> Self {
        self.independent_ports = independent.iter().copied().map(PortId).collect();
        self.dependent_ports = dependent.iter().copied().map(PortId).collect();
        self
    }

    /// Set the construction specialization
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a shared tag
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Port templates with their direction, in layout order
    pub fn ports(&self) -> impl Iterator<Item = (&PortArchetype, PortDirection)> {
        self.elements.iter().filter_map(ElementArchetype::port)
    }

    /// Port template by ID
    pub fn port(&self, id: PortId) -> Option<(&PortArchetype, PortDirection)> {
        self.ports().find(|(port, _)| port.id == id)
    }

    /// Whether the value array may change length
    pub fn has_variable_values(&self) -> bool {
        self.flags.contains(NodeFlags::VARIABLE_VALUES_SIZE)
    }

    /// Whether the given graph-kind flag allows this archetype
    pub fn is_usable_in(&self, graph: NodeFlags) -> bool {
        self.flags.intersects(graph)
    }

    /// Specialize an enum template to a concrete enum type.
    ///
    /// Enum default values and enum-typed ports are rewritten; everything
    /// else is the cloned template.
    pub fn with_enum_type(&self, type_name: &str) -> Self {
        let mut archetype = self.clone();
        for value in &mut archetype.default_values {
            if let Value::Enum { type_name: name, .. } = value {
                *name = type_name.to_string();
            }
        }
        for element in &mut archetype.elements {
            if let ElementArchetype::Input(port) | ElementArchetype::Output(port) = element {
                if port.ty.is_enum() {
                    port.ty = ScriptType::enumeration(type_name);
                }
            }
        }
        archetype
    }

    /// Check a value array against this archetype's value shape
    pub fn check_values(&self, values: &[Value]) -> Result<()> {
        if self.has_variable_values() {
            if values.len() > MAX_VALUES {
                return Err(SurfaceError::ValuesLength {
                    expected: MAX_VALUES,
                    actual: values.len(),
                });
            }
            return Ok(());
        }
        if values.len() != self.default_values.len() {
            return Err(SurfaceError::ValuesLength {
                expected: self.default_values.len(),
                actual: values.len(),
            });
        }
        match self
            .default_values
            .iter()
            .zip(values)
            .position(|(default, value)| !default.same_kind(value))
        {
            Some(index) => Err(SurfaceError::ValueType(index)),
            None => Ok(()),
        }
    }

    /// Validate the template itself
    pub(crate) fn validate(&self, group_id: u16) -> Result<()> {
        if self.default_values.len() > MAX_VALUES {
            return Err(SurfaceError::TooManyValues {
                group_id,
                type_id: self.type_id,
                count: self.default_values.len(),
                max: MAX_VALUES,
            });
        }
        let slots = self
            .ports()
            .filter_map(|(port, _)| port.value_index)
            .chain(self.elements.iter().filter_map(|element| match element {
                ElementArchetype::Editor { value_index, .. } => Some(*value_index),
                _ => None,
            }));
        for index in slots {
            if index >= self.default_values.len() {
                return Err(SurfaceError::InvalidValueSlot {
                    group_id,
                    type_id: self.type_id,
                    index,
                });
            }
        }
        Ok(())
    }
}

/// A named group of archetypes sharing a group ID
#[derive(Debug, Clone)]
pub struct GroupArchetype {
    /// Group ID
    pub group_id: u16,
    /// Display name
    pub name: String,
    /// Header color (for UI)
    pub color: [u8; 3],
    /// Archetypes in registration order
    pub archetypes: Vec<Arc<NodeArchetype>>,
}

impl GroupArchetype {
    /// Create an empty group
    pub fn new(group_id: u16, name: impl Into<String>) -> Self {
        Self {
            group_id,
            name: name.into(),
            color: [128, 128, 128],
            archetypes: Vec::new(),
        }
    }

    /// Set the header color
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Append an archetype
    pub fn with_archetype(mut self, archetype: NodeArchetype) -> Self {
        self.archetypes.push(Arc::new(archetype));
        self
    }

    /// Archetype by type ID
    pub fn find(&self, type_id: u16) -> Option<&Arc<NodeArchetype>> {
        self.archetypes.iter().find(|a| a.type_id == type_id)
    }

    /// Validate every archetype and type ID uniqueness
    pub(crate) fn validate(&self) -> Result<()> {
        for (i, archetype) in self.archetypes.iter().enumerate() {
            archetype.validate(self.group_id)?;
            if self.archetypes[..i]
                .iter()
                .any(|other| other.type_id == archetype.type_id)
            {
                return Err(SurfaceError::DuplicateArchetype {
                    group_id: self.group_id,
                    type_id: archetype.type_id,
                });
            }
        }
        Ok(())
    }
}

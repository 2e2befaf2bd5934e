// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph editing core for Visject surfaces.
//!
//! This crate provides the editing model shared by:
//! - Material graphs
//! - Particle emitter graphs
//! - Animation graphs and state machines
//! - Visual scripts
//! - Behavior trees
//!
//! ## Architecture
//!
//! - Archetypes describe node types; groups bundle them by ID
//! - A [`Surface`] owns a tree of contexts (one per open graph) and a
//!   navigation stack over them
//! - Connections are validated by [`CastRules`] and kept symmetric
//! - Every edit is recorded as a replayable [`UndoAction`]
//! - Graphs persist as versioned binary [`GraphData`]; the clipboard uses RON

pub mod archetype;
pub mod cache_task;
pub mod cast;
pub mod clipboard;
pub mod config;
pub mod connecting;
pub mod context;
pub mod error;
pub mod events;
pub mod graph_data;
pub mod groups;
pub mod node;
pub mod parameter;
pub mod policy;
pub mod port;
pub mod registry;
pub mod source;
pub mod surface;
pub mod types;
pub mod undo;
pub mod value;

pub use archetype::{GroupArchetype, NodeArchetype, NodeConstructor, NodeFlags, NodeKind};
pub use cast::{CastRules, ConnectionsHint};
pub use clipboard::{Clipboard, ClipboardData, MemoryClipboard};
pub use config::SurfaceConfig;
pub use connecting::ConnectingState;
pub use context::{ContextId, ContextKey, SurfaceContext, Viewport};
pub use error::{Result, SurfaceError};
pub use events::SurfaceEvent;
pub use graph_data::GraphData;
pub use node::{Node, NodeId};
pub use parameter::SurfaceParameter;
pub use policy::{GraphKind, SurfacePolicy};
pub use port::{Port, PortDirection, PortId, PortRef};
pub use registry::{ArchetypeRegistry, NodeFactory};
pub use source::{MemorySource, NodeSource, SurfaceSource};
pub use surface::{PasteResult, Surface};
pub use types::{ScriptType, TypeRegistry};
pub use undo::{History, UndoAction};
pub use value::Value;

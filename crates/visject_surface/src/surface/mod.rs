// SPDX-License-Identifier: MIT OR Apache-2.0
//! The surface: owner of every context, the navigation stack, the undo
//! history and the connect gesture.
//!
//! All graph mutation goes through [`Surface`] so that connection symmetry,
//! modification tracking and undo recording stay consistent. Operations are
//! split by concern:
//!
//! - `navigation`: context stack, load/save
//! - `nodes`: spawn/remove/edit nodes, lifecycle hooks
//! - `connections`: connection validation and the connect gesture
//! - `parameters`: surface parameters
//! - `clipboard`: copy/cut/paste/duplicate
//! - `history`: undo/redo replay and handle resolution

mod clipboard;
mod connections;
mod history;
mod navigation;
mod nodes;
mod parameters;

pub use clipboard::PasteResult;

use crate::cast::CastRules;
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::config::SurfaceConfig;
use crate::connecting::ConnectingState;
use crate::context::{ContextId, ContextKey, SurfaceContext, Viewport};
use crate::error::{Result, SurfaceError};
use crate::events::SurfaceEvent;
use crate::node::{Node, NodeId};
use crate::policy::SurfacePolicy;
use crate::registry::{ArchetypeRegistry, NodeFactory};
use crate::types::TypeRegistry;
use crate::undo::{History, UndoAction};
use indexmap::IndexMap;
use std::sync::Arc;

/// Graph editing surface
pub struct Surface {
    config: SurfaceConfig,
    factory: NodeFactory,
    policy: Box<dyn SurfacePolicy>,
    cast: CastRules,
    contexts: IndexMap<ContextId, SurfaceContext>,
    cache: IndexMap<ContextKey, ContextId>,
    stack: Vec<ContextId>,
    root: Option<ContextId>,
    next_context_id: u32,
    view: Viewport,
    history: Option<History>,
    batches: Vec<Vec<UndoAction>>,
    replaying: bool,
    connecting: ConnectingState,
    events: Vec<SurfaceEvent>,
    clipboard: Box<dyn Clipboard>,
}

impl Surface {
    /// Create a surface with the default configuration
    pub fn new(registry: Arc<ArchetypeRegistry>, policy: impl SurfacePolicy + 'static) -> Self {
        Self::with_config(registry, policy, SurfaceConfig::default())
    }

    /// Create a surface
    pub fn with_config(
        registry: Arc<ArchetypeRegistry>,
        policy: impl SurfacePolicy + 'static,
        config: SurfaceConfig,
    ) -> Self {
        let object_to_bool = config
            .implicit_object_to_bool
            .unwrap_or_else(|| policy.supports_implicit_cast_from_object_to_boolean());
        let history = config
            .record_history
            .then(|| History::with_max_depth(config.history_depth));
        Self {
            factory: NodeFactory::new(registry),
            policy: Box::new(policy),
            cast: CastRules::default().with_object_to_bool(object_to_bool),
            contexts: IndexMap::new(),
            cache: IndexMap::new(),
            stack: Vec::new(),
            root: None,
            next_context_id: 1,
            view: Viewport::default(),
            history,
            batches: Vec::new(),
            replaying: false,
            connecting: ConnectingState::Idle,
            events: Vec::new(),
            clipboard: Box::new(MemoryClipboard::default()),
            config,
        }
    }

    /// Use a type table from the reflection layer
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        let object_to_bool = self.cast.supports_object_to_bool();
        self.cast = CastRules::new(Arc::new(types)).with_object_to_bool(object_to_bool);
        self
    }

    /// Use a clipboard service
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// Configuration
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Node factory
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    /// Node factory, for registering custom groups
    pub fn factory_mut(&mut self) -> &mut NodeFactory {
        &mut self.factory
    }

    /// Graph-kind policy
    pub fn policy(&self) -> &dyn SurfacePolicy {
        self.policy.as_ref()
    }

    /// Cast rules used for connection validation
    pub fn cast_rules(&self) -> &CastRules {
        &self.cast
    }

    /// Clipboard service
    pub fn clipboard(&self) -> &dyn Clipboard {
        self.clipboard.as_ref()
    }

    /// Context by ID
    pub fn context(&self, id: ContextId) -> Option<&SurfaceContext> {
        self.contexts.get(&id)
    }

    /// All live contexts
    pub fn contexts(&self) -> impl Iterator<Item = &SurfaceContext> {
        self.contexts.values()
    }

    /// Cached context of a data source
    pub fn find_context(&self, key: &ContextKey) -> Option<ContextId> {
        self.cache.get(key).copied()
    }

    /// Node by context and ID
    pub fn node(&self, context: ContextId, node: NodeId) -> Option<&Node> {
        self.contexts.get(&context)?.find_node(node)
    }

    /// Root context
    pub fn root(&self) -> Option<ContextId> {
        self.root
    }

    /// Context on top of the navigation stack
    pub fn current(&self) -> Option<ContextId> {
        self.stack.last().copied()
    }

    /// Navigation stack, root first
    pub fn stack(&self) -> &[ContextId] {
        &self.stack
    }

    /// Current viewport
    pub fn view(&self) -> Viewport {
        self.view
    }

    /// Update the current viewport
    pub fn set_view(&mut self, view: Viewport) {
        self.view = view;
    }

    /// Attached undo history
    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    /// Attach or detach the undo history
    pub fn set_history(&mut self, history: Option<History>) {
        self.history = history;
    }

    /// State of the connect gesture
    pub fn connecting_state(&self) -> ConnectingState {
        self.connecting
    }

    /// Take the pending notifications
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether any context has unsaved changes
    pub fn is_modified(&self) -> bool {
        self.contexts.values().any(SurfaceContext::is_modified)
    }

    /// Mark a context and all its ancestors modified
    pub fn mark_as_modified(&mut self, context: ContextId, graph_edited: bool) {
        let mut current = Some(context);
        while let Some(id) = current {
            let Some(ctx) = self.contexts.get_mut(&id) else {
                break;
            };
            ctx.modified = true;
            current = ctx.parent();
            self.events.push(SurfaceEvent::ContextModified {
                context: id,
                graph_edited,
            });
        }
    }

    /// Run `f` and record everything it does as one undo step
    pub fn batch<T>(
        &mut self,
        description: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.batches.push(Vec::new());
        let result = f(self);
        let mut actions = self.batches.pop().unwrap_or_default();
        // Whatever was applied stays undoable, even after an error
        match actions.len() {
            0 => {}
            1 => {
                if let Some(action) = actions.pop() {
                    self.record(action);
                }
            }
            _ => self.record(UndoAction::Batch {
                description: description.into(),
                actions,
            }),
        }
        result
    }

    pub(crate) fn record(&mut self, action: UndoAction) {
        if self.replaying || action.is_empty() {
            return;
        }
        if let Some(batch) = self.batches.last_mut() {
            batch.push(action);
        } else if let Some(history) = self.history.as_mut() {
            history.push(action);
        }
    }

    pub(crate) fn emit(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }

    pub(crate) fn ctx(&self, id: ContextId) -> Result<&SurfaceContext> {
        self.contexts.get(&id).ok_or(SurfaceError::ContextNotFound(id))
    }

    pub(crate) fn ctx_mut(&mut self, id: ContextId) -> Result<&mut SurfaceContext> {
        self.contexts
            .get_mut(&id)
            .ok_or(SurfaceError::ContextNotFound(id))
    }

    fn sync_factory(&mut self) {
        if self.factory.has_pending_groups() {
            let timeout = self.config.pending_groups_timeout();
            self.factory.sync(timeout);
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("contexts", &self.contexts.len())
            .field("stack", &self.stack)
            .field("root", &self.root)
            .field("connecting", &self.connecting)
            .finish_non_exhaustive()
    }
}

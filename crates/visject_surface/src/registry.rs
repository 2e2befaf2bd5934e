// SPDX-License-Identifier: MIT OR Apache-2.0
//! Archetype registry and node factory.
//!
//! The registry is built once and shared through `Arc`. Each surface owns a
//! [`NodeFactory`] that layers its own custom groups (for example
//! reflection-discovered script members) over the shared registry without
//! ever mutating it.

use crate::archetype::{GroupArchetype, NodeArchetype, NodeFlags};
use crate::cache_task::ArchetypeCacheTask;
use crate::context::ContextId;
use crate::error::{Result, SurfaceError};
use crate::groups;
use crate::node::{Node, NodeId};
use crate::policy::SurfacePolicy;
use std::sync::Arc;
use std::time::Duration;

/// Resolved archetype pair
pub type Resolved = (Arc<GroupArchetype>, Arc<NodeArchetype>);

/// Find an archetype by (group, type) with a linear scan
pub fn resolve<'a>(
    groups: impl IntoIterator<Item = &'a Arc<GroupArchetype>>,
    group_id: u16,
    type_id: u16,
) -> Option<Resolved> {
    groups
        .into_iter()
        .find(|group| group.group_id == group_id)
        .and_then(|group| {
            group
                .find(type_id)
                .map(|archetype| (Arc::clone(group), Arc::clone(archetype)))
        })
}

/// Immutable set of archetype groups
#[derive(Debug, Default)]
pub struct ArchetypeRegistry {
    groups: Vec<Arc<GroupArchetype>>,
}

/// Collects groups before validation
#[derive(Debug, Default)]
pub struct ArchetypeRegistryBuilder {
    groups: Vec<GroupArchetype>,
}

impl ArchetypeRegistryBuilder {
    /// Add a group
    pub fn register(&mut self, group: GroupArchetype) -> &mut Self {
        self.groups.push(group);
        self
    }

    /// Add a group (by value)
    pub fn with_group(mut self, group: GroupArchetype) -> Self {
        self.groups.push(group);
        self
    }

    /// Add the built-in groups
    pub fn with_builtin(mut self) -> Self {
        self.groups.extend(groups::builtin_groups());
        self
    }

    /// Validate and freeze
    pub fn build(self) -> Result<Arc<ArchetypeRegistry>> {
        let mut frozen: Vec<Arc<GroupArchetype>> = Vec::with_capacity(self.groups.len());
        for group in self.groups {
            group.validate()?;
            if frozen.iter().any(|g| g.group_id == group.group_id) {
                return Err(SurfaceError::DuplicateGroup(group.group_id));
            }
            frozen.push(Arc::new(group));
        }
        tracing::debug!("Archetype registry built with {} groups", frozen.len());
        Ok(Arc::new(ArchetypeRegistry { groups: frozen }))
    }
}

impl ArchetypeRegistry {
    /// Start building a registry
    pub fn builder() -> ArchetypeRegistryBuilder {
        ArchetypeRegistryBuilder::default()
    }

    /// Registry holding only the built-in groups
    pub fn builtin() -> Result<Arc<Self>> {
        Self::builder().with_builtin().build()
    }

    /// Groups in registration order
    pub fn groups(&self) -> &[Arc<GroupArchetype>] {
        &self.groups
    }

    /// Group by ID
    pub fn group(&self, group_id: u16) -> Option<&Arc<GroupArchetype>> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// Find an archetype
    pub fn resolve(&self, group_id: u16, type_id: u16) -> Option<Resolved> {
        resolve(&self.groups, group_id, type_id)
    }
}

/// Surface-local view of the registry: shared base plus custom groups
#[derive(Debug)]
pub struct NodeFactory {
    base: Arc<ArchetypeRegistry>,
    custom: Vec<Arc<GroupArchetype>>,
    pending: Option<ArchetypeCacheTask>,
}

impl NodeFactory {
    /// Create a factory over a shared registry
    pub fn new(base: Arc<ArchetypeRegistry>) -> Self {
        Self {
            base,
            custom: Vec::new(),
            pending: None,
        }
    }

    /// Shared registry
    pub fn base(&self) -> &Arc<ArchetypeRegistry> {
        &self.base
    }

    /// Custom groups of this surface
    pub fn custom_groups(&self) -> &[Arc<GroupArchetype>] {
        &self.custom
    }

    /// All groups, base first
    pub fn groups(&self) -> impl Iterator<Item = &Arc<GroupArchetype>> {
        self.base.groups().iter().chain(self.custom.iter())
    }

    /// Add or replace a custom group; base group IDs are reserved
    pub fn add_custom_group(&mut self, group: GroupArchetype) -> Result<()> {
        group.validate()?;
        if self.base.group(group.group_id).is_some() {
            return Err(SurfaceError::DuplicateGroup(group.group_id));
        }
        let group = Arc::new(group);
        match self.custom.iter_mut().find(|g| g.group_id == group.group_id) {
            Some(existing) => *existing = group,
            None => self.custom.push(group),
        }
        Ok(())
    }

    /// Drop a custom group
    pub fn remove_custom_group(&mut self, group_id: u16) -> bool {
        let before = self.custom.len();
        self.custom.retain(|g| g.group_id != group_id);
        before != self.custom.len()
    }

    /// Install a background computation of custom groups; a previous one is cancelled
    pub fn set_pending_groups(&mut self, task: ArchetypeCacheTask) {
        if let Some(previous) = self.pending.replace(task) {
            previous.cancel();
        }
    }

    /// Whether a background computation has not been published yet
    pub fn has_pending_groups(&self) -> bool {
        self.pending.is_some()
    }

    /// Publish pending groups, waiting at most `timeout`.
    ///
    /// Returns false when the task is still running; it stays pending.
    pub fn sync(&mut self, timeout: Duration) -> bool {
        let Some(task) = self.pending.as_mut() else {
            return true;
        };
        if !task.wait(timeout) {
            tracing::warn!("Pending archetype groups not ready after {:?}", timeout);
            return false;
        }
        let groups = task.take();
        self.pending = None;
        let Some(groups) = groups else {
            tracing::error!("Pending archetype groups finished without a result");
            return true;
        };
        for group in groups {
            let group_id = group.group_id;
            if let Err(err) = self.add_custom_group(group) {
                tracing::error!("Rejected custom group {}: {}", group_id, err);
            }
        }
        true
    }

    /// Find an archetype in the base registry, then the custom groups
    pub fn resolve(&self, group_id: u16, type_id: u16) -> Option<Resolved> {
        let found = resolve(self.groups(), group_id, type_id);
        if found.is_none() {
            tracing::warn!("Unknown node archetype {}:{}", group_id, type_id);
        }
        found
    }

    /// Instantiate a node
    pub fn create(
        &self,
        id: NodeId,
        context: ContextId,
        group_id: u16,
        type_id: u16,
    ) -> Option<Node> {
        let (group, archetype) = self.resolve(group_id, type_id)?;
        let kind = archetype.kind.clone();
        Some(kind.create(id, context, archetype, group))
    }

    /// Archetypes the user may spawn from menus
    pub fn spawnable(&self, policy: &dyn SurfacePolicy) -> Vec<Resolved> {
        self.groups()
            .flat_map(|group| {
                group
                    .archetypes
                    .iter()
                    .map(move |archetype| (Arc::clone(group), Arc::clone(archetype)))
            })
            .filter(|(group, archetype)| {
                !archetype.flags.contains(NodeFlags::NO_SPAWN_VIA_GUI)
                    && policy.can_use_node_type(group, archetype)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{NodeConstructor, NodeKind};
    use crate::policy::GraphKind;
    use egui::Vec2;

    fn custom_group(id: u16) -> GroupArchetype {
        GroupArchetype::new(id, "Custom").with_archetype(NodeArchetype::new(1, "Custom Node"))
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let result = ArchetypeRegistry::builder()
            .with_group(GroupArchetype::new(40, "A"))
            .with_group(GroupArchetype::new(40, "B"))
            .build();
        assert!(matches!(result, Err(SurfaceError::DuplicateGroup(40))));
    }

    #[test]
    fn test_builtin_registry_builds() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let (group, archetype) = registry.resolve(groups::MATH, groups::math::ADD).unwrap();
        assert_eq!(group.name, "Math");
        assert_eq!(archetype.title, "Add");
        assert!(registry.resolve(groups::MATH, 999).is_none());
    }

    #[test]
    fn test_custom_groups_never_shadow_base() {
        let mut factory = NodeFactory::new(ArchetypeRegistry::builtin().unwrap());
        assert!(factory.add_custom_group(custom_group(groups::MATH)).is_err());
        factory.add_custom_group(custom_group(100)).unwrap();
        factory.add_custom_group(custom_group(100)).unwrap();
        assert_eq!(factory.custom_groups().len(), 1);
        assert!(factory.resolve(100, 1).is_some());
        assert!(factory.base().group(100).is_none());
    }

    #[test]
    fn test_sync_publishes_pending_groups() {
        let mut factory = NodeFactory::new(ArchetypeRegistry::builtin().unwrap());
        factory.set_pending_groups(ArchetypeCacheTask::spawn(|_| vec![custom_group(101)]));
        assert!(factory.sync(Duration::from_secs(5)));
        assert!(!factory.has_pending_groups());
        let node = factory.create(NodeId(1), ContextId(0), 101, 1).unwrap();
        assert_eq!(node.title(), "Custom Node");
    }

    #[test]
    fn test_spawnable_respects_policy() {
        let factory = NodeFactory::new(ArchetypeRegistry::builtin().unwrap());
        let material = factory.spawnable(&GraphKind::Material);
        assert!(material
            .iter()
            .all(|(_, a)| !a.flags.contains(NodeFlags::NO_SPAWN_VIA_GUI)));
        assert!(material.iter().all(|(g, _)| g.group_id != groups::ANIMATIONS));
        let anim = factory.spawnable(&GraphKind::Animation);
        assert!(anim.iter().any(|(g, _)| g.group_id == groups::ANIMATIONS));
    }

    #[test]
    fn test_create_uses_custom_constructor() {
        let mut factory = NodeFactory::new(ArchetypeRegistry::builtin().unwrap());
        let constructor = NodeConstructor::new(|id, context, archetype, group| {
            Node::new(id, context, archetype, group).with_size(Vec2::new(320.0, 48.0))
        });
        factory
            .add_custom_group(GroupArchetype::new(102, "Custom").with_archetype(
                NodeArchetype::new(1, "Wide").with_kind(NodeKind::Custom(constructor)),
            ))
            .unwrap();
        let node = factory.create(NodeId(1), ContextId(0), 102, 1).unwrap();
        assert_eq!(node.size(), Vec2::new(320.0, 48.0));
    }

    #[test]
    fn test_sync_drops_failed_task() {
        let mut factory = NodeFactory::new(ArchetypeRegistry::builtin().unwrap());
        factory.set_pending_groups(ArchetypeCacheTask::spawn(|_| panic!("reflection failed")));
        assert!(factory.sync(Duration::from_secs(5)));
        assert!(!factory.has_pending_groups());
        assert!(factory.custom_groups().is_empty());
        // Later syncs return at once
        assert!(factory.sync(Duration::ZERO));
    }
}

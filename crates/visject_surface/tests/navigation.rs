// SPDX-License-Identifier: MIT OR Apache-2.0
//! Context stack, nested graphs and persistence.

mod common;

use common::*;
use egui::{Pos2, Vec2};
use visject_surface::groups::{self, animation};
use visject_surface::{
    ArchetypeRegistry, ContextId, GraphKind, GroupArchetype, MemorySource, NodeArchetype, NodeId,
    NodeKind, ScriptType, Surface, SurfaceError, SurfaceEvent, SurfaceParameter, SurfaceSource, Value,
    Viewport,
};
use visject_surface::archetype::PortArchetype;

fn assert_stack_invariant(surface: &Surface) {
    assert_eq!(surface.stack().is_empty(), surface.root().is_none());
    assert_eq!(surface.stack().first().copied(), surface.root());
}

/// Animation surface with blend nodes 1..=4 and a state machine as node 5
fn animation_with_state_machine() -> (Surface, ContextId, NodeId) {
    let (mut surface, root, _source) = surface(GraphKind::Animation);
    for i in 0..4 {
        spawn(&mut surface, root, groups::ANIMATIONS, animation::BLEND, (0.0, i as f32 * 100.0));
    }
    let machine = spawn_state_machine(&mut surface, root, (300.0, 0.0));
    assert_eq!(machine, NodeId(5));
    (surface, root, machine)
}

#[test]
fn test_reopened_context_restores_view() {
    let (mut surface, root, machine) = animation_with_state_machine();
    surface.drain_events();

    let sub = surface.open_node(root, machine).unwrap();
    assert_eq!(surface.stack(), &[root, sub]);
    assert_eq!(surface.current(), Some(sub));
    assert!(surface
        .drain_events()
        .contains(&SurfaceEvent::FitWholeGraph { context: sub }));

    let view = Viewport {
        pan: Vec2::new(120.0, -40.0),
        zoom: 1.5,
    };
    surface.set_view(view);
    surface.close_context().unwrap();
    assert_eq!(surface.stack(), &[root]);
    assert_eq!(surface.view(), Viewport::default());

    let reopened = surface.open_node(root, machine).unwrap();
    assert_eq!(reopened, sub);
    assert_eq!(surface.view(), view);
    assert!(surface
        .drain_events()
        .contains(&SurfaceEvent::ViewRestored { context: sub, view }));
    assert_stack_invariant(&surface);
}

#[test]
fn test_stack_root_invariant() {
    let (mut surface, root, machine) = animation_with_state_machine();
    assert_stack_invariant(&surface);

    let sub = surface.open_node(root, machine).unwrap();
    assert_stack_invariant(&surface);
    let state = spawn(&mut surface, sub, groups::ANIMATIONS, animation::STATE, (0.0, 0.0));
    let deeper = surface.open_node(sub, state).unwrap();
    assert_eq!(surface.stack().len(), 3);
    assert_stack_invariant(&surface);

    // Re-entering a context on the stack pops the levels above it
    let source = surface.node_source(root, machine).unwrap();
    assert_eq!(surface.open_context(&source).unwrap(), sub);
    assert_eq!(surface.stack(), &[root, sub]);
    assert!(surface.context(deeper).is_some());

    while !surface.stack().is_empty() {
        surface.close_context().unwrap();
        assert_stack_invariant(&surface);
    }
    assert!(matches!(surface.close_context(), Err(SurfaceError::EmptyStack)));
    assert_eq!(
        surface.drain_events().last(),
        Some(&SurfaceEvent::ContextChanged { context: None })
    );
}

#[test]
fn test_modification_bubbles_to_root() {
    let (mut surface, root, machine) = animation_with_state_machine();
    let sub = surface.open_node(root, machine).unwrap();
    let state = spawn(&mut surface, sub, groups::ANIMATIONS, animation::STATE, (0.0, 0.0));
    let leaf = surface.open_node(sub, state).unwrap();

    surface.save().unwrap();
    assert!(!surface.is_modified());

    surface.mark_as_modified(leaf, false);
    for id in [leaf, sub, root] {
        assert!(surface.context(id).unwrap().is_modified(), "{id:?} not modified");
    }
}

#[test]
fn test_save_and_reload() {
    let (mut surface, root, source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    let add = spawn_add(&mut surface, root, (200.0, 0.0));
    surface.set_node_value(root, value, 0, Value::Float(0.25)).unwrap();
    surface.connect(root, port(value, 0), port(add, 1)).unwrap();
    let tint = surface
        .add_parameter(SurfaceParameter::new("Tint", ScriptType::Float, Value::Float(1.0)))
        .unwrap();

    let bytes = surface.save().unwrap();
    assert!(!surface.is_modified());

    let mut stored = MemorySource::with_id(source.id(), "Test Graph");
    stored.set_data(bytes);
    let mut reloaded = Surface::new(ArchetypeRegistry::builtin().unwrap(), GraphKind::Material);
    let root = reloaded.load(&stored).unwrap();

    let ctx = reloaded.context(root).unwrap();
    assert_eq!(ctx.node_count(), 2);
    assert_eq!(ctx.find_node(value).unwrap().value(0), Some(&Value::Float(0.25)));
    assert_eq!(ctx.find_node(add).unwrap().location(), Pos2::new(200.0, 0.0));
    assert_eq!(ctx.connections_of(port(add, 1)), vec![port(value, 0)]);
    assert_eq!(
        ctx.port(port(add, 2)).unwrap().current_type,
        ScriptType::Float
    );
    assert_eq!(reloaded.find_parameter(tint).unwrap().name, "Tint");
    assert!(!reloaded.is_modified());
    assert!(!reloaded.can_undo());
}

#[test]
fn test_nested_graph_saved_into_owner() {
    let (mut surface, root, machine) = animation_with_state_machine();
    let sub = surface.open_node(root, machine).unwrap();
    spawn(&mut surface, sub, groups::ANIMATIONS, animation::BLEND, (10.0, 10.0));
    let bytes = surface.save().unwrap();

    let mut stored = MemorySource::new("Reloaded");
    stored.set_data(bytes);
    let mut reloaded = Surface::new(ArchetypeRegistry::builtin().unwrap(), GraphKind::Animation);
    let root = reloaded.load(&stored).unwrap();
    let sub = reloaded.open_node(root, machine).unwrap();
    let ctx = reloaded.context(sub).unwrap();
    assert_eq!(ctx.node_count(), 1);
    assert_eq!(ctx.owner_node(), Some(machine));
    assert_eq!(ctx.name(), "State Machine");
}

#[test]
fn test_unknown_nodes_survive_round_trip() {
    init_tracing();
    let custom = GroupArchetype::new(200, "Plugin").with_archetype(
        NodeArchetype::new(1, "Plugin Node")
            .with_values(vec![Value::Float(7.0), Value::string("payload")])
            .with_output(PortArchetype::new(0, "Out", ScriptType::Float)),
    );
    let full = ArchetypeRegistry::builder()
        .with_builtin()
        .with_group(custom)
        .build()
        .unwrap();

    let mut authoring = Surface::new(full.clone(), GraphKind::Material);
    let source = MemorySource::new("Plugin Graph");
    let root = authoring.load(&source).unwrap();
    let plugin = spawn(&mut authoring, root, 200, 1, (0.0, 0.0));
    let bytes = authoring.save().unwrap();

    let mut stored = MemorySource::new("Plugin Graph");
    stored.set_data(bytes);
    let mut plain = Surface::new(ArchetypeRegistry::builtin().unwrap(), GraphKind::Material);
    let root = plain.load(&stored).unwrap();
    let placeholder = plain.node(root, plugin).unwrap();
    assert!(matches!(
        placeholder.kind(),
        NodeKind::Missing { group_id: 200, type_id: 1 }
    ));
    assert_eq!(placeholder.value(1), Some(&Value::string("payload")));

    let bytes = plain.save().unwrap();
    stored.set_data(bytes);
    let mut again = Surface::new(full, GraphKind::Material);
    let root = again.load(&stored).unwrap();
    let restored = again.node(root, plugin).unwrap();
    assert_eq!(restored.title(), "Plugin Node");
    assert_eq!(restored.value(0), Some(&Value::Float(7.0)));
}

#[test]
fn test_load_failures() {
    init_tracing();
    let mut surface = Surface::new(ArchetypeRegistry::builtin().unwrap(), GraphKind::Material);

    let mut missing = MemorySource::new("Missing");
    missing.set_unavailable();
    assert!(matches!(surface.load(&missing), Err(SurfaceError::Load { .. })));
    assert!(surface.root().is_none());
    assert!(surface.stack().is_empty());

    let mut corrupt = MemorySource::new("Corrupt");
    corrupt.set_data(vec![0xff; 7]);
    assert!(matches!(surface.load(&corrupt), Err(SurfaceError::Load { .. })));
    assert!(surface.contexts().next().is_none());
    assert!(matches!(surface.save(), Err(SurfaceError::NoRoot)));
}

#[test]
fn test_remove_context() {
    let (mut surface, root, machine) = animation_with_state_machine();
    let source = surface.node_source(root, machine).unwrap();
    let sub = surface.open_context(&source).unwrap();
    spawn(&mut surface, sub, groups::ANIMATIONS, animation::BLEND, (0.0, 0.0));
    surface.close_context().unwrap();

    surface.remove_context(&source).unwrap();
    assert!(surface.context(sub).is_none());
    assert!(surface.find_context(&source.key()).is_none());
    // Edits made inside were written back into the owner node
    let owner = surface.node(root, machine).unwrap();
    assert!(!owner.nested_graph().unwrap().is_empty());

    // Removing a node closes its graph if open
    let sub = surface.open_node(root, machine).unwrap();
    assert_eq!(surface.context(sub).unwrap().node_count(), 1);
    surface.remove_node(root, machine).unwrap();
    assert!(surface.context(sub).is_none());
    assert_eq!(surface.stack(), &[root]);
}

#[test]
fn test_spawnable_listing_follows_policy() {
    let (surface, _root, _source) = surface(GraphKind::Material);
    let spawnable = surface.factory().spawnable(surface.policy());
    assert!(spawnable
        .iter()
        .any(|(_, archetype)| archetype.title == "Add"));
    assert!(!spawnable
        .iter()
        .any(|(_, archetype)| archetype.title == "State Machine"));
    // Hidden from the node picker
    assert!(!spawnable
        .iter()
        .any(|(_, archetype)| archetype.title == "Get Parameter"));
}

#[test]
fn test_corrupt_nested_graph_fails_to_open() {
    let (mut surface, root, machine) = animation_with_state_machine();
    surface
        .set_node_value(root, machine, 1, Value::Bytes(vec![0xff; 7]))
        .unwrap();
    let contexts = surface.contexts().count();
    let source = surface.node_source(root, machine).unwrap();

    assert!(matches!(surface.open_context(&source), Err(SurfaceError::Load { .. })));
    assert_eq!(surface.stack(), &[root]);
    assert_eq!(surface.current(), Some(root));
    assert_eq!(surface.contexts().count(), contexts);
    assert!(surface.find_context(&source.key()).is_none());
    assert!(surface.context(root).unwrap().children().is_empty());
}

#[test]
fn test_nested_graph_cannot_become_root() {
    let (mut surface, root, machine) = animation_with_state_machine();
    let other = spawn_state_machine(&mut surface, root, (600.0, 0.0));
    let opened = surface.node_source(root, machine).unwrap();
    let unopened = surface.node_source(root, other).unwrap();
    surface.open_context(&opened).unwrap();
    while !surface.stack().is_empty() {
        surface.close_context().unwrap();
    }
    let contexts = surface.contexts().count();

    // Cached nested context
    assert!(matches!(surface.open_context(&opened), Err(SurfaceError::NoRoot)));
    // Nested context never opened
    assert!(matches!(surface.open_context(&unopened), Err(SurfaceError::NoRoot)));
    assert!(surface.stack().is_empty());
    assert!(surface.root().is_none());
    assert_eq!(surface.contexts().count(), contexts);
    assert!(surface.find_context(&unopened.key()).is_none());
}

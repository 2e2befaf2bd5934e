// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy, cut, paste and duplicate.

mod common;

use common::*;
use egui::Pos2;
use visject_surface::clipboard::ClipboardError;
use visject_surface::groups::{self, animation, tools};
use visject_surface::{
    ArchetypeRegistry, Clipboard, GraphKind, GroupArchetype, MemorySource, NodeArchetype, NodeFlags,
    NodeId, Surface, SurfaceError, SurfaceEvent, Value,
};

#[test]
fn test_paste_copies_topology_at_cursor() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    let add = spawn_add(&mut surface, root, (200.0, 0.0));
    surface.connect(root, port(value, 0), port(add, 0)).unwrap();

    surface.copy(root, &[value, add]).unwrap();
    let pasted = surface.paste(root, Pos2::new(500.0, 300.0)).unwrap();

    assert_eq!(pasted.nodes, vec![NodeId(3), NodeId(4)]);
    assert_eq!(pasted.mapping.get(&value.0), Some(&NodeId(3)));
    assert_eq!(pasted.mapping.get(&add.0), Some(&NodeId(4)));
    assert!(pasted.comments.is_empty());

    let ctx = surface.context(root).unwrap();
    assert_eq!(ctx.node_count(), 4);
    assert_eq!(ctx.find_node(NodeId(3)).unwrap().location(), Pos2::new(500.0, 300.0));
    assert_eq!(ctx.find_node(NodeId(4)).unwrap().location(), Pos2::new(700.0, 300.0));
    assert_eq!(ctx.connections_of(port(NodeId(4), 0)), vec![port(NodeId(3), 0)]);
    // Originals keep their own link
    assert_eq!(ctx.connections_of(port(add, 0)), vec![port(value, 0)]);
    assert_consistent(&surface);
}

#[test]
fn test_paste_into_empty_surface_is_isomorphic() {
    let (mut source_surface, root, _source) = surface(GraphKind::Material);
    let a = spawn_float(&mut source_surface, root, (0.0, 0.0));
    let b = spawn_float(&mut source_surface, root, (0.0, 80.0));
    let add = spawn_add(&mut source_surface, root, (200.0, 0.0));
    let abs = spawn(&mut source_surface, root, groups::MATH, groups::math::ABS, (400.0, 0.0));
    source_surface.connect(root, port(a, 0), port(add, 0)).unwrap();
    source_surface.connect(root, port(b, 0), port(add, 1)).unwrap();
    source_surface.connect(root, port(add, 2), port(abs, 0)).unwrap();
    let text = source_surface.copy_to_text(root, &[a, b, add, abs]).unwrap();

    let (mut target, target_root, _target_source) = surface(GraphKind::Material);
    let pasted = target.paste_text(target_root, &text, Pos2::ZERO).unwrap();
    assert_eq!(pasted.nodes.len(), 4);

    let original = source_surface.context(root).unwrap();
    let copy = target.context(target_root).unwrap();
    for node in original.nodes() {
        let mapped = pasted.mapping[&node.id.0];
        let twin = copy.find_node(mapped).unwrap();
        assert_eq!((twin.group_id(), twin.type_id()), (node.group_id(), node.type_id()));
        for port_ in node.ports() {
            let expected: Vec<_> = port_
                .connections()
                .iter()
                .map(|c| port(pasted.mapping[&c.node.0], c.port.0))
                .collect();
            assert_eq!(copy.connections_of(port(mapped, port_.id.0)), expected);
        }
    }
    assert_consistent(&target);
}

#[test]
fn test_pasted_event_carries_id_mapping() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    let add = spawn_add(&mut surface, root, (200.0, 0.0));
    surface.drain_events();

    let pasted = surface.duplicate(root, &[value, add], None).unwrap();
    let mappings: Vec<_> = surface
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SurfaceEvent::NodePasted { node, mapping, .. } => Some((node, mapping)),
            _ => None,
        })
        .collect();
    assert_eq!(mappings.len(), 2);
    for (node, mapping) in &mappings {
        assert!(pasted.nodes.contains(node));
        assert_eq!(**mapping, pasted.mapping);
    }
}

#[test]
fn test_paste_keeps_variable_size_values() {
    init_tracing();
    let list = GroupArchetype::new(220, "Lists").with_archetype(
        NodeArchetype::new(1, "Int List")
            .with_flags(NodeFlags::ALL_GRAPHS | NodeFlags::VARIABLE_VALUES_SIZE)
            .with_values(vec![Value::Int(0)]),
    );
    let registry = ArchetypeRegistry::builder()
        .with_builtin()
        .with_group(list)
        .build()
        .unwrap();
    let mut surface = Surface::new(registry, GraphKind::VisualScript);
    let root = surface.load(&MemorySource::new("Lists")).unwrap();

    let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
    let long = surface
        .spawn_node(root, 220, 1, Pos2::ZERO, Some(values.clone()))
        .unwrap()
        .unwrap();
    let empty = surface
        .spawn_node(root, 220, 1, Pos2::new(0.0, 100.0), Some(Vec::new()))
        .unwrap()
        .unwrap();

    let pasted = surface.duplicate(root, &[long, empty], None).unwrap();
    let copy = surface.node(root, pasted.mapping[&long.0]).unwrap();
    assert_eq!(copy.values(), values.as_slice());
    let copy = surface.node(root, pasted.mapping[&empty.0]).unwrap();
    assert!(copy.values().is_empty());
}

#[test]
fn test_links_leaving_selection_are_dropped() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    let add = spawn_add(&mut surface, root, (200.0, 0.0));
    surface.connect(root, port(value, 0), port(add, 0)).unwrap();

    let pasted = surface.duplicate(root, &[add], None).unwrap();
    let copy = pasted.nodes[0];
    let ctx = surface.context(root).unwrap();
    assert!(!ctx.find_node(copy).unwrap().has_connections());
    assert_eq!(ctx.connections_of(port(value, 0)), vec![port(add, 0)]);
}

#[test]
fn test_duplicate_offsets_and_keeps_values() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (10.0, 20.0));
    surface.set_node_value(root, value, 0, Value::Float(9.5)).unwrap();

    let pasted = surface.duplicate(root, &[value], None).unwrap();
    let copy = surface.node(root, pasted.nodes[0]).unwrap();
    let offset = surface.config().duplicate_offset;
    assert_eq!(copy.location(), Pos2::new(10.0, 20.0) + offset);
    assert_eq!(copy.value(0), Some(&Value::Float(9.5)));
    // The system clipboard is untouched
    assert!(surface.clipboard().get_text().is_none());

    let at = surface
        .duplicate(root, &[value], Some(Pos2::new(-50.0, -50.0)))
        .unwrap();
    assert_eq!(surface.node(root, at.nodes[0]).unwrap().location(), Pos2::new(-50.0, -50.0));
    assert!(surface.duplicate(root, &[], None).unwrap().is_empty());
}

#[test]
fn test_cut_then_paste() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    spawn_add(&mut surface, root, (200.0, 0.0));

    assert_eq!(surface.cut(root, &[value]).unwrap(), 1);
    assert!(surface.node(root, value).is_none());

    let pasted = surface.paste(root, Pos2::new(30.0, 30.0)).unwrap();
    assert_eq!(pasted.nodes, vec![value]);
}

#[test]
fn test_paste_skips_forbidden_archetypes() {
    let (mut anim, root, _source) = surface(GraphKind::Animation);
    let output = spawn(&mut anim, root, groups::ANIMATIONS, animation::OUTPUT, (0.0, 0.0));
    let blend = spawn(&mut anim, root, groups::ANIMATIONS, animation::BLEND, (-200.0, 0.0));
    anim.connect(root, port(blend, 3), port(output, 0)).unwrap();
    let text = anim.copy_to_text(root, &[output, blend]).unwrap();

    // The output node is never pasted
    let pasted = anim.paste_text(root, &text, Pos2::new(0.0, 300.0)).unwrap();
    assert_eq!(pasted.nodes.len(), 1);
    assert!(!anim.node(root, pasted.nodes[0]).unwrap().has_connections());

    // Animation nodes are not allowed in a material
    let (mut material, material_root, _material_source) = surface(GraphKind::Material);
    let pasted = material.paste_text(material_root, &text, Pos2::ZERO).unwrap();
    assert!(pasted.is_empty());
    assert_eq!(material.context(material_root).unwrap().node_count(), 0);
    assert!(!material.can_undo());
}

#[test]
fn test_paste_reports_comments() {
    let (mut surface, root, _source) = surface(GraphKind::VisualScript);
    let comment = spawn(&mut surface, root, groups::TOOLS, tools::COMMENT, (0.0, 0.0));
    surface
        .set_node_value(root, comment, 2, Value::Float2([640.0, 200.0]))
        .unwrap();
    let reroute = spawn(&mut surface, root, groups::TOOLS, tools::REROUTE, (100.0, 100.0));

    let pasted = surface.duplicate(root, &[comment, reroute], None).unwrap();
    assert_eq!(pasted.nodes.len(), 2);
    assert_eq!(pasted.comments, vec![pasted.mapping[&comment.0]]);
    let copy = surface.node(root, pasted.comments[0]).unwrap();
    assert_eq!(copy.size(), egui::Vec2::new(640.0, 200.0));
}

#[test]
fn test_bad_clipboard_text() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    spawn_add(&mut surface, root, (0.0, 0.0));

    assert!(matches!(
        surface.paste(root, Pos2::ZERO),
        Err(SurfaceError::Clipboard(ClipboardError::Empty))
    ));
    assert!(matches!(
        surface.paste_text(root, "definitely not a graph", Pos2::ZERO),
        Err(SurfaceError::Clipboard(ClipboardError::Parse(_)))
    ));
    assert_eq!(surface.context(root).unwrap().node_count(), 1);
}

#[test]
fn test_paste_undo_is_one_step() {
    let (mut surface, root, _source) = surface(GraphKind::Material);
    let value = spawn_float(&mut surface, root, (0.0, 0.0));
    let add = spawn_add(&mut surface, root, (200.0, 0.0));
    surface.connect(root, port(value, 0), port(add, 0)).unwrap();
    let pasted = surface.duplicate(root, &[value, add], None).unwrap();
    assert_eq!(surface.history().unwrap().undo_description(), Some("Paste"));

    surface.undo().unwrap();
    assert_eq!(surface.context(root).unwrap().node_count(), 2);

    surface.redo().unwrap();
    let ctx = surface.context(root).unwrap();
    assert_eq!(ctx.node_count(), 4);
    let (copy_value, copy_add) = (pasted.nodes[0], pasted.nodes[1]);
    assert_eq!(ctx.connections_of(port(copy_add, 0)), vec![port(copy_value, 0)]);
    assert_consistent(&surface);
}

#[test]
fn test_paste_across_surfaces_with_shared_clipboard() {
    init_tracing();
    let registry = ArchetypeRegistry::builtin().unwrap();
    let mut first = Surface::new(registry.clone(), GraphKind::Material);
    let root = first.load(&MemorySource::new("First")).unwrap();
    let value = spawn_float(&mut first, root, (0.0, 0.0));
    first.copy(root, &[value]).unwrap();
    let text = first.clipboard().get_text().unwrap();

    let mut second = Surface::new(registry, GraphKind::ParticleEmitter);
    let other = second.load(&MemorySource::new("Second")).unwrap();
    let pasted = second.paste_text(other, &text, Pos2::ZERO).unwrap();
    assert_eq!(pasted.nodes, vec![NodeId(1)]);
}

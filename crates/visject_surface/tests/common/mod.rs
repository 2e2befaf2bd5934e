// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for the surface integration tests.

#![allow(dead_code)]

use egui::Pos2;
use tracing_subscriber::EnvFilter;
use visject_surface::groups::{self, animation, constants, math};
use visject_surface::{
    ArchetypeRegistry, ContextId, GraphKind, MemorySource, NodeId, PortId, PortRef, Surface,
};

/// Route `tracing` output to the test harness; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Surface of the given kind with a loaded, empty root graph
pub fn surface(kind: GraphKind) -> (Surface, ContextId, MemorySource) {
    init_tracing();
    let registry = ArchetypeRegistry::builtin().unwrap();
    let mut surface = Surface::new(registry, kind);
    let source = MemorySource::new("Test Graph");
    let root = surface.load(&source).unwrap();
    surface.drain_events();
    (surface, root, source)
}

pub fn spawn(surface: &mut Surface, context: ContextId, group: u16, type_id: u16, at: (f32, f32)) -> NodeId {
    surface
        .spawn_node(context, group, type_id, Pos2::new(at.0, at.1), None)
        .unwrap()
        .unwrap()
}

pub fn spawn_float(surface: &mut Surface, context: ContextId, at: (f32, f32)) -> NodeId {
    spawn(surface, context, groups::CONSTANTS, constants::FLOAT, at)
}

pub fn spawn_add(surface: &mut Surface, context: ContextId, at: (f32, f32)) -> NodeId {
    spawn(surface, context, groups::MATH, math::ADD, at)
}

pub fn spawn_state_machine(surface: &mut Surface, context: ContextId, at: (f32, f32)) -> NodeId {
    spawn(surface, context, groups::ANIMATIONS, animation::STATE_MACHINE, at)
}

pub fn port(node: NodeId, port: u32) -> PortRef {
    PortRef::new(node, PortId(port))
}

/// Assert symmetry and single-port cardinality in every live context
pub fn assert_consistent(surface: &Surface) {
    for ctx in surface.contexts() {
        let problems = ctx.check_connections();
        assert!(problems.is_empty(), "context {:?}: {problems:?}", ctx.id());
    }
}

//! Edit Mode and Gizmo Tests
//!
//! Tests for:
//! - Toolbar toggling and orbit exclusion
//! - Gizmo gestures: translate, rotate, scale
//! - Programmatic edits

mod common;

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec2, Vec3};

use animsync::EditMode;
use animsync::editor::edit_mode::orbit_allowed;
use animsync::editor::{DragPointer, GizmoMode, GizmoTransform, PointerButton, Ray, TransformControls};
use animsync::scene::{Node, NodeHandle, Scene};

use common::*;

fn pointer(origin: Vec3, ndc: Vec2) -> DragPointer {
    DragPointer { ray: Ray::new(origin, Vec3::NEG_Z), ndc }
}

fn single_node() -> (Scene, NodeHandle) {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("part"));
    scene.update_matrix_world();
    (scene, node)
}

fn drag(mode: GizmoMode, scene: &mut Scene, node: NodeHandle, to: DragPointer) -> TransformControls {
    let mut gizmo = TransformControls::new();
    gizmo.set_mode(mode);
    gizmo.attach(node);
    let start = pointer(Vec3::new(0.0, 0.0, 5.0), Vec2::ZERO);
    assert!(gizmo.begin_drag(scene, start, Vec3::ZERO, Vec3::NEG_Z));
    assert!(gizmo.update_drag(scene, to));
    gizmo
}

// ============================================================================
// Orbit exclusion
// ============================================================================

#[test]
fn orbit_only_without_mode_or_drag() {
    assert!(orbit_allowed(EditMode::None, false));
    assert!(!orbit_allowed(EditMode::None, true));
    for mode in [EditMode::Translate, EditMode::Rotate, EditMode::Scale] {
        assert!(!orbit_allowed(mode, false));
        assert!(!orbit_allowed(mode, true));
    }
}

#[test]
fn toolbar_toggle_round_trip() {
    let mut session = new_session();
    assert!(session.orbit_enabled());

    session.toggle_edit_mode(EditMode::Rotate);
    assert_eq!(session.edit_mode(), EditMode::Rotate);
    assert!(!session.orbit_enabled());

    session.toggle_edit_mode(EditMode::Scale);
    assert_eq!(session.edit_mode(), EditMode::Scale);
    assert_eq!(session.viewport().gizmo.mode(), GizmoMode::Scale);

    session.toggle_edit_mode(EditMode::Scale);
    assert_eq!(session.edit_mode(), EditMode::None);
    assert!(session.orbit_enabled());
}

#[test]
fn edit_mode_without_model_has_no_target() {
    let mut session = new_session();
    session.set_edit_mode(EditMode::Translate);
    assert_eq!(session.gizmo_target(), None);
    assert!(!session.orbit_enabled());
}

#[test]
fn edit_mode_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&EditMode::Translate).unwrap(), "\"translate\"");
    let mode: EditMode = serde_json::from_str("\"none\"").unwrap();
    assert_eq!(mode, EditMode::None);
}

#[tokio::test]
async fn drag_in_translate_mode_blocks_orbit_until_release() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    session.set_edit_mode(EditMode::Translate);

    session.pointer_down(400.0, 300.0, PointerButton::Primary).unwrap();
    assert!(session.is_dragging());
    assert!(!session.orbit_enabled());

    session.pointer_up(PointerButton::Primary);
    assert!(!session.is_dragging());
    // Still in translate mode
    assert!(!session.orbit_enabled());
}

// ============================================================================
// Gestures
// ============================================================================

#[test]
fn rotate_drag_spins_about_view_axis() {
    let (mut scene, node) = single_node();
    // Half a screen width is a quarter turn
    drag(GizmoMode::Rotate, &mut scene, node, pointer(Vec3::new(0.0, 0.0, 5.0), Vec2::new(0.5, 0.0)));

    let rotation = scene.get_node(node).unwrap().transform.rotation;
    let expected = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
    assert!(rotation.angle_between(expected) < 1e-4);
}

#[test]
fn scale_drag_is_uniform_and_bounded() {
    let (mut scene, node) = single_node();
    drag(GizmoMode::Scale, &mut scene, node, pointer(Vec3::new(0.0, 0.0, 5.0), Vec2::new(0.0, 0.5)));
    let scale = scene.get_node(node).unwrap().transform.scale;
    assert!((scale - Vec3::splat(2.0)).length() < 1e-5);

    let (mut scene, node) = single_node();
    drag(GizmoMode::Scale, &mut scene, node, pointer(Vec3::new(0.0, 0.0, 5.0), Vec2::new(0.0, -1.0)));
    let scale = scene.get_node(node).unwrap().transform.scale;
    assert!(scale.min_element() > 0.0);
}

#[test]
fn drag_measures_from_gesture_start() {
    let (mut scene, node) = single_node();
    let mut gizmo = drag(
        GizmoMode::Translate,
        &mut scene,
        node,
        pointer(Vec3::new(2.0, 0.0, 5.0), Vec2::new(0.4, 0.0)),
    );
    // A second sample replaces the first rather than adding to it
    gizmo.update_drag(&mut scene, pointer(Vec3::new(1.0, 0.0, 5.0), Vec2::new(0.2, 0.0)));
    let position = scene.get_node(node).unwrap().transform.position;
    assert!((position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn translate_in_scaled_parent_space() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    scene.get_node_mut(parent).unwrap().transform.scale = Vec3::splat(0.5);
    let child = scene.add_to_parent(Node::new("child"), parent);
    scene.update_matrix_world();

    drag(GizmoMode::Translate, &mut scene, child, pointer(Vec3::new(1.0, 0.0, 5.0), Vec2::new(0.2, 0.0)));
    scene.update_matrix_world();

    assert!((scene.get_node(child).unwrap().transform.position.x - 2.0).abs() < 1e-5);
    let world = Vec3::from(scene.get_node(child).unwrap().world_matrix().translation);
    assert!((world - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn removed_node_ends_drag() {
    let (mut scene, node) = single_node();
    let mut gizmo = TransformControls::new();
    gizmo.attach(node);
    gizmo.begin_drag(&scene, pointer(Vec3::Z, Vec2::ZERO), Vec3::ZERO, Vec3::NEG_Z);
    scene.remove_node(node);

    assert!(!gizmo.update_drag(&mut scene, pointer(Vec3::X, Vec2::X)));
    assert!(!gizmo.is_dragging());
}

#[test]
fn programmatic_rotation_and_scale() {
    let (mut scene, node) = single_node();
    let quarter = Quat::from_rotation_y(FRAC_PI_2);
    assert!(TransformControls::apply(&mut scene, node, GizmoTransform::Rotation(quarter)));
    assert!(TransformControls::apply(&mut scene, node, GizmoTransform::Scale(Vec3::new(2.0, 1.0, 1.0))));

    let transform = &scene.get_node(node).unwrap().transform;
    assert!(transform.rotation.angle_between(quarter) < 1e-5);
    assert_eq!(transform.scale, Vec3::new(2.0, 1.0, 1.0));
}

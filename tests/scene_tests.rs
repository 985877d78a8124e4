//! Scene Graph Tests
//!
//! Tests for:
//! - Hierarchy building and reparenting
//! - Subtree removal and component release
//! - World matrices and bounds
//! - Model normalization

mod common;

use glam::Vec3;

use animsync::assets::normalize_model;
use animsync::resources::{Material, Mesh, Texture, create_box};
use animsync::scene::{Node, Scene};

use common::*;

fn unit_box(name: &str) -> Mesh {
    Mesh::new(name, create_box(1.0, 1.0, 1.0), Material::new_standard(Vec3::ONE))
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn attach_moves_between_parents() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_node(Node::new("b"));
    let child = scene.add_to_parent(Node::new("child"), a);

    scene.attach(child, b);
    assert!(scene.get_node(a).unwrap().children().is_empty());
    assert_eq!(scene.get_node(b).unwrap().children(), &[child]);
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(b));
}

#[test]
fn attaching_root_node_leaves_root_list() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_node(Node::new("b"));
    scene.attach(b, a);
    assert_eq!(scene.root_nodes, vec![a]);
}

#[test]
fn cycles_are_rejected() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_to_parent(Node::new("b"), a);
    let c = scene.add_to_parent(Node::new("c"), b);

    scene.attach(a, c);
    scene.attach(a, a);
    assert_eq!(scene.get_node(a).unwrap().parent(), None);
    assert_eq!(scene.collect_subtree(a), vec![a, b, c]);
}

#[test]
fn visibility_is_inherited() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_to_parent(Node::new("b"), a);
    assert!(scene.is_visible_in_hierarchy(b));
    scene.get_node_mut(a).unwrap().visible = false;
    assert!(!scene.is_visible_in_hierarchy(b));
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn removing_subtree_releases_components() {
    let mut scene = Scene::new();
    let group = scene.add_node(Node::new("group"));
    let mesh = scene.add_mesh_to_parent(unit_box("box"), group);
    let keep = scene.add_mesh(unit_box("keep"));

    scene.remove_node(group);
    assert!(!scene.contains(group));
    assert!(!scene.contains(mesh));
    assert!(scene.contains(keep));
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.root_nodes, vec![keep]);
}

#[test]
fn removing_subtree_releases_unshared_textures() {
    let mut scene = Scene::new();
    let shared = scene.add_texture(Texture::new(None, "image/png", vec![1]));
    let own = scene.add_texture(Texture::new(None, "image/png", vec![2]));

    let mut removed = unit_box("removed");
    removed.materials[0].maps.map = Some(shared);
    removed.materials[0].maps.normal_map = Some(own);
    let removed = scene.add_mesh(removed);

    let mut kept = unit_box("kept");
    kept.materials[0].maps.map = Some(shared);
    scene.add_mesh(kept);

    scene.remove_node(removed);
    assert!(scene.textures.contains_key(shared));
    assert!(!scene.textures.contains_key(own));
}

#[test]
fn removing_camera_clears_active_camera() {
    let mut scene = Scene::new();
    let camera = scene.add_camera(animsync::scene::Camera::new_perspective(75.0, 1.0, 0.1, 100.0));
    scene.active_camera = Some(camera);
    scene.remove_node(camera);
    assert!(scene.active_camera.is_none());
    assert!(scene.main_camera().is_none());
}

// ============================================================================
// Matrices and bounds
// ============================================================================

#[test]
fn world_matrix_composes_parents() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_mesh_to_parent(unit_box("child"), parent);
    scene.get_node_mut(parent).unwrap().transform.position = Vec3::new(10.0, 0.0, 0.0);
    scene.get_node_mut(parent).unwrap().transform.scale = Vec3::splat(2.0);
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(1.0, 0.0, 0.0);
    scene.update_matrix_world();

    let world = Vec3::from(scene.get_node(child).unwrap().world_matrix().translation);
    assert!((world - Vec3::new(12.0, 0.0, 0.0)).length() < 1e-5);

    let bbox = scene.get_bbox_of_node(parent).unwrap();
    assert!((bbox.min - Vec3::new(11.0, -1.0, -1.0)).length() < 1e-5);
    assert!((bbox.max - Vec3::new(13.0, 1.0, 1.0)).length() < 1e-5);
}

#[test]
fn empty_group_has_no_bounds() {
    let mut scene = Scene::new();
    let group = scene.add_node(Node::new("group"));
    scene.add_to_parent(Node::new("empty"), group);
    scene.update_matrix_world();
    assert!(scene.get_bbox_of_node(group).is_none());
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn normalization_centers_and_scales() {
    let (mut scene, root) = fixture_scene();
    let scale = normalize_model(&mut scene, root, 5.0).unwrap();
    assert!((scale - 0.025).abs() < 1e-6);

    let bbox = scene.get_bbox_of_node(root).unwrap();
    assert!((bbox.max_dimension() - 5.0).abs() < 1e-4);
    assert!(bbox.center().length() < 1e-4);
}

#[test]
fn normalization_is_repeatable() {
    let (mut scene, root) = fixture_scene();
    normalize_model(&mut scene, root, 5.0);
    let first = scene.get_bbox_of_node(root).unwrap();
    normalize_model(&mut scene, root, 5.0);
    let second = scene.get_bbox_of_node(root).unwrap();
    assert!((first.min - second.min).length() < 1e-4);
    assert!((first.max - second.max).length() < 1e-4);
}

#[test]
fn geometry_free_model_is_left_alone() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("empty"));
    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(3.0, 0.0, 0.0);
    assert!(normalize_model(&mut scene, root, 5.0).is_none());
}

#[test]
fn flat_model_is_centered_without_blowup() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("point"));
    let degenerate = Mesh::new("dot", create_box(0.0, 0.0, 0.0), Material::new_standard(Vec3::ONE));
    let dot = scene.add_mesh_to_parent(degenerate, root);
    scene.get_node_mut(dot).unwrap().transform.position = Vec3::new(4.0, 0.0, 0.0);

    assert_eq!(normalize_model(&mut scene, root, 5.0), Some(1.0));
    let bbox = scene.get_bbox_of_node(root).unwrap();
    assert!(bbox.center().length() < 1e-5);
}

//! Picking Tests
//!
//! Tests for:
//! - Ray construction from surface pixels
//! - Nearest-first ordering with one entry per node
//! - Hidden nodes and hidden materials are not pickable

mod common;

use glam::Vec3;

use animsync::editor::Raycaster;
use animsync::resources::{Material, Mesh, create_box};
use animsync::scene::camera::Camera;
use animsync::scene::{Node, NodeHandle, Scene};

/// Camera at z = 10 looking down -Z into a 100x100 surface.
fn scene_with_camera() -> Scene {
    let mut scene = Scene::new();
    let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    camera.set_viewport_size(100, 100);
    let camera_node = scene.add_camera(camera);
    scene.active_camera = Some(camera_node);
    let node = scene.get_node_mut(camera_node).unwrap();
    node.transform.position = Vec3::new(0.0, 0.0, 10.0);
    node.transform.look_at(Vec3::ZERO, Vec3::Y);
    scene
}

fn add_cube(scene: &mut Scene, name: &str, z: f32) -> NodeHandle {
    let material = Material::new_standard(Vec3::ONE).with_name(name);
    let handle = scene.add_mesh(Mesh::new(name, create_box(1.0, 1.0, 1.0), material));
    scene.get_node_mut(handle).unwrap().transform.position = Vec3::new(0.0, 0.0, z);
    handle
}

fn center_ray(scene: &mut Scene) -> Raycaster {
    scene.update_matrix_world();
    let mut raycaster = Raycaster::new();
    raycaster.set_viewport_size(100, 100);
    let ndc = raycaster.set_mouse_position(50.0, 50.0).unwrap();
    assert!(ndc.length() < 1e-6);
    raycaster.set_from_camera(scene.main_camera());
    raycaster
}

#[test]
fn pixel_to_ndc() {
    let mut raycaster = Raycaster::new();
    raycaster.set_viewport_size(200, 100);
    let ndc = raycaster.set_mouse_position(0.0, 0.0).unwrap();
    assert_eq!(ndc, glam::Vec2::new(-1.0, 1.0));
    let ndc = raycaster.set_mouse_position(200.0, 100.0).unwrap();
    assert_eq!(ndc, glam::Vec2::new(1.0, -1.0));
}

#[test]
fn zero_sized_viewport_has_no_ray() {
    let mut scene = scene_with_camera();
    let mut raycaster = Raycaster::new();
    assert!(raycaster.set_mouse_position(10.0, 10.0).is_none());
    raycaster.set_from_camera(scene.main_camera());
    assert!(raycaster.ray().is_none());
    let cube = add_cube(&mut scene, "cube", 0.0);
    assert!(raycaster.intersect_objects(&scene, &[cube]).is_empty());
}

#[test]
fn nearest_hit_comes_first() {
    let mut scene = scene_with_camera();
    let far = add_cube(&mut scene, "far", -3.0);
    let near = add_cube(&mut scene, "near", 2.0);
    let raycaster = center_ray(&mut scene);

    let hits = raycaster.intersect_objects(&scene, &scene.root_nodes);
    let order: Vec<_> = hits.iter().map(|h| h.node).collect();
    assert_eq!(order, vec![near, far]);
    // Front face of the near cube sits at z = 2.5
    assert!((hits[0].distance - 7.5).abs() < 1e-3);
    assert!((hits[0].point - Vec3::new(0.0, 0.0, 2.5)).length() < 1e-3);
}

#[test]
fn children_are_searched() {
    let mut scene = scene_with_camera();
    let group = scene.add_node(Node::new("group"));
    let material = Material::new_standard(Vec3::ONE);
    let child = scene.add_mesh_to_parent(Mesh::new("child", create_box(1.0, 1.0, 1.0), material), group);
    scene.get_node_mut(group).unwrap().transform.scale = Vec3::splat(2.0);
    let raycaster = center_ray(&mut scene);

    let hits = raycaster.intersect_objects(&scene, &[group]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].node, child);
    // Scaled parent doubles the box: front face at z = 1
    assert!((hits[0].distance - 9.0).abs() < 1e-3);
}

#[test]
fn hidden_node_is_skipped() {
    let mut scene = scene_with_camera();
    let front = add_cube(&mut scene, "front", 2.0);
    let back = add_cube(&mut scene, "back", -2.0);
    scene.get_node_mut(front).unwrap().visible = false;
    let raycaster = center_ray(&mut scene);

    let hits = raycaster.intersect_objects(&scene, &scene.root_nodes);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].node, back);
}

#[test]
fn hidden_parent_hides_children() {
    let mut scene = scene_with_camera();
    let group = scene.add_node(Node::new("group"));
    let material = Material::new_standard(Vec3::ONE);
    scene.add_mesh_to_parent(Mesh::new("child", create_box(1.0, 1.0, 1.0), material), group);
    scene.get_node_mut(group).unwrap().visible = false;
    let raycaster = center_ray(&mut scene);

    assert!(raycaster.intersect_objects(&scene, &[group]).is_empty());
}

#[test]
fn hidden_material_is_skipped() {
    let mut scene = scene_with_camera();
    let front = add_cube(&mut scene, "front", 2.0);
    let back = add_cube(&mut scene, "back", -2.0);
    let key = scene.get_node(front).unwrap().mesh().unwrap();
    scene.meshes[key].materials[0].visible = false;
    let raycaster = center_ray(&mut scene);

    let hits = raycaster.intersect_objects(&scene, &scene.root_nodes);
    assert_eq!(hits.iter().map(|h| h.node).collect::<Vec<_>>(), vec![back]);
}

#[test]
fn no_camera_no_hits() {
    let mut scene = Scene::new();
    let cube = add_cube(&mut scene, "cube", 0.0);
    let raycaster = center_ray(&mut scene);
    assert!(raycaster.ray().is_none());
    assert!(raycaster.intersect_objects(&scene, &[cube]).is_empty());
}

#[test]
fn ray_misses_off_axis_cube() {
    let mut scene = scene_with_camera();
    let cube = add_cube(&mut scene, "cube", 0.0);
    scene.get_node_mut(cube).unwrap().transform.position.x = 5.0;
    let raycaster = center_ray(&mut scene);
    assert!(raycaster.intersect_objects(&scene, &[cube]).is_empty());
}

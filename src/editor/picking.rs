//! Pointer picking.
//!
//! [`Raycaster`] keeps the last normalized pointer position and the ray
//! built from it. Every failure mode (no viewport size yet, no camera, no
//! ray) degrades to "nothing hit" so a pointer handler can call it blindly.

use glam::{Affine3A, Vec2, Vec3};

use crate::resources::BoundingBox;
use crate::scene::camera::Camera;
use crate::scene::node::NodeKind;
use crate::scene::{NodeHandle, Scene};

/// Half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test. Returns the entry distance (0 when starting inside).
    #[must_use]
    pub fn intersect_aabb(&self, bbox: &BoundingBox) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (bbox.min - self.origin) * inv;
        let t2 = (bbox.max - self.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_far < 0.0 || t_near > t_far || t_near.is_nan() || t_far.is_nan() {
            return None;
        }
        Some(t_near.max(0.0))
    }

    /// Möller–Trumbore, double sided. Returns the hit distance.
    #[must_use]
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        let edge1 = b - a;
        let edge2 = c - a;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = inv_det * edge2.dot(q);
        (t > EPSILON).then_some(t)
    }
}

/// One picked node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeHandle,
    /// World-space distance from the ray origin.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// Index of the hit primitive within the node's mesh.
    pub primitive: usize,
}

#[derive(Debug, Clone)]
pub struct Raycaster {
    viewport: Vec2,
    mouse: Option<Vec2>,
    ray: Option<Ray>,
    pub near: f32,
    pub far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Raycaster {
    #[must_use]
    pub fn new() -> Self {
        Self {
            viewport: Vec2::ZERO,
            mouse: None,
            ray: None,
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width as f32, height as f32);
    }

    /// Normalizes surface pixel coordinates into `[-1, 1]²`, y up.
    ///
    /// Returns the normalized position, or `None` while the viewport has
    /// no area.
    pub fn set_mouse_position(&mut self, client_x: f32, client_y: f32) -> Option<Vec2> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            self.mouse = None;
            return None;
        }
        let ndc = Vec2::new(
            (client_x / self.viewport.x) * 2.0 - 1.0,
            -(client_y / self.viewport.y) * 2.0 + 1.0,
        );
        self.mouse = Some(ndc);
        self.mouse
    }

    #[inline]
    #[must_use]
    pub fn mouse(&self) -> Option<Vec2> {
        self.mouse
    }

    /// Builds the pick ray through the current pointer position.
    ///
    /// Without a camera or a pointer position the ray is cleared.
    pub fn set_from_camera(&mut self, camera: Option<&Camera>) {
        self.ray = match (camera, self.mouse) {
            (Some(camera), Some(mouse)) => camera.ray_from_ndc(mouse.x, mouse.y),
            _ => None,
        };
    }

    #[inline]
    #[must_use]
    pub fn ray(&self) -> Option<Ray> {
        self.ray
    }

    /// Intersects the current ray with `candidates` and their descendants.
    ///
    /// Only visible mesh nodes are tested, and only primitives whose
    /// material is visible. One entry per node, nearest first.
    #[must_use]
    pub fn intersect_objects(&self, scene: &Scene, candidates: &[NodeHandle]) -> Vec<Intersection> {
        let Some(ray) = self.ray else {
            return Vec::new();
        };

        let mut hits: Vec<Intersection> = candidates
            .iter()
            .flat_map(|&root| scene.collect_subtree(root))
            .filter(|&handle| scene.is_visible_in_hierarchy(handle))
            .filter_map(|handle| self.intersect_node(scene, handle, &ray))
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.dedup_by_key(|h| h.node);
        hits
    }

    fn intersect_node(&self, scene: &Scene, handle: NodeHandle, ray: &Ray) -> Option<Intersection> {
        let node = scene.get_node(handle)?;
        let NodeKind::Mesh(key) = node.kind else {
            return None;
        };
        let mesh = scene.meshes.get(key)?;
        let world = *node.world_matrix();
        if world.matrix3.determinant().abs() < f32::EPSILON {
            return None;
        }
        let inverse = world.inverse();

        // Unnormalized local direction keeps `t` proportional to world distance
        let local_origin = inverse.transform_point3(ray.origin);
        let local_dir = inverse.transform_vector3(ray.direction);
        let local_ray = Ray { origin: local_origin, direction: local_dir };

        if let Some(bbox) = mesh.local_bounding_box()
            && local_ray.intersect_aabb(&bbox).is_none()
        {
            return None;
        }

        let mut best: Option<(f32, usize)> = None;
        for (index, primitive) in mesh.primitives.iter().enumerate() {
            if !mesh.material_of(primitive).is_some_and(|m| m.visible) {
                continue;
            }
            for [a, b, c] in primitive.geometry.triangles() {
                if let Some(t) = local_ray.intersect_triangle(a, b, c)
                    && best.is_none_or(|(bt, _)| t < bt)
                {
                    best = Some((t, index));
                }
            }
        }

        let (t, primitive) = best?;
        let point = world_point(&world, local_ray.at(t));
        let distance = (point - ray.origin).length();
        (distance >= self.near && distance <= self.far).then_some(Intersection {
            node: handle,
            distance,
            point,
            primitive,
        })
    }
}

#[inline]
fn world_point(world: &Affine3A, local: Vec3) -> Vec3 {
    world.transform_point3(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_normalization_inverts_y() {
        let mut raycaster = Raycaster::new();
        raycaster.set_viewport_size(800, 600);
        assert_eq!(raycaster.set_mouse_position(0.0, 0.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(raycaster.set_mouse_position(800.0, 600.0), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(raycaster.set_mouse_position(400.0, 300.0), Some(Vec2::ZERO));
    }

    #[test]
    fn zero_viewport_yields_no_mouse() {
        let mut raycaster = Raycaster::new();
        assert_eq!(raycaster.set_mouse_position(10.0, 10.0), None);
        raycaster.set_from_camera(Some(&Camera::new_perspective(75.0, 1.0, 0.1, 100.0)));
        assert!(raycaster.ray().is_none());
    }

    #[test]
    fn triangle_hit_and_miss() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let (a, b, c) = (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!((ray.intersect_triangle(a, b, c).unwrap() - 5.0).abs() < 1e-5);
        // Back face is still hit
        assert!(ray.intersect_triangle(a, c, b).is_some());

        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(miss.intersect_triangle(a, b, c).is_none());
        let behind = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Z);
        assert!(behind.intersect_triangle(a, b, c).is_none());
    }

    #[test]
    fn aabb_slab() {
        let bbox = BoundingBox { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(ray.intersect_aabb(&bbox), Some(4.0));
        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(inside.intersect_aabb(&bbox), Some(0.0));
        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(away.intersect_aabb(&bbox), None);
    }
}

//! Transform gizmo.
//!
//! [`TransformControls`] is bound to at most one node. A drag gesture
//! captures the node's transform at pointer-down and derives the new
//! transform from the pointer's travel since then, so pointer jitter never
//! accumulates error.

use std::f32::consts::PI;

use glam::{Affine3A, Quat, Vec2, Vec3};

use crate::editor::picking::Ray;
use crate::scene::{NodeHandle, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoMode {
    Translate,
    Rotate,
    Scale,
}

/// A programmatic edit, expressed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GizmoTransform {
    Translation(Vec3),
    Rotation(Quat),
    /// Multiplies the current local scale component-wise.
    Scale(Vec3),
}

/// Pointer sample fed to the gizmo during a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPointer {
    pub ray: Ray,
    /// Normalized device coordinates of the pointer.
    pub ndc: Vec2,
}

#[derive(Debug, Clone)]
struct DragState {
    node: NodeHandle,
    mode: GizmoMode,
    start_ndc: Vec2,
    start_hit: Vec3,
    /// Drag plane normal, facing the camera.
    view_axis: Vec3,
    start_position: Vec3,
    start_rotation: Quat,
    start_scale: Vec3,
    parent_world_inverse: Affine3A,
}

pub struct TransformControls {
    mode: GizmoMode,
    attached: Option<NodeHandle>,
    drag: Option<DragState>,
    /// On-screen handle size multiplier for the backend.
    pub size: f32,
    disposed: bool,
}

impl Default for TransformControls {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformControls {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: GizmoMode::Translate,
            attached: None,
            drag: None,
            size: 1.0,
            disposed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GizmoMode) {
        if self.mode != mode {
            self.end_drag();
            self.mode = mode;
        }
    }

    #[inline]
    #[must_use]
    pub fn attached(&self) -> Option<NodeHandle> {
        self.attached
    }

    pub fn attach(&mut self, node: NodeHandle) {
        if self.disposed {
            return;
        }
        if self.attached != Some(node) {
            self.end_drag();
            log::debug!("Gizmo attached to {node:?}");
        }
        self.attached = Some(node);
    }

    pub fn detach(&mut self) {
        self.end_drag();
        if self.attached.take().is_some() {
            log::debug!("Gizmo detached");
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a gesture on the attached node.
    ///
    /// `hit_point` is where the pointer touched the node and `view_dir` is
    /// the camera's forward vector. Returns whether a drag started.
    pub fn begin_drag(&mut self, scene: &Scene, pointer: DragPointer, hit_point: Vec3, view_dir: Vec3) -> bool {
        let Some(handle) = self.attached else {
            return false;
        };
        let Some(node) = scene.get_node(handle) else {
            self.attached = None;
            return false;
        };

        let parent_world = node
            .parent()
            .and_then(|p| scene.get_node(p))
            .map_or(Affine3A::IDENTITY, |p| *p.world_matrix());

        self.drag = Some(DragState {
            node: handle,
            mode: self.mode,
            start_ndc: pointer.ndc,
            start_hit: hit_point,
            view_axis: -view_dir.normalize_or_zero(),
            start_position: node.transform.position,
            start_rotation: node.transform.rotation,
            start_scale: node.transform.scale,
            parent_world_inverse: parent_world.inverse(),
        });
        log::trace!("Gizmo drag started ({:?})", self.mode);
        true
    }

    /// Applies the pointer's travel since [`begin_drag`](Self::begin_drag).
    ///
    /// Returns whether the node's transform changed.
    pub fn update_drag(&mut self, scene: &mut Scene, pointer: DragPointer) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let Some(node) = scene.get_node_mut(drag.node) else {
            self.drag = None;
            return false;
        };
        let transform = &mut node.transform;

        match drag.mode {
            GizmoMode::Translate => {
                let denom = pointer.ray.direction.dot(drag.view_axis);
                if denom.abs() < 1e-6 {
                    return false;
                }
                let t = (drag.start_hit - pointer.ray.origin).dot(drag.view_axis) / denom;
                if t < 0.0 {
                    return false;
                }
                let world_delta = pointer.ray.at(t) - drag.start_hit;
                let local_delta = drag.parent_world_inverse.transform_vector3(world_delta);
                transform.position = drag.start_position + local_delta;
            }
            GizmoMode::Rotate => {
                let angle = (pointer.ndc.x - drag.start_ndc.x) * PI;
                let axis = drag
                    .parent_world_inverse
                    .transform_vector3(drag.view_axis)
                    .normalize_or_zero();
                if axis == Vec3::ZERO {
                    return false;
                }
                transform.rotation = (Quat::from_axis_angle(axis, angle) * drag.start_rotation).normalize();
            }
            GizmoMode::Scale => {
                let factor = (1.0 + (pointer.ndc.y - drag.start_ndc.y) * 2.0).max(0.01);
                transform.scale = drag.start_scale * factor;
            }
        }
        true
    }

    /// Ends the gesture. Returns whether one was active.
    pub fn end_drag(&mut self) -> bool {
        let was_dragging = self.drag.take().is_some();
        if was_dragging {
            log::trace!("Gizmo drag ended");
        }
        was_dragging
    }

    /// Applies a world-space edit to `node`.
    pub fn apply(scene: &mut Scene, node: NodeHandle, edit: GizmoTransform) -> bool {
        let parent_world = scene
            .get_node(node)
            .and_then(|n| n.parent())
            .and_then(|p| scene.get_node(p))
            .map_or(Affine3A::IDENTITY, |p| *p.world_matrix());
        let Some(target) = scene.get_node_mut(node) else {
            return false;
        };
        let transform = &mut target.transform;
        match edit {
            GizmoTransform::Translation(delta) => {
                transform.position += parent_world.inverse().transform_vector3(delta);
            }
            GizmoTransform::Rotation(rotation) => {
                let (_, parent_rotation, _) = parent_world.to_scale_rotation_translation();
                let local = parent_rotation.inverse() * rotation * parent_rotation;
                transform.rotation = (local * transform.rotation).normalize();
            }
            GizmoTransform::Scale(factor) => {
                transform.scale *= factor;
            }
        }
        true
    }

    /// Releases the gizmo. Further attaches are ignored.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.detach();
            self.disposed = true;
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

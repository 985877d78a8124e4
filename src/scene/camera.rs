use glam::{Affine3A, Mat4, Vec3};

use crate::editor::picking::Ray;

/// Perspective camera component.
///
/// The camera node's world matrix is pushed in through
/// [`Camera::update_view_projection`] after each hierarchy update.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    /// Sets the aspect ratio from a surface size and rebuilds the projection.
    ///
    /// A zero-height surface keeps the previous aspect.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh maps depth to [0, 1]
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    /// Unit vector the camera looks along (-Z in camera space).
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.world_matrix.transform_vector3(-Vec3::Z).normalize_or_zero()
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Builds a world-space ray through a point in normalized device
    /// coordinates. Returns `None` when the projection is degenerate.
    #[must_use]
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inverse = self.view_projection_matrix.inverse();
        if !inverse.is_finite() {
            return None;
        }
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }
        Some(Ray::new(self.position(), direction))
    }
}

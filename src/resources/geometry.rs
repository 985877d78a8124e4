use glam::{Affine3A, Vec2, Vec3};
use uuid::Uuid;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Smallest box enclosing `points`, or `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest edge.
    #[must_use]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Box enclosing the eight transformed corners.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);
        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self { min: new_min, max: new_max }
    }
}

/// CPU-side triangle geometry.
///
/// Only the attributes the editor needs to pick, normalize and re-export a
/// model are kept. `indices` is `None` for non-indexed triangle soups.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub uuid: Uuid,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Option<Vec<u32>>,
    bounding_box: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(positions: Vec<Vec3>) -> Self {
        let bounding_box = BoundingBox::from_points(positions.iter().copied());
        Self {
            uuid: Uuid::new_v4(),
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: None,
            bounding_box,
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Local-space bounds, `None` for empty geometry.
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangles in local space. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let count = self
            .indices
            .as_ref()
            .map_or(self.positions.len(), Vec::len)
            / 3;
        (0..count).filter_map(move |tri| {
            let corner = |k: usize| -> Option<Vec3> {
                let i = tri * 3 + k;
                let vertex = match &self.indices {
                    Some(indices) => *indices.get(i)? as usize,
                    None => i,
                };
                self.positions.get(vertex).copied()
            };
            Some([corner(0)?, corner(1)?, corner(2)?])
        })
    }
}

// ============================================================================
// Primitives
// ============================================================================

/// Axis-aligned box centred on the origin, 24 vertices with per-face normals.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let w = width / 2.0;
    let h = height / 2.0;
    let d = depth / 2.0;

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (Vec3::Z, [Vec3::new(-w, -h, d), Vec3::new(w, -h, d), Vec3::new(w, h, d), Vec3::new(-w, h, d)]),
        (Vec3::NEG_Z, [Vec3::new(-w, -h, -d), Vec3::new(-w, h, -d), Vec3::new(w, h, -d), Vec3::new(w, -h, -d)]),
        (Vec3::Y, [Vec3::new(-w, h, -d), Vec3::new(-w, h, d), Vec3::new(w, h, d), Vec3::new(w, h, -d)]),
        (Vec3::NEG_Y, [Vec3::new(-w, -h, -d), Vec3::new(w, -h, -d), Vec3::new(w, -h, d), Vec3::new(-w, -h, d)]),
        (Vec3::X, [Vec3::new(w, -h, -d), Vec3::new(w, h, -d), Vec3::new(w, h, d), Vec3::new(w, -h, d)]),
        (Vec3::NEG_X, [Vec3::new(-w, -h, -d), Vec3::new(-w, -h, d), Vec3::new(-w, h, d), Vec3::new(-w, h, -d)]),
    ];
    let face_uvs = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0)];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    for (normal, corners) in faces {
        positions.extend(corners);
        normals.extend([normal; 4]);
        uvs.extend(face_uvs);
    }

    let indices: Vec<u32> = (0..6)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    Geometry::new(positions)
        .with_normals(normals)
        .with_uvs(uvs)
        .with_indices(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_bounds_match_dimensions() {
        let geo = create_box(2.0, 4.0, 6.0);
        let bbox = geo.bounding_box().unwrap();
        assert_eq!(bbox.size(), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(bbox.center(), Vec3::ZERO);
        assert_eq!(geo.triangles().count(), 12);
    }

    #[test]
    fn transformed_bounds_enclose_rotated_corners() {
        let bbox = BoundingBox { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
        let rotated = bbox.transform(&Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_4));
        assert!((rotated.max.x - 2f32.sqrt()).abs() < 1e-5);
        assert!((rotated.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert!(Geometry::new(Vec::new()).bounding_box().is_none());
    }
}

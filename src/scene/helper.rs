//! Editor overlay helpers (grid, axes).

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperKind {
    Grid,
    Axes,
}

/// Line-based overlay geometry description. The backend decides how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    pub kind: HelperKind,
    pub size: f32,
    pub divisions: u32,
    pub center_color: Vec3,
    pub line_color: Vec3,
}

impl Helper {
    /// Square grid on the XZ plane, `size` wide with `divisions` cells per side.
    #[must_use]
    pub fn grid(size: f32, divisions: u32) -> Self {
        Self {
            kind: HelperKind::Grid,
            size,
            divisions: divisions.max(1),
            center_color: Vec3::splat(0x44 as f32 / 255.0),
            line_color: Vec3::splat(0x88 as f32 / 255.0),
        }
    }

    /// Red/green/blue X/Y/Z axis lines of length `size`.
    #[must_use]
    pub fn axes(size: f32) -> Self {
        Self {
            kind: HelperKind::Axes,
            size,
            divisions: 1,
            center_color: Vec3::ONE,
            line_color: Vec3::ONE,
        }
    }

    /// Line segment endpoints in local space.
    #[must_use]
    pub fn line_segments(&self) -> Vec<[Vec3; 2]> {
        match self.kind {
            HelperKind::Axes => vec![
                [Vec3::ZERO, Vec3::X * self.size],
                [Vec3::ZERO, Vec3::Y * self.size],
                [Vec3::ZERO, Vec3::Z * self.size],
            ],
            HelperKind::Grid => {
                let half = self.size / 2.0;
                let step = self.size / self.divisions as f32;
                let mut lines = Vec::with_capacity((self.divisions as usize + 1) * 2);
                for i in 0..=self.divisions {
                    let k = -half + i as f32 * step;
                    lines.push([Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)]);
                    lines.push([Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)]);
                }
                lines
            }
        }
    }
}

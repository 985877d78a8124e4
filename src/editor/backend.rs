//! Platform-independent rendering seams.
//!
//! The editor core never talks to a GPU API directly. A host supplies a
//! [`MountSurface`] (the DOM element, native window, or offscreen target the
//! picture ends up in) and a [`RenderBackend`] that draws a [`FrameContext`]
//! into it. [`HeadlessBackend`] and [`HeadlessMount`] record calls instead
//! of drawing and are used by tests and offline tools.

use glam::Vec2;

use crate::config::OutlineSettings;
use crate::scene::camera::Camera;
use crate::scene::{NodeHandle, Scene};

/// The host element the draw surface is attached to.
pub trait MountSurface {
    /// Client area in physical pixels.
    fn client_size(&self) -> Vec2;

    /// Attaches the backend's draw surface as a child of the mount point.
    fn attach_surface(&mut self);

    /// Detaches the draw surface. Called once at teardown.
    fn detach_surface(&mut self);

    /// Whether the draw surface is currently a child of the mount point.
    fn contains_surface(&self) -> bool;
}

/// Everything a backend needs for one frame.
pub struct FrameContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    /// Nodes to draw with an edge highlight.
    pub outlined: &'a [NodeHandle],
    pub outline: &'a OutlineSettings,
    /// Node the transform gizmo is attached to.
    pub gizmo_target: Option<NodeHandle>,
}

pub trait RenderBackend {
    /// Resizes the draw buffer. Zero sizes are ignored.
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, frame: &FrameContext<'_>);

    /// Releases GPU resources. Called exactly once.
    fn dispose(&mut self);
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn set_size(&mut self, width: u32, height: u32) {
        (**self).set_size(width, height);
    }

    fn render(&mut self, frame: &FrameContext<'_>) {
        (**self).render(frame);
    }

    fn dispose(&mut self) {
        (**self).dispose();
    }
}

// ============================================================================
// Headless implementations
// ============================================================================

/// Backend that counts frames and remembers the last frame's inputs.
#[derive(Debug, Default, Clone)]
pub struct HeadlessBackend {
    pub width: u32,
    pub height: u32,
    pub frames_rendered: u64,
    pub dispose_calls: u32,
    /// Visible mesh nodes in the last rendered frame.
    pub last_drawn_meshes: usize,
    pub last_outlined: Vec<NodeHandle>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for HeadlessBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
    }

    fn render(&mut self, frame: &FrameContext<'_>) {
        self.frames_rendered += 1;
        self.last_drawn_meshes = frame
            .scene
            .reachable_nodes()
            .into_iter()
            .filter(|&h| frame.scene.mesh_of(h).is_some() && frame.scene.is_visible_in_hierarchy(h))
            .count();
        self.last_outlined = frame.outlined.to_vec();
    }

    fn dispose(&mut self) {
        self.dispose_calls += 1;
        log::debug!("Headless backend disposed after {} frame(s)", self.frames_rendered);
    }
}

/// Mount point with a fixed client size.
#[derive(Debug, Clone)]
pub struct HeadlessMount {
    size: Vec2,
    attached: bool,
    pub detach_calls: u32,
}

impl HeadlessMount {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Vec2::new(width as f32, height as f32),
            attached: false,
            detach_calls: 0,
        }
    }
}

impl MountSurface for HeadlessMount {
    fn client_size(&self) -> Vec2 {
        self.size
    }

    fn attach_surface(&mut self) {
        self.attached = true;
    }

    fn detach_surface(&mut self) {
        self.attached = false;
        self.detach_calls += 1;
    }

    fn contains_surface(&self) -> bool {
        self.attached
    }
}

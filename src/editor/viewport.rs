//! Scene, camera, controls and render loop of one mounted editor.

use glam::Vec3;
use url::Url;

use crate::config::{EditorSettings, OutlineSettings};
use crate::editor::backend::{FrameContext, MountSurface, RenderBackend};
use crate::editor::gizmo::TransformControls;
use crate::editor::input::Input;
use crate::editor::material_sync::hex_to_rgb;
use crate::editor::orbit::OrbitControls;
use crate::editor::render_loop::RenderLoop;
use crate::errors::{EditorError, Result};
use crate::scene::camera::Camera;
use crate::scene::environment::EnvironmentMap;
use crate::scene::helper::Helper;
use crate::scene::light::Light;
use crate::scene::{NodeHandle, Scene};

/// Surface size used until the mount point reports a real one.
const FALLBACK_SIZE: (u32, u32) = (1, 1);

pub struct Viewport<B: RenderBackend, M: MountSurface> {
    pub scene: Scene,
    pub orbit: OrbitControls,
    pub gizmo: TransformControls,
    camera_node: NodeHandle,
    helpers: Vec<NodeHandle>,
    show_helpers: bool,
    environment_uri: Option<String>,
    backend: B,
    mount: Option<M>,
    render_loop: RenderLoop,
    size: (u32, u32),
    mounted: bool,
}

impl<B: RenderBackend, M: MountSurface> Viewport<B, M> {
    /// Builds the default scene and starts the render loop.
    ///
    /// Without a mount point the viewport still works, headless, at a 1x1 size.
    pub fn mount(settings: &EditorSettings, mut backend: B, mut mount: Option<M>) -> Self {
        let size = mount
            .as_ref()
            .map(|m| m.client_size())
            .filter(|s| s.x >= 1.0 && s.y >= 1.0)
            .map_or(FALLBACK_SIZE, |s| (s.x as u32, s.y as u32));

        let mut scene = Scene::new();
        scene.background = hex_to_rgb(settings.background);

        scene.add_light(Light::new_ambient(hex_to_rgb(0x0040_4040), 1.0));
        let sun = scene.add_light(Light::new_directional(hex_to_rgb(0x00ff_ffff), 1.0));
        if let Some(node) = scene.get_node_mut(sun) {
            node.transform.position = Vec3::ONE;
            node.transform.look_at(Vec3::ZERO, Vec3::Y);
        }

        let helpers = vec![
            scene.add_helper(Helper::grid(10.0, 10)),
            scene.add_helper(Helper::axes(5.0)),
        ];
        for &helper in &helpers {
            if let Some(node) = scene.get_node_mut(helper) {
                node.visible = settings.show_helpers;
            }
        }

        let cam = &settings.camera;
        let mut camera = Camera::new_perspective(cam.fov, 1.0, cam.near, cam.far);
        camera.set_viewport_size(size.0, size.1);
        let camera_node = scene.add_camera(camera);
        scene.active_camera = Some(camera_node);
        if let Some(node) = scene.get_node_mut(camera_node) {
            node.transform.position = cam.position;
            node.transform.look_at(Vec3::ZERO, Vec3::Y);
        }
        scene.update_matrix_world();

        let orbit = OrbitControls::looking_from(cam.position, Vec3::ZERO, &settings.orbit);

        backend.set_size(size.0, size.1);
        if let Some(mount) = mount.as_mut() {
            mount.attach_surface();
        }

        let mut render_loop = RenderLoop::new();
        render_loop.start();

        log::info!(
            "Viewport mounted ({}x{}{})",
            size.0,
            size.1,
            if mount.is_some() { "" } else { ", headless" }
        );

        Self {
            scene,
            orbit,
            gizmo: TransformControls::new(),
            camera_node,
            helpers,
            show_helpers: settings.show_helpers,
            environment_uri: settings.environment_map.clone(),
            backend,
            mount,
            render_loop,
            size,
            mounted: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn camera_node(&self) -> NodeHandle {
        self.camera_node
    }

    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        self.scene.main_camera()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn mount_surface(&self) -> Option<&M> {
        self.mount.as_ref()
    }

    #[must_use]
    pub fn show_helpers(&self) -> bool {
        self.show_helpers
    }

    pub fn set_show_helpers(&mut self, show: bool) {
        self.show_helpers = show;
        for &helper in &self.helpers {
            if let Some(node) = self.scene.get_node_mut(helper) {
                node.visible = show;
            }
        }
    }

    /// URI the host should fetch the environment map from, if any.
    #[must_use]
    pub fn environment_uri(&self) -> Option<&str> {
        self.environment_uri.as_deref()
    }

    /// Applies the result of an environment fetch.
    ///
    /// Failures are logged and otherwise ignored. Returns whether the map was
    /// applied.
    pub fn apply_environment(&mut self, result: Result<EnvironmentMap>) -> bool {
        if !self.mounted {
            log::debug!("Environment map arrived after teardown, dropped");
            return false;
        }
        match result {
            Ok(map) => {
                self.scene.environment.set_env_map(map);
                true
            }
            Err(err) => {
                log::warn!("Environment map unavailable, continuing without it: {err}");
                false
            }
        }
    }

    /// Recomputes the camera aspect and resizes the draw buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.mounted || width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        if let Some(camera) = self.scene.main_camera_mut() {
            camera.set_viewport_size(width, height);
        }
        self.backend.set_size(width, height);
    }

    /// Runs one tick: orbit damping, matrix update, draw.
    ///
    /// Returns false once the loop has been stopped.
    pub fn frame(&mut self, input: &Input, outlined: &[NodeHandle], outline: &OutlineSettings) -> bool {
        let Some(dt) = self.render_loop.next_frame() else {
            return false;
        };

        let fov = self.scene.main_camera().map_or(1.0, |c| c.fov);
        if let Some(node) = self.scene.get_node_mut(self.camera_node) {
            self.orbit.update(&mut node.transform, input, fov, dt);
        }
        self.scene.update_matrix_world();

        if let Some(camera) = self.scene.main_camera() {
            self.backend.render(&FrameContext {
                scene: &self.scene,
                camera,
                outlined,
                outline,
                gizmo_target: self.gizmo.attached(),
            });
        }
        true
    }

    /// Stops the loop, releases the backend and controls, drops the scene
    /// with everything it owns, and detaches the surface. Safe to call more
    /// than once.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.render_loop.cancel();
        self.gizmo.dispose();
        self.orbit.set_enabled(false);
        self.backend.dispose();
        self.helpers.clear();
        self.scene = Scene::new();
        match self.mount.as_mut() {
            Some(mount) if mount.contains_surface() => mount.detach_surface(),
            Some(_) => log::debug!("Draw surface already detached"),
            None => log::debug!("No mount point, nothing to detach"),
        }
        log::info!("Viewport torn down");
    }
}

/// Downloads and decodes a Radiance HDR environment map.
///
/// A relative `uri` is resolved against `origin`.
pub async fn fetch_environment(uri: &str, origin: Option<&Url>) -> Result<EnvironmentMap> {
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match origin {
            Some(origin) => origin.join(uri)?,
            None => return Err(EditorError::Config(format!("relative environment URI '{uri}' needs an origin"))),
        },
        Err(err) => return Err(err.into()),
    };

    log::debug!("Fetching environment map {url}");
    let response = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
        .await
        .map_err(EditorError::Http)?;
    if !response.ok {
        return Err(EditorError::HttpStatus {
            status: response.status,
            message: response.status_text,
        });
    }
    EnvironmentMap::from_hdr_bytes(uri, response.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::backend::{HeadlessBackend, HeadlessMount};

    fn mount() -> Viewport<HeadlessBackend, HeadlessMount> {
        Viewport::mount(
            &EditorSettings::default(),
            HeadlessBackend::new(),
            Some(HeadlessMount::new(800, 600)),
        )
    }

    #[test]
    fn mount_builds_default_scene() {
        let viewport = mount();
        assert_eq!(viewport.scene.lights.len(), 2);
        assert_eq!(viewport.scene.helpers.len(), 2);
        let camera = viewport.camera().unwrap();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
        assert!(viewport.mount_surface().unwrap().contains_surface());
        assert_eq!(viewport.backend().width, 800);
    }

    #[test]
    fn helpers_toggle() {
        let mut viewport = mount();
        viewport.set_show_helpers(false);
        assert!(viewport.helpers.iter().all(|&h| !viewport.scene.get_node(h).unwrap().visible));
    }

    #[test]
    fn failed_environment_is_ignored() {
        let mut viewport = mount();
        assert!(!viewport.apply_environment(Err(EditorError::Http("offline".into()))));
        assert!(!viewport.scene.environment.has_env_map());
        assert!(viewport.frame(&Input::new(), &[], &OutlineSettings::default()));
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut viewport = mount();
        viewport.teardown();
        viewport.teardown();
        assert_eq!(viewport.backend().dispose_calls, 1);
        assert!(viewport.scene.nodes.is_empty());
        assert!(viewport.scene.lights.is_empty());
        assert!(viewport.camera().is_none());
        assert_eq!(viewport.mount_surface().unwrap().detach_calls, 1);
        assert!(!viewport.frame(&Input::new(), &[], &OutlineSettings::default()));
    }

    #[test]
    fn zero_sized_mount_falls_back() {
        let viewport: Viewport<HeadlessBackend, HeadlessMount> =
            Viewport::mount(&EditorSettings::default(), HeadlessBackend::new(), Some(HeadlessMount::new(0, 0)));
        assert_eq!(viewport.size(), (1, 1));
        assert_eq!(viewport.backend().width, 1);
    }

    #[test]
    fn teardown_without_mount_point() {
        let mut viewport: Viewport<HeadlessBackend, HeadlessMount> =
            Viewport::mount(&EditorSettings::default(), HeadlessBackend::new(), None);
        assert_eq!(viewport.size(), (1, 1));
        viewport.teardown();
        assert_eq!(viewport.backend().dispose_calls, 1);
    }
}

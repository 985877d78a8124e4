//! The editor session: one mounted viewport plus everything the toolbar,
//! overlay and pointer handlers act on.
//!
//! All state lives here and is mutated from the host's event handlers. Async
//! work (downloads, conversion, parsing) happens in [`ModelLoader`]; its
//! results come back through [`EditorSession::finish_load`] together with
//! the ticket issued by [`EditorSession::begin_load`], so a result that
//! arrives after a newer request started, or after teardown, is dropped.

use glam::Vec3;

use crate::assets::io::{ConversionService, StorageClient};
use crate::assets::loader::{LoadState, LoadTicket, LoadTracker, LoadedModel, ModelLoader, normalize_model};
use crate::assets::source::{LocalFile, ModelSource};
use crate::config::EditorSettings;
use crate::editor::backend::{MountSurface, RenderBackend};
use crate::editor::edit_mode::{EditMode, orbit_allowed};
use crate::editor::exporter::{DownloadSink, ExportArtifact, export_subtree};
use crate::editor::gizmo::DragPointer;
use crate::editor::input::{Input, PointerButton};
use crate::editor::material_sync::{MaterialParams, SkinSet, apply_material_params};
use crate::editor::outline::OutlineSelection;
use crate::editor::picking::Raycaster;
use crate::editor::viewport::Viewport;
use crate::errors::{EditorError, Result};
use crate::resources::{Material, Mesh, create_box};
use crate::scene::environment::EnvironmentMap;
use crate::scene::{NodeHandle, Scene};

/// What [`EditorSession::finish_load`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result (model or failure) is now reflected in the scene.
    Applied,
    /// The result was stale or arrived after teardown.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Load,
    Import,
}

impl RequestKind {
    fn error_prefix(self) -> &'static str {
        match self {
            Self::Load => "Failed to load model:",
            Self::Import => "Failed to import model:",
        }
    }
}

pub struct EditorSession<B: RenderBackend, M: MountSurface> {
    settings: EditorSettings,
    viewport: Viewport<B, M>,
    tracker: LoadTracker,
    request: Option<(LoadTicket, RequestKind)>,

    current_model: Option<NodeHandle>,
    placeholder: Option<NodeHandle>,
    selected: Option<NodeHandle>,

    edit_mode: EditMode,
    material_params: MaterialParams,
    skins: SkinSet,
    outline: OutlineSelection,

    raycaster: Raycaster,
    input: Input,

    export_error: Option<String>,
    converted_file: Option<LocalFile>,
}

impl<B: RenderBackend, M: MountSurface> EditorSession<B, M> {
    /// Mounts the viewport and prepares an empty session.
    pub fn new(settings: EditorSettings, backend: B, mount: Option<M>) -> Self {
        let viewport = Viewport::mount(&settings, backend, mount);
        let (width, height) = viewport.size();

        let mut raycaster = Raycaster::new();
        raycaster.set_viewport_size(width, height);
        let mut input = Input::new();
        input.handle_resize(width, height);

        Self {
            outline: OutlineSelection::new(settings.outline.clone()),
            settings,
            viewport,
            tracker: LoadTracker::new(),
            request: None,
            current_model: None,
            placeholder: None,
            selected: None,
            edit_mode: EditMode::None,
            material_params: MaterialParams::default(),
            skins: SkinSet::default(),
            raycaster,
            input,
            export_error: None,
            converted_file: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport<B, M> {
        &self.viewport
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.viewport.scene
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        self.tracker.state()
    }

    /// Overlay message of the last failed load.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.tracker.state().error_message()
    }

    /// Inline message of the last failed export.
    #[must_use]
    pub fn export_error(&self) -> Option<&str> {
        self.export_error.as_deref()
    }

    #[must_use]
    pub fn current_model(&self) -> Option<NodeHandle> {
        self.current_model
    }

    #[must_use]
    pub fn placeholder(&self) -> Option<NodeHandle> {
        self.placeholder
    }

    #[must_use]
    pub fn selected(&self) -> Option<NodeHandle> {
        self.selected
    }

    #[must_use]
    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    #[must_use]
    pub fn material_params(&self) -> &MaterialParams {
        &self.material_params
    }

    #[must_use]
    pub fn skins(&self) -> &SkinSet {
        &self.skins
    }

    #[must_use]
    pub fn outline(&self) -> &OutlineSelection {
        &self.outline
    }

    pub fn outline_mut(&mut self) -> &mut OutlineSelection {
        &mut self.outline
    }

    #[must_use]
    pub fn gizmo_target(&self) -> Option<NodeHandle> {
        self.viewport.gizmo.attached()
    }

    #[must_use]
    pub fn orbit_enabled(&self) -> bool {
        self.viewport.orbit.enabled()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.viewport.gizmo.is_dragging()
    }

    /// GLB produced by the last converted import, for the host to persist.
    pub fn take_converted_file(&mut self) -> Option<LocalFile> {
        self.converted_file.take()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Starts a request. Any request still in flight becomes stale.
    pub fn begin_load(&mut self, source: &ModelSource) -> LoadTicket {
        let kind = match source {
            ModelSource::Remote { .. } => RequestKind::Load,
            ModelSource::Local(_) => RequestKind::Import,
        };
        let ticket = self.tracker.begin(source.label());
        self.request = Some((ticket, kind));
        log::info!("Loading {source}");
        ticket
    }

    /// Applies the result of the request identified by `ticket`.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<LoadedModel>) -> LoadOutcome {
        if !self.viewport.is_mounted() {
            log::debug!("Load result arrived after teardown, dropped");
            return LoadOutcome::Discarded;
        }
        if !self.tracker.is_current(ticket) {
            log::debug!("Stale load result {ticket:?} discarded");
            return LoadOutcome::Discarded;
        }
        let kind = match self.request.take() {
            Some((t, kind)) if t == ticket => kind,
            _ => RequestKind::Load,
        };

        match result {
            Ok(model) => {
                self.apply_model(model);
                self.tracker.complete(ticket);
            }
            Err(err) => {
                let message = format!("{} {err}", kind.error_prefix());
                log::error!("{message}");
                if err.shows_placeholder() {
                    self.clear_model();
                    self.show_placeholder();
                }
                self.tracker.fail(ticket, message);
            }
        }
        LoadOutcome::Applied
    }

    /// Runs a whole request against `loader`.
    ///
    /// Holds the session for the whole fetch, so no frames run meanwhile.
    /// Hosts that keep rendering during a load call [`Self::begin_load`],
    /// await [`ModelLoader::fetch`] on their own, then [`Self::finish_load`].
    pub async fn load<S, C>(&mut self, loader: &ModelLoader<S, C>, source: ModelSource) -> LoadOutcome
    where
        S: StorageClient,
        C: ConversionService,
    {
        let ticket = self.begin_load(&source);
        let result = loader.fetch(&source).await;
        self.finish_load(ticket, result)
    }

    /// Loads a stored model from a `storage://` or storage object URL.
    pub async fn load_from_url<S, C>(&mut self, loader: &ModelLoader<S, C>, url: &str) -> LoadOutcome
    where
        S: StorageClient,
        C: ConversionService,
    {
        match ModelSource::from_url(url) {
            Ok(source) => self.load(loader, source).await,
            Err(err) => {
                let ticket = self.tracker.begin(url);
                self.request = Some((ticket, RequestKind::Load));
                self.finish_load(ticket, Err(err))
            }
        }
    }

    /// Imports a file picked by the user.
    pub async fn import_file<S, C>(&mut self, loader: &ModelLoader<S, C>, file: LocalFile) -> LoadOutcome
    where
        S: StorageClient,
        C: ConversionService,
    {
        self.load(loader, ModelSource::Local(file)).await
    }

    fn apply_model(&mut self, model: LoadedModel) {
        self.clear_model();
        self.clear_placeholder();

        let scene = &mut self.viewport.scene;
        let root = model.prefab.instantiate(scene, &model.name);
        if let Some(scale) = normalize_model(scene, root, self.settings.normalize_size) {
            log::debug!("Model '{}' scaled by {scale}", model.name);
        }

        self.skins = SkinSet::discover(scene, root);
        apply_material_params(scene, root, &self.material_params);
        self.current_model = Some(root);
        if let Some(converted) = model.converted {
            self.converted_file = Some(converted);
        }
        log::info!("Model '{}' ready ({} skin(s))", model.name, self.skins.names().len());
    }

    /// Removes the current model and everything that referenced it.
    fn clear_model(&mut self) {
        let Some(root) = self.current_model.take() else {
            return;
        };
        self.viewport.scene.remove_node(root);
        self.forget_removed_nodes();
        self.skins = SkinSet::default();
        log::debug!("Previous model removed");
    }

    fn show_placeholder(&mut self) {
        self.clear_placeholder();
        let material = Material::new_standard(Vec3::new(1.0, 0.0, 0.0)).with_wireframe(true);
        let handle = self
            .viewport
            .scene
            .add_mesh(Mesh::new("ErrorPlaceholder", create_box(1.0, 1.0, 1.0), material));
        self.placeholder = Some(handle);
    }

    fn clear_placeholder(&mut self) {
        if let Some(handle) = self.placeholder.take() {
            self.viewport.scene.remove_node(handle);
            self.forget_removed_nodes();
        }
    }

    fn forget_removed_nodes(&mut self) {
        let scene = &self.viewport.scene;
        if self.viewport.gizmo.attached().is_some_and(|n| !scene.contains(n)) {
            self.viewport.gizmo.detach();
        }
        if self.selected.is_some_and(|n| !scene.contains(n)) {
            self.selected = None;
        }
        self.outline.prune(scene);
        self.sync_orbit();
    }

    // ========================================================================
    // Edit mode and pointer
    // ========================================================================

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        if !self.viewport.is_mounted() {
            return;
        }
        self.edit_mode = mode;
        match mode.gizmo_mode() {
            Some(gizmo_mode) => {
                self.viewport.gizmo.set_mode(gizmo_mode);
                let target = self
                    .selected
                    .filter(|&n| self.viewport.scene.contains(n))
                    .or(self.current_model);
                if let Some(target) = target {
                    self.viewport.gizmo.attach(target);
                }
            }
            None => self.viewport.gizmo.detach(),
        }
        self.sync_orbit();
        log::debug!("Edit mode: {mode:?}");
    }

    /// Toolbar button press: the active mode toggles back to none.
    pub fn toggle_edit_mode(&mut self, requested: EditMode) {
        self.set_edit_mode(self.edit_mode.toggled(requested));
    }

    fn sync_orbit(&mut self) {
        let allowed = orbit_allowed(self.edit_mode, self.viewport.gizmo.is_dragging());
        self.viewport.orbit.set_enabled(allowed);
    }

    /// Builds the pick ray for a pointer position in surface pixels.
    fn pointer_ray(&mut self, x: f32, y: f32) -> Option<DragPointer> {
        let ndc = self.raycaster.set_mouse_position(x, y)?;
        self.raycaster.set_from_camera(self.viewport.scene.main_camera());
        let ray = self.raycaster.ray()?;
        Some(DragPointer { ray, ndc })
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input.handle_cursor_move(x, y);
        if !self.viewport.is_mounted() || !self.viewport.gizmo.is_dragging() {
            return;
        }
        if let Some(pointer) = self.pointer_ray(x, y) {
            self.viewport.gizmo.update_drag(&mut self.viewport.scene, pointer);
        }
    }

    /// Picks under the pointer. Returns the topmost hit node.
    ///
    /// A hit becomes the selection. In an edit mode the gizmo moves to it
    /// and a drag starts.
    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) -> Option<NodeHandle> {
        self.input.handle_cursor_move(x, y);
        self.input.handle_button(button, true);
        if !self.viewport.is_mounted() || button != PointerButton::Primary {
            return None;
        }

        let pointer = self.pointer_ray(x, y);
        let candidates = self.viewport.scene.root_nodes.clone();
        let hit = self
            .raycaster
            .intersect_objects(&self.viewport.scene, &candidates)
            .into_iter()
            .next()?;

        self.selected = Some(hit.node);
        self.outline.set_selected(Some(hit.node));

        if let Some(gizmo_mode) = self.edit_mode.gizmo_mode() {
            let view_dir = self.viewport.camera().map_or(Vec3::NEG_Z, |c| c.forward());
            let gizmo = &mut self.viewport.gizmo;
            gizmo.set_mode(gizmo_mode);
            gizmo.attach(hit.node);
            if let Some(pointer) = pointer {
                gizmo.begin_drag(&self.viewport.scene, pointer, hit.point, view_dir);
            }
        }
        self.sync_orbit();
        Some(hit.node)
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        self.input.handle_button(button, false);
        if self.viewport.gizmo.end_drag() {
            self.viewport.scene.update_matrix_world();
        }
        self.sync_orbit();
    }

    pub fn wheel(&mut self, lines: f32) {
        self.input.handle_wheel(lines);
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Stores the panel values and applies them to the current model.
    pub fn set_material_params(&mut self, params: MaterialParams) {
        self.material_params = params;
        if !self.viewport.is_mounted() {
            return;
        }
        if let Some(root) = self.current_model {
            apply_material_params(&mut self.viewport.scene, root, &self.material_params);
        }
    }

    /// Shows only materials named `name`. Returns whether `name` is a known skin.
    pub fn change_skin(&mut self, name: &str) -> bool {
        match self.current_model {
            Some(root) if self.viewport.is_mounted() => {
                self.skins.change_skin(&mut self.viewport.scene, root, name)
            }
            _ => false,
        }
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Serializes the current model and hands it to `sink`.
    ///
    /// Returns `Ok(None)` when there is no model. A failure is also kept for
    /// [`export_error`](Self::export_error) and leaves the session unchanged.
    pub fn export(&mut self, sink: &impl DownloadSink) -> Result<Option<ExportArtifact>> {
        let Some(root) = self.current_model else {
            log::debug!("Nothing to export");
            return Ok(None);
        };

        let result = export_subtree(&self.viewport.scene, root, &self.settings.export)
            .and_then(|artifact| sink.deliver(&artifact).map(|()| artifact));

        match result {
            Ok(artifact) => {
                self.export_error = None;
                Ok(Some(artifact))
            }
            Err(err) => {
                let err = match err {
                    EditorError::Export(_) => err,
                    other => EditorError::Export(other.to_string()),
                };
                log::error!("{err}");
                self.export_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn set_show_helpers(&mut self, show: bool) {
        if self.viewport.is_mounted() {
            self.viewport.set_show_helpers(show);
        }
    }

    pub fn apply_environment(&mut self, result: Result<EnvironmentMap>) -> bool {
        self.viewport.apply_environment(result)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.viewport.is_mounted() || width == 0 || height == 0 {
            return;
        }
        self.viewport.resize(width, height);
        self.raycaster.set_viewport_size(width, height);
        self.input.handle_resize(width, height);
    }

    /// Renders one frame. Returns false once torn down.
    pub fn frame(&mut self) -> bool {
        let rendered = self
            .viewport
            .frame(&self.input, self.outline.outlined(), &self.outline.settings);
        self.input.end_frame();
        rendered
    }

    /// Cancels in-flight loads and releases the viewport. Idempotent.
    pub fn teardown(&mut self) {
        if !self.viewport.is_mounted() {
            return;
        }
        self.tracker.reset();
        self.request = None;
        self.current_model = None;
        self.placeholder = None;
        self.skins = SkinSet::default();
        self.outline.clear();
        self.viewport.teardown();
    }
}

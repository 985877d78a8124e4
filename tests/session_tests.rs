//! Editor Session Integration Tests
//!
//! Tests for:
//! - The full load, select, edit and export flow
//! - Viewport lifecycle: resize, helpers, teardown
//! - Environment map handling

mod common;

use animsync::assets::ModelSource;
use animsync::editor::{LoadOutcome, PointerButton};
use animsync::errors::EditorError;
use animsync::EditMode;

use common::*;

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn load_select_translate_export() {
    init_logger();
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();

    // Load
    assert_eq!(session.load_from_url(&loader, FIXTURE_URL).await, LoadOutcome::Applied);
    let root = session.current_model().unwrap();
    let bbox = session.scene().get_bbox_of_node(root).unwrap();
    assert!((bbox.max_dimension() - 5.0).abs() < 1e-3);
    assert_eq!(session.skins().names(), ["Red", "Blue"]);
    assert_eq!(session.skins().current(), Some("Red"));
    assert_eq!(session.edit_mode(), EditMode::None);
    assert!(session.frame());

    // Enter translate mode: the gizmo grabs the model, orbit stops
    session.toggle_edit_mode(EditMode::Translate);
    assert_eq!(session.edit_mode(), EditMode::Translate);
    assert_eq!(session.gizmo_target(), Some(root));
    assert!(!session.orbit_enabled());

    // Pick the body in the middle of the view
    let hit = session.pointer_down(400.0, 300.0, PointerButton::Primary).unwrap();
    assert_eq!(session.scene().get_node(hit).unwrap().name, "RedBody");
    assert_eq!(session.selected(), Some(hit));
    assert_eq!(session.gizmo_target(), Some(hit));
    assert_eq!(session.outline().outlined(), &[hit]);
    assert!(session.is_dragging());

    // Drag to the right
    let before = session.scene().get_node(hit).unwrap().transform.position;
    session.pointer_move(500.0, 300.0);
    session.pointer_up(PointerButton::Primary);
    let after = session.scene().get_node(hit).unwrap().transform.position;
    assert!(after.x > before.x);
    assert!(!session.is_dragging());
    assert!(!session.orbit_enabled());

    // Leave edit mode
    session.toggle_edit_mode(EditMode::Translate);
    assert_eq!(session.edit_mode(), EditMode::None);
    assert_eq!(session.gizmo_target(), None);
    assert!(session.orbit_enabled());

    // Export keeps the edit
    let sink = RecordingSink::default();
    let artifact = session.export(&sink).unwrap().unwrap();
    assert_eq!(artifact.file_name, "edited-model.glb");
    assert_eq!(sink.delivered.lock().len(), 1);

    let gltf = gltf::Gltf::from_slice(&artifact.bytes).unwrap();
    let body = gltf.nodes().find(|n| n.name() == Some("RedBody")).unwrap();
    let (translation, _, _) = body.transform().decomposed();
    assert!(translation[0] > 0.0);
    assert!(session.export_error().is_none());
}

#[tokio::test]
async fn pointer_miss_keeps_selection() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;

    let hit = session.pointer_down(400.0, 300.0, PointerButton::Primary);
    session.pointer_up(PointerButton::Primary);
    assert!(hit.is_some());
    assert!(!session.is_dragging());

    // Top-left corner sees only the background
    assert!(session.pointer_down(1.0, 1.0, PointerButton::Primary).is_none());
    assert_eq!(session.selected(), hit);
}

#[tokio::test]
async fn secondary_button_does_not_pick() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    assert!(session.pointer_down(400.0, 300.0, PointerButton::Secondary).is_none());
    assert!(session.selected().is_none());
}

#[tokio::test]
async fn edit_mode_switches_keep_target() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    let root = session.current_model();

    session.set_edit_mode(EditMode::Rotate);
    session.set_edit_mode(EditMode::Scale);
    assert_eq!(session.gizmo_target(), root);
    assert_eq!(session.edit_mode(), EditMode::Scale);
    assert!(!session.orbit_enabled());

    session.set_edit_mode(EditMode::None);
    assert!(session.orbit_enabled());
}

#[tokio::test]
async fn reload_detaches_gizmo_from_removed_model() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    session.set_edit_mode(EditMode::Translate);
    session.pointer_down(400.0, 300.0, PointerButton::Primary);
    session.pointer_up(PointerButton::Primary);

    session.load_from_url(&loader, FIXTURE_URL).await;
    assert!(session.selected().is_none());
    assert!(session.outline().outlined().is_empty());
    assert_eq!(session.gizmo_target(), None);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn export_without_model_is_noop() {
    let mut session = new_session();
    let sink = RecordingSink::default();
    assert!(session.export(&sink).unwrap().is_none());
    assert!(sink.delivered.lock().is_empty());
}

struct FailingSink;

impl animsync::editor::DownloadSink for FailingSink {
    fn deliver(&self, _artifact: &animsync::editor::ExportArtifact) -> animsync::Result<()> {
        Err(EditorError::Io(std::io::Error::other("disk full")))
    }
}

#[tokio::test]
async fn failed_delivery_is_reported_as_export_error() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    let model = session.current_model();

    let err = session.export(&FailingSink).unwrap_err();
    assert!(matches!(err, EditorError::Export(_)));
    assert!(session.export_error().unwrap().starts_with("Failed to export model:"));
    assert_eq!(session.current_model(), model);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn resize_updates_camera_and_backend() {
    let mut session = new_session();
    session.resize(1024, 512);
    let camera = session.viewport().camera().unwrap();
    assert!((camera.aspect - 2.0).abs() < 1e-6);
    assert_eq!(session.viewport().backend().width, 1024);
    assert_eq!(session.viewport().size(), (1024, 512));

    session.resize(0, 300);
    assert_eq!(session.viewport().size(), (1024, 512));
}

#[tokio::test]
async fn outlined_nodes_reach_the_backend() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    let trim = find_node(session.scene(), "BlueTrim").unwrap();

    session.outline_mut().add(trim);
    assert!(session.frame());
    assert_eq!(session.viewport().backend().last_outlined, vec![trim]);
    assert_eq!(session.viewport().backend().last_drawn_meshes, 2);

    session.outline_mut().settings.enabled = false;
    session.frame();
    assert!(session.viewport().backend().last_outlined.is_empty());
}

#[test]
fn helpers_can_be_hidden() {
    let mut session = new_session();
    session.set_show_helpers(false);
    let scene = session.scene();
    assert!(scene.helpers.iter().all(|(h, _)| !scene.get_node(*h).unwrap().visible));
    assert!(!session.viewport().show_helpers());
}

#[test]
fn environment_failure_is_not_fatal() {
    let mut session = new_session();
    assert!(!session.apply_environment(Err(EditorError::HttpStatus {
        status: 404,
        message: "Not Found".into(),
    })));
    assert!(session.frame());
}

#[test]
fn teardown_is_idempotent() {
    let mut session = new_session();
    let ticket = session.begin_load(&ModelSource::from_url(FIXTURE_URL).unwrap());

    session.teardown();
    session.teardown();

    let viewport = session.viewport();
    assert!(!viewport.is_mounted());
    assert_eq!(viewport.backend().dispose_calls, 1);
    assert_eq!(viewport.mount_surface().unwrap().detach_calls, 1);
    assert!(viewport.gizmo.is_disposed());

    assert_eq!(session.finish_load(ticket, Ok(fixture_model("late"))), LoadOutcome::Discarded);
    assert!(!session.frame());
    session.set_edit_mode(EditMode::Translate);
    assert_eq!(session.edit_mode(), EditMode::None);
}

#[tokio::test]
async fn teardown_releases_scene_resources() {
    let loader = loader(storage_with_fixture(), FakeConverter::unused());
    let mut session = new_session();
    session.load_from_url(&loader, FIXTURE_URL).await;
    assert_eq!(session.scene().meshes.len(), 2);
    assert!(!session.skins().is_empty());

    session.teardown();

    let scene = session.scene();
    assert!(scene.nodes.is_empty());
    assert!(scene.meshes.is_empty());
    assert!(scene.textures.is_empty());
    assert!(scene.root_nodes.is_empty());
    assert_eq!(session.current_model(), None);
    assert!(session.skins().is_empty());
    assert!(session.outline().outlined().is_empty());
}

#[test]
fn headless_session_tears_down_cleanly() {
    let mut session: TestSession = animsync::EditorSession::new(
        animsync::EditorSettings::default(),
        animsync::editor::HeadlessBackend::new(),
        None,
    );
    assert_eq!(session.viewport().size(), (1, 1));
    session.teardown();
    assert_eq!(session.viewport().backend().dispose_calls, 1);
}

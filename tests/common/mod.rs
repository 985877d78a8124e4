//! Shared fixtures for the integration tests.
//!
//! - In-memory storage and conversion collaborators
//! - A two-material model built in code and exported to GLB
//! - A headless session factory

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use animsync::assets::{ConversionPolicy, ConversionService, LoadedModel, ModelLoader, StorageClient};
use animsync::assets::loaders::GltfLoader;
use animsync::config::{EditorSettings, ExportSettings};
use animsync::editor::{DownloadSink, EditorSession, ExportArtifact, HeadlessBackend, HeadlessMount, export_subtree};
use animsync::errors::{EditorError, Result};
use animsync::resources::{Material, Mesh, create_box};
use animsync::scene::{Node, NodeHandle, Scene};

pub type TestSession = EditorSession<HeadlessBackend, HeadlessMount>;
pub type TestLoader = ModelLoader<MemoryStorage, FakeConverter>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Collaborators
// ============================================================================

/// Storage backed by a map of `(bucket, path)` to bytes.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<FxHashMap<(String, String), Vec<u8>>>,
    downloads: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, path: &str, bytes: Vec<u8>) -> Self {
        self.objects.lock().insert((bucket.to_string(), path.to_string()), bytes);
        self
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl StorageClient for MemoryStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| EditorError::Download(format!("{bucket}/{path}: Object not found")))
    }
}

pub enum ConverterBehavior {
    Succeed(Vec<u8>),
    Reject(String),
    /// Never answers.
    Hang,
    /// Transport failures for the first `failures` calls, then success.
    Flaky { failures: usize, then: Vec<u8> },
}

pub struct FakeConverter {
    behavior: ConverterBehavior,
    calls: AtomicUsize,
}

impl FakeConverter {
    pub fn new(behavior: ConverterBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// A converter that must never be reached.
    pub fn unused() -> Self {
        Self::new(ConverterBehavior::Reject("conversion not expected".into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConversionService for FakeConverter {
    async fn convert(&self, _file_name: &str, _bytes: &[u8]) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ConverterBehavior::Succeed(bytes) => Ok(bytes.clone()),
            ConverterBehavior::Reject(reason) => Err(EditorError::Conversion { reason: reason.clone() }),
            ConverterBehavior::Hang => std::future::pending().await,
            ConverterBehavior::Flaky { failures, then } => {
                if call < *failures {
                    Err(EditorError::Http("connection reset".into()))
                } else {
                    Ok(then.clone())
                }
            }
        }
    }
}

pub fn loader(storage: MemoryStorage, converter: FakeConverter) -> TestLoader {
    ModelLoader::new(storage, converter, ConversionPolicy::default())
}

pub fn loader_with_policy(storage: MemoryStorage, converter: FakeConverter, policy: ConversionPolicy) -> TestLoader {
    ModelLoader::new(storage, converter, policy)
}

/// Sink that keeps every delivered artifact.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<ExportArtifact>>,
}

impl DownloadSink for RecordingSink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<()> {
        self.delivered.lock().push(artifact.clone());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A 200-unit wide body ("Red") with a trim piece ("Blue") near its right end.
pub fn fixture_scene() -> (Scene, NodeHandle) {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("model"));

    let red = Material::new_standard(Vec3::new(1.0, 0.0, 0.0)).with_name("Red");
    scene.add_mesh_to_parent(Mesh::new("RedBody", create_box(200.0, 40.0, 10.0), red), root);

    let blue = Material::new_standard(Vec3::new(0.0, 0.0, 1.0)).with_name("Blue");
    let trim = scene.add_mesh_to_parent(Mesh::new("BlueTrim", create_box(20.0, 20.0, 10.0), blue), root);
    scene.get_node_mut(trim).unwrap().transform.position = Vec3::new(80.0, 0.0, 0.0);

    scene.update_matrix_world();
    (scene, root)
}

pub fn fixture_glb() -> Vec<u8> {
    let (scene, root) = fixture_scene();
    export_subtree(&scene, root, &ExportSettings::default()).unwrap().bytes
}

pub fn fixture_model(name: &str) -> LoadedModel {
    LoadedModel {
        name: name.to_string(),
        prefab: GltfLoader::load_from_slice(&fixture_glb()).unwrap(),
        converted: None,
    }
}

pub fn storage_with_fixture() -> MemoryStorage {
    MemoryStorage::new().with_object("bucket-a", "path/model.glb", fixture_glb())
}

pub const FIXTURE_URL: &str = "storage://bucket-a/path/model.glb";

// ============================================================================
// Sessions
// ============================================================================

pub fn new_session() -> TestSession {
    EditorSession::new(
        EditorSettings::default(),
        HeadlessBackend::new(),
        Some(HeadlessMount::new(800, 600)),
    )
}

/// Finds a node by name anywhere in the scene.
pub fn find_node(scene: &Scene, name: &str) -> Option<NodeHandle> {
    scene
        .reachable_nodes()
        .into_iter()
        .find(|&h| scene.get_node(h).is_some_and(|n| n.name == name))
}

pub const CONVERSION_TIMEOUT: Duration = Duration::from_millis(50);

//! Model loading pipeline.
//!
//! [`ModelLoader`] turns a [`ModelSource`] into a decoded [`Prefab`]:
//! storage download or local bytes, optional conversion to GLB, then parsing
//! through a staged blob. It never touches the scene. [`LoadTracker`] holds the
//! `idle → loading → ready | error` state and hands out tickets, so the
//! session can drop results that arrive after a newer request started.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;

use crate::assets::io::{ConversionService, GLB_MIME, StorageClient};
use crate::assets::loaders::GltfLoader;
use crate::assets::prefab::Prefab;
use crate::assets::source::{LocalFile, ModelSource};
use crate::assets::staging::StagingArea;
use crate::config::ConversionSettings;
use crate::errors::{EditorError, Result};
use crate::scene::{NodeHandle, Scene};

// ============================================================================
// State machine
// ============================================================================

/// Identifies one load request. Only the most recent ticket may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading { ticket: LoadTicket, label: String },
    Ready,
    Error { message: String },
}

impl LoadState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Message for the overlay, if the last load failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Last-request-wins bookkeeping.
#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: u64,
    state: LoadState,
}

impl LoadTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Starts a request and supersedes any in flight.
    pub fn begin(&mut self, label: impl Into<String>) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket(self.generation);
        let label = label.into();
        if let LoadState::Loading { label: previous, .. } = &self.state {
            log::debug!("Load of '{previous}' superseded by '{label}'");
        }
        self.state = LoadState::Loading { ticket, label };
        ticket
    }

    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Moves to `Ready`. Returns false (and changes nothing) for stale tickets.
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = LoadState::Ready;
        true
    }

    /// Moves to `Error`. Returns false (and changes nothing) for stale tickets.
    pub fn fail(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = LoadState::Error { message: message.into() };
        true
    }

    /// Invalidates every outstanding ticket and returns to `Idle`.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = LoadState::Idle;
    }
}

// ============================================================================
// Conversion policy
// ============================================================================

/// Timeout and retry bounds for the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl ConversionPolicy {
    #[must_use]
    pub fn from_settings(settings: &ConversionSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            max_attempts: settings.max_attempts.max(1),
        }
    }
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self::from_settings(&ConversionSettings::default())
    }
}

/// Runtime whose timer drives the conversion timeout.
///
/// An injected handle wins over the ambient one. Without either the timeout
/// cannot be armed and the conversion is refused instead.
#[cfg(not(target_arch = "wasm32"))]
fn timer_runtime(injected: Option<&tokio::runtime::Handle>) -> Result<tokio::runtime::Handle> {
    injected
        .cloned()
        .or_else(|| tokio::runtime::Handle::try_current().ok())
        .ok_or_else(|| EditorError::Config("conversion timeout needs a tokio runtime".into()))
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout<T>(
    runtime: &tokio::runtime::Handle,
    duration: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    // The sleep registers with whichever runtime is entered when it is created.
    let timeout = {
        let _guard = runtime.enter();
        tokio::time::timeout(duration, fut)
    };
    timeout.await.unwrap_or(Err(EditorError::ConversionTimeout(duration)))
}

// No timer on the web target; the browser's own request timeout applies.
#[cfg(target_arch = "wasm32")]
async fn with_timeout<T>(_runtime: &(), _duration: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    fut.await
}

// ============================================================================
// Loader
// ============================================================================

/// Result of a successful fetch-and-decode.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub prefab: Prefab,
    /// GLB produced by the conversion service for a local import, named
    /// `<stem>.glb`, for the host to persist.
    pub converted: Option<LocalFile>,
}

/// Fetches, converts and decodes models. Cheap to clone.
pub struct ModelLoader<S, C> {
    storage: Arc<S>,
    converter: Arc<C>,
    policy: ConversionPolicy,
    staging: StagingArea,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: Option<tokio::runtime::Handle>,
}

impl<S, C> Clone for ModelLoader<S, C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            converter: Arc::clone(&self.converter),
            policy: self.policy,
            staging: self.staging.clone(),
            #[cfg(not(target_arch = "wasm32"))]
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: StorageClient, C: ConversionService> ModelLoader<S, C> {
    pub fn new(storage: S, converter: C, policy: ConversionPolicy) -> Self {
        Self {
            storage: Arc::new(storage),
            converter: Arc::new(converter),
            policy,
            staging: StagingArea::new(),
            #[cfg(not(target_arch = "wasm32"))]
            runtime: None,
        }
    }

    /// Arms conversion timeouts on `runtime` instead of the caller's runtime.
    ///
    /// Needed when the host polls loads from outside tokio, e.g. with
    /// `pollster::block_on`. The runtime must have its time driver enabled.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[inline]
    #[must_use]
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> ConversionPolicy {
        self.policy
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Runs the whole pipeline for one source.
    pub async fn fetch(&self, source: &ModelSource) -> Result<LoadedModel> {
        let name = source.model_name();
        match source {
            ModelSource::Remote { bucket, path } => {
                let bytes = self.storage.download(bucket, path).await?;
                if bytes.is_empty() {
                    return Err(EditorError::Download(format!("{bucket}/{path}: no data")));
                }
                let prefab = self.parse(bytes)?;
                Ok(LoadedModel { name, prefab, converted: None })
            }
            ModelSource::Local(file) => {
                let format = file
                    .format()
                    .ok_or_else(|| EditorError::UnsupportedFormat(file.name.clone()))?;

                let (bytes, converted) = if format.is_native() {
                    (file.bytes.clone(), None)
                } else {
                    let glb = self.convert(file).await?;
                    let converted = LocalFile {
                        name: format!("{}.glb", file.stem()),
                        mime_type: Some(GLB_MIME.to_string()),
                        bytes: glb.clone(),
                    };
                    (glb, Some(converted))
                };

                let prefab = self.parse(bytes)?;
                Ok(LoadedModel { name, prefab, converted })
            }
        }
    }

    /// Calls the conversion service with the timeout and retry policy.
    ///
    /// Only transient failures are retried. A reported reason ends the attempt loop.
    /// Fails with [`EditorError::Config`] when no runtime is available for the timer.
    pub async fn convert(&self, file: &LocalFile) -> Result<Vec<u8>> {
        #[cfg(not(target_arch = "wasm32"))]
        let runtime = timer_runtime(self.runtime.as_ref())?;
        #[cfg(target_arch = "wasm32")]
        let runtime = ();

        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            log::debug!("Conversion of '{}' attempt {attempt}/{attempts}", file.name);
            let result = with_timeout(
                &runtime,
                self.policy.timeout,
                self.converter.convert(&file.name, &file.bytes),
            )
            .await;

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_transient() && attempt < attempts => {
                    log::warn!("Conversion of '{}' failed ({err}), retrying", file.name);
                    attempt += 1;
                }
                Err(EditorError::Http(message)) => {
                    return Err(EditorError::Conversion { reason: message });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Decodes bytes through a staged blob that is revoked on every path.
    pub fn parse(&self, bytes: Vec<u8>) -> Result<Prefab> {
        let blob = self.staging.stage(bytes);
        let result = GltfLoader::load_from_slice(blob.bytes());
        drop(blob);
        result
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Centers the subtree at the origin and scales it so its longest bounding
/// box edge equals `target_size`.
///
/// The transform is written to `root`, which must be a root-level node with
/// identity transform so its local and world spaces coincide. Returns the
/// applied scale factor, or `None` when the subtree has no geometry.
/// Degenerate (zero-size) bounds are centered without scaling.
pub fn normalize_model(scene: &mut Scene, root: NodeHandle, target_size: f32) -> Option<f32> {
    if let Some(node) = scene.get_node_mut(root) {
        node.transform.position = Vec3::ZERO;
        node.transform.scale = Vec3::ONE;
    }
    scene.update_subtree(root);

    let Some(bbox) = scene.get_bbox_of_node(root) else {
        log::warn!("Model has no geometry; skipping normalization");
        return None;
    };

    let max_dim = bbox.max_dimension();
    let scale = if max_dim > f32::EPSILON { target_size / max_dim } else { 1.0 };
    let center = bbox.center();

    if let Some(node) = scene.get_node_mut(root) {
        // world = scale * (p - center) keeps the box centered after scaling
        node.transform.scale = Vec3::splat(scale) * node.transform.scale;
        node.transform.position = -center * scale;
    }
    scene.update_subtree(root);

    log::debug!("Normalized model: size {:?} -> scale {scale}", bbox.size());
    Some(scale)
}

//! Editor Settings
//!
//! Every tunable of an editor session lives in [`EditorSettings`]. The struct
//! deserializes from JSON with all fields optional, so a host can ship a
//! partial file and inherit the rest from [`Default`].
//!
//! ```rust,ignore
//! let settings = EditorSettings::from_json_str(r#"{ "show_helpers": false }"#)?;
//! ```

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, Result};

/// Top-level settings for an [`EditorSession`](crate::editor::EditorSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Clear color as `0xRRGGBB`.
    pub background: u32,
    /// Whether grid and axes helpers are visible.
    pub show_helpers: bool,
    pub camera: CameraSettings,
    pub orbit: OrbitSettings,
    /// URI of the Radiance HDR used for reflections and background.
    /// `None` skips the environment entirely.
    pub environment_map: Option<String>,
    /// Longest bounding-box edge of every loaded model, in scene units.
    pub normalize_size: f32,
    pub storage: StorageSettings,
    pub conversion: ConversionSettings,
    pub export: ExportSettings,
    pub outline: OutlineSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            background: 0x0022_2222,
            show_helpers: true,
            camera: CameraSettings::default(),
            orbit: OrbitSettings::default(),
            environment_map: Some("/environments/industrial_sunset_02_1k.hdr".to_string()),
            normalize_size: 5.0,
            storage: StorageSettings::default(),
            conversion: ConversionSettings::default(),
            export: ExportSettings::default(),
            outline: OutlineSettings::default(),
        }
    }
}

impl EditorSettings {
    /// Parses settings from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a JSON settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded editor settings from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// Rejects values that would make the session misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(self.normalize_size.is_finite() && self.normalize_size > 0.0) {
            return Err(EditorError::Config(format!(
                "normalize_size must be positive, got {}",
                self.normalize_size
            )));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(EditorError::Config(format!("camera.fov out of range: {}", self.camera.fov)));
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(EditorError::Config("camera near/far planes are inverted".into()));
        }
        if self.conversion.timeout_secs == 0 {
            return Err(EditorError::Config("conversion.timeout_secs must be non-zero".into()));
        }
        if self.conversion.max_attempts == 0 {
            return Err(EditorError::Config("conversion.max_attempts must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.orbit.damping_factor) {
            return Err(EditorError::Config(format!(
                "orbit.damping_factor must be in [0, 1), got {}",
                self.orbit.damping_factor
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Perspective camera defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.25,
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            min_distance: 0.5,
            max_distance: 500.0,
        }
    }
}

/// Storage collaborator endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Project root such as `https://xyz.supabase.co`.
    pub base_url: String,
    /// Sent as the `apikey` header.
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer <token>` for private buckets.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Absolute URL, or a path joined onto `storage.base_url`'s origin.
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Total tries per conversion, including the first one.
    pub max_attempts: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            endpoint: "/api/convert-to-glb".to_string(),
            timeout_secs: 120,
            max_attempts: 2,
        }
    }
}

impl ConversionSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Exported file container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Single binary `.glb` file.
    #[default]
    Glb,
    /// `.gltf` JSON with the buffer embedded as a base64 data URI.
    Gltf,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Gltf => "gltf",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Glb => "model/gltf-binary",
            Self::Gltf => "model/gltf+json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub file_stem: String,
    /// Skip invisible nodes.
    pub only_visible: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Glb,
            file_stem: "edited-model".to_string(),
            only_visible: true,
        }
    }
}

impl ExportSettings {
    /// `edited-model.glb` and friends.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.format.extension())
    }
}

/// Parameters of the edge-highlight pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    pub enabled: bool,
    pub edge_glow: f32,
    pub edge_thickness: f32,
    pub edge_strength: f32,
    pub visible_edge_color: u32,
    pub hidden_edge_color: u32,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_glow: 0.5,
            edge_thickness: 1.0,
            edge_strength: 3.0,
            visible_edge_color: 0x00ff_ffff,
            hidden_edge_color: 0x0019_0a05,
        }
    }
}

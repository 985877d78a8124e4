//! Model sources: where the bytes of a model come from.

use std::fmt;
use std::path::Path;

use url::Url;

use crate::errors::{EditorError, Result};

/// File formats accepted by the editor's import picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Gltf,
    Glb,
    Fbx,
    Obj,
    Dae,
    Stl,
    Ply,
    ThreeDs,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 8] = [
        Self::Gltf,
        Self::Glb,
        Self::Fbx,
        Self::Obj,
        Self::Dae,
        Self::Stl,
        Self::Ply,
        Self::ThreeDs,
    ];

    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Format from the extension of a file name or path.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Fbx => "fbx",
            Self::Obj => "obj",
            Self::Dae => "dae",
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::ThreeDs => "3ds",
        }
    }

    /// glTF and GLB are parsed in-process. Everything else goes through
    /// the conversion service first.
    #[must_use]
    pub fn is_native(self) -> bool {
        matches!(self, Self::Gltf | Self::Glb)
    }

    /// `.gltf,.glb,...` for a file-picker `accept` attribute.
    #[must_use]
    pub fn accept_list() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A user-selected file, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    /// Reads a file from disk, keeping only its file name.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("model")
            .to_string();
        Ok(Self::new(name, bytes))
    }

    /// File name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    #[must_use]
    pub fn format(&self) -> Option<ModelFormat> {
        ModelFormat::from_file_name(&self.name)
    }
}

/// Input of one load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Object in the storage collaborator.
    Remote { bucket: String, path: String },
    /// File picked by the user.
    Local(LocalFile),
}

impl ModelSource {
    /// Resolves a model URL into a storage bucket and object path.
    ///
    /// Accepted forms:
    /// - `storage://<bucket>/<path>`
    /// - `https://<host>/storage/v1/object/public/<bucket>/<path>` (also `sign`/`authenticated`)
    /// - `https://<host>/storage/v1/object/<bucket>/<path>`
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        let (bucket, path) = match url.scheme() {
            "storage" => {
                let bucket = url.host_str().unwrap_or_default().to_string();
                let path = url.path().trim_start_matches('/').to_string();
                (bucket, path)
            }
            "http" | "https" => {
                let segments: Vec<&str> = url
                    .path_segments()
                    .map(Iterator::collect)
                    .unwrap_or_default();
                if segments.len() < 4 || segments[..3] != ["storage", "v1", "object"] {
                    return Err(EditorError::InvalidSource(format!(
                        "'{raw}' is not a storage object URL"
                    )));
                }
                let rest = match segments[3] {
                    "public" | "sign" | "authenticated" => &segments[4..],
                    _ => &segments[3..],
                };
                match rest.split_first() {
                    Some((bucket, path)) => ((*bucket).to_string(), path.join("/")),
                    None => (String::new(), String::new()),
                }
            }
            other => {
                return Err(EditorError::InvalidSource(format!(
                    "unsupported URL scheme '{other}'"
                )));
            }
        };

        if bucket.is_empty() || path.is_empty() {
            return Err(EditorError::InvalidSource(format!(
                "'{raw}' does not name a bucket and an object path"
            )));
        }
        Ok(Self::Remote { bucket, path })
    }

    /// Short human-readable name used for logs and the loading overlay.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Remote { bucket, path } => format!("{bucket}/{path}"),
            Self::Local(file) => file.name.clone(),
        }
    }

    /// Display name of the model node.
    #[must_use]
    pub fn model_name(&self) -> String {
        let name = match self {
            Self::Remote { path, .. } => path.rsplit('/').next().unwrap_or(path).to_string(),
            Self::Local(file) => file.name.clone(),
        };
        Path::new(&name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map_or(name.clone(), str::to_string)
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

//! External collaborators of the model loader.
//!
//! [`StorageClient`] downloads stored objects and [`ConversionService`] turns
//! arbitrary model files into GLB. Both are injected into
//! [`ModelLoader`](crate::assets::ModelLoader) at construction time. The
//! `Http*` implementations talk to a Supabase-style storage REST API and the
//! editor's `/api/convert-to-glb` endpoint through `ehttp`.

use std::future::Future;

use serde::Deserialize;
use url::Url;

use crate::config::{ConversionSettings, StorageSettings};
use crate::errors::{EditorError, Result};

/// MIME type requested from (and returned by) the conversion service.
pub const GLB_MIME: &str = "model/gltf-binary";

/// Read access to stored model files.
pub trait StorageClient: Send + Sync {
    /// Downloads one object. Failure or an empty body is a
    /// [`EditorError::Download`].
    fn download(&self, bucket: &str, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Opaque "any 3D file in, GLB out" service.
pub trait ConversionService: Send + Sync {
    /// Converts `bytes` (named `file_name`) into a GLB payload.
    ///
    /// A non-success answer is a [`EditorError::Conversion`] carrying the
    /// service's reason. Transport failures are [`EditorError::Http`].
    fn convert(&self, file_name: &str, bytes: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Joins `relative` onto `base`, treating `base` as a directory.
fn join_url(base: &Url, relative: &str) -> Result<Url> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    Ok(root.join(relative.trim_start_matches('/'))?)
}

// ============================================================================
// Storage
// ============================================================================

/// Storage REST client: `GET {base}/storage/v1/object/{bucket}/{path}`.
#[derive(Debug, Clone)]
pub struct HttpStorageClient {
    base_url: Url,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl HttpStorageClient {
    pub fn new(settings: &StorageSettings) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&settings.base_url)?,
            api_key: settings.api_key.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        join_url(&self.base_url, &format!("storage/v1/object/{bucket}/{path}"))
    }
}

impl StorageClient for HttpStorageClient {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.object_url(bucket, path)?;
        log::debug!("Downloading {url}");

        let mut request = ehttp::Request::get(url.as_str());
        if let Some(key) = &self.api_key {
            request.headers.insert("apikey", key);
        }
        if let Some(token) = self.access_token.as_ref().or(self.api_key.as_ref()) {
            request.headers.insert("Authorization", format!("Bearer {token}"));
        }

        let response = ehttp::fetch_async(request)
            .await
            .map_err(EditorError::Download)?;

        if !response.ok {
            return Err(EditorError::Download(format!(
                "{bucket}/{path}: {} {}",
                response.status, response.status_text
            )));
        }
        if response.bytes.is_empty() {
            return Err(EditorError::Download(format!("{bucket}/{path}: empty response")));
        }
        Ok(response.bytes)
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Error body returned by the conversion endpoint.
#[derive(Debug, Default, Deserialize)]
struct ConversionErrorBody {
    reason: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

impl ConversionErrorBody {
    fn into_reason(self) -> Option<String> {
        let headline = self.reason.or(self.error)?;
        Some(match self.details {
            Some(details) if !details.is_empty() => format!("{headline} ({details})"),
            _ => headline,
        })
    }
}

/// Extracts the service's reason from a failed response.
pub(crate) fn conversion_failure_reason(status_text: &str, body: &[u8]) -> String {
    serde_json::from_slice::<ConversionErrorBody>(body)
        .ok()
        .and_then(ConversionErrorBody::into_reason)
        .unwrap_or_else(|| format!("Conversion failed: {status_text}"))
}

/// Multipart `POST` of a single `file` field.
#[derive(Debug, Clone)]
pub struct HttpConversionService {
    endpoint: Url,
}

impl HttpConversionService {
    /// `settings.endpoint` may be absolute, or a path resolved against `origin`.
    pub fn new(settings: &ConversionSettings, origin: Option<&Url>) -> Result<Self> {
        let endpoint = match Url::parse(&settings.endpoint) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match origin {
                Some(base) => base.join(&settings.endpoint)?,
                None => {
                    return Err(EditorError::Config(format!(
                        "relative conversion endpoint '{}' needs an origin",
                        settings.endpoint
                    )));
                }
            },
            Err(err) => return Err(err.into()),
        };
        Ok(Self { endpoint })
    }

    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Builds a `multipart/form-data` body. Returns `(content_type, body)`.
pub(crate) fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = format!("----animsync{}", uuid::Uuid::new_v4().simple());
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{}\"\r\n",
            file_name.replace('"', "")
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

impl ConversionService for HttpConversionService {
    async fn convert(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
        let (content_type, body) = multipart_body("file", file_name, bytes);
        let mut request = ehttp::Request::post(self.endpoint.as_str(), body);
        request.headers.insert("Content-Type", content_type);
        request.headers.insert("Accept", GLB_MIME);

        log::info!("Converting '{file_name}' ({} bytes) via {}", bytes.len(), self.endpoint);
        let response = ehttp::fetch_async(request).await.map_err(EditorError::Http)?;

        if !response.ok {
            let reason = conversion_failure_reason(&response.status_text, &response.bytes);
            return Err(EditorError::Conversion { reason });
        }
        if response.bytes.is_empty() {
            return Err(EditorError::Conversion {
                reason: "service returned an empty model".into(),
            });
        }
        Ok(response.bytes)
    }
}

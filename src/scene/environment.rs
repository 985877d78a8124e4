//! Environment (reflection/background) map slot.

/// A decoded Radiance HDR environment image.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub uri: String,
    pub width: u32,
    pub height: u32,
    /// Original encoded bytes, handed to the backend untouched.
    pub bytes: Vec<u8>,
}

impl EnvironmentMap {
    /// Decodes the HDR header to validate the payload and learn its size.
    pub fn from_hdr_bytes(uri: &str, bytes: Vec<u8>) -> crate::errors::Result<Self> {
        let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Hdr)?;
        Ok(Self {
            uri: uri.to_string(),
            width: image.width(),
            height: image.height(),
            bytes,
        })
    }
}

/// Scene-wide environment slots.
///
/// The same map feeds reflections and the background once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub map: Option<EnvironmentMap>,
    pub use_as_background: bool,
    pub intensity: f32,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: None,
            use_as_background: false,
            intensity: 1.0,
        }
    }

    pub fn set_env_map(&mut self, map: EnvironmentMap) {
        log::info!("Environment map applied: {} ({}x{})", map.uri, map.width, map.height);
        self.map = Some(map);
        self.use_as_background = true;
    }

    #[must_use]
    pub fn has_env_map(&self) -> bool {
        self.map.is_some()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

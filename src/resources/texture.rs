/// Encoded image bytes referenced by material maps.
///
/// The editor never samples textures itself. It keeps the original encoding
/// so the backend can upload it and the exporter can embed it unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: Option<String>,
    /// `image/png`, `image/jpeg`, ...
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Texture {
    #[must_use]
    pub fn new(name: Option<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            data,
        }
    }
}

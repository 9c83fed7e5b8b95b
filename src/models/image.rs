use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// An image received from the client, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub media_type: String,
    pub file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(data: impl Into<Vec<u8>>, media_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string()),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn to_inline(&self) -> InlineImage {
        InlineImage {
            mime_type: self.media_type.clone(),
            data: general_purpose::STANDARD.encode(&self.data),
        }
    }
}

/// Base64 image paired with its media type, as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MISSING_IMAGE_MESSAGE: &str = "Tidak ada file yang diunggah.";
pub const FALLBACK_FAILURE_MESSAGE: &str =
    "Gagal menganalisis gambar. Pastikan Kunci API valid dan terhubung.";

/// Successful relay output.
///
/// Raw mode serializes as `{"finalPrompt": "..."}`. Structured mode serializes
/// as whatever JSON the model produced, unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Raw {
        #[serde(rename = "finalPrompt")]
        final_prompt: String,
    },
    Structured(Value),
}

impl ResponseEnvelope {
    pub fn raw(text: impl Into<String>) -> Self {
        ResponseEnvelope::Raw {
            final_prompt: text.into(),
        }
    }
}

/// Body for rejected input (`400`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationBody {
    pub error: String,
}

/// Body for every other failure (`500`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub code: u16,
    pub message: String,
}

impl FailureBody {
    pub fn internal(message: &str) -> Self {
        let message = if message.trim().is_empty() {
            FALLBACK_FAILURE_MESSAGE
        } else {
            message
        };
        Self {
            code: 500,
            message: message.to_string(),
        }
    }
}

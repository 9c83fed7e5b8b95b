use crate::{error::Result, models::InlineImage};
use async_trait::async_trait;

/// A remote multimodal model that turns an image plus an instruction into text.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Identifier of the model answering requests.
    fn model(&self) -> &str;

    /// Send one image and one prompt, returning the model's text output.
    async fn generate(&self, image: &InlineImage, prompt: &str) -> Result<String>;
}

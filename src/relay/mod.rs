pub mod prompt;
pub mod shaping;

use crate::{
    error::{RelayError, Result},
    gemini::ImageAnalyzer,
    logger,
    models::{AspectRatio, RequestMode, ResponseEnvelope, UploadedImage, MISSING_IMAGE_MESSAGE},
};

pub use prompt::build_prompt;
pub use shaping::{parse_structured, strip_json_fence};

/// Transport-independent input of one relay call.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub image: Option<UploadedImage>,
    pub selected_lang: String,
    pub selected_ratio: String,
}

impl AnalyzeRequest {
    pub fn new(image: UploadedImage) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }

    pub fn with_lang(mut self, selected_lang: impl Into<String>) -> Self {
        self.selected_lang = selected_lang.into();
        self
    }

    pub fn with_ratio(mut self, selected_ratio: impl Into<String>) -> Self {
        self.selected_ratio = selected_ratio.into();
        self
    }

    pub fn mode(&self) -> RequestMode {
        RequestMode::from_selector(&self.selected_lang)
    }
}

/// Run one request through the pipeline: validate, prompt, call the model
/// once, and shape its output.
///
/// A missing or empty image fails with [`RelayError::Validation`] before the
/// analyzer is touched. Every other failure is terminal; nothing is retried.
pub async fn analyze(
    analyzer: &dyn ImageAnalyzer,
    request: AnalyzeRequest,
) -> Result<ResponseEnvelope> {
    let image = match request.image {
        Some(ref image) if !image.is_empty() => image,
        _ => return Err(RelayError::Validation(MISSING_IMAGE_MESSAGE.into())),
    };

    let mode = request.mode();
    let ratio = AspectRatio::new(request.selected_ratio.as_str());
    log::info!(
        "Analyzing {} byte {} image (mode: {:?}, ratio: {:?})",
        image.len(),
        image.media_type,
        mode,
        ratio.as_str()
    );

    let inline = image.to_inline();
    let prompt = build_prompt(mode, &ratio);

    let text = {
        let _timer = logger::timer("Model call");
        analyzer.generate(&inline, &prompt).await?
    };

    if mode.is_raw() {
        return Ok(ResponseEnvelope::raw(text));
    }

    let value = parse_structured(&text).map_err(|e| {
        log::warn!("Unparsable structured output: {:.200}", text);
        e
    })?;
    Ok(ResponseEnvelope::Structured(value))
}

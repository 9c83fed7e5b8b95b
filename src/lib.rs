pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod relay;
pub mod server;

pub use config::{Config, GeminiConfig, ServerConfig};
pub use error::{RelayError, Result};
pub use gemini::{GeminiClient, ImageAnalyzer};
pub use models::{
    AspectRatio, InlineImage, OutputLanguage, OutputShape, RequestMode, ResponseEnvelope,
    UploadedImage,
};
pub use relay::{analyze, AnalyzeRequest};

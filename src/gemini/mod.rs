pub mod client;
pub mod traits;

pub use client::GeminiClient;
pub use traits::ImageAnalyzer;

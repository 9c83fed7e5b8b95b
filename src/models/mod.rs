pub mod gemini;
pub mod image;
pub mod mode;
pub mod response;

pub use gemini::*;
pub use image::*;
pub use mode::*;
pub use response::*;

//! Media validation and transformation engines.
//!
//! The validator classifies candidates and accumulates policy violations;
//! the image engine works on in-memory buffers via the `image` crate; the
//! video engine shells out to ffmpeg/ffprobe.

pub mod image;
pub mod validator;
pub mod video;

pub use image::{ImageEngine, ProcessedImage};
pub use validator::{validate, UploadPolicy, ValidationError};
pub use video::{VideoEngine, VideoMetadata};

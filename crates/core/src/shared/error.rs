use thiserror::Error;

/// The encoded payload could not be turned into a pixel array.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unrecognized image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Pipeline-level failures surfaced to callers.
///
/// No-face and small-face conditions are not errors; they show up as empty
/// results instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to decode frame: {0}")]
    Decode(#[from] DecodeError),
    #[error("{images} images but {timestamps} timestamps")]
    ShapeMismatch { images: usize, timestamps: usize },
    #[error("face detection failed: {0}")]
    Detection(String),
}

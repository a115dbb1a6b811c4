use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Domain interface for face localization.
///
/// Zero detections is a normal empty result, not an error. For a fixed frame
/// the returned order must be deterministic: the first region is the frame's
/// primary face for timeline purposes. Implementations may be stateful,
/// hence `&mut self`.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}

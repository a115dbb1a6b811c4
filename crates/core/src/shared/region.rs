use serde::Serialize;

/// A detected face bounding box as four offsets into a frame's coordinate
/// space.
///
/// Invariant: `top < bottom <= frame height` and `left < right <= frame
/// width`. Constructed by the face locator, consumed by the preprocessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FaceRegion {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl FaceRegion {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        debug_assert!(top < bottom, "top must be above bottom");
        debug_assert!(left < right, "left must be left of right");
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

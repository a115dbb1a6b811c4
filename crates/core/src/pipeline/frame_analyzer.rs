use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::classification::classifier::{EmotionClassifier, EmotionPrediction};
use crate::classification::preprocess::preprocess_face;
use crate::decoding::image_decoder::decode_payload;
use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::constants::MIN_FACE_SIZE;
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// One detected face with its classification.
#[derive(Clone, Debug, Serialize)]
pub struct FaceResult {
    #[serde(rename = "location")]
    pub region: FaceRegion,
    #[serde(flatten)]
    pub prediction: EmotionPrediction,
}

/// All qualifying faces of one frame, in locator order.
///
/// An empty list is a successful result: it means no face was found (or none
/// passed the minimum-size policy), not that anything went wrong.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FrameResult {
    pub faces: Vec<FaceResult>,
}

impl FrameResult {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The frame's primary face: the locator's first detection.
    pub fn primary(&self) -> Option<&FaceResult> {
        self.faces.first()
    }
}

/// Orchestrates locate → preprocess → classify for one frame.
///
/// The locator is an injected seam so tests (and alternative detectors) can
/// swap it; the classifier handle is shared and immutable.
pub struct FrameAnalyzer {
    locator: Box<dyn FaceLocator>,
    classifier: Arc<EmotionClassifier>,
}

impl FrameAnalyzer {
    pub fn new(locator: Box<dyn FaceLocator>, classifier: Arc<EmotionClassifier>) -> Self {
        Self {
            locator,
            classifier,
        }
    }

    pub fn classifier(&self) -> &Arc<EmotionClassifier> {
        &self.classifier
    }

    /// Analyze a decoded frame.
    ///
    /// Regions shorter or narrower than [`MIN_FACE_SIZE`] are skipped
    /// silently; result order mirrors the locator's detection order.
    pub fn analyze(&mut self, frame: &Frame) -> Result<FrameResult, AnalysisError> {
        let regions = self
            .locator
            .locate(frame)
            .map_err(|e| AnalysisError::Detection(e.to_string()))?;

        let mut faces = Vec::with_capacity(regions.len());
        for region in regions {
            if region.height() < MIN_FACE_SIZE || region.width() < MIN_FACE_SIZE {
                debug!(
                    "skipping {}x{} region below minimum face size",
                    region.width(),
                    region.height()
                );
                continue;
            }

            let tensor = preprocess_face(frame, &region);
            let prediction = self.classifier.classify(&tensor);
            faces.push(FaceResult { region, prediction });
        }

        Ok(FrameResult { faces })
    }

    /// Decode an encoded payload and analyze it.
    pub fn analyze_payload(&mut self, payload: &str) -> Result<FrameResult, AnalysisError> {
        let frame = decode_payload(payload)?;
        self.analyze(&frame)
    }
}

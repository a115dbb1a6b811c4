use serde::Serialize;

use crate::pipeline::frame_analyzer::{FaceResult, FrameResult};
use crate::pipeline::timeline::{TimelineAnalysis, TimelineEntry, TimelineSummary};

/// Envelope for a single-frame analysis, as consumed by external
/// collaborators: a success flag, the per-face results, and the caller's
/// timestamp echoed back unmodified.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub faces: Vec<FaceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl AnalysisResponse {
    pub fn new(result: FrameResult, timestamp: Option<f64>) -> Self {
        Self {
            success: true,
            faces: result.faces,
            timestamp,
        }
    }
}

/// Envelope for a timeline analysis.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub success: bool,
    pub timeline: Vec<TimelineEntry>,
    pub summary: TimelineSummary,
}

impl TimelineResponse {
    pub fn new(analysis: TimelineAnalysis) -> Self {
        Self {
            success: true,
            timeline: analysis.timeline,
            summary: analysis.summary,
        }
    }
}

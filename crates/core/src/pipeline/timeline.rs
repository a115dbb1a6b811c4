use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::decoding::image_decoder::decode_payload;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::shared::emotion::EmotionLabel;
use crate::shared::error::AnalysisError;

/// Decoded frames buffered ahead of analysis.
const DECODE_CHANNEL_CAPACITY: usize = 8;

/// One frame's contribution to a session timeline, derived from its primary
/// face. Frames with no qualifying face contribute no entry.
#[derive(Clone, Debug, Serialize)]
pub struct TimelineEntry {
    pub timestamp: f64,
    pub emotion: EmotionLabel,
    pub confidence: f32,
    pub sentiment: f32,
    pub face_count: usize,
}

/// Session-level statistics over a timeline.
#[derive(Clone, Debug, Serialize)]
pub struct TimelineSummary {
    pub dominant_emotion: EmotionLabel,
    #[serde(serialize_with = "distribution_as_map")]
    pub emotion_distribution: [u32; EmotionLabel::COUNT],
    pub average_sentiment: f64,
    pub total_frames: usize,
    pub frames_with_faces: usize,
}

fn distribution_as_map<S: Serializer>(
    counts: &[u32; EmotionLabel::COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(EmotionLabel::COUNT))?;
    for (label, count) in EmotionLabel::ALL.iter().zip(counts) {
        map.serialize_entry(label.as_str(), count)?;
    }
    map.end()
}

/// A chronological timeline plus its summary.
#[derive(Clone, Debug, Serialize)]
pub struct TimelineAnalysis {
    pub timeline: Vec<TimelineEntry>,
    pub summary: TimelineSummary,
}

/// Runs the frame analyzer over an ordered frame sequence and aggregates a
/// timeline.
///
/// Payload decoding runs on a spawned thread feeding a bounded channel while
/// this thread runs detection and classification, so the two stages overlap.
/// The channel is FIFO, which keeps output order equal to input order.
pub struct TimelineAggregator {
    analyzer: FrameAnalyzer,
}

impl TimelineAggregator {
    pub fn new(analyzer: FrameAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Aggregate equal-length payload and timestamp sequences.
    ///
    /// Every frame counts toward `total_frames`; only frames with at least
    /// one qualifying face produce a [`TimelineEntry`]. A decode or
    /// detection failure on any frame fails the whole aggregation.
    pub fn aggregate(
        &mut self,
        payloads: &[String],
        timestamps: &[f64],
    ) -> Result<TimelineAnalysis, AnalysisError> {
        if payloads.len() != timestamps.len() {
            return Err(AnalysisError::ShapeMismatch {
                images: payloads.len(),
                timestamps: timestamps.len(),
            });
        }

        let (tx, rx) = crossbeam_channel::bounded(DECODE_CHANNEL_CAPACITY);
        let owned: Vec<String> = payloads.to_vec();
        let decoder = std::thread::spawn(move || {
            for payload in owned {
                // Receiver dropped means the analysis side already failed
                if tx.send(decode_payload(&payload)).is_err() {
                    break;
                }
            }
        });

        let mut timeline = Vec::new();
        let mut outcome = Ok(());

        for (decoded, &timestamp) in rx.iter().zip(timestamps) {
            let frame = match decoded {
                Ok(frame) => frame,
                Err(e) => {
                    outcome = Err(AnalysisError::from(e));
                    break;
                }
            };

            let result = match self.analyzer.analyze(&frame) {
                Ok(result) => result,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            };

            if let Some(primary) = result.primary() {
                timeline.push(TimelineEntry {
                    timestamp,
                    emotion: primary.prediction.label,
                    confidence: primary.prediction.confidence,
                    sentiment: primary.prediction.label.sentiment(),
                    face_count: result.face_count(),
                });
            } else {
                debug!("frame at {timestamp} contributed no timeline entry");
            }
        }

        drop(rx);
        decoder.join().expect("decoder thread never panics");
        outcome?;

        let summary = summarize(&timeline, payloads.len());
        Ok(TimelineAnalysis { timeline, summary })
    }
}

/// Build summary statistics for a finished timeline.
///
/// The dominant emotion is the most frequent entry label; exact ties resolve
/// to whichever label comes first in the fixed model ordering, keeping the
/// result deterministic. An empty timeline averages to 0.0 rather than
/// dividing by zero.
pub fn summarize(timeline: &[TimelineEntry], total_frames: usize) -> TimelineSummary {
    let mut counts = [0u32; EmotionLabel::COUNT];
    let mut sentiment_sum = 0.0f64;

    for entry in timeline {
        counts[entry.emotion.index()] += 1;
        sentiment_sum += entry.sentiment as f64;
    }

    let mut dominant = EmotionLabel::ALL[0];
    for label in EmotionLabel::ALL {
        if counts[label.index()] > counts[dominant.index()] {
            dominant = label;
        }
    }

    let average_sentiment = if timeline.is_empty() {
        0.0
    } else {
        sentiment_sum / timeline.len() as f64
    };

    TimelineSummary {
        dominant_emotion: dominant,
        emotion_distribution: counts,
        average_sentiment,
        total_frames,
        frames_with_faces: timeline.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    use crate::classification::classifier::EmotionClassifier;
    use crate::pipeline::frame_analyzer::tests::StubLocator;
    use crate::shared::region::FaceRegion;

    fn entry(timestamp: f64, emotion: EmotionLabel) -> TimelineEntry {
        TimelineEntry {
            timestamp,
            emotion,
            confidence: 0.9,
            sentiment: emotion.sentiment(),
            face_count: 1,
        }
    }

    fn png_payload(width: u32, height: u32) -> String {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf)
    }

    fn aggregator(regions: Vec<FaceRegion>) -> TimelineAggregator {
        TimelineAggregator::new(FrameAnalyzer::new(
            Box::new(StubLocator { regions }),
            Arc::new(EmotionClassifier::new(None)),
        ))
    }

    // ── summarize ────────────────────────────────────────────────────

    #[test]
    fn test_dominant_tie_resolves_by_model_ordering() {
        // happy x2 and sad x2: happy precedes sad in the fixed ordering
        let timeline = vec![
            entry(0.0, EmotionLabel::Sad),
            entry(1.0, EmotionLabel::Happy),
            entry(2.0, EmotionLabel::Sad),
            entry(3.0, EmotionLabel::Happy),
        ];
        let summary = summarize(&timeline, 4);
        assert_eq!(summary.dominant_emotion, EmotionLabel::Happy);
    }

    #[test]
    fn test_distribution_counts_and_zero_initialization() {
        let timeline = vec![
            entry(0.0, EmotionLabel::Neutral),
            entry(1.0, EmotionLabel::Neutral),
            entry(2.0, EmotionLabel::Fear),
        ];
        let summary = summarize(&timeline, 5);
        assert_eq!(summary.emotion_distribution[EmotionLabel::Neutral.index()], 2);
        assert_eq!(summary.emotion_distribution[EmotionLabel::Fear.index()], 1);
        assert_eq!(summary.emotion_distribution[EmotionLabel::Happy.index()], 0);
        assert_eq!(summary.total_frames, 5);
        assert_eq!(summary.frames_with_faces, 3);
    }

    #[test]
    fn test_empty_timeline_averages_to_zero() {
        let summary = summarize(&[], 3);
        assert_relative_eq!(summary.average_sentiment, 0.0);
        assert_eq!(summary.frames_with_faces, 0);
        assert_eq!(summary.total_frames, 3);
    }

    #[test]
    fn test_average_sentiment_is_arithmetic_mean() {
        let timeline = vec![
            entry(0.0, EmotionLabel::Happy),    // 1.0
            entry(1.0, EmotionLabel::Sad),      // -0.6
            entry(2.0, EmotionLabel::Surprise), // 0.5
        ];
        let summary = summarize(&timeline, 3);
        assert_relative_eq!(summary.average_sentiment, 0.3, epsilon = 1e-6);
    }

    // ── aggregate ────────────────────────────────────────────────────

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut agg = aggregator(vec![]);
        let err = agg
            .aggregate(&[png_payload(32, 32)], &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ShapeMismatch {
                images: 1,
                timestamps: 2
            }
        ));
    }

    #[test]
    fn test_every_frame_counts_but_only_faces_enter_timeline() {
        // Locator always reports one face, so every decodable frame lands
        // in the timeline.
        let mut agg = aggregator(vec![FaceRegion::new(4, 28, 28, 4)]);
        let payloads = vec![png_payload(32, 32), png_payload(32, 32)];
        let analysis = agg.aggregate(&payloads, &[0.5, 1.5]).unwrap();

        assert_eq!(analysis.summary.total_frames, 2);
        assert_eq!(analysis.summary.frames_with_faces, 2);
        assert_eq!(analysis.timeline.len(), 2);
        assert_relative_eq!(analysis.timeline[0].timestamp, 0.5);
        assert_relative_eq!(analysis.timeline[1].timestamp, 1.5);
        assert_eq!(analysis.timeline[0].face_count, 1);
    }

    #[test]
    fn test_faceless_frames_still_count_toward_totals() {
        let mut agg = aggregator(vec![]);
        let payloads = vec![png_payload(16, 16), png_payload(16, 16), png_payload(16, 16)];
        let analysis = agg.aggregate(&payloads, &[0.0, 1.0, 2.0]).unwrap();

        assert_eq!(analysis.summary.total_frames, 3);
        assert_eq!(analysis.summary.frames_with_faces, 0);
        assert!(analysis.timeline.is_empty());
        assert_relative_eq!(analysis.summary.average_sentiment, 0.0);
    }

    #[test]
    fn test_undecodable_frame_fails_the_aggregation() {
        let mut agg = aggregator(vec![]);
        let payloads = vec![png_payload(16, 16), "!!!".to_string()];
        let err = agg.aggregate(&payloads, &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn test_empty_input_yields_empty_analysis() {
        let mut agg = aggregator(vec![FaceRegion::new(0, 20, 20, 0)]);
        let analysis = agg.aggregate(&[], &[]).unwrap();
        assert_eq!(analysis.summary.total_frames, 0);
        assert!(analysis.timeline.is_empty());
        assert_relative_eq!(analysis.summary.average_sentiment, 0.0);
    }

    #[test]
    fn test_summary_serializes_distribution_as_label_map() {
        let summary = summarize(&[entry(0.0, EmotionLabel::Angry)], 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dominant_emotion"], "angry");
        assert_eq!(json["emotion_distribution"]["angry"], 1);
        assert_eq!(json["emotion_distribution"]["happy"], 0);
    }
}

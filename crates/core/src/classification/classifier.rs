use std::path::Path;

use log::{info, warn};
use ndarray::Array2;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::classification::network::EmotionNet;
use crate::classification::weights;
use crate::shared::emotion::EmotionLabel;

/// One classification result: the winning label, its confidence, and the
/// full distribution aligned to [`EmotionLabel::ALL`].
///
/// Invariants: probabilities sum to 1 within floating-point tolerance,
/// `confidence == probabilities[label.index()]`, and the label is the argmax
/// (first index on exact ties).
#[derive(Clone, Debug, Serialize)]
pub struct EmotionPrediction {
    #[serde(rename = "emotion")]
    pub label: EmotionLabel,
    pub confidence: f32,
    #[serde(serialize_with = "probabilities_as_map")]
    pub probabilities: [f32; EmotionLabel::COUNT],
}

fn probabilities_as_map<S: Serializer>(
    probs: &[f32; EmotionLabel::COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(EmotionLabel::COUNT))?;
    for (label, p) in EmotionLabel::ALL.iter().zip(probs) {
        map.serialize_entry(label.as_str(), p)?;
    }
    map.end()
}

/// The emotion classifier: an [`EmotionNet`] plus its weight state.
///
/// Construction never fails. When the weight artifact is missing or
/// unreadable the network keeps its random initialization and the failure is
/// logged as a warning; predictions stay well-formed either way. Weights are
/// read-only after construction, so one instance can serve concurrent
/// inference calls without locking.
pub struct EmotionClassifier {
    net: EmotionNet,
    weights_loaded: bool,
}

impl EmotionClassifier {
    pub fn new(weights_path: Option<&Path>) -> Self {
        let mut rng = rand::thread_rng();
        let mut net = EmotionNet::random(&mut rng);
        let mut weights_loaded = false;

        if let Some(path) = weights_path {
            match weights::load(path) {
                Ok(loaded) => {
                    info!("loaded emotion weights from {}", path.display());
                    net = loaded;
                    weights_loaded = true;
                }
                Err(e) => {
                    warn!(
                        "could not load emotion weights from {}: {e}; \
                         keeping randomly initialized parameters",
                        path.display()
                    );
                }
            }
        }

        Self {
            net,
            weights_loaded,
        }
    }

    /// Whether a weight artifact was applied at construction.
    pub fn weights_loaded(&self) -> bool {
        self.weights_loaded
    }

    /// Classify one preprocessed 48x48 face tensor.
    pub fn classify(&self, face: &Array2<f32>) -> EmotionPrediction {
        let probabilities = self.net.forward(face);

        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = i;
            }
        }

        let label = EmotionLabel::from_index(best).expect("argmax index is within the label set");
        EmotionPrediction {
            label,
            confidence: probabilities[best],
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gradient_face() -> Array2<f32> {
        Array2::from_shape_fn((48, 48), |(y, x)| ((y + x) % 256) as f32 / 255.0)
    }

    #[test]
    fn test_prediction_invariants_hold_with_random_weights() {
        let classifier = EmotionClassifier::new(None);
        let prediction = classifier.classify(&gradient_face());

        let sum: f32 = prediction.probabilities.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
        assert_relative_eq!(
            prediction.confidence,
            prediction.probabilities[prediction.label.index()]
        );
        let max = prediction
            .probabilities
            .iter()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(prediction.confidence, max);
    }

    #[test]
    fn test_missing_weight_file_degrades_to_random_init() {
        let dir = tempfile::tempdir().unwrap();
        let classifier =
            EmotionClassifier::new(Some(&dir.path().join("no-such-weights.emo1")));
        assert!(!classifier.weights_loaded());

        // Inference still succeeds and stays well-formed
        let prediction = classifier.classify(&gradient_face());
        let sum: f32 = prediction.probabilities.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_saved_weights_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.emo1");
        let mut rng = rand::thread_rng();
        let net = crate::classification::network::EmotionNet::random(&mut rng);
        crate::classification::weights::save(&net, &path).unwrap();

        let classifier = EmotionClassifier::new(Some(&path));
        assert!(classifier.weights_loaded());
    }

    #[test]
    fn test_prediction_serializes_like_the_wire_contract() {
        let classifier = EmotionClassifier::new(None);
        let prediction = classifier.classify(&gradient_face());
        let json = serde_json::to_value(&prediction).unwrap();

        assert!(json["emotion"].is_string());
        assert!(json["confidence"].is_number());
        let probs = json["probabilities"].as_object().unwrap();
        assert_eq!(probs.len(), 7);
        assert!(probs.contains_key("angry") && probs.contains_key("neutral"));
    }
}

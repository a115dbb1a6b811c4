use serde::{Deserialize, Serialize};

/// The seven emotion categories the classifier can produce.
///
/// Declaration order is a model contract: output vector index `i` always
/// corresponds to `EmotionLabel::ALL[i]`. Do not reorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    pub const COUNT: usize = 7;

    /// Model-contract ordering of the closed label set.
    pub const ALL: [EmotionLabel; Self::COUNT] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    /// Position of this label in the model output vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Fixed sentiment score for this emotion, in roughly [-1, 1].
    pub fn sentiment(self) -> f32 {
        match self {
            EmotionLabel::Happy => 1.0,
            EmotionLabel::Surprise => 0.5,
            EmotionLabel::Neutral => 0.0,
            EmotionLabel::Fear => -0.3,
            EmotionLabel::Sad => -0.6,
            EmotionLabel::Angry => -0.8,
            EmotionLabel::Disgust => -0.9,
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tolerant sentiment lookup over label strings for the collaborator surface.
///
/// Labels outside the closed set map to 0.0 (neutral) so label-set drift in a
/// caller never turns into an error.
pub fn sentiment_of(label: &str) -> f32 {
    EmotionLabel::ALL
        .iter()
        .find(|l| l.as_str() == label)
        .map(|l| l.sentiment())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_output_index_matches_declaration_order() {
        for (i, label) in EmotionLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(EmotionLabel::from_index(i), Some(*label));
        }
        assert_eq!(EmotionLabel::from_index(7), None);
    }

    #[rstest]
    #[case::happy("happy", 1.0)]
    #[case::surprise("surprise", 0.5)]
    #[case::neutral("neutral", 0.0)]
    #[case::fear("fear", -0.3)]
    #[case::sad("sad", -0.6)]
    #[case::angry("angry", -0.8)]
    #[case::disgust("disgust", -0.9)]
    fn test_sentiment_values(#[case] label: &str, #[case] expected: f32) {
        assert_relative_eq!(sentiment_of(label), expected);
    }

    #[test]
    fn test_unknown_label_is_neutral() {
        assert_relative_eq!(sentiment_of("contempt"), 0.0);
        assert_relative_eq!(sentiment_of(""), 0.0);
    }

    #[test]
    fn test_wire_names_are_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Surprise).unwrap();
        assert_eq!(json, "\"surprise\"");
        assert_eq!(EmotionLabel::Fear.to_string(), "fear");
    }
}

pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const BLAZEFACE_MODEL_URL: &str =
    "https://github.com/emoscope/emoscope/releases/download/v0.1.0/blazeface_short_range.onnx";

/// Classifier input edge length: faces are resized to 48x48 grayscale.
pub const CLASSIFIER_INPUT_SIZE: usize = 48;

/// Detected regions narrower or shorter than this are skipped before
/// classification.
pub const MIN_FACE_SIZE: u32 = 20;

/// Default weight artifact file name, looked up when no explicit path is given.
pub const DEFAULT_WEIGHTS_NAME: &str = "emotion_weights.emo1";

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::classification::classifier::EmotionClassifier;

static SHARED: OnceLock<Arc<EmotionClassifier>> = OnceLock::new();

/// Process-wide classifier handle, constructed on first call.
///
/// `weights_path` is honored only by the call that wins initialization;
/// later calls return the existing handle unchanged. Code that needs an
/// isolated weight state (tests, multi-tenant embedders) should construct
/// its own [`EmotionClassifier`] and inject it instead.
pub fn shared_classifier(weights_path: Option<&Path>) -> Arc<EmotionClassifier> {
    SHARED
        .get_or_init(|| Arc::new(EmotionClassifier::new(weights_path)))
        .clone()
}

/// Whether the shared classifier has been constructed yet.
///
/// Liveness-probe surface for external health checks; says nothing about
/// whether weights were loaded (see
/// [`EmotionClassifier::weights_loaded`]).
pub fn classifier_ready() -> bool {
    SHARED.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_handle_is_constructed_once() {
        let first = shared_classifier(None);
        assert!(classifier_ready());
        let second = shared_classifier(None);
        assert!(Arc::ptr_eq(&first, &second));
    }
}

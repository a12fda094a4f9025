//! Phone-use evaluation from a single frame's detections.

use crate::detect::{BoundingBox, DetectedObject};

pub const DEFAULT_TARGET_LABEL: &str = "cell phone";

/// Flags a frame when the detector reported the target object.
///
/// Detections are trusted as given: confidence filtering is the detector's
/// job, so this only matches labels.
#[derive(Clone, Debug)]
pub struct DistractionEvaluator {
    target_label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistractionSignal {
    pub phone_present: bool,
    /// Box of the most confident match.
    pub bbox: Option<BoundingBox>,
}

impl DistractionEvaluator {
    pub fn new(target_label: &str) -> Self {
        Self {
            target_label: target_label.trim().to_string(),
        }
    }

    pub fn target_label(&self) -> &str {
        &self.target_label
    }

    pub fn evaluate(&self, detections: &[DetectedObject]) -> DistractionSignal {
        let best = detections
            .iter()
            .filter(|obj| obj.label.trim().eq_ignore_ascii_case(&self.target_label))
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        DistractionSignal {
            phone_present: best.is_some(),
            bbox: best.map(|obj| obj.bbox),
        }
    }
}

impl Default for DistractionEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LABEL)
    }
}

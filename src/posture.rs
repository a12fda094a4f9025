//! Posture evaluation from a single frame's landmarks.
//!
//! No smoothing happens here. Single-frame noise is absorbed by the
//! condition timers, which require an unbroken streak before alerting.

use crate::detect::{BodyPart, Landmark, LandmarkSet};

pub const DEFAULT_SLOUCH_THRESHOLD: f32 = 0.1;
pub const DEFAULT_TILT_THRESHOLD: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostureThresholds {
    /// Forward-lean displacement (normalized units) above which the person slouches.
    pub slouch: f32,
    /// Shoulder height difference (normalized units) above which the person tilts.
    pub tilt: f32,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            slouch: DEFAULT_SLOUCH_THRESHOLD,
            tilt: DEFAULT_TILT_THRESHOLD,
        }
    }
}

/// Posture signals for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostureSignals {
    pub slouching: bool,
    pub tilting: bool,
    /// Forward-lean displacement, when nose and both shoulders were found.
    pub lean: Option<f32>,
    /// Shoulder height difference, when both shoulders were found.
    pub tilt: Option<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct PostureEvaluator {
    thresholds: PostureThresholds,
}

impl PostureEvaluator {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate one frame. `None` means nobody is in view, which is never bad posture.
    pub fn evaluate(&self, landmarks: Option<&LandmarkSet>) -> PostureSignals {
        let Some(set) = landmarks else {
            return PostureSignals::default();
        };

        let nose = set.get(BodyPart::Nose);
        let left = set.get(BodyPart::LeftShoulder);
        let right = set.get(BodyPart::RightShoulder);

        let (lean, tilt) = match (left, right) {
            (Some(left), Some(right)) => (
                nose.map(|nose| forward_lean(nose, left, right)),
                Some((left.y - right.y).abs()),
            ),
            _ => (None, None),
        };

        PostureSignals {
            slouching: lean.is_some_and(|lean| lean > self.thresholds.slouch),
            tilting: tilt.is_some_and(|tilt| tilt > self.thresholds.tilt),
            lean,
            tilt,
        }
    }
}

/// How far the nose has moved forward of the shoulders.
///
/// Uses relative depth when all three landmarks carry it (nose closer to
/// the camera than the shoulder midpoint). Otherwise falls back to the
/// vertical drop of the nose toward the shoulder line; y grows downward so
/// a positive value means the nose sits below the shoulder midpoint.
///
/// The vertical fallback only flags a slump deep enough to bring the nose
/// below the shoulders. A seated user whose head drifts forward but stays
/// above shoulder height is not reported. Pose backends without depth
/// (YOLOv8-pose among them) therefore miss mild slouching.
fn forward_lean(nose: Landmark, left: Landmark, right: Landmark) -> f32 {
    match (nose.z, left.z, right.z) {
        (Some(nose_z), Some(left_z), Some(right_z)) => (left_z + right_z) / 2.0 - nose_z,
        _ => nose.y - (left.y + right.y) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(nose: Landmark, left: Landmark, right: Landmark) -> LandmarkSet {
        LandmarkSet::new()
            .with(BodyPart::Nose, nose)
            .with(BodyPart::LeftShoulder, left)
            .with(BodyPart::RightShoulder, right)
    }

    #[test]
    fn no_person_is_good_posture() {
        let signals = PostureEvaluator::default().evaluate(None);
        assert!(!signals.slouching);
        assert!(!signals.tilting);
    }

    #[test]
    fn upright_person_is_good_posture() {
        let set = person(
            Landmark::new(0.5, 0.3),
            Landmark::new(0.6, 0.6),
            Landmark::new(0.4, 0.61),
        );
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(!signals.slouching);
        assert!(!signals.tilting);
        assert!(signals.lean.unwrap() < 0.0);
    }

    #[test]
    fn nose_dropping_below_shoulder_line_is_slouching() {
        let set = person(
            Landmark::new(0.5, 0.75),
            Landmark::new(0.6, 0.6),
            Landmark::new(0.4, 0.6),
        );
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(signals.slouching);
        assert!(!signals.tilting);
    }

    #[test]
    fn vertical_fallback_ignores_head_forward_above_shoulders() {
        // Head drooped toward the shoulders but still above them, no depth.
        let set = person(
            Landmark::new(0.5, 0.55),
            Landmark::new(0.6, 0.6),
            Landmark::new(0.4, 0.6),
        );
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(!signals.slouching);
        assert!((signals.lean.unwrap() + 0.05).abs() < 1e-6);

        // The same head position with depth showing the forward lean is caught.
        let set = person(
            Landmark::new(0.5, 0.55).with_depth(-0.35),
            Landmark::new(0.6, 0.6).with_depth(-0.2),
            Landmark::new(0.4, 0.6).with_depth(-0.2),
        );
        assert!(PostureEvaluator::default().evaluate(Some(&set)).slouching);
    }

    #[test]
    fn depth_lean_takes_precedence_when_available() {
        // Vertically upright, but the nose is well in front of the shoulders.
        let set = person(
            Landmark::new(0.5, 0.3).with_depth(-0.4),
            Landmark::new(0.6, 0.6).with_depth(-0.2),
            Landmark::new(0.4, 0.6).with_depth(-0.2),
        );
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(signals.slouching);
        assert!((signals.lean.unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn uneven_shoulders_are_tilting() {
        let set = person(
            Landmark::new(0.5, 0.3),
            Landmark::new(0.6, 0.55),
            Landmark::new(0.4, 0.65),
        );
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(signals.tilting);
        assert!(!signals.slouching);
    }

    #[test]
    fn threshold_is_exclusive() {
        let evaluator = PostureEvaluator::new(PostureThresholds {
            slouch: 0.1,
            tilt: 0.25,
        });
        let set = person(
            Landmark::new(0.5, 0.5),
            Landmark::new(0.6, 0.5),
            Landmark::new(0.4, 0.25),
        );
        let signals = evaluator.evaluate(Some(&set));
        assert!(!signals.tilting);
    }

    #[test]
    fn missing_shoulder_cannot_be_judged() {
        let set = LandmarkSet::new()
            .with(BodyPart::Nose, Landmark::new(0.5, 0.9))
            .with(BodyPart::LeftShoulder, Landmark::new(0.6, 0.2));
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(!signals.slouching && !signals.tilting);
        assert_eq!(signals.lean, None);
        assert_eq!(signals.tilt, None);
    }

    #[test]
    fn missing_nose_still_judges_tilt() {
        let set = LandmarkSet::new()
            .with(BodyPart::LeftShoulder, Landmark::new(0.6, 0.5))
            .with(BodyPart::RightShoulder, Landmark::new(0.4, 0.7));
        let signals = PostureEvaluator::default().evaluate(Some(&set));
        assert!(signals.tilting);
        assert!(!signals.slouching);
    }
}

//! Captured frames.
//!
//! - `Frame`: one captured image. Pixel bytes are private to the crate.
//! - `FrameView`: what the monitor hands to estimator and detector backends.
//!
//! Backends receive pixels only through `FrameView::run_pose` and
//! `FrameView::run_objects`; nothing in the public API hands out the buffer.

use anyhow::Result;
use std::time::Instant;

use crate::detect::{DetectedObject, LandmarkSet, ObjectDetector, PoseEstimator};

/// One captured RGB frame (3 bytes per pixel, row-major).
pub struct Frame {
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Monotonic frame counter assigned by the source.
    pub sequence: u64,

    /// Capture instant. The live loop uses this as the tick time.
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame. Called by the ingestion layer.
    pub(crate) fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Restricted view for running backends.
    pub fn view(&self) -> FrameView<'_> {
        FrameView { frame: self }
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Restricted view of a frame for inference.
pub struct FrameView<'a> {
    frame: &'a Frame,
}

impl<'a> FrameView<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn sequence(&self) -> u64 {
        self.frame.sequence
    }

    /// Run a pose estimator over this frame.
    pub fn run_pose(&self, estimator: &mut dyn PoseEstimator) -> Result<Option<LandmarkSet>> {
        estimator.estimate(&self.frame.data, self.frame.width, self.frame.height)
    }

    /// Run an object detector over this frame.
    pub fn run_objects(&self, detector: &mut dyn ObjectDetector) -> Result<Vec<DetectedObject>> {
        detector.detect(&self.frame.data, self.frame.width, self.frame.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BodyPart, Landmark, ScriptedObjectDetector, ScriptedPoseEstimator};

    fn make_test_frame(data: &[u8]) -> Frame {
        Frame::new(data.to_vec(), 2, 1, 7)
    }

    #[test]
    fn view_provides_metadata() {
        let frame = make_test_frame(b"rgbrgb");
        let view = frame.view();

        assert_eq!(view.width(), 2);
        assert_eq!(view.height(), 1);
        assert_eq!(view.sequence(), 7);
        assert_eq!(frame.byte_len(), 6);
    }

    #[test]
    fn view_runs_backends() {
        let frame = make_test_frame(b"rgbrgb");
        let view = frame.view();

        let mut set = LandmarkSet::new();
        set.insert(BodyPart::Nose, Landmark::new(0.5, 0.3));
        let mut pose = ScriptedPoseEstimator::new(vec![Some(set)]);
        let mut objects = ScriptedObjectDetector::new(vec![vec![DetectedObject::new(
            "cell phone",
            0.9,
        )]]);

        let landmarks = view.run_pose(&mut pose).unwrap().expect("person");
        assert!(landmarks.get(BodyPart::Nose).is_some());
        assert_eq!(view.run_objects(&mut objects).unwrap().len(), 1);
    }
}

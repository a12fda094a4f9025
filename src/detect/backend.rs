use anyhow::Result;

use crate::detect::result::{DetectedObject, LandmarkSet};

/// Pose estimator backend.
///
/// Maps one RGB frame to the landmarks of the person in view. `Ok(None)` is
/// the normal "no person detected" answer and is distinct from every valid
/// landmark set. Errors are reserved for frames the backend could not
/// process at all (wrong size, inference failure).
pub trait PoseEstimator: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Estimate landmarks for a frame.
    ///
    /// Implementations must treat the pixel slice as read-only and ephemeral.
    fn estimate(&mut self, pixels: &[u8], width: u32, height: u32)
        -> Result<Option<LandmarkSet>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Object detector backend.
///
/// Returns detections the backend accepted under its own confidence cutoff,
/// in the order the backend produced them. An empty vector is valid.
pub trait ObjectDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<DetectedObject>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

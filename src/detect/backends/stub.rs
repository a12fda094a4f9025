use anyhow::Result;

use crate::detect::backend::{ObjectDetector, PoseEstimator};
use crate::detect::result::{DetectedObject, LandmarkSet};

/// Stub pose estimator. Never finds a person.
///
/// Used when no model backend is compiled in; every tick evaluates as
/// "no detection", which the monitor treats as good posture.
#[derive(Default)]
pub struct StubPoseEstimator {
    frames_seen: u64,
}

impl StubPoseEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl PoseEstimator for StubPoseEstimator {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn estimate(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Option<LandmarkSet>> {
        self.frames_seen += 1;
        Ok(None)
    }
}

/// Stub object detector. Never detects anything.
#[derive(Default)]
pub struct StubObjectDetector {
    frames_seen: u64,
}

impl StubObjectDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl ObjectDetector for StubObjectDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<DetectedObject>> {
        self.frames_seen += 1;
        Ok(Vec::new())
    }
}

//! Backends that replay prepared outputs, one per frame.
//!
//! The demo binary and the scenario tests drive the monitor through these.
//! Once the script is exhausted the last entry repeats; an empty script
//! behaves like the stub backends.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::{ObjectDetector, PoseEstimator};
use crate::detect::result::{DetectedObject, LandmarkSet};

/// One scripted pose outcome.
#[derive(Clone, Debug)]
enum PoseStep {
    Landmarks(Option<LandmarkSet>),
    Failure(String),
}

pub struct ScriptedPoseEstimator {
    steps: VecDeque<PoseStep>,
    last: Option<PoseStep>,
}

impl ScriptedPoseEstimator {
    pub fn new(outputs: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            steps: outputs.into_iter().map(PoseStep::Landmarks).collect(),
            last: None,
        }
    }

    /// Queue one more output.
    pub fn push(&mut self, output: Option<LandmarkSet>) {
        self.steps.push_back(PoseStep::Landmarks(output));
    }

    /// Queue a backend failure for the next frame.
    pub fn push_failure(&mut self, message: &str) {
        self.steps.push_back(PoseStep::Failure(message.to_string()));
    }
}

impl PoseEstimator for ScriptedPoseEstimator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn estimate(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Option<LandmarkSet>> {
        if let Some(step) = self.steps.pop_front() {
            self.last = Some(step);
        }
        match &self.last {
            Some(PoseStep::Landmarks(output)) => Ok(output.clone()),
            Some(PoseStep::Failure(message)) => Err(anyhow!("scripted failure: {}", message)),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Debug)]
enum ObjectStep {
    Detections(Vec<DetectedObject>),
    Failure(String),
}

pub struct ScriptedObjectDetector {
    steps: VecDeque<ObjectStep>,
    last: Option<ObjectStep>,
}

impl ScriptedObjectDetector {
    pub fn new(outputs: Vec<Vec<DetectedObject>>) -> Self {
        Self {
            steps: outputs.into_iter().map(ObjectStep::Detections).collect(),
            last: None,
        }
    }

    pub fn push(&mut self, output: Vec<DetectedObject>) {
        self.steps.push_back(ObjectStep::Detections(output));
    }

    pub fn push_failure(&mut self, message: &str) {
        self.steps.push_back(ObjectStep::Failure(message.to_string()));
    }
}

impl ObjectDetector for ScriptedObjectDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<DetectedObject>> {
        if let Some(step) = self.steps.pop_front() {
            self.last = Some(step);
        }
        match &self.last {
            Some(ObjectStep::Detections(output)) => Ok(output.clone()),
            Some(ObjectStep::Failure(message)) => Err(anyhow!("scripted failure: {}", message)),
            None => Ok(Vec::new()),
        }
    }
}

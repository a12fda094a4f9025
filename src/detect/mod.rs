mod backend;
pub mod backends;
mod result;

pub use backend::{ObjectDetector, PoseEstimator};
pub use backends::{
    ScriptedObjectDetector, ScriptedPoseEstimator, StubObjectDetector, StubPoseEstimator,
};
#[cfg(feature = "backend-tract")]
pub use backends::{TractObjectDetector, TractPoseEstimator};
pub use result::{BodyPart, BoundingBox, DetectedObject, Landmark, LandmarkSet};

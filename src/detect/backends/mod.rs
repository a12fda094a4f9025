pub mod scripted;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use scripted::{ScriptedObjectDetector, ScriptedPoseEstimator};
pub use stub::{StubObjectDetector, StubPoseEstimator};

#[cfg(feature = "backend-tract")]
pub use tract::{TractObjectDetector, TractPoseEstimator};

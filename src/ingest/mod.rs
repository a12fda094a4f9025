//! Frame ingestion.
//!
//! Sources hand frames to the monitor one at a time:
//! - Synthetic camera (`stub://` device paths), optionally finite
//! - V4L2 webcams (`ingest-v4l2` feature)
//!
//! Sources keep no frame after handing it off and never write frames to disk.

pub mod camera;
pub mod normalize;

use anyhow::Result;

use crate::frame::Frame;

pub use camera::{CameraConfig, CameraSource, CameraStats};

/// Anything that yields frames for the tick loop.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

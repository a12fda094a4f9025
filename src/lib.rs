//! Posture Guard
//!
//! Watches a webcam feed for sustained bad posture (slouching forward,
//! tilting sideways) and for a phone in view, and plays a short reminder
//! clip once a condition has persisted long enough.
//!
//! # Architecture
//!
//! Each frame flows through one tick:
//!
//! 1. **Ingest**: a `FrameSource` yields RGB frames (`ingest`).
//! 2. **Detect**: pluggable backends turn a frame into body landmarks and
//!    detected objects (`detect`).
//! 3. **Evaluate**: landmarks become posture signals (`posture`), detections
//!    become a phone signal (`distraction`).
//! 4. **Track**: each signal feeds a streak timer (`condition`).
//! 5. **Alert**: the dispatcher fires at most one reminder per tick, subject
//!    to the alert threshold and a global cooldown (`alert`).
//!
//! `monitor::Monitor` ties steps 2-5 together. All mutable state lives in
//! `monitor::MonitorState`, owned by the caller; the time of each tick is
//! passed in, so the whole core can be driven on a simulated clock.

pub mod alert;
pub mod condition;
pub mod config;
pub mod detect;
pub mod distraction;
pub mod frame;
pub mod ingest;
pub mod monitor;
pub mod posture;

pub use alert::{
    AlertDispatcher, AlertOutcome, AlertPolicy, AlertRecord, AlertState, ClipPool, CommandPlayer,
    NullPlayer, SoundPlayer,
};
pub use condition::{Condition, ConditionState, ConditionTimers};
pub use config::GuardConfig;
pub use distraction::{DistractionEvaluator, DistractionSignal};
pub use frame::{Frame, FrameView};
pub use ingest::{CameraConfig, CameraSource, FrameSource};
pub use monitor::{Monitor, MonitorState, TickReport};
pub use posture::{PostureEvaluator, PostureSignals, PostureThresholds};

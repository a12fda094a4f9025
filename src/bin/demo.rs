//! demo - scripted end-to-end run on a simulated clock
//!
//! Replays a fixed session (good posture, a long slouch, a break, then
//! tilting while a phone is in view) through the full monitor. Frames come
//! from a synthetic camera, landmarks and detections from scripted backends,
//! and tick times from a simulated clock, so a four minute session finishes
//! in well under a second. Reminders are logged, not played.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use posture_guard::detect::{
    BodyPart, DetectedObject, Landmark, LandmarkSet, ScriptedObjectDetector, ScriptedPoseEstimator,
};
use posture_guard::monitor::format_clock;
use posture_guard::{
    AlertDispatcher, AlertOutcome, AlertPolicy, CameraConfig, CameraSource, ClipPool,
    DistractionEvaluator, Monitor, MonitorState, NullPlayer, PostureEvaluator,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Simulated session length in seconds.
    #[arg(long, default_value_t = 240)]
    seconds: u64,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 2)]
    fps: u32,
    /// Alert threshold in seconds.
    #[arg(long, default_value_t = 60)]
    threshold: u64,
    /// Alert cooldown in seconds.
    #[arg(long, default_value_t = 30)]
    cooldown: u64,
    /// Deterministic seed for clip selection.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

/// What the scripted user is doing at a given second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Upright,
    Slouched,
    Away,
    TiltedWithPhone,
}

fn phase_at(second: u64) -> Phase {
    match second {
        0..=19 => Phase::Upright,
        20..=99 => Phase::Slouched,
        100..=109 => Phase::Away,
        _ => Phase::TiltedWithPhone,
    }
}

fn upright() -> LandmarkSet {
    LandmarkSet::new()
        .with(BodyPart::Nose, Landmark::new(0.50, 0.30))
        .with(BodyPart::LeftShoulder, Landmark::new(0.62, 0.50))
        .with(BodyPart::RightShoulder, Landmark::new(0.38, 0.50))
}

fn slouched() -> LandmarkSet {
    LandmarkSet::new()
        .with(BodyPart::Nose, Landmark::new(0.50, 0.65))
        .with(BodyPart::LeftShoulder, Landmark::new(0.62, 0.50))
        .with(BodyPart::RightShoulder, Landmark::new(0.38, 0.50))
}

fn tilted() -> LandmarkSet {
    LandmarkSet::new()
        .with(BodyPart::Nose, Landmark::new(0.50, 0.30))
        .with(BodyPart::LeftShoulder, Landmark::new(0.62, 0.44))
        .with(BodyPart::RightShoulder, Landmark::new(0.38, 0.56))
}

fn phone() -> DetectedObject {
    DetectedObject::new("cell phone", 0.82)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let policy = AlertPolicy {
        threshold: Duration::from_secs(args.threshold),
        cooldown: Duration::from_secs(args.cooldown),
    };
    let clips = ClipPool::fixed(vec![
        PathBuf::from("sounds/sit_up_straight.mp3"),
        PathBuf::from("sounds/shoulders_back.wav"),
        PathBuf::from("sounds/put_the_phone_down.mp3"),
    ]);
    let dispatcher =
        AlertDispatcher::new(policy, clips, Box::new(NullPlayer)).with_seed(args.seed);
    let mut monitor = Monitor::new(
        PostureEvaluator::default(),
        DistractionEvaluator::default(),
        dispatcher,
    );
    let mut state = MonitorState::new();

    let fps = args.fps.max(1);
    let total_frames = args.seconds * u64::from(fps);
    let mut source = CameraSource::new(CameraConfig {
        device: "stub://demo".to_string(),
        target_fps: 1000,
        width: 32,
        height: 24,
        max_frames: Some(total_frames),
    })?;
    source.connect()?;

    let mut pose = ScriptedPoseEstimator::new(Vec::new());
    let mut objects = ScriptedObjectDetector::new(Vec::new());

    let base = Instant::now();
    let step = Duration::from_secs(1) / fps;
    let mut tick = 0u32;
    let mut last_phase = None;

    log::info!(
        "demo: {}s session at {} fps, threshold={}s cooldown={}s seed={}",
        args.seconds,
        fps,
        args.threshold,
        args.cooldown,
        args.seed
    );

    while let Some(frame) = source.next_frame()? {
        let offset = step * tick;
        tick += 1;
        let phase = phase_at(offset.as_secs());
        if last_phase != Some(phase) {
            log::info!("[{}] user is now {:?}", format_clock(offset), phase);
            last_phase = Some(phase);
        }

        match phase {
            Phase::Upright => {
                pose.push(Some(upright()));
                objects.push(Vec::new());
            }
            Phase::Slouched => {
                pose.push(Some(slouched()));
                objects.push(Vec::new());
            }
            Phase::Away => {
                pose.push(None);
                objects.push(Vec::new());
            }
            Phase::TiltedWithPhone => {
                pose.push(Some(tilted()));
                objects.push(vec![phone()]);
            }
        }

        let report = monitor.process_frame(
            &mut state,
            &frame,
            &mut pose,
            &mut objects,
            base + offset,
        );
        match &report.alert {
            AlertOutcome::Fired(record) => {
                let clip = record
                    .clip
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "<no clip>".to_string());
                log::info!(
                    "[{}] ALERT {} after {} -> {}",
                    format_clock(offset),
                    record.condition.label(),
                    format_clock(record.streak),
                    clip
                );
            }
            AlertOutcome::Suppressed { eligible, remaining } => {
                log::debug!(
                    "[{}] {:?} waiting on cooldown ({}s left)",
                    format_clock(offset),
                    eligible,
                    remaining.as_secs()
                );
            }
            AlertOutcome::Idle => {}
        }

        if offset.subsec_nanos() == 0 && offset.as_secs() % 30 == 0 {
            for line in report.status_lines(monitor.alert_threshold()) {
                log::info!("[{}] {}", format_clock(offset), line);
            }
        }
    }

    log::info!(
        "demo complete: {} frames, {} alerts",
        tick,
        state.alerts().alerts_fired()
    );
    Ok(())
}

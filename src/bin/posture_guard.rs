//! posture_guard - webcam posture and phone-use reminder daemon
//!
//! This daemon:
//! 1. Captures frames from the configured camera
//! 2. Runs pose estimation and object detection on each frame
//! 3. Tracks how long each bad condition has lasted
//! 4. Plays a random reminder clip once a condition persists past the threshold
//!
//! Press Ctrl-C, or type `q` and Enter, to stop.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use posture_guard::detect::{ObjectDetector, PoseEstimator, StubObjectDetector, StubPoseEstimator};
use posture_guard::{
    AlertDispatcher, AlertOutcome, CameraSource, ClipPool, CommandPlayer, DistractionEvaluator,
    GuardConfig, Monitor, MonitorState, PostureEvaluator,
};

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about = "Webcam posture and phone-use reminders")]
struct Args {
    /// Config file (JSON or TOML).
    #[arg(long, env = "POSTURE_GUARD_CONFIG")]
    config: Option<PathBuf>,
    /// Camera device, overriding the config (e.g. /dev/video0 or stub://webcam).
    #[arg(long)]
    device: Option<String>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Seed clip selection for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = GuardConfig::load_from(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.camera.device = device;
    }
    if args.max_frames.is_some() {
        config.camera.max_frames = args.max_frames;
    }

    let (mut pose, mut objects) = build_backends(&config)?;
    pose.warm_up()?;
    objects.warm_up()?;

    let player = CommandPlayer::new(&config.alerts.player)?;
    let mut dispatcher = AlertDispatcher::new(
        config.alert_policy()?,
        ClipPool::directory(&config.alerts.sounds_dir),
        Box::new(player),
    );
    if let Some(seed) = args.seed {
        dispatcher = dispatcher.with_seed(seed);
    }
    let mut monitor = Monitor::new(
        PostureEvaluator::new(config.posture_thresholds()),
        DistractionEvaluator::new(&config.distraction.target_label),
        dispatcher,
    );
    let mut state = MonitorState::new();

    let mut source = CameraSource::new(config.camera_config())?;
    source.connect()?;

    let running = Arc::new(AtomicBool::new(true));
    install_stop_handlers(Arc::clone(&running))?;

    let clips = ClipPool::directory(&config.alerts.sounds_dir).clips();
    if clips.is_empty() {
        log::warn!(
            "no reminder clips found in {}; alerts will be silent",
            config.alerts.sounds_dir.display()
        );
    }
    log::info!(
        "posture_guard running. camera={} pose={} objects={} clips={}",
        config.camera.device,
        pose.name(),
        objects.name(),
        clips.len()
    );
    log::info!(
        "alert threshold={}s cooldown={}s slouch>{} tilt>{} target=\"{}\"",
        config.alerts.threshold_secs,
        config.alerts.cooldown_secs,
        config.posture.slouch_threshold,
        config.posture.tilt_threshold,
        config.distraction.target_label
    );

    let mut last_status_log = Instant::now();

    while running.load(Ordering::SeqCst) {
        let Some(frame) = source.next_frame()? else {
            log::info!("camera stream ended");
            break;
        };

        let report = monitor.process_frame(
            &mut state,
            &frame,
            &mut *pose,
            &mut *objects,
            frame.captured_at,
        );

        if let AlertOutcome::Suppressed {
            eligible,
            remaining,
        } = &report.alert
        {
            log::debug!(
                "alert held back for {:?}: cooldown {}ms left",
                eligible,
                remaining.as_millis()
            );
        }

        if last_status_log.elapsed() >= STATUS_INTERVAL {
            for line in report.status_lines(monitor.alert_threshold()) {
                log::info!("{}", line);
            }
            let stats = source.stats();
            log::info!(
                "camera health={} frames={} device={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.device
            );
            last_status_log = Instant::now();
        }
    }

    log::info!(
        "posture_guard stopped after {} alerts",
        state.alerts().alerts_fired()
    );
    Ok(())
}

type Backends = (Box<dyn PoseEstimator>, Box<dyn ObjectDetector>);

#[cfg(feature = "backend-tract")]
fn build_backends(config: &GuardConfig) -> Result<Backends> {
    use posture_guard::detect::{TractObjectDetector, TractPoseEstimator};

    let models = &config.models;
    if models.pose.exists() && models.objects.exists() {
        let pose = TractPoseEstimator::new(&models.pose, models.input_size)?;
        let objects = TractObjectDetector::new(&models.objects, models.input_size)?
            .with_threshold(config.distraction.min_confidence);
        return Ok((Box::new(pose), Box::new(objects)));
    }
    log::warn!(
        "models not found ({} / {}); running with stub backends",
        models.pose.display(),
        models.objects.display()
    );
    Ok(stub_backends())
}

#[cfg(not(feature = "backend-tract"))]
fn build_backends(_config: &GuardConfig) -> Result<Backends> {
    log::warn!("built without backend-tract; running with stub backends (no detections)");
    Ok(stub_backends())
}

fn stub_backends() -> Backends {
    (
        Box::new(StubPoseEstimator::new()),
        Box::new(StubObjectDetector::new()),
    )
}

fn install_stop_handlers(running: Arc<AtomicBool>) -> Result<()> {
    let on_signal = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("shutdown signal received");
        on_signal.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                log::info!("quit requested");
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    });
    Ok(())
}

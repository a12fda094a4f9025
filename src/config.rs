use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alert::{default_player_command, AlertPolicy};
use crate::ingest::CameraConfig;
use crate::posture::{PostureThresholds, DEFAULT_SLOUCH_THRESHOLD, DEFAULT_TILT_THRESHOLD};

const DEFAULT_ALERT_THRESHOLD_SECS: f64 = 60.0;
const DEFAULT_ALERT_COOLDOWN_SECS: f64 = 30.0;
const DEFAULT_SOUNDS_DIR: &str = "sounds";
const DEFAULT_TARGET_LABEL: &str = crate::distraction::DEFAULT_TARGET_LABEL;
const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
const DEFAULT_CAMERA: &str = "stub://webcam";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_POSE_MODEL: &str = "models/yolov8n-pose.onnx";
const DEFAULT_OBJECT_MODEL: &str = "models/yolov8n.onnx";
const DEFAULT_MODEL_INPUT: u32 = 640;

#[derive(Debug, Deserialize, Default)]
struct GuardConfigFile {
    alerts: Option<AlertsConfigFile>,
    posture: Option<PostureConfigFile>,
    distraction: Option<DistractionConfigFile>,
    camera: Option<CameraConfigFile>,
    models: Option<ModelsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertsConfigFile {
    threshold_secs: Option<f64>,
    cooldown_secs: Option<f64>,
    sounds_dir: Option<PathBuf>,
    player: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PostureConfigFile {
    slouch_threshold: Option<f32>,
    tilt_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DistractionConfigFile {
    target_label: Option<String>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelsConfigFile {
    pose: Option<PathBuf>,
    objects: Option<PathBuf>,
    input_size: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub alerts: AlertSettings,
    pub posture: PostureSettings,
    pub distraction: DistractionSettings,
    pub camera: CameraSettings,
    pub models: ModelSettings,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    /// Seconds of unbroken bad behavior before an alert.
    pub threshold_secs: f64,
    /// Seconds between any two alerts.
    pub cooldown_secs: f64,
    pub sounds_dir: PathBuf,
    /// Player command line; the clip path is appended.
    pub player: String,
}

#[derive(Debug, Clone)]
pub struct PostureSettings {
    pub slouch_threshold: f32,
    pub tilt_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct DistractionSettings {
    pub target_label: String,
    /// Detector-side acceptance cutoff.
    pub min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub pose: PathBuf,
    pub objects: PathBuf,
    pub input_size: u32,
}

impl GuardConfig {
    /// Defaults, then the file named by `POSTURE_GUARD_CONFIG`, then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("POSTURE_GUARD_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Same as `load`, with an explicit config file path.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: GuardConfigFile) -> Self {
        let alerts = file.alerts.unwrap_or_default();
        let posture = file.posture.unwrap_or_default();
        let distraction = file.distraction.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        let models = file.models.unwrap_or_default();

        Self {
            alerts: AlertSettings {
                threshold_secs: alerts.threshold_secs.unwrap_or(DEFAULT_ALERT_THRESHOLD_SECS),
                cooldown_secs: alerts.cooldown_secs.unwrap_or(DEFAULT_ALERT_COOLDOWN_SECS),
                sounds_dir: alerts
                    .sounds_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SOUNDS_DIR)),
                player: alerts
                    .player
                    .unwrap_or_else(|| default_player_command().to_string()),
            },
            posture: PostureSettings {
                slouch_threshold: posture.slouch_threshold.unwrap_or(DEFAULT_SLOUCH_THRESHOLD),
                tilt_threshold: posture.tilt_threshold.unwrap_or(DEFAULT_TILT_THRESHOLD),
            },
            distraction: DistractionSettings {
                target_label: distraction
                    .target_label
                    .unwrap_or_else(|| DEFAULT_TARGET_LABEL.to_string()),
                min_confidence: distraction.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
            },
            camera: CameraSettings {
                device: camera
                    .device
                    .unwrap_or_else(|| DEFAULT_CAMERA.to_string()),
                target_fps: camera.target_fps.unwrap_or(DEFAULT_CAMERA_FPS),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
                max_frames: camera.max_frames,
            },
            models: ModelSettings {
                pose: models
                    .pose
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_POSE_MODEL)),
                objects: models
                    .objects
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OBJECT_MODEL)),
                input_size: models.input_size.unwrap_or(DEFAULT_MODEL_INPUT),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(secs) = env_number::<f64>("POSTURE_GUARD_ALERT_THRESHOLD")? {
            self.alerts.threshold_secs = secs;
        }
        if let Some(secs) = env_number::<f64>("POSTURE_GUARD_ALERT_COOLDOWN")? {
            self.alerts.cooldown_secs = secs;
        }
        if let Some(value) = env_number::<f32>("POSTURE_GUARD_SLOUCH_THRESHOLD")? {
            self.posture.slouch_threshold = value;
        }
        if let Some(value) = env_number::<f32>("POSTURE_GUARD_TILT_THRESHOLD")? {
            self.posture.tilt_threshold = value;
        }
        if let Some(dir) = env_string("POSTURE_GUARD_SOUNDS_DIR") {
            self.alerts.sounds_dir = PathBuf::from(dir);
        }
        if let Some(player) = env_string("POSTURE_GUARD_PLAYER") {
            self.alerts.player = player;
        }
        if let Some(device) = env_string("POSTURE_GUARD_CAMERA") {
            self.camera.device = device;
        }
        if let Some(label) = env_string("POSTURE_GUARD_PHONE_LABEL") {
            self.distraction.target_label = label;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !self.alerts.threshold_secs.is_finite() || self.alerts.threshold_secs <= 0.0 {
            return Err(anyhow!("alert threshold must be greater than zero seconds"));
        }
        if !self.alerts.cooldown_secs.is_finite() || self.alerts.cooldown_secs < 0.0 {
            return Err(anyhow!("alert cooldown must not be negative"));
        }
        if !self.posture.slouch_threshold.is_finite() || self.posture.slouch_threshold <= 0.0 {
            return Err(anyhow!("slouch threshold must be greater than zero"));
        }
        if !self.posture.tilt_threshold.is_finite() || self.posture.tilt_threshold <= 0.0 {
            return Err(anyhow!("tilt threshold must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.distraction.min_confidence) {
            return Err(anyhow!("detector min_confidence must be within 0..=1"));
        }
        self.distraction.target_label = self.distraction.target_label.trim().to_string();
        if self.distraction.target_label.is_empty() {
            return Err(anyhow!("distraction target label must not be empty"));
        }
        if self.alerts.player.trim().is_empty() {
            return Err(anyhow!("sound player command must not be empty"));
        }
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera device must not be empty"));
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera width and height must be greater than zero"));
        }
        if self.models.input_size == 0 {
            return Err(anyhow!("model input_size must be greater than zero"));
        }
        self.alert_policy()?;
        Ok(())
    }

    /// Threshold and cooldown as durations. Fails for values a `Duration`
    /// cannot hold.
    pub fn alert_policy(&self) -> Result<AlertPolicy> {
        Ok(AlertPolicy {
            threshold: secs_to_duration("alert threshold", self.alerts.threshold_secs)?,
            cooldown: secs_to_duration("alert cooldown", self.alerts.cooldown_secs)?,
        })
    }

    pub fn posture_thresholds(&self) -> PostureThresholds {
        PostureThresholds {
            slouch: self.posture.slouch_threshold,
            tilt: self.posture.tilt_threshold,
        }
    }

    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.camera.device.clone(),
            target_fps: self.camera.target_fps,
            width: self.camera.width,
            height: self.camera.height,
            max_frames: self.camera.max_frames,
        }
    }
}

fn read_config_file(path: &Path) -> Result<GuardConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))
    }
}

fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| anyhow!("{} of {} seconds is out of range: {}", name, secs, e))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a number, got {:?}", key, value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_settings() {
        let cfg = GuardConfig::from_file(GuardConfigFile::default());
        let policy = cfg.alert_policy().unwrap();
        assert_eq!(policy.threshold, Duration::from_secs(60));
        assert_eq!(policy.cooldown, Duration::from_secs(30));
        assert_eq!(cfg.posture_thresholds(), PostureThresholds::default());
        assert_eq!(cfg.alerts.sounds_dir, PathBuf::from("sounds"));
        assert_eq!(cfg.distraction.target_label, "cell phone");
        assert_eq!(cfg.camera_config().device, "stub://webcam");
    }

    #[test]
    fn validation_rejects_out_of_domain_values() {
        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.alerts.cooldown_secs = 0.0;
        assert!(cfg.validate().is_ok());

        cfg.alerts.cooldown_secs = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.alerts.threshold_secs = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.alerts.threshold_secs = 1e30;
        assert!(cfg.validate().is_err());
        assert!(cfg.alert_policy().is_err());

        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.alerts.cooldown_secs = f64::MAX;
        assert!(cfg.validate().is_err());

        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.posture.tilt_threshold = -0.05;
        assert!(cfg.validate().is_err());

        let mut cfg = GuardConfig::from_file(GuardConfigFile::default());
        cfg.distraction.min_confidence = 1.5;
        assert!(cfg.validate().is_err());
    }
}

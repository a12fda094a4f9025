use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use posture_guard::config::GuardConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "POSTURE_GUARD_CONFIG",
        "POSTURE_GUARD_ALERT_THRESHOLD",
        "POSTURE_GUARD_ALERT_COOLDOWN",
        "POSTURE_GUARD_SLOUCH_THRESHOLD",
        "POSTURE_GUARD_TILT_THRESHOLD",
        "POSTURE_GUARD_SOUNDS_DIR",
        "POSTURE_GUARD_CAMERA",
        "POSTURE_GUARD_PLAYER",
        "POSTURE_GUARD_PHONE_LABEL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "alerts": {
            "threshold_secs": 45,
            "cooldown_secs": 20.5,
            "sounds_dir": "/opt/reminders",
            "player": "mpg123 -q"
        },
        "posture": {
            "slouch_threshold": 0.12
        },
        "distraction": {
            "target_label": "Cell Phone",
            "min_confidence": 0.6
        },
        "camera": {
            "device": "/dev/video2",
            "target_fps": 15,
            "width": 1280,
            "height": 720
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("POSTURE_GUARD_CONFIG", file.path());
    std::env::set_var("POSTURE_GUARD_ALERT_COOLDOWN", "10");
    std::env::set_var("POSTURE_GUARD_TILT_THRESHOLD", "0.08");
    std::env::set_var("POSTURE_GUARD_CAMERA", "stub://desk");

    let cfg = GuardConfig::load().expect("load config");

    let policy = cfg.alert_policy().expect("alert policy");
    assert_eq!(policy.threshold, Duration::from_secs(45));
    assert_eq!(policy.cooldown, Duration::from_secs(10));
    assert_eq!(cfg.alerts.sounds_dir, PathBuf::from("/opt/reminders"));
    assert_eq!(cfg.alerts.player, "mpg123 -q");
    assert_eq!(cfg.posture.slouch_threshold, 0.12);
    assert_eq!(cfg.posture.tilt_threshold, 0.08);
    assert_eq!(cfg.distraction.target_label, "Cell Phone");
    assert_eq!(cfg.distraction.min_confidence, 0.6);

    let camera = cfg.camera_config();
    assert_eq!(camera.device, "stub://desk");
    assert_eq!(camera.target_fps, 15);
    assert_eq!(camera.width, 1280);
    assert_eq!(camera.height, 720);
    assert_eq!(camera.max_frames, None);

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
        [alerts]
        threshold_secs = 90.0
        cooldown_secs = 0.0

        [camera]
        device = "stub://toml"
        max_frames = 300
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    let cfg = GuardConfig::load_from(Some(file.path())).expect("load config");

    assert_eq!(cfg.alert_policy().unwrap().threshold, Duration::from_secs(90));
    assert_eq!(cfg.alert_policy().unwrap().cooldown, Duration::ZERO);
    assert_eq!(cfg.camera.device, "stub://toml");
    assert_eq!(cfg.camera.max_frames, Some(300));
    assert_eq!(cfg.distraction.target_label, "cell phone");

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = GuardConfig::load().expect("load defaults");

    assert_eq!(cfg.alert_policy().unwrap().threshold, Duration::from_secs(60));
    assert_eq!(cfg.alert_policy().unwrap().cooldown, Duration::from_secs(30));
    assert_eq!(cfg.posture.slouch_threshold, 0.1);
    assert_eq!(cfg.posture.tilt_threshold, 0.05);
    assert_eq!(cfg.alerts.sounds_dir, PathBuf::from("sounds"));
    assert_eq!(cfg.camera.device, "stub://webcam");

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("POSTURE_GUARD_ALERT_THRESHOLD", "0");
    assert!(GuardConfig::load().is_err());
    clear_env();

    std::env::set_var("POSTURE_GUARD_ALERT_COOLDOWN", "-5");
    assert!(GuardConfig::load().is_err());
    clear_env();

    std::env::set_var("POSTURE_GUARD_ALERT_THRESHOLD", "1e30");
    let err = GuardConfig::load_from(None).expect_err("threshold beyond Duration range");
    assert!(err.to_string().contains("alert threshold"));
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{"alerts": {"cooldown_secs": 1e300}}"#)
        .expect("write config");
    assert!(GuardConfig::load_from(Some(file.path())).is_err());

    std::env::set_var("POSTURE_GUARD_SLOUCH_THRESHOLD", "lots");
    let err = GuardConfig::load().expect_err("non-numeric threshold");
    assert!(err.to_string().contains("POSTURE_GUARD_SLOUCH_THRESHOLD"));
    clear_env();

    std::env::set_var("POSTURE_GUARD_PHONE_LABEL", "   ");
    let cfg = GuardConfig::load().expect("blank override is ignored");
    assert_eq!(cfg.distraction.target_label, "cell phone");
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{"camera": {"target_fps": 0}}"#)
        .expect("write config");
    assert!(GuardConfig::load_from(Some(file.path())).is_err());

    let missing = file.path().with_extension("missing.json");
    assert!(GuardConfig::load_from(Some(&missing)).is_err());

    clear_env();
}

//! Reminder clips and playback.
//!
//! Playback is fire-and-forget: `SoundPlayer::play` returns immediately and
//! never reports back to the caller. Failures are logged.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

const CLIP_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Pool of reminder clips.
///
/// A directory pool is re-listed on every pick so clips added or removed
/// while the daemon runs are picked up on the next alert.
#[derive(Clone, Debug)]
pub enum ClipPool {
    Directory(PathBuf),
    Fixed(Vec<PathBuf>),
}

impl ClipPool {
    pub fn directory<P: Into<PathBuf>>(dir: P) -> Self {
        ClipPool::Directory(dir.into())
    }

    pub fn fixed(clips: Vec<PathBuf>) -> Self {
        ClipPool::Fixed(clips)
    }

    pub fn empty() -> Self {
        ClipPool::Fixed(Vec::new())
    }

    /// Current clips, sorted so that a seeded pick is reproducible.
    pub fn clips(&self) -> Vec<PathBuf> {
        match self {
            ClipPool::Directory(dir) => match list_clips(dir) {
                Ok(clips) => clips,
                Err(err) => {
                    log::warn!("clip pool: {:#}", err);
                    Vec::new()
                }
            },
            ClipPool::Fixed(clips) => clips.clone(),
        }
    }

    /// Pick one clip uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PathBuf> {
        self.clips().choose(rng).cloned()
    }
}

fn list_clips(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read sounds directory {}", dir.display()))?;
    let mut clips = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list sounds directory {}", dir.display()))?
            .path();
        if path.is_file() && is_clip(&path) {
            clips.push(path);
        }
    }
    clips.sort();
    Ok(clips)
}

fn is_clip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CLIP_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Plays one clip without blocking the caller.
pub trait SoundPlayer: Send {
    fn play(&self, clip: &Path);
}

/// Discards every request. Used by the demo and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPlayer;

impl SoundPlayer for NullPlayer {
    fn play(&self, clip: &Path) {
        log::debug!("null player: skipping {}", clip.display());
    }
}

/// Spawns an external player program per clip, appending the clip path to
/// its arguments. The child is reaped on a detached thread.
#[derive(Clone, Debug)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Parse a whitespace-separated command line such as `ffplay -nodisp -autoexit`.
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("sound player command must not be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&self, clip: &Path) {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                let program = self.program.clone();
                std::thread::spawn(move || {
                    if let Err(err) = child.wait() {
                        log::warn!("sound player {} did not exit cleanly: {}", program, err);
                    }
                });
            }
            Err(err) => {
                log::warn!(
                    "failed to start sound player {} for {}: {}",
                    self.program,
                    clip.display(),
                    err
                );
            }
        }
    }
}

/// Platform default player command line.
pub fn default_player_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "afplay"
    } else {
        "ffplay -nodisp -autoexit -loglevel quiet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn directory_pool_lists_only_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.wav", "a.MP3", "notes.txt", "c.ogg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let clips = ClipPool::directory(dir.path()).clips();
        let names: Vec<_> = clips
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.MP3", "b.wav"]);
    }

    #[test]
    fn missing_directory_is_an_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ClipPool::directory(dir.path().join("does-not-exist"));
        assert!(pool.clips().is_empty());
        assert!(pool.pick(&mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn seeded_pick_is_reproducible() {
        let pool = ClipPool::fixed(
            (0..8)
                .map(|i| PathBuf::from(format!("clip{}.wav", i)))
                .collect(),
        );
        let first: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..5).map(|_| pool.pick(&mut rng).unwrap()).collect()
        };
        let second: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..5).map(|_| pool.pick(&mut rng).unwrap()).collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn command_player_parses_command_line() {
        let player = CommandPlayer::new("  mpg123   -q ").unwrap();
        assert_eq!(player.program(), "mpg123");
        assert_eq!(player.args().to_vec(), vec!["-q".to_string()]);
        assert!(CommandPlayer::new("   ").is_err());
    }

    #[test]
    fn command_player_survives_missing_program() {
        let player = CommandPlayer::new("posture-guard-no-such-player-binary").unwrap();
        player.play(Path::new("clip.wav"));
    }
}

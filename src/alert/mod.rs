//! Alert dispatch.
//!
//! Once per tick the dispatcher looks for conditions whose streak has
//! reached the alert threshold without an alert yet, and fires at most one
//! reminder subject to a global cooldown:
//!
//! 1. No eligible condition: nothing happens.
//! 2. Cooldown still running: nothing happens and nothing is marked, so the
//!    condition stays eligible for the next tick.
//! 3. Otherwise the highest-priority eligible condition (see
//!    `Condition::ALL`) is marked alerted, the alert time is recorded and a
//!    random clip is handed to the player.
//!
//! An empty clip pool does not cancel the alert bookkeeping; the attempt
//! still counts for the cooldown and for the streak.

pub mod sound;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::condition::{Condition, ConditionTimers};

pub use sound::{default_player_command, ClipPool, CommandPlayer, NullPlayer, SoundPlayer};

pub const DEFAULT_ALERT_THRESHOLD: Duration = Duration::from_secs(60);
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Minimum unbroken streak before a condition may alert.
    pub threshold: Duration,
    /// Minimum spacing between any two alerts.
    pub cooldown: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
            cooldown: DEFAULT_ALERT_COOLDOWN,
        }
    }
}

/// Process-wide alert bookkeeping. Only the dispatcher mutates it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertState {
    last_alert_time: Option<Instant>,
    alerts_fired: u64,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_alert_time(&self) -> Option<Instant> {
        self.last_alert_time
    }

    pub fn alerts_fired(&self) -> u64 {
        self.alerts_fired
    }

    /// Time left before another alert may fire.
    pub fn cooldown_remaining(&self, now: Instant, cooldown: Duration) -> Duration {
        self.last_alert_time
            .map(|last| cooldown.saturating_sub(now.saturating_duration_since(last)))
            .unwrap_or_default()
    }
}

/// A reminder that fired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertRecord {
    pub condition: Condition,
    pub at: Instant,
    /// Streak length at the moment of the alert.
    pub streak: Duration,
    /// Clip handed to the player; `None` when the pool was empty.
    pub clip: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlertOutcome {
    Idle,
    /// Eligible conditions held back by the cooldown.
    Suppressed {
        eligible: Vec<Condition>,
        remaining: Duration,
    },
    Fired(AlertRecord),
}

impl AlertOutcome {
    pub fn fired(&self) -> Option<&AlertRecord> {
        match self {
            AlertOutcome::Fired(record) => Some(record),
            _ => None,
        }
    }
}

pub struct AlertDispatcher {
    policy: AlertPolicy,
    clips: ClipPool,
    player: Box<dyn SoundPlayer>,
    rng: StdRng,
}

impl AlertDispatcher {
    pub fn new(policy: AlertPolicy, clips: ClipPool, player: Box<dyn SoundPlayer>) -> Self {
        Self {
            policy,
            clips,
            player,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the clip-selection random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Seed clip selection for reproducible runs.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    pub fn dispatch(
        &mut self,
        timers: &mut ConditionTimers,
        alerts: &mut AlertState,
        now: Instant,
    ) -> AlertOutcome {
        let eligible = timers.eligible(now, self.policy.threshold);
        let Some(&condition) = eligible.first() else {
            return AlertOutcome::Idle;
        };

        let remaining = alerts.cooldown_remaining(now, self.policy.cooldown);
        if alerts.last_alert_time.is_some() && !remaining.is_zero() {
            return AlertOutcome::Suppressed {
                eligible,
                remaining,
            };
        }

        let streak = timers.elapsed(condition, now);
        timers.mark_alerted(condition);
        alerts.last_alert_time = Some(now);
        alerts.alerts_fired += 1;

        let clip = self.clips.pick(&mut self.rng);
        match &clip {
            Some(path) => {
                log::info!(
                    "alert: {} for {}s, playing {}",
                    condition,
                    streak.as_secs(),
                    path.display()
                );
                self.player.play(path);
            }
            None => {
                log::warn!(
                    "alert: {} for {}s, but no reminder clips are available",
                    condition,
                    streak.as_secs()
                );
            }
        }

        AlertOutcome::Fired(AlertRecord {
            condition,
            at: now,
            streak,
            clip,
        })
    }
}

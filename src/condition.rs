//! Monitored conditions and their streak timers.
//!
//! A condition's streak starts on the first active tick and ends on the
//! first inactive one. There is no grace period: one inactive tick clears
//! both the streak start and the alerted flag.

use std::fmt;
use std::time::{Duration, Instant};

/// Monitored bad-behavior classes.
///
/// Declaration order is the alert priority when several conditions become
/// eligible on the same tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    Slouching,
    Tilting,
    PhonePresent,
}

impl Condition {
    /// All conditions in priority order.
    pub const ALL: [Condition; 3] = [
        Condition::Slouching,
        Condition::Tilting,
        Condition::PhonePresent,
    ];

    fn index(self) -> usize {
        match self {
            Condition::Slouching => 0,
            Condition::Tilting => 1,
            Condition::PhonePresent => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Condition::Slouching => "slouching",
            Condition::Tilting => "tilting",
            Condition::PhonePresent => "phone_present",
        }
    }

    /// Status text shown while the condition is active.
    pub fn label(self) -> &'static str {
        match self {
            Condition::Slouching => "Slouching forward",
            Condition::Tilting => "Tilting sideways",
            Condition::PhonePresent => "Phone detected",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Streak state of one condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConditionState {
    pub active: bool,
    pub since: Option<Instant>,
    pub alerted: bool,
}

impl ConditionState {
    /// Apply this tick's observation.
    pub fn observe(&mut self, active: bool, now: Instant) {
        self.active = active;
        if active {
            if self.since.is_none() {
                self.since = Some(now);
            }
        } else {
            self.since = None;
            self.alerted = false;
        }
    }

    /// Length of the current streak; zero when inactive.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default()
    }

    /// Active long enough and not yet alerted this streak.
    pub fn is_eligible(&self, now: Instant, threshold: Duration) -> bool {
        self.active && !self.alerted && self.since.is_some() && self.elapsed(now) >= threshold
    }
}

/// Per-condition timers for all monitored conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionTimers {
    states: [ConditionState; 3],
}

impl ConditionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, condition: Condition, active: bool, now: Instant) {
        self.states[condition.index()].observe(active, now);
    }

    pub fn state(&self, condition: Condition) -> ConditionState {
        self.states[condition.index()]
    }

    pub fn elapsed(&self, condition: Condition, now: Instant) -> Duration {
        self.states[condition.index()].elapsed(now)
    }

    pub(crate) fn mark_alerted(&mut self, condition: Condition) {
        self.states[condition.index()].alerted = true;
    }

    /// Eligible conditions in priority order.
    pub fn eligible(&self, now: Instant, threshold: Duration) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|condition| self.state(*condition).is_eligible(now, threshold))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_secs(60);

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn streak_starts_on_first_active_tick() {
        let base = Instant::now();
        let mut state = ConditionState::default();

        state.observe(true, at(base, 5));
        state.observe(true, at(base, 6));
        assert_eq!(state.since, Some(at(base, 5)));
        assert_eq!(state.elapsed(at(base, 20)), Duration::from_secs(15));
    }

    #[test]
    fn inactive_tick_resets_streak_and_alerted() {
        let base = Instant::now();
        let mut timers = ConditionTimers::new();

        timers.observe(Condition::Tilting, true, base);
        timers.mark_alerted(Condition::Tilting);
        timers.observe(Condition::Tilting, false, at(base, 1));

        let state = timers.state(Condition::Tilting);
        assert!(!state.active);
        assert_eq!(state.since, None);
        assert!(!state.alerted);
        assert_eq!(timers.elapsed(Condition::Tilting, at(base, 2)), Duration::ZERO);
    }

    #[test]
    fn eligibility_requires_full_threshold() {
        let base = Instant::now();
        let mut state = ConditionState::default();

        state.observe(true, base);
        assert!(!state.is_eligible(at(base, 59), THRESHOLD));
        assert!(state.is_eligible(at(base, 60), THRESHOLD));

        state.alerted = true;
        assert!(!state.is_eligible(at(base, 600), THRESHOLD));
    }

    #[test]
    fn eligible_lists_in_priority_order() {
        let base = Instant::now();
        let mut timers = ConditionTimers::new();
        for condition in [Condition::PhonePresent, Condition::Slouching] {
            timers.observe(condition, true, base);
        }
        timers.observe(Condition::Tilting, false, base);

        assert_eq!(
            timers.eligible(at(base, 60), THRESHOLD),
            vec![Condition::Slouching, Condition::PhonePresent]
        );
        assert!(!timers.state(Condition::Tilting).active);
    }
}

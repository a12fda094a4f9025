//! The per-tick monitoring step.
//!
//! `Monitor::tick` is the whole core for one frame: evaluate posture and
//! distraction, feed the condition timers, then let the dispatcher decide
//! whether to alert. All mutable state lives in `MonitorState`, which the
//! caller owns and passes in, so a fresh state replays identically.

use std::time::{Duration, Instant};

use crate::alert::{AlertDispatcher, AlertOutcome, AlertState};
use crate::condition::{Condition, ConditionState, ConditionTimers};
use crate::detect::{DetectedObject, LandmarkSet, ObjectDetector, PoseEstimator};
use crate::distraction::{DistractionEvaluator, DistractionSignal};
use crate::frame::Frame;
use crate::posture::{PostureEvaluator, PostureSignals};

/// Streak timers plus alert bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonitorState {
    timers: ConditionTimers,
    alerts: AlertState,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timers(&self) -> &ConditionTimers {
        &self.timers
    }

    pub fn alerts(&self) -> &AlertState {
        &self.alerts
    }

    pub fn condition(&self, condition: Condition) -> ConditionState {
        self.timers.state(condition)
    }
}

/// Everything one tick observed and decided.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub at: Instant,
    pub person_detected: bool,
    pub posture: PostureSignals,
    pub distraction: DistractionSignal,
    /// Streak length per condition, in `Condition::ALL` order.
    pub streaks: [(Condition, Option<Duration>); 3],
    pub alert: AlertOutcome,
}

impl TickReport {
    pub fn active(&self) -> impl Iterator<Item = (Condition, Duration)> + '_ {
        self.streaks
            .iter()
            .filter_map(|(condition, streak)| streak.map(|streak| (*condition, streak)))
    }

    pub fn all_clear(&self) -> bool {
        self.active().next().is_none()
    }

    /// Status lines: one per active condition with its streak against the
    /// threshold, or a single "Good posture!" line.
    pub fn status_lines(&self, threshold: Duration) -> Vec<String> {
        if self.all_clear() {
            return vec!["Good posture!".to_string()];
        }
        self.active()
            .map(|(condition, streak)| {
                format!(
                    "! {}: {}/{}",
                    condition.label(),
                    format_clock(streak),
                    format_clock(threshold)
                )
            })
            .collect()
    }
}

/// Format a duration as `M:SS`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub struct Monitor {
    posture: PostureEvaluator,
    distraction: DistractionEvaluator,
    dispatcher: AlertDispatcher,
}

impl Monitor {
    pub fn new(
        posture: PostureEvaluator,
        distraction: DistractionEvaluator,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            posture,
            distraction,
            dispatcher,
        }
    }

    pub fn alert_threshold(&self) -> Duration {
        self.dispatcher.policy().threshold
    }

    /// Run the core for one tick on already-extracted inputs.
    pub fn tick(
        &mut self,
        state: &mut MonitorState,
        landmarks: Option<&LandmarkSet>,
        detections: &[DetectedObject],
        now: Instant,
    ) -> TickReport {
        let posture = self.posture.evaluate(landmarks);
        let distraction = self.distraction.evaluate(detections);

        let observations = [
            (Condition::Slouching, posture.slouching),
            (Condition::Tilting, posture.tilting),
            (Condition::PhonePresent, distraction.phone_present),
        ];
        for (condition, active) in observations {
            let was_active = state.timers.state(condition).active;
            state.timers.observe(condition, active, now);
            if was_active != active {
                log::debug!(
                    "{} {}",
                    condition,
                    if active { "started" } else { "cleared" }
                );
            }
        }

        let alert = self
            .dispatcher
            .dispatch(&mut state.timers, &mut state.alerts, now);

        let streaks = Condition::ALL.map(|condition| {
            let condition_state = state.timers.state(condition);
            (
                condition,
                condition_state
                    .since
                    .map(|_| condition_state.elapsed(now)),
            )
        });

        TickReport {
            at: now,
            person_detected: landmarks.is_some(),
            posture,
            distraction,
            streaks,
            alert,
        }
    }

    /// Run both backends on a frame, then tick.
    ///
    /// A backend failure only affects this frame: it is logged and the frame
    /// is treated as "no person" or "no objects".
    pub fn process_frame(
        &mut self,
        state: &mut MonitorState,
        frame: &Frame,
        pose: &mut dyn PoseEstimator,
        objects: &mut dyn ObjectDetector,
        now: Instant,
    ) -> TickReport {
        let view = frame.view();
        let landmarks = view.run_pose(pose).unwrap_or_else(|err| {
            log::warn!(
                "pose estimator {} failed on frame {}: {:#}",
                pose.name(),
                view.sequence(),
                err
            );
            None
        });
        let detections = view.run_objects(objects).unwrap_or_else(|err| {
            log::warn!(
                "object detector {} failed on frame {}: {:#}",
                objects.name(),
                view.sequence(),
                err
            );
            Vec::new()
        });
        self.tick(state, landmarks.as_ref(), &detections, now)
    }
}

//! Guided practice: strictly sequential timed steps.

use std::time::{Duration, Instant};

use cue_types::{ContentKind, Percent, PracticeContent};

use super::{Effect, not_applicable};
use crate::action::{ActionError, PlayerAction};
use crate::config::EngagementSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticePhase {
    Stepping {
        index: usize,
        entered_at: Instant,
        elapsed: bool,
    },
    Completed,
}

impl PracticePhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stepping { .. } => "stepping",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug)]
pub struct PracticeMachine {
    phase: PracticePhase,
    steps: Vec<Duration>,
    allow_early_advance: bool,
    revealed: bool,
}

impl PracticeMachine {
    /// Starts on the first step. Content validation guarantees at least one.
    #[must_use]
    pub fn new(practice: &PracticeContent, settings: &EngagementSettings, now: Instant) -> Self {
        let steps: Vec<Duration> = practice
            .steps
            .iter()
            .map(|step| Duration::from_secs(u64::from(step.duration_seconds)))
            .collect();
        let mut machine = Self {
            phase: PracticePhase::Completed,
            steps,
            allow_early_advance: settings.allow_early_step_advance,
            revealed: false,
        };
        machine.enter(0, now);
        machine
    }

    fn enter(&mut self, index: usize, now: Instant) {
        self.phase = PracticePhase::Stepping {
            index,
            entered_at: now,
            elapsed: self.shows_for(index).is_zero(),
        };
        if index + 1 >= self.steps.len() {
            self.revealed = true;
        }
    }

    fn shows_for(&self, index: usize) -> Duration {
        self.steps.get(index).copied().unwrap_or_default()
    }

    pub(super) fn apply(
        &mut self,
        action: &PlayerAction,
        now: Instant,
    ) -> Result<Effect, ActionError> {
        let PlayerAction::Advance = action else {
            return Err(not_applicable(action, ContentKind::Practice));
        };
        let PracticePhase::Stepping {
            index,
            entered_at,
            elapsed,
        } = self.phase
        else {
            return Err(ActionError::SessionFinished);
        };

        let shows_for = self.shows_for(index);
        let shown = now.saturating_duration_since(entered_at);
        if !self.allow_early_advance && !elapsed && shown < shows_for {
            return Err(ActionError::StepNotElapsed {
                step: index,
                remaining: shows_for - shown,
            });
        }

        let next = index + 1;
        if next >= self.steps.len() {
            self.phase = PracticePhase::Completed;
            return Ok(Effect::Complete);
        }
        self.enter(next, now);
        Ok(Effect::StepEntered {
            step: next,
            shows_for: self.shows_for(next),
        })
    }

    /// Called when the scheduled marker for `step` fires. Stale markers are ignored.
    pub fn mark_step_elapsed(&mut self, step: usize) {
        if let PracticePhase::Stepping { index, elapsed, .. } = &mut self.phase
            && *index == step
        {
            *elapsed = true;
        }
    }

    #[must_use]
    pub fn step_timer(&self) -> Option<(usize, Duration)> {
        match self.phase {
            PracticePhase::Stepping {
                index,
                elapsed: false,
                ..
            } => Some((index, self.shows_for(index))),
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> PracticePhase {
        self.phase
    }

    #[must_use]
    pub fn current_step(&self) -> Option<usize> {
        match self.phase {
            PracticePhase::Stepping { index, .. } => Some(index),
            PracticePhase::Completed => None,
        }
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_final_step(&self) -> bool {
        self.current_step()
            .is_some_and(|index| index + 1 == self.steps.len())
    }

    /// Fraction of steps left behind; 100 only on completion.
    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        match self.phase {
            PracticePhase::Stepping { index, .. } => {
                Percent::of(index as f64, self.steps.len() as f64)
            }
            PracticePhase::Completed => Percent::FULL,
        }
    }

    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == PracticePhase::Completed
    }
}

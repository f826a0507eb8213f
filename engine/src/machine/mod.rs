//! Engagement state machines, one per content kind.
//!
//! [`EngagementMachine::for_item`] is the only place a kind is mapped to its
//! machine. Each machine owns exactly one phase value plus the measurements it
//! collects, and answers the same questions: how engaged the user is, whether
//! the Truth Layer may be shown, and what the proof would say once complete.

mod block;
mod lesson;
mod practice;
mod video;

use std::time::{Duration, Instant};

use cue_types::{
    ContentId, ContentItem, ContentKind, ContentPayload, EmbeddedPractice, Percent, ProofDraft,
};

use crate::action::{ActionError, PlayerAction};
use crate::config::EngagementSettings;
use crate::listeners::EventTopic;

pub use block::{BlockMachine, BlockPhase, ScrollMetrics};
pub use lesson::{CheckInChoice, LessonMachine, LessonPhase};
pub use practice::{PracticeMachine, PracticePhase};
pub use video::{VideoMachine, VideoPhase};

/// Side effect a machine asks its session to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Ask the host to open a practice.
    LaunchPractice(ContentId),
    /// A practice step became current; schedule its elapsed marker.
    StepEntered { step: usize, shows_for: Duration },
    /// The machine reached its terminal phase; the proof is ready.
    Complete,
}

/// State of an exercise offered from inside other content.
///
/// Only a launch followed by a resolution that reports completion counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeOffer {
    Unavailable,
    Offered(ContentId),
    Launched(ContentId),
    Resolved { id: ContentId, completed: bool },
}

impl PracticeOffer {
    #[must_use]
    pub fn from_embedded(practice: Option<&EmbeddedPractice>) -> Self {
        match practice {
            Some(practice) => Self::Offered(practice.id.clone()),
            None => Self::Unavailable,
        }
    }

    /// Returns the id to hand to the navigator.
    pub fn launch(&mut self) -> Result<ContentId, ActionError> {
        match self {
            Self::Unavailable => Err(ActionError::NoEmbeddedPractice),
            // A completed practice stays completed when re-opened.
            Self::Resolved {
                id,
                completed: true,
            } => Ok(id.clone()),
            Self::Offered(id) | Self::Launched(id) | Self::Resolved { id, .. } => {
                let id = id.clone();
                *self = Self::Launched(id.clone());
                Ok(id)
            }
        }
    }

    pub fn resolve(&mut self, completed: bool) -> Result<(), ActionError> {
        match self {
            Self::Launched(id) => {
                *self = Self::Resolved {
                    id: id.clone(),
                    completed,
                };
                Ok(())
            }
            Self::Unavailable => Err(ActionError::NoEmbeddedPractice),
            Self::Offered(_) | Self::Resolved { .. } => Err(ActionError::PracticeNotLaunched),
        }
    }

    #[must_use]
    pub fn is_launched(&self) -> bool {
        matches!(self, Self::Launched(_))
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        matches!(self, Self::Resolved { completed: true, .. })
    }

    #[must_use]
    pub fn id(&self) -> Option<&ContentId> {
        match self {
            Self::Unavailable => None,
            Self::Offered(id) | Self::Launched(id) | Self::Resolved { id, .. } => Some(id),
        }
    }
}

pub(crate) fn not_applicable(action: &PlayerAction, kind: ContentKind) -> ActionError {
    ActionError::NotApplicable {
        action: action.name(),
        kind,
    }
}

pub(crate) fn wrong_phase(action: &PlayerAction, phase: &'static str) -> ActionError {
    ActionError::WrongPhase {
        action: action.name(),
        phase,
    }
}

#[derive(Debug)]
pub enum EngagementMachine {
    Block(BlockMachine),
    Video(VideoMachine),
    Practice(PracticeMachine),
    Lesson(LessonMachine),
}

impl EngagementMachine {
    /// Build the machine for an item's kind, in its initial phase.
    #[must_use]
    pub fn for_item(item: &ContentItem, settings: &EngagementSettings, now: Instant) -> Self {
        let hooks = &item.truth_layer().proof_hooks;
        match item.payload() {
            ContentPayload::Block(block) => Self::Block(BlockMachine::new(block, settings)),
            ContentPayload::WellbeingVideo(video) => {
                Self::Video(VideoMachine::new(video, hooks.pre_post_state))
            }
            ContentPayload::Practice(practice) => {
                Self::Practice(PracticeMachine::new(practice, settings, now))
            }
            ContentPayload::MicroLesson(lesson) => Self::Lesson(LessonMachine::new(lesson)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Block(_) => ContentKind::Block,
            Self::Video(_) => ContentKind::WellbeingVideo,
            Self::Practice(_) => ContentKind::Practice,
            Self::Lesson(_) => ContentKind::MicroLesson,
        }
    }

    pub fn apply(&mut self, action: &PlayerAction, now: Instant) -> Result<Effect, ActionError> {
        if self.is_completed() {
            return Err(ActionError::SessionFinished);
        }
        let before = self.phase_name();
        let effect = match self {
            Self::Block(machine) => machine.apply(action, now),
            Self::Video(machine) => machine.apply(action),
            Self::Practice(machine) => machine.apply(action, now),
            Self::Lesson(machine) => machine.apply(action),
        }?;
        let after = self.phase_name();
        if before != after {
            tracing::debug!(
                kind = %self.kind(),
                from = before,
                to = after,
                "engagement transition"
            );
        }
        Ok(effect)
    }

    /// Apply any sample a throttle was holding back. Returns `true` if state moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self {
            Self::Block(machine) => machine.flush(now),
            Self::Video(_) | Self::Practice(_) | Self::Lesson(_) => false,
        }
    }

    pub fn mark_step_elapsed(&mut self, step: usize) {
        if let Self::Practice(machine) = self {
            machine.mark_step_elapsed(step);
        }
    }

    /// The current practice step and how long it shows, while it has not elapsed.
    #[must_use]
    pub fn step_timer(&self) -> Option<(usize, Duration)> {
        match self {
            Self::Practice(machine) => machine.step_timer(),
            Self::Block(_) | Self::Video(_) | Self::Lesson(_) => None,
        }
    }

    /// Host event topics this machine consumes.
    #[must_use]
    pub fn topics(&self) -> &'static [EventTopic] {
        match self {
            Self::Block(_) => &[EventTopic::Scroll],
            Self::Video(_) => &[EventTopic::MediaTime, EventTopic::MediaEnded],
            Self::Practice(_) | Self::Lesson(_) => &[],
        }
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        match self {
            Self::Block(machine) => machine.percent_engaged(),
            Self::Video(machine) => machine.percent_engaged(),
            Self::Practice(machine) => machine.percent_engaged(),
            Self::Lesson(machine) => machine.percent_engaged(),
        }
    }

    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        match self {
            Self::Block(machine) => machine.truth_layer_visible(),
            Self::Video(machine) => machine.truth_layer_visible(),
            Self::Practice(machine) => machine.truth_layer_visible(),
            Self::Lesson(machine) => machine.truth_layer_visible(),
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        match self {
            Self::Block(machine) => machine.is_completed(),
            Self::Video(machine) => machine.is_completed(),
            Self::Practice(machine) => machine.is_completed(),
            Self::Lesson(machine) => machine.is_completed(),
        }
    }

    #[must_use]
    pub fn phase_name(&self) -> &'static str {
        match self {
            Self::Block(machine) => machine.phase().name(),
            Self::Video(machine) => machine.phase().name(),
            Self::Practice(machine) => machine.phase().name(),
            Self::Lesson(machine) => machine.phase().name(),
        }
    }

    /// The proof contents, available once the machine has completed.
    #[must_use]
    pub fn proof_draft(&self, item: &ContentItem) -> Option<ProofDraft> {
        if !self.is_completed() {
            return None;
        }
        let mut draft = ProofDraft {
            content_id: item.id().clone(),
            kind: self.kind(),
            percent_engaged: self.percent_engaged(),
            state_before: None,
            state_after: None,
            helped: None,
            reflection_text: None,
            practice_completed: false,
        };
        match self {
            Self::Block(machine) => {
                draft.reflection_text = machine.reflection().map(str::to_string);
                draft.practice_completed = machine.practice().completed();
            }
            Self::Video(machine) => {
                draft.state_before = machine.state_before();
                draft.state_after = machine.state_after();
                draft.helped = machine.helped();
                draft.reflection_text = Some(machine.reflection().to_string());
                draft.practice_completed = machine.practice().completed();
            }
            Self::Practice(_) => draft.practice_completed = true,
            Self::Lesson(machine) => {
                draft.reflection_text = machine.reflection_text();
                draft.practice_completed = machine.practice_completed();
            }
        }
        Some(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ContentId {
        ContentId::new(value).unwrap()
    }

    #[test]
    fn offer_counts_only_after_launch_and_completed_resolution() {
        let mut offer = PracticeOffer::Offered(id("p-1"));
        assert_eq!(offer.resolve(true), Err(ActionError::PracticeNotLaunched));
        assert!(!offer.completed());

        assert_eq!(offer.launch(), Ok(id("p-1")));
        offer.resolve(false).unwrap();
        assert!(!offer.completed());

        offer.launch().unwrap();
        offer.resolve(true).unwrap();
        assert!(offer.completed());

        offer.launch().unwrap();
        assert!(offer.completed());
    }

    #[test]
    fn unavailable_offer_refuses_launch() {
        let mut offer = PracticeOffer::from_embedded(None);
        assert_eq!(offer.launch(), Err(ActionError::NoEmbeddedPractice));
        assert_eq!(offer.id(), None);
    }
}

//! Wellbeing video: optional pre-check, playback, post-check, completion.

use cue_types::{
    ContentKind, EngagementMeter, Percent, Rating, StateDimension, StateSnapshot, VideoContent,
};

use super::{Effect, PracticeOffer, not_applicable, wrong_phase};
use crate::action::{ActionError, PlayerAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPhase {
    /// Before playback. `dismissed` is false only while a check-in is owed.
    PreCheck { dismissed: bool },
    Playing,
    PostCheck,
    Completed,
}

impl VideoPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreCheck { .. } => "pre_check",
            Self::Playing => "playing",
            Self::PostCheck => "post_check",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug)]
pub struct VideoMachine {
    phase: VideoPhase,
    pre_post_state: bool,
    /// Declared length in seconds, used when the media cannot report one.
    declared_duration: f64,
    meter: EngagementMeter,
    position: f64,
    pre_draft: StateSnapshot,
    state_before: Option<StateSnapshot>,
    post_draft: StateSnapshot,
    helped: Option<bool>,
    reflection: String,
    practice: PracticeOffer,
}

impl VideoMachine {
    #[must_use]
    pub fn new(video: &VideoContent, pre_post_state: bool) -> Self {
        Self {
            phase: VideoPhase::PreCheck {
                dismissed: !pre_post_state,
            },
            pre_post_state,
            declared_duration: f64::from(video.duration_minutes) * 60.0,
            meter: EngagementMeter::new(),
            position: 0.0,
            pre_draft: StateSnapshot::default(),
            state_before: None,
            post_draft: StateSnapshot::default(),
            helped: None,
            reflection: String::new(),
            practice: PracticeOffer::from_embedded(video.embedded_practice.as_ref()),
        }
    }

    pub(super) fn apply(&mut self, action: &PlayerAction) -> Result<Effect, ActionError> {
        match (action, self.phase) {
            (PlayerAction::AdjustState { dimension, rating }, phase) => {
                self.adjust(action, phase, *dimension, *rating)
            }
            (PlayerAction::DismissPreCheck, VideoPhase::PreCheck { dismissed: false }) => {
                self.state_before = Some(self.pre_draft);
                self.post_draft = self.pre_draft;
                self.phase = VideoPhase::PreCheck { dismissed: true };
                Ok(Effect::None)
            }
            (PlayerAction::StartPlayback, VideoPhase::PreCheck { dismissed }) => {
                if !dismissed {
                    return Err(ActionError::PreCheckPending);
                }
                self.phase = VideoPhase::Playing;
                Ok(Effect::None)
            }
            (PlayerAction::MediaTime { current, duration }, VideoPhase::Playing) => {
                self.on_time(*current, *duration);
                Ok(Effect::None)
            }
            (PlayerAction::MediaEnded, VideoPhase::Playing) => {
                self.meter.record(Percent::FULL);
                self.phase = VideoPhase::PostCheck;
                Ok(Effect::None)
            }
            (PlayerAction::SetHelped(helped), VideoPhase::PostCheck) => {
                self.helped = Some(*helped);
                Ok(Effect::None)
            }
            (PlayerAction::EditReflection(text), VideoPhase::PostCheck) => {
                self.reflection.clone_from(text);
                Ok(Effect::None)
            }
            (PlayerAction::LaunchPractice, VideoPhase::PostCheck) => {
                self.practice.launch().map(Effect::LaunchPractice)
            }
            (PlayerAction::PracticeResolved { completed }, _) => {
                self.practice.resolve(*completed).map(|()| Effect::None)
            }
            (PlayerAction::Complete, VideoPhase::PostCheck) => {
                self.phase = VideoPhase::Completed;
                Ok(Effect::Complete)
            }
            (
                PlayerAction::DismissPreCheck
                | PlayerAction::StartPlayback
                | PlayerAction::MediaTime { .. }
                | PlayerAction::MediaEnded
                | PlayerAction::SetHelped(_)
                | PlayerAction::EditReflection(_)
                | PlayerAction::LaunchPractice
                | PlayerAction::Complete,
                phase,
            ) => Err(wrong_phase(action, phase.name())),
            _ => Err(not_applicable(action, ContentKind::WellbeingVideo)),
        }
    }

    fn adjust(
        &mut self,
        action: &PlayerAction,
        phase: VideoPhase,
        dimension: StateDimension,
        rating: Rating,
    ) -> Result<Effect, ActionError> {
        if !self.pre_post_state {
            return Err(wrong_phase(action, phase.name()));
        }
        match phase {
            VideoPhase::PreCheck { dismissed: false } => self.pre_draft.set(dimension, rating),
            VideoPhase::PostCheck => self.post_draft.set(dimension, rating),
            _ => return Err(wrong_phase(action, phase.name())),
        }
        Ok(Effect::None)
    }

    fn on_time(&mut self, current: f64, reported: f64) {
        if !current.is_finite() {
            tracing::debug!("ignoring non-finite media time");
            return;
        }
        self.position = current.max(0.0);
        let sample = Percent::of(current, self.effective_duration(reported));
        self.meter.record(sample);
    }

    /// Reported duration when usable, else the declared one. Zero means the
    /// media is degenerate and any sample counts as complete.
    fn effective_duration(&self, reported: f64) -> f64 {
        if reported.is_finite() && reported > 0.0 {
            reported
        } else if self.declared_duration > 0.0 {
            self.declared_duration
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn phase(&self) -> VideoPhase {
        self.phase
    }

    #[must_use]
    pub fn needs_pre_check(&self) -> bool {
        matches!(self.phase, VideoPhase::PreCheck { dismissed: false })
    }

    #[must_use]
    pub fn tracks_state(&self) -> bool {
        self.pre_post_state
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[must_use]
    pub fn declared_duration(&self) -> f64 {
        self.declared_duration
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        self.meter.value()
    }

    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        matches!(self.phase, VideoPhase::PostCheck | VideoPhase::Completed)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == VideoPhase::Completed
    }

    /// Sliders the user is currently moving, if any.
    #[must_use]
    pub fn slider_values(&self) -> Option<StateSnapshot> {
        if !self.pre_post_state {
            return None;
        }
        match self.phase {
            VideoPhase::PreCheck { dismissed: false } => Some(self.pre_draft),
            VideoPhase::PostCheck => Some(self.post_draft),
            _ => None,
        }
    }

    #[must_use]
    pub fn state_before(&self) -> Option<StateSnapshot> {
        self.state_before
    }

    /// Post-check snapshot, kept only when the item measures pre/post state.
    #[must_use]
    pub fn state_after(&self) -> Option<StateSnapshot> {
        let reached = matches!(self.phase, VideoPhase::PostCheck | VideoPhase::Completed);
        (self.pre_post_state && reached).then_some(self.post_draft)
    }

    #[must_use]
    pub fn helped(&self) -> Option<bool> {
        self.helped
    }

    #[must_use]
    pub fn reflection(&self) -> &str {
        &self.reflection
    }

    #[must_use]
    pub fn practice(&self) -> &PracticeOffer {
        &self.practice
    }
}

//! User and host inputs routed to a session, and why they can be refused.

use std::time::Duration;

use thiserror::Error;

use cue_types::ui::TruthSection;
use cue_types::{ContentId, ContentKind, Rating, StateDimension};

use crate::machine::{CheckInChoice, ScrollMetrics};

/// Which next-step list a link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStepKind {
    Insight,
    Practice,
    Wellbeing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    /// Host scroll sample from the article container.
    Scroll(ScrollMetrics),
    /// Media `timeupdate`. Both values are seconds as reported by the element.
    MediaTime { current: f64, duration: f64 },
    MediaEnded,
    AdjustState {
        dimension: StateDimension,
        rating: Rating,
    },
    DismissPreCheck,
    StartPlayback,
    SetHelped(bool),
    EditReflection(String),
    LaunchPractice,
    /// The externally launched practice reported back.
    PracticeResolved { completed: bool },
    Advance,
    Back,
    CheckIn(CheckInChoice),
    ToggleSection(TruthSection),
    OpenNextStep { kind: NextStepKind, id: ContentId },
    Complete,
}

impl PlayerAction {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Scroll(_) => "scroll",
            Self::MediaTime { .. } => "media_time",
            Self::MediaEnded => "media_ended",
            Self::AdjustState { .. } => "adjust_state",
            Self::DismissPreCheck => "dismiss_pre_check",
            Self::StartPlayback => "start_playback",
            Self::SetHelped(_) => "set_helped",
            Self::EditReflection(_) => "edit_reflection",
            Self::LaunchPractice => "launch_practice",
            Self::PracticeResolved { .. } => "practice_resolved",
            Self::Advance => "advance",
            Self::Back => "back",
            Self::CheckIn(_) => "check_in",
            Self::ToggleSection(_) => "toggle_section",
            Self::OpenNextStep { .. } => "open_next_step",
            Self::Complete => "complete",
        }
    }
}

/// An action was refused. State is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{action} does not apply to {kind} content")]
    NotApplicable {
        action: &'static str,
        kind: ContentKind,
    },
    #[error("{action} is not available while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("check in before starting")]
    PreCheckPending,
    #[error("step {} needs {}s more", .step + 1, .remaining.as_secs().max(1))]
    StepNotElapsed { step: usize, remaining: Duration },
    #[error("choose how you feel to continue")]
    CheckInRequired,
    #[error("finish reading to unlock this")]
    NotRevealed,
    #[error("this content has no practice to launch")]
    NoEmbeddedPractice,
    #[error("the practice has not been launched")]
    PracticeNotLaunched,
    #[error("{0} is not one of this content's next steps")]
    UnknownNextStep(ContentId),
    #[error("the session has already finished")]
    SessionFinished,
    #[error("nothing is playing")]
    NothingPlaying,
}

impl ActionError {
    /// Gate refusals are surfaced to the user as a transient notice; the rest
    /// are host or sequencing mistakes and only logged.
    #[must_use]
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            Self::PreCheckPending
                | Self::StepNotElapsed { .. }
                | Self::CheckInRequired
                | Self::NotRevealed
        )
    }
}

/// What a successfully dispatched action led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The host should open this practice; its result comes back as
    /// [`PlayerAction::PracticeResolved`].
    PracticeLaunched(ContentId),
    /// A proof was emitted and the player closed.
    Completed,
}

//! Micro lesson: seven fixed scenes with per-scene interactions.

use std::fmt;

use cue_types::{ContentKind, LessonContent, Percent, SceneType};

use super::{Effect, PracticeOffer, not_applicable, wrong_phase};
use crate::action::{ActionError, PlayerAction};

/// Answers offered by a state-check scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckInChoice {
    Grounded,
    Steady,
    Unsettled,
    Overwhelmed,
}

impl CheckInChoice {
    pub const ALL: [CheckInChoice; 4] = [
        Self::Grounded,
        Self::Steady,
        Self::Unsettled,
        Self::Overwhelmed,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grounded => "Grounded",
            Self::Steady => "Steady",
            Self::Unsettled => "Unsettled",
            Self::Overwhelmed => "Overwhelmed",
        }
    }
}

impl fmt::Display for CheckInChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonPhase {
    Viewing { index: usize },
    Completed,
}

impl LessonPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viewing { .. } => "viewing",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug)]
pub struct LessonMachine {
    phase: LessonPhase,
    scenes: Vec<SceneType>,
    furthest: usize,
    revealed: bool,
    reflections: Vec<String>,
    check_ins: Vec<Option<CheckInChoice>>,
    offers: Vec<PracticeOffer>,
}

impl LessonMachine {
    #[must_use]
    pub fn new(lesson: &LessonContent) -> Self {
        let count = lesson.scenes.len();
        Self {
            phase: LessonPhase::Viewing { index: 0 },
            scenes: lesson.scenes.iter().map(|scene| scene.scene_type).collect(),
            furthest: 0,
            revealed: count <= 1,
            reflections: vec![String::new(); count],
            check_ins: vec![None; count],
            offers: lesson
                .scenes
                .iter()
                .map(|scene| PracticeOffer::from_embedded(scene.practice.as_ref()))
                .collect(),
        }
    }

    pub(super) fn apply(&mut self, action: &PlayerAction) -> Result<Effect, ActionError> {
        let LessonPhase::Viewing { index } = self.phase else {
            return Err(ActionError::SessionFinished);
        };
        let Some(&scene) = self.scenes.get(index) else {
            return Err(ActionError::SessionFinished);
        };
        match action {
            PlayerAction::Advance => self.advance(index, scene),
            PlayerAction::Back => {
                if index == 0 {
                    return Err(wrong_phase(action, "first_scene"));
                }
                self.phase = LessonPhase::Viewing { index: index - 1 };
                Ok(Effect::None)
            }
            PlayerAction::EditReflection(text) => {
                if scene != SceneType::Reflection {
                    return Err(wrong_phase(action, scene.as_str()));
                }
                self.reflections[index].clone_from(text);
                Ok(Effect::None)
            }
            PlayerAction::CheckIn(choice) => {
                if scene != SceneType::StateCheck {
                    return Err(wrong_phase(action, scene.as_str()));
                }
                self.check_ins[index] = Some(*choice);
                Ok(Effect::None)
            }
            PlayerAction::LaunchPractice => {
                if scene != SceneType::PracticeInjection {
                    return Err(wrong_phase(action, scene.as_str()));
                }
                self.offers[index].launch().map(Effect::LaunchPractice)
            }
            PlayerAction::PracticeResolved { completed } => {
                let Some(offer) = self.offers.iter_mut().find(|offer| offer.is_launched()) else {
                    return Err(ActionError::PracticeNotLaunched);
                };
                offer.resolve(*completed).map(|()| Effect::None)
            }
            _ => Err(not_applicable(action, ContentKind::MicroLesson)),
        }
    }

    fn advance(&mut self, index: usize, scene: SceneType) -> Result<Effect, ActionError> {
        if scene == SceneType::StateCheck && self.check_ins[index].is_none() {
            return Err(ActionError::CheckInRequired);
        }
        let next = index + 1;
        if next >= self.scenes.len() {
            self.phase = LessonPhase::Completed;
            return Ok(Effect::Complete);
        }
        self.phase = LessonPhase::Viewing { index: next };
        self.furthest = self.furthest.max(next);
        if next + 1 == self.scenes.len() && !self.revealed {
            tracing::debug!("lesson truth layer revealed");
            self.revealed = true;
        }
        Ok(Effect::None)
    }

    #[must_use]
    pub fn phase(&self) -> LessonPhase {
        self.phase
    }

    #[must_use]
    pub fn current_scene(&self) -> Option<usize> {
        match self.phase {
            LessonPhase::Viewing { index } => Some(index),
            LessonPhase::Completed => None,
        }
    }

    #[must_use]
    pub fn furthest(&self) -> usize {
        self.furthest
    }

    #[must_use]
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        match self.phase {
            LessonPhase::Viewing { .. } => {
                Percent::of((self.furthest + 1) as f64, self.scenes.len() as f64)
            }
            LessonPhase::Completed => Percent::FULL,
        }
    }

    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == LessonPhase::Completed
    }

    #[must_use]
    pub fn reflection(&self, scene: usize) -> Option<&str> {
        self.reflections.get(scene).map(String::as_str)
    }

    #[must_use]
    pub fn check_in(&self, scene: usize) -> Option<CheckInChoice> {
        self.check_ins.get(scene).copied().flatten()
    }

    #[must_use]
    pub fn offer(&self, scene: usize) -> Option<&PracticeOffer> {
        self.offers.get(scene)
    }

    /// Non-blank reflection answers, separated by a blank line.
    #[must_use]
    pub fn reflection_text(&self) -> Option<String> {
        let answers: Vec<&str> = self
            .reflections
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        (!answers.is_empty()).then(|| answers.join("\n\n"))
    }

    #[must_use]
    pub fn practice_completed(&self) -> bool {
        self.offers.iter().any(PracticeOffer::completed)
    }
}

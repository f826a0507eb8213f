//! Article reading: scroll depth unlocks the Truth Layer, then completion.

use std::time::Instant;

use cue_types::{BlockContent, ContentKind, EngagementMeter, Percent};

use super::{Effect, PracticeOffer, not_applicable, wrong_phase};
use crate::action::{ActionError, PlayerAction};
use crate::config::EngagementSettings;
use crate::schedule::SampleThrottle;

/// Geometry of the scroll container at one instant, in pixels or rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Content that fits without scrolling reads as fully seen.
    #[must_use]
    pub fn percent(&self) -> Percent {
        Percent::of(self.scroll_top, self.scroll_height - self.client_height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockPhase {
    Reading,
    Revealed { reflection: String },
    Completed { reflection: String },
}

impl BlockPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Revealed { .. } => "revealed",
            Self::Completed { .. } => "completed",
        }
    }
}

#[derive(Debug)]
pub struct BlockMachine {
    phase: BlockPhase,
    meter: EngagementMeter,
    threshold: Percent,
    throttle: SampleThrottle<ScrollMetrics>,
    practice: PracticeOffer,
}

impl BlockMachine {
    #[must_use]
    pub fn new(block: &BlockContent, settings: &EngagementSettings) -> Self {
        Self {
            phase: BlockPhase::Reading,
            meter: EngagementMeter::new(),
            threshold: Percent::clamped(f64::from(settings.reveal_threshold)),
            throttle: SampleThrottle::new(settings.scroll_sample_interval),
            practice: PracticeOffer::from_embedded(block.embedded_practice.as_ref()),
        }
    }

    pub(super) fn apply(
        &mut self,
        action: &PlayerAction,
        now: Instant,
    ) -> Result<Effect, ActionError> {
        match action {
            PlayerAction::Scroll(metrics) => {
                if let Some(sample) = self.throttle.offer(now, *metrics) {
                    self.record(sample);
                }
                Ok(Effect::None)
            }
            PlayerAction::EditReflection(text) => match &mut self.phase {
                BlockPhase::Revealed { reflection } => {
                    reflection.clone_from(text);
                    Ok(Effect::None)
                }
                BlockPhase::Reading => Err(ActionError::NotRevealed),
                BlockPhase::Completed { .. } => Err(ActionError::SessionFinished),
            },
            PlayerAction::LaunchPractice => self.practice.launch().map(Effect::LaunchPractice),
            PlayerAction::PracticeResolved { completed } => {
                self.practice.resolve(*completed).map(|()| Effect::None)
            }
            PlayerAction::Complete => match &mut self.phase {
                BlockPhase::Revealed { reflection } => {
                    let reflection = std::mem::take(reflection);
                    self.phase = BlockPhase::Completed { reflection };
                    Ok(Effect::Complete)
                }
                BlockPhase::Reading => Err(ActionError::NotRevealed),
                BlockPhase::Completed { .. } => Err(wrong_phase(action, "completed")),
            },
            _ => Err(not_applicable(action, ContentKind::Block)),
        }
    }

    /// Apply the trailing scroll sample once its interval has passed.
    pub(super) fn flush(&mut self, now: Instant) -> bool {
        match self.throttle.flush(now) {
            Some(sample) => {
                self.record(sample);
                true
            }
            None => false,
        }
    }

    fn record(&mut self, sample: ScrollMetrics) {
        self.meter.record(sample.percent());
        if self.phase == BlockPhase::Reading && self.meter.value() >= self.threshold {
            tracing::debug!(percent = self.meter.value().value(), "article truth layer revealed");
            self.phase = BlockPhase::Revealed {
                reflection: String::new(),
            };
        }
    }

    #[must_use]
    pub fn phase(&self) -> &BlockPhase {
        &self.phase
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        self.meter.value()
    }

    #[must_use]
    pub fn threshold(&self) -> Percent {
        self.threshold
    }

    /// Latched: once past `Reading` the phase never returns to it.
    #[must_use]
    pub fn truth_layer_visible(&self) -> bool {
        !matches!(self.phase, BlockPhase::Reading)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.phase, BlockPhase::Completed { .. })
    }

    #[must_use]
    pub fn reflection(&self) -> Option<&str> {
        match &self.phase {
            BlockPhase::Reading => None,
            BlockPhase::Revealed { reflection } | BlockPhase::Completed { reflection } => {
                Some(reflection)
            }
        }
    }

    #[must_use]
    pub fn practice(&self) -> &PracticeOffer {
        &self.practice
    }

    #[must_use]
    pub fn has_pending_sample(&self) -> bool {
        self.throttle.has_pending()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cue_types::{ContentId, EmbeddedPractice, NextSteps};

    use super::*;

    fn block(practice: bool) -> BlockContent {
        BlockContent {
            body: "# Title\n\nBody".into(),
            reading_time_minutes: 3,
            embedded_practice: practice.then(|| EmbeddedPractice {
                id: ContentId::new("p-box").unwrap(),
                title: "Box breathing".into(),
                duration_minutes: 2,
            }),
            next_steps: NextSteps::default(),
        }
    }

    fn machine(practice: bool) -> BlockMachine {
        BlockMachine::new(&block(practice), &EngagementSettings::default())
    }

    fn scroll(top: f64) -> PlayerAction {
        PlayerAction::Scroll(ScrollMetrics::new(top, 1100.0, 100.0))
    }

    #[test]
    fn percent_formula_and_degenerate_layout() {
        assert_eq!(ScrollMetrics::new(500.0, 1100.0, 100.0).percent().value(), 50);
        assert_eq!(ScrollMetrics::new(0.0, 400.0, 400.0).percent(), Percent::FULL);
        assert_eq!(ScrollMetrics::new(0.0, 300.0, 400.0).percent(), Percent::FULL);
        assert_eq!(ScrollMetrics::new(-20.0, 1100.0, 100.0).percent(), Percent::ZERO);
    }

    #[test]
    fn reveal_latches_at_threshold_and_survives_scrolling_up() {
        let t0 = Instant::now();
        let mut m = machine(false);
        m.apply(&scroll(940.0), t0).unwrap();
        assert!(!m.truth_layer_visible());

        let t1 = t0 + Duration::from_millis(20);
        m.apply(&scroll(950.0), t1).unwrap();
        assert!(m.truth_layer_visible());

        let t2 = t1 + Duration::from_millis(20);
        m.apply(&scroll(0.0), t2).unwrap();
        assert!(m.truth_layer_visible());
        assert_eq!(m.percent_engaged().value(), 95);
    }

    #[test]
    fn trailing_sample_applies_on_flush() {
        let t0 = Instant::now();
        let mut m = machine(false);
        m.apply(&scroll(100.0), t0).unwrap();
        m.apply(&scroll(1000.0), t0 + Duration::from_millis(3)).unwrap();
        assert_eq!(m.percent_engaged().value(), 10);
        assert!(m.has_pending_sample());

        assert!(!m.flush(t0 + Duration::from_millis(5)));
        assert!(m.flush(t0 + Duration::from_millis(16)));
        assert_eq!(m.percent_engaged(), Percent::FULL);
        assert!(m.truth_layer_visible());
    }

    #[test]
    fn complete_and_reflection_gated_by_reveal() {
        let t0 = Instant::now();
        let mut m = machine(false);
        assert_eq!(m.apply(&PlayerAction::Complete, t0), Err(ActionError::NotRevealed));
        assert_eq!(
            m.apply(&PlayerAction::EditReflection("x".into()), t0),
            Err(ActionError::NotRevealed)
        );

        m.apply(&scroll(1000.0), t0).unwrap();
        m.apply(&PlayerAction::EditReflection("Slower exhale".into()), t0)
            .unwrap();
        assert_eq!(m.apply(&PlayerAction::Complete, t0), Ok(Effect::Complete));
        assert!(m.is_completed());
        assert_eq!(m.reflection(), Some("Slower exhale"));
    }

    #[test]
    fn embedded_practice_requires_launch_then_resolution() {
        let t0 = Instant::now();
        let mut m = machine(true);
        assert_eq!(
            m.apply(&PlayerAction::PracticeResolved { completed: true }, t0),
            Err(ActionError::PracticeNotLaunched)
        );
        assert_eq!(
            m.apply(&PlayerAction::LaunchPractice, t0),
            Ok(Effect::LaunchPractice(ContentId::new("p-box").unwrap()))
        );
        m.apply(&PlayerAction::PracticeResolved { completed: true }, t0)
            .unwrap();
        assert!(m.practice().completed());
    }

    #[test]
    fn video_actions_do_not_apply() {
        let mut m = machine(false);
        assert!(matches!(
            m.apply(&PlayerAction::StartPlayback, Instant::now()),
            Err(ActionError::NotApplicable {
                kind: ContentKind::Block,
                ..
            })
        ));
    }
}

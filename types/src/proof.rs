//! Proof-of-engagement types.
//!
//! Every content kind ends in the same record, [`CompletionProof`]. The value
//! types here make out-of-range measurements unrepresentable: a [`Percent`] is
//! never above 100, a [`Rating`] is always 1–10, and an [`EngagementMeter`]
//! never moves backwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentKind;
use crate::ids::{ContentId, SessionId};

/// Whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percent(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("percentage {0} is above 100")]
pub struct PercentOutOfRange(pub u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(100);

    pub fn new(value: u8) -> Result<Self, PercentOutOfRange> {
        if value > 100 {
            Err(PercentOutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Round and clamp an arbitrary float. NaN reads as zero.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    /// `part / whole` as a percentage. A non-positive whole counts as complete.
    #[must_use]
    pub fn of(part: f64, whole: f64) -> Self {
        if whole <= 0.0 {
            return Self::FULL;
        }
        Self::clamped(part / whole * 100.0)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn ratio(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<u8> for Percent {
    type Error = PercentOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Running maximum of observed engagement.
///
/// Rewinds and upward scrolls are recorded but never lower the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementMeter {
    max: Percent,
}

impl EngagementMeter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample. Returns `true` when the stored maximum rose.
    pub fn record(&mut self, sample: Percent) -> bool {
        if sample > self.max {
            self.max = sample;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn value(&self) -> Percent {
        self.max
    }
}

/// Self-report slider value in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating {0} is outside 1..=10")]
pub struct RatingError(pub u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const MIDPOINT: Rating = Rating(5);

    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// One notch up, saturating at 10.
    #[must_use]
    pub fn raised(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }

    /// One notch down, saturating at 1.
    #[must_use]
    pub fn lowered(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN))
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::MIDPOINT
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateDimension {
    Energy,
    Clarity,
    Anchorage,
}

impl StateDimension {
    pub const ALL: [StateDimension; 3] = [Self::Energy, Self::Clarity, Self::Anchorage];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Clarity => "Clarity",
            Self::Anchorage => "Anchorage",
        }
    }
}

/// A three-slider self-report taken before or after a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub energy: Rating,
    pub clarity: Rating,
    pub anchorage: Rating,
}

impl StateSnapshot {
    #[must_use]
    pub fn get(&self, dimension: StateDimension) -> Rating {
        match dimension {
            StateDimension::Energy => self.energy,
            StateDimension::Clarity => self.clarity,
            StateDimension::Anchorage => self.anchorage,
        }
    }

    pub fn set(&mut self, dimension: StateDimension, value: Rating) {
        match dimension {
            StateDimension::Energy => self.energy = value,
            StateDimension::Clarity => self.clarity = value,
            StateDimension::Anchorage => self.anchorage = value,
        }
    }
}

/// What an engagement machine collected, before the capture step seals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofDraft {
    pub content_id: ContentId,
    pub kind: ContentKind,
    pub percent_engaged: Percent,
    pub state_before: Option<StateSnapshot>,
    pub state_after: Option<StateSnapshot>,
    pub helped: Option<bool>,
    pub reflection_text: Option<String>,
    pub practice_completed: bool,
}

/// The single normalized record emitted when a session completes.
///
/// Built only by sealing a [`ProofDraft`]; the record is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionProof {
    session_id: SessionId,
    content_id: ContentId,
    kind: ContentKind,
    percent_engaged: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_before: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_after: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    helped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reflection_text: Option<String>,
    practice_completed: bool,
    timestamp: DateTime<Utc>,
}

impl CompletionProof {
    /// Seal a draft. Blank reflections are dropped rather than recorded as "".
    #[must_use]
    pub fn seal(session_id: SessionId, draft: ProofDraft, timestamp: DateTime<Utc>) -> Self {
        let reflection_text = draft
            .reflection_text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        Self {
            session_id,
            content_id: draft.content_id,
            kind: draft.kind,
            percent_engaged: draft.percent_engaged,
            state_before: draft.state_before,
            state_after: draft.state_after,
            helped: draft.helped,
            reflection_text,
            practice_completed: draft.practice_completed,
            timestamp,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    #[must_use]
    pub fn percent_engaged(&self) -> Percent {
        self.percent_engaged
    }

    #[must_use]
    pub fn state_before(&self) -> Option<StateSnapshot> {
        self.state_before
    }

    #[must_use]
    pub fn state_after(&self) -> Option<StateSnapshot> {
        self.state_after
    }

    #[must_use]
    pub fn helped(&self) -> Option<bool> {
        self.helped
    }

    #[must_use]
    pub fn reflection_text(&self) -> Option<&str> {
        self.reflection_text.as_deref()
    }

    #[must_use]
    pub fn practice_completed(&self) -> bool {
        self.practice_completed
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rejects_over_100() {
        assert!(Percent::new(100).is_ok());
        assert_eq!(Percent::new(101), Err(PercentOutOfRange(101)));
    }

    #[test]
    fn percent_clamps_and_rounds() {
        assert_eq!(Percent::clamped(-3.0), Percent::ZERO);
        assert_eq!(Percent::clamped(49.5).value(), 50);
        assert_eq!(Percent::clamped(180.0), Percent::FULL);
        assert_eq!(Percent::clamped(f64::NAN), Percent::ZERO);
    }

    #[test]
    fn percent_of_degenerate_whole_is_full() {
        assert_eq!(Percent::of(0.0, 0.0), Percent::FULL);
        assert_eq!(Percent::of(10.0, -1.0), Percent::FULL);
        assert_eq!(Percent::of(30.0, 60.0).value(), 50);
    }

    #[test]
    fn meter_keeps_running_maximum() {
        let mut meter = EngagementMeter::new();
        assert!(meter.record(Percent::clamped(50.0)));
        assert!(!meter.record(Percent::clamped(10.0)));
        assert_eq!(meter.value().value(), 50);
        assert!(meter.record(Percent::FULL));
        assert_eq!(meter.value(), Percent::FULL);
    }

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(11).is_err());
        assert_eq!(Rating::new(10).unwrap().raised().value(), 10);
        assert_eq!(Rating::new(1).unwrap().lowered().value(), 1);
        assert_eq!(Rating::default().value(), 5);
    }

    #[test]
    fn rating_deserialize_validates() {
        let bad: Result<StateSnapshot, _> =
            serde_json::from_str(r#"{"energy":0,"clarity":5,"anchorage":5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn seal_drops_blank_reflection() {
        let draft = ProofDraft {
            content_id: ContentId::new("b-1").unwrap(),
            kind: ContentKind::Block,
            percent_engaged: Percent::FULL,
            state_before: None,
            state_after: None,
            helped: None,
            reflection_text: Some("   ".into()),
            practice_completed: false,
        };
        let proof = CompletionProof::seal(SessionId::new(), draft, Utc::now());
        assert_eq!(proof.reflection_text(), None);
        assert_eq!(proof.kind(), ContentKind::Block);
    }

    #[test]
    fn proof_serializes_kind_as_wire_name() {
        let draft = ProofDraft {
            content_id: ContentId::new("l-1").unwrap(),
            kind: ContentKind::MicroLesson,
            percent_engaged: Percent::FULL,
            state_before: None,
            state_after: None,
            helped: None,
            reflection_text: None,
            practice_completed: true,
        };
        let proof = CompletionProof::seal(SessionId::new(), draft, Utc::now());
        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["kind"], "micro_lesson");
        assert_eq!(value["percent_engaged"], 100);
        assert!(value.get("state_before").is_none());
    }
}

//! Core domain types for Cue.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Content records, the Truth Layer envelope, and the completion proof live here so
//! the engine, the renderer, and any external sink agree on one shape.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod content;
mod ids;
mod proof;
mod sanitize;
mod text;
mod truth;
pub mod ui;

pub use content::{
    BlockContent, Chapter, ChapterPhase, ContentError, ContentItem, ContentKind, ContentPayload,
    EmbeddedPractice, LessonContent, LessonScene, LinkRef, NextSteps, PracticeContent,
    PracticeStep, SceneType, VideoContent, VideoPurpose,
};
pub use ids::{ContentId, SessionId};
pub use proof::{
    CompletionProof, EngagementMeter, Percent, PercentOutOfRange, ProofDraft, Rating, RatingError,
    StateDimension, StateSnapshot,
};
pub use sanitize::sanitize_display_text;
pub use text::{EmptyStringError, NonEmptyString, present};
pub use truth::{Lineage, ProofHooks, StateFit, Targeting, TruthLayer};

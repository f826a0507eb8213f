//! Engagement engine for Cue: catalog, state machines, sessions and the player.
//!
//! This crate has no terminal or async dependencies. Hosts feed it actions and
//! a clock through [`Player`] and receive proofs and navigation requests back
//! through the [`ProofSink`] and [`Navigator`] they supply.

mod action;
mod capture;
mod catalog;
mod config;
mod disclosure;
mod listeners;
pub mod machine;
mod player;
mod schedule;
mod session;

pub use action::{ActionError, NextStepKind, Outcome, PlayerAction};
pub use capture::{
    CaptureError, CloseLatch, CompletionEmitter, NavigationRequest, Navigator, ProofSink,
    RecordingNavigator, RecordingSink,
};
pub use catalog::{Catalog, CatalogError, ContentFilter, RejectedRecord, Selection};
pub use config::{
    CatalogConfig, ConfigError, CueConfig, DEFAULT_NOTICE_TTL_MS, DEFAULT_REVEAL_THRESHOLD,
    DEFAULT_SCROLL_SAMPLE_INTERVAL_MS, EngagementConfig, EngagementSettings, UiConfig, config_path,
    expand_env_vars, ui_options,
};
pub use disclosure::{DisclosureRow, DisclosureSection, disclosure_view, section_rows};
pub use listeners::{EventSource, EventTopic, ListenerId, ListenerRegistry, Subscriptions};
pub use machine::{CheckInChoice, EngagementMachine, ScrollMetrics};
pub use player::{Player, Screen};
pub use schedule::{SampleThrottle, TaskAction, TaskId, TaskList};
pub use session::{Notice, Released, Session, SessionStatus};

pub use cue_types;

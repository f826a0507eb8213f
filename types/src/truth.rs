//! The Truth Layer: descriptive metadata attached to every content item.
//!
//! The envelope has the same shape for every content kind. It carries no
//! behavior; the disclosure in the engine decides how it is shown.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Where a piece of content comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    /// Thinkers and practitioners the content draws on, in credit order.
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub lens: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

/// What the content is aimed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    pub pillar: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub also_helps: Option<BTreeSet<String>>,
}

/// When the content is appropriate, and when it is not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFit {
    pub best_when: String,
    pub not_when: String,
    #[serde(default)]
    pub arousal_constraint: Option<String>,
    #[serde(default)]
    pub contraindications: Option<Vec<String>>,
}

/// What a session with this content intends to measure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofHooks {
    /// Capture a state snapshot before and after the session.
    #[serde(default)]
    pub pre_post_state: bool,
    #[serde(default)]
    pub completion_log: bool,
    /// Reflection prompts offered to the user.
    #[serde(default)]
    pub reflections: Vec<String>,
    #[serde(default)]
    pub transfer_test: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthLayer {
    pub lineage: Lineage,
    pub targeting: Targeting,
    pub state_fit: StateFit,
    pub proof_hooks: ProofHooks,
}

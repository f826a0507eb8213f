//! UI state types for the player surfaces.
//!
//! Pure data types with no IO, no async, no ratatui dependency.
//! Used by both the engine (state ownership) and tui (rendering/input).

mod disclosure;
mod options;

pub use disclosure::{DisclosureState, TruthSection};
pub use options::UiOptions;

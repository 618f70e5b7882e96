// src/analyze/mod.rs
//! Analysis pipeline: prompt → (research model) → parser → aggregators.
//!
//! Everything in here is synchronous and pure; the store and the updater
//! own all state.

pub mod aliases;
pub mod industry;
pub mod parser;
pub mod prompt;
pub mod rules;
pub mod scoring;

// Re-export convenient types.
pub use crate::analyze::aliases::AliasTable;
pub use crate::analyze::parser::{parse_response, parse_response_with_stats, ParseOutcome};
pub use crate::analyze::prompt::{build_prompt, PromptVars};
pub use crate::analyze::scoring::{aggregate_industries, aggregate_overall, NEUTRAL_SCORE};

// src/analyze/mod.rs
//! Analysis entry: generative-text providers and the insight synthesizer built on them.

pub mod ai_adapter;
pub mod synthesis;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{
    build_generator, DynGenerator, MockGenerator, ResponseFormat, TextGenerator,
};
pub use crate::analyze::synthesis::{build_prompt, parse_insight, Synthesizer};

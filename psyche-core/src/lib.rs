//! # Psyche Core Library
//!
//! Personality-driven decision engine for simulated character agents.
//!
//! Each agent owns a bounded [`TraitVector`](traits::TraitVector) that shapes
//! which *action style* it picks every turn:
//!
//! - **Context Encoder** — situational labels and stats to a normalized vector
//! - **Utility Model** — bilinear `t · W_a · c + b_a` score per style
//! - **Selector** — temperature softmax or deterministic arg-max
//! - **Emotion** — transient per-turn overlay on the traits
//! - **Evolution** — decaying trait shifts from categorized life events
//! - **Learning** — confidence-weighted patterns with capacity eviction
//! - **Translation Gate** — stat conditions deciding if a human rendering is shown
//!
//! Everything here is synchronous and free of I/O apart from loading config
//! and agent snapshots. Orchestration and the generative-text call live in
//! `psyche-mind` and `psyche-llm`.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod archetype;
pub mod config;
pub mod context;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod evolution;
pub mod learning;
pub mod presets;
pub mod selection;
pub mod traits;
pub mod translation;
pub mod types;
pub mod utility;

pub use config::PsycheConfig;
pub use engine::Engine;
pub use error::{PsycheError, Result};

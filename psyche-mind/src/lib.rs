//! # psyche-mind — Turn Orchestration
//!
//! Runs one conversational turn for one agent:
//!
//! ```text
//! perception -> emotion -> memory -> personality -> decision -> translation
//!                                                       |
//!                                            generator (async, bounded)
//! ```
//!
//! then folds the outcome back into the agent through evolution and
//! learning. [`Runtime`] holds the agents; turns on the same agent are
//! serialized and turns on different agents run in parallel.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod decision;
pub mod error;
pub mod feedback;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod stages;

pub use error::{MindError, Result};
pub use output::{DebugInfo, TurnOutput};
pub use registry::{AgentSpec, Runtime, build_generator};
pub use stages::{MemoryRecall, Perception, TurnRequest};

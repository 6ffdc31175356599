/*!
 * Translation session phases.
 *
 * This module provides:
 * - One struct per phase holding the data valid in that phase
 * - The event-driven transition function between phases
 */

pub mod machine;
pub mod models;

// Re-export main types
pub use machine::{Event, Phase, TransitionError};
pub use models::{Analyzing, AwaitingUpload, CollectingContext, Done, Reviewing, Translating};

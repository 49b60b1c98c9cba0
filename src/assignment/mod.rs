//! Gift-exchange assignment generation.
//!
//! Given the participants of a group and the pairs who must not give to each
//! other (couples), this module produces a complete giver→receiver mapping:
//! a derangement of the participants that also avoids every exclusion pair
//! in both directions.
//!
//! # Architecture
//!
//! ```text
//! AssignmentGenerator (owns config + Rng)
//!     ├── randomized retry (first-fit passes, restart on dead end)
//!     └── matching (augmenting-path bipartite matching)
//! ```
//!
//! Generation is pure and synchronous. Independent generators can run in
//! parallel. Serializing generations for the same group is the caller's job
//! (see [`crate::group::GroupManager`]).
//!
//! # Types
//!
//! - [`ParticipantId`]: Opaque participant identifier
//! - [`ExclusionPair`]: Unordered pair that must not give to each other
//! - [`ExclusionSet`]: Set of exclusion pairs
//! - [`AssignmentSet`]: Complete giver→receiver mapping

mod config;
mod error;
mod generator;
mod matching;
pub mod types;

pub use config::{GeneratorConfig, Strategy, DEFAULT_MAX_ATTEMPTS};
pub use error::{GenerationError, Result};
pub use generator::{generate, AssignmentGenerator};
pub use types::{Assignment, AssignmentSet, ExclusionPair, ExclusionSet, ParticipantId};

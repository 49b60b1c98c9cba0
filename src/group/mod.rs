//! Group management for gift exchanges.
//!
//! This module owns the state around assignment generation: groups, their
//! members, declared couples, and the stored assignment set of each group.
//!
//! # Architecture
//!
//! ```text
//! GroupManager (high-level API, per-group generation guard)
//!     ├── AssignmentGenerator (giver→receiver search)
//!     └── GroupStorage (SQLite for groups, members, couples, assignments)
//! ```
//!
//! # Lifecycle
//!
//! A group starts [`GroupStatus::Open`]. Generating assignments moves it to
//! [`GroupStatus::AssignmentsGenerated`]; regenerating replaces the stored
//! set. Changing members or couples clears the set and reopens the group.
//!
//! # Types
//!
//! - [`Group`]: A gift-exchange group
//! - [`Member`]: A participant with a role in a group
//! - [`Couple`]: Two members excluded from giving to each other
//! - [`GroupConfig`]: Settings for creating a group

mod error;
mod manager;
mod storage;
pub mod types;

pub use error::{GroupError, Result};
pub use manager::{GenerationGuard, GroupManager, DATABASE_FILE};
pub use storage::GroupStorage;
pub use types::{Couple, Group, GroupConfig, GroupId, GroupStatus, Member, MemberRole};

//! Core types for group management.
//!
//! This module defines the data structures for gift-exchange groups, their
//! members and couples, and the configuration used to create a group.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assignment::{ExclusionPair, GeneratorConfig, ParticipantId};

/// Length of a group identifier in bytes.
pub const GROUP_ID_LEN: usize = 16;

/// Random group identifier, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; GROUP_ID_LEN] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Parses an identifier from its hex form.
    ///
    /// Returns `None` unless `s` is exactly [`GROUP_ID_LEN`] bytes of hex.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        (bytes.len() == GROUP_ID_LEN).then(|| Self(s.to_ascii_lowercase()))
    }

    /// Returns the hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// No assignments stored.
    #[default]
    Open,
    /// A complete assignment set is stored.
    AssignmentsGenerated,
}

impl GroupStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::AssignmentsGenerated => "assignments_generated",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "assignments_generated" => Some(Self::AssignmentsGenerated),
            _ => None,
        }
    }
}

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Group creator. Manages couples and generates assignments.
    Admin,
    /// Regular participant.
    #[default]
    Member,
}

impl MemberRole {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

/// A gift-exchange group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// User-facing name.
    pub name: String,
    /// Suggested spend per person, in whole currency units.
    pub budget: Option<u32>,
    /// Participant who created the group.
    pub admin: ParticipantId,
    /// Lifecycle state.
    pub status: GroupStatus,
    /// Generator settings used for this group's assignments.
    pub generator: GeneratorConfig,
    /// When the group was created (Unix timestamp).
    pub created_at: i64,
    /// When the group was last updated (Unix timestamp).
    pub updated_at: i64,
}

/// A participant's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Participant identifier.
    pub participant: ParticipantId,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Role in the group.
    pub role: MemberRole,
    /// When the participant joined (Unix timestamp).
    pub joined_at: i64,
}

impl Member {
    /// Returns whether this member is the group admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

/// Two members who must not be assigned to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Couple {
    /// The excluded pair.
    pub pair: ExclusionPair,
    /// When the couple was declared (Unix timestamp).
    pub created_at: i64,
}

/// Configuration for creating a new group.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Group name.
    pub name: String,
    /// Optional per-person budget.
    pub budget: Option<u32>,
    /// Generator settings.
    pub generator: GeneratorConfig,
}

impl GroupConfig {
    /// Creates a new group configuration with the default generator.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            budget: None,
            generator: GeneratorConfig::default(),
        }
    }

    /// Sets the per-person budget.
    #[must_use]
    pub const fn with_budget(mut self, budget: u32) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Sets the generator configuration.
    #[must_use]
    pub const fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::Strategy;

    #[test]
    fn group_id_generate_is_hex() {
        let id = GroupId::generate();
        assert_eq!(id.as_str().len(), GROUP_ID_LEN * 2);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, GroupId::generate());
    }

    #[test]
    fn group_id_from_hex() {
        let id = GroupId::generate();
        assert_eq!(GroupId::from_hex(id.as_str()), Some(id.clone()));
        assert_eq!(
            GroupId::from_hex(&id.as_str().to_ascii_uppercase()),
            Some(id)
        );
        assert_eq!(GroupId::from_hex("abcd"), None);
        assert_eq!(GroupId::from_hex("not hex at all"), None);
    }

    #[test]
    fn group_status_as_str() {
        assert_eq!(GroupStatus::Open.as_str(), "open");
        assert_eq!(
            GroupStatus::AssignmentsGenerated.as_str(),
            "assignments_generated"
        );
    }

    #[test]
    fn group_status_parse() {
        assert_eq!(GroupStatus::parse("open"), Some(GroupStatus::Open));
        assert_eq!(
            GroupStatus::parse("assignments_generated"),
            Some(GroupStatus::AssignmentsGenerated)
        );
        assert_eq!(GroupStatus::parse("finalized"), None);
    }

    #[test]
    fn member_role_parse() {
        assert_eq!(MemberRole::parse("admin"), Some(MemberRole::Admin));
        assert_eq!(MemberRole::parse("member"), Some(MemberRole::Member));
        assert_eq!(MemberRole::parse("owner"), None);
        assert_eq!(MemberRole::default(), MemberRole::Member);
    }

    #[test]
    fn member_is_admin() {
        let member = Member {
            participant: ParticipantId::new("alice"),
            display_name: None,
            role: MemberRole::Admin,
            joined_at: 0,
        };
        assert!(member.is_admin());
    }

    #[test]
    fn group_config_builder() {
        let config = GroupConfig::new("Office Party")
            .with_budget(25)
            .with_generator(GeneratorConfig::new().with_strategy(Strategy::Matching));

        assert_eq!(config.name, "Office Party");
        assert_eq!(config.budget, Some(25));
        assert_eq!(config.generator.strategy, Strategy::Matching);
    }

    #[test]
    fn group_config_new_defaults() {
        let config = GroupConfig::new("Family");
        assert!(config.budget.is_none());
        assert_eq!(config.generator, GeneratorConfig::default());
    }
}

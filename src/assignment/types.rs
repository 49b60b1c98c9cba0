//! Core types for assignment generation.
//!
//! This module defines participant identifiers, exclusion pairs (couples),
//! and the giver→receiver assignments produced by the generator.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque participant identifier, unique within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates a participant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unordered pair of participants who must not give to each other.
///
/// The pair is normalized on construction, so `(a, b)` and `(b, a)` are
/// the same value. A pair naming the same participant twice can be built
/// but is rejected by the generator as invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "(ParticipantId, ParticipantId)",
    into = "(ParticipantId, ParticipantId)"
)]
pub struct ExclusionPair {
    first: ParticipantId,
    second: ParticipantId,
}

impl ExclusionPair {
    /// Creates a normalized exclusion pair.
    #[must_use]
    pub fn new(a: impl Into<ParticipantId>, b: impl Into<ParticipantId>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// The lexicographically smaller member.
    #[must_use]
    pub const fn first(&self) -> &ParticipantId {
        &self.first
    }

    /// The lexicographically larger member.
    #[must_use]
    pub const fn second(&self) -> &ParticipantId {
        &self.second
    }

    /// Returns whether both members are the same participant.
    #[must_use]
    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }

    /// Returns whether `id` is one of the two members.
    #[must_use]
    pub fn involves(&self, id: &ParticipantId) -> bool {
        &self.first == id || &self.second == id
    }
}

impl From<(ParticipantId, ParticipantId)> for ExclusionPair {
    fn from((a, b): (ParticipantId, ParticipantId)) -> Self {
        Self::new(a, b)
    }
}

impl From<ExclusionPair> for (ParticipantId, ParticipantId) {
    fn from(pair: ExclusionPair) -> Self {
        (pair.first, pair.second)
    }
}

/// Set of exclusion pairs with a symmetric lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet {
    pairs: HashSet<ExclusionPair>,
}

impl ExclusionSet {
    /// Creates an empty exclusion set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. Returns `false` if an equal pair was already present.
    pub fn insert(&mut self, pair: ExclusionPair) -> bool {
        self.pairs.insert(pair)
    }

    /// Returns whether `giver` is forbidden from giving to `receiver`.
    #[must_use]
    pub fn forbids(&self, giver: &ParticipantId, receiver: &ParticipantId) -> bool {
        self.pairs
            .contains(&ExclusionPair::new(giver.clone(), receiver.clone()))
    }

    /// Iterates over the pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ExclusionPair> {
        self.pairs.iter()
    }

    /// Number of distinct pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns whether the set holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<ExclusionPair> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ExclusionPair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl Extend<ExclusionPair> for ExclusionSet {
    fn extend<I: IntoIterator<Item = ExclusionPair>>(&mut self, iter: I) {
        self.pairs.extend(iter);
    }
}

/// A single giver→receiver assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Participant buying the gift.
    pub giver: ParticipantId,
    /// Participant receiving the gift.
    pub receiver: ParticipantId,
}

impl Assignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(giver: impl Into<ParticipantId>, receiver: impl Into<ParticipantId>) -> Self {
        Self {
            giver: giver.into(),
            receiver: receiver.into(),
        }
    }
}

/// Complete giver→receiver mapping for one exchange round.
///
/// Values produced by the generator always cover every participant exactly
/// once on each side. Sets rebuilt from storage can be checked with
/// [`AssignmentSet::is_valid_for`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentSet {
    assignments: Vec<Assignment>,
}

impl AssignmentSet {
    /// Wraps a list of assignments without validating it.
    #[must_use]
    pub const fn from_assignments(assignments: Vec<Assignment>) -> Self {
        Self { assignments }
    }

    /// Number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterates over the assignments.
    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }

    /// Returns the receiver assigned to `giver`.
    #[must_use]
    pub fn receiver_for(&self, giver: &ParticipantId) -> Option<&ParticipantId> {
        self.assignments
            .iter()
            .find(|a| &a.giver == giver)
            .map(|a| &a.receiver)
    }

    /// Returns the giver assigned to `receiver`.
    #[must_use]
    pub fn giver_for(&self, receiver: &ParticipantId) -> Option<&ParticipantId> {
        self.assignments
            .iter()
            .find(|a| &a.receiver == receiver)
            .map(|a| &a.giver)
    }

    /// Returns the assignments as `(giver, receiver)` pairs.
    #[must_use]
    pub fn pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        self.assignments
            .iter()
            .map(|a| (a.giver.clone(), a.receiver.clone()))
            .collect()
    }

    /// Returns a copy sorted by giver, for stable display and comparison.
    #[must_use]
    pub fn sorted_by_giver(&self) -> Self {
        let mut assignments = self.assignments.clone();
        assignments.sort_by(|a, b| a.giver.cmp(&b.giver));
        Self { assignments }
    }

    /// Checks every assignment-set invariant against the given inputs.
    ///
    /// Returns `true` only when the set is a bijection over exactly
    /// `participants`, has no self-assignment, and hits no exclusion pair
    /// in either direction.
    #[must_use]
    pub fn is_valid_for(&self, participants: &[ParticipantId], exclusions: &ExclusionSet) -> bool {
        let expected: HashSet<&ParticipantId> = participants.iter().collect();
        if expected.len() != participants.len() || self.assignments.len() != expected.len() {
            return false;
        }

        let mut givers = HashSet::with_capacity(self.assignments.len());
        let mut receivers = HashSet::with_capacity(self.assignments.len());
        for assignment in &self.assignments {
            if assignment.giver == assignment.receiver
                || exclusions.forbids(&assignment.giver, &assignment.receiver)
                || !expected.contains(&assignment.giver)
                || !expected.contains(&assignment.receiver)
                || !givers.insert(&assignment.giver)
                || !receivers.insert(&assignment.receiver)
            {
                return false;
            }
        }
        true
    }

    /// Returns the mapping as a giver→receiver lookup table.
    #[must_use]
    pub fn to_map(&self) -> HashMap<ParticipantId, ParticipantId> {
        self.assignments
            .iter()
            .map(|a| (a.giver.clone(), a.receiver.clone()))
            .collect()
    }
}

impl IntoIterator for AssignmentSet {
    type Item = Assignment;
    type IntoIter = std::vec::IntoIter<Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| ParticipantId::new(*n)).collect()
    }

    #[test]
    fn participant_id_display() {
        let id = ParticipantId::new("alice");
        assert_eq!(id.to_string(), "alice");
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn exclusion_pair_is_unordered() {
        assert_eq!(ExclusionPair::new("b", "a"), ExclusionPair::new("a", "b"));
        let pair = ExclusionPair::new("b", "a");
        assert_eq!(pair.first().as_str(), "a");
        assert_eq!(pair.second().as_str(), "b");
    }

    #[test]
    fn exclusion_pair_self_pair_detected() {
        assert!(ExclusionPair::new("a", "a").is_self_pair());
        assert!(!ExclusionPair::new("a", "b").is_self_pair());
    }

    #[test]
    fn exclusion_pair_serializes_as_tuple() {
        let pair = ExclusionPair::new("b", "a");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"["a","b"]"#);

        let parsed: ExclusionPair = serde_json::from_str(r#"["z","y"]"#).unwrap();
        assert_eq!(parsed.first().as_str(), "y");
    }

    #[test]
    fn exclusion_set_deduplicates_reversed_pairs() {
        let mut set = ExclusionSet::new();
        assert!(set.insert(ExclusionPair::new("a", "b")));
        assert!(!set.insert(ExclusionPair::new("b", "a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn exclusion_set_forbids_is_symmetric() {
        let set: ExclusionSet = [ExclusionPair::new("a", "b")].into_iter().collect();
        assert!(set.forbids(&"a".into(), &"b".into()));
        assert!(set.forbids(&"b".into(), &"a".into()));
        assert!(!set.forbids(&"a".into(), &"c".into()));
    }

    #[test]
    fn assignment_set_lookups() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "b"),
            Assignment::new("b", "c"),
            Assignment::new("c", "a"),
        ]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.receiver_for(&"a".into()), Some(&ParticipantId::new("b")));
        assert_eq!(set.giver_for(&"a".into()), Some(&ParticipantId::new("c")));
        assert_eq!(set.receiver_for(&"z".into()), None);
        assert_eq!(set.to_map().len(), 3);
    }

    #[test]
    fn valid_cycle_passes_validation() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "b"),
            Assignment::new("b", "c"),
            Assignment::new("c", "a"),
        ]);
        assert!(set.is_valid_for(&ids(&["a", "b", "c"]), &ExclusionSet::new()));
    }

    #[test]
    fn self_assignment_fails_validation() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "a"),
            Assignment::new("b", "b"),
        ]);
        assert!(!set.is_valid_for(&ids(&["a", "b"]), &ExclusionSet::new()));
    }

    #[test]
    fn excluded_edge_fails_validation() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "b"),
            Assignment::new("b", "a"),
        ]);
        let exclusions: ExclusionSet = [ExclusionPair::new("b", "a")].into_iter().collect();
        assert!(!set.is_valid_for(&ids(&["a", "b"]), &exclusions));
    }

    #[test]
    fn duplicate_receiver_fails_validation() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "c"),
            Assignment::new("b", "c"),
            Assignment::new("c", "a"),
        ]);
        assert!(!set.is_valid_for(&ids(&["a", "b", "c"]), &ExclusionSet::new()));
    }

    #[test]
    fn missing_participant_fails_validation() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("a", "b"),
            Assignment::new("b", "a"),
        ]);
        assert!(!set.is_valid_for(&ids(&["a", "b", "c"]), &ExclusionSet::new()));
    }

    #[test]
    fn sorted_by_giver_orders_entries() {
        let set = AssignmentSet::from_assignments(vec![
            Assignment::new("c", "a"),
            Assignment::new("a", "b"),
            Assignment::new("b", "c"),
        ]);
        let sorted = set.sorted_by_giver();
        let givers: Vec<&str> = sorted.iter().map(|a| a.giver.as_str()).collect();
        assert_eq!(givers, vec!["a", "b", "c"]);
    }
}

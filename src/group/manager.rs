//! High-level group management API.
//!
//! This module provides the [`GroupManager`], which combines group storage
//! ([`GroupStorage`]) with the assignment generator
//! ([`AssignmentGenerator`]) behind a single API.
//!
//! # Generation Discipline
//!
//! A stored assignment set is replaced wholesale on every generation, so at
//! most one generation per group may run at a time. The manager tracks
//! in-flight generations and rejects a second request for the same group
//! with [`GroupError::GenerationInProgress`]. Generations for different
//! groups run independently.
//!
//! Any change to a group's members or couples clears the stored assignments
//! in the same storage transaction as the change itself. A generation that
//! raced such a change is rejected when its result is stored, since the set
//! was computed from the old members or couples.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use super::error::{GroupError, Result};
use super::storage::GroupStorage;
use super::types::{Couple, Group, GroupConfig, GroupId, GroupStatus, Member, MemberRole};
use crate::assignment::{
    AssignmentGenerator, AssignmentSet, ExclusionPair, ExclusionSet, ParticipantId,
};

/// File name of the group database inside the data directory.
pub const DATABASE_FILE: &str = "groups.db";

/// High-level API for gift-exchange groups.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use gift_exchange_core::group::{GroupConfig, GroupManager};
///
/// let manager = GroupManager::new(Path::new("/data/exchange"))?;
/// let group = manager.create_group(&"alice".into(), None, &GroupConfig::new("Family"))?;
/// ```
pub struct GroupManager {
    storage: GroupStorage,
    in_flight: Mutex<HashSet<GroupId>>,
}

/// Marks a group's generation as running until dropped.
#[derive(Debug)]
pub struct GenerationGuard<'a> {
    registry: &'a Mutex<HashSet<GroupId>>,
    group_id: GroupId,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.registry.lock() {
            in_flight.remove(&self.group_id);
        }
    }
}

impl GroupManager {
    /// Creates a new group manager.
    ///
    /// Creates the data directory and database if they don't exist.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Base directory for group data
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| GroupError::Storage(format!("Failed to create data directory: {e}")))?;

        let storage = GroupStorage::new(&data_dir.join(DATABASE_FILE))?;
        Ok(Self::with_storage(storage))
    }

    /// Creates a group manager backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_storage(GroupStorage::in_memory()?))
    }

    /// Creates a group manager over an existing storage instance.
    #[must_use]
    pub fn with_storage(storage: GroupStorage) -> Self {
        Self {
            storage,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &GroupStorage {
        &self.storage
    }

    // ==================== Group Lifecycle ====================

    /// Creates a new group with `admin` as its first member.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the generator configuration is
    /// invalid, or storage fails.
    pub fn create_group(
        &self,
        admin: &ParticipantId,
        display_name: Option<String>,
        config: &GroupConfig,
    ) -> Result<Group> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidData("Group name must not be empty".to_string()));
        }
        config.generator.validate()?;

        let now = chrono::Utc::now().timestamp();
        let group = Group {
            id: GroupId::generate(),
            name: name.to_string(),
            budget: config.budget,
            admin: admin.clone(),
            status: GroupStatus::Open,
            generator: config.generator.clone(),
            created_at: now,
            updated_at: now,
        };
        let member = Member {
            participant: admin.clone(),
            display_name,
            role: MemberRole::Admin,
            joined_at: now,
        };
        self.storage.create_group(&group, &member)?;

        tracing::info!(group = %group.id, "Created group");
        Ok(group)
    }

    /// Retrieves a group. Returns `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_group(&self, group_id: &GroupId) -> Result<Option<Group>> {
        self.storage.get_group(group_id)
    }

    /// Lists all groups, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.storage.get_all_groups()
    }

    /// Lists the groups `participant` belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn groups_for(&self, participant: &ParticipantId) -> Result<Vec<Group>> {
        self.storage.get_groups_for_participant(participant)
    }

    /// Deletes a group and everything stored for it. Admin only.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist, the requester is not the
    /// admin, or storage fails.
    pub fn delete_group(&self, group_id: &GroupId, requester: &ParticipantId) -> Result<()> {
        let group = self.require_group(group_id)?;
        require_admin(&group, requester, "delete the group")?;

        self.storage.delete_group(group_id)?;
        tracing::info!(group = %group_id, "Deleted group");
        Ok(())
    }

    // ==================== Membership ====================

    /// Adds `participant` to a group and clears any stored assignments.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::MembershipConflict`] if the participant is
    /// already a member, or an error if the group doesn't exist or storage
    /// fails.
    pub fn join_group(
        &self,
        group_id: &GroupId,
        participant: &ParticipantId,
        display_name: Option<String>,
    ) -> Result<Member> {
        let member = Member {
            participant: participant.clone(),
            display_name,
            role: MemberRole::Member,
            joined_at: chrono::Utc::now().timestamp(),
        };
        let cleared = self
            .storage
            .add_member(group_id, &member, member.joined_at)?;
        tracing::info!(group = %group_id, cleared, "Member joined group");

        Ok(member)
    }

    /// Removes `participant` from a group, dissolves their couple and clears
    /// any stored assignments.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::PermissionDenied`] if the participant is the
    /// admin, [`GroupError::NotFound`] if they are not a member, or an error
    /// if storage fails.
    pub fn leave_group(&self, group_id: &GroupId, participant: &ParticipantId) -> Result<()> {
        let group = self.require_group(group_id)?;
        if &group.admin == participant {
            return Err(GroupError::PermissionDenied(
                "the admin cannot leave their own group".to_string(),
            ));
        }
        let cleared = self
            .storage
            .remove_member(group_id, participant, chrono::Utc::now().timestamp())?
            .ok_or_else(|| {
                GroupError::NotFound(format!("{participant} is not a member of group {group_id}"))
            })?;
        tracing::info!(group = %group_id, cleared, "Member left group");
        Ok(())
    }

    /// Lists a group's members in the order they joined.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or storage fails.
    pub fn members(&self, group_id: &GroupId) -> Result<Vec<Member>> {
        self.require_group(group_id)?;
        self.storage.get_members(group_id)
    }

    // ==================== Couples ====================

    /// Declares `a` and `b` a couple so they are never assigned to each
    /// other. Admin only. Each member can be in at most one couple;
    /// declaring an existing couple again is a no-op.
    ///
    /// # Errors
    ///
    /// - [`GroupError::PermissionDenied`] if the requester is not the admin
    /// - [`GroupError::InvalidData`] if `a == b`
    /// - [`GroupError::NotFound`] if either is not a member
    /// - [`GroupError::MembershipConflict`] if either already has a partner
    pub fn set_couple(
        &self,
        group_id: &GroupId,
        requester: &ParticipantId,
        a: &ParticipantId,
        b: &ParticipantId,
    ) -> Result<Couple> {
        let group = self.require_group(group_id)?;
        require_admin(&group, requester, "manage couples")?;

        if a == b {
            return Err(GroupError::InvalidData(format!(
                "{a} cannot be paired with themselves"
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let couple = Couple {
            pair: ExclusionPair::new(a.clone(), b.clone()),
            created_at: now,
        };
        let stored = self.storage.add_couple(group_id, &couple, now)?;
        tracing::info!(group = %group_id, "Couple declared");

        Ok(stored)
    }

    /// Dissolves the couple `participant` belongs to and clears any stored
    /// assignments. Admin only.
    ///
    /// Returns whether a couple was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist, the requester is not the
    /// admin, or storage fails.
    pub fn remove_couple(
        &self,
        group_id: &GroupId,
        requester: &ParticipantId,
        participant: &ParticipantId,
    ) -> Result<bool> {
        let group = self.require_group(group_id)?;
        require_admin(&group, requester, "manage couples")?;

        let removed = self.storage.remove_couples_involving(
            group_id,
            participant,
            chrono::Utc::now().timestamp(),
        )? > 0;
        if removed {
            tracing::info!(group = %group_id, "Couple dissolved");
        }
        Ok(removed)
    }

    /// Lists a group's couples.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or storage fails.
    pub fn couples(&self, group_id: &GroupId) -> Result<Vec<Couple>> {
        self.require_group(group_id)?;
        self.storage.get_couples(group_id)
    }

    // ==================== Assignments ====================

    /// Generates a fresh assignment set for the group and stores it,
    /// replacing any previous set. Admin only.
    ///
    /// Either the whole new set is stored or nothing changes.
    ///
    /// # Errors
    ///
    /// - [`GroupError::PermissionDenied`] if the requester is not the admin
    /// - [`GroupError::GenerationInProgress`] if a generation for this group
    ///   is still running
    /// - [`GroupError::Generation`] if the generator rejects the member list
    ///   or finds no valid assignment
    /// - [`GroupError::MembershipChanged`] if members or couples changed
    ///   while the set was being generated; retrying generates from the
    ///   current state
    pub fn generate_assignments(
        &self,
        group_id: &GroupId,
        requester: &ParticipantId,
    ) -> Result<AssignmentSet> {
        let group = self.require_group(group_id)?;
        require_admin(&group, requester, "generate assignments")?;

        let _guard = self.begin_generation(group_id)?;

        let participants: Vec<ParticipantId> = self
            .storage
            .get_members(group_id)?
            .into_iter()
            .map(|m| m.participant)
            .collect();
        let exclusions: ExclusionSet = self
            .storage
            .get_couples(group_id)?
            .into_iter()
            .map(|c| c.pair)
            .collect();

        let mut generator = AssignmentGenerator::new(group.generator.clone())?;
        let assignments = generator
            .generate(&participants, &exclusions)
            .inspect_err(|e| {
                tracing::warn!(
                    group = %group_id,
                    error = e.kind(),
                    "Assignment generation failed"
                );
            })?;

        let replaced = self
            .storage
            .replace_assignments(group_id, &assignments, chrono::Utc::now().timestamp())
            .inspect_err(|e| {
                if matches!(e, GroupError::MembershipChanged(_)) {
                    tracing::info!(
                        group = %group_id,
                        "Group changed during generation, discarding result"
                    );
                }
            })?;
        tracing::info!(
            group = %group_id,
            assignments = assignments.len(),
            replaced,
            "Stored assignments"
        );

        Ok(assignments)
    }

    /// Returns the group's stored assignment set, empty if none was generated.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or storage fails.
    pub fn assignments(&self, group_id: &GroupId) -> Result<AssignmentSet> {
        self.require_group(group_id)?;
        self.storage.get_assignments(group_id)
    }

    /// Returns who `giver` buys a gift for, if assignments exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or storage fails.
    pub fn recipient_for(
        &self,
        group_id: &GroupId,
        giver: &ParticipantId,
    ) -> Result<Option<ParticipantId>> {
        Ok(self.assignments(group_id)?.receiver_for(giver).cloned())
    }

    /// Registers a generation for `group_id` as in flight.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GenerationInProgress`] if one is already running.
    pub fn begin_generation(&self, group_id: &GroupId) -> Result<GenerationGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|e| GroupError::Storage(format!("Failed to acquire generation lock: {e}")))?;

        if !in_flight.insert(group_id.clone()) {
            return Err(GroupError::GenerationInProgress(group_id.to_string()));
        }

        Ok(GenerationGuard {
            registry: &self.in_flight,
            group_id: group_id.clone(),
        })
    }

    fn require_group(&self, group_id: &GroupId) -> Result<Group> {
        self.storage
            .get_group(group_id)?
            .ok_or_else(|| GroupError::NotFound(format!("group {group_id}")))
    }
}

fn require_admin(group: &Group, requester: &ParticipantId, action: &str) -> Result<()> {
    if &group.admin == requester {
        Ok(())
    } else {
        Err(GroupError::PermissionDenied(format!(
            "only the group admin may {action}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{GenerationError, GeneratorConfig};

    fn setup(members: &[&str]) -> (GroupManager, Group) {
        let manager = GroupManager::in_memory().unwrap();
        let group = manager
            .create_group(
                &ParticipantId::new(members[0]),
                None,
                &GroupConfig::new("Test").with_generator(GeneratorConfig::new().with_seed(7)),
            )
            .unwrap();
        for name in &members[1..] {
            manager
                .join_group(&group.id, &ParticipantId::new(*name), None)
                .unwrap();
        }
        (manager, group)
    }

    fn id(name: &str) -> ParticipantId {
        ParticipantId::new(name)
    }

    #[test]
    fn create_group_adds_admin_member() {
        let (manager, group) = setup(&["alice"]);
        let members = manager.members(&group.id).unwrap();

        assert_eq!(members.len(), 1);
        assert!(members[0].is_admin());
        assert_eq!(group.status, GroupStatus::Open);
    }

    #[test]
    fn create_group_rejects_blank_name() {
        let manager = GroupManager::in_memory().unwrap();
        let result = manager.create_group(&id("alice"), None, &GroupConfig::new("   "));
        assert!(matches!(result, Err(GroupError::InvalidData(_))));
    }

    #[test]
    fn create_group_rejects_invalid_generator() {
        let manager = GroupManager::in_memory().unwrap();
        let config = GroupConfig::new("Family")
            .with_generator(GeneratorConfig::new().with_max_attempts(0));
        let result = manager.create_group(&id("alice"), None, &config);
        assert!(matches!(
            result,
            Err(GroupError::Generation(GenerationError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn join_group_twice_conflicts() {
        let (manager, group) = setup(&["alice", "bob"]);
        let result = manager.join_group(&group.id, &id("bob"), None);
        assert!(matches!(result, Err(GroupError::MembershipConflict(_))));
    }

    #[test]
    fn join_unknown_group_fails() {
        let manager = GroupManager::in_memory().unwrap();
        let result = manager.join_group(&GroupId::generate(), &id("bob"), None);
        assert!(matches!(result, Err(GroupError::NotFound(_))));
    }

    #[test]
    fn admin_cannot_leave() {
        let (manager, group) = setup(&["alice", "bob"]);
        let result = manager.leave_group(&group.id, &id("alice"));
        assert!(matches!(result, Err(GroupError::PermissionDenied(_))));
    }

    #[test]
    fn leave_group_dissolves_couple() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        manager
            .set_couple(&group.id, &id("alice"), &id("bob"), &id("carol"))
            .unwrap();

        manager.leave_group(&group.id, &id("carol")).unwrap();

        assert!(manager.couples(&group.id).unwrap().is_empty());
        assert_eq!(manager.members(&group.id).unwrap().len(), 2);
    }

    #[test]
    fn set_couple_requires_admin() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        let result = manager.set_couple(&group.id, &id("bob"), &id("bob"), &id("carol"));
        assert!(matches!(result, Err(GroupError::PermissionDenied(_))));
    }

    #[test]
    fn set_couple_rejects_self_pair() {
        let (manager, group) = setup(&["alice", "bob"]);
        let result = manager.set_couple(&group.id, &id("alice"), &id("bob"), &id("bob"));
        assert!(matches!(result, Err(GroupError::InvalidData(_))));
    }

    #[test]
    fn set_couple_rejects_non_member() {
        let (manager, group) = setup(&["alice", "bob"]);
        let result = manager.set_couple(&group.id, &id("alice"), &id("bob"), &id("zed"));
        assert!(matches!(result, Err(GroupError::NotFound(_))));
    }

    #[test]
    fn set_couple_allows_one_partner_per_member() {
        let (manager, group) = setup(&["alice", "bob", "carol", "dave"]);
        manager
            .set_couple(&group.id, &id("alice"), &id("bob"), &id("carol"))
            .unwrap();

        let again = manager
            .set_couple(&group.id, &id("alice"), &id("carol"), &id("bob"))
            .unwrap();
        assert_eq!(again.pair, ExclusionPair::new("bob", "carol"));

        let result = manager.set_couple(&group.id, &id("alice"), &id("carol"), &id("dave"));
        assert!(matches!(result, Err(GroupError::MembershipConflict(_))));
    }

    #[test]
    fn remove_couple_reports_removal() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        manager
            .set_couple(&group.id, &id("alice"), &id("bob"), &id("carol"))
            .unwrap();

        assert!(manager
            .remove_couple(&group.id, &id("alice"), &id("bob"))
            .unwrap());
        assert!(!manager
            .remove_couple(&group.id, &id("alice"), &id("bob"))
            .unwrap());
    }

    #[test]
    fn generate_requires_admin() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        let result = manager.generate_assignments(&group.id, &id("bob"));
        assert!(matches!(result, Err(GroupError::PermissionDenied(_))));
    }

    #[test]
    fn generate_with_single_member_is_invalid_input() {
        let (manager, group) = setup(&["alice"]);
        let result = manager.generate_assignments(&group.id, &id("alice"));
        assert!(matches!(
            result,
            Err(GroupError::Generation(GenerationError::InvalidInput(_)))
        ));
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::Open
        );
    }

    #[test]
    fn generate_stores_valid_assignments() {
        let (manager, group) = setup(&["alice", "bob", "carol", "dave"]);
        manager
            .set_couple(&group.id, &id("alice"), &id("alice"), &id("bob"))
            .unwrap();

        let set = manager.generate_assignments(&group.id, &id("alice")).unwrap();

        let participants = vec![id("alice"), id("bob"), id("carol"), id("dave")];
        let exclusions: ExclusionSet = [ExclusionPair::new("alice", "bob")].into_iter().collect();
        assert!(set.is_valid_for(&participants, &exclusions));
        assert_eq!(manager.assignments(&group.id).unwrap(), set);
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::AssignmentsGenerated
        );
    }

    #[test]
    fn unsatisfiable_generation_stores_nothing() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        manager.generate_assignments(&group.id, &id("alice")).unwrap();

        // Carol leaves and the remaining two become a couple.
        manager.leave_group(&group.id, &id("carol")).unwrap();
        manager
            .set_couple(&group.id, &id("alice"), &id("alice"), &id("bob"))
            .unwrap();
        assert!(manager.assignments(&group.id).unwrap().is_empty());

        let result = manager.generate_assignments(&group.id, &id("alice"));
        assert!(matches!(
            result,
            Err(GroupError::Generation(GenerationError::Unsatisfiable { .. }))
        ));
        assert!(manager.assignments(&group.id).unwrap().is_empty());
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::Open
        );
    }

    #[test]
    fn membership_change_clears_assignments() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        manager.generate_assignments(&group.id, &id("alice")).unwrap();

        manager.join_group(&group.id, &id("dave"), None).unwrap();

        assert!(manager.assignments(&group.id).unwrap().is_empty());
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::Open
        );
    }

    #[test]
    fn rejected_join_keeps_assignments() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        let set = manager.generate_assignments(&group.id, &id("alice")).unwrap();

        let result = manager.join_group(&group.id, &id("bob"), None);

        assert!(matches!(result, Err(GroupError::MembershipConflict(_))));
        assert_eq!(manager.assignments(&group.id).unwrap(), set);
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::AssignmentsGenerated
        );
    }

    #[test]
    fn leave_group_clears_assignments_and_couple_together() {
        let (manager, group) = setup(&["alice", "bob", "carol", "dave"]);
        manager
            .set_couple(&group.id, &id("alice"), &id("carol"), &id("dave"))
            .unwrap();
        manager.generate_assignments(&group.id, &id("alice")).unwrap();

        manager.leave_group(&group.id, &id("dave")).unwrap();

        assert!(manager.couples(&group.id).unwrap().is_empty());
        assert!(manager.assignments(&group.id).unwrap().is_empty());
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::Open
        );
        // The remaining members can be assigned again straight away.
        let set = manager.generate_assignments(&group.id, &id("alice")).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn leaving_twice_is_not_found() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        manager.leave_group(&group.id, &id("carol")).unwrap();

        let result = manager.leave_group(&group.id, &id("carol"));
        assert!(matches!(result, Err(GroupError::NotFound(_))));
    }

    #[test]
    fn set_computed_before_a_join_is_not_stored() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        let stale = manager.generate_assignments(&group.id, &id("alice")).unwrap();

        // Same interleaving as a join landing mid-generation: the result
        // computed from the old member list reaches storage after the join.
        manager.join_group(&group.id, &id("dave"), None).unwrap();
        let result = manager.storage().replace_assignments(&group.id, &stale, 1);

        assert!(matches!(result, Err(GroupError::MembershipChanged(_))));
        assert!(manager.assignments(&group.id).unwrap().is_empty());
        assert_eq!(
            manager.get_group(&group.id).unwrap().unwrap().status,
            GroupStatus::Open
        );
    }

    #[test]
    fn recipient_for_returns_stored_receiver() {
        let (manager, group) = setup(&["alice", "bob"]);
        assert_eq!(manager.recipient_for(&group.id, &id("alice")).unwrap(), None);

        manager.generate_assignments(&group.id, &id("alice")).unwrap();

        assert_eq!(
            manager.recipient_for(&group.id, &id("alice")).unwrap(),
            Some(id("bob"))
        );
    }

    #[test]
    fn second_generation_for_same_group_is_rejected_while_in_flight() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        let _guard = manager.begin_generation(&group.id).unwrap();

        let result = manager.generate_assignments(&group.id, &id("alice"));
        assert!(matches!(result, Err(GroupError::GenerationInProgress(_))));
    }

    #[test]
    fn guard_release_allows_next_generation() {
        let (manager, group) = setup(&["alice", "bob", "carol"]);
        {
            let _guard = manager.begin_generation(&group.id).unwrap();
        }
        assert!(manager.generate_assignments(&group.id, &id("alice")).is_ok());
    }

    #[test]
    fn guards_for_different_groups_are_independent() {
        let manager = GroupManager::in_memory().unwrap();
        let first = GroupId::generate();
        let second = GroupId::generate();

        let _a = manager.begin_generation(&first).unwrap();
        assert!(manager.begin_generation(&second).is_ok());
    }

    #[test]
    fn delete_group_requires_admin() {
        let (manager, group) = setup(&["alice", "bob"]);
        assert!(matches!(
            manager.delete_group(&group.id, &id("bob")),
            Err(GroupError::PermissionDenied(_))
        ));

        manager.delete_group(&group.id, &id("alice")).unwrap();
        assert!(manager.get_group(&group.id).unwrap().is_none());
    }

    #[test]
    fn groups_for_lists_memberships() {
        let (manager, group) = setup(&["alice", "bob"]);
        manager
            .create_group(&id("carol"), None, &GroupConfig::new("Other"))
            .unwrap();

        let bobs = manager.groups_for(&id("bob")).unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, group.id);
        assert_eq!(manager.list_groups().unwrap().len(), 2);
    }
}

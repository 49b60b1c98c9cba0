//! `SQLite` storage for group management.
//!
//! This module provides persistent storage for groups, members, couples,
//! and the current assignment set of each group.
//!
//! # Ledger Changes
//!
//! Every change to a group's members or couples runs in one immediate
//! transaction together with clearing the stored assignments and reopening
//! the group. A change is either applied with its cleanup or not at all.
//!
//! # Assignment Replacement
//!
//! A group holds at most one assignment set. Writing a new set checks it
//! against the members and couples stored at commit time, deletes the old
//! rows and inserts the new ones inside a single transaction, together with
//! the group status change. Readers never see a mix of old and new pairs,
//! and a set computed from an outdated member list is never stored.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::error::{GroupError, Result};
use super::types::{Couple, Group, GroupId, GroupStatus, Member, MemberRole};
use crate::assignment::{
    Assignment, AssignmentSet, ExclusionPair, ExclusionSet, GeneratorConfig, ParticipantId,
};

/// Raw `groups` row before enum and JSON decoding.
type GroupRow = (String, String, Option<u32>, String, String, String, i64, i64);

/// `SQLite`-based storage for group data.
///
/// Thread-safe wrapper around a `SQLite` connection.
pub struct GroupStorage {
    conn: Mutex<Connection>,
}

impl GroupStorage {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| GroupError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                budget INTEGER,
                admin TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                generator_config TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_id TEXT NOT NULL,
                participant TEXT NOT NULL,
                display_name TEXT,
                role TEXT NOT NULL DEFAULT 'member',
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, participant),
                FOREIGN KEY (group_id) REFERENCES groups(id)
            );

            -- Couples are stored normalized: first < second
            CREATE TABLE IF NOT EXISTS couples (
                group_id TEXT NOT NULL,
                first TEXT NOT NULL,
                second TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, first, second),
                FOREIGN KEY (group_id) REFERENCES groups(id)
            );

            -- Current assignment set; replaced wholesale on regeneration
            CREATE TABLE IF NOT EXISTS assignments (
                group_id TEXT NOT NULL,
                giver TEXT NOT NULL,
                receiver TEXT NOT NULL,
                position INTEGER NOT NULL,
                generated_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, giver),
                UNIQUE (group_id, receiver),
                FOREIGN KEY (group_id) REFERENCES groups(id)
            );
            ",
        )?;

        Ok(())
    }

    // ==================== Group Operations ====================

    /// Saves a group to the database.
    ///
    /// If a group with the same id exists, it will be updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_group(&self, group: &Group) -> Result<()> {
        let conn = self.lock()?;
        upsert_group(&conn, group)
    }

    /// Inserts a new group together with its admin membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is stored
    /// in that case.
    pub fn create_group(&self, group: &Group, admin: &Member) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        upsert_group(&tx, group)?;
        upsert_member(&tx, &group.id, admin)?;

        tx.commit()?;
        Ok(())
    }

    /// Retrieves a group by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored row
    /// cannot be decoded.
    pub fn get_group(&self, id: &GroupId) -> Result<Option<Group>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                r"
                SELECT id, name, budget, admin, status, generator_config, created_at, updated_at
                FROM groups
                WHERE id = ?1
                ",
                params![id.as_str()],
                read_group_row,
            )
            .optional()?;

        row.map(group_from_row).transpose()
    }

    /// Retrieves all groups, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_all_groups(&self) -> Result<Vec<Group>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, name, budget, admin, status, generator_config, created_at, updated_at
            FROM groups
            ORDER BY updated_at DESC, id
            ",
        )?;

        let rows = stmt
            .query_map([], read_group_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(group_from_row).collect()
    }

    /// Retrieves the groups a participant belongs to, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_groups_for_participant(&self, participant: &ParticipantId) -> Result<Vec<Group>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT g.id, g.name, g.budget, g.admin, g.status, g.generator_config, g.created_at, g.updated_at
            FROM groups g
            JOIN group_members m ON m.group_id = g.id
            WHERE m.participant = ?1
            ORDER BY g.updated_at DESC, g.id
            ",
        )?;

        let rows = stmt
            .query_map(params![participant.as_str()], read_group_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(group_from_row).collect()
    }

    /// Updates a group's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or the database operation fails.
    pub fn update_group_status(
        &self,
        id: &GroupId,
        status: GroupStatus,
        updated_at: i64,
    ) -> Result<()> {
        let conn = self.lock()?;
        set_status(&conn, id, status, updated_at)
    }

    /// Deletes a group and all of its members, couples and assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_group(&self, id: &GroupId) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Delete in order respecting foreign key constraints
        tx.execute(
            "DELETE FROM assignments WHERE group_id = ?1",
            params![id.as_str()],
        )?;
        tx.execute("DELETE FROM couples WHERE group_id = ?1", params![id.as_str()])?;
        tx.execute(
            "DELETE FROM group_members WHERE group_id = ?1",
            params![id.as_str()],
        )?;
        tx.execute("DELETE FROM groups WHERE id = ?1", params![id.as_str()])?;

        tx.commit()?;
        Ok(())
    }

    // ==================== Member Operations ====================

    /// Saves a member of a group without touching assignments.
    ///
    /// If the participant is already a member, the row will be updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_member(&self, group_id: &GroupId, member: &Member) -> Result<()> {
        let conn = self.lock()?;
        upsert_member(&conn, group_id, member)
    }

    /// Adds a new member, clears the stored assignments and reopens the group.
    ///
    /// Returns the number of assignments cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if the group doesn't exist,
    /// [`GroupError::MembershipConflict`] if the participant is already a
    /// member, or an error if the database operation fails. Nothing changes
    /// on error.
    pub fn add_member(
        &self,
        group_id: &GroupId,
        member: &Member,
        updated_at: i64,
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cleared = reopen(&tx, group_id, updated_at)?;
        if member_exists(&tx, group_id, &member.participant)? {
            return Err(GroupError::MembershipConflict(format!(
                "{} is already a member of group {group_id}",
                member.participant
            )));
        }
        upsert_member(&tx, group_id, member)?;

        tx.commit()?;
        Ok(cleared)
    }

    /// Retrieves a single member of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_member(
        &self,
        group_id: &GroupId,
        participant: &ParticipantId,
    ) -> Result<Option<Member>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                r"
                SELECT participant, display_name, role, joined_at
                FROM group_members
                WHERE group_id = ?1 AND participant = ?2
                ",
                params![group_id.as_str(), participant.as_str()],
                read_member_row,
            )
            .optional()?;

        row.map(member_from_row).transpose()
    }

    /// Retrieves all members of a group in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_members(&self, group_id: &GroupId) -> Result<Vec<Member>> {
        let conn = self.lock()?;
        query_members(&conn, group_id)
    }

    /// Removes a member along with their couple, clears the stored
    /// assignments and reopens the group.
    ///
    /// Returns `None` if the participant was not a member, in which case
    /// nothing changes. Otherwise returns the number of assignments cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing changes in
    /// that case.
    pub fn remove_member(
        &self,
        group_id: &GroupId,
        participant: &ParticipantId,
        updated_at: i64,
    ) -> Result<Option<usize>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rows = tx.execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND participant = ?2",
            params![group_id.as_str(), participant.as_str()],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        delete_couples_of(&tx, group_id, participant)?;
        let cleared = reopen(&tx, group_id, updated_at)?;

        tx.commit()?;
        Ok(Some(cleared))
    }

    // ==================== Couple Operations ====================

    /// Saves a couple without membership checks or assignment cleanup.
    /// Saving the same pair twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_couple(&self, group_id: &GroupId, couple: &Couple) -> Result<()> {
        let conn = self.lock()?;
        insert_couple(&conn, group_id, couple)
    }

    /// Declares a couple between two members, clears the stored assignments
    /// and reopens the group.
    ///
    /// Returns the stored couple. If the same pair is already declared it
    /// is returned unchanged and nothing else happens.
    ///
    /// # Errors
    ///
    /// - [`GroupError::NotFound`] if either participant is not a member
    /// - [`GroupError::MembershipConflict`] if either already has another partner
    ///
    /// Nothing changes on error.
    pub fn add_couple(
        &self,
        group_id: &GroupId,
        couple: &Couple,
        updated_at: i64,
    ) -> Result<Couple> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (first, second) = (couple.pair.first(), couple.pair.second());
        for participant in [first, second] {
            if !member_exists(&tx, group_id, participant)? {
                return Err(GroupError::NotFound(format!(
                    "{participant} is not a member of group {group_id}"
                )));
            }
        }

        let couples = query_couples(&tx, group_id)?;
        if let Some(existing) = couples.iter().find(|c| c.pair == couple.pair) {
            return Ok(existing.clone());
        }
        if let Some(taken) = couples
            .iter()
            .find(|c| c.pair.involves(first) || c.pair.involves(second))
        {
            return Err(GroupError::MembershipConflict(format!(
                "{} and {} are already a couple",
                taken.pair.first(),
                taken.pair.second()
            )));
        }

        insert_couple(&tx, group_id, couple)?;
        reopen(&tx, group_id, updated_at)?;

        tx.commit()?;
        Ok(couple.clone())
    }

    /// Retrieves all couples of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_couples(&self, group_id: &GroupId) -> Result<Vec<Couple>> {
        let conn = self.lock()?;
        query_couples(&conn, group_id)
    }

    /// Deletes every couple that includes `participant`. If any was removed,
    /// the stored assignments are cleared and the group reopened in the same
    /// transaction.
    ///
    /// Returns the number of couples removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing changes in
    /// that case.
    pub fn remove_couples_involving(
        &self,
        group_id: &GroupId,
        participant: &ParticipantId,
        updated_at: i64,
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = delete_couples_of(&tx, group_id, participant)?;
        if removed > 0 {
            reopen(&tx, group_id, updated_at)?;
        }

        tx.commit()?;
        Ok(removed)
    }

    // ==================== Assignment Operations ====================

    /// Replaces the group's assignment set and marks the group as generated.
    ///
    /// The set must be valid for the members and couples stored when the
    /// transaction runs. Returns the number of previous assignments replaced.
    ///
    /// # Errors
    ///
    /// - [`GroupError::NotFound`] if the group doesn't exist
    /// - [`GroupError::MembershipChanged`] if the set no longer matches the
    ///   stored members or couples
    ///
    /// The previous set is left untouched on any error.
    pub fn replace_assignments(
        &self,
        group_id: &GroupId,
        assignments: &AssignmentSet,
        generated_at: i64,
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        set_status(&tx, group_id, GroupStatus::AssignmentsGenerated, generated_at)?;

        let participants: Vec<ParticipantId> = query_members(&tx, group_id)?
            .into_iter()
            .map(|m| m.participant)
            .collect();
        let exclusions: ExclusionSet = query_couples(&tx, group_id)?
            .into_iter()
            .map(|c| c.pair)
            .collect();
        if !assignments.is_valid_for(&participants, &exclusions) {
            return Err(GroupError::MembershipChanged(group_id.to_string()));
        }

        let replaced = tx.execute(
            "DELETE FROM assignments WHERE group_id = ?1",
            params![group_id.as_str()],
        )?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO assignments (group_id, giver, receiver, position, generated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )?;
            for (position, assignment) in (0_i64..).zip(assignments.iter()) {
                stmt.execute(params![
                    group_id.as_str(),
                    assignment.giver.as_str(),
                    assignment.receiver.as_str(),
                    position,
                    generated_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(replaced)
    }

    /// Retrieves the group's current assignment set in generation order.
    ///
    /// Returns an empty set if none has been generated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_assignments(&self, group_id: &GroupId) -> Result<AssignmentSet> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT giver, receiver
            FROM assignments
            WHERE group_id = ?1
            ORDER BY position
            ",
        )?;

        let assignments = stmt
            .query_map(params![group_id.as_str()], |row| {
                let giver: String = row.get(0)?;
                let receiver: String = row.get(1)?;
                Ok(Assignment::new(giver, receiver))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(AssignmentSet::from_assignments(assignments))
    }

    /// Deletes the group's assignments and returns the group to `Open`.
    ///
    /// Returns the number of assignments removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or the database operation
    /// fails.
    pub fn clear_assignments(&self, group_id: &GroupId, updated_at: i64) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = reopen(&tx, group_id, updated_at)?;

        tx.commit()?;
        Ok(removed)
    }
}

fn upsert_group(conn: &Connection, group: &Group) -> Result<()> {
    let generator_json = serde_json::to_string(&group.generator)
        .map_err(|e| GroupError::Storage(format!("Failed to serialize generator config: {e}")))?;

    conn.execute(
        r"
        INSERT INTO groups (id, name, budget, admin, status, generator_config, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            budget = excluded.budget,
            admin = excluded.admin,
            status = excluded.status,
            generator_config = excluded.generator_config,
            updated_at = excluded.updated_at
        ",
        params![
            group.id.as_str(),
            &group.name,
            group.budget,
            group.admin.as_str(),
            group.status.as_str(),
            &generator_json,
            group.created_at,
            group.updated_at,
        ],
    )?;

    Ok(())
}

fn set_status(
    conn: &Connection,
    id: &GroupId,
    status: GroupStatus,
    updated_at: i64,
) -> Result<()> {
    let rows = conn.execute(
        "UPDATE groups SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), updated_at, id.as_str()],
    )?;

    if rows == 0 {
        return Err(GroupError::NotFound(format!("group {id}")));
    }

    Ok(())
}

/// Reopens the group and deletes its assignments. Returns the number deleted.
fn reopen(conn: &Connection, group_id: &GroupId, updated_at: i64) -> Result<usize> {
    set_status(conn, group_id, GroupStatus::Open, updated_at)?;
    let removed = conn.execute(
        "DELETE FROM assignments WHERE group_id = ?1",
        params![group_id.as_str()],
    )?;
    Ok(removed)
}

fn upsert_member(conn: &Connection, group_id: &GroupId, member: &Member) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO group_members (group_id, participant, display_name, role, joined_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(group_id, participant) DO UPDATE SET
            display_name = excluded.display_name,
            role = excluded.role
        ",
        params![
            group_id.as_str(),
            member.participant.as_str(),
            &member.display_name,
            member.role.as_str(),
            member.joined_at,
        ],
    )?;

    Ok(())
}

fn member_exists(
    conn: &Connection,
    group_id: &GroupId,
    participant: &ParticipantId,
) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM group_members WHERE group_id = ?1 AND participant = ?2",
            params![group_id.as_str(), participant.as_str()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

// Upserts keep the rowid, so rowid order is insertion order.
fn query_members(conn: &Connection, group_id: &GroupId) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare(
        r"
        SELECT participant, display_name, role, joined_at
        FROM group_members
        WHERE group_id = ?1
        ORDER BY rowid
        ",
    )?;

    let rows = stmt
        .query_map(params![group_id.as_str()], read_member_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(member_from_row).collect()
}

fn insert_couple(conn: &Connection, group_id: &GroupId, couple: &Couple) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO couples (group_id, first, second, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(group_id, first, second) DO NOTHING
        ",
        params![
            group_id.as_str(),
            couple.pair.first().as_str(),
            couple.pair.second().as_str(),
            couple.created_at,
        ],
    )?;

    Ok(())
}

fn query_couples(conn: &Connection, group_id: &GroupId) -> Result<Vec<Couple>> {
    let mut stmt = conn.prepare(
        r"
        SELECT first, second, created_at
        FROM couples
        WHERE group_id = ?1
        ORDER BY first, second
        ",
    )?;

    let couples = stmt
        .query_map(params![group_id.as_str()], |row| {
            let first: String = row.get(0)?;
            let second: String = row.get(1)?;
            Ok(Couple {
                pair: ExclusionPair::new(first, second),
                created_at: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(couples)
}

fn delete_couples_of(
    conn: &Connection,
    group_id: &GroupId,
    participant: &ParticipantId,
) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM couples WHERE group_id = ?1 AND (first = ?2 OR second = ?2)",
        params![group_id.as_str(), participant.as_str()],
    )?;
    Ok(rows)
}

fn read_group_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn group_from_row(
    (id, name, budget, admin, status_str, generator_json, created_at, updated_at): GroupRow,
) -> Result<Group> {
    let id = GroupId::from_hex(&id)
        .ok_or_else(|| GroupError::InvalidData(format!("Invalid group id: {id}")))?;

    let status = GroupStatus::parse(&status_str)
        .ok_or_else(|| GroupError::InvalidData(format!("Invalid status: {status_str}")))?;

    let generator: GeneratorConfig = serde_json::from_str(&generator_json)
        .map_err(|e| GroupError::InvalidData(format!("Invalid generator config JSON: {e}")))?;

    Ok(Group {
        id,
        name,
        budget,
        admin: ParticipantId::new(admin),
        status,
        generator,
        created_at,
        updated_at,
    })
}

fn read_member_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<(String, Option<String>, String, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn member_from_row(
    (participant, display_name, role_str, joined_at): (String, Option<String>, String, i64),
) -> Result<Member> {
    let role = MemberRole::parse(&role_str)
        .ok_or_else(|| GroupError::InvalidData(format!("Invalid role: {role_str}")))?;

    Ok(Member {
        participant: ParticipantId::new(participant),
        display_name,
        role,
        joined_at,
    })
}

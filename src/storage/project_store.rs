//! Project Persistence
//!
//! Saves and loads full Project snapshots plus the append-only publish
//! history. Save is idempotent "latest snapshot wins" keyed by project
//! id; there are no incremental diffs, which keeps ordering between the
//! scheduler and storage trivially correct.
//!
//! Save failures at scheduler call sites are logged and swallowed: the
//! in-memory state stays authoritative for the session, and load always
//! returns the last successfully saved, self-consistent snapshot.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, error};
use uuid::Uuid;

use super::database::SharedDatabase;
use crate::types::{NovelError, Project, PublishRecord, PublishStatus, Result};

pub struct ProjectStore {
    db: SharedDatabase,
}

impl ProjectStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Persist the full project graph, stamping `last_saved_at`.
    pub fn save(&self, project: &mut Project) -> Result<()> {
        project.last_saved_at = Some(Utc::now());
        let data = serde_json::to_string(project)?;
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO projects (id, title, data, saved_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET title = ?2, data = ?3, saved_at = ?4",
            params![
                project.id.to_string(),
                project.title,
                data,
                Utc::now().to_rfc3339(),
            ],
        )?;
        debug!(project = %project.id, words = project.total_words(), "Project saved");
        Ok(())
    }

    /// Best-effort save for the generation path: a storage failure is
    /// logged and surfaced as a non-fatal condition, never propagated.
    pub fn save_best_effort(&self, project: &mut Project) {
        if let Err(err) = self.save(project) {
            error!(project = %project.id, error = %err, "Persistence failed; in-memory state remains authoritative");
        }
    }

    /// Load one project by id.
    pub fn load(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.db.conn()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM projects WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Load every saved project, most recently saved first.
    pub fn list(&self) -> Result<Vec<Project>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare("SELECT data FROM projects ORDER BY saved_at DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(serde_json::from_str(&row?)?);
        }
        Ok(projects)
    }

    /// Resolve a project by id prefix or exact title.
    pub fn find(&self, needle: &str) -> Result<Project> {
        let mut matches: Vec<Project> = self
            .list()?
            .into_iter()
            .filter(|p| p.id.to_string().starts_with(needle) || p.title == needle)
            .collect();

        if matches.len() > 1 {
            return Err(NovelError::Project(format!(
                "'{}' is ambiguous: {} projects match",
                needle,
                matches.len()
            )));
        }
        matches
            .pop()
            .ok_or_else(|| NovelError::Project(format!("No project matches '{}'", needle)))
    }

    /// Remove a project and its snapshot from durable storage.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.db.conn()?;
        let affected = conn.execute(
            "DELETE FROM projects WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    // =========================================================================
    // Publish Records
    // =========================================================================

    /// Insert or finalize a publish record. Pending rows move to a
    /// terminal status exactly once; terminal rows are left untouched.
    pub fn upsert_publish_record(&self, record: &PublishRecord) -> Result<()> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO publish_records (id, chapter_title, submitted_at, status, error)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET status = ?4, error = ?5
             WHERE publish_records.status = 'pending'",
            params![
                record.id.to_string(),
                record.chapter_title,
                record.submitted_at.to_rfc3339(),
                record.status.to_string(),
                record.error,
            ],
        )?;
        Ok(())
    }

    /// Full publish history, newest first.
    pub fn publish_history(&self) -> Result<Vec<PublishRecord>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, chapter_title, submitted_at, status, error
             FROM publish_records ORDER BY submitted_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, chapter_title, submitted_at, status, error) = row?;
            records.push(PublishRecord {
                id: id
                    .parse()
                    .map_err(|e| NovelError::Storage(format!("Corrupt record id: {}", e)))?,
                chapter_title,
                submitted_at: submitted_at
                    .parse()
                    .map_err(|e| NovelError::Storage(format!("Corrupt timestamp: {}", e)))?,
                status: parse_status(&status)?,
                error,
            });
        }
        Ok(records)
    }

    /// Operator-initiated bulk clear of the publish history.
    pub fn clear_publish_history(&self) -> Result<usize> {
        let conn = self.db.conn()?;
        Ok(conn.execute("DELETE FROM publish_records", [])?)
    }
}

fn parse_status(raw: &str) -> Result<PublishStatus> {
    match raw {
        "pending" => Ok(PublishStatus::Pending),
        "succeeded" => Ok(PublishStatus::Succeeded),
        "failed" => Ok(PublishStatus::Failed),
        other => Err(NovelError::Storage(format!(
            "Unknown publish status '{}'",
            other
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================

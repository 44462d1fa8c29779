//! Core novel entities
//!
//! Project, Chapter and PublishRecord definitions shared by the state
//! store, the scheduler and persistence.
//!
//! Invariant: `chapter.word_count == count_words(&chapter.content)` must
//! hold after every mutation. Word counts are always recomputed from
//! content, never tracked incrementally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Count words the way the completion threshold is defined: whitespace
/// separated tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

// =============================================================================
// Chapter
// =============================================================================

/// A unit of generated prose tracked toward a target word count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Derived from `content`; recomputed on every mutation
    pub word_count: usize,
    /// One-way flag: set when the word count first crosses the target,
    /// never cleared automatically
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Chapter {
    /// Create an empty chapter with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            word_count: 0,
            is_complete: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Recompute the word count from content, restoring the invariant.
    pub fn recount(&mut self) {
        self.word_count = count_words(&self.content);
    }

    /// Words still needed to reach `target`; zero once at or past it.
    pub fn remaining_words(&self, target: usize) -> usize {
        target.saturating_sub(self.word_count)
    }
}

// =============================================================================
// Project
// =============================================================================

/// A novel project owned by the current session. One project is active
/// at a time; the scheduler generates into its active chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub chapters: Vec<Chapter>,
    /// Index into `chapters` of the chapter generation targets
    pub active_chapter: usize,
    pub created_at: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create a project with a single empty first chapter.
    pub fn new(title: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            genre: genre.into(),
            chapters: vec![Chapter::new("Chapter 1")],
            active_chapter: 0,
            created_at: Utc::now(),
            last_saved_at: None,
        }
    }

    /// Total word count across all chapters (derived).
    pub fn total_words(&self) -> usize {
        self.chapters.iter().map(|c| c.word_count).sum()
    }

    pub fn active(&self) -> Option<&Chapter> {
        self.chapters.get(self.active_chapter)
    }

    pub fn active_mut(&mut self) -> Option<&mut Chapter> {
        self.chapters.get_mut(self.active_chapter)
    }

    /// The chapter before the active one, if any. Used to seed opening
    /// prompts with a trailing excerpt.
    pub fn previous_chapter(&self) -> Option<&Chapter> {
        self.active_chapter
            .checked_sub(1)
            .and_then(|i| self.chapters.get(i))
    }
}

// =============================================================================
// Publish Records
// =============================================================================

/// Publish submission status. Terminal states are never mutated; the
/// history is append-only until the operator clears it in bulk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Pending,
    Succeeded,
    Failed,
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One publish attempt for a chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRecord {
    pub id: Uuid,
    pub chapter_title: String,
    pub submitted_at: DateTime<Utc>,
    pub status: PublishStatus,
    pub error: Option<String>,
}

impl PublishRecord {
    /// Create a pending record at the start of a publish action.
    pub fn pending(chapter_title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chapter_title: chapter_title.into(),
            submitted_at: Utc::now(),
            status: PublishStatus::Pending,
            error: None,
        }
    }

    /// Finalize as succeeded.
    pub fn succeeded(mut self) -> Self {
        self.status = PublishStatus::Succeeded;
        self.error = None;
        self
    }

    /// Finalize as failed with an error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = PublishStatus::Failed;
        self.error = Some(error.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

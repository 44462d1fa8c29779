//! Chapter State Store
//!
//! Owns the active project during an autopilot run and applies every
//! mutation the scheduler commits. All mutations are synchronous and
//! recompute the word count from content, so the store is consistent
//! even if a caller is interrupted between steps.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Chapter, NovelError, Project, Result};

/// Outcome of appending a generated segment.
#[derive(Debug, Clone, Copy)]
pub struct AppendOutcome {
    /// Words added by this append
    pub words_added: usize,
    /// Chapter word count after the append
    pub total_words: usize,
    /// True when this append first crossed the completion threshold
    pub newly_completed: bool,
}

/// In-memory store for the project being generated. One store is
/// active at a time; the scheduler guards against committing into a
/// store that has been switched away from.
pub struct ChapterStateStore {
    project: Project,
    target_words: usize,
}

impl ChapterStateStore {
    pub fn new(mut project: Project, target_words: usize) -> Self {
        if project.chapters.is_empty() {
            project.chapters.push(Chapter::new("Chapter 1"));
        }
        if project.active_chapter >= project.chapters.len() {
            project.active_chapter = project.chapters.len() - 1;
        }
        Self {
            project,
            target_words,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Mutable access for persistence stamping; invariant-bearing
    /// mutations go through the methods below.
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn target_words(&self) -> usize {
        self.target_words
    }

    /// The chapter generation currently targets. The constructor
    /// guarantees the index is valid.
    pub fn active_chapter(&self) -> &Chapter {
        &self.project.chapters[self.project.active_chapter]
    }

    /// True once the active chapter's word count has reached the
    /// completion threshold.
    pub fn active_reached_target(&self) -> bool {
        self.active_chapter().word_count >= self.target_words
    }

    /// Concatenate generated text onto the chapter with a separating
    /// blank line, recompute the word count, and flip the one-way
    /// completion flag when the threshold is first crossed.
    pub fn append_generated(&mut self, chapter_id: Uuid, text: &str) -> Result<AppendOutcome> {
        let target = self.target_words;
        let chapter = self
            .project
            .chapters
            .iter_mut()
            .find(|c| c.id == chapter_id)
            .ok_or_else(|| {
                NovelError::Project(format!("Chapter {} is no longer in the project", chapter_id))
            })?;

        let before = chapter.word_count;
        if chapter.content.is_empty() {
            chapter.content.push_str(text.trim());
        } else {
            chapter.content.push_str("\n\n");
            chapter.content.push_str(text.trim());
        }
        chapter.recount();

        let newly_completed = !chapter.is_complete && chapter.word_count >= target;
        if newly_completed {
            chapter.is_complete = true;
            chapter.completed_at = Some(Utc::now());
            info!(
                chapter = %chapter.title,
                words = chapter.word_count,
                "Chapter crossed completion threshold"
            );
        }

        debug!(
            chapter = %chapter.title,
            added = chapter.word_count - before,
            total = chapter.word_count,
            "Appended generated segment"
        );

        Ok(AppendOutcome {
            words_added: chapter.word_count - before,
            total_words: chapter.word_count,
            newly_completed,
        })
    }

    /// Mark the active chapter complete if it has reached the target.
    /// One-way: an already complete chapter keeps its original stamp.
    pub fn complete_active(&mut self) {
        let target = self.target_words;
        let chapter = &mut self.project.chapters[self.project.active_chapter];
        if !chapter.is_complete && chapter.word_count >= target {
            chapter.is_complete = true;
            chapter.completed_at = Some(Utc::now());
        }
    }

    /// Change which chapter subsequent generation targets. All
    /// mutations are synchronous, so the only pending state when
    /// leaving a chapter is the unsaved snapshot; callers persist it
    /// before switching.
    pub fn switch_active_chapter(&mut self, index: usize) -> Result<()> {
        if index >= self.project.chapters.len() {
            return Err(NovelError::Project(format!(
                "Chapter index {} out of range ({} chapters)",
                index,
                self.project.chapters.len()
            )));
        }
        self.project.active_chapter = index;
        Ok(())
    }

    /// Append a new empty chapter and make it active.
    pub fn create_chapter(&mut self) -> &Chapter {
        let number = self.project.chapters.len() + 1;
        self.project
            .chapters
            .push(Chapter::new(format!("Chapter {}", number)));
        self.project.active_chapter = self.project.chapters.len() - 1;
        info!(chapter = number, "Created new chapter");
        self.active_chapter()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::count_words;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn store() -> ChapterStateStore {
        ChapterStateStore::new(Project::new("Harbor Lights", "mystery"), 2000)
    }

    #[test]
    fn test_first_append_has_no_leading_separator() {
        let mut store = store();
        let id = store.active_chapter().id;
        let text = words(550);

        let outcome = store.append_generated(id, &text).unwrap();

        assert_eq!(store.active_chapter().content, text);
        assert_eq!(outcome.total_words, 550);
        assert_eq!(outcome.words_added, 550);
        assert!(!outcome.newly_completed);
        assert!(!store.active_chapter().is_complete);
    }

    #[test]
    fn test_append_separates_segments_with_blank_line() {
        let mut store = store();
        let id = store.active_chapter().id;
        store.append_generated(id, "First segment.").unwrap();
        store.append_generated(id, "Second segment.").unwrap();

        assert_eq!(
            store.active_chapter().content,
            "First segment.\n\nSecond segment."
        );
    }

    #[test]
    fn test_word_count_invariant_after_every_append() {
        let mut store = store();
        let id = store.active_chapter().id;

        for n in [10, 250, 1, 600] {
            store.append_generated(id, &words(n)).unwrap();
            let chapter = store.active_chapter();
            assert_eq!(chapter.word_count, count_words(&chapter.content));
        }
    }

    #[test]
    fn test_completion_is_one_way_and_stamped_once() {
        let mut store = store();
        let id = store.active_chapter().id;

        let first = store.append_generated(id, &words(1900)).unwrap();
        assert!(!first.newly_completed);

        let crossing = store.append_generated(id, &words(200)).unwrap();
        assert!(crossing.newly_completed);
        assert!(store.active_chapter().is_complete);
        let stamp = store.active_chapter().completed_at;
        assert!(stamp.is_some());

        // Further appends never re-stamp or revert completion
        let after = store.append_generated(id, &words(100)).unwrap();
        assert!(!after.newly_completed);
        assert!(store.active_chapter().is_complete);
        assert_eq!(store.active_chapter().completed_at, stamp);
    }

    #[test]
    fn test_append_to_unknown_chapter_fails() {
        let mut store = store();
        let err = store.append_generated(Uuid::new_v4(), "text").unwrap_err();
        assert!(err.to_string().contains("no longer in the project"));
    }

    #[test]
    fn test_create_chapter_becomes_active() {
        let mut store = store();
        let id = store.active_chapter().id;
        store.append_generated(id, &words(2000)).unwrap();

        let new_chapter = store.create_chapter();
        assert_eq!(new_chapter.title, "Chapter 2");
        assert_eq!(new_chapter.word_count, 0);
        assert_eq!(store.project().active_chapter, 1);
        assert!(!store.active_reached_target());
    }

    #[test]
    fn test_switch_active_chapter_bounds_checked() {
        let mut store = store();
        store.create_chapter();

        store.switch_active_chapter(0).unwrap();
        assert_eq!(store.project().active_chapter, 0);
        assert!(store.switch_active_chapter(5).is_err());
    }

    #[test]
    fn test_constructor_repairs_empty_and_out_of_range() {
        let mut project = Project::new("Harbor Lights", "mystery");
        project.chapters.clear();
        let store = ChapterStateStore::new(project, 2000);
        assert_eq!(store.project().chapters.len(), 1);

        let mut project = Project::new("Harbor Lights", "mystery");
        project.active_chapter = 9;
        let store = ChapterStateStore::new(project, 2000);
        assert_eq!(store.project().active_chapter, 0);
    }

    #[test]
    fn test_complete_active_requires_target() {
        let mut store = store();
        store.complete_active();
        assert!(!store.active_chapter().is_complete);

        let id = store.active_chapter().id;
        store.append_generated(id, &words(2000)).unwrap();
        assert!(store.active_chapter().is_complete);
    }
}

//! Chapter Prompt Construction
//!
//! Pure functions of chapter state and generation config; no side
//! effects. Three variants, selected by remaining word budget:
//!
//! - **Opening**: empty chapter; seeds the scene, quoting the tail of
//!   the previous chapter when one exists
//! - **Closing**: remaining budget at or below the closing threshold;
//!   states the budget explicitly and asks for resolution plus a hook
//! - **Continuation**: everything in between
//!
//! Every variant interpolates the language directive so one builder
//! serves all output languages.

use crate::config::GenerationConfig;
use crate::constants::{chapter as chapter_constants, prompt as prompt_constants};
use crate::types::project::{Chapter, Project};

/// Which prompt variant applies to the chapter's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Opening,
    Continuation,
    Closing,
}

impl PromptKind {
    /// Select the variant for a chapter growing toward `target_words`.
    pub fn select(chapter: &Chapter, target_words: usize) -> Self {
        if chapter.content.trim().is_empty() {
            Self::Opening
        } else if chapter.remaining_words(target_words)
            <= chapter_constants::CLOSING_BUDGET_WORDS
        {
            Self::Closing
        } else {
            Self::Continuation
        }
    }
}

/// Build the next generation prompt for the project's chapter.
pub fn build_prompt(
    project: &Project,
    chapter: &Chapter,
    config: &GenerationConfig,
    target_words: usize,
) -> String {
    match PromptKind::select(chapter, target_words) {
        PromptKind::Opening => opening_prompt(project, chapter, config),
        PromptKind::Continuation => continuation_prompt(project, chapter, config),
        PromptKind::Closing => closing_prompt(project, chapter, config, target_words),
    }
}

fn opening_prompt(project: &Project, chapter: &Chapter, config: &GenerationConfig) -> String {
    let mut prompt = format!(
        "You are writing \"{}\", a {} novel, in {}. Style: {}.\n\n",
        project.title, project.genre, config.language, config.style
    );

    if let Some(previous) = project.previous_chapter()
        && !previous.content.is_empty()
    {
        prompt.push_str(&format!(
            "The previous chapter ended like this:\n\"...{}\"\n\n",
            tail_excerpt(
                &previous.content,
                prompt_constants::PREVIOUS_EXCERPT_MAX_CHARS
            )
        ));
    }

    prompt.push_str(&format!(
        "Begin \"{}\" with an engaging opening scene of approximately {}-{} words. \
         The full chapter will run {}-{} words, so set up threads that can pay off \
         later. Write only story prose in {}.",
        chapter.title,
        chapter_constants::SEGMENT_WORDS_LOW,
        chapter_constants::SEGMENT_WORDS_HIGH,
        chapter_constants::TARGET_BAND_LOW,
        chapter_constants::TARGET_BAND_HIGH,
        config.language
    ));

    prompt
}

fn continuation_prompt(project: &Project, chapter: &Chapter, config: &GenerationConfig) -> String {
    format!(
        "You are writing \"{}\", a {} novel, in {}. Style: {}.\n\n\
         The chapter so far ends with:\n\"...{}\"\n\n\
         Continue the scene directly from that point in {}-{} words. Do not repeat \
         or summarize earlier text, do not restart the scene, and do not add \
         headings. Write only story prose in {}.",
        project.title,
        project.genre,
        config.language,
        config.style,
        tail_excerpt(&chapter.content, prompt_constants::EXCERPT_MAX_CHARS),
        chapter_constants::SEGMENT_WORDS_LOW,
        chapter_constants::SEGMENT_WORDS_HIGH,
        config.language
    )
}

fn closing_prompt(
    project: &Project,
    chapter: &Chapter,
    config: &GenerationConfig,
    target_words: usize,
) -> String {
    let remaining = chapter.remaining_words(target_words);
    format!(
        "You are writing \"{}\", a {} novel, in {}. Style: {}.\n\n\
         The chapter so far ends with:\n\"...{}\"\n\n\
         You have about {} words left in this chapter. Bring the current scene to \
         a satisfying resolution within that budget and end on a hook that pulls \
         the reader into the next chapter. Write only story prose in {}.",
        project.title,
        project.genre,
        config.language,
        config.style,
        tail_excerpt(&chapter.content, prompt_constants::EXCERPT_MAX_CHARS),
        remaining,
        config.language
    )
}

/// Trailing excerpt of `text`, capped at `max_chars` characters and cut
/// on a character boundary.
fn tail_excerpt(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim_end();
    let total = trimmed.chars().count();
    if total <= max_chars {
        return trimmed;
    }
    let skip = total - max_chars;
    let (byte_start, _) = trimmed.char_indices().nth(skip).unwrap_or((0, ' '));
    &trimmed[byte_start..]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Project, GenerationConfig) {
        (
            Project::new("Harbor Lights", "mystery"),
            GenerationConfig::default(),
        )
    }

    fn fill(chapter: &mut Chapter, words: usize) {
        chapter.content = vec!["word"; words].join(" ");
        chapter.recount();
    }

    #[test]
    fn test_empty_chapter_selects_opening() {
        let (project, config) = setup();
        let chapter = project.active().unwrap();
        assert_eq!(PromptKind::select(chapter, 2000), PromptKind::Opening);

        let prompt = build_prompt(&project, chapter, &config, 2000);
        assert!(prompt.contains("opening scene"));
        assert!(prompt.contains("400-600 words"));
        assert!(prompt.contains("1800-2000 words"));
        assert!(prompt.contains("English"));
    }

    #[test]
    fn test_opening_includes_previous_chapter_tail() {
        let (mut project, config) = setup();
        project.chapters[0].content = "The lighthouse keeper never came back.".to_string();
        project.chapters[0].recount();
        project.chapters.push(Chapter::new("Chapter 2"));
        project.active_chapter = 1;

        let chapter = project.active().unwrap();
        let prompt = build_prompt(&project, chapter, &config, 2000);
        assert!(prompt.contains("previous chapter ended"));
        assert!(prompt.contains("never came back"));
    }

    #[test]
    fn test_mid_chapter_selects_continuation() {
        let (mut project, config) = setup();
        fill(&mut project.chapters[0], 800);

        let chapter = project.active().unwrap();
        assert_eq!(PromptKind::select(chapter, 2000), PromptKind::Continuation);

        let prompt = build_prompt(&project, chapter, &config, 2000);
        assert!(prompt.contains("Continue the scene"));
        assert!(prompt.contains("Do not repeat"));
    }

    #[test]
    fn test_low_budget_selects_closing_with_literal_budget() {
        let (mut project, config) = setup();
        fill(&mut project.chapters[0], 1650);

        let chapter = project.active().unwrap();
        assert_eq!(PromptKind::select(chapter, 2000), PromptKind::Closing);

        // Remaining budget of 350 words appears literally in the prompt
        let prompt = build_prompt(&project, chapter, &config, 2000);
        assert!(prompt.contains("about 350 words"));
        assert!(prompt.contains("hook"));
    }

    #[test]
    fn test_closing_boundary_at_exactly_400_remaining() {
        let (mut project, _config) = setup();
        fill(&mut project.chapters[0], 1600);
        let chapter = project.active().unwrap();
        assert_eq!(PromptKind::select(chapter, 2000), PromptKind::Closing);
    }

    #[test]
    fn test_language_directive_in_every_variant() {
        let (mut project, mut config) = setup();
        config.language = "Korean".to_string();

        for words in [0, 800, 1700] {
            fill(&mut project.chapters[0], words);
            let chapter = project.active().unwrap();
            let prompt = build_prompt(&project, chapter, &config, 2000);
            assert!(prompt.contains("Korean"), "missing language at {words} words");
        }
    }

    #[test]
    fn test_tail_excerpt_caps_length() {
        let text = "a".repeat(5000);
        let excerpt = tail_excerpt(&text, 100);
        assert_eq!(excerpt.chars().count(), 100);
    }

    #[test]
    fn test_tail_excerpt_respects_char_boundaries() {
        let text = "등대지기는 돌아오지 않았다 ".repeat(300);
        let excerpt = tail_excerpt(&text, 50);
        assert!(excerpt.chars().count() <= 50);
    }

    #[test]
    fn test_short_text_returned_whole() {
        assert_eq!(tail_excerpt("short tail  ", 100), "short tail");
    }
}

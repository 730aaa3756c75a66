//! Lesson markdown analysis
//!
//! Walks a chapter's markdown once to produce an outline, a plain-text
//! rendition (sent to the tutor as lesson context), and a reading-time
//! estimate. Rendering is left to whatever presents the lesson.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Average reading speed for technical content
const WORDS_PER_MINUTE: usize = 200;

/// A heading in the lesson outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Level 1-6
    pub level: u8,
    pub text: String,
}

/// Derived facts about a lesson body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonSummary {
    /// Headings in document order
    pub outline: Vec<Heading>,
    /// Prose and code as plain text, blocks separated by blank lines
    pub plain_text: String,
    /// Estimated word count (code counts a third)
    pub word_count: usize,
    /// Estimated reading time, at least one minute
    pub reading_time_minutes: u32,
}

/// Analyse a markdown body
pub fn summarize(markdown: &str) -> LessonSummary {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut outline = Vec::new();
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut heading_level: Option<u8> = None;
    let mut in_code_block = false;
    let mut prose_words = 0;
    let mut code_words = 0;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&mut current, &mut blocks);
                heading_level = Some(heading_level_to_u8(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(level) = heading_level.take() {
                    let text = current.trim().to_string();
                    if !text.is_empty() {
                        outline.push(Heading { level, text });
                    }
                }
                flush(&mut current, &mut blocks);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut current, &mut blocks);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                flush(&mut current, &mut blocks);
            }
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Item
                | TagEnd::BlockQuote(_)
                | TagEnd::TableHead
                | TagEnd::TableRow,
            ) => {
                flush(&mut current, &mut blocks);
            }
            Event::End(TagEnd::TableCell) => current.push_str(" | "),
            Event::Text(text) => {
                let words = text.split_whitespace().count();
                if in_code_block {
                    code_words += words;
                } else {
                    prose_words += words;
                }
                current.push_str(&text);
            }
            Event::Code(code) => {
                prose_words += code.split_whitespace().count();
                current.push_str(&code);
            }
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            _ => {}
        }
    }
    flush(&mut current, &mut blocks);

    let word_count = prose_words + code_words / 3;
    LessonSummary {
        outline,
        plain_text: blocks.join("\n\n"),
        word_count,
        reading_time_minutes: (word_count / WORDS_PER_MINUTE).max(1) as u32,
    }
}

/// Push the pending text as a block, if it has any content
fn flush(current: &mut String, blocks: &mut Vec<String>) {
    let text = std::mem::take(current);
    let text = text.trim().trim_end_matches('|').trim_end();
    if !text.is_empty() {
        blocks.push(text.to_string());
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const LESSON: &str = "# Deterministic vs Agentic\n\n\
        In traditional software we build **deterministic systems**.\n\n\
        ## Key Difference\n\n\
        > Agentic systems write the script as they go.\n\n\
        - Input A\n- Output B\n\n\
        ```python\nif x > 10: do_y()\n```\n";

    #[test]
    fn outline_collects_headings() {
        let summary = summarize(LESSON);
        assert_eq!(
            summary.outline,
            vec![
                Heading { level: 1, text: "Deterministic vs Agentic".into() },
                Heading { level: 2, text: "Key Difference".into() },
            ]
        );
    }

    #[test]
    fn plain_text_strips_markup() {
        let summary = summarize(LESSON);
        assert!(summary.plain_text.contains("we build deterministic systems."));
        assert!(summary.plain_text.contains("Agentic systems write the script"));
        assert!(summary.plain_text.contains("if x > 10"));
        assert!(!summary.plain_text.contains("**"));
        assert!(!summary.plain_text.contains("```"));
    }

    #[test]
    fn reading_time_has_floor_of_one_minute() {
        assert_eq!(summarize("short").reading_time_minutes, 1);
        assert_eq!(summarize("").word_count, 0);

        let long = "word ".repeat(1000);
        assert_eq!(summarize(&long).reading_time_minutes, 5);
    }

    #[test]
    fn tables_render_as_rows() {
        let summary = summarize("| A | B |\n|---|---|\n| 1 | 2 |\n");
        assert!(summary.plain_text.contains("A | B"));
        assert!(summary.plain_text.contains("1 | 2"));
    }
}

//! Content model for courses
//!
//! This module defines the curriculum tree delivered by the platform:
//! a course holds ordered modules, a module holds ordered chapters, and a
//! chapter may carry a single quiz. Order is significant everywhere since it
//! drives completion totals and chapter-to-chapter navigation.

use serde::Serialize;

use super::markdown::{LessonSummary, summarize};

/// A course in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    /// Platform identifier
    pub id: String,
    /// URL slug (used by the dashboard endpoint)
    pub slug: String,
    /// Display title
    pub title: String,
    /// Short description
    pub description: String,
    /// Modules in traversal order
    pub modules: Vec<Module>,
}

impl Course {
    /// Total chapter count across all modules
    pub fn chapter_count(&self) -> usize {
        self.modules.iter().map(|m| m.chapters.len()).sum()
    }

    /// Chapters of this course in module order
    pub fn chapters(&self) -> impl Iterator<Item = &Chapter> + Clone {
        self.modules.iter().flat_map(|m| m.chapters.iter())
    }

    /// Check whether a chapter belongs to this course
    pub fn contains(&self, slug: &str) -> bool {
        self.chapters().any(|c| c.slug == slug)
    }
}

/// A module within a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Platform identifier
    pub id: String,
    /// Module title
    pub title: String,
    /// Chapters in order
    pub chapters: Vec<Chapter>,
}

/// A chapter (lesson) within a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    /// Platform identifier
    pub id: String,
    /// Stable external key, unique across the catalog
    pub slug: String,
    /// Chapter title
    pub title: String,
    /// Whether reading the chapter requires a premium plan
    pub is_premium: bool,
    /// Markdown body; the catalog may deliver a preview before the lesson is fetched
    pub markdown: Option<String>,
    /// Embedded quiz, if any
    pub quiz: Option<Quiz>,
    /// Set once the lesson endpoint has filled in body and quiz
    #[serde(skip)]
    pub(crate) lesson_loaded: bool,
}

impl Chapter {
    /// Create a chapter without content
    pub fn new(id: impl Into<String>, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            title: title.into(),
            is_premium: false,
            markdown: None,
            quiz: None,
            lesson_loaded: false,
        }
    }

    /// Mark the chapter as premium
    pub fn premium(mut self) -> Self {
        self.is_premium = true;
        self
    }

    /// Attach a markdown body
    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    /// Whether the lesson endpoint has been consulted for this chapter
    ///
    /// A body delivered with the catalog does not count: only the lesson
    /// fetch carries the quiz and applies the premium gate.
    pub fn lesson_loaded(&self) -> bool {
        self.lesson_loaded
    }

    /// Outline and reading time of the fetched body
    pub fn summary(&self) -> Option<LessonSummary> {
        self.markdown.as_deref().map(summarize)
    }
}

/// Lesson body delivered separately from the catalog tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonContent {
    pub title: String,
    pub markdown: String,
    pub quiz: Option<Quiz>,
    /// Successor as computed by the server
    pub next_chapter_slug: Option<String>,
}

/// A quiz attached to a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    /// Questions in display order
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// A multiple-choice question
///
/// Construct through [`Question::new`] so the answer key is always a valid
/// index into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: String,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

/// Reasons a question cannot be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
    #[error("question {0} has no options")]
    NoOptions(String),
    #[error("question {id}: correct option {index} is out of range for {len} options")]
    CorrectOptionOutOfRange { id: String, index: usize, len: usize },
}

impl Question {
    /// Build a question, validating the answer key
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, QuestionError> {
        let id = id.into();
        if options.is_empty() {
            return Err(QuestionError::NoOptions(id));
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                id,
                index: correct_option,
                len: options.len(),
            });
        }
        Ok(Self { id, prompt: prompt.into(), options, correct_option })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in answer-key order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    /// Whether `option` is the correct answer
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

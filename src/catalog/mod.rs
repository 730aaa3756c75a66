//! Course catalog
//!
//! Holds the course → module → chapter tree for the active session. The tree
//! is loaded once and treated as a read-only snapshot; only lesson bodies are
//! filled in lazily, and a reload replaces the whole snapshot.

pub mod markdown;
pub mod model;

use std::collections::HashSet;

use thiserror::Error;

use crate::api::ApiError;
use crate::remote::{RemoteCatalogService, SessionContext};

pub use markdown::{Heading, LessonSummary, summarize};
pub use model::{Chapter, Course, LessonContent, Module, Question, QuestionError, Quiz};

/// Errors raised while loading or querying the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Remote catalog fetch failed
    #[error("Course catalog unavailable: {0}")]
    Unavailable(#[source] ApiError),

    /// No chapter or course with this slug
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Chapter body withheld because it needs a premium plan
    #[error("\"{0}\" is premium content. Upgrade to unlock it")]
    Locked(String),

    /// Payload broke a catalog invariant
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

impl CatalogError {
    /// Whether dependent views must stop rendering
    pub fn is_blocking(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_) | CatalogError::Invalid(_))
    }
}

/// The loaded curriculum
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    courses: Vec<Course>,
}

impl ContentCatalog {
    /// Fetch the catalog from the platform
    ///
    /// An empty course list is a valid catalog: the user has no enrolments.
    pub async fn load(
        service: &dyn RemoteCatalogService,
        ctx: &SessionContext,
    ) -> Result<Self, CatalogError> {
        let courses = service.courses(ctx).await.map_err(|e| match e {
            ApiError::InvalidResponse(msg) => CatalogError::Invalid(msg),
            other => CatalogError::Unavailable(other),
        })?;
        let catalog = Self::from_courses(courses)?;
        tracing::info!(
            "Loaded catalog: {} courses, {} chapters",
            catalog.courses.len(),
            catalog.ordered_chapters().count()
        );
        Ok(catalog)
    }

    /// Build a catalog from an already-fetched tree, enforcing slug uniqueness
    pub fn from_courses(courses: Vec<Course>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for chapter in courses.iter().flat_map(|c| c.chapters()) {
            if !seen.insert(chapter.slug.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate chapter slug \"{}\"",
                    chapter.slug
                )));
            }
        }
        Ok(Self { courses })
    }

    /// A catalog with no courses
    pub fn empty() -> Self {
        Self { courses: Vec::new() }
    }

    /// All enrolled courses in delivery order
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// True when the user has no courses
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Find a course by slug
    pub fn course(&self, slug: &str) -> Result<&Course, CatalogError> {
        self.courses
            .iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// The course that owns a chapter
    pub fn course_of(&self, chapter_slug: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.contains(chapter_slug))
    }

    /// Find a chapter by slug
    pub fn find_chapter_by_slug(&self, slug: &str) -> Result<&Chapter, CatalogError> {
        self.ordered_chapters()
            .find(|c| c.slug == slug)
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// Every chapter in course → module → chapter order
    ///
    /// The iterator is lazy and can be cloned to restart the traversal.
    pub fn ordered_chapters(&self) -> impl Iterator<Item = &Chapter> + Clone {
        self.courses.iter().flat_map(|c| c.chapters())
    }

    /// Chapters of one course in module order
    pub fn ordered_chapters_in<'a>(
        &'a self,
        course: &'a Course,
    ) -> impl Iterator<Item = &'a Chapter> + Clone {
        course.chapters()
    }

    fn find_chapter_mut(&mut self, slug: &str) -> Option<&mut Chapter> {
        self.courses
            .iter_mut()
            .flat_map(|c| c.modules.iter_mut())
            .flat_map(|m| m.chapters.iter_mut())
            .find(|c| c.slug == slug)
    }

    /// Return a chapter with its lesson body, fetching it on first access
    pub async fn load_lesson(
        &mut self,
        service: &dyn RemoteCatalogService,
        ctx: &SessionContext,
        slug: &str,
    ) -> Result<&Chapter, CatalogError> {
        let needs_fetch = !self.find_chapter_by_slug(slug)?.lesson_loaded();

        if needs_fetch {
            let content = service.chapter_content(ctx, slug).await.map_err(|e| match e {
                ApiError::NotFound(_) => CatalogError::NotFound(slug.to_string()),
                ApiError::Forbidden(_) => CatalogError::Locked(slug.to_string()),
                ApiError::InvalidResponse(msg) => CatalogError::Invalid(msg),
                other => CatalogError::Unavailable(other),
            })?;
            self.attach_content(slug, content)?;
        } else {
            tracing::debug!("Lesson cache hit for {}", slug);
        }

        self.find_chapter_by_slug(slug)
    }

    /// Store fetched lesson content on its chapter
    pub fn attach_content(&mut self, slug: &str, content: LessonContent) -> Result<(), CatalogError> {
        let chapter =
            self.find_chapter_mut(slug).ok_or_else(|| CatalogError::NotFound(slug.to_string()))?;
        chapter.markdown = Some(content.markdown);
        if content.quiz.is_some() {
            chapter.quiz = content.quiz;
        }
        chapter.lesson_loaded = true;
        Ok(())
    }

    /// Drop a cached lesson body so the next access fetches it again
    pub fn invalidate_lesson(&mut self, slug: &str) {
        if let Some(chapter) = self.find_chapter_mut(slug) {
            chapter.markdown = None;
            chapter.lesson_loaded = false;
        }
    }
}

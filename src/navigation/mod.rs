//! Chapter navigation and access rules
//!
//! Navigation is computed from the catalog snapshot and the progress ledger;
//! it never goes to the network.

use serde::Serialize;

use crate::catalog::{Chapter, ContentCatalog, Course};
use crate::progress::{CompletionStats, ProgressLedger};

/// Local dashboard for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub course_slug: String,
    pub title: String,
    pub stats: CompletionStats,
    /// Where the learner should pick up
    pub resume_slug: Option<String>,
}

/// Answers "where next?" and "may I read this?" for a session
#[derive(Debug, Clone, Copy)]
pub struct NavigationResolver<'a> {
    catalog: &'a ContentCatalog,
    ledger: &'a ProgressLedger,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(catalog: &'a ContentCatalog, ledger: &'a ProgressLedger) -> Self {
        Self { catalog, ledger }
    }

    /// Chapters of the course owning `slug`, plus the position of `slug`
    fn locate(&self, slug: &str) -> Option<(Vec<&'a Chapter>, usize)> {
        let course = self.catalog.course_of(slug)?;
        let chapters: Vec<_> = self.catalog.ordered_chapters_in(course).collect();
        let position = chapters.iter().position(|c| c.slug == slug)?;
        Some((chapters, position))
    }

    /// The chapter after `slug` in its course
    ///
    /// `None` for the last chapter and for slugs that are not in the catalog.
    pub fn next_chapter(&self, slug: &str) -> Option<&'a Chapter> {
        let (chapters, position) = self.locate(slug)?;
        chapters.get(position + 1).copied()
    }

    /// The chapter before `slug` in its course
    pub fn previous_chapter(&self, slug: &str) -> Option<&'a Chapter> {
        let (chapters, position) = self.locate(slug)?;
        position.checked_sub(1).and_then(|i| chapters.get(i).copied())
    }

    /// First incomplete chapter, falling back to the first chapter
    pub fn resume_chapter(&self, course: &'a Course) -> Option<&'a Chapter> {
        course
            .chapters()
            .find(|c| !self.ledger.is_complete(&c.slug))
            .or_else(|| course.chapters().next())
    }

    /// Completion and resume point for a course
    pub fn dashboard(&self, course: &'a Course) -> DashboardView {
        DashboardView {
            course_slug: course.slug.clone(),
            title: course.title.clone(),
            stats: self.ledger.completion_stats(course),
            resume_slug: self.resume_chapter(course).map(|c| c.slug.clone()),
        }
    }
}

/// Whether a user may read a chapter
///
/// Only premium chapters are gated. Locked chapters are still listed and
/// still count toward completion totals.
pub fn is_accessible(chapter: &Chapter, user_is_premium: bool) -> bool {
    !chapter.is_premium || user_is_premium
}

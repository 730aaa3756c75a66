//! Progress tracking for chapters
//!
//! The ledger is the session's source of truth for completion. Marking a
//! chapter complete applies locally first and then mirrors the fact to the
//! platform; a failed mirror never rolls the local state back.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;
use crate::catalog::Course;
use crate::remote::{RemoteProgressService, SessionContext};

/// Completion fact for one chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    /// Chapter slug
    pub chapter_slug: String,
    /// Has the user completed this chapter?
    pub completed: bool,
    /// When the chapter was completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressEntry {
    /// A completed entry stamped with the current time
    pub fn completed_now(slug: impl Into<String>) -> Self {
        Self { chapter_slug: slug.into(), completed: true, completed_at: Some(Utc::now()) }
    }
}

/// Completion counts for a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`, 0 for an empty course
    pub percentage: u8,
}

impl CompletionStats {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total, percentage: percentage(completed, total) }
    }
}

/// Rounded percentage, halves round up; 0 when `total` is 0
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((200 * completed + total) / (2 * total)) as u8
}

/// Remote mirror of a completion failed; the local ledger still has it
#[derive(Debug, Error)]
#[error("Progress for \"{slug}\" saved locally but not synced: {source}")]
pub struct SyncFailed {
    pub slug: String,
    #[source]
    pub source: ApiError,
}

/// What happened to the remote mirror of a completion
#[derive(Debug)]
pub enum SyncStatus {
    /// Platform accepted the write
    Synced,
    /// Chapter was already complete and synced; nothing was sent
    AlreadyComplete,
    /// Write failed; it will be retried on the next completion
    Failed(SyncFailed),
}

/// Result of [`ProgressLedger::mark_complete`]
#[derive(Debug)]
pub struct MarkOutcome {
    /// The call moved the chapter from incomplete to complete
    pub newly_completed: bool,
    pub sync: SyncStatus,
}

impl MarkOutcome {
    /// The sync failure, if any
    pub fn sync_error(&self) -> Option<&SyncFailed> {
        match &self.sync {
            SyncStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Per-user set of completed chapters
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    /// Entries keyed by chapter slug
    entries: HashMap<String, ProgressEntry>,
    /// Completions applied locally but not yet accepted by the platform
    pending: BTreeSet<String>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger from remote completion data
    ///
    /// Later entries for the same slug overwrite earlier ones, except that a
    /// completion the ledger held before this call is never downgraded.
    pub fn hydrate(&mut self, entries: impl IntoIterator<Item = ProgressEntry>) {
        let local: HashSet<String> = self
            .completed_slugs()
            .chain(self.pending_sync())
            .map(str::to_string)
            .collect();
        for entry in entries {
            if !entry.completed && local.contains(&entry.chapter_slug) {
                continue;
            }
            self.entries.insert(entry.chapter_slug.clone(), entry);
        }
    }

    /// Has this chapter been completed?
    pub fn is_complete(&self, slug: &str) -> bool {
        self.entries.get(slug).is_some_and(|e| e.completed)
    }

    /// Slugs of all completed chapters
    pub fn completed_slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.values().filter(|e| e.completed).map(|e| e.chapter_slug.as_str())
    }

    /// Completions still waiting for the platform
    pub fn pending_sync(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Re-queue completions whose mirror failed in an earlier run
    pub fn restore_pending(&mut self, slugs: impl IntoIterator<Item = String>) {
        for slug in slugs {
            self.apply_local(&slug);
            self.pending.insert(slug);
        }
    }

    /// Apply a completion locally; returns true if it was not complete before
    pub fn apply_local(&mut self, slug: &str) -> bool {
        if self.is_complete(slug) {
            return false;
        }
        self.entries.insert(slug.to_string(), ProgressEntry::completed_now(slug));
        true
    }

    /// Mark a chapter complete and mirror it to the platform
    ///
    /// Idempotent: a chapter that is already complete and synced is a no-op
    /// success. Earlier writes that failed are retried before this one.
    pub async fn mark_complete(
        &mut self,
        remote: &dyn RemoteProgressService,
        ctx: &SessionContext,
        slug: &str,
    ) -> MarkOutcome {
        let newly_completed = self.apply_local(slug);
        if newly_completed {
            tracing::info!("Marked {} complete", slug);
        } else if !self.pending.contains(slug) {
            tracing::debug!("{} already complete", slug);
            return MarkOutcome { newly_completed, sync: SyncStatus::AlreadyComplete };
        }

        let mut queue: Vec<String> =
            self.pending.iter().filter(|s| s.as_str() != slug).cloned().collect();
        queue.push(slug.to_string());
        self.pending.insert(slug.to_string());

        let mut failure = None;
        for pending_slug in queue {
            match remote.record_completion(ctx, &pending_slug).await {
                Ok(()) => {
                    self.pending.remove(&pending_slug);
                }
                Err(source) => {
                    tracing::warn!("Failed to sync progress for {}: {}", pending_slug, source);
                    if pending_slug == slug {
                        failure = Some(SyncFailed { slug: pending_slug, source });
                    }
                }
            }
        }

        let sync = match failure {
            Some(e) => SyncStatus::Failed(e),
            None => SyncStatus::Synced,
        };
        MarkOutcome { newly_completed, sync }
    }

    /// Completion counts for a course; locked chapters count toward the total
    pub fn completion_stats(&self, course: &Course) -> CompletionStats {
        let (completed, total) = course.chapters().fold((0, 0), |(done, total), chapter| {
            (done + usize::from(self.is_complete(&chapter.slug)), total + 1)
        });
        CompletionStats::new(completed, total)
    }
}

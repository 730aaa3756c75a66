//! Boundaries to the course platform
//!
//! The core never talks HTTP directly. It depends on these traits, which the
//! [`crate::api::PlatformClient`] implements over reqwest and tests implement
//! in memory. Every call receives the [`SessionContext`] explicitly.

use std::fmt;

use async_trait::async_trait;

use crate::api::ApiError;
use crate::catalog::{Course, LessonContent};
use crate::progress::ProgressEntry;
use crate::tutor::{AssistantError, ChatPrompt, Grade, GradeRequest};

/// Credentials for one logged-in session
///
/// Owned by the session lifecycle and dropped on logout.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: String,
}

impl SessionContext {
    /// Wrap an opaque bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// The bearer token, for the `Authorization` header
    pub fn bearer(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &crate::api::auth::mask_token(&self.token))
            .finish()
    }
}

/// Server-side view of one course's progress
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDashboard {
    pub course_slug: String,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub percentage: f64,
    pub next_chapter_slug: Option<String>,
}

/// New account details
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Supplies the curriculum and completion data
#[async_trait]
pub trait RemoteCatalogService: Send + Sync {
    /// All enrolled courses with their module/chapter tree
    async fn courses(&self, ctx: &SessionContext) -> Result<Vec<Course>, ApiError>;

    /// Body and quiz of a single chapter
    async fn chapter_content(
        &self,
        ctx: &SessionContext,
        slug: &str,
    ) -> Result<LessonContent, ApiError>;

    /// Server-computed dashboard for a course
    async fn dashboard(
        &self,
        ctx: &SessionContext,
        course_slug: &str,
    ) -> Result<RemoteDashboard, ApiError>;

    /// Completion facts recorded for the current user
    async fn completed_chapters(&self, ctx: &SessionContext)
    -> Result<Vec<ProgressEntry>, ApiError>;
}

/// Persists completion events
#[async_trait]
pub trait RemoteProgressService: Send + Sync {
    /// Record a chapter as completed; idempotent on the server
    async fn record_completion(&self, ctx: &SessionContext, slug: &str) -> Result<(), ApiError>;
}

/// AI tutoring and grading
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Ask the tutor a question with the full lesson as context
    async fn chat(&self, ctx: &SessionContext, prompt: &ChatPrompt)
    -> Result<String, AssistantError>;

    /// Grade a free-form answer
    async fn grade(&self, ctx: &SessionContext, request: &GradeRequest)
    -> Result<Grade, AssistantError>;
}

/// Issues bearer credentials
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange username and password for a session
    async fn login(&self, username: &str, password: &str) -> Result<SessionContext, ApiError>;

    /// Create a new account
    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_debug_masks_token() {
        let ctx = SessionContext::new("eyJhbGciOiJIUzI1NiJ9.payload.signature");
        let debug = format!("{:?}", ctx);
        assert!(!debug.contains("payload"));
        assert_eq!(ctx.bearer(), "eyJhbGciOiJIUzI1NiJ9.payload.signature");
    }
}

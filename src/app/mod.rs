//! Session lifecycle
//!
//! [`App`] owns everything that lives for one logged-in session: the
//! [`SessionContext`], the catalog snapshot and the progress ledger. Logging
//! out drops all three and clears the stored token.

pub mod command;

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, PlatformClient, TokenStore};
use crate::catalog::{CatalogError, Chapter, ContentCatalog, Course, Quiz};
use crate::config::Config;
use crate::config::session::ReadingState;
use crate::navigation::{DashboardView, NavigationResolver, is_accessible};
use crate::progress::{MarkOutcome, ProgressLedger};
use crate::quiz::{AttemptState, QuizAttempt, QuizError, QuizScore};
use crate::remote::{
    AssistantService, AuthService, Registration, RemoteCatalogService, RemoteDashboard,
    RemoteProgressService, SessionContext,
};
use crate::tutor::{AssistantError, Grade, GradeRequest, TutorConversation};

pub use command::{ParseResult, QUIZ_HELP, QuizCommand, parse_quiz_command, parse_quiz_line};

/// Login and credential failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// No stored token
    #[error("Not logged in. Run `course-navigator login` first")]
    NotLoggedIn,

    /// The platform refused the credentials
    #[error("Login failed: incorrect username or password")]
    InvalidCredentials,

    /// Auth endpoint failed for another reason
    #[error("Authentication request failed: {0}")]
    Service(#[source] ApiError),

    /// Keyring could not be read or written
    #[error("Could not access stored credentials: {0}")]
    Storage(#[source] ApiError),
}

/// Errors surfaced by session operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    /// A server-side view could not be fetched
    #[error("Platform request failed: {0}")]
    Remote(#[source] ApiError),

    /// Chapter has no quiz attached
    #[error("\"{0}\" has no quiz")]
    NoQuiz(String),

    /// Attempt was made on a different chapter's quiz
    #[error("This attempt is not for the quiz of \"{0}\"")]
    QuizMismatch(String),
}

impl AppError {
    /// Check if the user must log in again
    pub fn requires_reauth(&self) -> bool {
        match self {
            AppError::Auth(AuthError::NotLoggedIn) => true,
            AppError::Catalog(CatalogError::Unavailable(e)) | AppError::Remote(e) => {
                e.requires_reauth()
            }
            AppError::Assistant(e) => e.requires_reauth(),
            _ => false,
        }
    }
}

/// Remote collaborators used by a session
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn RemoteCatalogService>,
    pub progress: Arc<dyn RemoteProgressService>,
    pub assistant: Arc<dyn AssistantService>,
    pub auth: Arc<dyn AuthService>,
}

impl Services {
    /// Route every service through one platform client
    pub fn platform(client: PlatformClient) -> Self {
        let client = Arc::new(client);
        Self {
            catalog: client.clone(),
            progress: client.clone(),
            assistant: client.clone(),
            auth: client,
        }
    }
}

/// Everything tied to the logged-in user
#[derive(Debug)]
struct ActiveSession {
    ctx: SessionContext,
    catalog: ContentCatalog,
    ledger: ProgressLedger,
    /// Remote completions were merged into the ledger
    progress_loaded: bool,
}

/// The course navigator application
pub struct App {
    config: Config,
    services: Services,
    tokens: Box<dyn TokenStore>,
    reading: ReadingState,
    session: Option<ActiveSession>,
}

impl App {
    pub fn new(
        config: Config,
        services: Services,
        tokens: Box<dyn TokenStore>,
        reading: ReadingState,
    ) -> Self {
        Self { config, services, tokens, reading, session: None }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reading position and unsynced completions to persist between runs
    pub fn reading_state(&self) -> &ReadingState {
        &self.reading
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn active(&self) -> Result<&ActiveSession, AppError> {
        self.session.as_ref().ok_or(AppError::Auth(AuthError::NotLoggedIn))
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, AppError> {
        self.session.as_mut().ok_or(AppError::Auth(AuthError::NotLoggedIn))
    }

    /// Exchange credentials for a token, store it and open the session
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let ctx = self.services.auth.login(username, password).await.map_err(|e| match e {
            ApiError::Unauthorized => AuthError::InvalidCredentials,
            other => AuthError::Service(other),
        })?;
        self.tokens.store(ctx.bearer()).map_err(AuthError::Storage)?;
        tracing::info!("Logged in as {}", username);
        self.open_with(ctx).await
    }

    /// Create an account; the user still has to log in
    pub async fn register(&self, registration: &Registration) -> Result<(), AppError> {
        self.services.auth.register(registration).await.map_err(AuthError::Service)?;
        tracing::info!("Registered {}", registration.email);
        Ok(())
    }

    /// Drop the session and forget the stored token
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.session = None;
        self.reading.clear();
        self.tokens.clear().map_err(AuthError::Storage)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Restore the session from the stored token
    pub async fn open(&mut self) -> Result<(), AppError> {
        let ctx = self.tokens.session().map_err(|e| match e {
            ApiError::NotLoggedIn => AuthError::NotLoggedIn,
            other => AuthError::Storage(other),
        })?;
        self.open_with(ctx).await
    }

    async fn open_with(&mut self, ctx: SessionContext) -> Result<(), AppError> {
        let catalog = ContentCatalog::load(self.services.catalog.as_ref(), &ctx).await?;

        let mut ledger = ProgressLedger::new();
        let progress_loaded = match self.services.catalog.completed_chapters(&ctx).await {
            Ok(entries) => {
                ledger.hydrate(entries);
                true
            }
            Err(e) => {
                tracing::warn!("Could not load remote progress: {}", e);
                false
            }
        };
        ledger.restore_pending(self.reading.pending_sync.iter().cloned());

        self.session = Some(ActiveSession { ctx, catalog, ledger, progress_loaded });
        Ok(())
    }

    /// Reload the catalog, dropping cached lessons
    pub async fn refresh_catalog(&mut self) -> Result<(), AppError> {
        let catalog_service = self.services.catalog.clone();
        let session = self.active_mut()?;
        session.catalog = ContentCatalog::load(catalog_service.as_ref(), &session.ctx).await?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<&ContentCatalog, AppError> {
        Ok(&self.active()?.catalog)
    }

    pub fn ledger(&self) -> Result<&ProgressLedger, AppError> {
        Ok(&self.active()?.ledger)
    }

    /// Whether the ledger includes completions recorded on the platform
    ///
    /// When false, local progress views only reflect this device.
    pub fn progress_loaded(&self) -> Result<bool, AppError> {
        Ok(self.active()?.progress_loaded)
    }

    pub fn navigation(&self) -> Result<NavigationResolver<'_>, AppError> {
        let session = self.active()?;
        Ok(NavigationResolver::new(&session.catalog, &session.ledger))
    }

    /// Local dashboard for a course
    pub fn dashboard(&self, course_slug: &str) -> Result<DashboardView, AppError> {
        let session = self.active()?;
        let course = session.catalog.course(course_slug)?;
        Ok(NavigationResolver::new(&session.catalog, &session.ledger).dashboard(course))
    }

    /// Server-computed dashboard for a course
    pub async fn remote_dashboard(&self, course_slug: &str) -> Result<RemoteDashboard, AppError> {
        let session = self.active()?;
        self.services.catalog.dashboard(&session.ctx, course_slug).await.map_err(AppError::Remote)
    }

    /// Course the learner is working in, defaulting to the first one
    pub fn current_course(&self) -> Result<&Course, AppError> {
        let catalog = &self.active()?.catalog;
        if let Some(course) = self.reading.current_course.as_deref().and_then(|s| catalog.course(s).ok())
        {
            return Ok(course);
        }
        catalog
            .courses()
            .first()
            .ok_or_else(|| CatalogError::NotFound("no enrolled courses".to_string()).into())
    }

    /// Last chapter opened, if it is still in the catalog
    pub fn current_chapter(&self) -> Option<&str> {
        let catalog = &self.session.as_ref()?.catalog;
        self.reading.current_chapter().filter(|slug| catalog.find_chapter_by_slug(slug).is_ok())
    }

    /// Open a lesson, fetching its body on first access
    ///
    /// Premium chapters are refused locally for free accounts.
    pub async fn lesson(&mut self, slug: &str) -> Result<&Chapter, AppError> {
        let premium = self.config.premium;
        let catalog_service = self.services.catalog.clone();
        let session = self.session.as_mut().ok_or(AppError::Auth(AuthError::NotLoggedIn))?;

        let chapter = session.catalog.find_chapter_by_slug(slug)?;
        if !is_accessible(chapter, premium) {
            return Err(CatalogError::Locked(chapter.title.clone()).into());
        }
        if let Some(course) = session.catalog.course_of(slug) {
            self.reading.visit(&course.slug, slug);
        }

        let chapter =
            session.catalog.load_lesson(catalog_service.as_ref(), &session.ctx, slug).await?;
        Ok(chapter)
    }

    /// Mark a chapter complete, locally and on the platform
    pub async fn complete(&mut self, slug: &str) -> Result<MarkOutcome, AppError> {
        let progress = self.services.progress.clone();
        let session = self.session.as_mut().ok_or(AppError::Auth(AuthError::NotLoggedIn))?;
        session.catalog.find_chapter_by_slug(slug)?;

        let outcome = session.ledger.mark_complete(progress.as_ref(), &session.ctx, slug).await;
        self.reading.pending_sync = session.ledger.pending_sync().map(str::to_string).collect();
        Ok(outcome)
    }

    /// The quiz attached to a chapter
    pub fn quiz(&self, slug: &str) -> Result<&Quiz, AppError> {
        let chapter = self.active()?.catalog.find_chapter_by_slug(slug)?;
        chapter.quiz.as_ref().ok_or_else(|| AppError::NoQuiz(slug.to_string()))
    }

    /// Record a finished attempt by completing its chapter
    ///
    /// Takes the attempt by value so each attempt completes the chapter once.
    /// The attempt must be on the quiz attached to `slug`.
    pub async fn finish_quiz(
        &mut self,
        slug: &str,
        attempt: QuizAttempt<'_>,
    ) -> Result<(QuizScore, MarkOutcome), AppError> {
        if self.quiz(slug)? != attempt.quiz() {
            return Err(AppError::QuizMismatch(slug.to_string()));
        }
        let AttemptState::Finished(score) = attempt.state() else {
            return Err(QuizError::InvalidTransition {
                action: "record the quiz",
                state: "the attempt is unfinished",
            }
            .into());
        };
        tracing::info!("Quiz for {} finished: {}/{}", slug, score.correct, score.total);
        let outcome = self.complete(slug).await?;
        Ok((score, outcome))
    }

    /// Start a tutor conversation grounded in a loaded lesson
    pub async fn tutor(&mut self, slug: &str) -> Result<TutorConversation, AppError> {
        let chapter = self.lesson(slug).await?;
        let context = chapter.summary().map(|s| s.plain_text).unwrap_or_default();
        Ok(TutorConversation::new(slug, context))
    }

    /// Ask the tutor within a conversation
    pub async fn ask(
        &self,
        conversation: &mut TutorConversation,
        question: &str,
    ) -> Result<String, AppError> {
        let session = self.active()?;
        let reply = conversation.ask(self.services.assistant.as_ref(), &session.ctx, question).await?;
        Ok(reply.to_string())
    }

    /// Grade a free-form answer
    pub async fn grade(&self, request: &GradeRequest) -> Result<Grade, AppError> {
        let session = self.active()?;
        match self.services.assistant.grade(&session.ctx, request).await {
            Ok(grade) => Ok(grade),
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::warn!("Grading rate limited");
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::MemoryTokenStore;
    use crate::catalog::fixtures::abc_course;
    use crate::catalog::LessonContent;
    use crate::progress::{ProgressEntry, SyncStatus};
    use crate::progress::fakes::RecordingProgress;
    use crate::quiz::fixtures::quiz_with_answers;
    use crate::tutor::fakes::ScriptedAssistant;

    fn outage() -> ApiError {
        ApiError::Status { status: 503, message: "service unavailable".into() }
    }

    struct FakeCatalog {
        courses: Vec<Course>,
        lessons: HashMap<String, LessonContent>,
        fetches: Mutex<Vec<String>>,
        courses_down: AtomicBool,
        progress_down: AtomicBool,
    }

    impl FakeCatalog {
        fn fetches(&self) -> Vec<String> {
            self.fetches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteCatalogService for FakeCatalog {
        async fn courses(&self, _ctx: &SessionContext) -> Result<Vec<Course>, ApiError> {
            if self.courses_down.load(Ordering::SeqCst) {
                return Err(outage());
            }
            Ok(self.courses.clone())
        }

        async fn chapter_content(
            &self,
            _ctx: &SessionContext,
            slug: &str,
        ) -> Result<LessonContent, ApiError> {
            self.fetches.lock().unwrap().push(slug.to_string());
            self.lessons.get(slug).cloned().ok_or_else(|| ApiError::NotFound(slug.to_string()))
        }

        async fn dashboard(
            &self,
            _ctx: &SessionContext,
            course_slug: &str,
        ) -> Result<RemoteDashboard, ApiError> {
            if course_slug != "course" {
                return Err(ApiError::NotFound(course_slug.to_string()));
            }
            Ok(RemoteDashboard {
                course_slug: course_slug.to_string(),
                total_chapters: 3,
                completed_chapters: 1,
                percentage: 33.3,
                next_chapter_slug: Some("b".into()),
            })
        }

        async fn completed_chapters(
            &self,
            _ctx: &SessionContext,
        ) -> Result<Vec<ProgressEntry>, ApiError> {
            if self.progress_down.load(Ordering::SeqCst) {
                return Err(outage());
            }
            Ok(vec![ProgressEntry::completed_now("a")])
        }
    }

    struct FakeAuth;

    #[async_trait]
    impl AuthService for FakeAuth {
        async fn login(&self, username: &str, password: &str) -> Result<SessionContext, ApiError> {
            if username == "ada" && password == "secret" {
                Ok(SessionContext::new("token-for-ada"))
            } else {
                Err(ApiError::Unauthorized)
            }
        }

        async fn register(&self, _registration: &Registration) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn lesson(markdown: &str, quiz: Option<Quiz>) -> LessonContent {
        LessonContent { title: "T".into(), markdown: markdown.into(), quiz, next_chapter_slug: None }
    }

    struct Harness {
        app: App,
        progress: Arc<RecordingProgress>,
        catalog: Arc<FakeCatalog>,
    }

    fn harness(premium: bool) -> Harness {
        let mut tree = abc_course();
        tree.modules[0].chapters[2] = Chapter::new("c-id", "c", "C").premium();

        let mut lessons = HashMap::new();
        lessons.insert("a".to_string(), lesson("# A\n\nAgents loop.", None));
        lessons.insert("b".to_string(), lesson("# B", Some(quiz_with_answers(&[1, 0]))));
        lessons.insert("c".to_string(), lesson("# C", None));

        let catalog = Arc::new(FakeCatalog {
            courses: vec![tree],
            lessons,
            fetches: Mutex::default(),
            courses_down: AtomicBool::default(),
            progress_down: AtomicBool::default(),
        });
        let progress = Arc::new(RecordingProgress::default());
        let assistant = ScriptedAssistant::replying(vec![Ok("Sure.".into())]).grading(Ok(Grade {
            score: 4,
            strengths: vec!["names the loop".into()],
            weaknesses: Vec::new(),
            reasoning: "Mostly right".into(),
        }));
        let services = Services {
            catalog: catalog.clone(),
            progress: progress.clone(),
            assistant: Arc::new(assistant),
            auth: Arc::new(FakeAuth),
        };
        let config = Config { premium, ..Config::default() };
        let app = App::new(config, services, Box::new(MemoryTokenStore::default()), ReadingState::default());
        Harness { app, progress, catalog }
    }

    #[tokio::test]
    async fn login_opens_session_and_hydrates() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        assert!(h.app.is_open());
        assert!(h.app.ledger().unwrap().is_complete("a"));
        let view = h.app.dashboard("course").unwrap();
        assert_eq!(view.stats.percentage, 33);
        assert_eq!(view.resume_slug.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn bad_credentials_are_reported() {
        let mut h = harness(false);
        let err = h.app.login("ada", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(!h.app.is_open());
    }

    #[tokio::test]
    async fn open_without_token_requires_login() {
        let mut h = harness(false);
        let err = h.app.open().await.unwrap_err();
        assert!(err.requires_reauth());
    }

    #[tokio::test]
    async fn logout_tears_down_session() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.app.logout().unwrap();

        assert!(!h.app.is_open());
        assert!(h.app.catalog().is_err());
        assert!(matches!(h.app.open().await, Err(AppError::Auth(AuthError::NotLoggedIn))));
    }

    #[tokio::test]
    async fn lesson_is_fetched_once() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        h.app.lesson("a").await.unwrap();
        let chapter = h.app.lesson("a").await.unwrap();
        assert!(chapter.lesson_loaded());
        assert_eq!(h.catalog.fetches(), vec!["a"]);
        assert_eq!(h.app.current_chapter(), Some("a"));
    }

    #[tokio::test]
    async fn premium_lesson_locked_for_free_plan() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        let err = h.app.lesson("c").await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(CatalogError::Locked(_))));
        assert!(h.catalog.fetches().is_empty());
    }

    #[tokio::test]
    async fn premium_lesson_open_for_premium_plan() {
        let mut h = harness(true);
        h.app.login("ada", "secret").await.unwrap();
        assert!(h.app.lesson("c").await.is_ok());
    }

    #[tokio::test]
    async fn finished_quiz_completes_chapter_once() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.app.lesson("b").await.unwrap();

        let quiz = h.app.quiz("b").unwrap().clone();
        let mut attempt = QuizAttempt::start(&quiz).unwrap();
        for pick in [1, 1] {
            attempt.select_option(pick).unwrap();
            attempt.submit().unwrap();
            attempt.advance().unwrap();
        }

        let (score, outcome) = h.app.finish_quiz("b", attempt).await.unwrap();
        assert_eq!(score, QuizScore { correct: 1, total: 2 });
        assert!(matches!(outcome.sync, SyncStatus::Synced));
        assert_eq!(h.progress.calls(), vec!["b"]);
        assert_eq!(h.app.dashboard("course").unwrap().stats.percentage, 67);
    }

    #[tokio::test]
    async fn unfinished_quiz_is_not_recorded() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.app.lesson("b").await.unwrap();

        let quiz = h.app.quiz("b").unwrap().clone();
        let attempt = QuizAttempt::start(&quiz).unwrap();
        assert!(matches!(h.app.finish_quiz("b", attempt).await, Err(AppError::Quiz(_))));
        assert!(h.progress.calls().is_empty());
    }

    #[tokio::test]
    async fn chapter_without_quiz() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        assert!(matches!(h.app.quiz("a"), Err(AppError::NoQuiz(_))));
    }

    #[tokio::test]
    async fn failed_sync_is_kept_for_next_run() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.progress.set_failing(true);

        let outcome = h.app.complete("b").await.unwrap();
        assert!(outcome.sync_error().is_some());
        assert!(h.app.ledger().unwrap().is_complete("b"));
        assert!(h.app.reading_state().pending_sync.contains("b"));
    }

    #[tokio::test]
    async fn complete_unknown_chapter_is_not_found() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        let err = h.app.complete("zzz").await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn tutor_uses_lesson_text() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        let mut conversation = h.app.tutor("a").await.unwrap();
        let reply = h.app.ask(&mut conversation, "Why loop?").await.unwrap();
        assert_eq!(reply, "Sure.");
        assert_eq!(conversation.messages().len(), 2);
    }

    #[tokio::test]
    async fn catalog_outage_blocks_session() {
        let mut h = harness(false);
        h.catalog.courses_down.store(true, Ordering::SeqCst);

        let err = h.app.login("ada", "secret").await.unwrap_err();
        match &err {
            AppError::Catalog(e @ CatalogError::Unavailable(_)) => assert!(e.is_blocking()),
            other => panic!("expected an unavailable catalog, got {other:?}"),
        }
        assert!(!h.app.is_open());
    }

    #[tokio::test]
    async fn refresh_refetches_lessons_and_survives_outage() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.app.lesson("a").await.unwrap();

        h.app.refresh_catalog().await.unwrap();
        h.app.lesson("a").await.unwrap();
        assert_eq!(h.catalog.fetches(), vec!["a", "a"]);

        h.catalog.courses_down.store(true, Ordering::SeqCst);
        let err = h.app.refresh_catalog().await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(CatalogError::Unavailable(_))));
        // the previous snapshot stays usable
        assert!(h.app.catalog().unwrap().find_chapter_by_slug("a").unwrap().lesson_loaded());
    }

    #[tokio::test]
    async fn remote_dashboard_comes_from_platform() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        let dash = h.app.remote_dashboard("course").await.unwrap();
        assert_eq!((dash.completed_chapters, dash.total_chapters), (1, 3));
        assert_eq!(dash.next_chapter_slug.as_deref(), Some("b"));

        let err = h.app.remote_dashboard("nope").await.unwrap_err();
        assert!(matches!(err, AppError::Remote(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn progress_outage_is_reported() {
        let mut h = harness(false);
        h.catalog.progress_down.store(true, Ordering::SeqCst);
        h.app.login("ada", "secret").await.unwrap();

        assert!(!h.app.progress_loaded().unwrap());
        assert!(!h.app.ledger().unwrap().is_complete("a"));

        let mut healthy = harness(false);
        healthy.app.login("ada", "secret").await.unwrap();
        assert!(healthy.app.progress_loaded().unwrap());
    }

    #[tokio::test]
    async fn quiz_attempt_must_match_chapter() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();
        h.app.lesson("b").await.unwrap();

        let other = quiz_with_answers(&[0]);
        let mut attempt = QuizAttempt::start(&other).unwrap();
        attempt.select_option(0).unwrap();
        attempt.submit().unwrap();
        attempt.advance().unwrap();

        let err = h.app.finish_quiz("b", attempt).await.unwrap_err();
        assert!(matches!(err, AppError::QuizMismatch(ref slug) if slug == "b"));
        assert!(h.progress.calls().is_empty());
    }

    #[tokio::test]
    async fn grade_returns_platform_feedback() {
        let mut h = harness(false);
        h.app.login("ada", "secret").await.unwrap();

        let grade = h
            .app
            .grade(&GradeRequest {
                chapter_id: "a-id".into(),
                question_id: "q1".into(),
                answer: "It observes and acts".into(),
            })
            .await
            .unwrap();
        assert_eq!(grade.score, 4);
        assert_eq!(grade.strengths, vec!["names the loop".to_string()]);
    }
}

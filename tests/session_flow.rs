use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use course_navigator::api::{ApiError, MemoryTokenStore};
use course_navigator::catalog::{Chapter, Course, LessonContent, Module, Question, Quiz};
use course_navigator::config::session::ReadingState;
use course_navigator::progress::{ProgressEntry, SyncStatus};
use course_navigator::quiz::{Advance, QuizScore};
use course_navigator::remote::{
    AssistantService, AuthService, Registration, RemoteCatalogService, RemoteDashboard,
    RemoteProgressService, SessionContext,
};
use course_navigator::tutor::{AssistantError, ChatPrompt, Grade, GradeRequest};
use course_navigator::{App, AppError, Config, QuizAttempt, Services};

struct Platform {
    writes: Mutex<Vec<String>>,
    progress_down: AtomicBool,
    throttled: AtomicBool,
}

impl Platform {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            writes: Mutex::new(Vec::new()),
            progress_down: AtomicBool::new(false),
            throttled: AtomicBool::new(false),
        })
    }

    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

fn agents_course() -> Course {
    Course {
        id: "1".into(),
        slug: "agents".into(),
        title: "Building Agents".into(),
        description: "From scripts to agents".into(),
        modules: vec![
            Module {
                id: "m1".into(),
                title: "Foundations".into(),
                chapters: vec![
                    Chapter::new("10", "intro", "Introduction"),
                    Chapter::new("11", "loops", "Agent Loops"),
                ],
            },
            Module {
                id: "m2".into(),
                title: "Advanced".into(),
                chapters: vec![Chapter::new("12", "memory", "Memory").premium()],
            },
        ],
    }
}

fn loops_quiz() -> Quiz {
    let options = || vec!["A".to_string(), "B".to_string(), "C".to_string()];
    Quiz::new(vec![
        Question::new("q1", "What drives an agent loop?", options(), 1).unwrap(),
        Question::new("q2", "When does it stop?", options(), 0).unwrap(),
    ])
}

#[async_trait]
impl RemoteCatalogService for Platform {
    async fn courses(&self, _ctx: &SessionContext) -> Result<Vec<Course>, ApiError> {
        Ok(vec![agents_course()])
    }

    async fn chapter_content(
        &self,
        _ctx: &SessionContext,
        slug: &str,
    ) -> Result<LessonContent, ApiError> {
        let quiz = (slug == "loops").then(loops_quiz);
        Ok(LessonContent {
            title: slug.to_string(),
            markdown: format!("# {slug}\n\nAn agent observes, decides and acts."),
            quiz,
            next_chapter_slug: None,
        })
    }

    async fn dashboard(
        &self,
        _ctx: &SessionContext,
        course_slug: &str,
    ) -> Result<RemoteDashboard, ApiError> {
        Ok(RemoteDashboard {
            course_slug: course_slug.to_string(),
            total_chapters: 3,
            completed_chapters: 0,
            percentage: 0.0,
            next_chapter_slug: Some("intro".into()),
        })
    }

    async fn completed_chapters(
        &self,
        _ctx: &SessionContext,
    ) -> Result<Vec<ProgressEntry>, ApiError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl RemoteProgressService for Platform {
    async fn record_completion(&self, _ctx: &SessionContext, slug: &str) -> Result<(), ApiError> {
        self.writes.lock().unwrap().push(slug.to_string());
        if self.progress_down.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 502, message: "bad gateway".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl AssistantService for Platform {
    async fn chat(
        &self,
        _ctx: &SessionContext,
        prompt: &ChatPrompt,
    ) -> Result<String, AssistantError> {
        if self.throttled.load(Ordering::SeqCst) {
            return Err(AssistantError::RateLimited { retry_after_seconds: Some(60) });
        }
        Ok(format!("You asked: {}", prompt.message))
    }

    async fn grade(
        &self,
        _ctx: &SessionContext,
        _request: &GradeRequest,
    ) -> Result<Grade, AssistantError> {
        if self.throttled.load(Ordering::SeqCst) {
            return Err(AssistantError::RateLimited { retry_after_seconds: None });
        }
        Ok(Grade {
            score: 4,
            strengths: vec!["clear".into()],
            weaknesses: vec![],
            reasoning: "Covers the loop".into(),
        })
    }
}

#[async_trait]
impl AuthService for Platform {
    async fn login(&self, _username: &str, password: &str) -> Result<SessionContext, ApiError> {
        if password == "hunter2" {
            Ok(SessionContext::new("jwt-abcdefghijklmnop"))
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    async fn register(&self, _registration: &Registration) -> Result<(), ApiError> {
        Ok(())
    }
}

fn app_with(platform: &Arc<Platform>, reading: ReadingState) -> App {
    let services = Services {
        catalog: platform.clone(),
        progress: platform.clone(),
        assistant: platform.clone(),
        auth: platform.clone(),
    };
    App::new(Config::default(), services, Box::new(MemoryTokenStore::default()), reading)
}

#[tokio::test]
async fn learner_reads_quizzes_and_progresses() {
    let platform = Platform::new();
    let mut app = app_with(&platform, ReadingState::default());
    app.login("ada", "hunter2").await.expect("login");

    let fresh = app.dashboard("agents").expect("dashboard");
    assert_eq!(fresh.stats.percentage, 0);
    assert_eq!(fresh.resume_slug.as_deref(), Some("intro"));

    app.lesson("intro").await.expect("read intro");
    let outcome = app.complete("intro").await.expect("complete intro");
    assert!(outcome.newly_completed);

    let next = app.navigation().unwrap().next_chapter("intro").map(|c| c.slug.clone());
    assert_eq!(next.as_deref(), Some("loops"));

    app.lesson("loops").await.expect("read loops");
    let quiz = app.quiz("loops").expect("quiz").clone();
    let mut attempt = QuizAttempt::start(&quiz).unwrap();
    attempt.select_option(1).unwrap();
    assert!(attempt.submit().unwrap());
    assert_eq!(attempt.advance().unwrap(), Advance::Next(1));
    attempt.select_option(1).unwrap();
    assert!(!attempt.submit().unwrap());
    assert!(matches!(attempt.advance().unwrap(), Advance::Finished(_)));

    let (score, _) = app.finish_quiz("loops", attempt).await.expect("finish quiz");
    assert_eq!(score, QuizScore { correct: 1, total: 2 });
    assert_eq!(platform.writes(), vec!["intro", "loops"]);

    // the premium chapter is locked but still counts toward the total
    let view = app.dashboard("agents").unwrap();
    assert_eq!((view.stats.completed, view.stats.total, view.stats.percentage), (2, 3, 67));
    assert_eq!(view.resume_slug.as_deref(), Some("memory"));
    assert!(matches!(app.lesson("memory").await, Err(AppError::Catalog(_))));

    app.logout().expect("logout");
    assert!(app.catalog().is_err());
}

#[tokio::test]
async fn failed_sync_survives_into_next_run() {
    let platform = Platform::new();
    platform.progress_down.store(true, Ordering::SeqCst);

    let mut first_run = app_with(&platform, ReadingState::default());
    first_run.login("ada", "hunter2").await.unwrap();
    let outcome = first_run.complete("intro").await.unwrap();
    assert!(matches!(outcome.sync, SyncStatus::Failed(_)));
    let saved = first_run.reading_state().clone();

    platform.progress_down.store(false, Ordering::SeqCst);
    let mut second_run = app_with(&platform, saved);
    second_run.login("ada", "hunter2").await.unwrap();
    assert!(second_run.ledger().unwrap().is_complete("intro"));

    second_run.complete("loops").await.unwrap();
    assert_eq!(platform.writes(), vec!["intro", "intro", "loops"]);
    assert!(second_run.reading_state().pending_sync.is_empty());
}

#[tokio::test]
async fn throttled_tutor_leaves_progress_alone() {
    let platform = Platform::new();
    let mut app = app_with(&platform, ReadingState::default());
    app.login("ada", "hunter2").await.unwrap();
    app.complete("intro").await.unwrap();

    let mut conversation = app.tutor("intro").await.unwrap();
    let reply = app.ask(&mut conversation, "What is an agent?").await.unwrap();
    assert_eq!(reply, "You asked: What is an agent?");

    platform.throttled.store(true, Ordering::SeqCst);
    let err = app.ask(&mut conversation, "And then?").await.unwrap_err();
    assert!(matches!(err, AppError::Assistant(ref e) if e.is_rate_limited()));
    assert_eq!(conversation.messages().len(), 2);

    let grade = app
        .grade(&GradeRequest {
            chapter_id: "10".into(),
            question_id: "q1".into(),
            answer: "It loops".into(),
        })
        .await;
    assert!(matches!(grade, Err(AppError::Assistant(AssistantError::RateLimited { .. }))));

    assert!(app.ledger().unwrap().is_complete("intro"));
    assert_eq!(app.dashboard("agents").unwrap().stats.completed, 1);
}

#[tokio::test]
async fn wrong_password_keeps_session_closed() {
    let platform = Platform::new();
    let mut app = app_with(&platform, ReadingState::default());

    let err = app.login("ada", "nope").await.unwrap_err();
    assert!(!app.is_open());
    assert!(err.to_string().contains("incorrect"));
}

//! Wire models for the platform API
//!
//! These mirror the JSON the platform sends and receives. Responses are
//! converted into the tagged catalog types here, and anything that would
//! break a catalog invariant is rejected before it reaches the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ApiError;
use crate::catalog::{Chapter, Course, LessonContent, Module, Question, Quiz};
use crate::progress::ProgressEntry;
use crate::remote::RemoteDashboard;
use crate::tutor::{AssistantError, Grade};

/// Accept identifiers sent either as strings or as integers
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

/// Course as returned by `GET /courses/`
#[derive(Debug, Clone, Deserialize)]
pub struct CourseDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

/// Module nested in a course
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default)]
    pub chapters: Vec<ChapterDto>,
}

/// Chapter nested in a module
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub quiz: Option<QuizDto>,
}

/// Quiz payload
#[derive(Debug, Clone, Deserialize)]
pub struct QuizDto {
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

/// Question payload
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl TryFrom<QuizDto> for Quiz {
    type Error = ApiError;

    fn try_from(dto: QuizDto) -> Result<Self, Self::Error> {
        let questions = dto
            .questions
            .into_iter()
            .map(|q| {
                Question::new(q.id, q.text, q.options, q.correct_answer)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Quiz::new(questions))
    }
}

impl TryFrom<ChapterDto> for Chapter {
    type Error = ApiError;

    fn try_from(dto: ChapterDto) -> Result<Self, Self::Error> {
        Ok(Chapter {
            id: dto.id,
            slug: dto.slug,
            title: dto.title,
            is_premium: dto.is_premium,
            markdown: dto.content,
            quiz: dto.quiz.map(Quiz::try_from).transpose()?,
            lesson_loaded: false,
        })
    }
}

impl TryFrom<ModuleDto> for Module {
    type Error = ApiError;

    fn try_from(mut dto: ModuleDto) -> Result<Self, Self::Error> {
        // Stable sort: payloads without order_index keep their delivered order
        dto.chapters.sort_by_key(|c| c.order_index.unwrap_or(i64::MAX));
        let chapters = dto.chapters.into_iter().map(Chapter::try_from).collect::<Result<_, _>>()?;
        Ok(Module { id: dto.id, title: dto.title, chapters })
    }
}

impl TryFrom<CourseDto> for Course {
    type Error = ApiError;

    fn try_from(mut dto: CourseDto) -> Result<Self, Self::Error> {
        dto.modules.sort_by_key(|m| m.order_index.unwrap_or(i64::MAX));
        let modules = dto.modules.into_iter().map(Module::try_from).collect::<Result<_, _>>()?;
        Ok(Course {
            id: dto.id,
            slug: dto.slug,
            title: dto.title,
            description: dto.description.unwrap_or_default(),
            modules,
        })
    }
}

/// Response of `GET /chapters/{slug}/content`
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterContentResponse {
    pub title: String,
    pub markdown_content: String,
    #[serde(default)]
    pub quiz: Option<QuizDto>,
    #[serde(default)]
    pub next_chapter_slug: Option<String>,
}

impl TryFrom<ChapterContentResponse> for LessonContent {
    type Error = ApiError;

    fn try_from(dto: ChapterContentResponse) -> Result<Self, Self::Error> {
        Ok(LessonContent {
            title: dto.title,
            markdown: dto.markdown_content,
            quiz: dto.quiz.map(Quiz::try_from).transpose()?,
            next_chapter_slug: dto.next_chapter_slug,
        })
    }
}

/// Course summary embedded in the dashboard
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardCourse {
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `GET /courses/{slug}/dashboard`
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardResponse {
    pub course: DashboardCourse,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub percentage: f64,
    #[serde(default)]
    pub next_chapter_slug: Option<String>,
}

impl From<DashboardResponse> for RemoteDashboard {
    fn from(dto: DashboardResponse) -> Self {
        Self {
            course_slug: dto.course.slug,
            total_chapters: dto.total_chapters,
            completed_chapters: dto.completed_chapters,
            percentage: dto.percentage,
            next_chapter_slug: dto.next_chapter_slug,
        }
    }
}

/// Body of `POST /progress/`
#[derive(Debug, Clone, Serialize)]
pub struct ProgressRequest<'a> {
    pub chapter_slug: &'a str,
    pub is_completed: bool,
}

/// Element of `GET /progress/`
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRecord {
    pub chapter_slug: String,
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ProgressRecord> for ProgressEntry {
    fn from(dto: ProgressRecord) -> Self {
        Self { chapter_slug: dto.chapter_slug, completed: dto.is_completed, completed_at: dto.completed_at }
    }
}

/// Body of `POST /premium/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub context: &'a str,
}

/// Response of `POST /premium/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of `POST /premium/grade`
#[derive(Debug, Clone, Serialize)]
pub struct GradeRequestBody<'a> {
    pub chapter_id: &'a str,
    pub question_id: &'a str,
    pub user_answer: &'a str,
}

/// Strengths and weaknesses returned by the grader
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackDto {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

/// Response of `POST /premium/grade`
#[derive(Debug, Clone, Deserialize)]
pub struct GradeResponse {
    pub score: i64,
    #[serde(default)]
    pub feedback: FeedbackDto,
    #[serde(default)]
    pub reasoning: String,
}

impl TryFrom<GradeResponse> for Grade {
    type Error = AssistantError;

    fn try_from(dto: GradeResponse) -> Result<Self, Self::Error> {
        let score = u8::try_from(dto.score)
            .ok()
            .filter(|s| *s <= Grade::MAX_SCORE)
            .ok_or_else(|| AssistantError::InvalidResponse(format!("score {} outside 0..=5", dto.score)))?;
        Ok(Grade {
            score,
            strengths: dto.feedback.strengths,
            weaknesses: dto.feedback.weaknesses,
            reasoning: dto.reasoning,
        })
    }
}

/// Form body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// FastAPI-style error body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Extract a readable message from a response body, falling back to the raw text
    pub fn message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { detail: serde_json::Value::String(s) }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => body.trim().to_string(),
        }
    }
}

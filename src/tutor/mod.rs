//! AI tutoring and grading
//!
//! The platform's assistant is stateless: every chat call carries the lesson
//! text and the transcript so far as context. Failures here stay local to the
//! tutor and never touch progress or navigation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::remote::{AssistantService, SessionContext};

/// Errors from the tutoring endpoints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistantError {
    /// Throttled by the platform (HTTP 429); not retried automatically
    #[error("The tutor is busy right now{}. Please wait before asking again", wait_hint(.retry_after_seconds))]
    RateLimited { retry_after_seconds: Option<u64> },

    /// Session is missing or expired
    #[error("Please log in again to use the tutor")]
    Unauthorized,

    /// The user's plan does not include the tutor
    #[error("The AI tutor requires a premium plan")]
    PremiumRequired,

    /// Response could not be understood
    #[error("Unexpected tutor response: {0}")]
    InvalidResponse(String),

    /// Any other failure reaching the tutor
    #[error("Tutor unavailable: {0}")]
    Unavailable(String),
}

fn wait_hint(seconds: &Option<u64>) -> String {
    seconds.map(|s| format!(" (try again in {}s)", s)).unwrap_or_default()
}

impl AssistantError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AssistantError::RateLimited { .. })
    }

    /// Check if the user must log in again
    pub fn requires_reauth(&self) -> bool {
        matches!(self, AssistantError::Unauthorized)
    }
}

/// A chat turn sent to the tutor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub message: String,
    /// Lesson text and prior turns
    pub context: String,
}

/// A free-form answer to be graded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRequest {
    pub chapter_id: String,
    pub question_id: String,
    pub answer: String,
}

/// Grader verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    /// 0 to [`Grade::MAX_SCORE`]
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub reasoning: String,
}

impl Grade {
    pub const MAX_SCORE: u8 = 5;
}

/// Message role in a tutoring conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::User => "Student",
            Role::Assistant => "Tutor",
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Local transcript of a tutoring session about one lesson
#[derive(Debug, Clone)]
pub struct TutorConversation {
    chapter_slug: String,
    lesson_text: String,
    messages: Vec<Message>,
}

impl TutorConversation {
    /// Start a conversation grounded in a lesson's plain text
    pub fn new(chapter_slug: impl Into<String>, lesson_text: impl Into<String>) -> Self {
        Self { chapter_slug: chapter_slug.into(), lesson_text: lesson_text.into(), messages: Vec::new() }
    }

    pub fn chapter_slug(&self) -> &str {
        &self.chapter_slug
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Build the prompt for `question` from the lesson and prior turns
    pub fn prompt_for(&self, question: &str) -> ChatPrompt {
        let mut context = self.lesson_text.clone();
        if !self.messages.is_empty() {
            context.push_str("\n\nConversation so far:\n");
            for message in &self.messages {
                context.push_str(&format!("{}: {}\n", message.role.label(), message.content));
            }
        }
        ChatPrompt { message: question.to_string(), context }
    }

    /// Ask the tutor a question
    ///
    /// Both turns are recorded only when the tutor answers.
    pub async fn ask(
        &mut self,
        service: &dyn AssistantService,
        ctx: &SessionContext,
        question: &str,
    ) -> Result<&str, AssistantError> {
        let prompt = self.prompt_for(question);
        let reply = match service.chat(ctx, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::warn!("Tutor rate limited on {}", self.chapter_slug);
                }
                return Err(e);
            }
        };

        self.messages.push(Message::user(question));
        self.messages.push(Message::assistant(reply));
        Ok(self.messages.last().map(|m| m.content.as_str()).unwrap_or_default())
    }
}

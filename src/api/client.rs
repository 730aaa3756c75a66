//! HTTP client for the course platform API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::models::{
    ChapterContentResponse, ChatRequest, ChatResponse, CourseDto, DashboardResponse, ErrorBody,
    GradeRequestBody, GradeResponse, LoginForm, ProgressRecord, ProgressRequest, RegisterRequest,
    TokenResponse,
};
use crate::catalog::{Course, LessonContent};
use crate::progress::ProgressEntry;
use crate::remote::{
    AssistantService, AuthService, Registration, RemoteCatalogService, RemoteDashboard,
    RemoteProgressService, SessionContext,
};
use crate::tutor::{AssistantError, ChatPrompt, Grade, GradeRequest};

/// Platform API client
pub struct PlatformClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
}

impl PlatformClient {
    /// Create a new client for the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Build an absolute URL for an API path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder, ctx: &SessionContext) -> RequestBuilder {
        builder.bearer_auth(ctx.bearer())
    }

    /// Send a request and decode a JSON body, mapping HTTP failures to [`ApiError`]
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(builder.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map non-success statuses to errors
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();

    Err(classify_status(status, retry_after, &body))
}

/// Turn an error status and body into the matching [`ApiError`]
fn classify_status(status: StatusCode, retry_after_seconds: Option<u64>, body: &str) -> ApiError {
    let message = ErrorBody::message(body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { retry_after_seconds },
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Status { status: status.as_u16(), message },
    }
}

impl From<ApiError> for AssistantError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited { retry_after_seconds } => {
                AssistantError::RateLimited { retry_after_seconds }
            }
            ApiError::Unauthorized | ApiError::NotLoggedIn => AssistantError::Unauthorized,
            ApiError::Forbidden(_) => AssistantError::PremiumRequired,
            ApiError::InvalidResponse(msg) => AssistantError::InvalidResponse(msg),
            ApiError::JsonError(e) => AssistantError::InvalidResponse(e.to_string()),
            other => AssistantError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl RemoteCatalogService for PlatformClient {
    async fn courses(&self, ctx: &SessionContext) -> Result<Vec<Course>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/courses/")), ctx);
        let dtos: Vec<CourseDto> = self.send_json(request).await?;
        tracing::debug!("Fetched {} courses", dtos.len());
        dtos.into_iter().map(Course::try_from).collect()
    }

    async fn chapter_content(
        &self,
        ctx: &SessionContext,
        slug: &str,
    ) -> Result<LessonContent, ApiError> {
        let path = format!("/chapters/{}/content", slug);
        let request = self.authorized(self.client.get(self.url(&path)), ctx);
        let dto: ChapterContentResponse = self.send_json(request).await?;
        LessonContent::try_from(dto)
    }

    async fn dashboard(
        &self,
        ctx: &SessionContext,
        course_slug: &str,
    ) -> Result<RemoteDashboard, ApiError> {
        let path = format!("/courses/{}/dashboard", course_slug);
        let request = self.authorized(self.client.get(self.url(&path)), ctx);
        let dto: DashboardResponse = self.send_json(request).await?;
        Ok(dto.into())
    }

    async fn completed_chapters(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<ProgressEntry>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/progress/")), ctx);
        let records: Vec<ProgressRecord> = self.send_json(request).await?;
        Ok(records.into_iter().map(ProgressEntry::from).collect())
    }
}

#[async_trait]
impl RemoteProgressService for PlatformClient {
    async fn record_completion(&self, ctx: &SessionContext, slug: &str) -> Result<(), ApiError> {
        let body = ProgressRequest { chapter_slug: slug, is_completed: true };
        let request = self.authorized(self.client.post(self.url("/progress/")), ctx).json(&body);
        check_status(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl AssistantService for PlatformClient {
    async fn chat(
        &self,
        ctx: &SessionContext,
        prompt: &ChatPrompt,
    ) -> Result<String, AssistantError> {
        let body = ChatRequest { message: &prompt.message, context: &prompt.context };
        let request =
            self.authorized(self.client.post(self.url("/premium/chat")), ctx).json(&body);
        let response: ChatResponse = self.send_json(request).await?;
        Ok(response.response)
    }

    async fn grade(
        &self,
        ctx: &SessionContext,
        request: &GradeRequest,
    ) -> Result<Grade, AssistantError> {
        let body = GradeRequestBody {
            chapter_id: &request.chapter_id,
            question_id: &request.question_id,
            user_answer: &request.answer,
        };
        let builder =
            self.authorized(self.client.post(self.url("/premium/grade")), ctx).json(&body);
        let response: GradeResponse = self.send_json(builder).await?;
        Grade::try_from(response)
    }
}

#[async_trait]
impl AuthService for PlatformClient {
    async fn login(&self, username: &str, password: &str) -> Result<SessionContext, ApiError> {
        let form = LoginForm { username, password };
        let request = self.client.post(self.url("/auth/login")).form(&form);
        let response: TokenResponse = self.send_json(request).await?;
        if response.access_token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("login returned an empty token".into()));
        }
        Ok(SessionContext::new(response.access_token))
    }

    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let body = RegisterRequest {
            email: &registration.email,
            password: &registration.password,
            full_name: &registration.full_name,
        };
        let request = self.client.post(self.url("/auth/register")).json(&body);
        check_status(request.send().await?).await?;
        Ok(())
    }
}

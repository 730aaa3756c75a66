//! Course Navigator - a client for an online course platform
//!
//! Browse a course → module → chapter curriculum, read lessons, take
//! quizzes and track completion, with optional AI tutoring and grading.

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod navigation;
pub mod progress;
pub mod quiz;
pub mod remote;
pub mod tutor;

pub use app::{App, AppError, Services};
pub use catalog::ContentCatalog;
pub use config::Config;
pub use progress::ProgressLedger;
pub use quiz::QuizAttempt;
pub use remote::SessionContext;

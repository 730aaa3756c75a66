//! Reading state persistence
//!
//! Remembers where the learner left off between runs, and which completions
//! still need to reach the platform.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;

/// State carried between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingState {
    /// Course the learner last worked in
    pub current_course: Option<String>,
    /// Last chapter opened, per course slug
    pub last_chapter: HashMap<String, String>,
    /// Completions applied locally that the platform has not accepted yet
    pub pending_sync: BTreeSet<String>,
}

impl ReadingState {
    /// Load state from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::state_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse session.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::state_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    fn state_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// Record that a chapter was opened
    pub fn visit(&mut self, course_slug: &str, chapter_slug: &str) {
        self.current_course = Some(course_slug.to_string());
        self.last_chapter.insert(course_slug.to_string(), chapter_slug.to_string());
    }

    /// Last chapter opened in the current course
    pub fn current_chapter(&self) -> Option<&str> {
        let course = self.current_course.as_ref()?;
        self.last_chapter.get(course).map(String::as_str)
    }

    /// Forget everything tied to the logged-in account
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

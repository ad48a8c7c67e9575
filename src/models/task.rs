use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TodoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, TodoError> {
        Self::from_str(&s.trim().to_ascii_lowercase()).ok_or_else(|| {
            TodoError::validation(format!(
                "Invalid status '{s}': must be one of pending, completed"
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Study,
    Life,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [Self::Work, Self::Study, Self::Life, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Study => "study",
            Self::Life => "life",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Self::Work),
            "study" => Some(Self::Study),
            "life" => Some(Self::Life),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, TodoError> {
        Self::from_str(&s.trim().to_ascii_lowercase()).ok_or_else(|| {
            TodoError::validation(format!(
                "Invalid category '{s}': must be one of work, study, life, other"
            ))
        })
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        Self::Other
    }
}

/// Task priority. Persisted and serialized as its level (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Accepts either the numeric level or the name.
    pub fn parse(s: &str) -> Result<Self, TodoError> {
        let s = s.trim().to_ascii_lowercase();
        let parsed = match s.parse::<i64>() {
            Ok(level) => Self::from_level(level),
            Err(_) => Self::ALL.into_iter().find(|p| p.as_str() == s),
        };
        parsed.ok_or_else(|| {
            TodoError::validation(format!(
                "Invalid priority '{s}': must be 1-4 (low, medium, high, urgent)"
            ))
        })
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.level()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level as i64)
            .ok_or_else(|| format!("invalid priority {level}, expected 1-4"))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub category: TaskCategory,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A fresh pending task. `id` stays 0 until the store assigns one.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        category: TaskCategory,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: title.into(),
            description,
            status: TaskStatus::Pending,
            category,
            priority,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn mark_completed(&mut self) {
        self.touch();
        self.status = TaskStatus::Completed;
        self.completed_at = Some(self.updated_at);
    }

    pub fn mark_pending(&mut self) {
        self.touch();
        self.status = TaskStatus::Pending;
        self.completed_at = None;
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Completed => self.mark_completed(),
            TaskStatus::Pending => self.mark_pending(),
        }
    }

    /// Stamp `updated_at`; never moves it before `created_at` or backwards.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at).max(self.created_at);
    }
}

/// Trim a title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String, TodoError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::validation("Task title must not be empty"));
    }
    Ok(trimmed.to_string())
}

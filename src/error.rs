use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    TaskNotFound,
    ValidationError,
    DatabaseError,
    UnknownTool,
    MissingApiKey,
    ModelError,
    ConversationExhausted,
    IoError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::UnknownTool => "UNKNOWN_TOOL",
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::ModelError => "MODEL_ERROR",
            Self::ConversationExhausted => "CONVERSATION_EXHAUSTED",
            Self::IoError => "IO_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TodoError {
    pub code: ErrorCode,
    pub message: String,
}

impl TodoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {name}"))
    }

    pub fn missing_api_key(var: &str) -> Self {
        Self::new(
            ErrorCode::MissingApiKey,
            format!("{var} is not set. Export it (or add it to your shell profile) to use `todoai chat`."),
        )
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelError, message)
    }

    pub fn conversation_exhausted(rounds: usize) -> Self {
        Self::new(
            ErrorCode::ConversationExhausted,
            format!("Too many tool calls: no final answer after {rounds} rounds"),
        )
    }

    /// Prefix the message with the operation that failed, keeping the code.
    pub fn context(self, operation: &str) -> Self {
        Self {
            code: self.code,
            message: format!("{operation}: {}", self.message),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::TaskNotFound
    }
}

impl From<rusqlite::Error> for TodoError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<reqwest::Error> for TodoError {
    fn from(e: reqwest::Error) -> Self {
        Self::model(e.to_string())
    }
}

impl From<std::io::Error> for TodoError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::IoError, e.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        Self::validation(e.to_string())
    }
}

use std::env;
use std::path::PathBuf;

use crate::error::TodoError;

pub const DB_PATH_ENV: &str = "TODOAI_DB";
pub const API_KEY_ENV: &str = "QWEN_API_KEY";
pub const API_BASE_ENV: &str = "QWEN_API_BASE";
pub const MODEL_ENV: &str = "QWEN_MODEL";

pub const DEFAULT_API_BASE: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-plus";
const DEFAULT_DB_FILE: &str = ".todolist.db";

/// Resolve the database path: explicit flag, then `TODOAI_DB`, then `~/.todolist.db`.
pub fn db_path(flag: Option<&str>) -> Result<PathBuf, TodoError> {
    if let Some(path) = flag.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = non_empty_var(DB_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DB_FILE))
        .ok_or_else(|| {
            TodoError::database(format!(
                "Could not determine home directory. Pass --db or set {DB_PATH_ENV}."
            ))
        })
}

/// Connection settings for the chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Read the chat settings from the environment. A missing key is fatal.
    pub fn from_env() -> Result<Self, TodoError> {
        Self::from_lookup(non_empty_var)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TodoError> {
        let api_key = lookup(API_KEY_ENV).ok_or_else(|| TodoError::missing_api_key(API_KEY_ENV))?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(API_BASE_ENV) {
            config.base_url = base_url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            config.model = model;
        }
        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

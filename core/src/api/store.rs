use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    pub id: String,
    /// Lookup key clients fetch the prompt by.
    pub name: String,
    pub content: String,
    /// Variable list computed when the content was last saved.
    #[serde(default)]
    pub variables: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub key: String,
    pub prompts: Vec<PromptRecord>,
}

/// A prompt together with the key of the project that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPrompt {
    pub record: PromptRecord,
    pub project_key: Option<String>,
}

/// New content for a prompt. The store writes it as both the draft and the
/// live content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub prompt_id: String,
    pub content: String,
    pub variables: String,
    pub updated_at: i64,
}

/// Backing database. Implementations report their own failures as
/// `PromptError::Store`.
pub trait PromptStore {
    fn find_prompt(&self, project_key: Option<&str>, prompt_key: &str) -> Result<Option<PromptRecord>>;

    fn load_prompt(&self, prompt_id: &str) -> Result<Option<StoredPrompt>>;

    fn find_project(&self, project_key: &str) -> Result<Option<ProjectRecord>>;

    fn save_content(&self, update: ContentUpdate) -> Result<()>;
}

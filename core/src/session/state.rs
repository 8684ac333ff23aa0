use serde::{Deserialize, Serialize};

/// Snapshot of one review session. Hunks are never stored; they are
/// recomputed from the two texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Last accepted text; the diff baseline.
    pub original_content: String,
    /// Text under review, initially the AI rewrite.
    pub working_content: String,
    pub is_diff_mode: bool,
}

impl SessionState {
    /// Idle state over an already committed prompt.
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        let original_content = original.into();
        Self {
            working_content: original_content.clone(),
            original_content,
            is_diff_mode: false,
        }
    }
}

//! Line diff between a baseline prompt and an AI-proposed rewrite, decorated
//! with word-level changes for highlighting.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

mod lines;
mod word;

pub use lines::{join_lines, normalize_trailing_newline, same_text, split_lines};
pub use word::{diff_pair, diff_words, WordChange, WordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Added,
    Removed,
    Unchanged,
}

/// One physical line of the decorated diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLine {
    pub kind: LineKind,
    pub content: String,
    /// 1-based line in the baseline; set for removed and unchanged lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<usize>,
    /// 1-based line in the candidate; set for added and unchanged lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_changes: Option<Vec<WordChange>>,
}

impl ProcessedLine {
    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Unchanged
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOptions {
    /// Word-diff each removed line against the added line at the same offset
    /// of the following added run instead of against the empty string.
    #[serde(default)]
    pub pair_modified_lines: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn of(lines: &[ProcessedLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.kind {
                LineKind::Added => stats.added += 1,
                LineKind::Removed => stats.removed += 1,
                LineKind::Unchanged => stats.unchanged += 1,
            }
            stats
        })
    }

    /// Lines still waiting for a decision.
    pub fn pending(&self) -> usize {
        self.added + self.removed
    }
}

/// Computes the decorated line diff from `original` to `working`.
///
/// Both texts are treated as if they ended with a newline, so a missing final
/// newline never produces a change on its own. An empty text on either side
/// yields no lines at all.
pub fn compute_hunks(original: &str, working: &str, options: &DiffOptions) -> Vec<ProcessedLine> {
    if original.is_empty() || working.is_empty() {
        return Vec::new();
    }

    let old_text = normalize_trailing_newline(original);
    let new_text = normalize_trailing_newline(working);
    let old_lines = split_lines(&old_text);
    let new_lines = split_lines(&new_text);

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old_lines, &new_lines);

    let mut processed = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    let mut old_line_number = 1usize;
    let mut new_line_number = 1usize;

    for change in diff.iter_all_changes() {
        let content = change.value();
        let line = match change.tag() {
            ChangeTag::Insert => {
                let line = ProcessedLine {
                    kind: LineKind::Added,
                    content: content.to_string(),
                    old_line_number: None,
                    new_line_number: Some(new_line_number),
                    word_changes: Some(diff_words("", content)),
                };
                new_line_number += 1;
                line
            }
            ChangeTag::Delete => {
                let line = ProcessedLine {
                    kind: LineKind::Removed,
                    content: content.to_string(),
                    old_line_number: Some(old_line_number),
                    new_line_number: None,
                    word_changes: Some(diff_words(content, "")),
                };
                old_line_number += 1;
                line
            }
            ChangeTag::Equal => {
                let line = ProcessedLine {
                    kind: LineKind::Unchanged,
                    content: content.to_string(),
                    old_line_number: Some(old_line_number),
                    new_line_number: Some(new_line_number),
                    word_changes: None,
                };
                old_line_number += 1;
                new_line_number += 1;
                line
            }
        };
        processed.push(line);
    }

    if options.pair_modified_lines {
        pair_modified_runs(&mut processed);
    }

    processed
}

/// Replaces the against-empty word changes of removed/added runs with a real
/// word diff between the k-th removed and the k-th added line.
fn pair_modified_runs(lines: &mut [ProcessedLine]) {
    let mut i = 0;
    while i < lines.len() {
        if lines[i].kind != LineKind::Removed {
            i += 1;
            continue;
        }
        let removed_start = i;
        while i < lines.len() && lines[i].kind == LineKind::Removed {
            i += 1;
        }
        let added_start = i;
        while i < lines.len() && lines[i].kind == LineKind::Added {
            i += 1;
        }

        let pairs = (added_start - removed_start).min(i - added_start);
        for k in 0..pairs {
            let (removed_side, added_side) =
                diff_pair(&lines[removed_start + k].content, &lines[added_start + k].content);
            lines[removed_start + k].word_changes = Some(removed_side);
            lines[added_start + k].word_changes = Some(added_side);
        }
    }
}

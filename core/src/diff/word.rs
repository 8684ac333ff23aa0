use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Equal,
    Added,
    Removed,
}

/// A run of words and whitespace sharing one change kind.
///
/// On the wire it is `{ value, added, removed }`; both flags false means
/// the run is common to the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireWordChange", from = "WireWordChange")]
pub struct WordChange {
    pub value: String,
    pub kind: WordKind,
}

#[derive(Serialize, Deserialize)]
struct WireWordChange {
    value: String,
    #[serde(default)]
    added: bool,
    #[serde(default)]
    removed: bool,
}

impl From<WordChange> for WireWordChange {
    fn from(change: WordChange) -> Self {
        Self {
            added: change.is_added(),
            removed: change.is_removed(),
            value: change.value,
        }
    }
}

impl From<WireWordChange> for WordChange {
    fn from(wire: WireWordChange) -> Self {
        let kind = match (wire.added, wire.removed) {
            (true, _) => WordKind::Added,
            (false, true) => WordKind::Removed,
            (false, false) => WordKind::Equal,
        };
        Self { value: wire.value, kind }
    }
}

impl WordChange {
    pub fn is_added(&self) -> bool {
        self.kind == WordKind::Added
    }

    pub fn is_removed(&self) -> bool {
        self.kind == WordKind::Removed
    }
}

/// Word-level diff of `old` against `new`, whitespace included as tokens.
/// Adjacent tokens of the same kind are merged.
pub fn diff_words(old: &str, new: &str) -> Vec<WordChange> {
    let diff = TextDiff::from_words(old, new);
    let mut out: Vec<WordChange> = Vec::new();

    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => WordKind::Equal,
            ChangeTag::Insert => WordKind::Added,
            ChangeTag::Delete => WordKind::Removed,
        };
        let value = change.value();
        if value.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.kind == kind => last.value.push_str(value),
            _ => out.push(WordChange { value: value.to_string(), kind }),
        }
    }

    out
}

/// Splits a paired diff into the parts shown on the removed line and the
/// parts shown on the added line.
pub fn diff_pair(old: &str, new: &str) -> (Vec<WordChange>, Vec<WordChange>) {
    let changes = diff_words(old, new);
    let removed_side = changes.iter().filter(|c| !c.is_added()).cloned().collect();
    let added_side = changes.into_iter().filter(|c| !c.is_removed()).collect();
    (removed_side, added_side)
}

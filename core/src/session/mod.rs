//! Review session for an AI rewrite of a prompt.
//!
//! The session holds the committed baseline and the candidate text. While in
//! diff mode the user accepts or rejects single lines; once both texts agree
//! the session leaves diff mode on its own.
//!
//! A session has a single writer. Every mutation takes `&mut self`; sharing one
//! session between threads is not supported.

use crate::diff::{compute_hunks, join_lines, same_text, DiffOptions, DiffStats, LineKind, ProcessedLine};
use crate::error::{ErrorCode, PromptError, Result};
use crate::logger::Logger;
use crate::prompts::{candidate_from_tool, ToolInvocation};

pub mod state;

pub use state::SessionState;

/// What is left to review after a per-line decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Reviewing { remaining: usize },
    Converged,
}

pub struct DiffSession {
    state: SessionState,
    options: DiffOptions,
    logger: Logger,
}

impl DiffSession {
    /// Idle session over a committed prompt.
    pub fn new(original: impl Into<String>, logger: Logger) -> Self {
        Self::from_state(SessionState::new(original), logger)
    }

    /// Resumes a session from a snapshot.
    pub fn from_state(state: SessionState, logger: Logger) -> Self {
        Self { state, options: DiffOptions::default(), logger }
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// The baseline. Once idle this is the text to persist.
    pub fn committed(&self) -> &str {
        &self.state.original_content
    }

    pub fn working(&self) -> &str {
        &self.state.working_content
    }

    pub fn is_reviewing(&self) -> bool {
        self.state.is_diff_mode
    }

    /// Starts reviewing `candidate` against the current baseline.
    pub fn begin_diff(&mut self, candidate: impl Into<String>) {
        self.state.working_content = candidate.into();
        self.state.is_diff_mode = true;
        self.logger.info(
            "session",
            "begin",
            &format!(
                "baseline_len={}, candidate_len={}",
                self.state.original_content.len(),
                self.state.working_content.len()
            ),
        );
    }

    /// Begins a diff when `invocation` is a `prompt_write` call.
    /// Returns whether a review started.
    pub fn begin_from_tool(&mut self, invocation: &ToolInvocation) -> Result<bool> {
        match candidate_from_tool(invocation)? {
            Some(candidate) => {
                self.begin_diff(candidate);
                Ok(true)
            }
            None => {
                self.logger.info("session", "tool_ignored", &invocation.tool_name);
                Ok(false)
            }
        }
    }

    /// Decorated diff of baseline against candidate; empty while idle.
    pub fn processed_hunks(&self) -> Vec<ProcessedLine> {
        if !self.state.is_diff_mode {
            return Vec::new();
        }
        compute_hunks(&self.state.original_content, &self.state.working_content, &self.options)
    }

    pub fn stats(&self) -> DiffStats {
        DiffStats::of(&self.processed_hunks())
    }

    /// Accepts the line at `index` into the baseline.
    ///
    /// A modification shows up as removed lines followed by added lines, and
    /// is accepted as a whole: accepting an added line also drops the removed
    /// lines before it, and accepting a removed line also takes the added lines
    /// after it. The scan stops at the first unchanged line.
    pub fn accept_hunk(&mut self, index: usize) -> Result<Resolution> {
        let hunks = self.checked_hunks("accept", index)?;

        let mut accepted = vec![false; hunks.len()];
        match hunks[index].kind {
            LineKind::Unchanged => {
                self.logger.info("session", "accept_noop", &format!("index={index} is unchanged"));
                return Ok(self.settle());
            }
            LineKind::Added => {
                accepted[index] = true;
                for j in (0..index).rev() {
                    match hunks[j].kind {
                        LineKind::Removed => accepted[j] = true,
                        LineKind::Added => {}
                        LineKind::Unchanged => break,
                    }
                }
            }
            LineKind::Removed => {
                accepted[index] = true;
                for j in index + 1..hunks.len() {
                    match hunks[j].kind {
                        LineKind::Added => accepted[j] = true,
                        LineKind::Removed => {}
                        LineKind::Unchanged => break,
                    }
                }
            }
        }

        let baseline: Vec<&str> = hunks
            .iter()
            .zip(&accepted)
            .filter(|(line, taken)| match line.kind {
                LineKind::Unchanged => true,
                LineKind::Removed => !**taken,
                LineKind::Added => **taken,
            })
            .map(|(line, _)| line.content.as_str())
            .collect();

        let trailing = self.state.original_content.ends_with('\n');
        self.state.original_content = join_lines(&baseline, trailing);
        self.logger.info(
            "session",
            "accept",
            &format!("index={index}, lines={}", accepted.iter().filter(|&&a| a).count()),
        );
        Ok(self.settle())
    }

    /// Rejects the line at `index` from the candidate. Only that line is
    /// affected: a rejected addition is dropped from the candidate, a rejected
    /// removal is put back into it at its original place.
    pub fn reject_hunk(&mut self, index: usize) -> Result<Resolution> {
        let hunks = self.checked_hunks("reject", index)?;

        if hunks[index].kind == LineKind::Unchanged {
            self.logger.info("session", "reject_noop", &format!("index={index} is unchanged"));
            return Ok(self.settle());
        }

        let working: Vec<&str> = hunks
            .iter()
            .enumerate()
            .filter(|(j, line)| match line.kind {
                LineKind::Unchanged => true,
                LineKind::Added => *j != index,
                LineKind::Removed => *j == index,
            })
            .map(|(_, line)| line.content.as_str())
            .collect();

        let trailing = self.state.working_content.ends_with('\n');
        self.state.working_content = join_lines(&working, trailing);
        self.logger.info(
            "session",
            "reject",
            &format!("index={index}, kind={:?}", hunks[index].kind),
        );
        Ok(self.settle())
    }

    /// Makes the candidate the new baseline and leaves diff mode.
    pub fn accept_all(&mut self) {
        self.state.original_content = self.state.working_content.clone();
        self.state.is_diff_mode = false;
        self.logger.info("session", "accept_all", &format!("len={}", self.state.original_content.len()));
    }

    /// Restores the baseline as the candidate and leaves diff mode.
    pub fn reject_all(&mut self) {
        self.state.working_content = self.state.original_content.clone();
        self.state.is_diff_mode = false;
        self.logger.info("session", "reject_all", &format!("len={}", self.state.working_content.len()));
    }

    fn checked_hunks(&self, action: &str, index: usize) -> Result<Vec<ProcessedLine>> {
        if !self.state.is_diff_mode {
            let err = PromptError::Precondition {
                code: ErrorCode::NotReviewing,
                message: format!("cannot {action} a line outside of diff mode"),
                context: format!("index={index}"),
            };
            self.logger.error("session", action, &err.to_string());
            return Err(err);
        }

        let hunks = self.processed_hunks();
        if index >= hunks.len() {
            let err = PromptError::Precondition {
                code: ErrorCode::HunkOutOfRange,
                message: format!("line index {index} is out of range"),
                context: format!("lines={}", hunks.len()),
            };
            self.logger.error("session", action, &err.to_string());
            return Err(err);
        }
        Ok(hunks)
    }

    /// Leaves diff mode when baseline and candidate agree.
    fn settle(&mut self) -> Resolution {
        if same_text(&self.state.original_content, &self.state.working_content) {
            self.state.original_content = self.state.working_content.clone();
            self.state.is_diff_mode = false;
            self.logger.info("session", "converged", &format!("len={}", self.state.original_content.len()));
            return Resolution::Converged;
        }
        let hunks = self.processed_hunks();
        self.resolution(&hunks)
    }

    fn resolution(&self, hunks: &[ProcessedLine]) -> Resolution {
        Resolution::Reviewing { remaining: DiffStats::of(hunks).pending() }
    }
}

#![deny(warnings)]

pub mod api;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod logger;
pub mod prompts;
pub mod session;
pub mod template;
pub mod test_helpers;
pub mod test_runner;

pub use client::{HttpPromptSource, PromptClient, PromptSource};
pub use config::ClientConfig;
pub use diff::{compute_hunks, DiffOptions, LineKind, ProcessedLine};
pub use error::{ErrorCode, PromptError, Result};
pub use session::{DiffSession, Resolution};
pub use template::{extract_variables, format_prompt, Prompt};

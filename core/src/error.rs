use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // --- Requests ---
    InvalidRequest,
    PromptNotFound,
    ProjectNotFound,
    ForeignPrompt,

    // --- Templates ---
    MissingVariables,

    // --- Review session ---
    HunkOutOfRange,
    NotReviewing,

    // --- Parsing ---
    ParseFailed,
    BadToolPayload,

    // --- Configuration ---
    InvalidConfig,

    // --- Collaborators ---
    StoreFailed,
    TransportFailed,
    UnexpectedStatus,
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Validation Error: {message} (context: {context})")]
    Validation { code: ErrorCode, message: String, context: String },

    #[error(
        "Missing required variables: {}. All required variables: {}",
        .missing.join(", "),
        .required.join(", ")
    )]
    MissingVariables { missing: Vec<String>, required: Vec<String> },

    #[error("Precondition Error: {message} (context: {context})")]
    Precondition { code: ErrorCode, message: String, context: String },

    #[error("Parse Error: {message} (context: {context})")]
    Parse { code: ErrorCode, message: String, context: String },

    #[error("Invalid configuration: {field} = {value} ({reason})")]
    Config { field: String, value: String, reason: String },

    #[error("Store Error: {message}")]
    Store { code: ErrorCode, message: String },

    #[error("{message}")]
    Http { code: ErrorCode, message: String, status: Option<u16> },
}

impl PromptError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PromptError::Validation { code, .. }
            | PromptError::Precondition { code, .. }
            | PromptError::Parse { code, .. }
            | PromptError::Store { code, .. }
            | PromptError::Http { code, .. } => *code,
            PromptError::MissingVariables { .. } => ErrorCode::MissingVariables,
            PromptError::Config { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// HTTP status the API layer answers with for this error.
    pub fn status(&self) -> u16 {
        match self.code() {
            ErrorCode::InvalidRequest | ErrorCode::MissingVariables | ErrorCode::ParseFailed => 400,
            ErrorCode::ForeignPrompt => 403,
            ErrorCode::PromptNotFound | ErrorCode::ProjectNotFound => 404,
            ErrorCode::UnexpectedStatus => match self {
                PromptError::Http { status: Some(s), .. } => *s,
                _ => 502,
            },
            _ => 500,
        }
    }

    /// Message without the variant prefix, as sent in API error bodies.
    pub fn public_message(&self) -> String {
        match self {
            PromptError::Validation { message, .. }
            | PromptError::Precondition { message, .. }
            | PromptError::Parse { message, .. }
            | PromptError::Store { message, .. }
            | PromptError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>, context: impl Into<String>) -> Self {
        PromptError::Validation {
            code: ErrorCode::InvalidRequest,
            message: message.into(),
            context: context.into(),
        }
    }
}

use thiserror::Error;

/// Rejection produced by the quota reservation check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("Token limit exceeded: {used}/{cap}")]
    LimitExceeded { used: u64, cap: u64 },
}

/// Errors from parsing a billing webhook payload.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("missing {0}")]
    MissingField(&'static str),
}

/// Errors from normalising a client-asserted plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanInputError {
    #[error("plan must be 'premium' or 'free', got '{0}'")]
    UnknownPlan(String),

    #[error("plan or isPremium is required")]
    Missing,
}

/// Errors raised by a speech-synthesis provider.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("No audioContent returned from provider")]
    EmptyAudio,

    /// Displays the provider's message verbatim; `status` is for logs.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("provider request failed: {0}")]
    Transport(String),
}

/// Errors from the identity provider's admin surface.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("identity backend error: {0}")]
    Backend(String),
}

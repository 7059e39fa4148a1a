//! Error types.
//!
//! Two layers:
//!
//! - [`FetchError`] is the domain taxonomy used by the fetch pipeline and the
//!   policy advisor. Only `NoSelection` and `PolicyGeneration` ever reach a
//!   caller; `Network` is absorbed by the orchestrator and turned into tagged
//!   placeholder data.
//! - [`AppError`] is the process-level error carried back to `main`, with the
//!   exit code the binary should terminate with.
//!
//! A missing CO2 field is deliberately not an error value: the normalizer
//! reports it as [`crate::data::normalize::Co2Lookup::Missing`].

/// Failures of the fetch pipeline and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// A fetch was requested before any coordinate was selected.
    #[error("no coordinate selected; pick a point on the map first")]
    NoSelection,

    /// The upstream service was unreachable, answered non-2xx, or sent a body
    /// that could not be read as JSON.
    #[error("upstream request failed: {0}")]
    Network(String),

    /// The generative-text call failed or produced nothing usable.
    #[error("policy generation failed: {0}")]
    PolicyGeneration(String),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        let exit_code = match err {
            FetchError::NoSelection => 2,
            FetchError::Network(_) | FetchError::PolicyGeneration(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

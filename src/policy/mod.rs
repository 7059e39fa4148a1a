//! Policy recommendations: prompt selection, the generative-text call and
//! parsing of its free-text answer.

pub mod advisor;
pub mod gemini;
pub mod parse;
pub mod prompt;

pub use advisor::PolicyAdvisor;
pub use gemini::{GeminiClient, TextGenerator};
pub use parse::parse_policies;
pub use prompt::PromptKind;

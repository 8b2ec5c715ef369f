//! Service components of the selection pipeline.

pub mod arr_client;
pub mod engine;
pub mod formatter;
pub mod llm_client;
pub mod notifier;

pub use arr_client::{ArrClient, ArrError};
pub use engine::{DecisionEngine, Verdict};
pub use formatter::format_releases;
pub use llm_client::{LlmClient, LlmConfig, ModelAnswer, ReleasePicker, SelectionError};
pub use notifier::Notifier;

//! Data models for arr-llm-picker.

pub mod decision;
pub mod release;

pub use decision::{Decision, NotificationIntent, NotifyPriority, Outcome, NO_PROMPT_REASON};
pub use release::{DdoPayload, MediaRef, Release, SelectionRequest, Service};

//! Decision value types shared across the selection pipeline.

use serde::Serialize;

/// Exact reason string for the no-prompt bypass; callers branch on the
/// `Outcome` variant, but the webhook response carries this text verbatim.
pub const NO_PROMPT_REASON: &str = "AI bypassed - no prompt for this profile";

/// Terminal output of one selection decision.
///
/// `approved` is always true: the engine only picks among releases the
/// manager already intends to consider, it never vetoes a download.
/// Constructed once per request, returned, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_release_guid: Option<String>,
    pub reason: String,
}

impl Decision {
    /// A decision that defers to the manager's own choice (no guid).
    pub fn deferred(reason: impl Into<String>) -> Self {
        Decision {
            approved: true,
            selected_release_guid: None,
            reason: reason.into(),
        }
    }

    /// A decision that overrides the manager's choice with `guid`.
    pub fn override_with(guid: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision {
            approved: true,
            selected_release_guid: Some(guid.into()),
            reason: reason.into(),
        }
    }
}

/// Where the selection pipeline terminated, evaluated in order and terminal
/// on first match. Indices are 0-based positions into the request's
/// original release ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Release list was empty; nothing to evaluate.
    NoReleases,
    /// The media item carries the configured skip tag.
    SkipTagged { tag: String },
    /// No system prompt configured for (service, profile); AI disabled.
    NoPrompt,
    /// The model call failed or answered with an out-of-range index.
    ModelFailed { detail: String },
    /// The model picked the release the manager had already flagged.
    ConfirmsDefault { index: usize, reason: String },
    /// The model picked a different release (or no default was flagged).
    Override { index: usize, reason: String },
}

/// Priority of a notification intent, mapped to ntfy levels by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPriority {
    Low,
    Default,
    High,
}

impl NotifyPriority {
    /// ntfy numeric level: low 1, default 3, high 5.
    pub fn as_level(&self) -> u8 {
        match self {
            NotifyPriority::Low => 1,
            NotifyPriority::Default => 3,
            NotifyPriority::High => 5,
        }
    }
}

/// Side-channel message a decision wants delivered. Delivery (and delivery
/// failure) is entirely the notifier's concern and never feeds back into
/// the decision.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIntent {
    pub title: String,
    pub message: String,
    pub priority: NotifyPriority,
    pub tags: Vec<String>,
}

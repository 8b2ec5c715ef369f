//! Release selection decision engine.
//!
//! Orchestrates prompt resolution, release formatting and the model call,
//! then folds the result into a single approve/defer-or-override decision.
//! Every branch answers `approved: true`: the engine chooses among releases
//! the manager already considers eligible, it never blocks a download.

use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{
    Decision, NotificationIntent, NotifyPriority, Outcome, SelectionRequest, NO_PROMPT_REASON,
};
use crate::prompts::PromptTable;
use crate::services::formatter::{format_releases, format_size_gb};
use crate::services::llm_client::{ReleasePicker, SelectionError};

/// A decision plus the notification it wants delivered, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub notification: Option<NotificationIntent>,
}

impl Verdict {
    fn silent(decision: Decision) -> Self {
        Verdict {
            decision,
            notification: None,
        }
    }
}

pub struct DecisionEngine {
    picker: Arc<dyn ReleasePicker>,
    skip_tag: String,
    dry_run: bool,
}

/// Fixed user message; the system prompt is the only per-profile part.
fn build_user_prompt(request: &SelectionRequest) -> String {
    format!(
        "Media: {}\nQuality Profile: {}\n\n{}\n\nSelect the best release. \
         Respond with JSON only: {{\"choice\": <number>, \"reason\": \"<brief reason>\"}}",
        request.media_title,
        request.profile_name,
        format_releases(&request.releases, &request.media_title)
    )
}

impl DecisionEngine {
    pub fn new(picker: Arc<dyn ReleasePicker>, skip_tag: String, dry_run: bool) -> Self {
        DecisionEngine {
            picker,
            skip_tag,
            dry_run,
        }
    }

    /// Run the selection pipeline for one request, terminal on first match.
    ///
    /// The model is only invoked once the cheap bypass checks (empty list,
    /// skip tag, missing prompt) have all passed, and its answer is
    /// range-checked before any release is addressed.
    pub async fn select(&self, prompts: &PromptTable, request: &SelectionRequest) -> Outcome {
        if request.releases.is_empty() {
            warn!(media = %request.media_title, "No releases in payload");
            return Outcome::NoReleases;
        }

        if request.skip_tag_matched {
            info!(
                media = %request.media_title,
                tag = %self.skip_tag,
                "Skipping AI selection (skip tag present)"
            );
            return Outcome::SkipTagged {
                tag: self.skip_tag.clone(),
            };
        }

        let Some(system_prompt) = prompts.resolve(request.service, &request.profile_name) else {
            info!(
                service = %request.service,
                profile = %request.profile_name,
                "No prompt configured for profile, AI bypassed"
            );
            return Outcome::NoPrompt;
        };

        info!(
            media = %request.media_title,
            service = %request.service,
            profile = %request.profile_name,
            releases = request.releases.len(),
            "Asking model for selection"
        );

        let user_prompt = build_user_prompt(request);
        let answer = match self.picker.pick(system_prompt, &user_prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Model selection failed: {}", e);
                return Outcome::ModelFailed {
                    detail: e.to_string(),
                };
            }
        };

        let count = request.releases.len();
        if answer.choice < 1 || answer.choice as usize > count {
            let err = SelectionError::OutOfRangeChoice {
                choice: answer.choice,
                count,
            };
            warn!("Model selection invalid: {}", err);
            return Outcome::ModelFailed {
                detail: err.to_string(),
            };
        }

        let index = (answer.choice - 1) as usize;
        let chosen = &request.releases[index];
        match request.default_release() {
            Some(default) if default.guid == chosen.guid => Outcome::ConfirmsDefault {
                index,
                reason: answer.reason,
            },
            // No flagged default means any valid choice is an override.
            _ => Outcome::Override {
                index,
                reason: answer.reason,
            },
        }
    }

    /// Fold the pipeline outcome into the final decision and the
    /// notification intent the webhook layer should emit, if any.
    pub async fn decide(&self, prompts: &PromptTable, request: &SelectionRequest) -> Verdict {
        let outcome = self.select(prompts, request).await;
        self.fold(request, outcome)
    }

    fn fold(&self, request: &SelectionRequest, outcome: Outcome) -> Verdict {
        match outcome {
            Outcome::NoReleases => Verdict::silent(Decision::deferred("No releases to evaluate")),

            Outcome::SkipTagged { tag } => {
                Verdict::silent(Decision::deferred(format!("Skipped: tag {} present", tag)))
            }

            Outcome::NoPrompt => Verdict::silent(Decision::deferred(NO_PROMPT_REASON)),

            Outcome::ModelFailed { detail } => Verdict {
                decision: Decision::deferred(format!("AI failed: {}, using default", detail)),
                notification: Some(NotificationIntent {
                    title: format!("AI Warning: {}", request.media_title),
                    message: format!(
                        "Selection failed: {}\nUsing {} default",
                        detail,
                        request.service.display_name()
                    ),
                    priority: NotifyPriority::Low,
                    tags: vec!["warning".to_string()],
                }),
            },

            Outcome::ConfirmsDefault { index, reason } => {
                info!(
                    "AI confirms {} selection: {}",
                    request.service.display_name(),
                    request.releases[index].title
                );
                Verdict::silent(Decision::deferred(format!("AI confirms default: {}", reason)))
            }

            Outcome::Override { index, reason } => {
                let chosen = &request.releases[index];
                info!(
                    "AI overrides to: {} ({} GB)",
                    chosen.title,
                    format_size_gb(chosen.size)
                );

                if self.dry_run {
                    info!("[DRY RUN] Would select: {}", chosen.title);
                    return Verdict::silent(Decision::deferred(format!(
                        "[DRY RUN] Would select: {}",
                        chosen.title
                    )));
                }

                Verdict {
                    decision: Decision::override_with(chosen.guid.clone(), reason.clone()),
                    notification: Some(NotificationIntent {
                        title: format!("AI Override: {}", request.media_title),
                        message: format!(
                            "Profile: {}\nRelease: {}\nSize: {} GB\nReason: {}",
                            request.profile_name,
                            chosen.title,
                            format_size_gb(chosen.size),
                            reason
                        ),
                        priority: NotifyPriority::Default,
                        tags: vec![request.service.notification_tag().to_string()],
                    }),
                }
            }
        }
    }
}

use deskpilot_core::transcript::{ContentBlock, Transcript, Turn};
use deskpilot_core::types::SessionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    AwaitingInitialPrompt,
    AwaitingModelResponse,
    DispatchingActions,
    Terminated,
}

impl SessionState {
    // A stable string label for logs and progress hooks.
    pub fn label(self) -> &'static str {
        match self {
            SessionState::AwaitingInitialPrompt => "awaiting_initial_prompt",
            SessionState::AwaitingModelResponse => "awaiting_model_response",
            SessionState::DispatchingActions => "dispatching_actions",
            SessionState::Terminated => "terminated",
        }
    }
}

/// Errors that end a session. Action-level failures never show up here; they
/// are handed back to the model as tool results.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    #[error("model collaborator failed: {0}")]
    ModelCollaborator(String),

    #[error("initial screenshot failed: {0}")]
    InitialCapture(String),

    #[error("session interrupted by user")]
    UserInterrupt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The model replied without requesting any action.
    Completed,
    Failed(SessionError),
    Interrupted,
    TurnLimitReached { limit: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub model_turns: u32,
    pub actions_dispatched: u32,
    pub action_failures: u32,
}

impl SessionStats {
    pub(crate) fn record_batch(&mut self, results: &Turn) {
        for block in &results.content {
            if let ContentBlock::ToolResult { is_error, .. } = block {
                self.actions_dispatched += 1;
                if *is_error {
                    self.action_failures += 1;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: SessionId,
    pub outcome: SessionOutcome,
    pub stats: SessionStats,

    // Most recent non-empty assistant text, if any.
    pub final_text: Option<String>,
    pub transcript: Transcript,
    pub elapsed_ms: u64,
}

impl SessionReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == SessionOutcome::Completed
    }

    /// Turns fatal outcomes into errors. A turn-limit stop is not an error.
    pub fn into_result(self) -> Result<SessionReport, SessionError> {
        match &self.outcome {
            SessionOutcome::Failed(e) => Err(e.clone()),
            SessionOutcome::Interrupted => Err(SessionError::UserInterrupt),
            SessionOutcome::Completed | SessionOutcome::TurnLimitReached { .. } => Ok(self),
        }
    }
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

use crate::action::ActionKind;
use thiserror::Error;

/// Why a requested action was refused before any side effect happened.
///
/// `Validation` and `MalformedInput` are both argument-shape problems;
/// `Unsupported` means the action kind itself is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{kind}: {field} {reason}")]
    Validation {
        kind: ActionKind,
        field: &'static str,
        reason: String,
    },

    #[error("unsupported action {kind:?}")]
    Unsupported { kind: String },

    #[error("malformed tool input: {0}")]
    MalformedInput(String),
}

impl ActionError {
    pub(crate) fn required(kind: ActionKind, field: &'static str) -> Self {
        ActionError::Validation {
            kind,
            field,
            reason: "is required".into(),
        }
    }

    pub(crate) fn not_accepted(kind: ActionKind, field: &'static str) -> Self {
        ActionError::Validation {
            kind,
            field,
            reason: "is not accepted".into(),
        }
    }

    pub(crate) fn invalid(kind: ActionKind, field: &'static str, reason: String) -> Self {
        ActionError::Validation { kind, field, reason }
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ActionError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            ActionError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot combine two tool results that both carry an image")]
    ConflictingImage,
}

use crate::error::MergeError;
use serde::{Deserialize, Serialize};

/// Outcome of executing one action.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: Option<String>,
    pub error: Option<String>,
    /// PNG bytes.
    pub image: Option<Vec<u8>>,
}

impl std::fmt::Debug for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolResult")
            .field("output", &self.output)
            .field("error", &self.error)
            .field("image", &self.image.as_ref().map(|b| format!("png({} bytes)", b.len())))
            .finish()
    }
}

impl ToolResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn image(png: Vec<u8>) -> Self {
        Self {
            image: Some(png),
            ..Self::default()
        }
    }

    /// True when no field carries anything worth sending back.
    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.error.is_none() && self.image.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Combines two results.
    ///
    /// Precedence per field:
    /// - `output`, `error`: both present -> `self` followed by `other`; else whichever is present.
    /// - `image`: both present -> [`MergeError::ConflictingImage`]; else whichever is present.
    pub fn merge(self, other: ToolResult) -> Result<ToolResult, MergeError> {
        let image = match (self.image, other.image) {
            (Some(_), Some(_)) => return Err(MergeError::ConflictingImage),
            (a, b) => a.or(b),
        };

        Ok(ToolResult {
            output: concat(self.output, other.output),
            error: concat(self.error, other.error),
            image,
        })
    }
}

fn concat(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(mut a), Some(b)) => {
            a.push_str(&b);
            Some(a)
        }
        (a, b) => a.or(b),
    }
}

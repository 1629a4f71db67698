use anyhow::{Context, anyhow};
use deskpilot_core::transcript::{ContentBlock, Turn};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    content: Option<Vec<ResponseBlock>>,
    error: Option<ApiError>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default = "empty_input")]
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

fn empty_input() -> Value {
    Value::Object(Default::default())
}

/// Decodes a Messages API response body into an assistant turn.
///
/// Block types other than text and tool use are dropped.
pub fn parse_messages_response(body: &[u8]) -> anyhow::Result<Turn> {
    let resp: MessagesResponse =
        serde_json::from_slice(body).context("decode Messages API JSON")?;

    if resp.kind.as_deref() == Some("error") || resp.error.is_some() {
        let (kind, message) = resp
            .error
            .map(|e| (e.kind, e.message))
            .unwrap_or_else(|| ("unknown".into(), "no error details".into()));
        return Err(anyhow!("Messages API error ({kind}): {message}"));
    }

    let blocks = resp
        .content
        .ok_or_else(|| anyhow!("no content in Messages API response"))?;
    if let Some(reason) = resp.stop_reason.as_deref() {
        log::debug!("model stop_reason={reason}");
    }

    let content = blocks
        .into_iter()
        .filter_map(|b| match b {
            ResponseBlock::Text { text } => Some(ContentBlock::text(text)),
            ResponseBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::tool_use(id, name, input))
            }
            ResponseBlock::Unknown => None,
        })
        .collect();

    Ok(Turn::assistant(content))
}

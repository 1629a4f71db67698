use base64::Engine;
use deskpilot_core::config::DisplaySize;
use deskpilot_core::transcript::{ContentBlock, Role, ToolResultContent, Transcript, Turn};
use serde_json::{Value, json};

/// Anthropic's computer tool, in the revision the display fields below belong to.
pub const COMPUTER_TOOL_TYPE: &str = "computer_20241022";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesConfig {
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerTool<'a> {
    pub name: &'a str,
    pub display: DisplaySize,
}

impl ComputerTool<'_> {
    pub fn definition(&self) -> Value {
        json!({
            "type": COMPUTER_TOOL_TYPE,
            "name": self.name,
            "display_width_px": self.display.width_px,
            "display_height_px": self.display.height_px,
            "display_number": 0,
        })
    }
}

/// Builds the JSON body of a Messages API call for the whole transcript.
pub fn build_messages_payload(
    cfg: &MessagesConfig,
    system: &str,
    tool: ComputerTool<'_>,
    transcript: &Transcript,
) -> Value {
    json!({
        "model": cfg.model,
        "max_tokens": cfg.max_tokens,
        "system": system,
        "tools": [tool.definition()],
        "messages": transcript.turns().iter().map(encode_turn).collect::<Vec<_>>(),
    })
}

pub fn encode_turn(turn: &Turn) -> Value {
    let role = match turn.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    json!({
        "role": role,
        "content": turn.content.iter().map(encode_block).collect::<Vec<_>>(),
    })
}

pub fn encode_block(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({"type": "text", "text": text}),
        ContentBlock::Image { png } => png_block(&png.0),
        ContentBlock::ToolUse { id, name, input } => json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let parts: Vec<Value> = content
                .iter()
                .map(|part| match part {
                    ToolResultContent::Text { text } => json!({"type": "text", "text": text}),
                    ToolResultContent::Image { png } => png_block(&png.0),
                })
                .collect();

            let mut out = json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": parts,
            });
            if *is_error {
                out["is_error"] = Value::Bool(true);
            }
            out
        }
    }
}

fn png_block(png: &[u8]) -> Value {
    json!({
        "type": "image",
        "source": {
            "type": "base64",
            "media_type": "image/png",
            "data": base64::engine::general_purpose::STANDARD.encode(png),
        }
    })
}

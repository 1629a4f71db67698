use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_TOOL_NAME: &str = "computer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width_px: 1280,
            height_px: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub model: String,
    pub max_tokens: u32,

    // Advertised to the model as the single computer tool.
    pub tool_name: String,
    pub display: DisplaySize,

    /// Pause after each input-injection action so the OS can catch up. 0 disables it.
    pub settle_delay_ms: u64,

    /// Attach a fresh screenshot to every successful input action.
    pub screenshot_after_action: bool,

    /// Upper bound on model calls per session; `None` runs until the model stops.
    pub max_turns: Option<u32>,

    /// Overrides the built-in system prompt.
    pub system_prompt: Option<String>,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: 4096,
            tool_name: DEFAULT_TOOL_NAME.into(),
            display: DisplaySize::default(),
            settle_delay_ms: 100,
            screenshot_after_action: false,
            max_turns: None,
            system_prompt: None,
        }
    }
}

impl PilotConfig {
    pub fn resolved_system_prompt(&self) -> String {
        match &self.system_prompt {
            Some(p) if !p.trim().is_empty() => p.clone(),
            _ => crate::prompt::default_system_prompt(std::env::consts::OS),
        }
    }
}

use async_trait::async_trait;
use deskpilot_core::config::DisplaySize;
use deskpilot_core::transcript::{Transcript, Turn};

/// Everything the model collaborator sees for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub tool_name: &'a str,
    pub display: DisplaySize,
    pub transcript: &'a Transcript,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns one assistant turn. Transport, auth and retries live behind this call.
    async fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<Turn>;
}

/// OS input automation and screen capture.
///
/// There is exactly one pointer and one keyboard focus; callers issue one
/// primitive at a time.
#[async_trait]
pub trait Automation: Send + Sync {
    async fn move_to(&self, x: u32, y: u32) -> anyhow::Result<()>;
    async fn click(&self) -> anyhow::Result<()>;
    async fn drag_to(&self, x: u32, y: u32) -> anyhow::Result<()>;
    async fn write(&self, text: &str) -> anyhow::Result<()>;
    async fn press(&self, key: &str) -> anyhow::Result<()>;
    /// PNG-encoded capture of the current display.
    async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>>;
}

use crate::keys::KeyChord;
use anyhow::anyhow;
use deskpilot_engine::traits::Automation;
use std::sync::Mutex;

/// A single primitive issued to a [`RecordingAutomation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationEvent {
    MoveTo { x: u32, y: u32 },
    Click { x: u32, y: u32 },
    DragTo { from: (u32, u32), to: (u32, u32) },
    Write(String),
    Press(String),
    Capture,
}

/// 1x1 transparent PNG.
pub const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0xf8, 0x5f, 0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug, Default)]
struct Recorded {
    pointer: (u32, u32),
    events: Vec<AutomationEvent>,
}

/// Automation backend that touches nothing and logs every primitive.
///
/// Used for dry runs and tests. It tracks the pointer position so clicks and
/// drags record where they would have happened, and rejects key names the
/// desktop backend could not press.
#[derive(Debug)]
pub struct RecordingAutomation {
    screenshot: Vec<u8>,
    state: Mutex<Recorded>,
}

impl Default for RecordingAutomation {
    fn default() -> Self {
        Self::with_screenshot(BLANK_PNG.to_vec())
    }
}

impl RecordingAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screenshot(png: Vec<u8>) -> Self {
        Self {
            screenshot: png,
            state: Mutex::new(Recorded::default()),
        }
    }

    pub fn events(&self) -> Vec<AutomationEvent> {
        self.state
            .lock()
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }

    pub fn pointer(&self) -> (u32, u32) {
        self.state.lock().map(|s| s.pointer).unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut Recorded) -> AutomationEvent) -> anyhow::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("recording lock poisoned"))?;
        let event = f(&mut state);
        log::info!("[dry-run] {event:?}");
        state.events.push(event);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Automation for RecordingAutomation {
    async fn move_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
        self.record(|s| {
            s.pointer = (x, y);
            AutomationEvent::MoveTo { x, y }
        })
    }

    async fn click(&self) -> anyhow::Result<()> {
        self.record(|s| {
            let (x, y) = s.pointer;
            AutomationEvent::Click { x, y }
        })
    }

    async fn drag_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
        self.record(|s| {
            let from = s.pointer;
            s.pointer = (x, y);
            AutomationEvent::DragTo { from, to: (x, y) }
        })
    }

    async fn write(&self, text: &str) -> anyhow::Result<()> {
        self.record(|_| AutomationEvent::Write(text.to_string()))
    }

    async fn press(&self, key: &str) -> anyhow::Result<()> {
        key.parse::<KeyChord>()?;
        self.record(|_| AutomationEvent::Press(key.to_string()))
    }

    async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>> {
        self.record(|_| AutomationEvent::Capture)?;
        Ok(self.screenshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_pointer_across_primitives() {
        let a = RecordingAutomation::new();
        a.move_to(10, 20).await.unwrap();
        a.click().await.unwrap();
        a.drag_to(300, 40).await.unwrap();
        a.click().await.unwrap();

        assert_eq!(
            a.events(),
            vec![
                AutomationEvent::MoveTo { x: 10, y: 20 },
                AutomationEvent::Click { x: 10, y: 20 },
                AutomationEvent::DragTo {
                    from: (10, 20),
                    to: (300, 40)
                },
                AutomationEvent::Click { x: 300, y: 40 },
            ]
        );
        assert_eq!(a.pointer(), (300, 40));
    }

    #[tokio::test]
    async fn capture_returns_configured_png() {
        let a = RecordingAutomation::default();
        assert_eq!(a.capture_screenshot().await.unwrap(), BLANK_PNG);

        let a = RecordingAutomation::with_screenshot(vec![7, 7]);
        assert_eq!(a.capture_screenshot().await.unwrap(), vec![7, 7]);
        assert_eq!(a.events(), vec![AutomationEvent::Capture]);
    }

    #[tokio::test]
    async fn unknown_keys_are_rejected_without_recording() {
        let a = RecordingAutomation::new();
        a.press("ctrl+s").await.unwrap();
        assert!(a.press("hyper+x").await.is_err());
        a.press("ctrl+plus").await.unwrap();
        a.press("Insert").await.unwrap();
        a.write("hello").await.unwrap();

        assert_eq!(
            a.events(),
            vec![
                AutomationEvent::Press("ctrl+s".into()),
                AutomationEvent::Press("ctrl+plus".into()),
                AutomationEvent::Press("Insert".into()),
                AutomationEvent::Write("hello".into()),
            ]
        );
    }
}

use crate::traits::Automation;
use deskpilot_core::action::{Action, ActionArgs, ActionKind};
use deskpilot_core::config::PilotConfig;
use deskpilot_core::error::{ActionError, MergeError};
use deskpilot_core::result::ToolResult;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("{kind} failed: {source:#}")]
    Automation {
        kind: ActionKind,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Validates action requests and performs them through an [`Automation`] backend.
pub struct ActionExecutor {
    automation: Arc<dyn Automation>,
    settle_delay: Duration,
    screenshot_after_action: bool,
}

impl ActionExecutor {
    pub fn new(automation: Arc<dyn Automation>) -> Self {
        Self {
            automation,
            settle_delay: Duration::ZERO,
            screenshot_after_action: false,
        }
    }

    pub fn from_config(cfg: &PilotConfig, automation: Arc<dyn Automation>) -> Self {
        Self::new(automation)
            .with_settle_delay(Duration::from_millis(cfg.settle_delay_ms))
            .with_screenshot_after_action(cfg.screenshot_after_action)
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_screenshot_after_action(mut self, enabled: bool) -> Self {
        self.screenshot_after_action = enabled;
        self
    }

    /// Validates `args` and, only if they are valid, performs the action.
    pub async fn execute(&self, args: &ActionArgs) -> Result<ToolResult, ExecuteError> {
        let action = Action::from_args(args)?;
        self.perform(&action).await
    }

    pub async fn perform(&self, action: &Action) -> Result<ToolResult, ExecuteError> {
        let kind = action.kind();
        log::info!("action: {action}");

        let result = match action {
            Action::Move { coordinate } => {
                self.automation
                    .move_to(coordinate.x, coordinate.y)
                    .await
                    .map_err(|e| automation_failed(kind, e))?;
                ToolResult::empty()
            }
            Action::Click => {
                self.automation
                    .click()
                    .await
                    .map_err(|e| automation_failed(kind, e))?;
                ToolResult::empty()
            }
            Action::Drag { coordinate } => {
                self.automation
                    .drag_to(coordinate.x, coordinate.y)
                    .await
                    .map_err(|e| automation_failed(kind, e))?;
                ToolResult::empty()
            }
            Action::TypeText { text } => {
                self.automation
                    .write(text)
                    .await
                    .map_err(|e| automation_failed(kind, e))?;
                ToolResult::empty()
            }
            Action::KeyPress { key } => {
                self.automation
                    .press(key)
                    .await
                    .map_err(|e| automation_failed(kind, e))?;
                ToolResult::empty()
            }
            Action::Screenshot => ToolResult::image(self.capture(kind).await?),
        };

        if !kind.injects_input() {
            return Ok(result);
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        if !self.screenshot_after_action {
            return Ok(result);
        }
        // The action already happened; a failed capture is reported, not raised.
        let follow_up = match self.automation.capture_screenshot().await {
            Ok(png) => ToolResult::image(png),
            Err(e) => {
                log::warn!("screenshot after {kind} failed: {e:#}");
                ToolResult::error(format!(
                    "{kind} succeeded, but the follow-up screenshot failed: {e:#}"
                ))
            }
        };
        Ok(result.merge(follow_up)?)
    }

    /// Captures the display through the same path as a `screenshot` action.
    pub async fn screenshot(&self) -> Result<Vec<u8>, ExecuteError> {
        self.capture(ActionKind::Screenshot).await
    }

    async fn capture(&self, kind: ActionKind) -> Result<Vec<u8>, ExecuteError> {
        let png = self
            .automation
            .capture_screenshot()
            .await
            .map_err(|e| automation_failed(kind, e))?;
        log::debug!("captured screenshot: {} bytes", png.len());
        Ok(png)
    }
}

fn automation_failed(kind: ActionKind, source: anyhow::Error) -> ExecuteError {
    ExecuteError::Automation { kind, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAutomation {
        calls: Mutex<Vec<String>>,
        fail_clicks: bool,
        fail_captures: bool,
    }

    impl FakeAutomation {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Automation for FakeAutomation {
        async fn move_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
            self.record(format!("move_to({x},{y})"));
            Ok(())
        }

        async fn click(&self) -> anyhow::Result<()> {
            if self.fail_clicks {
                anyhow::bail!("no display");
            }
            self.record("click".into());
            Ok(())
        }

        async fn drag_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
            self.record(format!("drag_to({x},{y})"));
            Ok(())
        }

        async fn write(&self, text: &str) -> anyhow::Result<()> {
            self.record(format!("write({text})"));
            Ok(())
        }

        async fn press(&self, key: &str) -> anyhow::Result<()> {
            self.record(format!("press({key})"));
            Ok(())
        }

        async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>> {
            if self.fail_captures {
                anyhow::bail!("display went away");
            }
            self.record("screenshot".into());
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    fn executor() -> (Arc<FakeAutomation>, ActionExecutor) {
        let automation = Arc::new(FakeAutomation::default());
        (automation.clone(), ActionExecutor::new(automation))
    }

    #[tokio::test]
    async fn input_actions_return_empty_results() {
        let (automation, exec) = executor();

        let cases = [
            ActionArgs::new("move").with_coordinate(json!([10, 20])),
            ActionArgs::new("left_click"),
            ActionArgs::new("drag").with_coordinate(json!([30, 40])),
            ActionArgs::new("type").with_text("hello"),
            ActionArgs::new("key").with_text("Tab"),
        ];
        for args in &cases {
            let result = exec.execute(args).await.unwrap();
            assert!(result.is_empty(), "{args:?} produced {result:?}");
        }

        assert_eq!(
            automation.calls(),
            vec![
                "move_to(10,20)",
                "click",
                "drag_to(30,40)",
                "write(hello)",
                "press(Tab)"
            ]
        );
    }

    #[tokio::test]
    async fn screenshot_result_carries_only_an_image() {
        let (_, exec) = executor();
        let result = exec.execute(&ActionArgs::new("screenshot")).await.unwrap();
        assert!(!result.is_empty());
        assert_eq!(result.image.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
        assert_eq!(result.output, None);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn return_variants_inject_the_same_key() {
        let (automation, exec) = executor();
        for name in ["Return", "RETURN", "return", "Enter"] {
            exec.execute(&ActionArgs::new("key_press").with_text(name))
                .await
                .unwrap();
        }
        assert_eq!(
            automation.calls(),
            vec!["press(enter)", "press(enter)", "press(enter)", "press(Enter)"]
        );
    }

    #[tokio::test]
    async fn invalid_requests_have_no_side_effects() {
        let (automation, exec) = executor();

        let invalid = [
            ActionArgs::new("move").with_coordinate(json!([-1, 5])),
            ActionArgs::new("drag").with_coordinate(json!([1.5, 5])),
            ActionArgs::new("type_text")
                .with_text("x")
                .with_coordinate(json!([1, 1])),
            ActionArgs::new("click").with_coordinate(json!([1, 1])),
            ActionArgs::new("scroll"),
        ];
        for args in &invalid {
            let err = exec.execute(args).await.unwrap_err();
            assert!(matches!(err, ExecuteError::Action(_)), "{err}");
        }
        assert!(automation.calls().is_empty());
    }

    #[tokio::test]
    async fn automation_failures_name_the_action() {
        let automation = Arc::new(FakeAutomation {
            fail_clicks: true,
            ..FakeAutomation::default()
        });
        let exec = ActionExecutor::new(automation);
        let err = exec.execute(&ActionArgs::new("click")).await.unwrap_err();
        assert_eq!(err.to_string(), "click failed: no display");
    }

    #[tokio::test]
    async fn screenshot_after_action_attaches_image() {
        let automation = Arc::new(FakeAutomation::default());
        let exec = ActionExecutor::new(automation.clone()).with_screenshot_after_action(true);

        let result = exec
            .execute(&ActionArgs::new("move").with_coordinate(json!([5, 5])))
            .await
            .unwrap();
        assert!(result.image.is_some());
        assert_eq!(automation.calls(), vec!["move_to(5,5)", "screenshot"]);

        // A screenshot action is not followed by a second capture.
        let result = exec.execute(&ActionArgs::new("screenshot")).await.unwrap();
        assert!(result.image.is_some());
        assert_eq!(automation.calls().len(), 3);
    }

    #[tokio::test]
    async fn failed_follow_up_capture_keeps_the_action_result() {
        let automation = Arc::new(FakeAutomation {
            fail_captures: true,
            ..FakeAutomation::default()
        });
        let exec = ActionExecutor::new(automation.clone()).with_screenshot_after_action(true);

        let result = exec
            .execute(&ActionArgs::new("move").with_coordinate(json!([5, 5])))
            .await
            .unwrap();
        assert_eq!(automation.calls(), vec!["move_to(5,5)"]);
        assert!(result.image.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("move succeeded, but the follow-up screenshot failed: display went away")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_follows_input_actions_only() {
        let (_, exec) = executor();
        let exec = exec.with_settle_delay(Duration::from_millis(250));

        let t0 = tokio::time::Instant::now();
        exec.execute(&ActionArgs::new("click")).await.unwrap();
        assert!(t0.elapsed() >= Duration::from_millis(250));

        let t1 = tokio::time::Instant::now();
        exec.execute(&ActionArgs::new("screenshot")).await.unwrap();
        assert!(t1.elapsed() < Duration::from_millis(250));
    }
}

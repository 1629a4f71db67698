use std::sync::Arc;

use deskpilot_core::config::PilotConfig;
use deskpilot_engine::driver::ConversationDriver;
use deskpilot_engine::traits::{Automation, ModelClient};
use deskpilot_providers::anthropic::MessagesConfig;

use crate::scripted::ScriptedModel;

pub fn messages_config(cfg: &PilotConfig) -> MessagesConfig {
    MessagesConfig {
        model: cfg.model.clone(),
        max_tokens: cfg.max_tokens,
    }
}

/// Build a runnable driver from config, a script of model responses and an
/// automation backend.
pub fn build_driver_from_config(
    cfg: PilotConfig,
    script: &std::path::Path,
    automation: Arc<dyn Automation>,
) -> anyhow::Result<ConversationDriver> {
    let model: Arc<dyn ModelClient> =
        Arc::new(ScriptedModel::from_file(messages_config(&cfg), script)?);
    Ok(ConversationDriver::new(cfg, model, automation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskpilot_engine::session::SessionOutcome;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingAutomation {
        captures: Mutex<u32>,
    }

    #[async_trait]
    impl Automation for CountingAutomation {
        async fn move_to(&self, _x: u32, _y: u32) -> anyhow::Result<()> {
            Ok(())
        }
        async fn click(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn drag_to(&self, _x: u32, _y: u32) -> anyhow::Result<()> {
            Ok(())
        }
        async fn write(&self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn press(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>> {
            *self.captures.lock().unwrap() += 1;
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    #[tokio::test]
    async fn scripted_session_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        std::fs::write(
            &script,
            br#"[
                {"content": [{"type": "tool_use", "id": "t1", "name": "computer",
                              "input": {"action": "screenshot"}}]},
                {"content": [{"type": "text", "text": "Calculator shows 5."}]}
            ]"#,
        )
        .unwrap();

        let automation = Arc::new(CountingAutomation::default());
        let cfg = PilotConfig {
            settle_delay_ms: 0,
            ..PilotConfig::default()
        };
        let driver = build_driver_from_config(cfg, &script, automation.clone()).unwrap();

        let report = driver.run("Add 2 and 3").await;
        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.final_text.as_deref(), Some("Calculator shows 5."));
        assert_eq!(report.stats.model_turns, 2);
        assert_eq!(report.stats.actions_dispatched, 1);
        assert_eq!(*automation.captures.lock().unwrap(), 2);
    }

    #[test]
    fn missing_script_fails_to_build() {
        let automation: Arc<dyn Automation> = Arc::new(CountingAutomation::default());
        let result = build_driver_from_config(
            PilotConfig::default(),
            std::path::Path::new("/nonexistent/script.json"),
            automation,
        );
        assert!(result.is_err());
    }
}

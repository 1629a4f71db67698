use anyhow::{Context, anyhow};
use async_trait::async_trait;
use deskpilot_core::transcript::Turn;
use deskpilot_engine::traits::{CompletionRequest, ModelClient};
use deskpilot_providers::anthropic::{ComputerTool, MessagesConfig, build_messages_payload};
use deskpilot_providers::parse::parse_messages_response;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// Replays canned Messages API response bodies.
///
/// Every request is still encoded with the real wire codec and kept, so a
/// run can be inspected afterwards.
#[derive(Debug)]
pub struct ScriptedModel {
    cfg: MessagesConfig,
    responses: Mutex<VecDeque<Vec<u8>>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedModel {
    pub fn new(cfg: MessagesConfig, responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            cfg,
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn from_values(cfg: MessagesConfig, responses: Vec<Value>) -> anyhow::Result<Self> {
        let bodies = responses
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()
            .context("encode scripted response")?;
        Ok(Self::new(cfg, bodies))
    }

    /// Loads a JSON array of response bodies.
    pub fn from_file(cfg: MessagesConfig, path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read script: {}", path.display()))?;
        let responses: Vec<Value> =
            serde_json::from_slice(&bytes).context("decode script JSON (expected an array)")?;
        log::info!("loaded {} scripted responses from {}", responses.len(), path.display());
        Self::from_values(cfg, responses)
    }

    /// Payloads of every request made so far.
    pub fn requests(&self) -> anyhow::Result<Vec<Value>> {
        let requests = self
            .requests
            .lock()
            .map_err(|_| anyhow!("scripted model lock poisoned"))?;
        Ok(requests.clone())
    }

    pub fn remaining(&self) -> anyhow::Result<usize> {
        let responses = self
            .responses
            .lock()
            .map_err(|_| anyhow!("scripted model lock poisoned"))?;
        Ok(responses.len())
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<Turn> {
        let payload = build_messages_payload(
            &self.cfg,
            request.system,
            ComputerTool {
                name: request.tool_name,
                display: request.display,
            },
            request.transcript,
        );
        {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| anyhow!("scripted model lock poisoned"))?;
            requests.push(payload);
            log::debug!(
                "scripted request #{}: {} messages",
                requests.len(),
                request.transcript.len()
            );
        }

        let body = self
            .responses
            .lock()
            .map_err(|_| anyhow!("scripted model lock poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted: no response left for this request"))?;

        parse_messages_response(&body)
    }
}

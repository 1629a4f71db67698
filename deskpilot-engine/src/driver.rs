use crate::executor::ActionExecutor;
use crate::session::{
    SessionError, SessionOutcome, SessionReport, SessionState, SessionStats, ms,
};
use crate::traits::{Automation, CompletionRequest, ModelClient};
use deskpilot_core::action::ActionArgs;
use deskpilot_core::config::PilotConfig;
use deskpilot_core::result::ToolResult;
use deskpilot_core::transcript::{ContentBlock, Role, Transcript, Turn};
use deskpilot_core::types::SessionId;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Runs one conversation: opening prompt, then model turn / action dispatch
/// until the model stops asking for actions.
pub struct ConversationDriver {
    cfg: PilotConfig,
    system_prompt: String,
    model: Arc<dyn ModelClient>,
    executor: ActionExecutor,
}

struct SessionRun {
    state: SessionState,
    transcript: Transcript,
    stats: SessionStats,
    final_text: Option<String>,
}

impl ConversationDriver {
    pub fn new(
        cfg: PilotConfig,
        model: Arc<dyn ModelClient>,
        automation: Arc<dyn Automation>,
    ) -> Self {
        let executor = ActionExecutor::from_config(&cfg, automation);
        Self::with_executor(cfg, model, executor)
    }

    pub fn with_executor(
        cfg: PilotConfig,
        model: Arc<dyn ModelClient>,
        executor: ActionExecutor,
    ) -> Self {
        let system_prompt = cfg.resolved_system_prompt();
        Self {
            cfg,
            system_prompt,
            model,
            executor,
        }
    }

    /// Runs a session to completion.
    pub async fn run(&self, instruction: &str) -> SessionReport {
        self.run_until(instruction, std::future::pending()).await
    }

    /// Same as `run`, but ends with [`SessionOutcome::Interrupted`] as soon as
    /// `interrupt` resolves.
    pub async fn run_until<I>(&self, instruction: &str, interrupt: I) -> SessionReport
    where
        I: Future<Output = ()>,
    {
        self.run_with_hook(instruction, interrupt, |_state| async {})
            .await
    }

    /// Same as `run_until`, but emits every state transition to `on_state`.
    ///
    /// The hook is intended for progress display and must be fast.
    pub async fn run_with_hook<I, F, Fut>(
        &self,
        instruction: &str,
        interrupt: I,
        on_state: F,
    ) -> SessionReport
    where
        I: Future<Output = ()>,
        F: Fn(SessionState) -> Fut,
        Fut: Future<Output = ()>,
    {
        let id = SessionId::new();
        let t0 = Instant::now();
        log::info!("session {id}: starting (model={})", self.cfg.model);

        let mut run = SessionRun {
            state: SessionState::AwaitingInitialPrompt,
            transcript: Transcript::new(),
            stats: SessionStats::default(),
            final_text: None,
        };

        let outcome = tokio::select! {
            outcome = self.drive(&mut run, instruction, &on_state) => outcome,
            () = interrupt => {
                log::warn!("session {id}: interrupted by user");
                SessionOutcome::Interrupted
            }
        };

        transition(&mut run.state, SessionState::Terminated, &on_state).await;
        match &outcome {
            SessionOutcome::Failed(e) => log::error!("session {id}: failed: {e}"),
            other => log::info!(
                "session {id}: {other:?} after {} model turns, {} actions",
                run.stats.model_turns,
                run.stats.actions_dispatched
            ),
        }

        SessionReport {
            id,
            outcome,
            stats: run.stats,
            final_text: run.final_text,
            transcript: run.transcript,
            elapsed_ms: ms(t0.elapsed()),
        }
    }

    async fn drive<F, Fut>(
        &self,
        run: &mut SessionRun,
        instruction: &str,
        on_state: &F,
    ) -> SessionOutcome
    where
        F: Fn(SessionState) -> Fut,
        Fut: Future<Output = ()>,
    {
        transition(&mut run.state, SessionState::AwaitingInitialPrompt, on_state).await;
        let opening = match self.opening_turn(instruction).await {
            Ok(turn) => turn,
            Err(e) => return SessionOutcome::Failed(e),
        };
        run.transcript.push(opening);

        loop {
            if let Some(limit) = self.cfg.max_turns {
                if run.stats.model_turns >= limit {
                    log::warn!("turn limit ({limit}) reached; stopping");
                    return SessionOutcome::TurnLimitReached { limit };
                }
            }

            transition(&mut run.state, SessionState::AwaitingModelResponse, on_state).await;
            let request = CompletionRequest {
                system: &self.system_prompt,
                tool_name: &self.cfg.tool_name,
                display: self.cfg.display,
                transcript: &run.transcript,
            };
            log::debug!("model request: {} turns", run.transcript.len());

            let reply = match self.model.complete(&request).await {
                Ok(turn) if turn.role == Role::Assistant => turn,
                Ok(_) => {
                    return SessionOutcome::Failed(SessionError::ModelCollaborator(
                        "model returned a non-assistant turn".into(),
                    ));
                }
                Err(e) => {
                    return SessionOutcome::Failed(SessionError::ModelCollaborator(format!(
                        "{e:#}"
                    )));
                }
            };
            run.stats.model_turns += 1;

            let reply = run.transcript.push(reply);
            let text = reply.text();
            if !text.is_empty() {
                log::info!("model: {text}");
                run.final_text = Some(text);
            }

            transition(&mut run.state, SessionState::DispatchingActions, on_state).await;
            match self.dispatch(reply).await {
                Some(results) => {
                    run.stats.record_batch(&results);
                    run.transcript.push(results);
                }
                None => return SessionOutcome::Completed,
            }
        }
    }

    async fn opening_turn(&self, instruction: &str) -> Result<Turn, SessionError> {
        let png = self
            .executor
            .screenshot()
            .await
            .map_err(|e| SessionError::InitialCapture(e.to_string()))?;

        Ok(Turn::user(vec![
            ContentBlock::text(instruction),
            ContentBlock::image(png),
        ]))
    }

    /// Executes every tool-use request in `reply`, in order, and collects one
    /// tool-result block per request into a user turn.
    ///
    /// Returns `None` when the reply contains no tool-use requests. A failing
    /// request becomes an error result; the rest of the batch still runs.
    pub async fn dispatch(&self, reply: &Turn) -> Option<Turn> {
        let mut results = Vec::new();

        for tool_use in reply.tool_uses() {
            log::info!("tool call {} ({}): {}", tool_use.id, tool_use.name, tool_use.input);

            let outcome = match ActionArgs::from_input(tool_use.input) {
                Ok(args) => self.executor.execute(&args).await,
                Err(e) => Err(e.into()),
            };
            let result = outcome.unwrap_or_else(|e| {
                log::warn!("tool call {} failed: {e}", tool_use.id);
                ToolResult::error(e.to_string())
            });

            results.push(ContentBlock::tool_result(tool_use.id, result));
        }

        if results.is_empty() {
            None
        } else {
            Some(Turn::user(results))
        }
    }
}

async fn transition<F, Fut>(state: &mut SessionState, next: SessionState, on_state: &F)
where
    F: Fn(SessionState) -> Fut,
    Fut: Future<Output = ()>,
{
    log::debug!("session state: {} -> {}", state.label(), next.label());
    *state = next;
    on_state(next).await;
}

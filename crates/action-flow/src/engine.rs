//! Step engine: the editing session around one script.
//!
//! Owns the steps being edited, plays them through an [`ActionExecutor`]
//! and saves the result to a [`ScriptStore`] under a rename-aware key.

use std::sync::Arc;

use action_primitives::{ActionExecutor, ExecCtx};
use element_picker::{step_element, Fingerprint, SelectionSet};
use page_adapter::PageAdapter;
use script_store::ScriptStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webminer_core_types::{Command, Script, Step, StepElement};

use crate::errors::FlowError;
use crate::status::{StatusBoard, StatusEvent};
use crate::types::*;

pub struct StepEngine {
    name: String,
    url: String,
    /// Name the script was last loaded or saved under
    original_name: Option<String>,
    steps: Vec<Step>,
    page: Arc<dyn PageAdapter>,
    executor: Arc<dyn ActionExecutor>,
    playback: PlaybackConfig,
    status: Arc<StatusBoard>,
    cancel: CancellationToken,
}

impl StepEngine {
    /// Session over an unsaved script.
    pub fn new(
        script: Script,
        page: Arc<dyn PageAdapter>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        let status = Arc::new(StatusBoard::new(script.steps.len()));
        Self {
            name: script.name,
            url: script.url,
            original_name: None,
            steps: script.steps,
            page,
            executor,
            playback: PlaybackConfig::default(),
            status,
            cancel: CancellationToken::new(),
        }
    }

    /// Session over a script loaded from a store under its current name.
    pub fn open_saved(
        script: Script,
        page: Arc<dyn PageAdapter>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        let original = script.name.clone();
        let mut engine = Self::new(script, page, executor);
        engine.original_name = Some(original);
        engine
    }

    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn playback(&self) -> PlaybackConfig {
        self.playback
    }

    /// Current state of the script being edited
    pub fn script(&self) -> Script {
        Script {
            name: self.name.clone(),
            url: self.url.clone(),
            steps: self.steps.clone(),
        }
    }

    pub fn status_board(&self) -> Arc<StatusBoard> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StatusEvent> {
        self.status.subscribe()
    }

    /// Token that stops resolution and playback in progress
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Trim and set the script name.
    pub fn set_name(&mut self, name: &str) -> Result<(), FlowError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FlowError::EmptyName);
        }
        self.name = trimmed.to_string();
        Ok(())
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Append a step. Returns its index.
    pub fn add_step(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.status.push();
        self.steps.len() - 1
    }

    pub fn get_step(&self, index: usize) -> Result<&Step, FlowError> {
        self.steps.get(index).ok_or(FlowError::StepOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut Step, FlowError> {
        let len = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(FlowError::StepOutOfRange { index, len })
    }

    pub fn update_step(&mut self, index: usize, step: Step) -> Result<(), FlowError> {
        *self.step_mut(index)? = step;
        Ok(())
    }

    /// Replace the element of a step with what `selection` synthesizes to.
    ///
    /// Element and selection change together; an empty selection leaves the
    /// step untouched.
    pub fn update_step_element(
        &mut self,
        index: usize,
        fingerprint: &Fingerprint,
        selection: SelectionSet,
    ) -> Result<&StepElement, FlowError> {
        self.get_step(index)?;
        let element = step_element(fingerprint, &selection).ok_or(FlowError::EmptySelection)?;
        debug!(index, element = %element.describe(), "Step element updated");

        let step = self.step_mut(index)?;
        step.selection = Some(selection);
        Ok(step.element.insert(element))
    }

    pub fn update_step_command(&mut self, index: usize, command: Command) -> Result<(), FlowError> {
        self.step_mut(index)?.command = Some(command);
        Ok(())
    }

    /// Remove a step; later steps move down by one.
    pub fn remove_step(&mut self, index: usize) -> Result<Step, FlowError> {
        self.get_step(index)?;
        self.status.remove(index);
        Ok(self.steps.remove(index))
    }

    /// Every step has an element and a command, and no input text is empty.
    pub fn can_execute(&self) -> bool {
        self.steps.iter().all(Step::is_executable)
    }

    /// Play one step and report its outcome.
    ///
    /// A failing step is a successful call: the failure is in the result
    /// and on the status board, which returns to idle after the configured
    /// display time unless the step is played again first.
    pub async fn play_step(&self, index: usize) -> Result<StepResult, FlowError> {
        let step = self.get_step(index)?;
        let result = StepResult::new(index);
        self.status.set(index, StepStatus::running());

        let ctx = ExecCtx::new(self.cancel.child_token());
        debug!(index, action_id = %ctx.action_id, "Playing step");
        let (result, status) = match self.executor.execute(self.page.as_ref(), &ctx, step).await {
            Ok(report) => (result.with_report(report), StepStatus::success()),
            Err(err) => {
                warn!(index, error = %err, "Step failed");
                (
                    result.with_error(err.to_string()),
                    StepStatus::error(err.to_string()),
                )
            }
        };

        if let Some(generation) = self.status.set(index, status) {
            self.schedule_reset(generation);
        }
        Ok(result.finish())
    }

    fn schedule_reset(&self, generation: u64) {
        let board = self.status.clone();
        let delay = self.playback.status_reset();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            board.reset_if_current(generation);
        });
    }

    /// Play every step in order.
    ///
    /// Steps never overlap, and each one is followed by the inter-step delay
    /// whether it succeeded or not. Only cancellation stops the run early.
    pub async fn play_all(&self) -> FlowResult {
        let mut flow = FlowResult::new(self.name.clone());
        info!(script = %self.name, steps = self.steps.len(), "Playing script");

        for index in 0..self.steps.len() {
            if self.cancel.is_cancelled() {
                flow.cancelled = true;
                break;
            }
            match self.play_step(index).await {
                Ok(result) => flow.step_results.push(result),
                Err(err) => warn!(index, error = %err, "Step skipped"),
            }
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    flow.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(self.playback.inter_step_delay()) => {}
            }
        }

        let flow = flow.finish();
        info!(
            script = %self.name,
            success = flow.success,
            failed = flow.failed_steps().count(),
            latency_ms = flow.latency_ms,
            "Script finished"
        );
        flow
    }

    /// Save the script, moving it if it was renamed since the last save.
    pub async fn save(&mut self, store: &dyn ScriptStore) -> Result<(), FlowError> {
        if let Some(index) = self.steps.iter().position(|step| !step.is_executable()) {
            return Err(FlowError::NotExecutable(format!(
                "step {} is incomplete",
                index + 1
            )));
        }
        self.set_name(&self.name.clone())?;

        store
            .save(self.script(), self.original_name.as_deref())
            .await?;
        info!(script = %self.name, previous = ?self.original_name, "Script saved");
        self.original_name = Some(self.name.clone());
        Ok(())
    }
}

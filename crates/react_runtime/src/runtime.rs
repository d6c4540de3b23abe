//! The reason-and-act loop.

use chrono::Local;
use log::{debug, info, warn};
use thiserror::Error;

use crate::client::{ChatMessage, InferenceClient};
use crate::protocol::{
    AgentStep, BUDGET_EXHAUSTED_MESSAGE, DEFAULT_MAX_ITERATIONS, OBSERVATION_LABEL, parse_response,
};
use crate::state::AgentState;
use crate::template::{RenderError, render_template};
use crate::tools::ToolRegistry;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("system prompt template is invalid: {0}")]
    Template(#[from] RenderError),

    #[error("inference request {iteration} failed: {message}")]
    Inference { iteration: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    FinalAnswer,
    /// Response had neither a terminal marker nor an action request.
    ImplicitAnswer,
    BudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: String,
    pub termination: Termination,
    /// Number of inference calls made.
    pub iterations: usize,
    pub transcript: Vec<ChatMessage>,
}

pub struct ReactRuntime<C: InferenceClient> {
    client: C,
    tools: ToolRegistry,
    prompt_template: String,
    tool_descriptions: Option<String>,
    max_iterations: usize,
}

impl<C: InferenceClient> ReactRuntime<C> {
    pub fn new(client: C, tools: ToolRegistry, prompt_template: impl Into<String>) -> Self {
        Self {
            client,
            tools,
            prompt_template: prompt_template.into(),
            tool_descriptions: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the text substituted for `{tool_descriptions}`.
    pub fn with_tool_descriptions(mut self, descriptions: impl Into<String>) -> Self {
        self.tool_descriptions = Some(descriptions.into());
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn system_prompt(&self) -> Result<String, RenderError> {
        let descriptions = self
            .tool_descriptions
            .clone()
            .unwrap_or_else(|| self.tools.descriptions());
        let today = Local::now().format("%Y-%m-%d").to_string();
        render_template(
            &self.prompt_template,
            &[("tool_descriptions", &descriptions), ("current_date", &today)],
        )
    }

    /// Run one task to completion. The caller decides when `state` is reset.
    pub async fn run(&self, task: &str, state: &mut AgentState) -> Result<RunReport, RuntimeError> {
        let mut transcript = vec![
            ChatMessage::system(self.system_prompt()?),
            ChatMessage::user(task),
        ];
        info!(
            "Starting agent run with model {} (budget {})",
            self.client.model(),
            self.max_iterations
        );

        for iteration in 1..=self.max_iterations {
            let text = self
                .client
                .complete(&transcript)
                .await
                .map_err(|e| RuntimeError::Inference {
                    iteration,
                    message: format!("{:#}", e),
                })?;

            match parse_response(&text) {
                AgentStep::Final(answer) => {
                    info!("Final answer after {} iteration(s)", iteration);
                    transcript.push(ChatMessage::assistant(text));
                    return Ok(RunReport {
                        answer,
                        termination: Termination::FinalAnswer,
                        iterations: iteration,
                        transcript,
                    });
                }
                AgentStep::Implicit(answer) => {
                    debug!("Iteration {}: no marker or action, treating as answer", iteration);
                    transcript.push(ChatMessage::assistant(text));
                    return Ok(RunReport {
                        answer,
                        termination: Termination::ImplicitAnswer,
                        iterations: iteration,
                        transcript,
                    });
                }
                AgentStep::Action { name, input } => {
                    debug!("Iteration {}: action {}", iteration, name);
                    let observation = self.tools.dispatch(&name, &input, state);
                    transcript.push(ChatMessage::assistant(text));
                    transcript.push(ChatMessage::user(format!(
                        "{} {}",
                        OBSERVATION_LABEL, observation
                    )));
                }
            }
        }

        warn!("Iteration budget of {} exhausted", self.max_iterations);
        Ok(RunReport {
            answer: BUDGET_EXHAUSTED_MESSAGE.to_string(),
            termination: Termination::BudgetExhausted,
            iterations: self.max_iterations,
            transcript,
        })
    }
}

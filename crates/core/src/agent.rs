mod builder;
mod error;
mod event;
mod function_calling;
mod react;
mod result;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::model_client::ModelClient;
use crate::tool::ToolRegistry;
pub use builder::{AgentBuilder, TOOLS_PLACEHOLDER};
pub use error::RunError;
pub use event::AgentEvent;
pub use result::{
    IterationRecord, NO_ANSWER_SENTINEL, RECORD_RESULT_LIMIT, RunResult,
    TOOL_CALLS_EXCEEDED_SENTINEL, truncate_chars,
};

/// Nudge sent when a reply contains neither an action nor an answer.
pub const NUDGE_MESSAGE: &str =
    "Provide an ACTION with a tool or an ANSWER with the final answer.";

pub(crate) type EventHandler = Arc<dyn Fn(&AgentEvent<'_>) + Send + Sync>;

/// How the agent exchanges tool calls with the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Tool calls are written as text markers and parsed from the reply.
    #[default]
    ReAct,
    /// Tool schemas are sent with the request and the model replies with
    /// structured tool calls.
    FunctionCalling,
}

/// An agent that solves tasks with a model and a set of tools.
///
/// The agent itself holds no per-task state: every call to
/// [`Agent::run`] starts a fresh conversation, so one agent can serve
/// several runs at the same time. Cloning is cheap.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model_client: ModelClient,
    tools: ToolRegistry,
    system_prompt: String,
    strategy: Strategy,
    max_iterations: usize,
    on_event: Option<EventHandler>,
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            tools,
            prompt_template,
            strategy,
            max_iterations,
            on_event,
        } = builder;

        let template = prompt_template.as_deref().unwrap_or(match strategy {
            Strategy::ReAct => include_str!("agent/prompts/react.md"),
            Strategy::FunctionCalling => {
                include_str!("agent/prompts/function_calling.md")
            }
        });
        let system_prompt = template.replace(TOOLS_PLACEHOLDER, &tools.describe());

        Self {
            inner: Arc::new(AgentInner {
                model_client,
                tools,
                system_prompt,
                strategy,
                max_iterations,
                on_event,
            }),
        }
    }

    /// Returns the system instructions every run starts with.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.inner.system_prompt
    }

    /// Returns the registered tools.
    #[inline]
    pub fn tools(&self) -> &ToolRegistry {
        &self.inner.tools
    }

    /// Returns the strategy used to exchange tool calls.
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.inner.strategy
    }

    /// Returns the iteration budget of a run.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.inner.max_iterations
    }

    /// Works on a task until the model answers or the budget runs out.
    #[inline]
    pub async fn run<S: Into<String>>(
        &self,
        task: S,
    ) -> Result<RunResult, RunError> {
        self.run_with_cancellation(task, CancellationToken::new())
            .await
    }

    /// Like [`Agent::run`], but stops with [`RunError::Cancelled`] as soon as
    /// `cancel` fires.
    pub async fn run_with_cancellation<S: Into<String>>(
        &self,
        task: S,
        cancel: CancellationToken,
    ) -> Result<RunResult, RunError> {
        let task = task.into();
        let run = Run {
            agent: &self.inner,
            cancel: &cancel,
        };
        let span = info_span!("agent run", strategy = ?self.inner.strategy);
        async move {
            run.emit(AgentEvent::TaskStarted { task: &task });
            match run.agent.strategy {
                Strategy::ReAct => react::run(&run, &task).await,
                Strategy::FunctionCalling => {
                    function_calling::run(&run, &task).await
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// The borrowed context of a single run.
struct Run<'a> {
    agent: &'a AgentInner,
    cancel: &'a CancellationToken,
}

impl Run<'_> {
    #[inline]
    fn emit(&self, event: AgentEvent<'_>) {
        if let Some(on_event) = &self.agent.on_event {
            on_event(&event);
        }
    }

    /// Waits for `fut` unless the run is cancelled first.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Result<F::Output, RunError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

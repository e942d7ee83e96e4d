use std::sync::Arc;
use std::time::Duration;

use react_loop_model::ModelProvider;

use super::{Agent, AgentEvent, Strategy};
use crate::model_client::ModelClient;
use crate::tool::{Tool, ToolRegistry};

/// Placeholder in a prompt template replaced by the tool descriptions.
pub const TOOLS_PLACEHOLDER: &str = "{{TOOLS}}";

const DEFAULT_MAX_ITERATIONS: usize = 10;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) tools: ToolRegistry,
    pub(crate) prompt_template: Option<String>,
    pub(crate) strategy: Strategy,
    pub(crate) max_iterations: usize,
    pub(crate) on_event: Option<super::EventHandler>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider, DEFAULT_REQUEST_TIMEOUT),
            tools: ToolRegistry::new(),
            prompt_template: None,
            strategy: Strategy::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            on_event: None,
        }
    }

    /// Registers a tool. A tool with the same name is replaced.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    /// Replaces the whole tool set.
    #[inline]
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Sets how tool calls are exchanged with the model.
    #[inline]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the iteration budget of a run. Defaults to 10.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the time limit of a single model request. Defaults to 60
    /// seconds.
    #[inline]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.model_client = self.model_client.with_timeout(timeout);
        self
    }

    /// Uses a custom system prompt. Every [`TOOLS_PLACEHOLDER`] in the
    /// template is replaced by the tool descriptions.
    #[inline]
    pub fn with_prompt_template<S: Into<String>>(mut self, template: S) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Attaches a callback to be invoked as a run makes progress.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}

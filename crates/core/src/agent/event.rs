/// Progress of a run, reported to the callback registered with
/// [`AgentBuilder::on_event`](crate::AgentBuilder::on_event).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentEvent<'a> {
    /// A run started working on a task.
    TaskStarted {
        /// The task text.
        task: &'a str,
    },
    /// A new model turn is about to be requested.
    IterationStarted {
        /// The 1-based iteration.
        index: usize,
    },
    /// The model replied.
    ModelResponse {
        /// The 1-based iteration.
        index: usize,
        /// The raw reply text.
        content: &'a str,
    },
    /// A tool is about to be called.
    Action {
        /// The 1-based iteration.
        index: usize,
        /// Name of the tool.
        tool: &'a str,
        /// The argument, as text.
        argument: &'a str,
    },
    /// A tool returned.
    Observation {
        /// The 1-based iteration.
        index: usize,
        /// Name of the tool.
        tool: &'a str,
        /// The complete tool result.
        output: &'a str,
    },
    /// The reply contained neither an answer nor an action.
    MissingAction {
        /// The 1-based iteration.
        index: usize,
    },
    /// The run finished with an answer.
    Answer {
        /// The 1-based iteration.
        index: usize,
        /// The final answer.
        answer: &'a str,
    },
    /// The run used up its iteration budget.
    Exhausted {
        /// The budget.
        iterations: usize,
    },
}

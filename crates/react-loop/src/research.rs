//! An agent specialized in multi-source research.
//!
//! [`ResearchAgent`] drives a text-protocol agent with an instruction
//! template that asks for a structured report, and keeps a log of which
//! queries were made and what they found.

use react_loop_core::{
    Agent, AgentBuilder, CancellationToken, IterationRecord, RunError,
    RunResult, Strategy,
};
use serde::Serialize;

/// Instruction template of the research agent.
pub const RESEARCH_PROMPT: &str = include_str!("research/prompt.md");

/// Iteration budget suggested for research runs.
pub const RESEARCH_MAX_ITERATIONS: usize = 8;

/// Completion budget suggested for research runs, which produce longer
/// answers than plain tasks.
pub const RESEARCH_MAX_TOKENS: u32 = 1500;

/// What a research run looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResearchLog {
    /// The argument of every tool call, in order.
    pub queries: Vec<String>,
    /// The (truncated) result of every tool call.
    pub findings: Vec<String>,
    /// Every tool call written as `tool(argument)`.
    pub sources: Vec<String>,
}

impl ResearchLog {
    fn from_actions(actions: &[IterationRecord]) -> Self {
        let mut log = Self::default();
        for record in actions {
            log.queries.push(record.argument.clone());
            log.findings.push(record.result.clone());
            log.sources.push(format!("{}({})", record.tool, record.argument));
        }
        log
    }
}

/// The outcome of [`ResearchAgent::research`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResearchReport {
    /// The researched topic.
    pub topic: String,
    /// The run result. On success, `answer` holds the report.
    #[serde(flatten)]
    pub result: RunResult,
    /// The lookups made during the run.
    pub research_log: ResearchLog,
}

/// An agent that researches topics and compares items.
///
/// Every call starts from a fresh conversation and a fresh research log.
#[derive(Clone)]
pub struct ResearchAgent {
    agent: Agent,
}

impl ResearchAgent {
    /// Builds a research agent from `builder`.
    ///
    /// The builder's model provider, tools, budget and callbacks are kept;
    /// the strategy and the instruction template are replaced.
    pub fn new(builder: AgentBuilder) -> Self {
        let agent = builder
            .with_strategy(Strategy::ReAct)
            .with_prompt_template(RESEARCH_PROMPT)
            .build();
        Self { agent }
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Researches a topic.
    #[inline]
    pub async fn research(&self, topic: &str) -> Result<ResearchReport, RunError> {
        self.research_with_cancellation(topic, CancellationToken::new())
            .await
    }

    /// Like [`ResearchAgent::research`], but stops as soon as `cancel`
    /// fires.
    pub async fn research_with_cancellation(
        &self,
        topic: &str,
        cancel: CancellationToken,
    ) -> Result<ResearchReport, RunError> {
        info!("researching {topic:?}");
        let task = format!("Research the following topic: {topic}");
        let result = self.agent.run_with_cancellation(task, cancel).await?;
        Ok(ResearchReport {
            topic: topic.to_owned(),
            research_log: ResearchLog::from_actions(&result.actions),
            result,
        })
    }

    /// Compares several items, optionally along the given criteria.
    #[inline]
    pub async fn compare<S: AsRef<str>>(
        &self,
        items: &[S],
        criteria: Option<&str>,
    ) -> Result<ResearchReport, RunError> {
        self.compare_with_cancellation(items, criteria, CancellationToken::new())
            .await
    }

    /// Like [`ResearchAgent::compare`], but stops as soon as `cancel` fires.
    pub async fn compare_with_cancellation<S: AsRef<str>>(
        &self,
        items: &[S],
        criteria: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<ResearchReport, RunError> {
        let topic = comparison_topic(items, criteria);
        self.research_with_cancellation(&topic, cancel).await
    }
}

fn comparison_topic<S: AsRef<str>>(items: &[S], criteria: Option<&str>) -> String {
    let items = items.iter().map(AsRef::as_ref).collect::<Vec<_>>();
    let mut topic = format!("Compare: {}", items.join(", "));
    if let Some(criteria) = criteria.map(str::trim).filter(|c| !c.is_empty()) {
        topic.push_str(". Criteria: ");
        topic.push_str(criteria);
    }
    topic
}

#[cfg(test)]
mod tests {
    use react_loop_core::NO_ANSWER_SENTINEL;
    use react_loop_model::{ModelMessage, Role};
    use react_loop_test_model::TestModelProvider;

    use super::*;
    use crate::tools::offline_registry;

    fn research_agent(provider: TestModelProvider) -> ResearchAgent {
        ResearchAgent::new(
            AgentBuilder::with_model_provider(provider)
                .with_tools(offline_registry())
                .with_max_iterations(RESEARCH_MAX_ITERATIONS),
        )
    }

    fn task_of(provider: &TestModelProvider, request_idx: usize) -> String {
        let requests = provider.recorded_requests();
        let message = requests[request_idx]
            .messages
            .iter()
            .find(|m| m.role() == Role::User)
            .cloned();
        match message {
            Some(ModelMessage::User(text)) => text,
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_research_collects_log() {
        let mut provider = TestModelProvider::default();
        provider.add_text_step(
            "THOUGHT: compute first\nACTION: calculator(\"2 ** 10\")",
        );
        provider.add_text_step(
            "THOUGHT: and the dates\nACTION: date_calculator(\"days until 2000-01-01\")",
        );
        provider.add_text_step("ANSWER:\n## Research results\n1024");

        let agent = research_agent(provider.clone());
        assert!(agent.agent().system_prompt().contains("## Research rules"));
        assert!(agent.agent().system_prompt().contains("calculator(expression)"));

        let report = agent.research("powers of two").await.unwrap();
        assert!(report.result.success);
        assert_eq!(report.result.iterations, 3);
        assert_eq!(report.result.answer, "## Research results\n1024");
        assert_eq!(
            report.research_log.queries,
            ["2 ** 10", "days until 2000-01-01"]
        );
        assert_eq!(report.research_log.findings[0], "1024.0");
        assert!(
            report.research_log.findings[1]
                .starts_with("The date has already passed")
        );
        assert_eq!(
            report.research_log.sources,
            ["calculator(2 ** 10)", "date_calculator(days until 2000-01-01)"]
        );
        assert_eq!(
            task_of(&provider, 0),
            "Research the following topic: powers of two"
        );
    }

    #[tokio::test]
    async fn test_log_is_fresh_per_call() {
        let mut provider = TestModelProvider::default();
        provider.add_text_step("ACTION: calculator(\"1 + 1\")");
        provider.add_text_step("ANSWER: 2");
        let agent = research_agent(provider);

        let first = agent.research("one").await.unwrap();
        let second = agent.research("two").await.unwrap();
        assert_eq!(first.research_log.queries, ["1 + 1"]);
        assert_eq!(second.research_log.queries, ["1 + 1"]);
        assert_eq!(second.topic, "two");
    }

    #[tokio::test]
    async fn test_compare_frames_the_task() {
        let mut provider = TestModelProvider::default();
        provider.add_text_step("ANSWER: both are fine");
        let agent = research_agent(provider.clone());

        let report = agent
            .compare(&["Rust", "Go"], Some("memory safety"))
            .await
            .unwrap();
        assert_eq!(report.topic, "Compare: Rust, Go. Criteria: memory safety");
        assert_eq!(
            task_of(&provider, 0),
            "Research the following topic: Compare: Rust, Go. Criteria: memory safety"
        );
    }

    #[tokio::test]
    async fn test_unfinished_research() {
        let mut provider = TestModelProvider::default();
        for _ in 0..2 {
            provider.add_text_step("THOUGHT: still thinking");
        }
        let agent = ResearchAgent::new(
            AgentBuilder::with_model_provider(provider)
                .with_tools(offline_registry())
                .with_max_iterations(2),
        );
        let report = agent.research("nothing").await.unwrap();
        assert!(!report.result.success);
        assert_eq!(report.result.answer, NO_ANSWER_SENTINEL);
        assert!(report.research_log.sources.is_empty());
    }

    #[test]
    fn test_comparison_topic() {
        assert_eq!(comparison_topic(&["a", "b"], None), "Compare: a, b");
        assert_eq!(comparison_topic(&["a"], Some("  ")), "Compare: a");
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = ResearchReport {
            topic: "t".to_owned(),
            result: RunResult {
                answer: "a".to_owned(),
                iterations: 1,
                actions: Vec::new(),
                success: true,
            },
            research_log: ResearchLog::default(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["answer"], "a");
        assert_eq!(value["research_log"]["queries"], serde_json::json!([]));
    }
}

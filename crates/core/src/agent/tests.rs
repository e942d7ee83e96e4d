use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use react_loop_model::{ErrorKind, ModelMessage, Role, ToolCallRequest};
use react_loop_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::tool::{Error, Tool, ToolResult};
use crate::{
    AgentBuilder, AgentEvent, NO_ANSWER_SENTINEL, NUDGE_MESSAGE, RunError,
    Strategy, TOOL_CALLS_EXCEEDED_SENTINEL,
};

static EXPRESSION_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": { "expression": { "type": "string" } },
        "required": ["expression"]
    })
});

static TEXT_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": { "text": { "type": "string" } },
        "required": ["text"]
    })
});

#[derive(Deserialize)]
struct CalculatorInput {
    expression: String,
}

struct Calculator;

impl Tool for Calculator {
    type Input = CalculatorInput;

    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluates an arithmetic expression"
    }

    fn parameter_names(&self) -> &[&str] {
        &["expression"]
    }

    fn parameter_schema(&self) -> &Value {
        &EXPRESSION_SCHEMA
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(
            react_loop_expr::evaluate(&input.expression)
                .map(react_loop_expr::format_number)
                .map_err(|err| {
                    Error::invalid_input().with_reason(err.to_string())
                }),
        )
    }
}

#[derive(Deserialize)]
struct TextInput {
    #[allow(dead_code)]
    text: String,
}

/// Returns a fixed, long text regardless of the input.
struct Verbose;

impl Tool for Verbose {
    type Input = TextInput;

    fn name(&self) -> &str {
        "verbose"
    }

    fn description(&self) -> &str {
        "Talks a lot"
    }

    fn parameter_names(&self) -> &[&str] {
        &["text"]
    }

    fn parameter_schema(&self) -> &Value {
        &TEXT_SCHEMA
    }

    fn execute(
        &self,
        _input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok("x".repeat(600)))
    }
}

/// Sleeps for a minute, then records that it finished.
#[derive(Default)]
struct Sleeper {
    finished: Arc<AtomicBool>,
}

impl Tool for Sleeper {
    type Input = TextInput;

    fn name(&self) -> &str {
        "sleeper"
    }

    fn description(&self) -> &str {
        "Takes its time"
    }

    fn parameter_names(&self) -> &[&str] {
        &["text"]
    }

    fn parameter_schema(&self) -> &Value {
        &TEXT_SCHEMA
    }

    fn execute(
        &self,
        _input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let finished = Arc::clone(&self.finished);
        async move {
            sleep(Duration::from_secs(60)).await;
            finished.store(true, Ordering::SeqCst);
            Ok("rested".to_owned())
        }
    }
}

fn text_model(steps: &[&str]) -> TestModelProvider {
    let mut provider = TestModelProvider::default();
    for step in steps {
        provider.add_text_step(*step);
    }
    provider
}

fn last_message(provider: &TestModelProvider, request_idx: usize) -> ModelMessage {
    let requests = provider.recorded_requests();
    requests[request_idx]
        .messages
        .last()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_react_end_to_end() {
    let provider = text_model(&[
        "THOUGHT: I need to compute this.\nACTION: calculator(\"23*17+156\")",
        "THOUGHT: I have the result.\nANSWER: 547",
    ]);
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .build();

    let result = agent.run("What is 23 * 17 + 156?").await.unwrap();
    assert!(result.success);
    assert_eq!(result.answer, "547");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.actions.len(), 1);
    assert_eq!(result.actions[0].index, 1);
    assert_eq!(result.actions[0].tool, "calculator");
    assert_eq!(result.actions[0].argument, "23*17+156");
    assert_eq!(result.actions[0].result, "547.0");

    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 2);
    let first = &requests[0];
    assert_eq!(first.messages.len(), 2);
    assert_eq!(first.messages[0].role(), Role::System);
    assert!(first.messages[0].content().contains(
        "calculator(expression): Evaluates an arithmetic expression"
    ));
    assert!(!first.messages[0].content().contains("{{TOOLS}}"));
    assert_eq!(first.messages[1].content(), "What is 23 * 17 + 156?");
    assert!(first.tools.is_empty());
    assert_eq!(
        last_message(&provider, 1),
        ModelMessage::User("OBSERVATION: 547.0".to_owned())
    );
}

#[tokio::test]
async fn test_react_exhaustion() {
    let provider = text_model(&[
        "THOUGHT: hmm",
        "THOUGHT: still thinking",
        "THOUGHT: almost",
    ]);
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .with_max_iterations(3)
        .build();

    let result = agent.run("Think forever").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.answer, NO_ANSWER_SENTINEL);
    assert_eq!(result.iterations, 3);
    assert!(result.actions.is_empty());

    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        last_message(&provider, 2),
        ModelMessage::User(NUDGE_MESSAGE.to_owned())
    );
    assert_eq!(requests[2].messages.len(), 6);
}

#[tokio::test]
async fn test_answer_takes_precedence_over_action() {
    let provider = text_model(&[
        "ACTION: calculator(\"1 + 1\")\nANSWER: 2",
    ]);
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(Calculator)
        .build();

    let result = agent.run("1 + 1?").await.unwrap();
    assert!(result.success);
    assert_eq!(result.answer, "2");
    assert_eq!(result.iterations, 1);
    assert!(result.actions.is_empty());
}

#[tokio::test]
async fn test_unknown_tool_becomes_observation() {
    let provider = text_model(&[
        "ACTION: search(\"rust\")",
        "ACTION: calculator(\"1 / 0\")",
        "ANSWER: gave up",
    ]);
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .build();

    let result = agent.run("Search something").await.unwrap();
    assert!(result.success);
    assert_eq!(result.actions.len(), 2);
    assert_eq!(
        result.actions[0].result,
        "Tool 'search' not found. Available: calculator"
    );
    assert_eq!(result.actions[1].result, "Error: division by zero");
    assert_eq!(
        last_message(&provider, 1).content(),
        "OBSERVATION: Tool 'search' not found. Available: calculator"
    );
}

#[tokio::test]
async fn test_truncation_keeps_full_transcript() {
    let provider = text_model(&["ACTION: verbose(\"go\")", "ANSWER: done"]);
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Verbose)
        .build();

    let result = agent.run("Talk").await.unwrap();
    assert_eq!(result.actions[0].result.len(), 500);
    let observation = last_message(&provider, 1);
    assert_eq!(
        observation.content(),
        format!("OBSERVATION: {}", "x".repeat(600))
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_model_times_out() {
    let mut provider = text_model(&["ANSWER: too late"]);
    provider.set_delay(Duration::from_secs(90));
    let agent = AgentBuilder::with_model_provider(provider)
        .with_request_timeout(Duration::from_secs(30))
        .build();

    let err = agent.run("Hurry").await.unwrap_err();
    assert!(matches!(err, RunError::Timeout(d) if d == Duration::from_secs(30)));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation() {
    let mut provider = text_model(&["ANSWER: never seen"]);
    provider.set_delay(Duration::from_secs(30));
    let agent = AgentBuilder::with_model_provider(provider).build();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = agent
        .run_with_cancellation("Wait", token)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_tool_execution() {
    let provider = text_model(&["ACTION: sleeper(\"zzz\")", "ANSWER: never seen"]);
    let sleeper = Sleeper::default();
    let finished = Arc::clone(&sleeper.finished);
    let observed = Arc::new(Mutex::new(Vec::new()));
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(sleeper)
        .on_event({
            let observed = Arc::clone(&observed);
            move |event| {
                if let AgentEvent::Observation { output, .. } = event {
                    observed.lock().unwrap().push(output.to_string());
                }
            }
        })
        .build();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = agent
        .run_with_cancellation("Take a nap", token)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled));
    assert!(observed.lock().unwrap().is_empty());
    assert_eq!(provider.recorded_requests().len(), 1);

    // The tool task was aborted rather than left running.
    sleep(Duration::from_secs(120)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_provider_error() {
    let mut provider = TestModelProvider::default();
    provider.add_assistant_response_step(
        PresetResponse::with_text("unused").with_failures(0),
    );
    let agent = AgentBuilder::with_model_provider(provider).build();

    let err = agent.run("Anything").await.unwrap_err();
    assert_eq!(err.model_error_kind(), Some(ErrorKind::RateLimitExceeded));
}

#[tokio::test]
async fn test_events_follow_the_loop() {
    let provider = text_model(&[
        "THOUGHT: unsure",
        "ACTION: calculator(\"2 ** 10\")",
        "ANSWER: 1024",
    ]);
    let events = Arc::new(Mutex::new(Vec::new()));
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(Calculator)
        .on_event({
            let events = Arc::clone(&events);
            move |event| {
                let name = match event {
                    AgentEvent::TaskStarted { .. } => "task".to_owned(),
                    AgentEvent::IterationStarted { index } => format!("iter:{index}"),
                    AgentEvent::ModelResponse { .. } => "response".to_owned(),
                    AgentEvent::Action { tool, .. } => format!("action:{tool}"),
                    AgentEvent::Observation { output, .. } => {
                        format!("observation:{output}")
                    }
                    AgentEvent::MissingAction { .. } => "missing".to_owned(),
                    AgentEvent::Answer { answer, .. } => format!("answer:{answer}"),
                    AgentEvent::Exhausted { .. } => "exhausted".to_owned(),
                };
                events.lock().unwrap().push(name);
            }
        })
        .build();

    agent.run("2 ** 10").await.unwrap();
    assert_eq!(
        *events.lock().unwrap(),
        [
            "task",
            "iter:1",
            "response",
            "missing",
            "iter:2",
            "response",
            "action:calculator",
            "observation:1024.0",
            "iter:3",
            "response",
            "answer:1024",
        ]
    );
}

#[tokio::test]
async fn test_function_calling_binds_named_arguments() {
    let mut provider = TestModelProvider::default();
    provider.add_assistant_response_step(PresetResponse::with_events([
        PresetEvent::ToolCall(ToolCallRequest {
            id: "call_1".to_owned(),
            name: "calculator".to_owned(),
            arguments: json!({ "expression": "6 * 7" }),
        }),
    ]));
    provider.add_text_step("The answer is 42.");
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .with_strategy(Strategy::FunctionCalling)
        .build();

    let result = agent.run("What is 6 times 7?").await.unwrap();
    assert!(result.success);
    assert_eq!(result.answer, "The answer is 42.");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.actions.len(), 1);
    assert_eq!(result.actions[0].argument, r#"{"expression":"6 * 7"}"#);
    assert_eq!(result.actions[0].result, "42.0");

    let requests = provider.recorded_requests();
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "calculator");
    let second = &requests[1].messages;
    assert!(matches!(
        &second[2],
        ModelMessage::Assistant { tool_calls, .. } if tool_calls.len() == 1
    ));
    assert_eq!(second[3].role(), Role::Tool);
    assert_eq!(second[3].content(), "42.0");
}

#[tokio::test]
async fn test_function_calling_exceeds_rounds() {
    let mut provider = TestModelProvider::default();
    for idx in 0..2 {
        provider.add_assistant_response_step(PresetResponse::with_events([
            PresetEvent::ToolCall(ToolCallRequest {
                id: format!("call_{idx}"),
                name: "calculator".to_owned(),
                arguments: json!({ "wrong": "1" }),
            }),
        ]));
    }
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .with_strategy(Strategy::FunctionCalling)
        .with_max_iterations(2)
        .build();

    let result = agent.run("Loop").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.answer, TOOL_CALLS_EXCEEDED_SENTINEL);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.actions.len(), 2);
    assert!(result.actions[0].result.starts_with("Error: missing field `expression`"));
    assert_eq!(provider.recorded_requests().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_do_not_share_transcripts() {
    let provider = text_model(&["ACTION: calculator(\"1 + 2\")", "ANSWER: 3"]);
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(Calculator)
        .build();

    let tasks = ["first task", "second task", "third task"];
    let handles: Vec<_> = tasks
        .iter()
        .map(|task| {
            let agent = agent.clone();
            let task = task.to_string();
            tokio::spawn(async move { agent.run(task).await })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.actions.len(), 1);
    }

    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 6);
    for req in &requests {
        // Every transcript is one of the tasks plus at most its own turn.
        assert!(tasks.contains(&req.messages[1].content()));
        assert!(req.messages.len() == 2 || req.messages.len() == 4);
    }
}

//! The structured loop: tool schemas travel with the request and the model
//! replies with tool calls instead of text markers.

use super::{
    AgentEvent, IterationRecord, Run, RunError, RunResult,
    TOOL_CALLS_EXCEEDED_SENTINEL,
};
use crate::conversation::Conversation;

pub(super) async fn run(run: &Run<'_>, task: &str) -> Result<RunResult, RunError> {
    let agent = run.agent;
    let definitions = agent.tools.definitions();
    let mut conversation = Conversation::new(agent.system_prompt.as_str(), task);
    let mut actions = Vec::new();

    for index in 1..=agent.max_iterations {
        run.emit(AgentEvent::IterationStarted { index });
        let request = conversation.to_request(definitions.clone());
        let response = agent.model_client.send_request(request, run.cancel).await?;
        run.emit(AgentEvent::ModelResponse {
            index,
            content: &response.content,
        });

        if response.tool_calls.is_empty() {
            info!("answered after {index} iteration(s)");
            run.emit(AgentEvent::Answer {
                index,
                answer: &response.content,
            });
            return Ok(RunResult {
                answer: response.content,
                iterations: index,
                actions,
                success: true,
            });
        }

        let tool_calls = response.tool_calls;
        conversation.push_tool_calls(response.content, tool_calls.clone());
        for call in tool_calls {
            let argument = call.arguments.to_string();
            run.emit(AgentEvent::Action {
                index,
                tool: &call.name,
                argument: &argument,
            });
            let output = run
                .until_cancelled(
                    agent.tools.dispatch_named(&call.name, call.arguments),
                )
                .await?;
            run.emit(AgentEvent::Observation {
                index,
                tool: &call.name,
                output: &output,
            });
            actions.push(IterationRecord::new(index, &call.name, &argument, &output));
            conversation.push_tool_result(call.id, output);
        }
    }

    warn!("tool calls exceeded {} round(s)", agent.max_iterations);
    run.emit(AgentEvent::Exhausted {
        iterations: agent.max_iterations,
    });
    Ok(RunResult {
        answer: TOOL_CALLS_EXCEEDED_SENTINEL.to_owned(),
        iterations: agent.max_iterations,
        actions,
        success: false,
    })
}

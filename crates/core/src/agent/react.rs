//! The text-protocol loop: the model writes `ACTION:` and `ANSWER:` markers
//! and tool results are fed back as `OBSERVATION:` messages.

use super::{
    AgentEvent, IterationRecord, NO_ANSWER_SENTINEL, NUDGE_MESSAGE, Run,
    RunError, RunResult,
};
use crate::action::{OBSERVATION_MARKER, extract_answer, parse_action};
use crate::conversation::Conversation;

pub(super) async fn run(run: &Run<'_>, task: &str) -> Result<RunResult, RunError> {
    let agent = run.agent;
    let mut conversation = Conversation::new(agent.system_prompt.as_str(), task);
    let mut actions = Vec::new();

    for index in 1..=agent.max_iterations {
        run.emit(AgentEvent::IterationStarted { index });
        let request = conversation.to_request(vec![]);
        let response = agent.model_client.send_request(request, run.cancel).await?;
        let content = response.content;
        run.emit(AgentEvent::ModelResponse {
            index,
            content: &content,
        });

        if let Some(answer) = extract_answer(&content) {
            info!("answered after {index} iteration(s)");
            run.emit(AgentEvent::Answer {
                index,
                answer: &answer,
            });
            return Ok(RunResult {
                answer,
                iterations: index,
                actions,
                success: true,
            });
        }

        let Some(action) = parse_action(&content) else {
            debug!("no action found in iteration {index}");
            run.emit(AgentEvent::MissingAction { index });
            conversation.push_assistant(content);
            conversation.push_user(NUDGE_MESSAGE);
            continue;
        };

        run.emit(AgentEvent::Action {
            index,
            tool: &action.tool,
            argument: &action.argument,
        });
        let observation = run
            .until_cancelled(agent.tools.dispatch(&action.tool, &action.argument))
            .await?;
        run.emit(AgentEvent::Observation {
            index,
            tool: &action.tool,
            output: &observation,
        });

        actions.push(IterationRecord::new(
            index,
            &action.tool,
            &action.argument,
            &observation,
        ));
        conversation.push_assistant(content);
        conversation.push_user(format!("{OBSERVATION_MARKER} {observation}"));
    }

    warn!("no answer after {} iteration(s)", agent.max_iterations);
    run.emit(AgentEvent::Exhausted {
        iterations: agent.max_iterations,
    });
    Ok(RunResult {
        answer: NO_ANSWER_SENTINEL.to_owned(),
        iterations: agent.max_iterations,
        actions,
        success: false,
    })
}

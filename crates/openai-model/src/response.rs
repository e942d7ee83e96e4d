use react_loop_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::proto::{ChatCompletion, ToolCall};

/// Converts a decoded completion into the provider-neutral response.
pub fn into_model_response(
    mut completion: ChatCompletion,
) -> Result<ModelResponse, Error> {
    if completion.choices.is_empty() {
        return Err(Error::new(
            "response contains no choices",
            ErrorKind::InvalidResponse,
        ));
    }
    // Only one choice is ever requested.
    let choice = completion.choices.swap_remove(0);
    trace!(
        "completion {:?} finished with {:?}",
        completion.id, choice.finish_reason
    );

    let tool_calls: Vec<_> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(convert_tool_call)
        .collect();
    let finish_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") => Some(ModelFinishReason::ToolCalls),
        Some("length") => Some(ModelFinishReason::Length),
        Some(_) => Some(ModelFinishReason::Stop),
        None if !tool_calls.is_empty() => Some(ModelFinishReason::ToolCalls),
        None => None,
    };

    Ok(ModelResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason,
    })
}

fn convert_tool_call(tool_call: ToolCall) -> ToolCallRequest {
    let ToolCall { id, function, .. } = tool_call;
    let arguments = match serde_json::from_str::<Value>(&function.arguments) {
        Ok(arguments) => arguments,
        Err(err) => {
            // Let the tool reject the raw text instead of failing the run.
            warn!("tool call {id} has malformed arguments: {err}");
            Value::String(function.arguments)
        }
    };
    ToolCallRequest {
        id,
        name: function.name,
        arguments,
    }
}

//! Conversation-related types.

use react_loop_model::{ModelMessage, ModelRequest, ModelTool, ToolCallRequest, ToolCallResult};

/// The transcript of a single run.
///
/// A conversation always starts with the system instructions followed by
/// the task, and only grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Starts a conversation with the system instructions and the task.
    #[inline]
    pub fn new<S1: Into<String>, S2: Into<String>>(system: S1, task: S2) -> Self {
        Self {
            messages: vec![
                ModelMessage::System(system.into()),
                ModelMessage::User(task.into()),
            ],
        }
    }

    /// Appends a text-only assistant turn.
    #[inline]
    pub fn push_assistant<S: Into<String>>(&mut self, content: S) {
        self.messages.push(ModelMessage::assistant(content));
    }

    /// Appends an assistant turn that requested tool calls.
    #[inline]
    pub fn push_tool_calls<S: Into<String>>(
        &mut self,
        content: S,
        tool_calls: Vec<ToolCallRequest>,
    ) {
        self.messages.push(ModelMessage::Assistant {
            content: content.into(),
            tool_calls,
        });
    }

    /// Appends text on behalf of the user.
    #[inline]
    pub fn push_user<S: Into<String>>(&mut self, content: S) {
        self.messages.push(ModelMessage::User(content.into()));
    }

    /// Appends the result of a structured tool call.
    #[inline]
    pub fn push_tool_result<S1: Into<String>, S2: Into<String>>(
        &mut self,
        id: S1,
        content: S2,
    ) {
        self.messages.push(ModelMessage::Tool(ToolCallResult {
            id: id.into(),
            content: content.into(),
        }));
    }

    /// Returns the messages in order.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the conversation holds no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Builds a request over the whole transcript.
    #[inline]
    pub fn to_request(&self, tools: Vec<ModelTool>) -> ModelRequest {
        ModelRequest {
            messages: self.messages.clone(),
            tools,
        }
    }
}

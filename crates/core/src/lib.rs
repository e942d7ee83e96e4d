//! Core logic of the agent loop: tool registry, action parsing,
//! conversation state and the reasoning/acting cycle.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod action;
mod agent;
pub mod conversation;
mod model_client;
pub mod tool;

pub use action::{ActionRequest, extract_answer, parse_action};
pub use agent::{
    Agent, AgentBuilder, AgentEvent, IterationRecord, NO_ANSWER_SENTINEL,
    NUDGE_MESSAGE, RECORD_RESULT_LIMIT, RunError, RunResult, Strategy,
    TOOL_CALLS_EXCEEDED_SENTINEL, TOOLS_PLACEHOLDER, truncate_chars,
};
pub use tool::{Tool, ToolRegistry, ToolResult};
pub use tokio_util::sync::CancellationToken;

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use react_loop_model::ModelTool;
use serde_json::{Map, Value};
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;

use crate::tool::Tool;
use crate::tool::object::{ToolObject, ToolObjectImpl};

/// An ordered set of tools addressed by name.
///
/// Registering a tool whose name is already taken replaces the old tool but
/// keeps its position, so [`ToolRegistry::describe`] stays stable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register<T: Tool>(&mut self, tool: T) {
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        let name = tool.name().to_owned();
        match self.index.get(&name) {
            Some(&idx) => {
                debug!("replacing tool {name}");
                self.tools[idx] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns `true` if a tool with the given name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Renders one `name(param1, param2): description` line per tool.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|tool| {
                format!(
                    "{}({}): {}",
                    tool.name(),
                    tool.parameter_names().join(", "),
                    tool.description()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the tool definitions sent to models that support structured
    /// tool calls.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Calls a tool with a single free-text argument.
    ///
    /// The argument is bound to the first declared parameter of the tool.
    /// This never fails: an unknown tool, a rejected input, a tool error or
    /// a panic inside the tool all become a textual result that can be
    /// shown to the model.
    pub async fn dispatch(&self, name: &str, argument: &str) -> String {
        let Some(tool) = self.get(name) else {
            return self.not_found(name);
        };
        let mut arguments = Map::new();
        if let Some(first) = tool.parameter_names().first() {
            arguments.insert((*first).to_owned(), Value::from(argument));
        }
        run_tool(tool, Value::Object(arguments)).await
    }

    /// Calls a tool with arguments bound by parameter name.
    pub async fn dispatch_named(&self, name: &str, arguments: Value) -> String {
        let Some(tool) = self.get(name) else {
            return self.not_found(name);
        };
        run_tool(tool, arguments).await
    }

    #[inline]
    fn get(&self, name: &str) -> Option<Arc<dyn ToolObject>> {
        self.index.get(name).map(|&idx| Arc::clone(&self.tools[idx]))
    }

    fn not_found(&self, name: &str) -> String {
        warn!("tool not found: {name}");
        format!(
            "Tool '{name}' not found. Available: {}",
            self.names().join(", ")
        )
    }
}

impl Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

async fn run_tool(tool: Arc<dyn ToolObject>, arguments: Value) -> String {
    trace!("running tool {} with args: {arguments:?}", tool.name());
    // The task is aborted if the caller stops waiting for it.
    let handle = AbortOnDropHandle::new(tokio::spawn(tool.execute(arguments)));
    match handle.await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            debug!("tool {} failed: {}", tool.name(), err.reason());
            format!("Error: {}", err.reason())
        }
        Err(err) => {
            let reason = join_error_reason(err);
            error!("tool {} crashed: {reason}", tool.name());
            format!("Error: {reason}")
        }
    }
}

fn join_error_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return "tool task was cancelled".to_owned();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("tool panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("tool panicked: {msg}")
    } else {
        "tool panicked".to_owned()
    }
}

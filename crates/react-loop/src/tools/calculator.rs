use std::future::ready;

use react_loop_core::tool::{Error as ToolError, Tool, ToolResult};
use react_loop_expr::{
    EvalErrorKind, FUNCTION_NAMES, evaluate, format_number,
};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, JsonSchema)]
pub struct CalculatorParameters {
    #[schemars(
        description = "Arithmetic expression, e.g. `2 ** 10 / sqrt(16)`."
    )]
    expression: String,
}

/// A tool that evaluates arithmetic expressions without running any code.
pub struct CalculatorTool {
    description: String,
    parameter_schema: Value,
}

impl CalculatorTool {
    /// Creates a new calculator tool.
    #[inline]
    pub fn new() -> Self {
        CalculatorTool {
            description: format!(
                "Evaluates a math expression. Supports + - * / // % **, \
                 parentheses, the constants pi, e, tau and the functions {}.",
                FUNCTION_NAMES.join(", ")
            ),
            parameter_schema: schema_for!(CalculatorParameters).to_value(),
        }
    }
}

impl Default for CalculatorTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CalculatorTool {
    type Input = CalculatorParameters;

    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_names(&self) -> &[&str] {
        &["expression"]
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CalculatorParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = evaluate(&input.expression)
            .map(format_number)
            .map_err(|err| {
                let error = match err.kind() {
                    EvalErrorKind::Domain => ToolError::execution_error(),
                    _ => ToolError::invalid_input(),
                };
                error.with_reason(err.to_string())
            });
        ready(result)
    }
}

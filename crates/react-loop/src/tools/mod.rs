//! A set of built-in tools that models can use.

mod calculator;
mod datetime;
mod web_search;
mod wikipedia;

use react_loop_core::ToolRegistry;
use react_loop_core::tool::Error as ToolError;
use reqwest::Client;

pub use calculator::CalculatorTool;
pub use datetime::{CurrentTimeTool, DateCalculatorTool};
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

const USER_AGENT: &str = concat!(
    "react-loop/",
    env!("CARGO_PKG_VERSION"),
    " (educational agent)"
);

/// Returns a registry with every built-in tool.
///
/// The network tools share a single HTTP client.
pub fn default_registry() -> ToolRegistry {
    let client = Client::new();
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool::new());
    registry.register(WikipediaTool::with_client(client.clone()));
    registry.register(WebSearchTool::with_client(client));
    registry.register(CurrentTimeTool::new());
    registry.register(DateCalculatorTool::new());
    registry
}

/// Returns a registry with only the tools that work offline.
pub fn offline_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool::new());
    registry.register(CurrentTimeTool::new());
    registry.register(DateCalculatorTool::new());
    registry
}

fn request_error(err: reqwest::Error) -> ToolError {
    let reason = if err.is_timeout() {
        "request timed out".to_owned()
    } else {
        format!("network error: {err}")
    };
    ToolError::execution_error().with_reason(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            [
                "calculator",
                "wikipedia",
                "web_search",
                "current_time",
                "date_calculator"
            ]
        );
        let description = registry.describe();
        assert!(description.starts_with("calculator(expression): Evaluates"));
        assert!(description.contains("\nwikipedia(query, language): "));
    }

    #[tokio::test]
    async fn test_dispatch_through_registry() {
        let registry = offline_registry();
        assert_eq!(registry.dispatch("calculator", "23 * 17 + 156").await, "547.0");
        assert_eq!(
            registry.dispatch("calculator", "sqrt(-1)").await,
            "Error: math domain error in sqrt()"
        );
        let output = registry.dispatch("current_time", "").await;
        assert!(output.ends_with("(UTC)"), "{output}");
    }
}

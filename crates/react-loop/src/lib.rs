//! An out-of-the-box reasoning-and-acting agent with built-in tools.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring agent functionality into your own host apps:
//!
//! ```no_run
//! use react_loop::Config;
//! use react_loop::core::AgentBuilder;
//! use react_loop::tools::default_registry;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let agent = AgentBuilder::with_model_provider(config.provider())
//!     .with_tools(default_registry())
//!     .build();
//! let result = agent.run("What is 23 * 17 + 156?").await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod config;
pub mod research;
pub mod tools;

pub use config::{API_KEY_VAR, BASE_URL_VAR, Config, ConfigError, MODEL_VAR};

/// Re-exports of [`react_loop_core`] crate.
pub mod core {
    pub use react_loop_core::*;
}

//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use react_loop_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    Role,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct SharedState {
    attempts: Vec<u64>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// number of assistant messages already in the request, so a fresh
/// conversation gets the first step, the request after one assistant turn
/// gets the second, and so on. If there are no enough steps in the script,
/// an error will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::recorded_requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<PresetResponse>,
    delay: Option<Duration>,
    state: Arc<Mutex<SharedState>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script.push(preset);
    }

    /// Shorthand for a step that replies with a single text.
    #[inline]
    pub fn add_text_step<S: Into<String>>(&mut self, text: S) {
        self.add_assistant_response_step(PresetResponse::with_text(text));
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns a copy of every request received so far, in arrival order.
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.lock_state().requests.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, req: &ModelRequest) -> Result<ModelResponse, Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| msg.role() == Role::Assistant)
            .count();

        let mut state = self.lock_state();
        state.requests.push(req.clone());

        let Some(preset) = self.conversation_script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };

        if state.attempts.len() <= step_idx {
            state.attempts.resize(step_idx + 1, 0);
        }
        state.attempts[step_idx] += 1;
        let attempt = state.attempts[step_idx];
        match preset.failures {
            Some(0) => {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            Some(failures) if attempt <= failures => {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            _ => {}
        }

        Ok(preset.to_response())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = self.respond(req);
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        async move {
            sleep(delay).await;
            result
        }
    }
}

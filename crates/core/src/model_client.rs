use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use react_loop_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::agent::RunError;

type SendRequestResult = Result<ModelResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that bounds every request in time and
/// provides a type-erased interface for the other modules.
#[derive(Clone)]
pub(crate) struct ModelClient {
    handler_fn: HandlerFn,
    timeout: Duration,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        timeout: Duration,
    ) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    match fut.await {
                        Ok(resp) => {
                            trace!("got a response: {resp:?}");
                            Ok(resp)
                        }
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            timeout,
        }
    }

    #[inline]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Sends a request and waits for the complete response.
    ///
    /// # Cancel safety
    ///
    /// The request is abandoned as soon as `cancel` fires or the timeout
    /// elapses, whichever comes first.
    pub async fn send_request(
        &self,
        req: ModelRequest,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse, RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        let fut = tokio::time::timeout(self.timeout, (self.handler_fn)(req));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RunError::Cancelled),
            res = fut => match res {
                Ok(Ok(resp)) => Ok(resp),
                Ok(Err(err)) => Err(RunError::Model(err)),
                Err(_) => {
                    warn!("model request timed out after {:?}", self.timeout);
                    Err(RunError::Timeout(self.timeout))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use react_loop_model::{ErrorKind, ModelMessage};
    use react_loop_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step("How are you?");
        let model_client =
            ModelClient::new(model_provider, Duration::from_secs(60));

        for _ in 0..3 {
            let resp = model_client
                .send_request(request(), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(resp.content, "How are you?");
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::with_text("never").with_failures(0),
        );
        let model_client =
            ModelClient::new(model_provider, Duration::from_secs(60));
        let err = model_client
            .send_request(request(), &CancellationToken::new())
            .await
            .unwrap_err();
        let RunError::Model(err) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step("late");
        model_provider.set_delay(Duration::from_secs(120));
        let model_client =
            ModelClient::new(model_provider, Duration::from_secs(60));
        let err = model_client
            .send_request(request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(d) if d == Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_cancelled_before_sending() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step("unused");
        let model_client =
            ModelClient::new(model_provider.clone(), Duration::from_secs(60));
        let token = CancellationToken::new();
        token.cancel();
        let err = model_client.send_request(request(), &token).await.unwrap_err();
        assert!(matches!(err, RunError::Cancelled));
        assert!(model_provider.recorded_requests().is_empty());
    }
}

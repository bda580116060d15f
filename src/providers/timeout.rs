use crate::core::error::SmartCloudError;
use crate::providers::{LLMProvider, Message};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Bounds every inference call with a deadline. Expiry is reported as
/// `SmartCloudError::Timeout` so callers can recover instead of blocking the turn.
pub struct TimeoutProvider {
    inner: Box<dyn LLMProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Box<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl LLMProvider for TimeoutProvider {
    async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError> {
        match tokio::time::timeout(self.timeout, self.inner.get_response(messages)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f32(), "inference call timed out");
                Err(SmartCloudError::Timeout(format!(
                    "no response from {} within {:?}",
                    self.inner.model(),
                    self.timeout
                )))
            }
        }
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl LLMProvider for SlowProvider {
        async fn get_response(&self, _messages: &[Message]) -> Result<String, SmartCloudError> {
            tokio::time::sleep(self.delay).await;
            Ok("TASK_AGENT".to_string())
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let provider = TimeoutProvider::new(
            Box::new(SlowProvider {
                delay: Duration::from_secs(2),
            }),
            Duration::from_millis(20),
        );
        let err = provider
            .get_response(&[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, SmartCloudError::Timeout(_)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let provider = TimeoutProvider::new(
            Box::new(SlowProvider {
                delay: Duration::from_millis(10),
            }),
            Duration::from_secs(5),
        );
        let reply = provider.get_response(&[Message::user("hi")]).await.unwrap();
        assert_eq!(reply, "TASK_AGENT");
    }
}

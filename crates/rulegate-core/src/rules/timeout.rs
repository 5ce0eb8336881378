use crate::context::Context;
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::{IntoRule, SharedRule, ValidationRule};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Bounds the wrapped rule by a timeout.
///
/// The inner rule writes into a scratch accumulator that is merged only when
/// it completes in time. On timeout the rule fails with
/// [`RuleFault::Timeout`]; if the context is cancelled first it fails with
/// [`RuleFault::Cancelled`]. Either way nothing the inner rule recorded is kept.
pub struct AsyncRule {
    inner: SharedRule,
    timeout: Duration,
}

impl AsyncRule {
    pub fn new(rule: impl IntoRule, timeout: Duration) -> Self {
        Self {
            inner: rule.into_rule(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for AsyncRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRule")
            .field("inner", &self.inner.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for AsyncRule {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn stage(&self) -> Stage {
        self.inner.stage()
    }

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        let mut scratch = MultiError::new();
        scratch.set_priority(errors.current_priority());

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(RuleFault::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.inner.validate(ctx, &mut scratch)) => outcome,
        };

        match outcome {
            Ok(result) => {
                errors.merge(&scratch);
                result
            }
            Err(_) => Err(RuleFault::Timeout {
                rule: self.inner.name().to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::rules::ConcreteRule;

    fn sleeper(delay: Duration) -> ConcreteRule {
        ConcreteRule::new("remote_check").with_validation(move |_ctx, errors| {
            Box::pin(async move {
                errors.add("early", ErrorCode::Invalid, "recorded before sleeping");
                tokio::time::sleep(delay).await;
                errors.add("late", ErrorCode::Invalid, "recorded after sleeping");
                Ok(())
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn completes_within_timeout() {
        let rule = AsyncRule::new(sleeper(Duration::from_millis(10)), Duration::from_secs(1));
        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert_eq!(errors.fields(), vec!["early", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_discards_partial_errors() {
        let rule = AsyncRule::new(sleeper(Duration::from_secs(10)), Duration::from_millis(50));
        let mut errors = MultiError::new();
        let fault = rule
            .validate(&Context::background(), &mut errors)
            .await
            .unwrap_err();

        assert!(matches!(fault, RuleFault::Timeout { ref rule, .. } if rule == "remote_check"));
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn cancelled_context() {
        let rule = AsyncRule::new(sleeper(Duration::from_secs(10)), Duration::from_secs(20));
        let ctx = Context::background();
        ctx.cancel();

        let mut errors = MultiError::new();
        let fault = rule.validate(&ctx, &mut errors).await.unwrap_err();
        assert!(matches!(fault, RuleFault::Cancelled));
        assert!(errors.is_empty());
    }
}

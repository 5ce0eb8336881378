//! Per-call execution context.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried through a validation call.
///
/// The engine forwards the context to every rule; rules that suspend (database
/// queries, remote checks) should observe [`Context::cancelled`] so that a
/// cancelled call returns promptly.
///
/// ## Example
///
/// ```rust,ignore
/// use rulegate_core::Context;
/// use std::time::Duration;
///
/// let ctx = Context::builder()
///     .timeout(Duration::from_secs(2))
///     .build();
///
/// let errors = engine.validate(&ctx).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Create a builder for constructing a context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Child context: cancelled when this one is, and cancellable on its own.
    pub fn child(&self) -> Context {
        Context {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Time left before the deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Builder for constructing a [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl ContextBuilder {
    /// Tie the context to an existing cancellation token.
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Cancel the context `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Cancel the context at `deadline`.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Context {
        Context {
            token: self.token.unwrap_or_default(),
            deadline: self.deadline,
        }
    }
}

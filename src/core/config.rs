//! Stream configuration and scopes.

use tokio_util::sync::CancellationToken;

/// Configuration shared by a stream and every stream derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Capacity of the hand-off channel between a producer task and its
    /// consumer. One keeps a producer at most one element ahead.
    pub buffer_size: usize,
    /// Upper bound on elements a tee holds for its slowest output
    pub max_tee_lag: Option<usize>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            max_tee_lag: None,
        }
    }
}

impl StreamConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the channel capacity (clamped to at least one)
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Bound the number of elements a tee may buffer
    pub fn max_tee_lag(mut self, lag: Option<usize>) -> Self {
        self.max_tee_lag = lag.map(|lag| lag.max(1));
        self
    }

    pub(crate) fn channel_capacity(&self) -> usize {
        self.buffer_size.max(1)
    }
}

/// A root for a family of streams.
///
/// Sources built from a scope use its configuration and hang their
/// cancellation tokens off the scope's token, so [`Scope::cancel`] stops
/// every stream derived from them.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    config: StreamConfig,
    token: CancellationToken,
}

impl Scope {
    /// Create a scope with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope with the given configuration
    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            config,
            token: CancellationToken::new(),
        }
    }

    /// Create a scope that is cancelled together with `parent`
    pub fn child_of(parent: &CancellationToken, config: StreamConfig) -> Self {
        Self {
            config,
            token: parent.child_token(),
        }
    }

    /// The configuration sources inherit
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The root cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop every stream built from this scope
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

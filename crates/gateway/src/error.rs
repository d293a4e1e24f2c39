use thiserror::Error;

/// Errors surfaced by a [`crate::Gateway`] implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The handle does not identify any chat on the platform.
    #[error("channel not found: {handle}")]
    NotFound { handle: String },

    /// The handle resolved to a chat that is not a channel.
    #[error("not a channel: {handle}")]
    NotAChannel { handle: String },

    /// The bot lacks the permissions required for the call (typically it is
    /// not an administrator of the target channel).
    #[error("access denied by the platform")]
    Forbidden,

    /// Transport-level or platform-side failure.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl GatewayError {
    #[must_use]
    pub fn not_found(handle: impl Into<String>) -> Self {
        Self::NotFound {
            handle: handle.into(),
        }
    }

    #[must_use]
    pub fn not_a_channel(handle: impl Into<String>) -> Self {
        Self::NotAChannel {
            handle: handle.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

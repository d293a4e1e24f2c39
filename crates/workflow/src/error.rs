use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The handle does not identify a channel the bot can see.
    #[error("could not resolve channel: {reason}")]
    ChannelResolution { reason: String },

    /// The bot lacks administrator visibility into the channel.
    #[error("the bot is not an administrator of that channel")]
    InsufficientVisibility,

    /// A membership row for this (group, channel) pair already exists.
    #[error("the channel is already a member of this group, or has a pending request")]
    AlreadyMemberOrPending,

    /// The membership no longer exists (already resolved, or the target was
    /// deleted concurrently). Also used for malformed action tokens.
    #[error("this invite or request is no longer valid")]
    NoSuchMembership,

    /// The requesting channel has not been authenticated yet.
    #[error("the channel is not authenticated — post through the bot first")]
    ChannelNotAuthenticated,

    /// Only the group owner may perform this operation.
    #[error("only the group owner can do that")]
    NotGroupOwner,

    /// The actor owns neither side of the membership.
    #[error("only the group owner or the channel owner can do that")]
    NotAuthorized,

    #[error("group not found")]
    GroupNotFound,

    #[error(transparent)]
    Store(#[from] crossfeed_store::Error),
}

impl Error {
    #[must_use]
    pub fn resolution(reason: impl Into<String>) -> Self {
        Self::ChannelResolution {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

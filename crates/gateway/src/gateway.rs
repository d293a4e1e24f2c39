use {async_trait::async_trait, serde::Serialize};

use crate::error::Result;

/// Identity of a channel as resolved by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub id: i64,
    /// Public handle without the leading `@`, when the channel has one.
    pub handle: Option<String>,
    pub title: String,
}

/// Administrator role, reduced to what the membership workflow needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Creator,
    Administrator,
}

/// One entry of a channel's administrator list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAdmin {
    pub user_id: i64,
    pub username: Option<String>,
    pub role: AdminRole,
    pub is_bot: bool,
}

/// An Accept/Decline affordance attached to a direct message.
///
/// `token` is the callback payload the platform echoes back on press; the
/// workflow's action-token codec produces and parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub token: String,
}

/// The messaging-platform client, as consumed by the membership workflow and
/// the relay engine.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Resolve a public handle (without `@`) to a channel identity.
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelIdentity>;

    /// List a channel's administrators. Requires the bot itself to have
    /// administrator-level visibility into the channel.
    async fn list_administrators(&self, channel_id: i64) -> Result<Vec<ChannelAdmin>>;

    /// Number of subscribers of a channel.
    async fn member_count(&self, channel_id: i64) -> Result<u32>;

    /// Deliver one post from the source channel to a target channel.
    async fn deliver_content(
        &self,
        source_channel_id: i64,
        target_channel_id: i64,
        message_id: i32,
    ) -> Result<()>;

    /// Send a direct message to a user, optionally with action buttons.
    async fn send_direct_message(
        &self,
        user_id: i64,
        text: &str,
        actions: Option<Vec<ActionButton>>,
    ) -> Result<()>;
}

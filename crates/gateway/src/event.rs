use serde::{Deserialize, Serialize};

/// A post published in a channel, as delivered by the platform.
///
/// Album parts arrive as separate `PostEvent`s sharing an `album_id`; the
/// relay coalescer reassembles them in `sequence_id` order before fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEvent {
    /// Source channel id.
    pub channel_id: i64,
    /// Platform message id inside the source channel.
    pub message_id: i32,
    /// Media-group id shared by the parts of a multi-item album.
    pub album_id: Option<String>,
    /// Platform-assigned ordering key within an album.
    pub sequence_id: i64,
}

//! Core records of the federation data model.

use serde::{Deserialize, Serialize};

/// A platform user. Created on first interaction, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user id.
    pub id: i64,
    pub username: Option<String>,
}

/// A channel known to the bot.
///
/// A channel may exist unauthenticated — created speculatively when someone
/// invites it by handle. `authenticated` flips to true only once the platform
/// has corroborated the recorded owner as the channel's creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Platform channel id.
    pub id: i64,
    pub owner_id: Option<i64>,
    /// Public handle without the leading `@`.
    pub handle: Option<String>,
    pub title: String,
    pub authenticated: bool,
}

/// A named federation group owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

/// Handshake state of a membership. Absence of the row means "not a member":
/// declines and removals delete the row rather than storing a rejected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Accepted,
}

impl MembershipStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }
}

/// The (group, channel) link. At most one row per pair; transitions once
/// from Pending to Accepted and never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: i64,
    pub channel_id: i64,
    pub status: MembershipStatus,
    /// Who initiated the handshake. Used only for notification routing.
    pub inviter_id: Option<i64>,
}

//! Accept/Decline action tokens.
//!
//! Wire format, underscore-delimited:
//! `<verb>_<groupId>_<channelId>` for internal invites and
//! `<verb>_ext_<groupId>_<channelId>` for external join requests, with
//! verb ∈ {accept, decline}. Malformed tokens and unknown verbs decode to
//! `None`; the workflow maps that to `NoSuchMembership`.

/// The verb carried by an action token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(Self::Accept),
            "decline" => Some(Self::Decline),
            _ => None,
        }
    }
}

/// Which handshake path the token belongs to. Determines who gets notified
/// of the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Group owner invited the channel; its owner is responding.
    Invite,
    /// Channel owner requested to join; the group owner is responding.
    JoinRequest,
}

/// A fully decoded Accept/Decline affordance, addressed by (group, channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionToken {
    pub decision: Decision,
    pub scope: TokenScope,
    pub group_id: i64,
    pub channel_id: i64,
}

impl ActionToken {
    #[must_use]
    pub fn encode(&self) -> String {
        let verb = self.decision.as_str();
        match self.scope {
            TokenScope::Invite => format!("{verb}_{}_{}", self.group_id, self.channel_id),
            TokenScope::JoinRequest => format!("{verb}_ext_{}_{}", self.group_id, self.channel_id),
        }
    }

    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.split('_');
        let decision = Decision::parse(parts.next()?)?;
        let second = parts.next()?;
        let (scope, group_part) = if second == "ext" {
            (TokenScope::JoinRequest, parts.next()?)
        } else {
            (TokenScope::Invite, second)
        };
        let group_id = group_part.parse().ok()?;
        let channel_id = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            decision,
            scope,
            group_id,
            channel_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_internal() {
        let token = ActionToken {
            decision: Decision::Accept,
            scope: TokenScope::Invite,
            group_id: 12,
            channel_id: -1001234,
        };
        assert_eq!(token.encode(), "accept_12_-1001234");
        assert_eq!(ActionToken::decode("accept_12_-1001234"), Some(token));
    }

    #[test]
    fn encode_external() {
        let token = ActionToken {
            decision: Decision::Decline,
            scope: TokenScope::JoinRequest,
            group_id: 3,
            channel_id: 44,
        };
        assert_eq!(token.encode(), "decline_ext_3_44");
        assert_eq!(ActionToken::decode("decline_ext_3_44"), Some(token));
    }

    #[test]
    fn rejects_unknown_verb() {
        assert_eq!(ActionToken::decode("approve_1_2"), None);
        assert_eq!(ActionToken::decode("aceitar_1_2"), None);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(ActionToken::decode(""), None);
        assert_eq!(ActionToken::decode("accept"), None);
        assert_eq!(ActionToken::decode("accept_1"), None);
        assert_eq!(ActionToken::decode("accept_ext_1"), None);
        assert_eq!(ActionToken::decode("accept_x_y"), None);
        assert_eq!(ActionToken::decode("accept_1_2_3"), None);
        assert_eq!(ActionToken::decode("accept_ext_1_2_3"), None);
    }
}

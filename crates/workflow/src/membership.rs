//! The membership state machine: invite, request, respond, leave, remove,
//! delete-group, and channel authentication.

use std::sync::Arc;

use tracing::{info, warn};

use {
    crossfeed_gateway::{ActionButton, AdminRole, ChannelAdmin, Gateway, GatewayError},
    crossfeed_store::{Channel, Group, Membership, MembershipStatus, Store, User},
};

use crate::{
    Error, Result,
    token::{ActionToken, Decision, TokenScope},
};

/// Orchestrates the two-party handshake between groups and channels.
pub struct MembershipWorkflow {
    store: Arc<dyn Store>,
    gateway: Arc<dyn Gateway>,
}

/// How an invite resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    /// The inviter owns the channel — no approval round-trip needed.
    AcceptedDirectly { channel: Channel },
    /// A pending membership was created and the channel owner was notified.
    PendingApproval { channel: Channel },
}

/// Result of a `respond` call, for rendering the confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondOutcome {
    pub decision: Decision,
    pub group: Group,
    pub channel: Channel,
}

impl MembershipWorkflow {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn Gateway>) -> Self {
        Self { store, gateway }
    }

    /// Create a group owned by `owner`, upserting the owner record first.
    pub async fn create_group(&self, owner: &User, name: &str) -> Result<Group> {
        self.store.upsert_user(owner).await?;
        let group = self.store.create_group(owner.id, name).await?;
        info!(group_id = group.id, owner_id = owner.id, name, "group created");
        Ok(group)
    }

    /// Owner-invites-channel path.
    ///
    /// Resolves `handle`, determines the channel's administrator-of-record,
    /// records the channel (not authenticated by this path), and either links
    /// it directly (inviter owns it) or creates a pending membership and
    /// notifies the resolved owner.
    pub async fn invite_channel(
        &self,
        inviter: &User,
        group_id: i64,
        handle: &str,
    ) -> Result<InviteOutcome> {
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or(Error::GroupNotFound)?;

        let identity = match self.gateway.resolve_channel(handle).await {
            Ok(identity) => identity,
            Err(GatewayError::Forbidden) => return Err(Error::InsufficientVisibility),
            Err(e) => return Err(Error::resolution(e.to_string())),
        };

        let admins = self
            .gateway
            .list_administrators(identity.id)
            .await
            .map_err(|_| Error::InsufficientVisibility)?;
        let owner = pick_owner_of_record(&admins).ok_or(Error::InsufficientVisibility)?;
        if owner.role != AdminRole::Creator {
            // No creator in the list — notifying an arbitrary administrator
            // is a known gap; make it visible.
            warn!(
                channel_id = identity.id,
                admin_id = owner.user_id,
                "no creator role found, falling back to first listed administrator"
            );
        }

        self.store.upsert_user(inviter).await?;
        self.store
            .upsert_user(&User {
                id: owner.user_id,
                username: owner.username.clone(),
            })
            .await?;

        let channel = Channel {
            id: identity.id,
            owner_id: Some(owner.user_id),
            handle: identity.handle.clone(),
            title: identity.title.clone(),
            // The invite path alone never authenticates a channel.
            authenticated: false,
        };
        self.store.upsert_channel(&channel).await?;

        let self_service = owner.user_id == inviter.id;
        let membership = Membership {
            group_id,
            channel_id: identity.id,
            status: if self_service {
                MembershipStatus::Accepted
            } else {
                MembershipStatus::Pending
            },
            inviter_id: Some(inviter.id),
        };
        if !self.store.insert_membership(&membership).await? {
            return Err(Error::AlreadyMemberOrPending);
        }

        if self_service {
            info!(
                group_id,
                channel_id = identity.id,
                "inviter owns the channel, accepted directly"
            );
            return Ok(InviteOutcome::AcceptedDirectly { channel });
        }

        let actions = accept_decline_buttons(TokenScope::Invite, group_id, identity.id);
        let text = format!(
            "Your channel \"{}\" was invited to join the group \"{}\".",
            channel.title, group.name
        );
        if let Err(e) = self
            .gateway
            .send_direct_message(owner.user_id, &text, Some(actions))
            .await
        {
            // The pending membership stands; the owner can still respond
            // through a later prompt.
            warn!(
                group_id,
                channel_id = identity.id,
                owner_id = owner.user_id,
                error = %e,
                "failed to notify channel owner of invite"
            );
        }

        Ok(InviteOutcome::PendingApproval { channel })
    }

    /// Channel-requests-group path.
    ///
    /// The channel must already be authenticated (established out-of-band
    /// when it posts through the bot, see [`Self::authenticate_channel`]).
    pub async fn request_join(
        &self,
        requester: &User,
        channel_id: i64,
        group_id: i64,
    ) -> Result<()> {
        let channel = self
            .store
            .get_channel(channel_id)
            .await?
            .ok_or(Error::ChannelNotAuthenticated)?;
        if !channel.authenticated {
            return Err(Error::ChannelNotAuthenticated);
        }
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or(Error::GroupNotFound)?;

        self.store.upsert_user(requester).await?;
        let membership = Membership {
            group_id,
            channel_id,
            status: MembershipStatus::Pending,
            inviter_id: Some(requester.id),
        };
        if !self.store.insert_membership(&membership).await? {
            return Err(Error::AlreadyMemberOrPending);
        }

        let actions = accept_decline_buttons(TokenScope::JoinRequest, group_id, channel_id);
        let text = format!(
            "The channel \"{}\" requests to join your group \"{}\".",
            channel.title, group.name
        );
        if let Err(e) = self
            .gateway
            .send_direct_message(group.owner_id, &text, Some(actions))
            .await
        {
            warn!(
                group_id,
                channel_id,
                owner_id = group.owner_id,
                error = %e,
                "failed to notify group owner of join request"
            );
        }

        Ok(())
    }

    /// Resolve an invite or join request, either way.
    ///
    /// Exactly one responder wins a concurrent Accept/Decline race at the
    /// store; the loser gets `NoSuchMembership`, as does any replay.
    pub async fn respond(&self, actor_id: i64, token: &ActionToken) -> Result<RespondOutcome> {
        let membership = self
            .store
            .get_membership(token.group_id, token.channel_id)
            .await?
            .ok_or(Error::NoSuchMembership)?;
        let group = self
            .store
            .get_group(token.group_id)
            .await?
            .ok_or(Error::NoSuchMembership)?;
        let channel = self
            .store
            .get_channel(token.channel_id)
            .await?
            .ok_or(Error::NoSuchMembership)?;

        let changed = match token.decision {
            Decision::Accept => {
                self.store
                    .accept_membership(token.group_id, token.channel_id)
                    .await?
            },
            Decision::Decline => {
                // Guarded like accept: a stale decline after an accept must
                // not take down the accepted membership.
                self.store
                    .decline_membership(token.group_id, token.channel_id)
                    .await?
            },
        };
        if !changed {
            return Err(Error::NoSuchMembership);
        }

        info!(
            group_id = token.group_id,
            channel_id = token.channel_id,
            actor_id,
            decision = ?token.decision,
            "membership resolved"
        );

        self.notify_resolution(token, &group, &channel, membership.inviter_id)
            .await;

        Ok(RespondOutcome {
            decision: token.decision,
            group,
            channel,
        })
    }

    /// Group owner removes a channel, or a channel owner leaves a group.
    /// Anyone else is refused. Removing a non-existent membership succeeds
    /// as a no-op.
    pub async fn remove_channel(&self, actor_id: i64, group_id: i64, channel_id: i64) -> Result<()> {
        let group = self.store.get_group(group_id).await?;
        let channel = self.store.get_channel(channel_id).await?;
        let owns_group = group.is_some_and(|g| g.owner_id == actor_id);
        let owns_channel = channel.is_some_and(|c| c.owner_id == Some(actor_id));
        if !owns_group && !owns_channel {
            return Err(Error::NotAuthorized);
        }

        let removed = self.store.delete_membership(group_id, channel_id).await?;
        if removed {
            info!(group_id, channel_id, actor_id, "membership removed");
        }
        Ok(())
    }

    /// Delete a group and all its memberships. Owner-only and irreversible;
    /// the handler layer is responsible for the two-step confirmation.
    pub async fn delete_group(&self, actor_id: i64, group_id: i64) -> Result<()> {
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or(Error::GroupNotFound)?;
        if group.owner_id != actor_id {
            return Err(Error::NotGroupOwner);
        }
        self.store.delete_group(group_id).await?;
        info!(group_id, name = %group.name, "group deleted");
        Ok(())
    }

    /// Authenticate a channel from one of its own posts.
    ///
    /// The platform corroborates the poster's channel by listing its
    /// administrators; the creator becomes the owner-of-record and the
    /// channel is marked authenticated. Returns false (without error) when
    /// the admin list is unavailable or holds no creator — the post is still
    /// relayed either way.
    pub async fn authenticate_channel(
        &self,
        channel_id: i64,
        handle: Option<String>,
        title: &str,
    ) -> Result<bool> {
        let admins = match self.gateway.list_administrators(channel_id).await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(channel_id, error = %e, "could not list channel administrators");
                return Ok(false);
            },
        };
        let Some(creator) = admins
            .iter()
            .find(|a| a.role == AdminRole::Creator && !a.is_bot)
        else {
            return Ok(false);
        };

        self.store
            .upsert_user(&User {
                id: creator.user_id,
                username: creator.username.clone(),
            })
            .await?;
        self.store
            .upsert_channel(&Channel {
                id: channel_id,
                owner_id: Some(creator.user_id),
                handle,
                title: title.to_string(),
                authenticated: true,
            })
            .await?;

        info!(channel_id, owner_id = creator.user_id, "channel authenticated");
        Ok(true)
    }

    /// Notify the parties that did not press the button.
    async fn notify_resolution(
        &self,
        token: &ActionToken,
        group: &Group,
        channel: &Channel,
        inviter_id: Option<i64>,
    ) {
        let verb = match token.decision {
            Decision::Accept => "accepted",
            Decision::Decline => "declined",
        };

        let (recipient, text) = match token.scope {
            // Channel owner responded — tell the group owner.
            TokenScope::Invite => (
                Some(group.owner_id),
                format!(
                    "The channel \"{}\" {verb} the invite to your group \"{}\".",
                    channel.title, group.name
                ),
            ),
            // Group owner responded — tell whoever filed the request.
            TokenScope::JoinRequest => (
                inviter_id.or(channel.owner_id),
                format!(
                    "Your channel \"{}\" was {verb} for the group \"{}\".",
                    channel.title, group.name
                ),
            ),
        };

        if let Some(user_id) = recipient
            && let Err(e) = self.gateway.send_direct_message(user_id, &text, None).await
        {
            warn!(
                group_id = group.id,
                channel_id = channel.id,
                user_id,
                error = %e,
                "failed to deliver resolution notification"
            );
        }
    }
}

/// Creator role preferred; fall back to the first listed human
/// administrator. Bots are never the owner-of-record.
fn pick_owner_of_record(admins: &[ChannelAdmin]) -> Option<&ChannelAdmin> {
    admins
        .iter()
        .find(|a| a.role == AdminRole::Creator && !a.is_bot)
        .or_else(|| admins.iter().find(|a| !a.is_bot))
}

fn accept_decline_buttons(scope: TokenScope, group_id: i64, channel_id: i64) -> Vec<ActionButton> {
    let accept = ActionToken {
        decision: Decision::Accept,
        scope,
        group_id,
        channel_id,
    };
    let decline = ActionToken {
        decision: Decision::Decline,
        scope,
        group_id,
        channel_id,
    };
    vec![
        ActionButton {
            label: "✅ Accept".into(),
            token: accept.encode(),
        },
        ActionButton {
            label: "❌ Decline".into(),
            token: decline.encode(),
        },
    ]
}

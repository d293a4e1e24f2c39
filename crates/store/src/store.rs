//! Persistence trait for the federation data model.

use async_trait::async_trait;

use crate::{
    Result,
    types::{Channel, Group, Membership, User},
};

/// The single source of truth for membership state.
///
/// Mutations on a (group, channel) row are guarded: `accept_membership` and
/// `decline_membership` only touch a row that is still pending and report
/// whether one was actually changed, so concurrent Accept/Decline on the
/// same membership is serialized here and exactly one caller wins.
#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_user(&self, user: &User) -> Result<()>;

    /// Insert or update a channel record.
    ///
    /// The `authenticated` flag is sticky: an upsert with
    /// `authenticated = false` never clears a previously authenticated
    /// channel (the speculative invite path must not undo out-of-band
    /// authentication).
    async fn upsert_channel(&self, channel: &Channel) -> Result<()>;
    async fn get_channel(&self, id: i64) -> Result<Option<Channel>>;
    async fn channels_owned_by(&self, user_id: i64) -> Result<Vec<Channel>>;

    async fn create_group(&self, owner_id: i64, name: &str) -> Result<Group>;
    async fn get_group(&self, id: i64) -> Result<Option<Group>>;
    async fn groups_owned_by(&self, user_id: i64) -> Result<Vec<Group>>;
    async fn list_groups(&self) -> Result<Vec<Group>>;
    /// Delete a group and all its memberships in one transaction.
    async fn delete_group(&self, id: i64) -> Result<()>;

    /// Insert a membership row; returns false when a row for the
    /// (group, channel) pair already exists, in any status.
    async fn insert_membership(&self, membership: &Membership) -> Result<bool>;
    async fn get_membership(&self, group_id: i64, channel_id: i64) -> Result<Option<Membership>>;
    /// Flip Pending → Accepted. Returns false when no pending row exists
    /// (already resolved, or deleted concurrently).
    async fn accept_membership(&self, group_id: i64, channel_id: i64) -> Result<bool>;
    /// Delete the row only while it is still Pending. Returns false when it
    /// was already resolved or gone; an Accepted row survives.
    async fn decline_membership(&self, group_id: i64, channel_id: i64) -> Result<bool>;
    /// Delete the row regardless of status. Returns false when it was
    /// already gone.
    async fn delete_membership(&self, group_id: i64, channel_id: i64) -> Result<bool>;

    /// Accepted memberships of one channel — the fan-out hot path
    /// ("which groups is this channel in").
    async fn accepted_memberships_for_channel(&self, channel_id: i64) -> Result<Vec<Membership>>;
    /// Accepted memberships inside one group ("who else is in this group").
    async fn accepted_memberships_in_group(&self, group_id: i64) -> Result<Vec<Membership>>;
}

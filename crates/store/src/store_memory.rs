//! In-memory store for tests and single-process setups.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    Result,
    store::Store,
    types::{Channel, Group, Membership, MembershipStatus, User},
};

/// In-memory store backed by `HashMap`s. No persistence.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<i64, User>>,
    channels: Mutex<HashMap<i64, Channel>>,
    groups: Mutex<HashMap<i64, Group>>,
    memberships: Mutex<HashMap<(i64, i64), Membership>>,
    next_group_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_group_id: AtomicI64::new(1),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn upsert_channel(&self, channel: &Channel) -> Result<()> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = channel.clone();
        if let Some(prior) = channels.get(&channel.id) {
            // Sticky flag, same as the SQLite upsert.
            next.authenticated = prior.authenticated || channel.authenticated;
        }
        channels.insert(next.id, next);
        Ok(())
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels.get(&id).cloned())
    }

    async fn channels_owned_by(&self, user_id: i64) -> Result<Vec<Channel>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Channel> = channels
            .values()
            .filter(|c| c.owner_id == Some(user_id))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.id);
        Ok(out)
    }

    async fn create_group(&self, owner_id: i64, name: &str) -> Result<Group> {
        let id = self.next_group_id.fetch_add(1, Ordering::SeqCst);
        let group = Group {
            id,
            name: name.to_string(),
            owner_id,
        };
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        groups.insert(id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        Ok(groups.get(&id).cloned())
    }

    async fn groups_owned_by(&self, user_id: i64) -> Result<Vec<Group>> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Group> = groups
            .values()
            .filter(|g| g.owner_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|g| g.id);
        Ok(out)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Group> = groups.values().cloned().collect();
        out.sort_by_key(|g| g.id);
        Ok(out)
    }

    async fn delete_group(&self, id: i64) -> Result<()> {
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        let mut memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        groups.remove(&id);
        memberships.retain(|(gid, _), _| *gid != id);
        Ok(())
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<bool> {
        let mut memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        let key = (membership.group_id, membership.channel_id);
        if memberships.contains_key(&key) {
            return Ok(false);
        }
        memberships.insert(key, membership.clone());
        Ok(true)
    }

    async fn get_membership(&self, group_id: i64, channel_id: i64) -> Result<Option<Membership>> {
        let memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        Ok(memberships.get(&(group_id, channel_id)).cloned())
    }

    async fn accept_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let mut memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        match memberships.get_mut(&(group_id, channel_id)) {
            Some(m) if m.status == MembershipStatus::Pending => {
                m.status = MembershipStatus::Accepted;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn decline_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let mut memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        match memberships.get(&(group_id, channel_id)) {
            Some(m) if m.status == MembershipStatus::Pending => {
                memberships.remove(&(group_id, channel_id));
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn delete_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let mut memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        Ok(memberships.remove(&(group_id, channel_id)).is_some())
    }

    async fn accepted_memberships_for_channel(&self, channel_id: i64) -> Result<Vec<Membership>> {
        let memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Membership> = memberships
            .values()
            .filter(|m| m.channel_id == channel_id && m.status == MembershipStatus::Accepted)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.group_id);
        Ok(out)
    }

    async fn accepted_memberships_in_group(&self, group_id: i64) -> Result<Vec<Membership>> {
        let memberships = self.memberships.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Membership> = memberships
            .values()
            .filter(|m| m.group_id == group_id && m.status == MembershipStatus::Accepted)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.channel_id);
        Ok(out)
    }
}

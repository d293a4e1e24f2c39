//! Per-user conversation flow tracking.
//!
//! A flow is the expectation that the user's next free-text message answers a
//! specific prior prompt (a group name, a channel handle). A user has at most
//! one active flow; starting a new one silently replaces it — last action
//! wins. Flows live behind the narrow [`FlowStore`] interface so the default
//! in-process map can be swapped for an external cache in a multi-instance
//! deployment without touching callers.

use std::{collections::HashMap, sync::RwLock};

/// The multi-step input a user is mid-way through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Next message names a new group.
    AwaitingGroupName,
    /// Next message is a channel handle to invite into `group_id`.
    AwaitingChannelInvite { group_id: i64 },
}

/// Keyed flow storage: get-and-clear, set, clear.
pub trait FlowStore: Send + Sync {
    /// Start a flow, replacing any existing one for the user.
    fn begin(&self, user_id: i64, flow: Flow);
    /// Return and clear the user's active flow.
    fn consume(&self, user_id: i64) -> Option<Flow>;
    /// Drop the user's flow, if any. Main-menu navigation calls this.
    fn clear(&self, user_id: i64);
}

/// Process-local flow storage.
#[derive(Default)]
pub struct InMemoryFlows {
    flows: RwLock<HashMap<i64, Flow>>,
}

impl InMemoryFlows {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlowStore for InMemoryFlows {
    fn begin(&self, user_id: i64, flow: Flow) {
        let mut flows = self.flows.write().unwrap_or_else(|e| e.into_inner());
        flows.insert(user_id, flow);
    }

    fn consume(&self, user_id: i64) -> Option<Flow> {
        let mut flows = self.flows.write().unwrap_or_else(|e| e.into_inner());
        flows.remove(&user_id)
    }

    fn clear(&self, user_id: i64) {
        let mut flows = self.flows.write().unwrap_or_else(|e| e.into_inner());
        flows.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_clears() {
        let flows = InMemoryFlows::new();
        flows.begin(1, Flow::AwaitingGroupName);
        assert_eq!(flows.consume(1), Some(Flow::AwaitingGroupName));
        assert_eq!(flows.consume(1), None);
    }

    #[test]
    fn new_flow_replaces_old() {
        let flows = InMemoryFlows::new();
        flows.begin(1, Flow::AwaitingGroupName);
        flows.begin(1, Flow::AwaitingChannelInvite { group_id: 7 });
        assert_eq!(
            flows.consume(1),
            Some(Flow::AwaitingChannelInvite { group_id: 7 })
        );
    }

    #[test]
    fn flows_are_per_user() {
        let flows = InMemoryFlows::new();
        flows.begin(1, Flow::AwaitingGroupName);
        flows.begin(2, Flow::AwaitingChannelInvite { group_id: 3 });
        flows.clear(1);
        assert_eq!(flows.consume(1), None);
        assert_eq!(
            flows.consume(2),
            Some(Flow::AwaitingChannelInvite { group_id: 3 })
        );
    }
}

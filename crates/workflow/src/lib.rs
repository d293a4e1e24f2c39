//! Membership workflow: how a channel enters, is accepted into, or leaves a
//! federation group.
//!
//! Two symmetric handshake paths (owner invites a channel; a channel owner
//! requests to join), a single `respond` operation for both, and the
//! per-user conversation flow tracker that drives multi-step text input.

pub mod error;
pub mod flows;
pub mod membership;
pub mod token;

pub use {
    error::{Error, Result},
    flows::{Flow, FlowStore, InMemoryFlows},
    membership::{InviteOutcome, MembershipWorkflow, RespondOutcome},
    token::{ActionToken, Decision, TokenScope},
};

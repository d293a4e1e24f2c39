//! Messaging-platform contract.
//!
//! The `Gateway` trait is the only surface through which the workflow and
//! relay crates talk to Telegram (or a mock in tests): resolving a channel
//! handle, listing its administrators, forwarding a post, and sending a
//! direct message with optional action buttons.

pub mod error;
pub mod event;
pub mod gateway;

pub use {
    error::GatewayError,
    event::PostEvent,
    gateway::{ActionButton, AdminRole, ChannelAdmin, ChannelIdentity, Gateway},
};

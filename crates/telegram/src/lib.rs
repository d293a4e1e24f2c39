//! Telegram surface for crossfeed.
//!
//! Implements the `Gateway` contract with teloxide, runs the long-polling
//! loop, and renders the inline-keyboard menus that drive the membership
//! workflow.

pub mod bot;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;

pub use {config::BotConfig, gateway::TelegramGateway};

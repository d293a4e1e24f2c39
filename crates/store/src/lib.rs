//! Durable records for users, channels, groups and memberships.
//!
//! The [`Store`] trait is the single source of truth for membership state.
//! Two implementations: [`store_sqlite::SqliteStore`] for production and
//! [`store_memory::InMemoryStore`] for tests and single-process setups.

pub mod error;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod types;

pub use {
    error::{Error, Result},
    store::Store,
    types::{Channel, Group, Membership, MembershipStatus, User},
};

/// Run database migrations for the store.
///
/// Creates the `users`, `channels`, `channel_groups` and `memberships`
/// tables. Call at startup before constructing
/// [`store_sqlite::SqliteStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}

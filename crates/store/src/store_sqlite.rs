//! SQLite-backed store using sqlx.

use sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    Error, Result,
    store::Store,
    types::{Channel, Group, Membership, MembershipStatus, User},
};

use async_trait::async_trait;

/// SQLite persistence for the federation data model.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with its own connection pool and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store using an existing pool.
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_channel(row: &sqlx::sqlite::SqliteRow) -> Channel {
    Channel {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        handle: row.get("handle"),
        title: row.get("title"),
        authenticated: row.get::<i64, _>("authenticated") != 0,
    }
}

fn row_to_group(row: &sqlx::sqlite::SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
    }
}

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> Result<Membership> {
    let status: String = row.get("status");
    let status = MembershipStatus::parse(&status)
        .ok_or_else(|| Error::message(format!("unknown membership status: {status}")))?;
    Ok(Membership {
        group_id: row.get("group_id"),
        channel_id: row.get("channel_id"),
        status,
        inviter_id: row.get("inviter_id"),
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username",
        )
        .bind(user.id)
        .bind(&user.username)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_channel(&self, channel: &Channel) -> Result<()> {
        // authenticated is sticky: OR with the stored value so a speculative
        // upsert never clears prior authentication.
        sqlx::query(
            "INSERT INTO channels (id, owner_id, handle, title, authenticated)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 owner_id = excluded.owner_id,
                 handle = excluded.handle,
                 title = excluded.title,
                 authenticated = channels.authenticated OR excluded.authenticated",
        )
        .bind(channel.id)
        .bind(channel.owner_id)
        .bind(&channel.handle)
        .bind(&channel.title)
        .bind(channel.authenticated as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>> {
        let row = sqlx::query("SELECT * FROM channels WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_channel))
    }

    async fn channels_owned_by(&self, user_id: i64) -> Result<Vec<Channel>> {
        let rows = sqlx::query("SELECT * FROM channels WHERE owner_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_channel).collect())
    }

    async fn create_group(&self, owner_id: i64, name: &str) -> Result<Group> {
        let result = sqlx::query("INSERT INTO channel_groups (name, owner_id) VALUES (?, ?)")
            .bind(name)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(Group {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            owner_id,
        })
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let row = sqlx::query("SELECT * FROM channel_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_group))
    }

    async fn groups_owned_by(&self, user_id: i64) -> Result<Vec<Group>> {
        let rows = sqlx::query("SELECT * FROM channel_groups WHERE owner_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_group).collect())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query("SELECT * FROM channel_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_group).collect())
    }

    async fn delete_group(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM memberships WHERE group_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM channel_groups WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO memberships (group_id, channel_id, status, inviter_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(membership.group_id)
        .bind(membership.channel_id)
        .bind(membership.status.as_str())
        .bind(membership.inviter_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_membership(&self, group_id: i64, channel_id: i64) -> Result<Option<Membership>> {
        let row = sqlx::query("SELECT * FROM memberships WHERE group_id = ? AND channel_id = ?")
            .bind(group_id)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_membership).transpose()
    }

    async fn accept_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE memberships SET status = 'accepted'
             WHERE group_id = ? AND channel_id = ? AND status = 'pending'",
        )
        .bind(group_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn decline_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM memberships
             WHERE group_id = ? AND channel_id = ? AND status = 'pending'",
        )
        .bind(group_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(&self, group_id: i64, channel_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM memberships WHERE group_id = ? AND channel_id = ?")
            .bind(group_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn accepted_memberships_for_channel(&self, channel_id: i64) -> Result<Vec<Membership>> {
        let rows = sqlx::query(
            "SELECT * FROM memberships WHERE channel_id = ? AND status = 'accepted'
             ORDER BY group_id",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_membership).collect()
    }

    async fn accepted_memberships_in_group(&self, group_id: i64) -> Result<Vec<Membership>> {
        let rows = sqlx::query(
            "SELECT * FROM memberships WHERE group_id = ? AND status = 'accepted'
             ORDER BY channel_id",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_membership).collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn make_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn pending(group_id: i64, channel_id: i64) -> Membership {
        Membership {
            group_id,
            channel_id,
            status: MembershipStatus::Pending,
            inviter_id: Some(1),
        }
    }

    #[tokio::test]
    async fn channel_upsert_preserves_authentication() {
        let store = make_store().await;
        store
            .upsert_channel(&Channel {
                id: 10,
                owner_id: Some(1),
                handle: Some("news".into()),
                title: "News".into(),
                authenticated: true,
            })
            .await
            .unwrap();

        // Speculative upsert from the invite path must not clear the flag.
        store
            .upsert_channel(&Channel {
                id: 10,
                owner_id: Some(2),
                handle: Some("news".into()),
                title: "News!".into(),
                authenticated: false,
            })
            .await
            .unwrap();

        let ch = store.get_channel(10).await.unwrap().unwrap();
        assert!(ch.authenticated);
        assert_eq!(ch.owner_id, Some(2));
        assert_eq!(ch.title, "News!");
    }

    #[tokio::test]
    async fn membership_unique_per_pair() {
        let store = make_store().await;
        assert!(store.insert_membership(&pending(1, 10)).await.unwrap());
        assert!(!store.insert_membership(&pending(1, 10)).await.unwrap());
        // Same channel in another group is a separate row.
        assert!(store.insert_membership(&pending(2, 10)).await.unwrap());
    }

    #[tokio::test]
    async fn accept_is_guarded() {
        let store = make_store().await;
        store.insert_membership(&pending(1, 10)).await.unwrap();

        assert!(store.accept_membership(1, 10).await.unwrap());
        // Replay loses: the row is no longer pending.
        assert!(!store.accept_membership(1, 10).await.unwrap());

        let m = store.get_membership(1, 10).await.unwrap().unwrap();
        assert_eq!(m.status, MembershipStatus::Accepted);
    }

    #[tokio::test]
    async fn decline_is_guarded() {
        let store = make_store().await;
        store.insert_membership(&pending(1, 10)).await.unwrap();
        store.accept_membership(1, 10).await.unwrap();

        // A stale decline must not take down the accepted row.
        assert!(!store.decline_membership(1, 10).await.unwrap());
        assert!(store.get_membership(1, 10).await.unwrap().is_some());

        store.insert_membership(&pending(1, 11)).await.unwrap();
        assert!(store.decline_membership(1, 11).await.unwrap());
        assert!(store.get_membership(1, 11).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_membership_idempotent() {
        let store = make_store().await;
        store.insert_membership(&pending(1, 10)).await.unwrap();
        assert!(store.delete_membership(1, 10).await.unwrap());
        assert!(!store.delete_membership(1, 10).await.unwrap());
    }

    #[tokio::test]
    async fn group_deletion_cascades() {
        let store = make_store().await;
        let g = store.create_group(1, "News").await.unwrap();
        for cid in [10, 11, 12] {
            store.insert_membership(&pending(g.id, cid)).await.unwrap();
            store.accept_membership(g.id, cid).await.unwrap();
        }

        store.delete_group(g.id).await.unwrap();

        assert!(store.get_group(g.id).await.unwrap().is_none());
        for cid in [10, 11, 12] {
            assert!(store.get_membership(g.id, cid).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn channel_lookup_only_accepted() {
        let store = make_store().await;
        store.insert_membership(&pending(1, 10)).await.unwrap();
        store.insert_membership(&pending(2, 10)).await.unwrap();
        store.accept_membership(1, 10).await.unwrap();

        let ms = store.accepted_memberships_for_channel(10).await.unwrap();
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].group_id, 1);
    }
}

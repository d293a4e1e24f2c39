//! Fan-out engine.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use {
    crossfeed_gateway::{Gateway, PostEvent},
    crossfeed_store::{Result, Store},
};

use crate::coalescer::AlbumCoalescer;

/// Relay tunables.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Debounce window for album coalescing, measured from the first part.
    pub album_window: Duration,
    /// Upper bound on a single target delivery, so one unreachable channel
    /// cannot stall the rest of the fan-out.
    pub deliver_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            album_window: Duration::from_millis(2500),
            deliver_timeout: Duration::from_secs(10),
        }
    }
}

/// One failed (target, part) delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub target_channel_id: i64,
    pub message_id: i32,
    pub reason: String,
}

/// Per-post fan-out outcome: which targets were resolved and what happened
/// per delivery. Failures are data here, never control flow — one bad target
/// does not stop the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Deduplicated targets, source excluded.
    pub targets: Vec<i64>,
    /// Number of album parts (1 for a plain post).
    pub parts: usize,
    /// Successful (target, part) deliveries.
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

/// Subscribes to post events, resolves fan-out targets through the store and
/// delivers through the gateway, coalescing album parts first.
pub struct RelayEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn Gateway>,
    coalescer: AlbumCoalescer,
    deliver_timeout: Duration,
}

impl RelayEngine {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn Gateway>, config: RelayConfig) -> Self {
        Self {
            store,
            gateway,
            coalescer: AlbumCoalescer::new(config.album_window),
            deliver_timeout: config.deliver_timeout,
        }
    }

    /// Handle one inbound post event.
    ///
    /// Non-album posts fan out immediately. Album parts are buffered; the
    /// flush owner's call performs the fan-out for the whole album and the
    /// other parts' calls return `None`.
    pub async fn handle_post(&self, post: PostEvent) -> Result<Option<DeliveryReport>> {
        if post.album_id.is_none() {
            return Ok(Some(self.fan_out(vec![post]).await?));
        }
        match self.coalescer.push(post).await {
            Some(parts) => Ok(Some(self.fan_out(parts).await?)),
            None => Ok(None),
        }
    }

    /// Deliver `parts` (already in sequence order, all from one source
    /// channel) to every other accepted member channel of the source's
    /// groups, exactly once per target per part.
    async fn fan_out(&self, parts: Vec<PostEvent>) -> Result<DeliveryReport> {
        let Some(first) = parts.first() else {
            return Ok(DeliveryReport::default());
        };
        let source = first.channel_id;

        let targets = self.resolve_targets(source).await?;
        if targets.is_empty() {
            debug!(source, "post has no fan-out targets");
            return Ok(DeliveryReport {
                parts: parts.len(),
                ..DeliveryReport::default()
            });
        }

        let mut report = DeliveryReport {
            targets: targets.clone(),
            parts: parts.len(),
            ..DeliveryReport::default()
        };

        // Per-target order must follow part order, so parts are the outer
        // loop. Each delivery is its own independently-timed unit of work.
        for part in &parts {
            for &target in &targets {
                match self.deliver(source, target, part.message_id).await {
                    Ok(()) => report.delivered += 1,
                    Err(reason) => {
                        warn!(
                            source,
                            target,
                            message_id = part.message_id,
                            %reason,
                            "delivery failed"
                        );
                        report.failures.push(DeliveryFailure {
                            target_channel_id: target,
                            message_id: part.message_id,
                            reason,
                        });
                    },
                }
            }
        }

        info!(
            source,
            targets = report.targets.len(),
            parts = report.parts,
            delivered = report.delivered,
            failed = report.failures.len(),
            "fan-out complete"
        );
        Ok(report)
    }

    /// Union of the accepted members of every group the source belongs to,
    /// deduplicated, with the source itself excluded. A channel sharing two
    /// groups with the source receives exactly one copy per post.
    async fn resolve_targets(&self, source: i64) -> Result<Vec<i64>> {
        let mut targets = BTreeSet::new();
        for membership in self.store.accepted_memberships_for_channel(source).await? {
            for peer in self
                .store
                .accepted_memberships_in_group(membership.group_id)
                .await?
            {
                if peer.channel_id != source {
                    targets.insert(peer.channel_id);
                }
            }
        }
        Ok(targets.into_iter().collect())
    }

    async fn deliver(
        &self,
        source: i64,
        target: i64,
        message_id: i32,
    ) -> std::result::Result<(), String> {
        match timeout(
            self.deliver_timeout,
            self.gateway.deliver_content(source, target, message_id),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("delivery timed out".to_string()),
        }
    }
}

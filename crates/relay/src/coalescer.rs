//! Album coalescing.
//!
//! Album parts arrive as a rapid burst of separate post events. Naive
//! per-event fan-out would interleave partial albums at the targets, so
//! parts are buffered per album id and flushed together after a debounce
//! window measured from the first part.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use crossfeed_gateway::PostEvent;

/// Buffers album parts until the debounce window closes.
///
/// The task that opens an album's buffer becomes the flush owner: it sleeps
/// through the window, then takes the buffer and returns the parts sorted by
/// sequence id. Every later part of the same album appends and returns
/// immediately. The map mutex is only held for synchronous edits, never
/// across the sleep, so unrelated albums proceed fully in parallel.
pub struct AlbumCoalescer {
    window: Duration,
    pending: Mutex<HashMap<String, Vec<PostEvent>>>,
}

impl AlbumCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Add an album part. Returns the complete, ordered album iff the caller
    /// is the flush owner; `None` means another task will flush it.
    pub async fn push(&self, part: PostEvent) -> Option<Vec<PostEvent>> {
        let album_id = part.album_id.clone()?;

        let is_owner = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let buffer = pending.entry(album_id.clone()).or_default();
            buffer.push(part);
            buffer.len() == 1
        };
        if !is_owner {
            return None;
        }

        tokio::time::sleep(self.window).await;

        let mut parts = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&album_id).unwrap_or_default()
        };
        parts.sort_by_key(|p| p.sequence_id);
        Some(parts)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn part(album: &str, seq: i64) -> PostEvent {
        PostEvent {
            channel_id: -100,
            message_id: seq as i32,
            album_id: Some(album.to_string()),
            sequence_id: seq,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn parts_within_window_flush_together_in_order() {
        let coalescer = Arc::new(AlbumCoalescer::new(Duration::from_millis(2500)));

        let owner = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.push(part("a", 2)).await })
        };
        // Let the owner open the buffer before the later parts arrive.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(coalescer.push(part("a", 3)).await, None);
        assert_eq!(coalescer.push(part("a", 1)).await, None);

        let flushed = owner.await.unwrap().unwrap();
        let seqs: Vec<i64> = flushed.iter().map(|p| p.sequence_id).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn lone_part_flushes_alone() {
        let coalescer = AlbumCoalescer::new(Duration::from_millis(2500));
        let flushed = coalescer.push(part("solo", 1)).await.unwrap();
        assert_eq!(flushed.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn window_measured_from_first_part() {
        let coalescer = Arc::new(AlbumCoalescer::new(Duration::from_millis(1000)));

        let owner = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.push(part("a", 1)).await })
        };
        tokio::task::yield_now().await;
        // A part arriving late does not extend the window; a part arriving
        // after the flush opens a fresh buffer.
        tokio::time::advance(Duration::from_millis(900)).await;
        assert_eq!(coalescer.push(part("a", 2)).await, None);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(owner.await.unwrap().unwrap().len(), 2);

        let late = coalescer.push(part("a", 3)).await.unwrap();
        assert_eq!(late.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn albums_do_not_block_each_other() {
        let coalescer = Arc::new(AlbumCoalescer::new(Duration::from_millis(1000)));

        let a = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.push(part("a", 1)).await })
        };
        let b = {
            let c = Arc::clone(&coalescer);
            tokio::spawn(async move { c.push(part("b", 1)).await })
        };

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap().unwrap()[0].album_id.as_deref(), Some("a"));
        assert_eq!(b.unwrap().unwrap()[0].album_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn non_album_part_is_rejected() {
        let coalescer = AlbumCoalescer::new(Duration::from_millis(1));
        let post = PostEvent {
            channel_id: -100,
            message_id: 1,
            album_id: None,
            sequence_id: 0,
        };
        assert_eq!(coalescer.push(post).await, None);
    }
}

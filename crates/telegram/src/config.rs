use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for the crossfeed bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Album debounce window in milliseconds, measured from the first part.
    pub album_window_ms: u64,

    /// Per-target delivery timeout in milliseconds.
    pub deliver_timeout_ms: u64,

    /// Backoff after a failed getUpdates call, in seconds.
    pub poll_backoff_secs: u64,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("album_window_ms", &self.album_window_ms)
            .field("deliver_timeout_ms", &self.deliver_timeout_ms)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            album_window_ms: 2500,
            deliver_timeout_ms: 10_000,
            poll_backoff_secs: 5,
        }
    }
}

impl BotConfig {
    #[must_use]
    pub fn relay_config(&self) -> crossfeed_relay::RelayConfig {
        crossfeed_relay::RelayConfig {
            album_window: std::time::Duration::from_millis(self.album_window_ms),
            deliver_timeout: std::time::Duration::from_millis(self.deliver_timeout_ms),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.album_window_ms, 2500);
        assert_eq!(cfg.deliver_timeout_ms, 10_000);
        assert_eq!(cfg.poll_backoff_secs, 5);
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "token": "123:ABC",
            "album_window_ms": 3000
        }"#;
        let cfg: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.album_window_ms, 3000);
        // defaults for unspecified fields
        assert_eq!(cfg.deliver_timeout_ms, 10_000);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = BotConfig {
            token: Secret::new("123:ABC".into()),
            ..Default::default()
        };
        assert!(!format!("{cfg:?}").contains("ABC"));
    }
}

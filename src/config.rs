//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The rule table is either the built-in
//! one or a JSON array read from `RULES_PATH`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::Rule;
use crate::error::WatchError;
use crate::feed::messages::SubscribeOptions;
use crate::service::{FeedClosePolicy, WatcherSettings};

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`WatchConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Websocket endpoint of the log-subscription feed.
    pub feed_ws_url: String,

    /// Commitment level requested on every subscription.
    pub feed_commitment: String,

    /// Optional encoding hint (`jsonParsed`).
    pub feed_encoding: Option<String>,

    /// Per-subscription signal queue capacity.
    pub feed_queue_capacity: usize,

    /// Reaction to a remote close of a subscription.
    pub feed_close_policy: FeedClosePolicy,

    /// Liveness probe interval, already clamped to 50–180 s.
    pub heartbeat_interval: Duration,

    /// Log substrings that denote a mint initialization.
    pub mint_markers: Vec<String>,

    /// Maximum number of remembered transaction signatures.
    pub signature_cache_capacity: usize,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Telegram bot token. `None` disables polling and delivery.
    pub bot_token: Option<String>,

    /// Telegram Bot API base URL.
    pub telegram_api_url: String,

    /// Long-poll timeout for `getUpdates`, in seconds.
    pub telegram_poll_timeout_secs: u64,

    /// Chat allowed to issue operator commands.
    pub operator_chat_id: Option<i64>,

    /// Block explorer base URL used in notifications.
    pub explorer_url: String,

    /// Active rule table, in evaluation order.
    pub rules: Vec<Rule>,

    /// Master switch for the audit trail.
    pub audit_enabled: bool,

    /// File the audit trail is appended to when no database is set.
    pub audit_log_path: PathBuf,

    /// PostgreSQL connection string for the audit trail.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,
}

impl WatchConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR`, `FEED_CLOSE_POLICY` or
    /// `OPERATOR_CHAT_ID` is set but malformed, or if the rule table cannot
    /// be loaded.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`WatchConfig::from_env`].
    pub fn from_lookup<F>(vars: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = vars("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        let feed_ws_url = vars("FEED_WS_URL").unwrap_or_else(|| "wss://rpc.helius.xyz".to_string());
        let feed_commitment = vars("FEED_COMMITMENT").unwrap_or_else(|| "confirmed".to_string());
        let feed_encoding = non_empty(vars("FEED_ENCODING"));
        let feed_queue_capacity = parse_env(&vars, "FEED_QUEUE_CAPACITY", 256_usize).max(1);
        let feed_close_policy = match non_empty(vars("FEED_CLOSE_POLICY")) {
            Some(raw) => raw.parse()?,
            None => FeedClosePolicy::default(),
        };

        let heartbeat_interval = WatcherSettings::clamp_heartbeat(Duration::from_secs(parse_env(
            &vars,
            "HEARTBEAT_INTERVAL_SECS",
            50,
        )));
        let mint_markers = match non_empty(vars("MINT_MARKERS")).map(|raw| split_list(&raw)) {
            Some(markers) if !markers.is_empty() => markers,
            Some(_) => {
                tracing::warn!("MINT_MARKERS lists no marker, using defaults");
                WatcherSettings::default().mint_markers
            }
            None => WatcherSettings::default().mint_markers,
        };
        let signature_cache_capacity = parse_env(&vars, "SIGNATURE_CACHE_CAPACITY", 100_000);
        let event_bus_capacity = parse_env(&vars, "EVENT_BUS_CAPACITY", 10_000);

        let bot_token = non_empty(vars("BOT_TOKEN"));
        let telegram_api_url =
            vars("TELEGRAM_API_URL").unwrap_or_else(|| "https://api.telegram.org".to_string());
        let telegram_poll_timeout_secs = parse_env(&vars, "TELEGRAM_POLL_TIMEOUT_SECS", 30);
        let operator_chat_id = match non_empty(vars("OPERATOR_CHAT_ID")) {
            Some(raw) => Some(raw.trim().parse::<i64>()?),
            None => None,
        };
        let explorer_url = vars("EXPLORER_URL").unwrap_or_else(|| "https://solscan.io".to_string());

        let rules = match non_empty(vars("RULES_PATH")) {
            Some(path) => load_rules(Path::new(&path))?,
            None => builtin_rules(&vars),
        };

        let audit_enabled = parse_env_bool(&vars, "AUDIT_ENABLED", true);
        let audit_log_path = PathBuf::from(
            vars("AUDIT_LOG_PATH").unwrap_or_else(|| "watch-audit.log".to_string()),
        );
        let database_url = non_empty(vars("DATABASE_URL"));
        let database_max_connections = parse_env(&vars, "DATABASE_MAX_CONNECTIONS", 5);

        Ok(Self {
            listen_addr,
            feed_ws_url,
            feed_commitment,
            feed_encoding,
            feed_queue_capacity,
            feed_close_policy,
            heartbeat_interval,
            mint_markers,
            signature_cache_capacity,
            event_bus_capacity,
            bot_token,
            telegram_api_url,
            telegram_poll_timeout_secs,
            operator_chat_id,
            explorer_url,
            rules,
            audit_enabled,
            audit_log_path,
            database_url,
            database_max_connections,
        })
    }

    /// Watcher tuning derived from this configuration.
    #[must_use]
    pub fn watcher_settings(&self) -> WatcherSettings {
        WatcherSettings {
            heartbeat_interval: self.heartbeat_interval,
            mint_markers: self.mint_markers.clone(),
            close_policy: self.feed_close_policy,
        }
    }

    /// Subscription options sent with every `logsSubscribe`.
    #[must_use]
    pub fn subscribe_options(&self) -> SubscribeOptions {
        SubscribeOptions {
            commitment: self.feed_commitment.clone(),
            encoding: self.feed_encoding.clone(),
        }
    }
}

/// Reads a JSON array of rules from `path`.
///
/// # Errors
///
/// Returns [`WatchError::InvalidRule`] if the file cannot be read or is not
/// a valid rule array.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, WatchError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| WatchError::InvalidRule(format!("{}: {e}", path.display())))?;
    parse_rules(&raw)
}

/// Parses a JSON array of rules.
///
/// # Errors
///
/// Returns [`WatchError::InvalidRule`] on malformed JSON.
pub fn parse_rules(raw: &str) -> Result<Vec<Rule>, WatchError> {
    serde_json::from_str(raw).map_err(|e| WatchError::InvalidRule(format!("rules file: {e}")))
}

/// The two stock rules. A rule whose destination chat variable is unset
/// is left out.
fn builtin_rules<F>(vars: &F) -> Vec<Rule>
where
    F: Fn(&str) -> Option<String>,
{
    let stock = [
        ("Кукоин 1", "Кукоин Биржа · SOL", "99.99", 20, true, "KUCOIN1_CHAT_ID"),
        ("Бинанс 99", "Кукоин 50 · SOL", "68.99", 6, false, "BINANCE99_CHAT_ID"),
    ];
    stock
        .into_iter()
        .filter_map(|(label, match_text, amount, hours, announce, chat_key)| {
            let Some(channel) = non_empty(vars(chat_key)) else {
                tracing::warn!(rule = label, key = chat_key, "destination chat not set; rule disabled");
                return None;
            };
            Some(Rule {
                label: label.to_string(),
                match_text: match_text.to_string(),
                amount: amount.to_string(),
                timeout_hours: hours,
                announce_armed: announce,
                notify_channel: channel,
            })
        })
        .collect()
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<F, T>(vars: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    vars(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool<F>(vars: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match vars(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> WatchConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let Ok(config) = WatchConfig::from_lookup(|key| map.get(key).cloned()) else {
            panic!("config rejected");
        };
        config
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = config(&[]);
        assert_eq!(c.listen_addr.port(), 3000);
        assert_eq!(c.feed_ws_url, "wss://rpc.helius.xyz");
        assert_eq!(c.feed_commitment, "confirmed");
        assert_eq!(c.feed_encoding, None);
        assert_eq!(c.feed_close_policy, FeedClosePolicy::Terminate);
        assert_eq!(c.heartbeat_interval, Duration::from_secs(50));
        assert_eq!(c.mint_markers, vec!["InitializeMint2", "InitializeMint"]);
        assert_eq!(c.signature_cache_capacity, 100_000);
        assert!(c.bot_token.is_none());
        assert!(c.audit_enabled);
        assert!(c.database_url.is_none());
        assert!(c.rules.is_empty());
    }

    #[test]
    fn builtin_rules_follow_chat_variables() {
        let c = config(&[("KUCOIN1_CHAT_ID", "-1001"), ("BINANCE99_CHAT_ID", "-1002")]);
        assert_eq!(c.rules.len(), 2);
        let (Some(first), Some(second)) = (c.rules.first(), c.rules.get(1)) else {
            panic!("missing rules");
        };
        assert_eq!(first.timeout_hours, 20);
        assert!(first.announce_armed);
        assert_eq!(first.notify_channel, "-1001");
        assert_eq!(second.amount, "68.99");
        assert!(!second.announce_armed);
        assert!(c.rules.iter().all(|r| r.validate().is_ok()));
    }

    #[test]
    fn heartbeat_is_clamped_and_markers_split() {
        let c = config(&[
            ("HEARTBEAT_INTERVAL_SECS", "10"),
            ("MINT_MARKERS", " InitializeMint2 , ,Foo"),
        ]);
        assert_eq!(c.heartbeat_interval, Duration::from_secs(50));
        assert_eq!(c.mint_markers, vec!["InitializeMint2", "Foo"]);

        let c = config(&[("MINT_MARKERS", " , ,")]);
        assert_eq!(c.mint_markers, WatcherSettings::default().mint_markers);

        let c = config(&[("HEARTBEAT_INTERVAL_SECS", "900")]);
        assert_eq!(c.heartbeat_interval, Duration::from_secs(180));
    }

    #[test]
    fn malformed_values_are_rejected_or_defaulted() {
        let map: HashMap<&str, &str> = HashMap::from([("FEED_CLOSE_POLICY", "forever")]);
        assert!(WatchConfig::from_lookup(|k| map.get(k).map(|v| (*v).to_string())).is_err());

        let map: HashMap<&str, &str> = HashMap::from([("OPERATOR_CHAT_ID", "abc")]);
        assert!(WatchConfig::from_lookup(|k| map.get(k).map(|v| (*v).to_string())).is_err());

        let c = config(&[("FEED_QUEUE_CAPACITY", "lots"), ("AUDIT_ENABLED", "FALSE")]);
        assert_eq!(c.feed_queue_capacity, 256);
        assert!(!c.audit_enabled);
    }

    #[test]
    fn rules_load_from_json_file() {
        let Ok(mut file) = tempfile::NamedTempFile::new() else {
            panic!("tempfile");
        };
        let json = r#"[{"label":"desk","match_text":"Desk · SOL","amount":"10.5",
            "timeout_hours":2,"notify_channel":"-42"}]"#;
        let Ok(()) = file.write_all(json.as_bytes()) else {
            panic!("write");
        };
        let Some(path) = file.path().to_str() else {
            panic!("non-utf8 temp path");
        };
        let c = config(&[("RULES_PATH", path)]);
        assert_eq!(c.rules.len(), 1);
        let Some(rule) = c.rules.first() else {
            panic!("no rule");
        };
        assert_eq!(rule.label, "desk");
        assert!(rule.announce_armed);
    }

    #[test]
    fn malformed_rules_are_errors() {
        assert!(parse_rules("{not json").is_err());
        assert!(load_rules(Path::new("/definitely/not/here.json")).is_err());
    }
}

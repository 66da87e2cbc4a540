//! Application configuration loaded from environment variables.

use domain::UserIdentity;
use projections::DEFAULT_MAX_RETRIES;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for structured logs, anything else for text
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `PUBSUB_NAME` / `PUBSUB_TOPIC`: subscription registered with the
///   sidecar (default: `"eventsource"` / `"transactions"`)
/// - `DEFAULT_USER_ID` / `DEFAULT_USERNAME`: identity assumed for accounts
///   with no registered owner (default: `1` / `"test_user"`, also used when
///   the ID does not parse); set `DEFAULT_USER_ID=none` to reject unknown
///   accounts instead
/// - `PROJECTION_MAX_RETRIES`: attempts per transaction on a contended
///   account (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub pubsub_name: String,
    pub pubsub_topic: String,
    pub default_user: Option<UserIdentity>,
    pub max_retries: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_user = match lookup("DEFAULT_USER_ID").as_deref() {
            Some("none") => None,
            id => id
                .and_then(|id| id.parse::<i64>().ok())
                .map(|user_id| UserIdentity::new(user_id, "test_user"))
                .or(defaults.default_user)
                .map(|user| match lookup("DEFAULT_USERNAME") {
                    Some(username) => UserIdentity::new(user.user_id, username),
                    None => user,
                }),
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            pubsub_name: lookup("PUBSUB_NAME").unwrap_or(defaults.pubsub_name),
            pubsub_topic: lookup("PUBSUB_TOPIC").unwrap_or(defaults.pubsub_topic),
            default_user,
            max_retries: lookup("PROJECTION_MAX_RETRIES")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            pubsub_name: "eventsource".to_string(),
            pubsub_topic: "transactions".to_string(),
            default_user: Some(UserIdentity::new(1, "test_user")),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

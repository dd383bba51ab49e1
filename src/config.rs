//! Feed configuration.
//!
//! The config file is a JSON array, one object per feed/destination pair:
//!
//! ```json
//! [
//!   {
//!     "source_name": "@rustlang",
//!     "source_rss": "https://nitter.example/rustlang/rss",
//!     "destination_webhook": "https://discord.com/api/webhooks/…",
//!     "username": "optional",
//!     "password": "optional",
//!     "last_entries": 5,
//!     "message_style": "digest",
//!     "escape_markdown": false
//!   }
//! ]
//! ```
//!
//! Only the first three fields are required.  Array order is processing
//! order.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::format::MessageStyle;
use crate::history::{StorageKey, MAX_KEY_LEN};

/// How many of the newest feed entries are considered each cycle.
pub const DEFAULT_LAST_ENTRIES: usize = 5;

/// One feed/destination pair.
#[derive(Clone, Deserialize)]
pub struct FeedConfig {
    /// Display name; also the basis of the history [`StorageKey`].
    pub source_name: String,
    /// Feed URL to poll.
    pub source_rss: String,
    /// Webhook that receives one message per new entry.
    pub destination_webhook: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_last_entries")]
    pub last_entries: usize,
    #[serde(default)]
    pub message_style: MessageStyle,
    #[serde(default)]
    pub escape_markdown: bool,
}

fn default_last_entries() -> usize {
    DEFAULT_LAST_ENTRIES
}

impl FeedConfig {
    /// Basic-auth credentials, present only when both halves are non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some(Credentials {
                username: user.to_string(),
                password: pass.to_string(),
            }),
            _ => None,
        }
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::from_source_name(&self.source_name)
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            index,
            reason: reason.to_string(),
        };

        if self.source_name.trim().is_empty() {
            return Err(invalid("source_name is empty"));
        }
        if self.source_rss.trim().is_empty() {
            return Err(invalid("source_rss is empty"));
        }
        if self.destination_webhook.trim().is_empty() {
            return Err(invalid("destination_webhook is empty"));
        }
        if self.last_entries == 0 {
            return Err(invalid("last_entries must be at least 1"));
        }
        if self.storage_key().as_str().len() > MAX_KEY_LEN {
            return Err(invalid(&format!(
                "source_name is too long for a history file name (max {MAX_KEY_LEN} bytes)"
            )));
        }
        Ok(())
    }
}

// Webhook URLs embed a token and passwords are secrets; keep both out of
// debug logs.
impl fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedConfig")
            .field("source_name", &self.source_name)
            .field("source_rss", &self.source_rss)
            .field("destination_webhook", &"<redacted>")
            .field("credentials", &self.credentials())
            .field("last_entries", &self.last_entries)
            .field("message_style", &self.message_style)
            .field("escape_markdown", &self.escape_markdown)
            .finish()
    }
}

/// Username and password for HTTP basic auth on a feed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse and validate a config document.
pub fn parse_configs(text: &str, path: &Path) -> Result<Vec<FeedConfig>, ConfigError> {
    let configs: Vec<FeedConfig> =
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (index, config) in configs.iter().enumerate() {
        config.validate(index)?;
    }
    warn_on_key_collisions(&configs);

    Ok(configs)
}

/// Read, parse and validate the config file at `path`.
pub fn load_configs(path: &Path) -> Result<Vec<FeedConfig>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_configs(&text, path)
}

/// Distinct source names that normalise to the same key would share one
/// history file.  That is allowed but almost certainly a mistake.
fn warn_on_key_collisions(configs: &[FeedConfig]) -> Vec<StorageKey> {
    let mut owners: HashMap<StorageKey, &str> = HashMap::new();
    let mut collisions = Vec::new();

    for config in configs {
        let key = config.storage_key();
        match owners.get(&key) {
            Some(first) if *first != config.source_name => {
                warn!(
                    "Sources {:?} and {:?} share history key {}",
                    first, config.source_name, key
                );
                collisions.push(key);
            }
            Some(_) => {}
            None => {
                owners.insert(key, &config.source_name);
            }
        }
    }

    collisions
}

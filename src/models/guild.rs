use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::config::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_MESSAGE_FORMAT, DEFAULT_STEAM_ID_ERROR_MESSAGE,
};
use crate::utils::template::MessageTemplate;

/// The named records kept per guild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Format,
    Error,
    Logs,
}

impl ConfigKind {
    /// File stem on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Format => "format",
            ConfigKind::Error => "error",
            ConfigKind::Logs => "logs",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-guild record the config store can load and save
pub trait ConfigRecord: Serialize + DeserializeOwned + Default + Send + Sync {
    const KIND: ConfigKind;
}

/// Appeal channel, exempt roles and the expected message template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub ban_appeal_channel_id: Option<u64>,
    pub whitelisted_roles: BTreeSet<u64>,
    pub message_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            ban_appeal_channel_id: None,
            whitelisted_roles: BTreeSet::new(),
            message_format: DEFAULT_MESSAGE_FORMAT.to_string(),
        }
    }
}

impl ConfigRecord for FormatConfig {
    const KIND: ConfigKind = ConfigKind::Format;
}

impl FormatConfig {
    pub fn template(&self) -> MessageTemplate {
        MessageTemplate::parse(&self.message_format)
    }

    pub fn is_appeal_channel(&self, channel_id: u64) -> bool {
        self.ban_appeal_channel_id == Some(channel_id)
    }

    /// Whether any of the given roles exempts its holder
    pub fn is_whitelisted<'a>(&self, roles: impl IntoIterator<Item = &'a u64>) -> bool {
        roles
            .into_iter()
            .any(|role| self.whitelisted_roles.contains(role))
    }
}

/// Texts sent to authors of rejected appeals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    pub error_message: String,
    pub steam_id_error_message: String,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            steam_id_error_message: DEFAULT_STEAM_ID_ERROR_MESSAGE.to_string(),
        }
    }
}

impl ConfigRecord for ErrorConfig {
    const KIND: ConfigKind = ConfigKind::Error;
}

/// Where rejections get reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogsConfig {
    pub log_channel_id: Option<u64>,
}

impl ConfigRecord for LogsConfig {
    const KIND: ConfigKind = ConfigKind::Logs;
}

// Centralized configuration for Appeal Gate

use std::env;
use std::path::PathBuf;

/// Template used until a guild picks its own
pub const DEFAULT_MESSAGE_FORMAT: &str = "AC Driver Name:\nSteam ID:\nDetails:";

/// Label that marks the template line carrying the Steam ID
pub const STEAM_ID_LABEL: &str = "Steam ID";

/// Generic format error appended to the rejection notice
pub const DEFAULT_ERROR_MESSAGE: &str = "To use line breaks in Discord, use Shift + Enter.\n\
    You can find your Steam ID at https://steamidfinder.com/ (provide SteamID64 (Dec)) or in the Content Manager. \
    Go to Settings > Content Manager > General, and then in front of Steam Profile, you should be able to get your Steam ID.";

/// Sent when the format is fine but the Steam ID is not
pub const DEFAULT_STEAM_ID_ERROR_MESSAGE: &str = "Your Steam ID is not valid. Please provide a valid SteamID64 (a 17-digit number starting with '7656').\n\
    You can find your Steam ID at https://steamidfinder.com/ (provide SteamID64 (Dec)) or in the Content Manager. \
    Go to Settings > Content Manager > General, and then in front of Steam Profile, you should be able to get your Steam ID.";

/// Discord rejects message content above this many characters
pub const MESSAGE_CHAR_LIMIT: usize = 2000;

/// Interaction tokens die after 15 minutes, and the wizard with them
pub const WIZARD_SESSION_TTL_MINUTES: i64 = 15;

/// Discord embed colors
pub mod colors {
    pub const PRIMARY: u32 = 0x3498db;
    pub const SUCCESS: u32 = 0x2ecc71;
    pub const INFO: u32 = 0x3498db;
}

/// Process settings read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub config_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = env::var("DISCORD_TOKEN")
            .or_else(|_| env::var("DISCORD_BOT_TOKEN"))
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?;

        let config_dir = env::var("APPEAL_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        Ok(Self { token, config_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_has_steam_id_line() {
        assert!(DEFAULT_MESSAGE_FORMAT
            .lines()
            .any(|line| line.starts_with(STEAM_ID_LABEL)));
    }

    #[test]
    fn test_default_texts_fit_in_a_message() {
        assert!(DEFAULT_ERROR_MESSAGE.len() < MESSAGE_CHAR_LIMIT);
        assert!(DEFAULT_STEAM_ID_ERROR_MESSAGE.len() < MESSAGE_CHAR_LIMIT);
    }
}

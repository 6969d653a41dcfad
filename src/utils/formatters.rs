// Formatting utilities

use crate::utils::config::MESSAGE_CHAR_LIMIT;

/// Truncate string to at most `max_chars` characters, ending in "..."
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Clamp text to what Discord accepts in a single message
pub fn fit_message(s: &str) -> String {
    truncate(s, MESSAGE_CHAR_LIMIT)
}

/// `<@id>`
pub fn user_mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// `<#id>`, or "Not set"
pub fn channel_mention(channel_id: Option<u64>) -> String {
    channel_id
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "Not set".to_string())
}

/// Parse a role id as typed by an admin: a bare id or a `<@&id>` mention
pub fn parse_role_id(token: &str) -> Option<u64> {
    let raw = token
        .strip_prefix("<@&")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(token);
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}

/// Wrap text in a code block
pub fn code_block(s: &str) -> String {
    format!("```\n{}\n```", s)
}

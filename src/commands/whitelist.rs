// Whitelist commands - add or remove roles exempt from appeal checks

use std::collections::HashMap;

use tracing::{error, info};

use crate::models::guild::FormatConfig;
use crate::utils::formatters::parse_role_id;
use crate::{Context, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistAction {
    Add,
    Remove,
}

/// Per-role outcome of one command run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistReport {
    /// Added or removed, by role name
    pub changed: Vec<String>,
    /// Already whitelisted (add) or not in the whitelist (remove), by role name
    pub unchanged: Vec<String>,
    /// Input that isn't a role of this guild, as typed
    pub invalid: Vec<String>,
}

impl WhitelistReport {
    pub fn render(&self, action: WhitelistAction) -> String {
        let (changed, unchanged) = match action {
            WhitelistAction::Add => ("✅ Added roles", "ℹ️ Already whitelisted"),
            WhitelistAction::Remove => ("✅ Removed roles", "ℹ️ Not in whitelist"),
        };

        let mut lines = Vec::new();
        if !self.changed.is_empty() {
            lines.push(format!("{}: {}", changed, self.changed.join(", ")));
        }
        if !self.unchanged.is_empty() {
            lines.push(format!("{}: {}", unchanged, self.unchanged.join(", ")));
        }
        if !self.invalid.is_empty() {
            lines.push(format!("❌ Invalid role IDs: {}", self.invalid.join(", ")));
        }

        if lines.is_empty() {
            "No role IDs given.".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Apply space-separated role ids to the whitelist.
///
/// `resolve` maps a role id to its name, or None if the guild has no such role.
pub fn apply_whitelist(
    config: &mut FormatConfig,
    action: WhitelistAction,
    input: &str,
    resolve: impl Fn(u64) -> Option<String>,
) -> WhitelistReport {
    let mut report = WhitelistReport::default();

    for token in input.split_whitespace() {
        let resolved = parse_role_id(token).and_then(|id| resolve(id).map(|name| (id, name)));
        let (role_id, name) = match resolved {
            Some(found) => found,
            None => {
                report.invalid.push(token.to_string());
                continue;
            }
        };

        let changed = match action {
            WhitelistAction::Add => config.whitelisted_roles.insert(role_id),
            WhitelistAction::Remove => config.whitelisted_roles.remove(&role_id),
        };

        if changed {
            report.changed.push(name);
        } else {
            report.unchanged.push(name);
        }
    }

    report
}

async fn run(ctx: Context<'_>, action: WhitelistAction, roles: String) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    ctx.defer_ephemeral().await?;

    let cached: Option<HashMap<u64, String>> = ctx.guild().map(|guild| {
        guild
            .roles
            .iter()
            .map(|(id, role)| (id.get(), role.name.clone()))
            .collect()
    });
    let role_names = match cached {
        Some(names) => names,
        None => guild_id
            .roles(ctx.http())
            .await?
            .into_iter()
            .map(|(id, role)| (id.get(), role.name))
            .collect(),
    };

    let result = ctx
        .data()
        .store
        .update(guild_id.get(), |config: &mut FormatConfig| {
            apply_whitelist(config, action, &roles, |id| role_names.get(&id).cloned())
        })
        .await;

    let content = match result {
        Ok(report) => {
            info!("Guild {} whitelist {:?}: {:?}", guild_id, action, report);
            report.render(action)
        }
        Err(e) => {
            error!("Failed to update whitelist for guild {}: {:?}", guild_id, e);
            "Failed to save configuration.".to_string()
        }
    };

    ctx.send(poise::CreateReply::default().content(content).ephemeral(true))
        .await?;

    Ok(())
}

/// Add roles to the whitelist
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn add_roles(
    ctx: Context<'_>,
    #[description = "Role IDs to whitelist, separated by spaces"] roles: String,
) -> Result<(), Error> {
    run(ctx, WhitelistAction::Add, roles).await
}

/// Remove roles from the whitelist
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn remove_roles(
    ctx: Context<'_>,
    #[description = "Role IDs to remove, separated by spaces"] roles: String,
) -> Result<(), Error> {
    run(ctx, WhitelistAction::Remove, roles).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild_roles(id: u64) -> Option<String> {
        match id {
            10 => Some("Moderator".to_string()),
            20 => Some("Admin".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_add_reports_each_role() {
        let mut config = FormatConfig::default();
        config.whitelisted_roles.insert(20);

        let report = apply_whitelist(&mut config, WhitelistAction::Add, "10 20 abc 99", guild_roles);
        assert_eq!(report.changed, vec!["Moderator"]);
        assert_eq!(report.unchanged, vec!["Admin"]);
        assert_eq!(report.invalid, vec!["abc", "99"]);
        assert_eq!(
            report.render(WhitelistAction::Add),
            "✅ Added roles: Moderator\nℹ️ Already whitelisted: Admin\n❌ Invalid role IDs: abc, 99"
        );
    }

    #[test]
    fn test_re_adding_does_not_duplicate() {
        let mut config = FormatConfig::default();
        apply_whitelist(&mut config, WhitelistAction::Add, "10", guild_roles);
        let report = apply_whitelist(&mut config, WhitelistAction::Add, "10 <@&10>", guild_roles);

        assert!(report.changed.is_empty());
        assert_eq!(report.unchanged, vec!["Moderator", "Moderator"]);
        assert_eq!(config.whitelisted_roles.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut config = FormatConfig::default();
        config.whitelisted_roles.insert(10);

        let report = apply_whitelist(&mut config, WhitelistAction::Remove, "10 20", guild_roles);
        assert_eq!(report.changed, vec!["Moderator"]);
        assert_eq!(report.unchanged, vec!["Admin"]);
        assert!(config.whitelisted_roles.is_empty());
        assert_eq!(
            report.render(WhitelistAction::Remove),
            "✅ Removed roles: Moderator\nℹ️ Not in whitelist: Admin"
        );
    }

    #[test]
    fn test_empty_input() {
        let mut config = FormatConfig::default();
        let report = apply_whitelist(&mut config, WhitelistAction::Add, "   ", guild_roles);
        assert_eq!(report.render(WhitelistAction::Add), "No role IDs given.");
    }
}

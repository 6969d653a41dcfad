use poise::serenity_prelude as serenity;
use tracing::error;

use crate::models::guild::{ErrorConfig, FormatConfig, LogsConfig};
use crate::utils::config::colors;
use crate::utils::formatters::{channel_mention, code_block, truncate};
use crate::{Context, Error};

/// Embed field values are capped at 1024 characters
const FIELD_LIMIT: usize = 1024;

/// Inspect the appeal gate configuration
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR",
    subcommands("show")
)]
pub async fn config(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current configuration
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(id) => id.get(),
        None => {
            ctx.say("This command can only be used in a server.").await?;
            return Ok(());
        }
    };

    ctx.defer_ephemeral().await?;
    let store = &ctx.data().store;

    let loaded = async {
        let format: FormatConfig = store.load(guild_id).await?;
        let errors: ErrorConfig = store.load(guild_id).await?;
        let logs: LogsConfig = store.load(guild_id).await?;
        Ok::<_, crate::storage::config_store::StoreError>((format, errors, logs))
    }
    .await;

    let (format, errors, logs) = match loaded {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to fetch config for guild {}: {:?}", guild_id, e);
            ctx.say("Failed to fetch configuration.").await?;
            return Ok(());
        }
    };

    let roles = if format.whitelisted_roles.is_empty() {
        "None".to_string()
    } else {
        format
            .whitelisted_roles
            .iter()
            .map(|id| format!("<@&{}>", id))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let embed = serenity::CreateEmbed::new()
        .title("Appeal Gate Configuration")
        .field("Appeal Channel", channel_mention(format.ban_appeal_channel_id), true)
        .field("Logs Channel", channel_mention(logs.log_channel_id), true)
        .field("Whitelisted Roles", truncate(&roles, FIELD_LIMIT), false)
        .field(
            "Message Format",
            truncate(&code_block(&format.message_format), FIELD_LIMIT),
            false,
        )
        .field(
            "Steam ID Check",
            if format.template().has_identifier_line() { "On" } else { "Off (no Steam ID line)" },
            true,
        )
        .field("Format Error", truncate(&errors.error_message, FIELD_LIMIT), false)
        .field(
            "Steam ID Error",
            truncate(&errors.steam_id_error_message, FIELD_LIMIT),
            false,
        )
        .color(colors::INFO);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

use tracing::{error, info};

use crate::features::setup_wizard::{begin_session, welcome_reply};
use crate::{Context, Error};

/// Start the bot setup process
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?.get();
    let data = ctx.data();

    if let Err(e) = data.store.initialize_guild(guild_id).await {
        error!("Failed to initialize config for guild {}: {:?}", guild_id, e);
        ctx.send(
            poise::CreateReply::default()
                .content("Failed to prepare configuration.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    // A new /setup replaces whatever this admin had in flight
    begin_session(data, guild_id, ctx.author().id.get());
    info!("Setup started in guild {} by {}", guild_id, ctx.author().name);

    ctx.send(welcome_reply()).await?;

    Ok(())
}

// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show help and usage guide
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Appeal Gate - Help")
        .description("Keeps the ban appeal channel in the expected format")
        .color(colors::PRIMARY)
        .field(
            "⚙️ Setup",
            "`/setup` - Pick the appeal channel, message format, whitelisted roles, \
            error message and logs channel\n\
            `/config show` - View current configuration",
            false,
        )
        .field(
            "🏷️ Whitelist",
            "`/add_roles` - Exempt roles from the format check\n\
            `/remove_roles` - Remove roles from the whitelist\n\
            Pass role IDs separated by spaces",
            false,
        )
        .field(
            "📝 Appeals",
            "Messages in the appeal channel must follow the configured format line by line. \
            The Steam ID must be a SteamID64 (17 digits starting with 7656). \
            Rejected appeals are deleted and the author gets a DM explaining why.",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Built with Serenity & Poise",
        ));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;

    Ok(())
}

// Transport-neutral view of an inbound guild message

use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppealMessage {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub author_roles: Vec<u64>,
    pub content: String,
}

impl AppealMessage {
    /// Build from a gateway message. Returns None outside guilds.
    ///
    /// Role ids come from the partial member attached to guild messages; pass
    /// `fallback_roles` when the gateway left it out.
    pub fn from_serenity(msg: &serenity::Message, fallback_roles: Option<&[serenity::RoleId]>) -> Option<Self> {
        let guild_id = msg.guild_id?;
        let roles = msg
            .member
            .as_ref()
            .map(|m| m.roles.as_slice())
            .or(fallback_roles)
            .unwrap_or_default();

        Some(Self {
            guild_id: guild_id.get(),
            channel_id: msg.channel_id.get(),
            message_id: msg.id.get(),
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            author_roles: roles.iter().map(|r| r.get()).collect(),
            content: msg.content.clone(),
        })
    }
}

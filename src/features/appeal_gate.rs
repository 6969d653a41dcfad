// Appeal Gate - enforces the appeal template and Steam ID in the appeal channel
//
// Deciding is pure (`evaluate`); acting on a rejection goes through the
// `AppealModerator` trait so the Discord side stays swappable.

use std::future::Future;

use ::serenity::http::HttpError;
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

use crate::models::appeal::AppealMessage;
use crate::models::guild::{ErrorConfig, FormatConfig, LogsConfig};
use crate::utils::formatters::{fit_message, user_mention};
use crate::utils::steam_id::is_valid_steam_id;
use crate::Data;

/// Why an appeal was taken down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    IncorrectFormat,
    InvalidSteamId,
}

impl RejectionReason {
    fn describe(&self) -> &'static str {
        match self {
            RejectionReason::IncorrectFormat => "incorrect format",
            RejectionReason::InvalidSteamId => "invalid Steam ID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    FromBot,
    NotAppealChannel,
    /// Author holds a whitelisted role
    Exempt,
    Accepted { steam_id: Option<String> },
    Rejected(RejectionReason),
}

/// Run the gate's checks in order: author, channel, whitelist, template, Steam ID
pub fn evaluate(message: &AppealMessage, format: &FormatConfig) -> Verdict {
    if message.author_is_bot {
        return Verdict::FromBot;
    }

    if !format.is_appeal_channel(message.channel_id) {
        return Verdict::NotAppealChannel;
    }

    if format.is_whitelisted(&message.author_roles) {
        return Verdict::Exempt;
    }

    let result = format.template().validate(&message.content);
    if !result.ok {
        return Verdict::Rejected(RejectionReason::IncorrectFormat);
    }

    // A blank Steam ID value counts as no Steam ID given
    match result.extracted_identifier.filter(|id| !id.is_empty()) {
        Some(steam_id) if !is_valid_steam_id(&steam_id) => {
            Verdict::Rejected(RejectionReason::InvalidSteamId)
        }
        steam_id => Verdict::Accepted { steam_id },
    }
}

/// Everything needed to act on a rejected appeal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// Private message to the author
    pub notice: String,
    /// Post for the log channel
    pub log_entry: String,
}

impl Rejection {
    pub fn new(
        reason: RejectionReason,
        message: &AppealMessage,
        format: &FormatConfig,
        errors: &ErrorConfig,
    ) -> Self {
        let mention = user_mention(message.author_id);

        let notice = match reason {
            RejectionReason::IncorrectFormat => format!(
                "Hi {}, your ban appeal format is incorrect. Please use the following format:\n```\n{}```\n{}",
                mention, format.message_format, errors.error_message
            ),
            RejectionReason::InvalidSteamId => errors.steam_id_error_message.clone(),
        };

        let log_entry = format!(
            "Deleted message from {} for {}.\nMessage content: {}",
            mention,
            reason.describe(),
            message.content.trim()
        );

        Self {
            reason,
            notice: fit_message(&notice),
            log_entry: fit_message(&log_entry),
        }
    }
}

/// Side effects the gate performs on a rejected appeal
pub trait AppealModerator {
    fn post_log(&self, channel_id: u64, text: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Must succeed if the message is already gone
    fn delete_message(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn notify_author(&self, text: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Which side effects went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnforcementReport {
    pub logged: bool,
    pub deleted: bool,
    pub notified: bool,
}

/// Log, delete, notify. Each step runs regardless of how the others went.
pub async fn enforce<M: AppealModerator>(
    moderator: &M,
    rejection: &Rejection,
    log_channel_id: Option<u64>,
) -> EnforcementReport {
    let mut report = EnforcementReport::default();

    if let Some(channel_id) = log_channel_id {
        match moderator.post_log(channel_id, &rejection.log_entry).await {
            Ok(()) => report.logged = true,
            Err(e) => warn!("Failed to post appeal log to {}: {:?}", channel_id, e),
        }
    }

    match moderator.delete_message().await {
        Ok(()) => report.deleted = true,
        Err(e) => warn!("Failed to delete rejected appeal: {:?}", e),
    }

    match moderator.notify_author(&rejection.notice).await {
        Ok(()) => report.notified = true,
        Err(e) => warn!("Failed to DM appeal author: {:?}", e),
    }

    report
}

// ============ Discord side ============

struct SerenityModerator<'a> {
    ctx: &'a serenity::Context,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    author_id: serenity::UserId,
}

impl AppealModerator for SerenityModerator<'_> {
    async fn post_log(&self, channel_id: u64, text: &str) -> anyhow::Result<()> {
        serenity::ChannelId::new(channel_id)
            .send_message(
                &self.ctx.http,
                serenity::CreateMessage::new()
                    .content(text)
                    .allowed_mentions(serenity::CreateAllowedMentions::new()),
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self) -> anyhow::Result<()> {
        match self
            .channel_id
            .delete_message(&self.ctx.http, self.message_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(::serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)))
                if resp.status_code.as_u16() == 404 =>
            {
                debug!("Appeal {} was already deleted", self.message_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn notify_author(&self, text: &str) -> anyhow::Result<()> {
        self.author_id
            .direct_message(self.ctx, serenity::CreateMessage::new().content(text))
            .await?;
        Ok(())
    }
}

/// Message handler for the appeal channel
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), anyhow::Error> {
    if msg.author.bot {
        return Ok(());
    }

    let guild_id = match msg.guild_id {
        Some(gid) => gid,
        None => return Ok(()),
    };

    let format: FormatConfig = match data.store.load(guild_id.get()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load format config for guild {}: {:?}", guild_id, e);
            return Ok(());
        }
    };

    // Most messages stop here
    if !format.is_appeal_channel(msg.channel_id.get()) {
        return Ok(());
    }

    let fetched_roles = if msg.member.is_none() {
        match guild_id.member(ctx, msg.author.id).await {
            Ok(member) => Some(member.roles),
            Err(e) => {
                warn!("Could not fetch roles for {}: {:?}", msg.author.id, e);
                None
            }
        }
    } else {
        None
    };

    let appeal = match AppealMessage::from_serenity(msg, fetched_roles.as_deref()) {
        Some(appeal) => appeal,
        None => return Ok(()),
    };

    let reason = match evaluate(&appeal, &format) {
        Verdict::Rejected(reason) => reason,
        Verdict::Accepted { steam_id } => {
            debug!("Appeal {} from {} accepted (Steam ID {:?})", appeal.message_id, appeal.author_id, steam_id);
            return Ok(());
        }
        verdict => {
            debug!("Appeal {} from {}: {:?}", appeal.message_id, appeal.author_id, verdict);
            return Ok(());
        }
    };

    let errors: ErrorConfig = data.store.load(appeal.guild_id).await.unwrap_or_else(|e| {
        error!("Failed to load error config for guild {}: {:?}", guild_id, e);
        ErrorConfig::default()
    });
    let logs: LogsConfig = data.store.load(appeal.guild_id).await.unwrap_or_else(|e| {
        error!("Failed to load logs config for guild {}: {:?}", guild_id, e);
        LogsConfig::default()
    });

    let rejection = Rejection::new(reason, &appeal, &format, &errors);
    let moderator = SerenityModerator {
        ctx,
        channel_id: msg.channel_id,
        message_id: msg.id,
        author_id: msg.author.id,
    };

    let report = enforce(&moderator, &rejection, logs.log_channel_id).await;
    info!(
        "Rejected appeal from {} in guild {} for {} (logged: {}, deleted: {}, notified: {})",
        msg.author.name,
        guild_id,
        rejection.reason.describe(),
        report.logged,
        report.deleted,
        report.notified
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const TEMPLATE: &str = "AC Driver Name:\nSteam ID:\nDetails:";
    const APPEAL_CHANNEL: u64 = 100;
    const MOD_ROLE: u64 = 7;

    fn format_config() -> FormatConfig {
        FormatConfig {
            ban_appeal_channel_id: Some(APPEAL_CHANNEL),
            whitelisted_roles: [MOD_ROLE].into_iter().collect(),
            message_format: TEMPLATE.to_string(),
        }
    }

    fn message(content: &str) -> AppealMessage {
        AppealMessage {
            guild_id: 1,
            channel_id: APPEAL_CHANNEL,
            message_id: 500,
            author_id: 42,
            author_is_bot: false,
            author_roles: vec![3],
            content: content.to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingModerator {
        calls: Mutex<Vec<String>>,
        fail_delete: bool,
        fail_notify: bool,
    }

    impl RecordingModerator {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AppealModerator for RecordingModerator {
        async fn post_log(&self, channel_id: u64, text: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("log:{}:{}", channel_id, text));
            Ok(())
        }

        async fn delete_message(&self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("delete".to_string());
            if self.fail_delete {
                anyhow::bail!("missing permissions");
            }
            Ok(())
        }

        async fn notify_author(&self, text: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("dm:{}", text));
            if self.fail_notify {
                anyhow::bail!("cannot send messages to this user");
            }
            Ok(())
        }
    }

    #[test]
    fn test_valid_appeal_stands() {
        let verdict = evaluate(
            &message("AC Driver Name: Bob\nSteam ID: 76561198012345678\nDetails: hi"),
            &format_config(),
        );
        assert_eq!(
            verdict,
            Verdict::Accepted { steam_id: Some("76561198012345678".to_string()) }
        );
    }

    #[test]
    fn test_missing_steam_id_line_is_format_error() {
        let verdict = evaluate(&message("AC Driver Name: Bob\nDetails: hi"), &format_config());
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::IncorrectFormat));
    }

    #[test]
    fn test_bad_steam_id_is_identifier_error() {
        let verdict = evaluate(
            &message("AC Driver Name: Bob\nSteam ID: 12345\nDetails: hi"),
            &format_config(),
        );
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::InvalidSteamId));
    }

    #[test]
    fn test_blank_steam_id_value_stands() {
        let verdict = evaluate(&message("AC Driver Name: Bob\nSteam ID:\nDetails: hi"), &format_config());
        assert_eq!(verdict, Verdict::Accepted { steam_id: None });

        let verdict = evaluate(&message("AC Driver Name: Bob\nSteam ID:   \nDetails: hi"), &format_config());
        assert_eq!(verdict, Verdict::Accepted { steam_id: None });
    }

    #[test]
    fn test_whitelisted_author_is_exempt() {
        let mut msg = message("anything at all");
        msg.author_roles.push(MOD_ROLE);
        assert_eq!(evaluate(&msg, &format_config()), Verdict::Exempt);

        msg.content = "AC Driver Name: Bob\nSteam ID: 12345\nDetails: hi".to_string();
        assert_eq!(evaluate(&msg, &format_config()), Verdict::Exempt);
    }

    #[test]
    fn test_other_channels_are_ignored() {
        let mut msg = message("anything");
        msg.channel_id = 999;
        assert_eq!(evaluate(&msg, &format_config()), Verdict::NotAppealChannel);

        let unconfigured = FormatConfig::default();
        assert_eq!(evaluate(&message("anything"), &unconfigured), Verdict::NotAppealChannel);
    }

    #[test]
    fn test_bots_are_ignored() {
        let mut msg = message("anything");
        msg.author_is_bot = true;
        assert_eq!(evaluate(&msg, &format_config()), Verdict::FromBot);
    }

    #[test]
    fn test_template_without_steam_id_skips_identifier_check() {
        let mut format = format_config();
        format.message_format = "Name:\nReason:".to_string();
        let verdict = evaluate(&message("Name: Bob\nReason: 12345"), &format);
        assert_eq!(verdict, Verdict::Accepted { steam_id: None });
    }

    #[test]
    fn test_format_notice_quotes_template() {
        let errors = ErrorConfig::default();
        let rejection = Rejection::new(
            RejectionReason::IncorrectFormat,
            &message("hello"),
            &format_config(),
            &errors,
        );
        assert!(rejection.notice.starts_with("Hi <@42>, your ban appeal format is incorrect."));
        assert!(rejection.notice.contains(&format!("```\n{}```", TEMPLATE)));
        assert!(rejection.notice.ends_with(&errors.error_message));
        assert_eq!(
            rejection.log_entry,
            "Deleted message from <@42> for incorrect format.\nMessage content: hello"
        );
    }

    #[test]
    fn test_steam_id_notice_uses_configured_text() {
        let errors = ErrorConfig {
            steam_id_error_message: "bad id".to_string(),
            ..Default::default()
        };
        let rejection = Rejection::new(
            RejectionReason::InvalidSteamId,
            &message("  AC Driver Name: Bob\nSteam ID: 1\nDetails: hi  "),
            &format_config(),
            &errors,
        );
        assert_eq!(rejection.notice, "bad id");
        assert!(rejection.log_entry.contains("for invalid Steam ID."));
        assert!(rejection.log_entry.ends_with("Details: hi"));
    }

    #[tokio::test]
    async fn test_enforce_order_with_log_channel() {
        let moderator = RecordingModerator::default();
        let rejection = Rejection {
            reason: RejectionReason::IncorrectFormat,
            notice: "notice".to_string(),
            log_entry: "entry".to_string(),
        };

        let report = enforce(&moderator, &rejection, Some(55)).await;
        assert_eq!(moderator.calls(), vec!["log:55:entry", "delete", "dm:notice"]);
        assert_eq!(report, EnforcementReport { logged: true, deleted: true, notified: true });
    }

    #[tokio::test]
    async fn test_enforce_without_log_channel() {
        let moderator = RecordingModerator::default();
        let rejection = Rejection {
            reason: RejectionReason::InvalidSteamId,
            notice: "notice".to_string(),
            log_entry: "entry".to_string(),
        };

        let report = enforce(&moderator, &rejection, None).await;
        assert_eq!(moderator.calls(), vec!["delete", "dm:notice"]);
        assert!(!report.logged);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_effects() {
        let moderator = RecordingModerator {
            fail_delete: true,
            fail_notify: true,
            ..Default::default()
        };
        let rejection = Rejection {
            reason: RejectionReason::IncorrectFormat,
            notice: "notice".to_string(),
            log_entry: "entry".to_string(),
        };

        let report = enforce(&moderator, &rejection, Some(1)).await;
        assert_eq!(moderator.calls().len(), 3);
        assert_eq!(report, EnforcementReport { logged: true, deleted: false, notified: false });
    }
}

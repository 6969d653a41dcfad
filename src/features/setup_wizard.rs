// Setup Wizard - Discord UI for the setup state machine
//
// Every component and modal the wizard renders carries a custom id starting
// with `appeal_setup:`. Interactions are turned into `WizardEvent`s, run
// through `WizardSession::advance`, and answered with exactly one response.

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::features::wizard_flow::{
    TextInputKind, WizardEffect, WizardEvent, WizardSession, WizardStep, MAX_WHITELIST_PICK,
};
use crate::models::guild::{FormatConfig, LogsConfig};
use crate::utils::config::{colors, DEFAULT_ERROR_MESSAGE, DEFAULT_MESSAGE_FORMAT};
use crate::utils::formatters::{channel_mention, code_block};
use crate::{Data, Error};

const PREFIX: &str = "appeal_setup:";
const START_ID: &str = "appeal_setup:start";
const CHANNEL_SELECT_ID: &str = "appeal_setup:channel";
const ROLE_SELECT_ID: &str = "appeal_setup:roles";
const CONFIRM_ID: &str = "appeal_setup:confirm";
const DEFAULT_ID: &str = "appeal_setup:default";
const CUSTOMIZE_ID: &str = "appeal_setup:customize";
const FORMAT_MODAL_ID: &str = "appeal_setup:format_modal";
const ERROR_MODAL_ID: &str = "appeal_setup:error_modal";
const TEXT_INPUT_ID: &str = "appeal_setup:text";

const NO_SESSION: &str = "No setup in progress. Run /setup to start one.";
const EXPIRED_SESSION: &str = "This setup session has expired. Run /setup again.";
const SAVE_FAILED: &str = "Failed to save configuration. Please try again.";

/// Sessions are per admin per guild
pub type SessionKey = (u64, u64);

/// What to answer an interaction with
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Render(WizardStep),
    TextInput(TextInputKind),
    Acknowledge,
    Ephemeral(String),
}

// ============ Screens ============

fn welcome_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Ban Appeal Bot Setup")
        .description("Welcome to the setup wizard! Click 'Start Setup' to begin.")
        .color(colors::PRIMARY)
}

fn welcome_components() -> Vec<serenity::CreateActionRow> {
    let start = serenity::CreateButton::new(START_ID)
        .label("Start Setup")
        .style(serenity::ButtonStyle::Primary);
    vec![serenity::CreateActionRow::Buttons(vec![start])]
}

/// First message of `/setup`
pub fn welcome_reply() -> poise::CreateReply {
    poise::CreateReply::default()
        .embed(welcome_embed())
        .components(welcome_components())
        .ephemeral(true)
}

fn channel_picker(title: &str) -> serenity::CreateInteractionResponseMessage {
    let select = serenity::CreateSelectMenu::new(
        CHANNEL_SELECT_ID,
        serenity::CreateSelectMenuKind::Channel {
            channel_types: Some(vec![serenity::ChannelType::Text]),
            default_channels: None,
        },
    )
    .placeholder("Select a channel");

    serenity::CreateInteractionResponseMessage::new()
        .content(format!("Please select the {}:", title))
        .embeds(vec![])
        .components(vec![
            serenity::CreateActionRow::SelectMenu(select),
            confirm_row(),
        ])
}

fn role_picker() -> serenity::CreateInteractionResponseMessage {
    let select = serenity::CreateSelectMenu::new(
        ROLE_SELECT_ID,
        serenity::CreateSelectMenuKind::Role { default_roles: None },
    )
    .placeholder("Select roles to whitelist")
    .min_values(1)
    .max_values(MAX_WHITELIST_PICK as u8);

    serenity::CreateInteractionResponseMessage::new()
        .content("Please select the roles to whitelist:")
        .embeds(vec![])
        .components(vec![
            serenity::CreateActionRow::SelectMenu(select),
            confirm_row(),
        ])
}

fn confirm_row() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(CONFIRM_ID)
        .label("Confirm")
        .style(serenity::ButtonStyle::Primary)])
}

fn choice_row() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(DEFAULT_ID)
            .label("Accept Default")
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(CUSTOMIZE_ID)
            .label("Customize")
            .style(serenity::ButtonStyle::Secondary),
    ])
}

fn choice_screen(embed: serenity::CreateEmbed) -> serenity::CreateInteractionResponseMessage {
    serenity::CreateInteractionResponseMessage::new()
        .content("")
        .embed(embed)
        .components(vec![choice_row()])
}

async fn render(step: WizardStep, data: &Data, guild_id: u64) -> serenity::CreateInteractionResponseMessage {
    match step {
        WizardStep::Welcome => serenity::CreateInteractionResponseMessage::new()
            .content("")
            .embed(welcome_embed())
            .components(welcome_components()),
        WizardStep::AppealChannel => channel_picker("Ban Appeal Channel"),
        WizardStep::FormatChoice => choice_screen(
            serenity::CreateEmbed::new()
                .title("Message Format Setup")
                .description(format!(
                    "Default format:\n{}\nWould you like to use this format or customize it?",
                    code_block(DEFAULT_MESSAGE_FORMAT)
                ))
                .field("Note", "Users can use line breaks in the Details section.", false)
                .color(colors::INFO),
        ),
        WizardStep::RoleSelect => role_picker(),
        WizardStep::ErrorChoice => choice_screen(
            serenity::CreateEmbed::new()
                .title("Error Message Setup")
                .description(format!(
                    "Default error message:\n{}\nWould you like to use this message or customize it?",
                    code_block(DEFAULT_ERROR_MESSAGE)
                ))
                .color(colors::INFO),
        ),
        WizardStep::LogChannel => channel_picker("Logs Channel"),
        WizardStep::Complete => {
            let format: FormatConfig = data.store.load(guild_id).await.unwrap_or_default();
            let logs: LogsConfig = data.store.load(guild_id).await.unwrap_or_default();

            let roles = format
                .whitelisted_roles
                .iter()
                .map(|id| format!("<@&{}>", id))
                .collect::<Vec<_>>()
                .join(" ");

            let embed = serenity::CreateEmbed::new()
                .title("✅ Setup complete!")
                .field("Appeal Channel", channel_mention(format.ban_appeal_channel_id), true)
                .field("Logs Channel", channel_mention(logs.log_channel_id), true)
                .field(
                    "Whitelisted Roles",
                    if roles.is_empty() { "None".to_string() } else { roles },
                    false,
                )
                .color(colors::SUCCESS);

            serenity::CreateInteractionResponseMessage::new()
                .content("")
                .embed(embed)
                .components(vec![])
        }
    }
}

fn text_input_modal(kind: TextInputKind) -> serenity::CreateModal {
    let (modal_id, title, label, placeholder, default) = match kind {
        TextInputKind::MessageFormat => (
            FORMAT_MODAL_ID,
            "Customize Format",
            "Message Format",
            "Enter your custom format",
            DEFAULT_MESSAGE_FORMAT,
        ),
        TextInputKind::ErrorMessage => (
            ERROR_MODAL_ID,
            "Customize Error Message",
            "Error Message",
            "Enter your custom error message",
            DEFAULT_ERROR_MESSAGE,
        ),
    };

    let input = serenity::CreateInputText::new(serenity::InputTextStyle::Paragraph, label, TEXT_INPUT_ID)
        .placeholder(placeholder)
        .value(default)
        .required(true);

    serenity::CreateModal::new(modal_id, title)
        .components(vec![serenity::CreateActionRow::InputText(input)])
}

// ============ Event mapping ============

fn component_event(data: &serenity::ComponentInteractionData) -> Option<WizardEvent> {
    match (data.custom_id.as_str(), &data.kind) {
        (START_ID, _) => Some(WizardEvent::Start),
        (CONFIRM_ID, _) => Some(WizardEvent::Confirm),
        (DEFAULT_ID, _) => Some(WizardEvent::AcceptDefault),
        (CUSTOMIZE_ID, _) => Some(WizardEvent::Customize),
        (CHANNEL_SELECT_ID, serenity::ComponentInteractionDataKind::ChannelSelect { values }) => {
            Some(WizardEvent::ChannelSelected(values.first().map(|c| c.get())))
        }
        (ROLE_SELECT_ID, serenity::ComponentInteractionDataKind::RoleSelect { values }) => {
            Some(WizardEvent::RolesSelected(values.iter().map(|r| r.get()).collect()))
        }
        _ => None,
    }
}

fn modal_event(data: &serenity::ModalInteractionData) -> Option<WizardEvent> {
    let kind = match data.custom_id.as_str() {
        FORMAT_MODAL_ID => TextInputKind::MessageFormat,
        ERROR_MODAL_ID => TextInputKind::ErrorMessage,
        _ => return None,
    };

    let value = data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == TEXT_INPUT_ID => {
                input.value.clone()
            }
            _ => None,
        })
        .unwrap_or_default();

    Some(WizardEvent::TextSubmitted { kind, value })
}

// ============ Driver ============

/// Start (or restart) a session for this admin, dropping any that timed out
pub fn begin_session(data: &Data, guild_id: u64, user_id: u64) {
    let now = chrono::Utc::now();
    data.wizard_sessions.retain(|_, session| !session.is_expired(now));

    data.wizard_sessions
        .insert((guild_id, user_id), WizardSession::new(guild_id, user_id));
}

/// Feed one event through the admin's session and carry out its effects
async fn drive(data: &Data, guild_id: u64, user_id: u64, event: WizardEvent) -> Reply {
    let key = (guild_id, user_id);

    let session = match data.wizard_sessions.get(&key).map(|s| s.value().clone()) {
        Some(session) => session,
        None => return Reply::Ephemeral(NO_SESSION.to_string()),
    };

    if session.is_expired(chrono::Utc::now()) {
        data.wizard_sessions.remove(&key);
        return Reply::Ephemeral(EXPIRED_SESSION.to_string());
    }

    let transition = match session.advance(event) {
        Ok(t) => t,
        Err(e) => return Reply::Ephemeral(e.to_string()),
    };

    let mut reply = Reply::Acknowledge;
    for effect in transition.effects {
        match effect {
            WizardEffect::Persist(update) => {
                if let Err(e) = update.apply(&data.store, guild_id).await {
                    error!("Setup step {:?} failed for guild {}: {:?}", session.step, session.guild_id, e);
                    return Reply::Ephemeral(SAVE_FAILED.to_string());
                }
                info!("Guild {} setup: {:?}", guild_id, update);
            }
            WizardEffect::Render(step) => reply = Reply::Render(step),
            WizardEffect::OpenTextInput(kind) => reply = Reply::TextInput(kind),
            WizardEffect::Acknowledge => reply = Reply::Acknowledge,
        }
    }

    if transition.session.is_complete() {
        data.wizard_sessions.remove(&key);
        info!("Guild {} setup completed by {}", guild_id, transition.session.user_id);
    } else {
        data.wizard_sessions.insert(key, transition.session);
    }

    reply
}

async fn build_response(reply: Reply, data: &Data, guild_id: u64) -> serenity::CreateInteractionResponse {
    match reply {
        Reply::Render(step) => {
            serenity::CreateInteractionResponse::UpdateMessage(render(step, data, guild_id).await)
        }
        Reply::TextInput(kind) => serenity::CreateInteractionResponse::Modal(text_input_modal(kind)),
        Reply::Acknowledge => serenity::CreateInteractionResponse::Acknowledge,
        Reply::Ephemeral(text) => serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .ephemeral(true),
        ),
    }
}

/// Handle wizard components and modals; other interactions pass through
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(component) if component.data.custom_id.starts_with(PREFIX) => {
            let guild_id = component.guild_id.ok_or("Setup only works in a server")?.get();
            let reply = match component_event(&component.data) {
                Some(event) => drive(data, guild_id, component.user.id.get(), event).await,
                None => Reply::Acknowledge,
            };
            let response = build_response(reply, data, guild_id).await;
            component.create_response(ctx, response).await?;
        }
        serenity::Interaction::Modal(modal) if modal.data.custom_id.starts_with(PREFIX) => {
            let guild_id = modal.guild_id.ok_or("Setup only works in a server")?.get();
            let reply = match modal_event(&modal.data) {
                Some(event) => drive(data, guild_id, modal.user.id.get(), event).await,
                None => Reply::Acknowledge,
            };
            let response = build_response(reply, data, guild_id).await;
            modal.create_response(ctx, response).await?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config_store::tests::temp_store;
    use crate::storage::config_store::ConfigStore;

    fn data() -> Data {
        Data {
            store: temp_store(),
            wizard_sessions: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_event_without_session() {
        let data = data();
        let reply = drive(&data, 1, 2, WizardEvent::Start).await;
        assert_eq!(reply, Reply::Ephemeral(NO_SESSION.to_string()));
    }

    #[tokio::test]
    async fn test_full_run_persists_and_ends_session() {
        let data = data();
        begin_session(&data, 1, 2);

        let steps = [
            (WizardEvent::Start, Reply::Render(WizardStep::AppealChannel)),
            (WizardEvent::ChannelSelected(Some(10)), Reply::Acknowledge),
            (WizardEvent::Confirm, Reply::Render(WizardStep::FormatChoice)),
            (WizardEvent::Customize, Reply::TextInput(TextInputKind::MessageFormat)),
            (
                WizardEvent::TextSubmitted {
                    kind: TextInputKind::MessageFormat,
                    value: "Name:\nSteam ID:".to_string(),
                },
                Reply::Render(WizardStep::RoleSelect),
            ),
            (WizardEvent::RolesSelected(vec![5]), Reply::Acknowledge),
            (WizardEvent::Confirm, Reply::Render(WizardStep::ErrorChoice)),
            (WizardEvent::AcceptDefault, Reply::Render(WizardStep::LogChannel)),
            (WizardEvent::ChannelSelected(Some(20)), Reply::Acknowledge),
            (WizardEvent::Confirm, Reply::Render(WizardStep::Complete)),
        ];

        for (event, expected) in steps {
            assert_eq!(drive(&data, 1, 2, event).await, expected);
        }

        assert!(data.wizard_sessions.is_empty());
        let format: FormatConfig = data.store.load(1).await.unwrap();
        let logs: LogsConfig = data.store.load(1).await.unwrap();
        assert_eq!(format.ban_appeal_channel_id, Some(10));
        assert_eq!(format.message_format, "Name:\nSteam ID:");
        assert!(format.whitelisted_roles.contains(&5));
        assert_eq!(logs.log_channel_id, Some(20));
    }

    #[tokio::test]
    async fn test_missing_selection_reprompts_and_keeps_step() {
        let data = data();
        begin_session(&data, 1, 2);
        drive(&data, 1, 2, WizardEvent::Start).await;

        let reply = drive(&data, 1, 2, WizardEvent::Confirm).await;
        assert_eq!(reply, Reply::Ephemeral("Please select a channel first!".to_string()));
        let step = data.wizard_sessions.get(&(1, 2)).map(|s| s.step);
        assert_eq!(step, Some(WizardStep::AppealChannel));

        let format: FormatConfig = data.store.load(1).await.unwrap();
        assert_eq!(format.ban_appeal_channel_id, None);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let data = data();
        let mut session = WizardSession::new(1, 2);
        session.started_at -= chrono::Duration::hours(1);
        data.wizard_sessions.insert((1, 2), session);

        let reply = drive(&data, 1, 2, WizardEvent::Start).await;
        assert_eq!(reply, Reply::Ephemeral(EXPIRED_SESSION.to_string()));
        assert!(data.wizard_sessions.is_empty());
    }

    #[tokio::test]
    async fn test_begin_session_prunes_expired_sessions() {
        let data = data();
        for user_id in 100..110 {
            let mut session = WizardSession::new(1, user_id);
            session.started_at -= chrono::Duration::hours(5);
            data.wizard_sessions.insert((1, user_id), session);
        }
        begin_session(&data, 1, 3);

        begin_session(&data, 1, 2);
        assert_eq!(data.wizard_sessions.len(), 2);
        assert!(data.wizard_sessions.contains_key(&(1, 2)));
        assert!(data.wizard_sessions.contains_key(&(1, 3)));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_step() {
        let file = std::env::temp_dir().join(format!("appeal-gate-file-{}", rand::random::<u64>()));
        std::fs::write(&file, b"not a directory").unwrap();
        let data = Data {
            store: ConfigStore::new(file.clone()),
            wizard_sessions: Default::default(),
        };
        begin_session(&data, 1, 2);
        drive(&data, 1, 2, WizardEvent::Start).await;
        drive(&data, 1, 2, WizardEvent::ChannelSelected(Some(10))).await;

        let reply = drive(&data, 1, 2, WizardEvent::Confirm).await;
        assert_eq!(reply, Reply::Ephemeral(SAVE_FAILED.to_string()));
        let step = data.wizard_sessions.get(&(1, 2)).map(|s| s.step);
        assert_eq!(step, Some(WizardStep::AppealChannel));

        std::fs::remove_file(&file).unwrap();
    }

    #[tokio::test]
    async fn test_sessions_are_per_admin() {
        let data = data();
        begin_session(&data, 1, 2);
        begin_session(&data, 1, 3);

        drive(&data, 1, 2, WizardEvent::Start).await;
        assert_eq!(data.wizard_sessions.get(&(1, 2)).map(|s| s.step), Some(WizardStep::AppealChannel));
        assert_eq!(data.wizard_sessions.get(&(1, 3)).map(|s| s.step), Some(WizardStep::Welcome));
    }
}

// Setup wizard state machine
//
// A session moves strictly forward:
//   Welcome -> AppealChannel -> FormatChoice -> RoleSelect -> ErrorChoice -> LogChannel -> Complete
// `advance` is pure. It returns the next session plus the effects the driver
// has to carry out, persistence first. The driver only keeps the new session
// once every `Persist` effect has succeeded.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::guild::{ErrorConfig, FormatConfig, LogsConfig};
use crate::storage::config_store::{ConfigStore, StoreResult};
use crate::utils::config::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_MESSAGE_FORMAT, DEFAULT_STEAM_ID_ERROR_MESSAGE,
    WIZARD_SESSION_TTL_MINUTES,
};

/// Discord's role picker caps out at 25 values
pub const MAX_WHITELIST_PICK: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Welcome,
    AppealChannel,
    FormatChoice,
    RoleSelect,
    ErrorChoice,
    LogChannel,
    Complete,
}

/// Free-text inputs the wizard can open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputKind {
    MessageFormat,
    ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    Start,
    /// Empty when the picker was cleared
    ChannelSelected(Option<u64>),
    RolesSelected(Vec<u64>),
    Confirm,
    AcceptDefault,
    Customize,
    TextSubmitted { kind: TextInputKind, value: String },
}

/// A single write against a guild's config records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    AppealChannel(u64),
    DefaultTemplate,
    CustomTemplate(String),
    WhitelistRoles(Vec<u64>),
    DefaultErrorMessages,
    CustomErrorMessage(String),
    LogChannel(u64),
}

impl ConfigUpdate {
    /// Read-modify-write the affected record
    pub async fn apply(&self, store: &ConfigStore, guild_id: u64) -> StoreResult<()> {
        match self {
            ConfigUpdate::AppealChannel(id) => {
                store
                    .update(guild_id, |c: &mut FormatConfig| c.ban_appeal_channel_id = Some(*id))
                    .await
            }
            ConfigUpdate::DefaultTemplate => {
                store
                    .update(guild_id, |c: &mut FormatConfig| {
                        c.message_format = DEFAULT_MESSAGE_FORMAT.to_string()
                    })
                    .await
            }
            ConfigUpdate::CustomTemplate(template) => {
                store
                    .update(guild_id, |c: &mut FormatConfig| c.message_format = template.clone())
                    .await
            }
            ConfigUpdate::WhitelistRoles(roles) => {
                store
                    .update(guild_id, |c: &mut FormatConfig| {
                        c.whitelisted_roles.extend(roles.iter().copied())
                    })
                    .await
            }
            ConfigUpdate::DefaultErrorMessages => {
                store
                    .update(guild_id, |c: &mut ErrorConfig| {
                        c.error_message = DEFAULT_ERROR_MESSAGE.to_string();
                        c.steam_id_error_message = DEFAULT_STEAM_ID_ERROR_MESSAGE.to_string();
                    })
                    .await
            }
            ConfigUpdate::CustomErrorMessage(text) => {
                store
                    .update(guild_id, |c: &mut ErrorConfig| c.error_message = text.clone())
                    .await
            }
            ConfigUpdate::LogChannel(id) => {
                store
                    .update(guild_id, |c: &mut LogsConfig| c.log_channel_id = Some(*id))
                    .await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEffect {
    Persist(ConfigUpdate),
    /// Replace the wizard message with this step's screen
    Render(WizardStep),
    OpenTextInput(TextInputKind),
    /// Quietly accept a picker change
    Acknowledge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Please select a channel first!")]
    NoChannelSelected,
    #[error("Please select at least one role!")]
    NoRolesSelected,
    #[error("The text can't be empty.")]
    EmptyText,
    #[error("This setup step is no longer active. Run /setup again if needed.")]
    StaleEvent { step: WizardStep },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSession {
    pub guild_id: u64,
    pub user_id: u64,
    pub step: WizardStep,
    pub started_at: DateTime<Utc>,
    pub selected_channel: Option<u64>,
    pub selected_roles: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: WizardSession,
    pub effects: Vec<WizardEffect>,
}

impl WizardSession {
    pub fn new(guild_id: u64, user_id: u64) -> Self {
        Self {
            guild_id,
            user_id,
            step: WizardStep::Welcome,
            started_at: Utc::now(),
            selected_channel: None,
            selected_roles: Vec::new(),
        }
    }

    /// Past the point where Discord still accepts responses for it
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at > Duration::minutes(WIZARD_SESSION_TTL_MINUTES)
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Complete
    }

    /// Move to `step`, dropping scratch picks from the previous screen
    fn enter(&self, step: WizardStep) -> WizardSession {
        WizardSession {
            step,
            selected_channel: None,
            selected_roles: Vec::new(),
            ..self.clone()
        }
    }

    fn stay(&self, effects: Vec<WizardEffect>) -> Transition {
        Transition {
            session: self.clone(),
            effects,
        }
    }

    fn go(&self, step: WizardStep, update: Option<ConfigUpdate>) -> Transition {
        let mut effects: Vec<WizardEffect> = update.into_iter().map(WizardEffect::Persist).collect();
        effects.push(WizardEffect::Render(step));
        Transition {
            session: self.enter(step),
            effects,
        }
    }

    pub fn advance(&self, event: WizardEvent) -> Result<Transition, WizardError> {
        use WizardEvent as E;
        use WizardStep as S;

        match (self.step, event) {
            (S::Welcome, E::Start) => Ok(self.go(S::AppealChannel, None)),

            (S::AppealChannel | S::LogChannel, E::ChannelSelected(channel)) => {
                let mut next = self.clone();
                next.selected_channel = channel;
                Ok(Transition {
                    session: next,
                    effects: vec![WizardEffect::Acknowledge],
                })
            }
            (S::AppealChannel, E::Confirm) => {
                let channel = self.selected_channel.ok_or(WizardError::NoChannelSelected)?;
                Ok(self.go(S::FormatChoice, Some(ConfigUpdate::AppealChannel(channel))))
            }

            (S::FormatChoice, E::AcceptDefault) => {
                Ok(self.go(S::RoleSelect, Some(ConfigUpdate::DefaultTemplate)))
            }
            (S::FormatChoice, E::Customize) => Ok(self.stay(vec![WizardEffect::OpenTextInput(
                TextInputKind::MessageFormat,
            )])),
            (
                S::FormatChoice,
                E::TextSubmitted {
                    kind: TextInputKind::MessageFormat,
                    value,
                },
            ) => {
                if value.trim().is_empty() {
                    return Err(WizardError::EmptyText);
                }
                Ok(self.go(S::RoleSelect, Some(ConfigUpdate::CustomTemplate(value))))
            }

            (S::RoleSelect, E::RolesSelected(mut roles)) => {
                roles.sort_unstable();
                roles.dedup();
                roles.truncate(MAX_WHITELIST_PICK);
                let mut next = self.clone();
                next.selected_roles = roles;
                Ok(Transition {
                    session: next,
                    effects: vec![WizardEffect::Acknowledge],
                })
            }
            (S::RoleSelect, E::Confirm) => {
                if self.selected_roles.is_empty() {
                    return Err(WizardError::NoRolesSelected);
                }
                Ok(self.go(
                    S::ErrorChoice,
                    Some(ConfigUpdate::WhitelistRoles(self.selected_roles.clone())),
                ))
            }

            (S::ErrorChoice, E::AcceptDefault) => {
                Ok(self.go(S::LogChannel, Some(ConfigUpdate::DefaultErrorMessages)))
            }
            (S::ErrorChoice, E::Customize) => Ok(self.stay(vec![WizardEffect::OpenTextInput(
                TextInputKind::ErrorMessage,
            )])),
            (
                S::ErrorChoice,
                E::TextSubmitted {
                    kind: TextInputKind::ErrorMessage,
                    value,
                },
            ) => {
                if value.trim().is_empty() {
                    return Err(WizardError::EmptyText);
                }
                Ok(self.go(S::LogChannel, Some(ConfigUpdate::CustomErrorMessage(value))))
            }

            (S::LogChannel, E::Confirm) => {
                let channel = self.selected_channel.ok_or(WizardError::NoChannelSelected)?;
                Ok(self.go(S::Complete, Some(ConfigUpdate::LogChannel(channel))))
            }

            (step, _) => Err(WizardError::StaleEvent { step }),
        }
    }
}

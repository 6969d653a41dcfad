// Appeal Gate
// A Discord bot that keeps a ban appeal channel in the expected format

mod commands;
mod features;
mod models;
mod storage;
mod utils;

use std::env;

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::setup_wizard::SessionKey;
use crate::features::wizard_flow::WizardSession;
use crate::storage::config_store::ConfigStore;
use crate::utils::config::Settings;

/// User data shared across all commands and event handlers
#[derive(Debug)]
pub struct Data {
    pub store: ConfigStore,
    /// In-flight /setup wizards, keyed by (guild, admin)
    pub wizard_sessions: DashMap<SessionKey, WizardSession>,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::setup::setup(),
        commands::whitelist::add_roles(),
        commands::whitelist::remove_roles(),
        commands::config::config(),
        commands::help::help(),
    ]
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = features::appeal_gate::handle_message(ctx, new_message, data).await {
                error!("Appeal gate error: {:?}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            features::setup_wizard::handle_interaction(ctx, interaction, data).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) {
    let reply = poise::CreateReply::default().content(text).ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        error!("Error handling command error: {:?}", e);
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command {}: {:?}", ctx.command().name, error);
            reply_ephemeral(ctx, "An error occurred while processing the command.").await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            reply_ephemeral(ctx, "You don't have the required permissions to use this command.").await;
        }
        poise::FrameworkError::CooldownHit { remaining_cooldown, ctx, .. } => {
            reply_ephemeral(
                ctx,
                format!(
                    "This command is on cooldown. Try again in {:.2} seconds.",
                    remaining_cooldown.as_secs_f64()
                ),
            )
            .await;
        }
        poise::FrameworkError::EventHandler { error, .. } => {
            error!("Event handler error: {:?}", error);
        }
        err => {
            error!("Framework error: {:?}", err);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "appeal_gate=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    info!("Starting Appeal Gate...");

    tokio::fs::create_dir_all(&settings.config_dir).await?;
    let store = ConfigStore::new(settings.config_dir.clone());
    info!("Config store at {}", store.root().display());

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(Data {
                    store,
                    wizard_sessions: DashMap::new(),
                })
            })
        })
        .build();

    // MESSAGE_CONTENT and GUILD_MEMBERS are privileged, enable them in the Discord Dev Portal
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.token, intents)
        .framework(framework)
        .await?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register Ctrl+C handler: {:?}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    info!("Goodbye!");
    Ok(())
}

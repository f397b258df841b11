use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Discord bot that verifies new residence-hall members over DM
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force re-sync of slash commands to all guilds (use when commands aren't showing up)
    #[arg(long, short = 's')]
    sync_commands: bool,

    /// Register commands per-guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Specific guild ID to sync commands to (for testing)
    #[arg(long)]
    guild_id: Option<u64>,
}

mod commands;
mod config;
mod error;
mod events;
mod logging;
mod managers;
mod messages;
mod verification;

use commands::{approve, deny, help, pending_reviews, ping, reload_config, reverify, verification_log};
use events::{
    handle_guild_create, handle_member_add, handle_member_remove, handle_message,
    handle_role_delete,
};
use logging::SharedLogBuffer;
use managers::{
    create_shared_config_manager, create_shared_guild_directory,
    create_shared_verification_manager, run_startup_permission_check, ConfigAuthorization,
    SharedConfigManager, SharedVerificationManager,
};
use verification::{
    create_shared_role_catalog, ApprovalAuthority, AutomaticApproval, CollegeMajorSelector,
    ModeratorReview, OutcomeApplier, ReviewQueue, SharedReviewQueue, SharedRoleCatalog,
    VerificationWorkflow,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub config_manager: SharedConfigManager,
    pub verification_manager: SharedVerificationManager,
    pub role_catalog: SharedRoleCatalog,
    pub review_queue: SharedReviewQueue,
    pub log_buffer: SharedLogBuffer,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = handle_message(ctx, new_message, data).await {
                error!("Failed to handle message: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = handle_member_add(ctx, new_member, data).await {
                error!("Failed to handle new member: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            if let Err(e) = handle_member_remove(*guild_id, user, data).await {
                error!("Failed to handle member removal: {}", e);
            }
        }
        serenity::FullEvent::GuildRoleDelete {
            guild_id,
            removed_role_id,
            ..
        } => {
            if let Err(e) = handle_role_delete(*guild_id, *removed_role_id, data).await {
                error!("Failed to handle role deletion: {}", e);
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            if let Err(e) = handle_guild_create(ctx, guild, data).await {
                error!("Failed to handle guild create: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Recent log lines for /verification_log
    let log_buffer = logging::create_log_buffer(1000);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .with(logging::LogCaptureLayer::new(log_buffer.clone()))
        .init();

    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| anyhow::anyhow!("Missing DISCORD_TOKEN environment variable"))?;

    // Extract bot/application ID from token (first part before the dot, base64 encoded)
    if let Some(bot_id_b64) = token.split('.').next() {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(bot_id_b64)
            .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bot_id_b64));
        if let Ok(Ok(id_str)) = decoded.map(String::from_utf8) {
            info!("Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)", id_str, id_str);
        }
    }

    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data".to_string());

    info!("Loading configurations from {}...", data_path);
    let config_manager = create_shared_config_manager(&data_path);
    if let Err(e) = config_manager.write().await.load_all().await {
        error!("Failed to load configurations, using defaults: {}", e);
    }

    let review_queue: SharedReviewQueue = Arc::new(ReviewQueue::new());

    let sync_commands = args.sync_commands;
    let guild_commands = args.guild_commands;
    let target_guild_id = args.guild_id;

    if sync_commands {
        info!("--sync-commands: Will force re-register slash commands");
    }
    if guild_commands {
        info!("--guild-commands: Will register commands per-guild (faster for testing)");
    } else {
        info!("Registering commands globally by default (takes up to 1 hour to propagate)");
    }
    if let Some(gid) = target_guild_id {
        info!("--guild-id: Targeting specific guild {}", gid);
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                approve(),
                deny(),
                reverify(),
                pending_reviews(),
                reload_config(),
                verification_log(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id().map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx.say(format!("An error occurred: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!("Argument parse error in '{}': {} (input: {:?})", ctx.command().qualified_name, error, input);
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!("Bot missing permissions for '{}': {:?}", ctx.command().qualified_name, missing_permissions);
                            let _ = ctx.say(format!("Bot is missing permissions: {:?}", missing_permissions)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions { missing_permissions, ctx, .. } => {
                            error!("User {} missing permissions for '{}': {:?}", ctx.author().name, ctx.command().qualified_name, missing_permissions);
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let config_manager = config_manager.clone();
            let review_queue = review_queue.clone();
            let log_buffer = log_buffer.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                let settings = config_manager.read().await.settings().clone();

                let guild_ids: Vec<serenity::GuildId> = ready.guilds.iter().map(|g| g.id).collect();
                if !guild_ids.is_empty() {
                    let managed_roles = vec![
                        settings.roles.resident.clone(),
                        settings.roles.ra_staff.clone(),
                        settings.roles.leadership.clone(),
                        settings.roles.rise.clone(),
                    ];
                    run_startup_permission_check(ctx.http.as_ref(), &guild_ids, &managed_roles).await;
                } else {
                    warn!("Bot is not in any guilds - skipping permission check");
                }

                let guilds_to_register: Vec<serenity::GuildId> = match target_guild_id {
                    Some(gid) => vec![serenity::GuildId::new(gid)],
                    None => guild_ids.clone(),
                };

                if guild_commands || sync_commands {
                    for guild_id in &guilds_to_register {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        ).await {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!("Successfully registered {} commands for guild {}",
                                  framework.options().commands.len(), guild_id);
                        }
                    }
                } else {
                    info!("Registering commands globally...");
                    if let Err(e) = poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    ).await {
                        error!("Failed to register commands globally: {}", e);
                    } else {
                        info!("Successfully registered {} commands globally (may take up to 1 hour to propagate)",
                              framework.options().commands.len());
                    }
                }

                let directory = create_shared_guild_directory(ctx.http.clone());
                let role_catalog = create_shared_role_catalog(directory);

                let approval: Arc<dyn ApprovalAuthority> = match &settings.review_channel {
                    Some(channel) => {
                        info!("Verifications will be reviewed in #{}", channel);
                        Arc::new(ModeratorReview::new(
                            ctx.http.clone(),
                            channel.clone(),
                            review_queue.clone(),
                        ))
                    }
                    None => {
                        warn!("No review channel configured, approving every verification automatically");
                        Arc::new(AutomaticApproval)
                    }
                };

                let workflow = VerificationWorkflow::new(
                    Arc::new(CollegeMajorSelector::new(config_manager.clone())),
                    Arc::new(ConfigAuthorization::new(config_manager.clone())),
                    approval,
                    OutcomeApplier::new(role_catalog.clone()),
                );
                let verification_manager = create_shared_verification_manager(
                    Arc::new(workflow),
                    config_manager.clone(),
                );

                Ok(Data {
                    config_manager,
                    verification_manager,
                    role_catalog,
                    review_queue,
                    log_buffer,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let privileged_intents: Vec<&str> = [
        (serenity::GatewayIntents::MESSAGE_CONTENT, "MESSAGE_CONTENT"),
        (serenity::GatewayIntents::GUILD_MEMBERS, "GUILD_MEMBERS"),
        (serenity::GatewayIntents::GUILD_PRESENCES, "GUILD_PRESENCES"),
    ]
    .into_iter()
    .filter(|(intent, _)| intents.contains(*intent))
    .map(|(_, name)| name)
    .collect();

    info!("Requesting privileged intents: {:?}", privileged_intents);

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The following privileged intents need to be enabled in the Discord Developer Portal:");
            for intent in &privileged_intents {
                error!("  - {}", intent);
            }
            error!("Go to https://discord.com/developers/applications -> Your App -> Bot -> Privileged Gateway Intents");
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable these in Discord Developer Portal: {:?}",
                privileged_intents
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}

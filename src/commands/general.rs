use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    ctx.send(poise::CreateReply::default()
        .content("Pong! Bot is working!")
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Bot Commands")
        .description("New members are verified over DM when they join. Available commands:")
        .field("/ping", "Check if the bot is running", false)
        .field("/approve", "Approve a pending verification (Manage Roles)", false)
        .field("/deny", "Deny a pending verification and remove the member (Manage Roles)", false)
        .field("/reverify", "Start verification again for a member (Manage Roles)", false)
        .field("/pending_reviews", "List verifications in progress and awaiting review (Manage Roles)", false)
        .field("/reload_config", "Reload configuration files from disk (Admin)", false)
        .field("/verification_log", "Show recent verification log lines (Admin)", false)
        .color(0x3498db);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

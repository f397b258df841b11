use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::error::BotError;
use crate::verification::MemberRef;
use crate::{Data, Error};

/// Handle when the bot joins a new guild or starts up
pub async fn handle_guild_create(
    _ctx: &serenity::Context,
    guild: &serenity::Guild,
    data: &Data,
) -> Result<(), Error> {
    info!("Processing guild: {} ({})", guild.name, guild.id);

    let config = data.config_manager.read().await;
    let settings = config.settings();

    let has_text_channel = |name: &str| {
        guild
            .channels
            .values()
            .any(|c| c.kind == serenity::ChannelType::Text && c.name == name)
    };

    if !has_text_channel(&settings.rules_channel) {
        warn!(
            "Guild {} has no #{} channel; denied members cannot be invited back",
            guild.id, settings.rules_channel
        );
    }
    match &settings.review_channel {
        Some(review) if !has_text_channel(review) => {
            warn!(
                "Guild {} has no #{} channel; verifications will fail at review",
                guild.id, review
            );
        }
        Some(review) => info!("Verifications in {} are reviewed in #{}", guild.id, review),
        None => info!("Verifications in {} are approved automatically", guild.id),
    }

    Ok(())
}

/// Handle when a new member joins the guild
pub async fn handle_member_add(
    ctx: &serenity::Context,
    new_member: &serenity::Member,
    data: &Data,
) -> Result<(), Error> {
    if new_member.user.bot {
        debug!("Ignoring bot {} joining {}", new_member.user.name, new_member.guild_id);
        return Ok(());
    }

    info!(
        "New member joined: {} in guild {}",
        new_member.user.name, new_member.guild_id
    );

    match data
        .verification_manager
        .begin(ctx.http.clone(), MemberRef::from(new_member))
        .await
    {
        Ok(_) => Ok(()),
        Err(BotError::SessionActive { user_id }) => {
            warn!("{} rejoined while still being verified", user_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle when a member leaves or is removed from the guild
pub async fn handle_member_remove(
    guild_id: serenity::GuildId,
    user: &serenity::User,
    data: &Data,
) -> Result<(), Error> {
    if data.verification_manager.cancel(guild_id, user.id) {
        info!(
            "Cancelled verification of {} ({}) after they left guild {}",
            user.name, user.id, guild_id
        );
    }
    if data.review_queue.cancel(guild_id, user.id) {
        info!(
            "Dropped pending review for {} ({}) in guild {}",
            user.name, user.id, guild_id
        );
    }
    Ok(())
}

/// Handle when a role is deleted from the guild
pub async fn handle_role_delete(
    guild_id: serenity::GuildId,
    role_id: serenity::RoleId,
    data: &Data,
) -> Result<(), Error> {
    debug!("Role {} deleted in guild {}", role_id, guild_id);
    data.role_catalog.forget_role(guild_id, role_id).await;
    Ok(())
}

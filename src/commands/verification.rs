use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::error::BotError;
use crate::verification::{ApprovalDecision, MemberRef};
use crate::{Context, Error};

async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default()
        .content(content)
        .ephemeral(true))
        .await?;
    Ok(())
}

async fn decide(
    ctx: Context<'_>,
    member: &serenity::User,
    decision: ApprovalDecision,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return reply(ctx, "This command only works in a server.").await;
    };
    let approved = decision.is_approved();
    if ctx.data().review_queue.decide(guild_id, member.id, decision) {
        info!(
            "{} {} the verification of {} ({})",
            ctx.author().name,
            if approved { "approved" } else { "denied" },
            member.name,
            member.id
        );
        reply(
            ctx,
            format!(
                "Verification of <@{}> {}.",
                member.id,
                if approved { "approved" } else { "denied" }
            ),
        )
        .await
    } else {
        warn!(
            "{} tried to decide on {} but nothing was pending",
            ctx.author().name,
            member.id
        );
        reply(ctx, format!("<@{}> has no verification awaiting review.", member.id)).await
    }
}

/// Approve a pending verification
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_ROLES",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn approve(
    ctx: Context<'_>,
    #[description = "Member whose verification to approve"] member: serenity::User,
) -> Result<(), Error> {
    decide(ctx, &member, ApprovalDecision::Approved).await
}

/// Deny a pending verification
///
/// The member is sent a fresh invite and removed. The reason is only kept in the bot log.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_ROLES",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn deny(
    ctx: Context<'_>,
    #[description = "Member whose verification to deny"] member: serenity::User,
    #[description = "Reason (not shown to the member)"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    decide(ctx, &member, ApprovalDecision::Denied { reason }).await
}

/// Start verification again for a member
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_ROLES",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn reverify(
    ctx: Context<'_>,
    #[description = "Member to verify again"] member: serenity::Member,
) -> Result<(), Error> {
    let http = ctx.serenity_context().http.clone();
    match ctx
        .data()
        .verification_manager
        .begin(http, MemberRef::from(&member))
        .await
    {
        Ok(session_id) => {
            info!(
                "{} restarted verification of {} as {}",
                ctx.author().name,
                member.user.id,
                session_id
            );
            reply(ctx, format!("Sent <@{}> a new verification DM.", member.user.id)).await
        }
        Err(BotError::SessionActive { .. }) => {
            reply(ctx, format!("<@{}> is already being verified.", member.user.id)).await
        }
        Err(BotError::MemberUnreachable { .. }) => {
            reply(
                ctx,
                format!(
                    "I couldn't message <@{}>. They need to allow DMs from server members.",
                    member.user.id
                ),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// List verifications in progress and awaiting review
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_ROLES",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn pending_reviews(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return reply(ctx, "This command only works in a server.").await;
    };
    let data = ctx.data();
    let awaiting = data.review_queue.pending_members(guild_id);
    let conversing: Vec<_> = data
        .verification_manager
        .active_sessions()
        .into_iter()
        .filter(|(user_id, session)| session.guild_id == guild_id && !awaiting.contains(user_id))
        .collect();

    let awaiting_text = if awaiting.is_empty() {
        "None".to_string()
    } else {
        awaiting
            .iter()
            .map(|id| format!("<@{}>", id))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let conversing_text = if conversing.is_empty() {
        "None".to_string()
    } else {
        conversing
            .iter()
            .map(|(id, session)| {
                format!("<@{}> since <t:{}:R>", id, session.started_at.timestamp())
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title("Verifications")
        .field("Awaiting review", awaiting_text, false)
        .field("Answering questions", conversing_text, false)
        .color(0x5865F2);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::{Context, Error};

/// Most lines `/verification_log` will show
const MAX_LOG_LINES: usize = 50;

/// Leave room for the code fence inside Discord's 2000 character limit
const MAX_LOG_CHARS: usize = 1900;

/// Reload configuration files from disk
///
/// A broken file is reported and the previous configuration stays active.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn reload_config(ctx: Context<'_>) -> Result<(), Error> {
    info!("reload_config called by {}", ctx.author().name);

    let mut config_manager = ctx.data().config_manager.write().await;
    let content = match config_manager.load_all().await {
        Ok(()) => {
            let settings = config_manager.settings();
            format!(
                "**Configuration reloaded**\n\
                Floors: {}\n\
                Colleges: {}\n\
                Rules channel: #{}\n\n\
                Changes to the review channel take effect after a restart.",
                settings.floors.join(", "),
                config_manager.majors().colleges.len(),
                settings.rules_channel,
            )
        }
        Err(e) => {
            error!("Config reload failed: {}", e);
            format!(
                "**Reload failed**\n\n{}\n\nThe previous configuration is still active.",
                e
            )
        }
    };
    drop(config_manager);

    ctx.send(poise::CreateReply::default()
        .content(content)
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Show recent verification log lines
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn verification_log(
    ctx: Context<'_>,
    #[description = "Only lines about this member"] member: Option<serenity::User>,
    #[description = "Number of lines (default 20)"] count: Option<usize>,
) -> Result<(), Error> {
    let count = count.unwrap_or(20).clamp(1, MAX_LOG_LINES);
    let log_buffer = &ctx.data().log_buffer;

    let entries = match &member {
        Some(user) => log_buffer.get_matching(&user.id.to_string(), count),
        None => log_buffer.get_recent(count),
    };

    let content = if entries.is_empty() {
        "No matching log lines.".to_string()
    } else {
        format!("```\n{}\n```", fit_lines(entries.iter().map(|e| e.format()), MAX_LOG_CHARS))
    };

    ctx.send(poise::CreateReply::default()
        .content(content)
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Keep the newest lines that fit in `max_chars`, in their original order
fn fit_lines(lines: impl DoubleEndedIterator<Item = String>, max_chars: usize) -> String {
    let mut kept = Vec::new();
    let mut used = 0;
    for line in lines.rev() {
        if used + line.len() + 1 > max_chars {
            break;
        }
        used += line.len() + 1;
        kept.push(line);
    }
    kept.reverse();
    kept.join("\n")
}

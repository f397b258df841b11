use poise::serenity_prelude as serenity;
use tracing::debug;

use crate::{Data, Error};

/// Handle incoming messages
pub async fn handle_message(
    _ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Ignore bot messages
    if msg.author.bot {
        return Ok(());
    }

    // Only DMs carry verification answers
    if msg.guild_id.is_some() {
        return Ok(());
    }

    if !data
        .verification_manager
        .deliver(msg.author.id, msg.channel_id, &msg.content)
    {
        debug!("DM from {} outside of a verification", msg.author.name);
    }

    Ok(())
}

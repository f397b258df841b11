use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, GuildId, Http, RoleId, UserId};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::verification::GuildDirectory;

/// Guild operations backed by the Discord HTTP API
pub struct SerenityGuildDirectory {
    http: Arc<Http>,
}

impl SerenityGuildDirectory {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GuildDirectory for SerenityGuildDirectory {
    async fn roles(&self, guild_id: GuildId) -> Result<Vec<(String, RoleId)>> {
        let roles = guild_id.roles(&self.http).await?;
        Ok(roles
            .into_iter()
            .map(|(role_id, role)| (role.name, role_id))
            .collect())
    }

    async fn create_role(&self, guild_id: GuildId, name: &str) -> Result<RoleId> {
        let role = guild_id
            .create_role(&self.http, serenity::EditRole::new().name(name))
            .await?;
        Ok(role.id)
    }

    async fn add_roles(&self, guild_id: GuildId, user_id: UserId, role_ids: &[RoleId]) -> Result<()> {
        let member = guild_id.member(&self.http, user_id).await?;
        member.add_roles(&self.http, role_ids).await?;
        debug!("Added {} roles to {} in guild {}", role_ids.len(), user_id, guild_id);
        Ok(())
    }

    async fn set_nickname(&self, guild_id: GuildId, user_id: UserId, nickname: &str) -> Result<()> {
        guild_id
            .edit_member(&self.http, user_id, serenity::EditMember::new().nickname(nickname))
            .await?;
        Ok(())
    }

    async fn create_invite(
        &self,
        guild_id: GuildId,
        channel_name: &str,
        max_age_secs: u32,
        reason: &str,
    ) -> Result<String> {
        let channels = guild_id.channels(&self.http).await?;
        let channel = channels
            .values()
            .find(|c| c.kind == serenity::ChannelType::Text && c.name == channel_name)
            .ok_or_else(|| BotError::ChannelNotFound {
                name: channel_name.to_string(),
            })?;

        let invite = channel
            .id
            .create_invite(
                &self.http,
                serenity::CreateInvite::new()
                    .max_age(max_age_secs)
                    .max_uses(1)
                    .temporary(true)
                    .unique(true)
                    .audit_log_reason(reason),
            )
            .await?;

        info!("Created invite {} to #{} in guild {}", invite.code, channel_name, guild_id);
        Ok(invite.url())
    }

    async fn remove_member(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> Result<()> {
        guild_id.kick_with_reason(&self.http, user_id, reason).await?;
        Ok(())
    }
}

pub fn create_shared_guild_directory(http: Arc<Http>) -> Arc<dyn GuildDirectory> {
    Arc::new(SerenityGuildDirectory::new(http))
}

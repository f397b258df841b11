use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude::{GuildId, RoleId, UserId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;

/// The guild operations verification needs from Discord
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// All roles currently in the guild
    async fn roles(&self, guild_id: GuildId) -> Result<Vec<(String, RoleId)>>;

    async fn create_role(&self, guild_id: GuildId, name: &str) -> Result<RoleId>;

    async fn add_roles(&self, guild_id: GuildId, user_id: UserId, role_ids: &[RoleId]) -> Result<()>;

    async fn set_nickname(&self, guild_id: GuildId, user_id: UserId, nickname: &str) -> Result<()>;

    /// Create a single-use, temporary invite to the named channel and return its URL
    async fn create_invite(
        &self,
        guild_id: GuildId,
        channel_name: &str,
        max_age_secs: u32,
        reason: &str,
    ) -> Result<String>;

    async fn remove_member(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> Result<()>;
}

type Slot = Arc<Mutex<Option<RoleId>>>;

/// Resolves role names to IDs, creating roles that don't exist yet.
///
/// Each (guild, name) pair has its own lock, held across the lookup and the
/// creation, so concurrent sessions never create the same role twice.
pub struct RoleCatalog {
    directory: Arc<dyn GuildDirectory>,
    slots: DashMap<(GuildId, String), Slot>,
}

impl RoleCatalog {
    pub fn new(directory: Arc<dyn GuildDirectory>) -> Self {
        Self {
            directory,
            slots: DashMap::new(),
        }
    }

    /// Get the ID of the role with exactly this name, creating it if absent
    pub async fn resolve(&self, guild_id: GuildId, name: &str) -> Result<RoleId> {
        // Clone the slot out so the map shard is not locked while we await
        let slot: Slot = self
            .slots
            .entry((guild_id, name.to_string()))
            .or_default()
            .clone();

        let mut cached = slot.lock().await;
        if let Some(role_id) = *cached {
            return Ok(role_id);
        }

        let existing = self.directory.roles(guild_id).await?;
        let role_id = match existing.into_iter().find(|(n, _)| n == name) {
            Some((_, role_id)) => {
                debug!("Role '{}' already exists in guild {}", name, guild_id);
                role_id
            }
            None => {
                let role_id = self.directory.create_role(guild_id, name).await?;
                info!("Created role '{}' with ID {} in guild {}", name, role_id, guild_id);
                role_id
            }
        };

        *cached = Some(role_id);
        Ok(role_id)
    }

    /// Drop a cached ID after its role was deleted from the guild.
    ///
    /// Waits for any resolve in progress on the same slot, so the deleted ID
    /// can never stay cached.
    pub async fn forget_role(&self, guild_id: GuildId, role_id: RoleId) {
        let slots: Vec<(String, Slot)> = self
            .slots
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();

        for (name, slot) in slots {
            let mut cached = slot.lock().await;
            if *cached == Some(role_id) {
                debug!("Forgetting deleted role '{}' ({})", name, role_id);
                *cached = None;
            }
        }
    }

    /// Get the directory the catalog resolves against
    pub fn directory(&self) -> &Arc<dyn GuildDirectory> {
        &self.directory
    }
}

/// Shared role catalog type
pub type SharedRoleCatalog = Arc<RoleCatalog>;

pub fn create_shared_role_catalog(directory: Arc<dyn GuildDirectory>) -> SharedRoleCatalog {
    Arc::new(RoleCatalog::new(directory))
}

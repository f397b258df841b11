use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use std::collections::HashSet;

use crate::error::Result;

/// Source of the member IDs allowed to use a capability
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    async fn authorized_ids(&self, capability: &str) -> Result<HashSet<UserId>>;
}

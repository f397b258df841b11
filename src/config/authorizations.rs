use poise::serenity_prelude::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Capability checked before a member may verify as leadership
pub const LEADERSHIP_CAPABILITY: &str = "validate.leadership";

/// Maps capability names to the Discord IDs allowed to use them
/// Loaded from data/authorizations.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthorizationConfig {
    /// e.g., {"validate.leadership": ["123456789012345678"]}
    pub capabilities: HashMap<String, Vec<String>>,
}

impl AuthorizationConfig {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
            path: path.to_string(),
            source: e,
        })
    }

    /// All member IDs holding a capability. Entries that are not snowflakes are skipped.
    pub fn authorized_ids(&self, capability: &str) -> HashSet<UserId> {
        let Some(ids) = self.capabilities.get(capability) else {
            return HashSet::new();
        };

        ids.iter()
            .filter_map(|raw| match raw.trim().parse::<u64>() {
                Ok(id) if id != 0 => Some(UserId::new(id)),
                _ => {
                    warn!("Ignoring invalid member id '{}' for capability '{}'", raw, capability);
                    None
                }
            })
            .collect()
    }
}

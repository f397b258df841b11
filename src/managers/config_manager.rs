use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AuthorizationConfig, MajorCatalogConfig, VerificationSettings};
use crate::error::Result;
use crate::verification::AuthorizationSource;

/// Manages all configuration loading and reloading
pub struct ConfigManager {
    /// Flow settings (from verification.json)
    settings: VerificationSettings,

    /// Capability grants (from authorizations.json)
    authorizations: AuthorizationConfig,

    /// College/major catalog (from majors.json)
    majors: MajorCatalogConfig,

    /// Base path for data files
    data_path: String,
}

impl ConfigManager {
    /// Create a config manager holding the built-in defaults
    pub fn new(data_path: &str) -> Self {
        Self {
            settings: VerificationSettings::default(),
            authorizations: AuthorizationConfig::default(),
            majors: MajorCatalogConfig::default(),
            data_path: data_path.to_string(),
        }
    }

    /// Load all configurations from the data directory
    ///
    /// Structure:
    /// data/
    /// ├── verification.json    # Floors, role names, channels
    /// ├── authorizations.json  # Capability -> Discord IDs
    /// └── majors.json          # Colleges and majors
    ///
    /// A missing file keeps the built-in default. A broken file is an error and
    /// leaves the previously loaded configuration untouched.
    pub async fn load_all(&mut self) -> Result<()> {
        let settings = match self.existing_file("verification.json") {
            Some(path) => VerificationSettings::load_from_file(&path)?,
            None => VerificationSettings::default(),
        };

        let authorizations = match self.existing_file("authorizations.json") {
            Some(path) => AuthorizationConfig::load_from_file(&path)?,
            None => {
                warn!("No authorizations.json found, nobody can verify as leadership");
                AuthorizationConfig::default()
            }
        };

        let majors = match self.existing_file("majors.json") {
            Some(path) => MajorCatalogConfig::load_from_file(&path)?,
            None => MajorCatalogConfig::default(),
        };

        info!(
            "Config loaded: {} floors, {} capabilities, {} colleges, review_channel={:?}",
            settings.floors.len(),
            authorizations.capabilities.len(),
            majors.colleges.len(),
            settings.review_channel,
        );

        self.settings = settings;
        self.authorizations = authorizations;
        self.majors = majors;
        Ok(())
    }

    fn existing_file(&self, name: &str) -> Option<String> {
        let path = Path::new(&self.data_path).join(name);
        path.exists().then(|| path.to_string_lossy().into_owned())
    }

    // ========== Query Operations ==========

    pub fn settings(&self) -> &VerificationSettings {
        &self.settings
    }

    pub fn authorizations(&self) -> &AuthorizationConfig {
        &self.authorizations
    }

    pub fn majors(&self) -> &MajorCatalogConfig {
        &self.majors
    }
}

/// Shared config manager type
pub type SharedConfigManager = Arc<tokio::sync::RwLock<ConfigManager>>;

pub fn create_shared_config_manager(data_path: &str) -> SharedConfigManager {
    Arc::new(tokio::sync::RwLock::new(ConfigManager::new(data_path)))
}

/// Authorization source backed by the live authorizations.json
pub struct ConfigAuthorization {
    config_manager: SharedConfigManager,
}

impl ConfigAuthorization {
    pub fn new(config_manager: SharedConfigManager) -> Self {
        Self { config_manager }
    }
}

#[async_trait]
impl AuthorizationSource for ConfigAuthorization {
    async fn authorized_ids(&self, capability: &str) -> Result<HashSet<UserId>> {
        let config = self.config_manager.read().await;
        Ok(config.authorizations().authorized_ids(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LEADERSHIP_CAPABILITY;

    fn temp_data_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ebeaver-{}-{}", tag, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_files_use_defaults() {
        let dir = temp_data_dir("defaults");
        let mut manager = ConfigManager::new(dir.to_str().unwrap());
        manager.load_all().await.unwrap();

        assert_eq!(manager.settings().rules_channel, "rules");
        assert!(manager.authorizations().capabilities.is_empty());
        assert!(!manager.majors().colleges.is_empty());
    }

    #[tokio::test]
    async fn test_authorization_source_reads_loaded_file() {
        let dir = temp_data_dir("auth");
        std::fs::write(
            dir.join("authorizations.json"),
            r#"{"capabilities": {"validate.leadership": ["77"]}}"#,
        )
        .unwrap();

        let shared = create_shared_config_manager(dir.to_str().unwrap());
        shared.write().await.load_all().await.unwrap();

        let source = ConfigAuthorization::new(shared);
        let ids = source.authorized_ids(LEADERSHIP_CAPABILITY).await.unwrap();
        assert!(ids.contains(&UserId::new(77)));
    }

    #[tokio::test]
    async fn test_broken_file_keeps_previous_config() {
        let dir = temp_data_dir("broken");
        std::fs::write(dir.join("verification.json"), r#"{"floors": ["A"]}"#).unwrap();

        let mut manager = ConfigManager::new(dir.to_str().unwrap());
        manager.load_all().await.unwrap();
        assert_eq!(manager.settings().floors, vec!["A".to_string()]);

        std::fs::write(dir.join("verification.json"), "{ not json").unwrap();
        assert!(manager.load_all().await.is_err());
        assert_eq!(manager.settings().floors, vec!["A".to_string()]);
    }
}

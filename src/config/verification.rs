use serde::{Deserialize, Serialize};

/// Verification settings - floors, role names and channels used by the flow
/// Loaded from data/verification.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationSettings {
    /// Floor labels a resident may answer with
    #[serde(default = "default_floors")]
    pub floors: Vec<String>,

    /// Names of the roles granted on approval
    #[serde(default)]
    pub roles: RoleNames,

    /// Channel the single-use invite of a denied member points at
    #[serde(default = "default_rules_channel")]
    pub rules_channel: String,

    /// Channel where moderators review submissions.
    /// When unset, every submission is approved automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_channel: Option<String>,

    /// Lifetime of the invite sent to a denied member, in seconds
    #[serde(default = "default_invite_max_age")]
    pub invite_max_age_secs: u32,
}

/// Role names used when granting access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoleNames {
    #[serde(default = "default_resident_role")]
    pub resident: String,
    #[serde(default = "default_ra_role")]
    pub ra_staff: String,
    #[serde(default = "default_leadership_role")]
    pub leadership: String,
    #[serde(default = "default_rise_role")]
    pub rise: String,
}

fn default_floors() -> Vec<String> {
    (2..=10).map(|f| f.to_string()).collect()
}

fn default_rules_channel() -> String {
    "rules".to_string()
}

fn default_invite_max_age() -> u32 {
    86_400
}

fn default_resident_role() -> String {
    "Resident".to_string()
}

fn default_ra_role() -> String {
    "RA Staff".to_string()
}

fn default_leadership_role() -> String {
    "Leadership".to_string()
}

fn default_rise_role() -> String {
    "RiSE".to_string()
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            resident: default_resident_role(),
            ra_staff: default_ra_role(),
            leadership: default_leadership_role(),
            rise: default_rise_role(),
        }
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            floors: default_floors(),
            roles: RoleNames::default(),
            rules_channel: default_rules_channel(),
            review_channel: None,
            invite_max_age_secs: default_invite_max_age(),
        }
    }
}

impl VerificationSettings {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
                path: path.to_string(),
                source: e,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the verification flow cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.floors.is_empty() {
            return Err(crate::error::BotError::ConfigValidation {
                message: "at least one floor label is required".to_string(),
            });
        }
        if self.rules_channel.trim().is_empty() {
            return Err(crate::error::BotError::ConfigValidation {
                message: "rules_channel must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_residence_halls() {
        let settings = VerificationSettings::default();
        assert_eq!(settings.floors.first().map(String::as_str), Some("2"));
        assert_eq!(settings.floors.last().map(String::as_str), Some("10"));
        assert_eq!(settings.roles.rise, "RiSE");
        assert!(settings.review_channel.is_none());
    }

    #[test]
    fn test_parse_partial_settings() {
        let json = r##"{
            "floors": ["1", "2", "3"],
            "review_channel": "verification-review",
            "roles": { "resident": "Member" }
        }"##;

        let settings: VerificationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.floors.len(), 3);
        assert_eq!(settings.review_channel.as_deref(), Some("verification-review"));
        assert_eq!(settings.roles.resident, "Member");
        assert_eq!(settings.roles.ra_staff, "RA Staff");
        assert_eq!(settings.rules_channel, "rules");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_floors_rejected() {
        let settings = VerificationSettings {
            floors: vec![],
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}

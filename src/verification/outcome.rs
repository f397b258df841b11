use poise::serenity_prelude::RoleId;
use tracing::{error, info, warn};

use super::approval::ApprovalDecision;
use super::catalog::SharedRoleCatalog;
use super::prompt::PromptChannel;
use super::record::VerificationRecord;
use crate::config::VerificationSettings;
use crate::error::Result;
use crate::messages;

/// Terminal result of a verification
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Granted { role_ids: Vec<RoleId>, nickname: String },
    Denied { invite_url: String },
}

/// Carries out an approval decision in the guild
pub struct OutcomeApplier {
    catalog: SharedRoleCatalog,
}

impl OutcomeApplier {
    pub fn new(catalog: SharedRoleCatalog) -> Self {
        Self { catalog }
    }

    pub async fn apply(
        &self,
        record: &VerificationRecord,
        decision: &ApprovalDecision,
        settings: &VerificationSettings,
        prompt: &mut dyn PromptChannel,
    ) -> Result<Outcome> {
        match decision {
            ApprovalDecision::Approved => self.grant(record, settings, prompt).await,
            ApprovalDecision::Denied { reason } => {
                info!(
                    "Verification of {} denied: {}",
                    record.member.id,
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.deny(record, settings, prompt).await
            }
        }
    }

    /// Resolve and add roles, then set the nickname.
    ///
    /// A role that cannot be resolved is logged and skipped. Adding the
    /// remaining roles and setting the nickname are attempted independently
    /// and only logged on failure.
    async fn grant(
        &self,
        record: &VerificationRecord,
        settings: &VerificationSettings,
        prompt: &mut dyn PromptChannel,
    ) -> Result<Outcome> {
        let guild_id = record.member.guild_id;
        let user_id = record.member.id;

        let mut role_ids = Vec::new();
        for name in record.role_names(&settings.roles) {
            match self.catalog.resolve(guild_id, &name).await {
                Ok(role_id) if !role_ids.contains(&role_id) => role_ids.push(role_id),
                Ok(_) => {}
                Err(e) => error!(
                    "Failed to resolve role '{}' for {} in guild {}: {}. Bot requires 'Manage Roles' permission to create missing roles.",
                    name, user_id, guild_id, e
                ),
            }
        }

        let nickname = record.nickname();
        let directory = self.catalog.directory();

        if role_ids.is_empty() {
            error!("No roles could be resolved for {} in guild {}", user_id, guild_id);
        } else if let Err(e) = directory.add_roles(guild_id, user_id, &role_ids).await {
            error!(
                "Failed to assign {} roles to {} in guild {}: {}. Bot requires 'Manage Roles' permission and a role above the ones it assigns.",
                role_ids.len(),
                user_id,
                guild_id,
                e
            );
        }

        if let Err(e) = directory.set_nickname(guild_id, user_id, &nickname).await {
            error!(
                "Failed to set nickname '{}' for {} in guild {}: {}. Bot requires 'Manage Nicknames' permission and must have a higher role than the target user.",
                nickname, user_id, guild_id, e
            );
        }

        if let Err(e) = prompt.send(&messages::approved_message(&record.name)).await {
            warn!("Failed to send welcome message to {}: {}", user_id, e);
        }

        info!("Granted {} roles to {} as '{}'", role_ids.len(), user_id, nickname);
        Ok(Outcome::Granted { role_ids, nickname })
    }

    /// Invite first, then the denial notice, then the removal. Without an
    /// invite the member is left in the guild.
    async fn deny(
        &self,
        record: &VerificationRecord,
        settings: &VerificationSettings,
        prompt: &mut dyn PromptChannel,
    ) -> Result<Outcome> {
        let guild_id = record.member.guild_id;
        let user_id = record.member.id;
        let directory = self.catalog.directory();

        let invite_reason = format!("Invite for {}", record.member.username);
        let invite_url = directory
            .create_invite(
                guild_id,
                &settings.rules_channel,
                settings.invite_max_age_secs,
                &invite_reason,
            )
            .await?;

        if let Err(e) = prompt.send(&messages::denied_message(&invite_url)).await {
            warn!("Failed to send denial notice to {}: {}", user_id, e);
        }

        if let Err(e) = directory
            .remove_member(guild_id, user_id, "Verification denied")
            .await
        {
            error!(
                "Failed to remove denied member {} from guild {}: {}. Bot requires 'Kick Members' permission.",
                user_id, guild_id, e
            );
        } else {
            info!("Removed denied member {} from guild {}", user_id, guild_id);
        }

        Ok(Outcome::Denied { invite_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::answers::{Building, CategoryKind, Floor};
    use crate::verification::catalog::create_shared_role_catalog;
    use crate::verification::record::RecordBuilder;
    use crate::verification::testing::{member, DirectoryCall, MockDirectory, ScriptedPrompt};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn resident(rise_member: bool) -> VerificationRecord {
        let settings = VerificationSettings::default();
        let mut builder = RecordBuilder::new();
        builder
            .name("Alex")
            .category(CategoryKind::Resident)
            .major("CS")
            .building(Building::Byrnes)
            .floor(Floor::parse("6", &settings.floors).unwrap())
            .rise_member(rise_member);
        builder.build(member(1)).unwrap()
    }

    fn applier(directory: &Arc<MockDirectory>) -> OutcomeApplier {
        OutcomeApplier::new(create_shared_role_catalog(directory.clone()))
    }

    fn granted_names(directory: &MockDirectory, outcome: &Outcome) -> HashSet<String> {
        match outcome {
            Outcome::Granted { role_ids, .. } => role_ids
                .iter()
                .filter_map(|id| directory.role_name(*id))
                .collect(),
            other => panic!("expected a grant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_grant_resident_roles_and_nickname() {
        let directory = Arc::new(MockDirectory::new().with_role("Resident", 10));
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        let settings = VerificationSettings::default();

        let outcome = applier(&directory)
            .apply(&resident(true), &ApprovalDecision::Approved, &settings, &mut prompt)
            .await
            .unwrap();

        let expected: HashSet<String> = ["Resident", "CS", "Byrnes", "RiSE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(granted_names(&directory, &outcome), expected);
        assert!(directory
            .calls()
            .contains(&DirectoryCall::SetNickname(member(1).id, "Alex | Byrnes 6".to_string())));
        assert_eq!(prompt.sent(), [messages::approved_message("Alex")]);
        assert_eq!(directory.count(|c| matches!(c, DirectoryCall::CreateInvite(_))), 0);
    }

    #[tokio::test]
    async fn test_grant_without_rise() {
        let directory = Arc::new(MockDirectory::new());
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

        let outcome = applier(&directory)
            .apply(
                &resident(false),
                &ApprovalDecision::Approved,
                &VerificationSettings::default(),
                &mut prompt,
            )
            .await
            .unwrap();

        assert_eq!(granted_names(&directory, &outcome).len(), 3);
        assert!(!granted_names(&directory, &outcome).contains("RiSE"));
    }

    #[tokio::test]
    async fn test_nickname_attempted_when_roles_fail() {
        let directory = Arc::new(MockDirectory::new().failing_add_roles());
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

        let outcome = applier(&directory)
            .apply(
                &resident(true),
                &ApprovalDecision::Approved,
                &VerificationSettings::default(),
                &mut prompt,
            )
            .await;

        assert!(matches!(outcome, Ok(Outcome::Granted { .. })));
        assert_eq!(directory.count(|c| matches!(c, DirectoryCall::SetNickname(..))), 1);
    }

    #[tokio::test]
    async fn test_roles_attempted_when_nickname_fails() {
        let directory = Arc::new(MockDirectory::new().failing_nickname());
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

        let outcome = applier(&directory)
            .apply(
                &resident(true),
                &ApprovalDecision::Approved,
                &VerificationSettings::default(),
                &mut prompt,
            )
            .await;

        assert!(matches!(outcome, Ok(Outcome::Granted { .. })));
        assert_eq!(directory.count(|c| matches!(c, DirectoryCall::AddRoles(..))), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_roles_do_not_block_the_rest() {
        let directory = Arc::new(
            MockDirectory::new()
                .with_role("Resident", 10)
                .with_role("Byrnes", 11)
                .failing_create_role(),
        );
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

        let outcome = applier(&directory)
            .apply(
                &resident(true),
                &ApprovalDecision::Approved,
                &VerificationSettings::default(),
                &mut prompt,
            )
            .await
            .unwrap();

        let granted = vec![RoleId::new(10), RoleId::new(11)];
        assert_eq!(
            outcome,
            Outcome::Granted {
                role_ids: granted.clone(),
                nickname: "Alex | Byrnes 6".to_string()
            }
        );
        assert!(directory
            .calls()
            .contains(&DirectoryCall::AddRoles(member(1).id, granted)));
        assert_eq!(directory.count(|c| matches!(c, DirectoryCall::SetNickname(..))), 1);
        assert_eq!(prompt.sent(), [messages::approved_message("Alex")]);
    }

    #[tokio::test]
    async fn test_denial_invites_then_removes() {
        let directory = Arc::new(MockDirectory::new());
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        let decision = ApprovalDecision::Denied {
            reason: Some("moderator note: lives off campus".to_string()),
        };

        let outcome = applier(&directory)
            .apply(&resident(true), &decision, &VerificationSettings::default(), &mut prompt)
            .await
            .unwrap();

        assert_eq!(
            directory.calls(),
            vec![
                DirectoryCall::CreateInvite("rules".to_string()),
                DirectoryCall::RemoveMember(member(1).id),
            ]
        );
        assert_eq!(
            outcome,
            Outcome::Denied {
                invite_url: "https://discord.gg/abc123".to_string()
            }
        );
        assert_eq!(prompt.sent().len(), 1);
        assert!(prompt.sent()[0].contains("https://discord.gg/abc123"));
        assert!(!prompt.sent()[0].contains("off campus"));
    }

    #[tokio::test]
    async fn test_denial_without_invite_keeps_member() {
        let directory = Arc::new(MockDirectory::new().failing_invite());
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

        let result = applier(&directory)
            .apply(
                &resident(true),
                &ApprovalDecision::Denied { reason: None },
                &VerificationSettings::default(),
                &mut prompt,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(directory.count(|c| matches!(c, DirectoryCall::RemoveMember(_))), 0);
        assert!(prompt.sent().is_empty());
    }
}

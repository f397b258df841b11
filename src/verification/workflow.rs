use std::sync::Arc;
use tracing::{error, info};

use super::approval::ApprovalAuthority;
use super::authorization::AuthorizationSource;
use super::outcome::{Outcome, OutcomeApplier};
use super::prompt::PromptChannel;
use super::record::MemberRef;
use super::selector::MajorSelector;
use super::session::VerificationSession;
use crate::config::VerificationSettings;
use crate::error::Result;

/// Everything a verification needs besides the member's prompt channel
pub struct VerificationWorkflow {
    selector: Arc<dyn MajorSelector>,
    authorization: Arc<dyn AuthorizationSource>,
    approval: Arc<dyn ApprovalAuthority>,
    applier: OutcomeApplier,
}

impl VerificationWorkflow {
    pub fn new(
        selector: Arc<dyn MajorSelector>,
        authorization: Arc<dyn AuthorizationSource>,
        approval: Arc<dyn ApprovalAuthority>,
        applier: OutcomeApplier,
    ) -> Self {
        Self {
            selector,
            authorization,
            approval,
            applier,
        }
    }

    /// Converse, submit for approval and apply the decision.
    ///
    /// Any collaborator failure abandons the verification; the member can
    /// start over by rejoining or being re-verified by a moderator.
    pub async fn run(
        &self,
        member: &MemberRef,
        settings: &VerificationSettings,
        prompt: &mut dyn PromptChannel,
    ) -> Result<Outcome> {
        let record = {
            let mut session = VerificationSession::new(
                member,
                &mut *prompt,
                self.selector.as_ref(),
                self.authorization.as_ref(),
                &settings.floors,
            );
            let result = session.run().await;
            match result {
                Ok(record) => record,
                Err(e) => {
                    error!(
                        "Abandoned verification of {} ({}) after step {}: {}",
                        member.username,
                        member.id,
                        session
                            .last_completed()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "none".to_string()),
                        e
                    );
                    return Err(e);
                }
            }
        };

        info!(
            "VERIFIED {} ({}): {}, {}, building={:?}, rise={:?}, override={}",
            member.username,
            member.id,
            record.name,
            record.category_label(),
            record.building(),
            record.rise_member(),
            record.override_request.is_some(),
        );

        let decision = match self.approval.submit(&record).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(
                    "Abandoned verification of {} ({}) after step SUBMIT: {}",
                    member.username, member.id, e
                );
                return Err(e);
            }
        };

        match self.applier.apply(&record, &decision, settings, prompt).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(
                    "Abandoned verification of {} ({}) after step AWAIT_APPROVAL: {}",
                    member.username, member.id, e
                );
                Err(e)
            }
        }
    }
}

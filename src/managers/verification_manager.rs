use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, GuildId, Http, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BotError, Result};
use crate::managers::SharedConfigManager;
use crate::verification::{DmPromptChannel, MemberRef, Outcome, VerificationWorkflow};

/// A verification conversation in progress
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: Uuid,
    pub guild_id: GuildId,
    pub dm_channel: ChannelId,
    pub started_at: DateTime<Utc>,
    inbox: mpsc::UnboundedSender<String>,
}

/// Runs at most one verification per member and routes their DM replies.
/// A member has a single DM channel, so sessions are keyed by member alone
/// and remember the guild they were started for.
pub struct VerificationManager {
    workflow: Arc<VerificationWorkflow>,
    config_manager: SharedConfigManager,
    sessions: Arc<DashMap<UserId, ActiveSession>>,
}

impl VerificationManager {
    pub fn new(workflow: Arc<VerificationWorkflow>, config_manager: SharedConfigManager) -> Self {
        Self {
            workflow,
            config_manager,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Open a DM with the member and start verifying them in the background.
    ///
    /// Fails with `SessionActive` if the member is already being verified.
    pub async fn begin(&self, http: Arc<Http>, member: MemberRef) -> Result<Uuid> {
        if self.sessions.contains_key(&member.id) {
            return Err(BotError::SessionActive {
                user_id: member.id.to_string(),
            });
        }

        let dm_channel = member
            .id
            .create_dm_channel(http.as_ref())
            .await
            .map_err(|e| {
                warn!("Could not open a DM with {}: {}", member.id, e);
                BotError::MemberUnreachable {
                    user_id: member.id.to_string(),
                }
            })?
            .id;

        let (session_id, inbox) = self.register(member.guild_id, member.id, dm_channel)?;
        let settings = self.config_manager.read().await.settings().clone();

        info!(
            "Starting verification {} for {} ({}) in guild {}",
            session_id, member.username, member.id, member.guild_id
        );

        let workflow = self.workflow.clone();
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            let mut prompt = DmPromptChannel::new(http, member.id, dm_channel, inbox);
            match workflow.run(&member, &settings, &mut prompt).await {
                Ok(Outcome::Granted { role_ids, .. }) => {
                    info!(
                        "Verification {} finished: {} granted {} roles",
                        session_id,
                        member.id,
                        role_ids.len()
                    );
                }
                Ok(Outcome::Denied { .. }) => {
                    info!("Verification {} finished: {} denied", session_id, member.id);
                }
                Err(e) => {
                    warn!("Verification {} for {} ended early: {}", session_id, member.id, e);
                }
            }
            finish(&sessions, member.id, session_id);
        });

        Ok(session_id)
    }

    /// Claim the member's session slot and create its inbox
    fn register(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        dm_channel: ChannelId,
    ) -> Result<(Uuid, mpsc::UnboundedReceiver<String>)> {
        match self.sessions.entry(user_id) {
            Entry::Occupied(_) => Err(BotError::SessionActive {
                user_id: user_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let session_id = Uuid::new_v4();
                slot.insert(ActiveSession {
                    session_id,
                    guild_id,
                    dm_channel,
                    started_at: Utc::now(),
                    inbox: tx,
                });
                Ok((session_id, rx))
            }
        }
    }

    /// Hand a DM to the member's session. Returns false when the member has
    /// no session or wrote somewhere other than the session's DM channel.
    pub fn deliver(&self, user_id: UserId, channel_id: ChannelId, content: &str) -> bool {
        let Some(session) = self.sessions.get(&user_id) else {
            return false;
        };
        if session.dm_channel != channel_id {
            debug!(
                "Ignoring message from {} in {}, session is in {}",
                user_id, channel_id, session.dm_channel
            );
            return false;
        }
        session.inbox.send(content.to_string()).is_ok()
    }

    /// Drop the member's session if it was started for `guild_id`. The
    /// running conversation sees its inbox close and abandons.
    pub fn cancel(&self, guild_id: GuildId, user_id: UserId) -> bool {
        self.sessions
            .remove_if(&user_id, |_, s| s.guild_id == guild_id)
            .is_some()
    }

    pub fn is_active(&self, user_id: UserId) -> bool {
        self.sessions.contains_key(&user_id)
    }

    pub fn active_sessions(&self) -> Vec<(UserId, ActiveSession)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

/// Remove a finished session unless a newer one already took its place
fn finish(sessions: &DashMap<UserId, ActiveSession>, user_id: UserId, session_id: Uuid) {
    if sessions
        .remove_if(&user_id, |_, s| s.session_id == session_id)
        .is_some()
    {
        debug!("Cleared session {} for {}", session_id, user_id);
    }
}

/// Shared verification manager type
pub type SharedVerificationManager = Arc<VerificationManager>;

pub fn create_shared_verification_manager(
    workflow: Arc<VerificationWorkflow>,
    config_manager: SharedConfigManager,
) -> SharedVerificationManager {
    Arc::new(VerificationManager::new(workflow, config_manager))
}

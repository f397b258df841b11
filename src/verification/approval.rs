use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, Http, UserId};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::record::{LeadershipRole, RoleCategory, VerificationRecord};
use crate::error::{BotError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    /// The reason stays with the moderators and is never sent to the member
    Denied { reason: Option<String> },
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalDecision::Approved)
    }
}

/// Turns a finished record into an approve/deny decision
#[async_trait]
pub trait ApprovalAuthority: Send + Sync {
    async fn submit(&self, record: &VerificationRecord) -> Result<ApprovalDecision>;
}

/// Approves every submission
pub struct AutomaticApproval;

#[async_trait]
impl ApprovalAuthority for AutomaticApproval {
    async fn submit(&self, record: &VerificationRecord) -> Result<ApprovalDecision> {
        info!("Automatically approving verification of {}", record.member.id);
        Ok(ApprovalDecision::Approved)
    }
}

/// Submissions waiting for a moderator, keyed by guild and member
#[derive(Default)]
pub struct ReviewQueue {
    pending: DashMap<(GuildId, UserId), oneshot::Sender<ApprovalDecision>>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a submission until a moderator decides on it
    pub fn enqueue(&self, guild_id: GuildId, user_id: UserId) -> oneshot::Receiver<ApprovalDecision> {
        let (tx, rx) = oneshot::channel();
        if self.pending.insert((guild_id, user_id), tx).is_some() {
            warn!("Replaced an older pending review for {} in {}", user_id, guild_id);
        }
        rx
    }

    /// Deliver a decision. Returns false if nothing was pending for the member
    /// in this guild, so a submission can only be decided once.
    pub fn decide(&self, guild_id: GuildId, user_id: UserId, decision: ApprovalDecision) -> bool {
        match self.pending.remove(&(guild_id, user_id)) {
            Some((_, tx)) => tx.send(decision).is_ok(),
            None => false,
        }
    }

    /// Forget a submission without deciding it. Returns whether one was pending.
    pub fn cancel(&self, guild_id: GuildId, user_id: UserId) -> bool {
        self.pending.remove(&(guild_id, user_id)).is_some()
    }

    pub fn pending_members(&self, guild_id: GuildId) -> Vec<UserId> {
        self.pending
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| entry.key().1)
            .collect()
    }
}

/// Shared review queue type
pub type SharedReviewQueue = Arc<ReviewQueue>;

/// Human review: posts the record to a moderator channel and waits for
/// `/approve` or `/deny`
pub struct ModeratorReview {
    http: Arc<Http>,
    review_channel: String,
    queue: SharedReviewQueue,
}

impl ModeratorReview {
    pub fn new(http: Arc<Http>, review_channel: String, queue: SharedReviewQueue) -> Self {
        Self {
            http,
            review_channel,
            queue,
        }
    }

    async fn find_review_channel(&self, guild_id: GuildId) -> Result<ChannelId> {
        let channels = guild_id.channels(&self.http).await?;
        channels
            .values()
            .find(|c| c.kind == serenity::ChannelType::Text && c.name == self.review_channel)
            .map(|c| c.id)
            .ok_or_else(|| BotError::ChannelNotFound {
                name: self.review_channel.clone(),
            })
    }
}

#[async_trait]
impl ApprovalAuthority for ModeratorReview {
    async fn submit(&self, record: &VerificationRecord) -> Result<ApprovalDecision> {
        let channel_id = self.find_review_channel(record.member.guild_id).await?;

        let rx = self.queue.enqueue(record.member.guild_id, record.member.id);
        let message = serenity::CreateMessage::new().embed(review_embed(record));
        if let Err(e) = channel_id.send_message(&self.http, message).await {
            self.queue.cancel(record.member.guild_id, record.member.id);
            return Err(e.into());
        }

        info!(
            "Verification of {} posted for review in #{}",
            record.member.id, self.review_channel
        );

        rx.await.map_err(|_| BotError::ApprovalUnavailable {
            message: format!("review for {} was dropped", record.member.id),
        })
    }
}

/// Embed shown to moderators for one submission
pub fn review_embed(record: &VerificationRecord) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("Verification Request")
        .description(format!("<@{}> ({})", record.member.id, record.member.username))
        .field("Name", &record.name, true)
        .field("Role", record.category_label(), true)
        .field("Nickname", record.nickname(), false)
        .color(0x5865F2);

    if let Ok(timestamp) = serenity::Timestamp::from_unix_timestamp(record.submitted_at.timestamp()) {
        embed = embed.timestamp(timestamp);
    }

    if let Some(avatar) = &record.member.avatar_url {
        embed = embed.thumbnail(avatar);
    }

    match &record.category {
        RoleCategory::Resident(r) | RoleCategory::Ra(r) => {
            embed = embed
                .field("Major", &r.major, true)
                .field("Building", r.building.as_str(), true)
                .field("Floor", r.floor.as_str(), true)
                .field("RiSE", if r.rise_member { "Yes" } else { "No" }, true);
        }
        RoleCategory::Leadership(role) => {
            let position = match role {
                LeadershipRole::CommunityDirector => "CD".to_string(),
                LeadershipRole::CommunityDirectorAssistant => "CDA".to_string(),
                LeadershipRole::GradCommunityDirector { building } => format!("GCD ({})", building),
            };
            embed = embed.field("Position", position, true);
        }
    }

    if let Some(request) = &record.override_request {
        embed = embed
            .field("Override Requested", &request.reason, false)
            .color(0xE67E22);
    }

    embed.footer(serenity::CreateEmbedFooter::new(format!(
        "/approve or /deny member:{}",
        record.member.id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildId {
        GuildId::new(1)
    }

    #[tokio::test]
    async fn test_decision_reaches_waiting_submission() {
        let queue = ReviewQueue::new();
        let rx = queue.enqueue(guild(), UserId::new(7));
        assert!(queue.pending_members(guild()).contains(&UserId::new(7)));

        assert!(queue.decide(guild(), UserId::new(7), ApprovalDecision::Approved));
        assert_eq!(rx.await.unwrap(), ApprovalDecision::Approved);
        assert!(!queue.pending_members(guild()).contains(&UserId::new(7)));
    }

    #[tokio::test]
    async fn test_second_decision_is_rejected() {
        let queue = ReviewQueue::new();
        let rx = queue.enqueue(guild(), UserId::new(7));

        assert!(queue.decide(
            guild(),
            UserId::new(7),
            ApprovalDecision::Denied {
                reason: Some("not a resident".to_string())
            }
        ));
        assert!(!queue.decide(guild(), UserId::new(7), ApprovalDecision::Approved));
        assert!(!rx.await.unwrap().is_approved());
    }

    #[test]
    fn test_unknown_member_is_not_decided() {
        let queue = ReviewQueue::new();
        let _rx = queue.enqueue(guild(), UserId::new(1));
        assert!(!queue.decide(guild(), UserId::new(2), ApprovalDecision::Approved));
        assert_eq!(queue.pending_members(guild()), vec![UserId::new(1)]);
    }

    #[tokio::test]
    async fn test_reviews_are_scoped_to_their_guild() {
        let queue = ReviewQueue::new();
        let other = GuildId::new(200);
        let mut rx = queue.enqueue(guild(), UserId::new(7));

        assert!(!queue.cancel(other, UserId::new(7)));
        assert!(!queue.decide(other, UserId::new(7), ApprovalDecision::Approved));
        assert!(queue.pending_members(other).is_empty());
        assert!(queue.pending_members(guild()).contains(&UserId::new(7)));
        assert!(rx.try_recv().is_err());

        assert!(queue.cancel(guild(), UserId::new(7)));
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_automatic_approval() {
        use crate::verification::record::RecordBuilder;
        use crate::verification::answers::{CategoryKind, LeadershipPosition};
        use crate::verification::testing::member;

        let mut builder = RecordBuilder::new();
        builder
            .name("Jo")
            .category(CategoryKind::Leadership)
            .position(LeadershipPosition::Cd);
        let record = builder.build(member(3)).unwrap();

        assert!(AutomaticApproval.submit(&record).await.unwrap().is_approved());
    }
}

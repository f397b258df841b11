use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, Http, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{BotError, Result};

/// Point-to-point conversation with one member
#[async_trait]
pub trait PromptChannel: Send {
    async fn send(&mut self, text: &str) -> Result<()>;

    /// Wait for the member's next reply. There is no timeout.
    async fn await_reply(&mut self) -> Result<String>;
}

/// Conversation over a member's DM channel.
///
/// Replies arrive through an inbox fed by the message event handler, which
/// only forwards messages written by this member in this DM channel.
pub struct DmPromptChannel {
    http: Arc<Http>,
    user_id: UserId,
    channel_id: ChannelId,
    inbox: mpsc::UnboundedReceiver<String>,
}

impl DmPromptChannel {
    pub fn new(
        http: Arc<Http>,
        user_id: UserId,
        channel_id: ChannelId,
        inbox: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            http,
            user_id,
            channel_id,
            inbox,
        }
    }
}

#[async_trait]
impl PromptChannel for DmPromptChannel {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.channel_id.say(&self.http, text).await?;
        Ok(())
    }

    async fn await_reply(&mut self) -> Result<String> {
        self.inbox.recv().await.ok_or_else(|| BotError::MemberUnreachable {
            user_id: self.user_id.to_string(),
        })
    }
}

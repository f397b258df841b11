//! In-memory stand-ins for the Discord-facing collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use poise::serenity_prelude::{GuildId, RoleId, UserId};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use super::authorization::AuthorizationSource;
use super::catalog::GuildDirectory;
use super::prompt::PromptChannel;
use super::record::MemberRef;
use super::selector::{MajorSelection, MajorSelector};
use crate::error::{BotError, Result};

pub fn member(id: u64) -> MemberRef {
    MemberRef {
        id: UserId::new(id),
        guild_id: GuildId::new(1),
        username: format!("member{}", id),
        avatar_url: None,
    }
}

/// Replays canned replies and records everything sent
pub struct ScriptedPrompt {
    replies: VecDeque<String>,
    sent: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            sent: Vec::new(),
        }
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn count_sent(&self, text: &str) -> usize {
        self.sent.iter().filter(|s| s.as_str() == text).count()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }
}

#[async_trait]
impl PromptChannel for ScriptedPrompt {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.sent.push(text.to_string());
        Ok(())
    }

    async fn await_reply(&mut self) -> Result<String> {
        self.replies.pop_front().ok_or_else(|| BotError::MemberUnreachable {
            user_id: "scripted".to_string(),
        })
    }
}

pub struct StaticAuthorization {
    ids: Mutex<HashSet<UserId>>,
}

impl StaticAuthorization {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().map(UserId::new).collect()),
        }
    }

    pub fn nobody() -> Self {
        Self::new([])
    }

    pub fn authorize(&self, id: u64) {
        self.ids.lock().insert(UserId::new(id));
    }
}

#[async_trait]
impl AuthorizationSource for StaticAuthorization {
    async fn authorized_ids(&self, _capability: &str) -> Result<HashSet<UserId>> {
        Ok(self.ids.lock().clone())
    }
}

/// Returns canned selections without talking to the member
pub struct ScriptedSelector {
    selections: Mutex<VecDeque<MajorSelection>>,
    calls: Mutex<Vec<bool>>,
}

impl ScriptedSelector {
    pub fn new(selections: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        Self {
            selections: Mutex::new(
                selections
                    .into_iter()
                    .map(|(value, override_requested)| MajorSelection {
                        value: value.to_string(),
                        override_requested,
                    })
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn major(value: &'static str) -> Self {
        Self::new([(value, false)])
    }

    /// The `override_pending` argument of every call
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MajorSelector for ScriptedSelector {
    async fn select(
        &self,
        _prompt: &mut dyn PromptChannel,
        override_pending: bool,
    ) -> Result<MajorSelection> {
        self.calls.lock().push(override_pending);
        self.selections
            .lock()
            .pop_front()
            .ok_or_else(|| BotError::Internal {
                message: "selector script exhausted".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryCall {
    ListRoles,
    CreateRole(String),
    AddRoles(UserId, Vec<RoleId>),
    SetNickname(UserId, String),
    CreateInvite(String),
    RemoveMember(UserId),
}

/// Guild with an in-memory role list that records every call
pub struct MockDirectory {
    roles: Mutex<Vec<(String, RoleId)>>,
    calls: Mutex<Vec<DirectoryCall>>,
    next_id: AtomicU64,
    create_delay_ms: u64,
    fail_create_role: bool,
    fail_add_roles: bool,
    fail_nickname: bool,
    fail_invite: bool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            roles: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            create_delay_ms: 0,
            fail_create_role: false,
            fail_add_roles: false,
            fail_nickname: false,
            fail_invite: false,
        }
    }

    pub fn with_role(self, name: &str, id: u64) -> Self {
        self.roles.lock().push((name.to_string(), RoleId::new(id)));
        self
    }

    /// Make role creation slow enough for concurrent callers to overlap
    pub fn with_create_delay(mut self, millis: u64) -> Self {
        self.create_delay_ms = millis;
        self
    }

    pub fn failing_create_role(mut self) -> Self {
        self.fail_create_role = true;
        self
    }

    pub fn failing_add_roles(mut self) -> Self {
        self.fail_add_roles = true;
        self
    }

    pub fn failing_nickname(mut self) -> Self {
        self.fail_nickname = true;
        self
    }

    pub fn failing_invite(mut self) -> Self {
        self.fail_invite = true;
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&DirectoryCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn role_count(&self) -> usize {
        self.roles.lock().len()
    }

    pub fn role_name(&self, id: RoleId) -> Option<String> {
        self.roles
            .lock()
            .iter()
            .find(|(_, role_id)| *role_id == id)
            .map(|(name, _)| name.clone())
    }

    pub fn delete_role(&self, id: RoleId) {
        self.roles.lock().retain(|(_, role_id)| *role_id != id);
    }

    fn record(&self, call: DirectoryCall) {
        self.calls.lock().push(call);
    }

    fn failure(what: &str) -> BotError {
        BotError::Discord {
            message: format!("{} failed", what),
        }
    }
}

#[async_trait]
impl GuildDirectory for MockDirectory {
    async fn roles(&self, _guild_id: GuildId) -> Result<Vec<(String, RoleId)>> {
        self.record(DirectoryCall::ListRoles);
        Ok(self.roles.lock().clone())
    }

    async fn create_role(&self, _guild_id: GuildId, name: &str) -> Result<RoleId> {
        self.record(DirectoryCall::CreateRole(name.to_string()));
        if self.fail_create_role {
            return Err(Self::failure("create_role"));
        }
        if self.create_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.create_delay_ms)).await;
        }
        let id = RoleId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.roles.lock().push((name.to_string(), id));
        Ok(id)
    }

    async fn add_roles(&self, _guild_id: GuildId, user_id: UserId, role_ids: &[RoleId]) -> Result<()> {
        self.record(DirectoryCall::AddRoles(user_id, role_ids.to_vec()));
        if self.fail_add_roles {
            return Err(Self::failure("add_roles"));
        }
        Ok(())
    }

    async fn set_nickname(&self, _guild_id: GuildId, user_id: UserId, nickname: &str) -> Result<()> {
        self.record(DirectoryCall::SetNickname(user_id, nickname.to_string()));
        if self.fail_nickname {
            return Err(Self::failure("set_nickname"));
        }
        Ok(())
    }

    async fn create_invite(
        &self,
        _guild_id: GuildId,
        channel_name: &str,
        _max_age_secs: u32,
        _reason: &str,
    ) -> Result<String> {
        self.record(DirectoryCall::CreateInvite(channel_name.to_string()));
        if self.fail_invite {
            return Err(Self::failure("create_invite"));
        }
        Ok("https://discord.gg/abc123".to_string())
    }

    async fn remove_member(&self, _guild_id: GuildId, user_id: UserId, _reason: &str) -> Result<()> {
        self.record(DirectoryCall::RemoveMember(user_id));
        Ok(())
    }
}

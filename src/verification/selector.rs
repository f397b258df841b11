use async_trait::async_trait;

use super::answers::normalize;
use super::prompt::PromptChannel;
use crate::error::Result;
use crate::managers::SharedConfigManager;
use crate::messages;

/// Sentinel selection asking the caller to run the selector again
pub const BACK: &str = "BACK";

/// Reply that lets a member type a major that is not in the catalog
pub const OTHER: &str = "OTHER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorSelection {
    /// Chosen major, or [`BACK`]
    pub value: String,
    pub override_requested: bool,
}

impl MajorSelection {
    pub fn is_back(&self) -> bool {
        self.value == BACK
    }
}

/// Sub-dialogue that asks the member for their major
#[async_trait]
pub trait MajorSelector: Send + Sync {
    async fn select(
        &self,
        prompt: &mut dyn PromptChannel,
        override_pending: bool,
    ) -> Result<MajorSelection>;
}

/// Asks for a college first, then for a major inside it
pub struct CollegeMajorSelector {
    config_manager: SharedConfigManager,
}

impl CollegeMajorSelector {
    pub fn new(config_manager: SharedConfigManager) -> Self {
        Self { config_manager }
    }
}

#[async_trait]
impl MajorSelector for CollegeMajorSelector {
    async fn select(
        &self,
        prompt: &mut dyn PromptChannel,
        override_pending: bool,
    ) -> Result<MajorSelection> {
        let catalog = self.config_manager.read().await.majors().clone();

        let question = messages::ask_college(catalog.colleges.iter().map(|c| c.name.as_str()), OTHER);
        let college = loop {
            prompt.send(&question).await?;
            let reply = prompt.await_reply().await?;

            if normalize(&reply) == OTHER {
                prompt.send(messages::ASK_FREE_TEXT_MAJOR).await?;
                let major = loop {
                    let typed = prompt.await_reply().await?;
                    if !typed.trim().is_empty() {
                        break typed.trim().to_string();
                    }
                    prompt.send(messages::EMPTY_ANSWER).await?;
                };
                return Ok(MajorSelection {
                    value: major,
                    override_requested: true,
                });
            }

            match catalog.find_college(&reply) {
                Some(college) => break college.clone(),
                None => prompt.send(messages::RETRY).await?,
            }
        };

        let question = messages::ask_major(
            &college.name,
            college.majors.iter().map(String::as_str),
            BACK,
        );
        loop {
            prompt.send(&question).await?;
            let reply = prompt.await_reply().await?;

            if normalize(&reply) == BACK {
                return Ok(MajorSelection {
                    value: BACK.to_string(),
                    override_requested: override_pending,
                });
            }

            match college.find_major(&reply) {
                Some(major) => {
                    return Ok(MajorSelection {
                        value: major.clone(),
                        override_requested: override_pending,
                    })
                }
                None => prompt.send(messages::RETRY).await?,
            }
        }
    }
}

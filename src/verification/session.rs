use std::fmt;
use tracing::{debug, warn};

use super::answers::{parse_rise, Building, CategoryKind, Floor, LeadershipPosition};
use super::authorization::AuthorizationSource;
use super::prompt::PromptChannel;
use super::record::{MemberRef, RecordBuilder, VerificationRecord};
use super::selector::MajorSelector;
use crate::config::LEADERSHIP_CAPABILITY;
use crate::error::Result;
use crate::messages;

/// Steps of the verification conversation, in the order they can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Greet,
    AskName,
    AskRoleCategory,
    CheckLeadershipAuthorization,
    AskLeadershipPosition,
    AskMajor,
    AskBuilding,
    AskFloor,
    AskRise,
    AskOverrideReason,
    Submit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Greet => "GREET",
            Step::AskName => "ASK_NAME",
            Step::AskRoleCategory => "ASK_ROLE_CATEGORY",
            Step::CheckLeadershipAuthorization => "CHECK_LEADERSHIP_AUTHORIZATION",
            Step::AskLeadershipPosition => "ASK_LEADERSHIP_POSITION",
            Step::AskMajor => "ASK_MAJOR",
            Step::AskBuilding => "ASK_BUILDING",
            Step::AskFloor => "ASK_FLOOR",
            Step::AskRise => "ASK_RISE",
            Step::AskOverrideReason => "ASK_OVERRIDE_REASON",
            Step::Submit => "SUBMIT",
        };
        f.write_str(name)
    }
}

/// One member's verification conversation.
///
/// The session only suspends inside `PromptChannel::await_reply`, and only one
/// question is outstanding at any time.
pub struct VerificationSession<'a> {
    member: &'a MemberRef,
    prompt: &'a mut dyn PromptChannel,
    selector: &'a dyn MajorSelector,
    authorization: &'a dyn AuthorizationSource,
    floors: &'a [String],
    builder: RecordBuilder,
    step: Step,
    last_completed: Option<Step>,
}

impl<'a> VerificationSession<'a> {
    pub fn new(
        member: &'a MemberRef,
        prompt: &'a mut dyn PromptChannel,
        selector: &'a dyn MajorSelector,
        authorization: &'a dyn AuthorizationSource,
        floors: &'a [String],
    ) -> Self {
        Self {
            member,
            prompt,
            selector,
            authorization,
            floors,
            builder: RecordBuilder::new(),
            step: Step::Greet,
            last_completed: None,
        }
    }

    /// Last step that finished, for logging abandoned sessions
    pub fn last_completed(&self) -> Option<Step> {
        self.last_completed
    }

    /// Run the conversation up to and including SUBMIT
    pub async fn run(&mut self) -> Result<VerificationRecord> {
        loop {
            debug!("Member {} entering {}", self.member.id, self.step);

            let next = match self.step {
                Step::Greet => {
                    self.prompt.send(messages::GREETING).await?;
                    Step::AskName
                }
                Step::AskName => {
                    self.prompt.send(messages::ASK_NAME).await?;
                    let name = self.prompt.await_reply().await?.trim().to_string();
                    self.prompt.send(&messages::greeting_reply(&name)).await?;
                    self.builder.name(name);
                    Step::AskRoleCategory
                }
                Step::AskRoleCategory => {
                    let question = messages::ask_role_category(&CategoryKind::LABELS);
                    let kind = self
                        .ask_closed(&question, |raw| raw.parse::<CategoryKind>().ok())
                        .await?;
                    self.builder.category(kind);
                    match kind {
                        CategoryKind::Leadership => Step::CheckLeadershipAuthorization,
                        CategoryKind::Ra | CategoryKind::Resident => Step::AskMajor,
                    }
                }
                Step::CheckLeadershipAuthorization => {
                    let authorized = self.authorization.authorized_ids(LEADERSHIP_CAPABILITY).await?;
                    if authorized.contains(&self.member.id) {
                        Step::AskLeadershipPosition
                    } else {
                        warn!(
                            "Member {} ({}) selected LEADERSHIP but is not on the leadership team",
                            self.member.username, self.member.id
                        );
                        self.prompt.send(messages::NOT_LEADERSHIP).await?;
                        self.builder.request_override();
                        Step::AskRoleCategory
                    }
                }
                Step::AskLeadershipPosition => {
                    let question = messages::ask_leadership_position(&LeadershipPosition::LABELS);
                    let position = self
                        .ask_closed(&question, |raw| raw.parse::<LeadershipPosition>().ok())
                        .await?;
                    self.builder.position(position);
                    match position {
                        LeadershipPosition::Gcd => Step::AskBuilding,
                        LeadershipPosition::Cd | LeadershipPosition::Cda => self.before_submit(),
                    }
                }
                Step::AskMajor => {
                    let major = loop {
                        let selection = self
                            .selector
                            .select(&mut *self.prompt, self.builder.override_requested())
                            .await?;
                        if selection.override_requested {
                            self.builder.request_override();
                        }
                        if !selection.is_back() {
                            break selection.value;
                        }
                    };
                    self.builder.major(major);
                    Step::AskBuilding
                }
                Step::AskBuilding => {
                    let building = self
                        .ask_closed(messages::ASK_BUILDING, |raw| raw.parse::<Building>().ok())
                        .await?;
                    self.builder.building(building);
                    if self.builder.kind() == Some(CategoryKind::Leadership) {
                        self.before_submit()
                    } else {
                        Step::AskFloor
                    }
                }
                Step::AskFloor => {
                    let building = self
                        .builder
                        .building_answer()
                        .map(|b| b.as_str())
                        .unwrap_or("your building");
                    let question = messages::ask_floor(building);
                    let floors = self.floors;
                    let floor = self
                        .ask_closed(&question, |raw| Floor::parse(raw, floors).ok())
                        .await?;
                    self.builder.floor(floor);
                    Step::AskRise
                }
                Step::AskRise => {
                    let rise_member = self.ask_closed(messages::ASK_RISE, parse_rise).await?;
                    self.builder.rise_member(rise_member);
                    self.before_submit()
                }
                Step::AskOverrideReason => {
                    let reason = self.ask_reason(messages::ASK_OVERRIDE_REASON).await?;
                    self.builder.override_reason(reason);
                    Step::Submit
                }
                Step::Submit => {
                    let record = self.builder.build(self.member.clone())?;
                    self.prompt.send(messages::SUBMITTED).await?;
                    self.last_completed = Some(Step::Submit);
                    return Ok(record);
                }
            };

            self.last_completed = Some(self.step);
            self.step = next;
        }
    }

    fn before_submit(&self) -> Step {
        if self.builder.override_requested() && !self.builder.has_override_reason() {
            Step::AskOverrideReason
        } else {
            Step::Submit
        }
    }

    /// Ask for the override reason. Only blank replies are asked again.
    async fn ask_reason(&mut self, question: &str) -> Result<String> {
        self.prompt.send(question).await?;
        loop {
            let reply = self.prompt.await_reply().await?;
            let reply = reply.trim();
            if !reply.is_empty() {
                return Ok(reply.to_string());
            }
            self.prompt.send(messages::EMPTY_ANSWER).await?;
        }
    }

    /// Ask until the reply parses, repeating the same question after each miss
    async fn ask_closed<T, F>(&mut self, question: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> Option<T> + Send,
        T: Send,
    {
        loop {
            self.prompt.send(question).await?;
            let reply = self.prompt.await_reply().await?;
            if let Some(answer) = parse(&reply) {
                return Ok(answer);
            }
            debug!("Member {} gave an invalid answer at {}: {:?}", self.member.id, self.step, reply);
            self.prompt.send(messages::RETRY).await?;
        }
    }
}

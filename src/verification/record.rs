use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, GuildId, UserId};

use super::answers::{Building, CategoryKind, Floor, LeadershipPosition};
use crate::config::RoleNames;
use crate::error::{BotError, Result};

/// Discord's nickname length limit
pub const MAX_NICKNAME_LEN: usize = 32;

/// The member being verified, as seen when the session started
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    pub id: UserId,
    pub guild_id: GuildId,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&serenity::Member> for MemberRef {
    fn from(member: &serenity::Member) -> Self {
        Self {
            id: member.user.id,
            guild_id: member.guild_id,
            username: member.user.name.clone(),
            avatar_url: Some(member.face()),
        }
    }
}

/// Residence details collected from residents and RAs
#[derive(Debug, Clone, PartialEq)]
pub struct Residence {
    pub major: String,
    pub building: Building,
    pub floor: Floor,
    pub rise_member: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeadershipRole {
    CommunityDirector,
    CommunityDirectorAssistant,
    GradCommunityDirector { building: Building },
}

/// What the member verified as, with only the answers that branch asks for
#[derive(Debug, Clone, PartialEq)]
pub enum RoleCategory {
    Leadership(LeadershipRole),
    Ra(Residence),
    Resident(Residence),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRequest {
    pub reason: String,
}

/// A finished submission, handed to the approval authority
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub member: MemberRef,
    pub name: String,
    pub category: RoleCategory,
    pub override_request: Option<OverrideRequest>,
    pub submitted_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn residence(&self) -> Option<&Residence> {
        match &self.category {
            RoleCategory::Ra(residence) | RoleCategory::Resident(residence) => Some(residence),
            RoleCategory::Leadership(_) => None,
        }
    }

    pub fn building(&self) -> Option<Building> {
        match &self.category {
            RoleCategory::Leadership(LeadershipRole::GradCommunityDirector { building }) => {
                Some(*building)
            }
            RoleCategory::Leadership(_) => None,
            RoleCategory::Ra(r) | RoleCategory::Resident(r) => Some(r.building),
        }
    }

    /// RiSE membership; never asked on the leadership branch
    pub fn rise_member(&self) -> Option<bool> {
        self.residence().map(|r| r.rise_member)
    }

    pub fn category_label(&self) -> &'static str {
        match self.category {
            RoleCategory::Leadership(_) => "LEADERSHIP",
            RoleCategory::Ra(_) => "RA",
            RoleCategory::Resident(_) => "RESIDENT",
        }
    }

    /// Nickname applied on approval. Only the name is shortened to fit
    /// Discord's limit, the rest of the template is always kept.
    pub fn nickname(&self) -> String {
        let suffix = match &self.category {
            RoleCategory::Resident(r) => format!(" | {} {}", r.building, r.floor),
            RoleCategory::Ra(r) => format!(" | {} {} | RA", r.building, r.floor),
            RoleCategory::Leadership(LeadershipRole::GradCommunityDirector { building }) => {
                format!(" | {} Grad Director", building)
            }
            RoleCategory::Leadership(_) => " | Community Director".to_string(),
        };
        let room = MAX_NICKNAME_LEN.saturating_sub(suffix.chars().count());
        let name: String = self.name.chars().take(room).collect();
        format!("{}{}", name.trim_end(), suffix)
    }

    /// Names of every role the member receives on approval
    pub fn role_names(&self, names: &RoleNames) -> Vec<String> {
        let mut roles = vec![names.resident.clone()];

        match &self.category {
            RoleCategory::Resident(r) | RoleCategory::Ra(r) => {
                roles.push(r.major.to_uppercase());
                roles.push(r.building.to_string());
                if r.rise_member {
                    roles.push(names.rise.clone());
                }
                if matches!(self.category, RoleCategory::Ra(_)) {
                    roles.push(names.ra_staff.clone());
                }
            }
            RoleCategory::Leadership(role) => {
                roles.push(names.leadership.clone());
                if let LeadershipRole::GradCommunityDirector { building } = role {
                    roles.push(building.to_string());
                }
            }
        }

        roles
    }
}

/// Collects answers as the session moves through its steps.
///
/// Answers for every branch can be set; `build` only looks at the ones the
/// chosen category needs and fails if one of those is missing.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    name: Option<String>,
    kind: Option<CategoryKind>,
    position: Option<LeadershipPosition>,
    major: Option<String>,
    building: Option<Building>,
    floor: Option<Floor>,
    rise_member: Option<bool>,
    override_requested: bool,
    override_reason: Option<String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(&mut self, kind: CategoryKind) -> &mut Self {
        self.kind = Some(kind);
        self
    }

    pub fn kind(&self) -> Option<CategoryKind> {
        self.kind
    }

    pub fn position(&mut self, position: LeadershipPosition) -> &mut Self {
        self.position = Some(position);
        self
    }

    pub fn major(&mut self, major: impl Into<String>) -> &mut Self {
        self.major = Some(major.into());
        self
    }

    pub fn building(&mut self, building: Building) -> &mut Self {
        self.building = Some(building);
        self
    }

    pub fn building_answer(&self) -> Option<Building> {
        self.building
    }

    pub fn floor(&mut self, floor: Floor) -> &mut Self {
        self.floor = Some(floor);
        self
    }

    pub fn rise_member(&mut self, rise_member: bool) -> &mut Self {
        self.rise_member = Some(rise_member);
        self
    }

    pub fn request_override(&mut self) -> &mut Self {
        self.override_requested = true;
        self
    }

    pub fn override_requested(&self) -> bool {
        self.override_requested
    }

    pub fn override_reason(&mut self, reason: impl Into<String>) -> &mut Self {
        self.override_reason = Some(reason.into());
        self
    }

    pub fn has_override_reason(&self) -> bool {
        self.override_reason.is_some()
    }

    pub fn build(&self, member: MemberRef) -> Result<VerificationRecord> {
        let name = required(self.name.clone(), "name")?;

        let category = match required(self.kind, "role category")? {
            CategoryKind::Leadership => {
                let role = match required(self.position, "leadership position")? {
                    LeadershipPosition::Cd => LeadershipRole::CommunityDirector,
                    LeadershipPosition::Cda => LeadershipRole::CommunityDirectorAssistant,
                    LeadershipPosition::Gcd => LeadershipRole::GradCommunityDirector {
                        building: required(self.building, "building")?,
                    },
                };
                RoleCategory::Leadership(role)
            }
            CategoryKind::Ra => RoleCategory::Ra(self.residence()?),
            CategoryKind::Resident => RoleCategory::Resident(self.residence()?),
        };

        let override_request = if self.override_requested {
            Some(OverrideRequest {
                reason: required(self.override_reason.clone(), "override reason")?,
            })
        } else {
            None
        };

        Ok(VerificationRecord {
            member,
            name,
            category,
            override_request,
            submitted_at: Utc::now(),
        })
    }

    fn residence(&self) -> Result<Residence> {
        Ok(Residence {
            major: required(self.major.clone(), "major")?,
            building: required(self.building, "building")?,
            floor: required(self.floor.clone(), "floor")?,
            rise_member: required(self.rise_member, "RiSE membership")?,
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(BotError::IncompleteRecord { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::testing::member;

    fn floor(label: &str) -> Floor {
        Floor::parse(label, &[label.to_string()]).unwrap()
    }

    fn resident_builder() -> RecordBuilder {
        let mut builder = RecordBuilder::new();
        builder
            .name("Alex")
            .category(CategoryKind::Resident)
            .major("cs")
            .building(Building::Byrnes)
            .floor(floor("6"))
            .rise_member(true);
        builder
    }

    #[test]
    fn test_resident_record() {
        let record = resident_builder().build(member(1)).unwrap();

        assert_eq!(record.nickname(), "Alex | Byrnes 6");
        assert_eq!(record.rise_member(), Some(true));
        assert!(record.override_request.is_none());
        assert_eq!(
            record.role_names(&RoleNames::default()),
            vec!["Resident", "CS", "Byrnes", "RiSE"]
        );
    }

    #[test]
    fn test_ra_record_adds_staff_role() {
        let mut builder = resident_builder();
        builder.category(CategoryKind::Ra).rise_member(false);
        let record = builder.build(member(1)).unwrap();

        assert_eq!(record.nickname(), "Alex | Byrnes 6 | RA");
        assert_eq!(
            record.role_names(&RoleNames::default()),
            vec!["Resident", "CS", "Byrnes", "RA Staff"]
        );
    }

    #[test]
    fn test_leadership_record_has_no_rise_answer() {
        let mut builder = RecordBuilder::new();
        builder
            .name("Sam")
            .category(CategoryKind::Leadership)
            .position(LeadershipPosition::Gcd)
            .building(Building::Lever);
        let record = builder.build(member(2)).unwrap();

        assert_eq!(record.rise_member(), None);
        assert_eq!(record.building(), Some(Building::Lever));
        assert_eq!(record.nickname(), "Sam | Lever Grad Director");
        assert_eq!(
            record.role_names(&RoleNames::default()),
            vec!["Resident", "Leadership", "Lever"]
        );

        builder.position(LeadershipPosition::Cda);
        let record = builder.build(member(2)).unwrap();
        assert_eq!(record.nickname(), "Sam | Community Director");
        assert_eq!(
            record.role_names(&RoleNames::default()),
            vec!["Resident", "Leadership"]
        );
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut builder = RecordBuilder::new();
        builder.name("Alex").category(CategoryKind::Resident).major("CS");
        match builder.build(member(1)) {
            Err(BotError::IncompleteRecord { field }) => assert_eq!(field, "building"),
            other => panic!("unexpected result: {:?}", other),
        }

        let mut builder = RecordBuilder::new();
        builder
            .name("Sam")
            .category(CategoryKind::Leadership)
            .position(LeadershipPosition::Gcd);
        assert!(builder.build(member(2)).is_err());
    }

    #[test]
    fn test_override_requires_reason() {
        let mut builder = resident_builder();
        builder.request_override();
        assert!(matches!(
            builder.build(member(1)),
            Err(BotError::IncompleteRecord { field: "override reason" })
        ));

        builder.override_reason("My major is not listed");
        let record = builder.build(member(1)).unwrap();
        assert_eq!(
            record.override_request,
            Some(OverrideRequest {
                reason: "My major is not listed".to_string()
            })
        );
    }

    #[test]
    fn test_nickname_is_clamped() {
        let mut builder = resident_builder();
        builder.name("Maximiliana Alexandrina");
        let record = builder.build(member(1)).unwrap();
        let nickname = record.nickname();
        assert!(nickname.chars().count() <= MAX_NICKNAME_LEN);
        assert_eq!(nickname, "Maximiliana Alexandri | Byrnes 6");
    }

    #[test]
    fn test_long_name_keeps_building_and_floor() {
        let mut builder = resident_builder();
        builder.name("Bartholomew Maximilian Fitzgerald");
        let nickname = builder.build(member(1)).unwrap().nickname();
        assert_eq!(nickname.chars().count(), MAX_NICKNAME_LEN);
        assert!(nickname.ends_with(" | Byrnes 6"), "{}", nickname);
        assert!(nickname.starts_with("Bartholomew Maximili"));
    }
}

//! Validation of free-text answers against the closed sets the flow asks about.
//!
//! Every parser normalizes the reply first (surrounding whitespace trimmed,
//! upper-cased) and only then checks set membership, so `" byrnes\n"` and
//! `"BYRNES"` are the same answer.

use std::fmt;
use std::str::FromStr;

/// Returned when a reply is outside the set of accepted labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAnswer(pub String);

impl fmt::Display for InvalidAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an accepted answer", self.0)
    }
}

impl std::error::Error for InvalidAnswer {}

/// Trim and case-fold a reply
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Top-level branch chosen by the member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Leadership,
    Ra,
    Resident,
}

impl CategoryKind {
    pub const LABELS: [&'static str; 3] = ["LEADERSHIP", "RA", "RESIDENT"];
}

impl FromStr for CategoryKind {
    type Err = InvalidAnswer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "LEADERSHIP" => Ok(Self::Leadership),
            "RA" => Ok(Self::Ra),
            "RESIDENT" => Ok(Self::Resident),
            _ => Err(InvalidAnswer(raw.to_string())),
        }
    }
}

/// Position on the leadership team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadershipPosition {
    /// Community Director
    Cd,
    /// Graduate Community Director, lives in one of the buildings
    Gcd,
    /// Community Director Assistant
    Cda,
}

impl LeadershipPosition {
    pub const LABELS: [&'static str; 3] = ["CD", "GCD", "CDA"];
}

impl FromStr for LeadershipPosition {
    type Err = InvalidAnswer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "CD" => Ok(Self::Cd),
            "GCD" => Ok(Self::Gcd),
            "CDA" => Ok(Self::Cda),
            _ => Err(InvalidAnswer(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Building {
    Byrnes,
    Lever,
}

impl Building {
    pub const LABELS: [&'static str; 2] = ["BYRNES", "LEVER"];

    /// Title-case name used for role names and nicknames
    pub fn as_str(&self) -> &'static str {
        match self {
            Building::Byrnes => "Byrnes",
            Building::Lever => "Lever",
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Building {
    type Err = InvalidAnswer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "BYRNES" => Ok(Self::Byrnes),
            "LEVER" => Ok(Self::Lever),
            _ => Err(InvalidAnswer(raw.to_string())),
        }
    }
}

/// A floor label taken from the configured list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Floor(String);

impl Floor {
    /// Match a reply against the permitted floor labels.
    /// The stored label is the configured spelling, not the member's.
    pub fn parse(raw: &str, permitted: &[String]) -> Result<Self, InvalidAnswer> {
        let wanted = normalize(raw);
        permitted
            .iter()
            .find(|label| normalize(label) == wanted)
            .map(|label| Floor(label.trim().to_string()))
            .ok_or_else(|| InvalidAnswer(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Yes/no answer to the RiSE membership question
pub fn parse_rise(raw: &str) -> Option<bool> {
    match normalize(raw).as_str() {
        "Y" | "YES" => Some(true),
        "N" | "NO" => Some(false),
        _ => None,
    }
}

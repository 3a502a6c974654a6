//! Expedition participants: the Nightlord target, the day, and the team.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a label does not name any known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Boss targeted by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nightlord {
    Gladius,
    Maris,
    Gnoster,
    Libra,
    Fulghor,
    Caligo,
    Adel,
    Heolstor,
}

impl Nightlord {
    pub const ALL: [Self; 8] = [
        Self::Gladius,
        Self::Maris,
        Self::Gnoster,
        Self::Libra,
        Self::Fulghor,
        Self::Caligo,
        Self::Adel,
        Self::Heolstor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gladius => "Gladius",
            Self::Maris => "Maris",
            Self::Gnoster => "Gnoster",
            Self::Libra => "Libra",
            Self::Fulghor => "Fulghor",
            Self::Caligo => "Caligo",
            Self::Adel => "Adel",
            Self::Heolstor => "Heolstor",
        }
    }
}

impl fmt::Display for Nightlord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nightlord {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|lord| lord.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant::new("nightlord", s))
    }
}

/// Playable class chosen by a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NightfarerClass {
    Wylder,
    Guardian,
    Ironeye,
    Raider,
    Recluse,
    Executor,
    Duchess,
    Revenant,
}

impl NightfarerClass {
    pub const ALL: [Self; 8] = [
        Self::Wylder,
        Self::Guardian,
        Self::Ironeye,
        Self::Raider,
        Self::Recluse,
        Self::Executor,
        Self::Duchess,
        Self::Revenant,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wylder => "Wylder",
            Self::Guardian => "Guardian",
            Self::Ironeye => "Ironeye",
            Self::Raider => "Raider",
            Self::Recluse => "Recluse",
            Self::Executor => "Executor",
            Self::Duchess => "Duchess",
            Self::Revenant => "Revenant",
        }
    }
}

impl fmt::Display for NightfarerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NightfarerClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant::new("nightfarer class", s))
    }
}

/// Expedition day. Each day ends at its own night circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Day {
    #[default]
    One,
    Two,
}

impl Day {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}", self.number())
    }
}

impl From<Day> for u8 {
    fn from(value: Day) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for Day {
    type Error = UnknownVariant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(UnknownVariant::new("day", &other.to_string())),
        }
    }
}

impl FromStr for Day {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| UnknownVariant::new("day", s))
            .and_then(Self::try_from)
    }
}

/// One player slot in the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: u32,
    #[serde(default)]
    pub chosen_class: Option<NightfarerClass>,
    #[serde(default)]
    pub starts_with_key: bool,
}

impl TeamMember {
    #[must_use]
    pub const fn new(id: u32, chosen_class: Option<NightfarerClass>, starts_with_key: bool) -> Self {
        Self {
            id,
            chosen_class,
            starts_with_key,
        }
    }
}

//! Points of interest: categories, input facts, and scored priorities.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::roster::UnknownVariant;

/// Numeric POI identifier from the master coordinate table.
pub type PoiId = u32;

/// Item rewards are usually zero to two names, kept inline.
pub type ItemList = SmallVec<[String; 2]>;

/// Landmark category of a POI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandmarkCategory {
    Church,
    GreatChurch,
    Castle,
    Fort,
    Tunnel,
    MainEncampment,
    Ruins,
    SorcerersRise,
    OldSorcerersRise,
    Township,
    Evergaol,
    ArenaBoss,
    FieldBoss,
    RottedWoods,
    RotBlessing,
    SiteOfGrace,
    SpectralHawkTree,
    Spiritstream,
    Scarab,
    TunnelEntrance,
}

impl LandmarkCategory {
    pub const ALL: [Self; 20] = [
        Self::Church,
        Self::GreatChurch,
        Self::Castle,
        Self::Fort,
        Self::Tunnel,
        Self::MainEncampment,
        Self::Ruins,
        Self::SorcerersRise,
        Self::OldSorcerersRise,
        Self::Township,
        Self::Evergaol,
        Self::ArenaBoss,
        Self::FieldBoss,
        Self::RottedWoods,
        Self::RotBlessing,
        Self::SiteOfGrace,
        Self::SpectralHawkTree,
        Self::Spiritstream,
        Self::Scarab,
        Self::TunnelEntrance,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Church => "Church",
            Self::GreatChurch => "GreatChurch",
            Self::Castle => "Castle",
            Self::Fort => "Fort",
            Self::Tunnel => "Tunnel",
            Self::MainEncampment => "MainEncampment",
            Self::Ruins => "Ruins",
            Self::SorcerersRise => "SorcerersRise",
            Self::OldSorcerersRise => "OldSorcerersRise",
            Self::Township => "Township",
            Self::Evergaol => "Evergaol",
            Self::ArenaBoss => "ArenaBoss",
            Self::FieldBoss => "FieldBoss",
            Self::RottedWoods => "RottedWoods",
            Self::RotBlessing => "RotBlessing",
            Self::SiteOfGrace => "SiteOfGrace",
            Self::SpectralHawkTree => "SpectralHawkTree",
            Self::Spiritstream => "Spiritstream",
            Self::Scarab => "Scarab",
            Self::TunnelEntrance => "TunnelEntrance",
        }
    }

    /// Only Evergaols are gated behind a stonesword key.
    #[must_use]
    pub const fn requires_key(self) -> bool {
        matches!(self, Self::Evergaol)
    }

    /// Map decorations that never carry route value.
    #[must_use]
    pub const fn is_cosmetic(self) -> bool {
        matches!(
            self,
            Self::SiteOfGrace
                | Self::SpectralHawkTree
                | Self::Spiritstream
                | Self::Scarab
                | Self::TunnelEntrance
        )
    }

    /// Classify a layout slot value such as `"Great Church - Fire Monk"`.
    ///
    /// Substring checks run in a fixed order, so `"Great Church"` wins over
    /// `"Church"`. Unrecognised values fall back to `MainEncampment`.
    #[must_use]
    pub fn from_layout_value(value: &str) -> Self {
        const RULES: [(&str, LandmarkCategory); 9] = [
            ("Ruins", LandmarkCategory::Ruins),
            ("Camp", LandmarkCategory::MainEncampment),
            ("Fort", LandmarkCategory::Fort),
            ("Great Church", LandmarkCategory::GreatChurch),
            ("Church", LandmarkCategory::Church),
            ("Sorcerer's Rise", LandmarkCategory::SorcerersRise),
            ("Township", LandmarkCategory::Township),
            ("Evergaol", LandmarkCategory::Evergaol),
            ("Field Boss", LandmarkCategory::FieldBoss),
        ];
        RULES
            .iter()
            .find(|(needle, _)| value.contains(*needle))
            .map_or(Self::MainEncampment, |(_, category)| *category)
    }

    /// Default visit cost and payout used when a layout only names the POI.
    #[must_use]
    pub const fn default_stats(self) -> CategoryStats {
        let (estimated_time, estimated_runes) = match self {
            Self::Ruins | Self::MainEncampment | Self::Fort | Self::GreatChurch => (300, 8_000),
            Self::Church | Self::Township => (120, 2_000),
            Self::SorcerersRise => (180, 4_000),
            Self::Evergaol => (240, 12_000),
            Self::FieldBoss => (180, 6_000),
            _ => (240, 4_000),
        };
        CategoryStats {
            estimated_time,
            estimated_runes,
        }
    }
}

impl fmt::Display for LandmarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LandmarkCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant {
                kind: "landmark category",
                value: s.to_string(),
            })
    }
}

/// Estimated visit duration (seconds) and rune payout for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub estimated_time: i64,
    pub estimated_runes: i64,
}

/// A POI as supplied by the caller. Immutable from the engine's perspective.
///
/// Estimates are signed so malformed facts stay representable and can be
/// rejected by the route error path instead of wrapping silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiFact {
    pub id: PoiId,
    pub category: LandmarkCategory,
    pub x: f64,
    pub y: f64,
    pub estimated_time: i64,
    pub estimated_runes: i64,
    #[serde(default)]
    pub items: ItemList,
    #[serde(default)]
    pub flask_charges: u32,
}

impl PoiFact {
    /// Build a fact with the category's default time and rune estimates.
    #[must_use]
    pub fn new(id: PoiId, category: LandmarkCategory, x: f64, y: f64) -> Self {
        let stats = category.default_stats();
        Self {
            id,
            category,
            x,
            y,
            estimated_time: stats.estimated_time,
            estimated_runes: stats.estimated_runes,
            items: ItemList::new(),
            flask_charges: 0,
        }
    }

    #[must_use]
    pub fn with_estimates(mut self, estimated_time: i64, estimated_runes: i64) -> Self {
        self.estimated_time = estimated_time;
        self.estimated_runes = estimated_runes;
        self
    }

    #[must_use]
    pub fn with_items<I, S>(mut self, items: I, flask_charges: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self.flask_charges = flask_charges;
        self
    }

    #[must_use]
    pub const fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Rewards a visit is expected to yield, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EstimatedRewards {
    pub runes: i64,
    #[serde(default)]
    pub items: ItemList,
    #[serde(default)]
    pub flask_charges: u32,
}

/// Access requirements attached to a scored POI for display and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessibility {
    pub requires_keys: bool,
    pub required_level: u32,
    pub requires_time: i64,
}

/// Scored view of a POI against one run state. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiPriority {
    pub poi_id: PoiId,
    pub base_priority: i32,
    pub adjusted_priority: f64,
    pub estimated_time: i64,
    pub estimated_rewards: EstimatedRewards,
    pub accessibility: Accessibility,
}

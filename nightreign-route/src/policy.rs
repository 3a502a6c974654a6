//! Scoring and selection policy tables.
//!
//! A `RoutePolicy` is fixed at calculator construction and never mutated
//! during a run. The default reproduces the canonical tables from
//! `constants`; callers may build alternatives and check them with
//! [`RoutePolicy::validate`].
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{
    CASTLE_REQUIRED_LEVEL, DAY_CYCLE_SECONDS, DEFAULT_REQUIRED_LEVEL, FORT_REQUIRED_LEVEL,
    GREAT_CHURCH_REQUIRED_LEVEL, LEVEL_GATE_PENALTY, LEVEL_THRESHOLDS, MISSING_KEY_PENALTY,
    TIME_BONUS_QUICK, TIME_PENALTY_HEAVY, TIME_PENALTY_MODERATE, TIME_RATIO_HEAVY,
    TIME_RATIO_MODERATE, TIME_RATIO_QUICK,
};
use crate::poi::LandmarkCategory;

/// Runes required to reach a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub runes: u64,
}

/// Time-ratio breakpoints and the adjustment each one applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeAdjustmentCfg {
    pub heavy_ratio: f64,
    pub heavy_penalty: i32,
    pub moderate_ratio: f64,
    pub moderate_penalty: i32,
    pub quick_ratio: f64,
    pub quick_bonus: i32,
}

impl Default for TimeAdjustmentCfg {
    fn default() -> Self {
        Self {
            heavy_ratio: TIME_RATIO_HEAVY,
            heavy_penalty: TIME_PENALTY_HEAVY,
            moderate_ratio: TIME_RATIO_MODERATE,
            moderate_penalty: TIME_PENALTY_MODERATE,
            quick_ratio: TIME_RATIO_QUICK,
            quick_bonus: TIME_BONUS_QUICK,
        }
    }
}

/// Penalties for POIs the party cannot enter yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPenaltyCfg {
    pub under_level: i32,
    pub missing_key: i32,
}

impl Default for AccessPenaltyCfg {
    fn default() -> Self {
        Self {
            under_level: LEVEL_GATE_PENALTY,
            missing_key: MISSING_KEY_PENALTY,
        }
    }
}

/// How the selector accumulates `total_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Fixed increment per selected POI. Real leg distances are not modelled.
    #[default]
    Placeholder,
    /// Straight-line distance between consecutive selected POIs.
    Euclidean,
}

/// Errors raised when policy table invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("level threshold table is empty")]
    EmptyThresholds,
    #[error("first threshold must be level 1 at 0 runes (got level {level} at {runes})")]
    BaseThreshold { level: u32, runes: u64 },
    #[error("threshold {index} is not strictly ascending in level and runes")]
    ThresholdOrder { index: usize },
    #[error("day cycle must be longer than zero seconds")]
    ZeroDayCycle,
    #[error(
        "time ratios must satisfy quick < moderate < heavy (got {quick:.2}, {moderate:.2}, {heavy:.2})"
    )]
    TimeRatioOrder {
        quick: f64,
        moderate: f64,
        heavy: f64,
    },
}

/// Fixed policy tables consulted by the scorer, tracker, and selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePolicy {
    #[serde(default = "RoutePolicy::default_day_cycle")]
    pub day_cycle_seconds: u32,
    #[serde(default = "RoutePolicy::default_level_thresholds")]
    pub level_thresholds: Vec<LevelThreshold>,
    #[serde(default = "RoutePolicy::default_base_priorities")]
    pub base_priorities: BTreeMap<LandmarkCategory, i32>,
    #[serde(default = "RoutePolicy::default_required_levels")]
    pub required_levels: BTreeMap<LandmarkCategory, u32>,
    #[serde(default)]
    pub time_adjustment: TimeAdjustmentCfg,
    #[serde(default)]
    pub penalties: AccessPenaltyCfg,
    #[serde(default)]
    pub distance: DistanceMetric,
}

impl RoutePolicy {
    const fn default_day_cycle() -> u32 {
        DAY_CYCLE_SECONDS
    }

    fn default_level_thresholds() -> Vec<LevelThreshold> {
        LEVEL_THRESHOLDS
            .iter()
            .map(|&(level, runes)| LevelThreshold { level, runes })
            .collect()
    }

    fn default_base_priorities() -> BTreeMap<LandmarkCategory, i32> {
        use LandmarkCategory as C;
        BTreeMap::from([
            (C::Church, 95),
            (C::Castle, 85),
            (C::GreatChurch, 80),
            (C::Fort, 80),
            (C::Evergaol, 80),
            (C::RotBlessing, 75),
            (C::ArenaBoss, 70),
            (C::MainEncampment, 65),
            (C::Ruins, 60),
            (C::FieldBoss, 60),
            (C::RottedWoods, 50),
            (C::SorcerersRise, 40),
            (C::OldSorcerersRise, 40),
            (C::Tunnel, 40),
            (C::Township, 0),
            (C::SiteOfGrace, 0),
            (C::SpectralHawkTree, 0),
            (C::Spiritstream, 0),
            (C::Scarab, 0),
            (C::TunnelEntrance, 0),
        ])
    }

    fn default_required_levels() -> BTreeMap<LandmarkCategory, u32> {
        BTreeMap::from([
            (LandmarkCategory::Castle, CASTLE_REQUIRED_LEVEL),
            (LandmarkCategory::GreatChurch, GREAT_CHURCH_REQUIRED_LEVEL),
            (LandmarkCategory::Fort, FORT_REQUIRED_LEVEL),
        ])
    }

    #[must_use]
    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    /// Base desirability of a category. Categories missing from the table score 0.
    #[must_use]
    pub fn base_priority(&self, category: LandmarkCategory) -> i32 {
        self.base_priorities.get(&category).copied().unwrap_or(0)
    }

    /// Minimum player level for a category; 1 unless listed.
    #[must_use]
    pub fn required_level(&self, category: LandmarkCategory) -> u32 {
        self.required_levels
            .get(&category)
            .copied()
            .unwrap_or(DEFAULT_REQUIRED_LEVEL)
    }

    /// Highest level whose rune requirement is met.
    #[must_use]
    pub fn level_for_runes(&self, runes: u64) -> u32 {
        level_for_runes(&self.level_thresholds, runes)
    }

    /// Check table invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.day_cycle_seconds == 0 {
            return Err(PolicyError::ZeroDayCycle);
        }
        let Some(first) = self.level_thresholds.first() else {
            return Err(PolicyError::EmptyThresholds);
        };
        if first.level != 1 || first.runes != 0 {
            return Err(PolicyError::BaseThreshold {
                level: first.level,
                runes: first.runes,
            });
        }
        for (index, pair) in self.level_thresholds.windows(2).enumerate() {
            if pair[1].level <= pair[0].level || pair[1].runes <= pair[0].runes {
                return Err(PolicyError::ThresholdOrder { index: index + 1 });
            }
        }
        let time = &self.time_adjustment;
        if !(time.quick_ratio < time.moderate_ratio && time.moderate_ratio < time.heavy_ratio) {
            return Err(PolicyError::TimeRatioOrder {
                quick: time.quick_ratio,
                moderate: time.moderate_ratio,
                heavy: time.heavy_ratio,
            });
        }
        Ok(())
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            day_cycle_seconds: Self::default_day_cycle(),
            level_thresholds: Self::default_level_thresholds(),
            base_priorities: Self::default_base_priorities(),
            required_levels: Self::default_required_levels(),
            time_adjustment: TimeAdjustmentCfg::default(),
            penalties: AccessPenaltyCfg::default(),
            distance: DistanceMetric::default(),
        }
    }
}

/// Walk an ascending threshold table and return the highest level reached.
///
/// Stops at the first unmet threshold; an empty table yields level 1.
#[must_use]
pub fn level_for_runes(thresholds: &[LevelThreshold], runes: u64) -> u32 {
    thresholds
        .iter()
        .take_while(|threshold| runes >= threshold.runes)
        .last()
        .map_or(1, |threshold| threshold.level)
}

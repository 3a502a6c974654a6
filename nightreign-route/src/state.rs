//! Run-state tracking for one planning session.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::numbers::clamp_i64_to_u32;
use crate::poi::PoiId;
use crate::policy::{LevelThreshold, RoutePolicy, level_for_runes};
use crate::roster::{Day, Nightlord, TeamMember};

/// Snapshot of a run: resources gained, time left, and where the team has been.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub runes_gained: u64,
    pub player_level: u32,
    pub stonesword_keys: u32,
    pub remaining_time: u32,
    pub current_day: Day,
    pub team_composition: Vec<TeamMember>,
    pub nightlord: Nightlord,
    #[serde(default)]
    pub visited_pois: BTreeSet<PoiId>,
}

impl RunState {
    /// Fresh state: no runes, level 1, one key per member who starts with one.
    #[must_use]
    pub fn new(team: Vec<TeamMember>, nightlord: Nightlord, day: Day, start_time: u32) -> Self {
        let stonesword_keys = starting_keys(&team);
        Self {
            runes_gained: 0,
            player_level: 1,
            stonesword_keys,
            remaining_time: start_time,
            current_day: day,
            team_composition: team,
            nightlord,
            visited_pois: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn has_visited(&self, poi_id: PoiId) -> bool {
        self.visited_pois.contains(&poi_id)
    }
}

fn starting_keys(team: &[TeamMember]) -> u32 {
    let count = team.iter().filter(|member| member.starts_with_key).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Owns the mutable `RunState` and is the only way to change it.
#[derive(Debug, Clone)]
pub struct RunTracker {
    state: RunState,
    level_thresholds: Vec<LevelThreshold>,
    day_cycle_seconds: u32,
}

impl RunTracker {
    /// Wrap an existing state, re-deriving the level from its runes.
    #[must_use]
    pub fn from_state(state: RunState, policy: &RoutePolicy) -> Self {
        let mut tracker = Self {
            state,
            level_thresholds: policy.level_thresholds.clone(),
            day_cycle_seconds: policy.day_cycle_seconds,
        };
        tracker.refresh_level();
        tracker
    }

    /// Reset every field for a new calculation.
    pub fn initialize_state(
        &mut self,
        team: Vec<TeamMember>,
        nightlord: Nightlord,
        day: Day,
        start_time: u32,
    ) {
        self.state = RunState::new(team, nightlord, day, start_time);
    }

    /// Reset using the policy's full day cycle as the time budget.
    pub fn initialize_state_default_time(
        &mut self,
        team: Vec<TeamMember>,
        nightlord: Nightlord,
        day: Day,
    ) {
        self.initialize_state(team, nightlord, day, self.day_cycle_seconds);
    }

    /// Add runes and recompute the level.
    pub fn add_runes(&mut self, amount: u64) {
        self.state.runes_gained = self.state.runes_gained.saturating_add(amount);
        self.refresh_level();
    }

    /// Apply a key delta, never dropping below zero.
    pub fn update_stonesword_keys(&mut self, delta: i64) {
        let next = i64::from(self.state.stonesword_keys).saturating_add(delta);
        self.state.stonesword_keys = clamp_i64_to_u32(next);
    }

    /// Spend time, never dropping below zero.
    pub fn subtract_time(&mut self, seconds: u32) {
        self.state.remaining_time = self.state.remaining_time.saturating_sub(seconds);
    }

    /// Record a visit. Repeated calls are no-ops.
    pub fn mark_poi_visited(&mut self, poi_id: PoiId) {
        self.state.visited_pois.insert(poi_id);
    }

    /// Start a new day with a full time budget. Runes, level, keys, and
    /// visits carry over.
    pub fn begin_day(&mut self, day: Day) {
        self.state.current_day = day;
        self.state.remaining_time = self.day_cycle_seconds;
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn current_state(&self) -> RunState {
        self.state.clone()
    }

    /// Borrow the state without copying.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub const fn day_cycle_seconds(&self) -> u32 {
        self.day_cycle_seconds
    }

    fn refresh_level(&mut self) {
        self.state.player_level = level_for_runes(&self.level_thresholds, self.state.runes_gained);
    }
}

//! Priority scoring for a single POI against the current run state.
//!
//! Scoring is a pure function of the policy tables, the bonus strategies,
//! the POI fact, and a borrowed `RunState`. The final score is the base
//! priority plus five additive terms, floored at zero:
//!
//! | term      | rule                                                       |
//! |-----------|------------------------------------------------------------|
//! | time      | visit time over remaining time, bucketed by ratio          |
//! | level     | penalty when the player is below the category's level      |
//! | key       | penalty for key-gated categories when no key is held       |
//! | team      | [`TeamBonusPolicy`]                                        |
//! | nightlord | [`NightlordBonusPolicy`]                                   |
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numbers::ratio;
use crate::poi::{Accessibility, EstimatedRewards, LandmarkCategory, PoiFact, PoiPriority};
use crate::policy::RoutePolicy;
use crate::roster::{Nightlord, TeamMember};
use crate::state::RunState;

/// Extra desirability contributed by the team's classes.
pub trait TeamBonusPolicy: fmt::Debug {
    fn team_bonus(&self, category: LandmarkCategory, team: &[TeamMember]) -> i32;
}

/// Extra desirability for POIs that help against the targeted Nightlord.
pub trait NightlordBonusPolicy: fmt::Debug {
    fn nightlord_bonus(&self, category: LandmarkCategory, nightlord: Nightlord) -> i32;
}

/// No class-specific bonuses are defined yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTeamBonus;

impl TeamBonusPolicy for NoTeamBonus {
    fn team_bonus(&self, _category: LandmarkCategory, _team: &[TeamMember]) -> i32 {
        0
    }
}

/// No Nightlord weakness targeting is defined yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNightlordBonus;

impl NightlordBonusPolicy for NoNightlordBonus {
    fn nightlord_bonus(&self, _category: LandmarkCategory, _nightlord: Nightlord) -> i32 {
        0
    }
}

/// Every term that went into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub base: i32,
    pub time: i32,
    pub level: i32,
    pub key: i32,
    pub team: i32,
    pub nightlord: i32,
}

impl PriorityBreakdown {
    /// Sum of all terms, floored at zero.
    #[must_use]
    pub fn adjusted(&self) -> f64 {
        let total = self.base + self.time + self.level + self.key + self.team + self.nightlord;
        f64::from(total.max(0))
    }
}

/// Scores POIs using fixed policy tables and injected bonus strategies.
#[derive(Debug)]
pub struct PriorityScorer {
    policy: RoutePolicy,
    team_bonus: Box<dyn TeamBonusPolicy>,
    nightlord_bonus: Box<dyn NightlordBonusPolicy>,
}

impl PriorityScorer {
    #[must_use]
    pub fn new(policy: RoutePolicy) -> Self {
        Self {
            policy,
            team_bonus: Box::new(NoTeamBonus),
            nightlord_bonus: Box::new(NoNightlordBonus),
        }
    }

    #[must_use]
    pub fn with_team_bonus(mut self, policy: impl TeamBonusPolicy + 'static) -> Self {
        self.team_bonus = Box::new(policy);
        self
    }

    #[must_use]
    pub fn with_nightlord_bonus(mut self, policy: impl NightlordBonusPolicy + 'static) -> Self {
        self.nightlord_bonus = Box::new(policy);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Compute the full `PoiPriority` for one fact.
    #[must_use]
    pub fn score(&self, fact: &PoiFact, state: &RunState) -> PoiPriority {
        let breakdown = self.breakdown(fact, state);
        PoiPriority {
            poi_id: fact.id,
            base_priority: breakdown.base,
            adjusted_priority: breakdown.adjusted(),
            estimated_time: fact.estimated_time,
            estimated_rewards: EstimatedRewards {
                runes: fact.estimated_runes,
                items: fact.items.clone(),
                flask_charges: fact.flask_charges,
            },
            accessibility: Accessibility {
                requires_keys: fact.category.requires_key(),
                required_level: self.policy.required_level(fact.category),
                requires_time: fact.estimated_time,
            },
        }
    }

    /// Individual scoring terms for one fact.
    #[must_use]
    pub fn breakdown(&self, fact: &PoiFact, state: &RunState) -> PriorityBreakdown {
        PriorityBreakdown {
            base: self.policy.base_priority(fact.category),
            time: self.time_adjustment(fact.estimated_time, state.remaining_time),
            level: self.level_adjustment(fact.category, state.player_level),
            key: self.key_adjustment(fact.category, state.stonesword_keys),
            team: self
                .team_bonus
                .team_bonus(fact.category, &state.team_composition),
            nightlord: self
                .nightlord_bonus
                .nightlord_bonus(fact.category, state.nightlord),
        }
    }

    /// Bucket the visit-time ratio. The first matching rule wins; a NaN
    /// ratio matches none of them.
    #[must_use]
    pub fn time_adjustment(&self, estimated_time: i64, remaining_time: u32) -> i32 {
        let cfg = &self.policy.time_adjustment;
        let time_ratio = ratio(estimated_time, remaining_time);
        if time_ratio > cfg.heavy_ratio {
            cfg.heavy_penalty
        } else if time_ratio > cfg.moderate_ratio {
            cfg.moderate_penalty
        } else if time_ratio < cfg.quick_ratio {
            cfg.quick_bonus
        } else {
            0
        }
    }

    #[must_use]
    pub fn level_adjustment(&self, category: LandmarkCategory, player_level: u32) -> i32 {
        if player_level < self.policy.required_level(category) {
            self.policy.penalties.under_level
        } else {
            0
        }
    }

    #[must_use]
    pub fn key_adjustment(&self, category: LandmarkCategory, stonesword_keys: u32) -> i32 {
        if category.requires_key() && stonesword_keys == 0 {
            self.policy.penalties.missing_key
        } else {
            0
        }
    }
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self::new(RoutePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Day, NightfarerClass};

    fn state(keys: u32, level_runes: u64, remaining: u32) -> RunState {
        let mut state = RunState::new(Vec::new(), Nightlord::Gladius, Day::One, remaining);
        state.stonesword_keys = keys;
        state.runes_gained = level_runes;
        state.player_level = RoutePolicy::default().level_for_runes(level_runes);
        state
    }

    fn fact(id: u32, category: LandmarkCategory, time: i64) -> PoiFact {
        PoiFact::new(id, category, 10.0, 20.0).with_estimates(time, 1_000)
    }

    #[test]
    fn church_gets_quick_bonus() {
        let scorer = PriorityScorer::default();
        let priority = scorer.score(&fact(1, LandmarkCategory::Church, 120), &state(0, 0, 900));
        assert_eq!(priority.base_priority, 95);
        assert!((priority.adjusted_priority - 105.0).abs() < f64::EPSILON);
        assert!(!priority.accessibility.requires_keys);
        assert_eq!(priority.accessibility.required_level, 1);
    }

    #[test]
    fn evergaol_without_key_loses_fifty() {
        let scorer = PriorityScorer::default();
        let poi = fact(2, LandmarkCategory::Evergaol, 240);
        let locked = scorer.score(&poi, &state(0, 0, 900));
        let open = scorer.score(&poi, &state(1, 0, 900));
        assert!((locked.adjusted_priority - 30.0).abs() < f64::EPSILON);
        assert!((open.adjusted_priority - locked.adjusted_priority - 50.0).abs() < f64::EPSILON);
        assert!(locked.accessibility.requires_keys);
    }

    #[test]
    fn time_buckets_apply_in_order() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.time_adjustment(800, 900), -30);
        assert_eq!(scorer.time_adjustment(720, 900), -15);
        assert_eq!(scorer.time_adjustment(450, 900), 0);
        assert_eq!(scorer.time_adjustment(460, 900), -15);
        assert_eq!(scorer.time_adjustment(180, 900), 0);
        assert_eq!(scorer.time_adjustment(179, 900), 10);
        assert_eq!(scorer.time_adjustment(60, 0), -30);
        assert_eq!(scorer.time_adjustment(0, 0), 0);
    }

    #[test]
    fn level_gate_penalizes_underleveled_players() {
        let scorer = PriorityScorer::default();
        let castle = fact(3, LandmarkCategory::Castle, 300);
        let low = scorer.breakdown(&castle, &state(0, 0, 900));
        let high = scorer.breakdown(&castle, &state(0, 10_000, 900));
        assert_eq!(low.level, -25);
        assert_eq!(high.level, 0);
        assert_eq!(scorer.level_adjustment(LandmarkCategory::Fort, 1), -25);
        assert_eq!(scorer.level_adjustment(LandmarkCategory::Fort, 2), 0);
    }

    #[test]
    fn score_floors_at_zero() {
        let scorer = PriorityScorer::default();
        let priority = scorer.score(
            &fact(4, LandmarkCategory::Township, 850),
            &state(0, 0, 900),
        );
        assert_eq!(priority.base_priority, 0);
        assert!(priority.adjusted_priority.abs() < f64::EPSILON);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = PriorityScorer::default();
        let poi = fact(5, LandmarkCategory::Ruins, 300);
        let snapshot = state(1, 2_000, 700);
        assert_eq!(scorer.score(&poi, &snapshot), scorer.score(&poi, &snapshot));
    }

    #[derive(Debug)]
    struct GuardianLovesForts;

    impl TeamBonusPolicy for GuardianLovesForts {
        fn team_bonus(&self, category: LandmarkCategory, team: &[TeamMember]) -> i32 {
            let guardians = team
                .iter()
                .filter(|member| member.chosen_class == Some(NightfarerClass::Guardian))
                .count();
            if category == LandmarkCategory::Fort && guardians > 0 {
                12
            } else {
                0
            }
        }
    }

    #[derive(Debug)]
    struct GladiusHatesChurches;

    impl NightlordBonusPolicy for GladiusHatesChurches {
        fn nightlord_bonus(&self, category: LandmarkCategory, nightlord: Nightlord) -> i32 {
            if nightlord == Nightlord::Gladius && category == LandmarkCategory::Church {
                -200
            } else {
                0
            }
        }
    }

    #[test]
    fn injected_bonus_policies_contribute() {
        let scorer = PriorityScorer::default()
            .with_team_bonus(GuardianLovesForts)
            .with_nightlord_bonus(GladiusHatesChurches);
        let mut snapshot = state(0, 1_000, 900);
        snapshot.team_composition = vec![TeamMember::new(1, Some(NightfarerClass::Guardian), false)];

        let fort = scorer.breakdown(&fact(6, LandmarkCategory::Fort, 300), &snapshot);
        assert_eq!(fort.team, 12);
        assert!((fort.adjusted() - 92.0).abs() < f64::EPSILON);

        let church = scorer.score(&fact(7, LandmarkCategory::Church, 120), &snapshot);
        assert!(church.adjusted_priority.abs() < f64::EPSILON);
    }
}

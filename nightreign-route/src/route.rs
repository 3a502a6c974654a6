//! Greedy, time-bounded route selection.
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::constants::{
    LOG_ROUTE_ACCEPTED, LOG_ROUTE_FAILED, LOG_ROUTE_FILTERED, LOG_ROUTE_SKIPPED,
    PLACEHOLDER_LEG_DISTANCE,
};
use crate::debug::DebugSession;
use crate::numbers::{clamp_i64_to_u32, euclidean};
use crate::poi::{PoiFact, PoiId, PoiPriority};
use crate::policy::{DistanceMetric, PolicyError, RoutePolicy};
use crate::priority::{NightlordBonusPolicy, PriorityScorer, TeamBonusPolicy};
use crate::roster::{Day, Nightlord, TeamMember};
use crate::state::{RunState, RunTracker};

/// Failures inside a calculation. Always surfaced as a typed result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("POI {poi_id} has negative {field} ({value})")]
    NegativeEstimate {
        poi_id: PoiId,
        field: &'static str,
        value: i64,
    },
    #[error("POI {poi_id} has non-finite coordinates")]
    NonFiniteCoordinate { poi_id: PoiId },
    #[error("Missing required start/end POIs from layout data ({slot})")]
    MissingAnchor { slot: String },
    #[error("debug mode is not enabled; call enable_debug_mode first")]
    DebugModeDisabled,
}

/// Ordered route for one time budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCalculation {
    pub pattern_id: String,
    pub nightlord: Nightlord,
    pub route: Vec<PoiId>,
    pub total_distance: f64,
    pub estimated_time: u32,
    pub priorities: BTreeMap<PoiId, f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Diagnostics attached to every result, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub state_snapshot: RunState,
    pub priority_calculations: Vec<PoiPriority>,
    pub execution_time: Duration,
}

/// Outcome of `calculate_route`. A failed result never carries a partial route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub success: bool,
    #[serde(default)]
    pub route: Option<RouteCalculation>,
    #[serde(default)]
    pub error: Option<String>,
    pub debug_info: DebugInfo,
}

/// A candidate that survived filtering, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankedPoi {
    pub priority: PoiPriority,
    pub position: (f64, f64),
}

/// Running totals while walking ranked candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RouteAccumulator {
    pub route: Vec<PoiId>,
    pub total_time: i64,
    pub total_distance: f64,
    last_position: Option<(f64, f64)>,
}

impl RouteAccumulator {
    /// Append the candidate when it fits in what is left of `budget`.
    pub fn try_take(&mut self, candidate: &RankedPoi, budget: u32, metric: DistanceMetric) -> bool {
        let needed = self.total_time + candidate.priority.estimated_time;
        if needed > i64::from(budget) {
            trace!(
                "{LOG_ROUTE_SKIPPED}: poi {} needs {}s, {}s already committed of {budget}s",
                candidate.priority.poi_id,
                candidate.priority.estimated_time,
                self.total_time
            );
            return false;
        }
        self.total_time = needed;
        self.total_distance += match metric {
            DistanceMetric::Placeholder => PLACEHOLDER_LEG_DISTANCE,
            DistanceMetric::Euclidean => self
                .last_position
                .map_or(0.0, |from| euclidean(from, candidate.position)),
        };
        self.last_position = Some(candidate.position);
        self.route.push(candidate.priority.poi_id);
        trace!(
            "{LOG_ROUTE_ACCEPTED}: poi {} at priority {}",
            candidate.priority.poi_id, candidate.priority.adjusted_priority
        );
        true
    }

    pub fn committed_time(&self) -> u32 {
        clamp_i64_to_u32(self.total_time)
    }
}

/// Result of one full greedy pass, before it is wrapped for the caller.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub accumulator: RouteAccumulator,
    pub ranked: Vec<RankedPoi>,
}

impl Selection {
    pub fn priorities(&self) -> Vec<PoiPriority> {
        self.ranked.iter().map(|ranked| ranked.priority.clone()).collect()
    }

    pub fn priority_map(&self) -> BTreeMap<PoiId, f64> {
        self.ranked
            .iter()
            .map(|ranked| (ranked.priority.poi_id, ranked.priority.adjusted_priority))
            .collect()
    }
}

/// Reject facts the scorer cannot reason about.
pub(crate) fn validate_fact(fact: &PoiFact) -> Result<(), RouteError> {
    if fact.estimated_time < 0 {
        return Err(RouteError::NegativeEstimate {
            poi_id: fact.id,
            field: "estimated_time",
            value: fact.estimated_time,
        });
    }
    if fact.estimated_runes < 0 {
        return Err(RouteError::NegativeEstimate {
            poi_id: fact.id,
            field: "estimated_runes",
            value: fact.estimated_runes,
        });
    }
    if !fact.x.is_finite() || !fact.y.is_finite() {
        return Err(RouteError::NonFiniteCoordinate { poi_id: fact.id });
    }
    Ok(())
}

/// Owns one run state and plans routes against it.
#[derive(Debug)]
pub struct RouteCalculator {
    pub(crate) tracker: RunTracker,
    pub(crate) scorer: PriorityScorer,
    pub(crate) debug: Option<DebugSession>,
}

impl RouteCalculator {
    /// Calculator with the default policy tables.
    #[must_use]
    pub fn new(initial_state: RunState) -> Self {
        Self::from_scorer(initial_state, PriorityScorer::default())
    }

    /// Calculator with custom policy tables.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] if the tables fail validation.
    pub fn with_policy(initial_state: RunState, policy: RoutePolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self::from_scorer(initial_state, PriorityScorer::new(policy)))
    }

    fn from_scorer(initial_state: RunState, scorer: PriorityScorer) -> Self {
        Self {
            tracker: RunTracker::from_state(initial_state, scorer.policy()),
            scorer,
            debug: None,
        }
    }

    #[must_use]
    pub fn with_team_bonus(mut self, policy: impl TeamBonusPolicy + 'static) -> Self {
        self.scorer = self.scorer.with_team_bonus(policy);
        self
    }

    #[must_use]
    pub fn with_nightlord_bonus(mut self, policy: impl NightlordBonusPolicy + 'static) -> Self {
        self.scorer = self.scorer.with_nightlord_bonus(policy);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &RoutePolicy {
        self.scorer.policy()
    }

    #[must_use]
    pub const fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    #[must_use]
    pub const fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub const fn tracker_mut(&mut self) -> &mut RunTracker {
        &mut self.tracker
    }

    pub fn initialize_state(
        &mut self,
        team: Vec<TeamMember>,
        nightlord: Nightlord,
        day: Day,
        start_time: u32,
    ) {
        self.tracker.initialize_state(team, nightlord, day, start_time);
    }

    pub fn add_runes(&mut self, amount: u64) {
        self.tracker.add_runes(amount);
    }

    pub fn update_stonesword_keys(&mut self, delta: i64) {
        self.tracker.update_stonesword_keys(delta);
    }

    pub fn subtract_time(&mut self, seconds: u32) {
        self.tracker.subtract_time(seconds);
    }

    pub fn mark_poi_visited(&mut self, poi_id: PoiId) {
        self.tracker.mark_poi_visited(poi_id);
    }

    #[must_use]
    pub fn current_state(&self) -> RunState {
        self.tracker.current_state()
    }

    /// Score a single fact against the current state.
    #[must_use]
    pub fn calculate_poi_priority(&self, fact: &PoiFact) -> PoiPriority {
        self.scorer.score(fact, self.tracker.state())
    }

    /// Score, filter, and stable-sort candidates, highest priority first.
    pub(crate) fn rank_candidates(&self, pois: &[PoiFact]) -> Result<Vec<RankedPoi>, RouteError> {
        let state = self.tracker.state();
        let budget = i64::from(state.remaining_time);
        let mut ranked = Vec::with_capacity(pois.len());
        for fact in pois {
            validate_fact(fact)?;
            let priority = self.scorer.score(fact, state);
            let unlocked = !priority.accessibility.requires_keys || state.stonesword_keys > 0;
            if priority.adjusted_priority > 0.0 && priority.estimated_time <= budget && unlocked {
                ranked.push(RankedPoi {
                    priority,
                    position: fact.position(),
                });
            }
        }
        ranked.sort_by(|a, b| {
            b.priority
                .adjusted_priority
                .total_cmp(&a.priority.adjusted_priority)
        });
        debug!(
            "{LOG_ROUTE_FILTERED}: {} of {} candidates accessible on {}",
            ranked.len(),
            pois.len(),
            state.current_day
        );
        Ok(ranked)
    }

    /// One greedy pass over `pois` without touching the run state.
    pub(crate) fn select(&self, pois: &[PoiFact]) -> Result<Selection, RouteError> {
        let ranked = self.rank_candidates(pois)?;
        let budget = self.tracker.state().remaining_time;
        let metric = self.policy().distance;
        let mut accumulator = RouteAccumulator::default();
        for candidate in &ranked {
            accumulator.try_take(candidate, budget, metric);
        }
        Ok(Selection {
            accumulator,
            ranked,
        })
    }

    /// Plan a single route within the current remaining time.
    ///
    /// The run state is read, never modified, so repeated calls with the same
    /// input yield the same result. Any failure is reported through
    /// `RouteResult::error` with an empty priority list.
    #[must_use]
    pub fn calculate_route(&self, pois: &[PoiFact], pattern_id: &str) -> RouteResult {
        let started = Instant::now();
        match self.select(pois) {
            Ok(selection) => {
                let state = self.tracker.state();
                let route = RouteCalculation {
                    pattern_id: pattern_id.to_string(),
                    nightlord: state.nightlord,
                    route: selection.accumulator.route.clone(),
                    total_distance: selection.accumulator.total_distance,
                    estimated_time: selection.accumulator.committed_time(),
                    priorities: selection.priority_map(),
                    notes: Some(self.route_notes(&selection)),
                };
                RouteResult {
                    success: true,
                    route: Some(route),
                    error: None,
                    debug_info: DebugInfo {
                        state_snapshot: self.current_state(),
                        priority_calculations: selection.priorities(),
                        execution_time: started.elapsed(),
                    },
                }
            }
            Err(err) => self.failure(&err, started),
        }
    }

    pub(crate) fn failure(&self, err: &RouteError, started: Instant) -> RouteResult {
        warn!("{LOG_ROUTE_FAILED}: {err}");
        RouteResult {
            success: false,
            route: None,
            error: Some(err.to_string()),
            debug_info: DebugInfo {
                state_snapshot: self.current_state(),
                priority_calculations: Vec::new(),
                execution_time: started.elapsed(),
            },
        }
    }

    fn route_notes(&self, selection: &Selection) -> String {
        let metric = match self.policy().distance {
            DistanceMetric::Placeholder => "placeholder legs",
            DistanceMetric::Euclidean => "straight-line legs",
        };
        format!(
            "Selected {} of {} accessible POIs in {}s of {}s ({metric})",
            selection.accumulator.route.len(),
            selection.ranked.len(),
            selection.accumulator.total_time,
            self.tracker.state().remaining_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::LandmarkCategory;

    fn calculator(keys: u32) -> RouteCalculator {
        let mut state = RunState::new(Vec::new(), Nightlord::Gladius, Day::One, 900);
        state.stonesword_keys = keys;
        RouteCalculator::new(state)
    }

    fn church_and_evergaol() -> Vec<PoiFact> {
        vec![
            PoiFact::new(1, LandmarkCategory::Church, 100.0, 100.0).with_estimates(120, 2_000),
            PoiFact::new(2, LandmarkCategory::Evergaol, 400.0, 500.0).with_estimates(240, 12_000),
        ]
    }

    #[test]
    fn locked_evergaol_is_scored_but_not_routed() {
        let calculator = calculator(0);
        let result = calculator.calculate_route(&church_and_evergaol(), "Gladius-01");
        assert!(result.success);
        let evergaol = calculator.calculate_poi_priority(&church_and_evergaol()[1]);
        assert!((evergaol.adjusted_priority - 30.0).abs() < f64::EPSILON);
        let route = result.route.expect("route");
        assert_eq!(route.route, vec![1]);
        assert_eq!(route.estimated_time, 120);
        assert!((route.priorities[&1] - 105.0).abs() < f64::EPSILON);
        assert!(!route.priorities.contains_key(&2));
    }

    #[test]
    fn church_then_evergaol_with_key() {
        let calculator = calculator(1);
        let result = calculator.calculate_route(&church_and_evergaol(), "Gladius-01");
        assert!(result.success);
        let route = result.route.expect("route");
        assert_eq!(route.route, vec![1, 2]);
        assert_eq!(route.estimated_time, 360);
        assert!((route.total_distance - 200.0).abs() < f64::EPSILON);
        assert!((route.priorities[&1] - 105.0).abs() < f64::EPSILON);
        assert!((route.priorities[&2] - 80.0).abs() < f64::EPSILON);
        assert_eq!(result.debug_info.priority_calculations.len(), 2);
    }

    #[test]
    fn skips_candidates_that_overflow_budget() {
        let calculator = calculator(1);
        let pois = vec![
            PoiFact::new(10, LandmarkCategory::Church, 0.0, 0.0).with_estimates(500, 2_000),
            PoiFact::new(11, LandmarkCategory::Church, 0.0, 0.0).with_estimates(500, 2_000),
            PoiFact::new(12, LandmarkCategory::Ruins, 0.0, 0.0).with_estimates(300, 8_000),
        ];
        let result = calculator.calculate_route(&pois, "p");
        let route = result.route.expect("route");
        assert_eq!(route.route, vec![10, 12]);
        assert_eq!(route.estimated_time, 800);
    }

    #[test]
    fn filtered_candidates_are_excluded_from_priorities() {
        let calculator = calculator(0);
        let pois = vec![
            PoiFact::new(20, LandmarkCategory::Township, 0.0, 0.0).with_estimates(850, 0),
            PoiFact::new(21, LandmarkCategory::Fort, 0.0, 0.0).with_estimates(1_200, 8_000),
            PoiFact::new(22, LandmarkCategory::MainEncampment, 0.0, 0.0).with_estimates(300, 8_000),
        ];
        let result = calculator.calculate_route(&pois, "p");
        let route = result.route.expect("route");
        assert_eq!(route.route, vec![22]);
        assert_eq!(route.priorities.len(), 1);
    }

    #[test]
    fn negative_time_fails_without_touching_state() {
        let calculator = calculator(0);
        let pois = vec![
            PoiFact::new(1, LandmarkCategory::Church, 0.0, 0.0).with_estimates(120, 2_000),
            PoiFact::new(9, LandmarkCategory::Fort, 0.0, 0.0).with_estimates(-60, 8_000),
        ];
        let result = calculator.calculate_route(&pois, "p");
        assert!(!result.success);
        assert!(result.route.is_none());
        assert!(result.error.as_deref().unwrap_or_default().contains("POI 9"));
        assert!(result.debug_info.priority_calculations.is_empty());
        assert_eq!(result.debug_info.state_snapshot.remaining_time, 900);
    }

    #[test]
    fn non_finite_coordinates_fail() {
        let calculator = calculator(0);
        let pois = vec![PoiFact::new(3, LandmarkCategory::Ruins, f64::NAN, 0.0)];
        let result = calculator.calculate_route(&pois, "p");
        assert_eq!(
            result.error,
            Some(RouteError::NonFiniteCoordinate { poi_id: 3 }.to_string())
        );
    }

    #[test]
    fn euclidean_metric_measures_legs() {
        let state = RunState::new(Vec::new(), Nightlord::Maris, Day::One, 900);
        let policy = RoutePolicy::default().with_distance(DistanceMetric::Euclidean);
        let calculator = RouteCalculator::with_policy(state, policy).expect("valid policy");
        let pois = vec![
            PoiFact::new(1, LandmarkCategory::Church, 0.0, 0.0).with_estimates(120, 2_000),
            PoiFact::new(2, LandmarkCategory::Ruins, 30.0, 40.0).with_estimates(300, 8_000),
        ];
        let route = calculator.calculate_route(&pois, "p").route.expect("route");
        assert_eq!(route.route, vec![1, 2]);
        assert!((route.total_distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let state = RunState::new(Vec::new(), Nightlord::Maris, Day::One, 900);
        let policy = RoutePolicy {
            day_cycle_seconds: 0,
            ..RoutePolicy::default()
        };
        assert!(matches!(
            RouteCalculator::with_policy(state, policy),
            Err(PolicyError::ZeroDayCycle)
        ));
    }

    #[test]
    fn reruns_are_idempotent() {
        let calculator = calculator(0);
        let pois = church_and_evergaol();
        let first = calculator.calculate_route(&pois, "p").route;
        let second = calculator.calculate_route(&pois, "p").route;
        assert_eq!(first, second);
        assert!(calculator.current_state().visited_pois.is_empty());
    }
}

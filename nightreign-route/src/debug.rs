//! Single-step execution of the greedy selection loop.
//!
//! A debug session captures a candidate list and walks it one accepted POI
//! at a time. Every step re-ranks through the same scorer and filter as
//! [`RouteCalculator::calculate_route`] and takes the highest-ranked POI
//! not yet in the session's route that still fits. Stepping never touches
//! the run tracker, so while the caller leaves the state alone `n` steps
//! select the first `n` POIs of the one-shot route. If the state changes
//! between steps the next pick follows the new ranking, and a POI is never
//! selected twice.
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{LOG_STEP_EXHAUSTED, LOG_STEP_SELECTED};
use crate::layout::LayoutDocument;
use crate::poi::{PoiFact, PoiId, PoiPriority};
use crate::route::{RouteAccumulator, RouteCalculator, RouteError};

/// Where the candidates came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutContext {
    pub pattern_id: String,
    #[serde(default)]
    pub layout: Option<LayoutDocument>,
}

impl LayoutContext {
    #[must_use]
    pub fn new(pattern_id: impl Into<String>) -> Self {
        Self {
            pattern_id: pattern_id.into(),
            layout: None,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutDocument) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// Outcome of one `execute_next_step` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub selected_poi: Option<PoiId>,
    pub priorities: Vec<PoiPriority>,
    pub error: Option<String>,
}

impl StepResult {
    fn failed(err: &RouteError) -> Self {
        Self {
            success: false,
            selected_poi: None,
            priorities: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    /// True once a successful step finds nothing left to select.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.success && self.selected_poi.is_none()
    }
}

/// Captured candidates plus progress through the ranked list.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugSession {
    pois: Vec<PoiFact>,
    context: LayoutContext,
    taken: BTreeSet<PoiId>,
    accumulator: RouteAccumulator,
    steps_taken: usize,
}

impl DebugSession {
    fn new(pois: Vec<PoiFact>, context: LayoutContext) -> Self {
        Self {
            pois,
            context,
            taken: BTreeSet::new(),
            accumulator: RouteAccumulator::default(),
            steps_taken: 0,
        }
    }

    #[must_use]
    pub fn pois(&self) -> &[PoiFact] {
        &self.pois
    }

    #[must_use]
    pub const fn context(&self) -> &LayoutContext {
        &self.context
    }

    /// POIs selected so far, in order.
    #[must_use]
    pub fn route(&self) -> &[PoiId] {
        &self.accumulator.route
    }

    /// Seconds committed by the selected POIs.
    #[must_use]
    pub fn elapsed_time(&self) -> u32 {
        self.accumulator.committed_time()
    }

    #[must_use]
    pub const fn total_distance(&self) -> f64 {
        self.accumulator.total_distance
    }

    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}

impl RouteCalculator {
    /// Capture `pois` for stepping. Replaces any previous session.
    pub fn enable_debug_mode(&mut self, pois: Vec<PoiFact>, layout_context: LayoutContext) {
        debug!(
            "debug mode enabled for {} ({} candidates)",
            layout_context.pattern_id,
            pois.len()
        );
        self.debug = Some(DebugSession::new(pois, layout_context));
    }

    /// Drop the captured session.
    pub fn disable_debug_mode(&mut self) {
        self.debug = None;
    }

    #[must_use]
    pub const fn is_debug_enabled(&self) -> bool {
        self.debug.is_some()
    }

    #[must_use]
    pub const fn debug_session(&self) -> Option<&DebugSession> {
        self.debug.as_ref()
    }

    /// Advance the selection loop to the next accepted POI.
    pub fn execute_next_step(&mut self) -> StepResult {
        let Some(session) = self.debug.as_ref() else {
            return StepResult::failed(&RouteError::DebugModeDisabled);
        };
        let ranked = match self.rank_candidates(&session.pois) {
            Ok(ranked) => ranked,
            Err(err) => return StepResult::failed(&err),
        };
        let budget = self.tracker.state().remaining_time;
        let metric = self.policy().distance;
        let priorities: Vec<PoiPriority> =
            ranked.iter().map(|ranked| ranked.priority.clone()).collect();

        let Some(session) = self.debug.as_mut() else {
            return StepResult::failed(&RouteError::DebugModeDisabled);
        };
        session.steps_taken += 1;
        let mut selected_poi = None;
        for candidate in &ranked {
            let poi_id = candidate.priority.poi_id;
            if session.taken.contains(&poi_id) {
                continue;
            }
            if session.accumulator.try_take(candidate, budget, metric) {
                session.taken.insert(poi_id);
                selected_poi = Some(poi_id);
                break;
            }
        }

        match selected_poi {
            Some(poi_id) => debug!(
                "{LOG_STEP_SELECTED}: step {} picked poi {poi_id} ({}s committed)",
                session.steps_taken,
                session.accumulator.total_time
            ),
            None => debug!(
                "{LOG_STEP_EXHAUSTED}: step {} found no remaining candidate",
                session.steps_taken
            ),
        }

        StepResult {
            success: true,
            selected_poi,
            priorities,
            error: None,
        }
    }
}

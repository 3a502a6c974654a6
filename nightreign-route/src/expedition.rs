//! Two-day expedition planning.
//!
//! Day one runs from the spawn point to the first night circle, day two from
//! the first night circle to the second. Each day gets a fresh time budget;
//! runes, level, keys and visits carry over, so day two never repeats a POI
//! and is scored at whatever level day one reached.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::constants::{LOG_EXPEDITION_ANCHORS, LOG_EXPEDITION_DAY_FAILED};
use crate::layout::{LayoutDocument, LocationIndex, night_circle_poi, spawn_poi};
use crate::numbers::{clamp_i64_to_u32, clamp_i64_to_u64};
use crate::poi::{PoiFact, PoiId, PoiPriority};
use crate::roster::Day;
use crate::route::{DebugInfo, RouteCalculator, RouteError, validate_fact};

/// One day's route, bracketed by its start and end anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRoute {
    pub day: Day,
    pub start_poi: PoiId,
    pub end_poi: PoiId,
    /// `[start, ..selected, end]`
    pub route: Vec<PoiId>,
    pub total_time: u32,
    pub total_distance: f64,
    pub priorities: BTreeMap<PoiId, f64>,
}

impl DayRoute {
    /// POIs chosen between the anchors.
    #[must_use]
    pub fn selected(&self) -> &[PoiId] {
        let len = self.route.len();
        if len < 2 { &[] } else { &self.route[1..len - 1] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionPlan {
    pub pattern_id: String,
    pub day_one: DayRoute,
    pub day_two: DayRoute,
    pub total_runes: u64,
    pub total_time: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionResult {
    pub success: bool,
    #[serde(default)]
    pub plan: Option<ExpeditionPlan>,
    #[serde(default)]
    pub error: Option<String>,
    pub debug_info: DebugInfo,
}

struct Anchors {
    spawn: PoiId,
    night_one: PoiId,
    night_two: PoiId,
}

fn resolve_anchors(layout: &LayoutDocument, index: &LocationIndex) -> Result<Anchors, RouteError> {
    let missing = |slot: &str| RouteError::MissingAnchor {
        slot: slot.to_string(),
    };
    let spawn = spawn_poi(layout, index).ok_or_else(|| missing("Spawn Point"))?;
    let night_one = night_circle_poi(layout, index, 1).ok_or_else(|| missing("Night 1 Circle"))?;
    let night_two = night_circle_poi(layout, index, 2).ok_or_else(|| missing("Night 2 Circle"))?;
    Ok(Anchors {
        spawn,
        night_one,
        night_two,
    })
}

/// Plan both days of an expedition and apply the visits to the calculator's
/// run state.
///
/// Failures are reported through the result and leave the run state as it
/// was: anchors and facts are checked before anything is mutated.
pub fn plan_expedition(
    calculator: &mut RouteCalculator,
    pois: &[PoiFact],
    layout: &LayoutDocument,
    index: &LocationIndex,
    pattern_id: &str,
) -> ExpeditionResult {
    let started = Instant::now();
    let prepared = resolve_anchors(layout, index).and_then(|anchors| {
        pois.iter().try_for_each(validate_fact)?;
        Ok(anchors)
    });
    let anchors = match prepared {
        Ok(anchors) => anchors,
        Err(err) => return failed_expedition(calculator, &err, started),
    };
    debug!(
        "{LOG_EXPEDITION_ANCHORS}: spawn={} night1={} night2={}",
        anchors.spawn, anchors.night_one, anchors.night_two
    );

    let checkpoint = calculator.tracker().clone();
    let mut priority_calculations = Vec::new();
    let mut total_runes = 0_u64;
    let days = plan_day(
        calculator,
        pois,
        Day::One,
        (anchors.spawn, anchors.night_one),
        &mut priority_calculations,
        &mut total_runes,
    )
    .and_then(|day_one| {
        let day_two = plan_day(
            calculator,
            pois,
            Day::Two,
            (anchors.night_one, anchors.night_two),
            &mut priority_calculations,
            &mut total_runes,
        )?;
        Ok((day_one, day_two))
    });
    let (day_one, day_two) = match days {
        Ok(days) => days,
        Err(err) => {
            *calculator.tracker_mut() = checkpoint;
            return failed_expedition(calculator, &err, started);
        }
    };

    let notes = format!(
        "{pattern_id}: day 1 visits {} POIs, day 2 visits {} POIs",
        day_one.selected().len(),
        day_two.selected().len()
    );
    info!("{notes}");
    let plan = ExpeditionPlan {
        pattern_id: pattern_id.to_string(),
        total_time: day_one.total_time.saturating_add(day_two.total_time),
        day_one,
        day_two,
        total_runes,
        notes,
    };
    ExpeditionResult {
        success: true,
        plan: Some(plan),
        error: None,
        debug_info: DebugInfo {
            state_snapshot: calculator.current_state(),
            priority_calculations,
            execution_time: started.elapsed(),
        },
    }
}

fn failed_expedition(
    calculator: &RouteCalculator,
    err: &RouteError,
    started: Instant,
) -> ExpeditionResult {
    let failed = calculator.failure(err, started);
    ExpeditionResult {
        success: false,
        plan: None,
        error: failed.error,
        debug_info: failed.debug_info,
    }
}

fn plan_day(
    calculator: &mut RouteCalculator,
    pois: &[PoiFact],
    day: Day,
    (start_poi, end_poi): (PoiId, PoiId),
    priority_calculations: &mut Vec<PoiPriority>,
    total_runes: &mut u64,
) -> Result<DayRoute, RouteError> {
    calculator.tracker_mut().begin_day(day);

    let mut seen = BTreeSet::new();
    let candidates: Vec<PoiFact> = pois
        .iter()
        .filter(|fact| fact.id != start_poi && fact.id != end_poi)
        .filter(|fact| !calculator.tracker().state().has_visited(fact.id))
        .filter(|fact| seen.insert(fact.id))
        .cloned()
        .collect();

    let selection = calculator.select(&candidates).inspect_err(|err| {
        warn!("{LOG_EXPEDITION_DAY_FAILED}: {day} selection failed: {err}");
    })?;
    let priorities = selection.priority_map();
    priority_calculations.extend(selection.priorities());
    let total_time = selection.accumulator.committed_time();
    let total_distance = selection.accumulator.total_distance;
    let by_id: BTreeMap<PoiId, &PoiFact> = candidates.iter().map(|fact| (fact.id, fact)).collect();

    let mut route = vec![start_poi];
    for poi_id in &selection.accumulator.route {
        let Some(fact) = by_id.get(poi_id) else {
            continue;
        };
        let runes = clamp_i64_to_u64(fact.estimated_runes);
        *total_runes = total_runes.saturating_add(runes);
        calculator.mark_poi_visited(*poi_id);
        calculator.add_runes(runes);
        calculator.subtract_time(clamp_i64_to_u32(fact.estimated_time));
        route.push(*poi_id);
    }
    route.push(end_poi);
    debug!(
        "{day}: {} stops, {total_time}s used, level {}",
        route.len(),
        calculator.tracker().state().player_level
    );

    Ok(DayRoute {
        day,
        start_poi,
        end_poi,
        route,
        total_time,
        total_distance,
        priorities,
    })
}

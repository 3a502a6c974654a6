//! Nightreign Route Engine
//!
//! Platform-agnostic route planning for Nightreign expeditions. Given a run
//! state and a list of POI facts, the engine scores every POI, keeps the ones
//! the party can reach and afford, and greedily packs the best of them into
//! the remaining day-cycle time. No I/O happens here; layout documents are
//! parsed from strings the caller has already loaded.

pub mod constants;
pub mod debug;
pub mod expedition;
pub mod layout;
pub mod numbers;
pub mod poi;
pub mod policy;
pub mod priority;
pub mod roster;
pub mod route;
pub mod state;

// Re-export commonly used types
pub use debug::{DebugSession, LayoutContext, StepResult};
pub use expedition::{DayRoute, ExpeditionPlan, ExpeditionResult, plan_expedition};
pub use layout::{
    CoordinateTable, LayoutDocument, LayoutError, LocationEntry, LocationIndex, PoiSource,
    SlotCategory, SlotValue, StaticLayoutSource, category_from_value, category_stats,
    extract_poi_facts, night_circle_poi, spawn_poi,
};
pub use poi::{
    Accessibility, CategoryStats, EstimatedRewards, ItemList, LandmarkCategory, PoiFact, PoiId,
    PoiPriority,
};
pub use policy::{
    AccessPenaltyCfg, DistanceMetric, LevelThreshold, PolicyError, RoutePolicy,
    TimeAdjustmentCfg, level_for_runes,
};
pub use priority::{
    NightlordBonusPolicy, NoNightlordBonus, NoTeamBonus, PriorityBreakdown, PriorityScorer,
    TeamBonusPolicy,
};
pub use roster::{Day, NightfarerClass, Nightlord, TeamMember, UnknownVariant};
pub use route::{DebugInfo, RouteCalculation, RouteCalculator, RouteError, RouteResult};
pub use state::{RunState, RunTracker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_result_serializes_for_reports() {
        let calculator =
            RouteCalculator::new(RunState::new(Vec::new(), Nightlord::Adel, Day::One, 900));
        let pois = [PoiFact::new(1, LandmarkCategory::Church, 5.0, 5.0)];
        let result = calculator.calculate_route(&pois, "Adel-01");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["route"]["route"][0], 1);
        assert_eq!(json["route"]["nightlord"], "Adel");
        assert_eq!(json["debug_info"]["state_snapshot"]["current_day"], 1);
    }
}

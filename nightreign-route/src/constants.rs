//! Centralized balance and tuning constants for route planning.
//!
//! These values define the deterministic math for priority scoring and
//! route selection. `RoutePolicy::default()` is assembled from them, so the
//! default behavior can only be adjusted via reviewed code changes.

// Day cycle -----------------------------------------------------------------
/// Length of one day cycle in seconds (15 minutes).
pub const DAY_CYCLE_SECONDS: u32 = 15 * 60;

// Level progression ---------------------------------------------------------
/// `(level, runes required)` pairs, ascending by rune requirement.
pub const LEVEL_THRESHOLDS: [(u32, u64); 10] = [
    (1, 0),
    (2, 1_000),
    (3, 3_000),
    (4, 6_000),
    (5, 10_000),
    (6, 15_000),
    (7, 21_000),
    (8, 28_000),
    (9, 36_000),
    (10, 45_000),
];

// Time adjustment -----------------------------------------------------------
pub(crate) const TIME_RATIO_HEAVY: f64 = 0.8;
pub(crate) const TIME_RATIO_MODERATE: f64 = 0.5;
pub(crate) const TIME_RATIO_QUICK: f64 = 0.2;
pub(crate) const TIME_PENALTY_HEAVY: i32 = -30;
pub(crate) const TIME_PENALTY_MODERATE: i32 = -15;
pub(crate) const TIME_BONUS_QUICK: i32 = 10;

// Accessibility -------------------------------------------------------------
pub(crate) const LEVEL_GATE_PENALTY: i32 = -25;
pub(crate) const MISSING_KEY_PENALTY: i32 = -50;
pub(crate) const DEFAULT_REQUIRED_LEVEL: u32 = 1;
pub(crate) const CASTLE_REQUIRED_LEVEL: u32 = 5;
pub(crate) const GREAT_CHURCH_REQUIRED_LEVEL: u32 = 3;
pub(crate) const FORT_REQUIRED_LEVEL: u32 = 2;

// Distance ------------------------------------------------------------------
/// Fixed per-POI distance increment used while real leg distances are unmodelled.
pub const PLACEHOLDER_LEG_DISTANCE: f64 = 100.0;

// Layout slots --------------------------------------------------------------
pub(crate) const EMPTY_SLOT: &str = "empty";
pub(crate) const EMPTY_SLOT_VALUE_SUFFIX: &str = ": empty";
pub(crate) const SMALL_CAMP_MARKER: &str = "Small Camp";
pub(crate) const SPAWN_POINT_KEY: &str = "Spawn Point";
pub(crate) const SCALE_BEARING_MERCHANT_KEY: &str = "Scale-Bearing Merchant";
pub(crate) const NIGHTLORD_KEY: &str = "Nightlord";
pub(crate) const SPECIAL_EVENT_KEY: &str = "Special Event";

// Logging keys --------------------------------------------------------------
pub(crate) const LOG_ROUTE_FILTERED: &str = "route.filtered";
pub(crate) const LOG_ROUTE_ACCEPTED: &str = "route.accepted";
pub(crate) const LOG_ROUTE_SKIPPED: &str = "route.skipped";
pub(crate) const LOG_ROUTE_FAILED: &str = "route.failed";
pub(crate) const LOG_STEP_SELECTED: &str = "debug.step.selected";
pub(crate) const LOG_STEP_EXHAUSTED: &str = "debug.step.exhausted";
pub(crate) const LOG_LAYOUT_DROPPED: &str = "layout.dropped";
pub(crate) const LOG_EXPEDITION_ANCHORS: &str = "expedition.anchors";
pub(crate) const LOG_EXPEDITION_DAY_FAILED: &str = "expedition.day_failed";

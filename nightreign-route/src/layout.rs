//! Turning layout documents into POI facts.
//!
//! A layout is a JSON object keyed by slot name (`"Major Base - Groveside"`,
//! `"Spawn Point"`, `"Night 1 Circle"`). Slot values are either a bare
//! location string or a `{location, value}` pair. Location names only become
//! unambiguous once paired with the slot category, so resolution goes
//! through a [`LocationIndex`] keyed by `(SlotCategory, name)`.
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::constants::{
    EMPTY_SLOT, EMPTY_SLOT_VALUE_SUFFIX, LOG_LAYOUT_DROPPED, NIGHTLORD_KEY,
    SCALE_BEARING_MERCHANT_KEY, SMALL_CAMP_MARKER, SPAWN_POINT_KEY, SPECIAL_EVENT_KEY,
};
use crate::poi::{CategoryStats, LandmarkCategory, PoiFact, PoiId};
use crate::roster::Nightlord;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to parse {what} JSON")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown layout {layout_id:?}")]
    UnknownLayout { layout_id: String },
}

/// Category of a layout slot, taken from the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotCategory {
    MajorBase,
    MinorBase,
    Evergaol,
    FieldBoss,
    ArenaBoss,
    RottedWoods,
    Castle,
    SpawnPoint,
    NightCircle,
    ScaleBearingMerchant,
    Other,
}

impl SlotCategory {
    /// Slot categories that produce POI facts, in output order.
    pub const EXTRACTED: [Self; 4] = [
        Self::MajorBase,
        Self::MinorBase,
        Self::Evergaol,
        Self::FieldBoss,
    ];

    #[must_use]
    pub fn from_slot_key(key: &str) -> Self {
        const PREFIXES: [(&str, SlotCategory); 6] = [
            ("Major Base -", SlotCategory::MajorBase),
            ("Minor Base -", SlotCategory::MinorBase),
            ("Evergaol -", SlotCategory::Evergaol),
            ("Field Boss -", SlotCategory::FieldBoss),
            ("Arena Boss -", SlotCategory::ArenaBoss),
            ("Rotted Woods -", SlotCategory::RottedWoods),
        ];
        if let Some((_, category)) = PREFIXES.iter().find(|(prefix, _)| key.starts_with(*prefix)) {
            return *category;
        }
        if key == SPAWN_POINT_KEY {
            Self::SpawnPoint
        } else if key.starts_with("Night ") && key.ends_with(" Circle") {
            Self::NightCircle
        } else if key.starts_with(SCALE_BEARING_MERCHANT_KEY) {
            Self::ScaleBearingMerchant
        } else if key.starts_with("Castle") {
            Self::Castle
        } else {
            Self::Other
        }
    }

    /// Landmark category forced by the slot, if any.
    #[must_use]
    pub const fn forced_landmark(self) -> Option<LandmarkCategory> {
        match self {
            Self::Evergaol => Some(LandmarkCategory::Evergaol),
            Self::FieldBoss => Some(LandmarkCategory::FieldBoss),
            _ => None,
        }
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MajorBase => "Major Base",
            Self::MinorBase => "Minor Base",
            Self::Evergaol => "Evergaol",
            Self::FieldBoss => "Field Boss",
            Self::ArenaBoss => "Arena Boss",
            Self::RottedWoods => "Rotted Woods",
            Self::Castle => "Castle",
            Self::SpawnPoint => "Spawn Point",
            Self::NightCircle => "Night Circle",
            Self::ScaleBearingMerchant => "Scale-Bearing Merchant",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Value stored under a layout slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Placed { location: String, value: String },
    Text(String),
    Other(serde_json::Value),
}

impl SlotValue {
    #[must_use]
    pub fn placed(location: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Placed {
            location: location.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn is_empty_slot(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == EMPTY_SLOT || text.ends_with(EMPTY_SLOT_VALUE_SUFFIX)
}

/// One layout, keyed by slot name. Slots keep their document order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct LayoutDocument {
    slots: Vec<(String, SlotValue)>,
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for LayoutDocument {
    type Error = serde_json::Error;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let slots = map
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::from_value(value)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        Ok(Self { slots })
    }
}

impl Serialize for LayoutDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.slots.iter().map(|(key, value)| (key, value)))
    }
}

impl LayoutDocument {
    /// Parse a layout JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Json`] if the input is not a JSON object of slots.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json).map_err(|source| LayoutError::Json {
            what: "layout",
            source,
        })
    }

    /// Append a slot, or replace the value of an existing key in place.
    #[must_use]
    pub fn with_slot(mut self, key: impl Into<String>, value: SlotValue) -> Self {
        let key = key.into();
        match self.slots.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.slots.push((key, value)),
        }
        self
    }

    #[must_use]
    pub fn slot(&self, key: &str) -> Option<&SlotValue> {
        self.slots
            .iter()
            .find_map(|(existing, value)| (existing == key).then_some(value))
    }

    /// Slots in document order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn nightlord(&self) -> Option<Nightlord> {
        self.slot(NIGHTLORD_KEY)?.text()?.parse().ok()
    }

    #[must_use]
    pub fn special_event(&self) -> Option<&str> {
        self.slot(SPECIAL_EVENT_KEY)?
            .text()
            .filter(|text| !is_empty_slot(text))
    }
}

/// One row of the location index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub category: SlotCategory,
    pub location: String,
    pub poi_id: PoiId,
}

/// `(slot category, location name) -> POI id`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationIndex {
    entries: BTreeMap<(SlotCategory, String), PoiId>,
}

impl LocationIndex {
    /// Parse `[{category, location, poi_id}]`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let entries: Vec<LocationEntry> =
            serde_json::from_str(json).map_err(|source| LayoutError::Json {
                what: "location index",
                source,
            })?;
        Ok(entries.into_iter().collect())
    }

    pub fn insert(&mut self, category: SlotCategory, location: impl Into<String>, poi_id: PoiId) {
        self.entries.insert((category, location.into()), poi_id);
    }

    #[must_use]
    pub fn resolve(&self, category: SlotCategory, location: &str) -> Option<PoiId> {
        self.entries
            .get(&(category, location.trim().to_string()))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LocationEntry> for LocationIndex {
    fn from_iter<T: IntoIterator<Item = LocationEntry>>(iter: T) -> Self {
        let mut index = Self::default();
        for entry in iter {
            index.insert(entry.category, entry.location, entry.poi_id);
        }
        index
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CoordinateRow {
    id: PoiId,
    coordinates: [f64; 2],
}

/// Master coordinate table: POI id to map position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateTable {
    positions: BTreeMap<PoiId, (f64, f64)>,
}

impl CoordinateTable {
    /// Parse `[{id, coordinates: [x, y]}]`. Extra fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let rows: Vec<CoordinateRow> =
            serde_json::from_str(json).map_err(|source| LayoutError::Json {
                what: "coordinate table",
                source,
            })?;
        Ok(rows
            .into_iter()
            .map(|row| (row.id, (row.coordinates[0], row.coordinates[1])))
            .collect())
    }

    pub fn insert(&mut self, poi_id: PoiId, position: (f64, f64)) {
        self.positions.insert(poi_id, position);
    }

    #[must_use]
    pub fn position(&self, poi_id: PoiId) -> Option<(f64, f64)> {
        self.positions.get(&poi_id).copied()
    }
}

impl FromIterator<(PoiId, (f64, f64))> for CoordinateTable {
    fn from_iter<T: IntoIterator<Item = (PoiId, (f64, f64))>>(iter: T) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Landmark category named by a slot value such as `"Fort - Crystalians"`.
#[must_use]
pub fn category_from_value(value: &str) -> LandmarkCategory {
    LandmarkCategory::from_layout_value(value)
}

/// Default visit time and rune payout for a category.
#[must_use]
pub const fn category_stats(category: LandmarkCategory) -> CategoryStats {
    category.default_stats()
}

/// Extract POI facts from the base, evergaol, and field boss slots.
///
/// Facts are grouped by slot category; within a category they follow the
/// document's slot order.
///
/// Slots that cannot be placed on the map are dropped: unresolved locations,
/// empty slots, small camps, and POIs without usable coordinates.
#[must_use]
pub fn extract_poi_facts(
    doc: &LayoutDocument,
    index: &LocationIndex,
    coords: &CoordinateTable,
) -> Vec<PoiFact> {
    let mut facts = Vec::new();
    for slot_category in SlotCategory::EXTRACTED {
        for (key, slot) in doc.slots() {
            if SlotCategory::from_slot_key(key) != slot_category {
                continue;
            }
            if let Some(fact) = slot_fact(key, slot, slot_category, index, coords) {
                facts.push(fact);
            }
        }
    }
    debug!("extracted {} POI facts from layout", facts.len());
    facts
}

fn slot_fact(
    key: &str,
    slot: &SlotValue,
    slot_category: SlotCategory,
    index: &LocationIndex,
    coords: &CoordinateTable,
) -> Option<PoiFact> {
    let SlotValue::Placed { location, value } = slot else {
        trace!("{LOG_LAYOUT_DROPPED}: {key} has no location/value pair");
        return None;
    };
    if is_empty_slot(location) || is_empty_slot(value) {
        trace!("{LOG_LAYOUT_DROPPED}: {key} is empty");
        return None;
    }
    if slot_category == SlotCategory::MinorBase && value.contains(SMALL_CAMP_MARKER) {
        trace!("{LOG_LAYOUT_DROPPED}: {key} is a small camp");
        return None;
    }
    let Some(poi_id) = index.resolve(slot_category, location) else {
        trace!("{LOG_LAYOUT_DROPPED}: {key} location {location:?} is not indexed");
        return None;
    };
    let Some((x, y)) = coords.position(poi_id) else {
        trace!("{LOG_LAYOUT_DROPPED}: {key} poi {poi_id} has no coordinates");
        return None;
    };
    if x == 0.0 && y == 0.0 {
        trace!("{LOG_LAYOUT_DROPPED}: {key} poi {poi_id} sits at the origin");
        return None;
    }
    let category = slot_category
        .forced_landmark()
        .unwrap_or_else(|| category_from_value(value));
    Some(PoiFact::new(poi_id, category, x, y))
}

fn anchor_poi(doc: &LayoutDocument, key: &str, index: &LocationIndex) -> Option<PoiId> {
    let location = match doc.slot(key)? {
        SlotValue::Text(text) => text.as_str(),
        SlotValue::Placed { location, .. } => location.as_str(),
        SlotValue::Other(_) => return None,
    };
    if is_empty_slot(location) {
        return None;
    }
    index.resolve(SlotCategory::from_slot_key(key), location)
}

/// POI id of the spawn point, if the layout names a resolvable one.
#[must_use]
pub fn spawn_poi(doc: &LayoutDocument, index: &LocationIndex) -> Option<PoiId> {
    anchor_poi(doc, SPAWN_POINT_KEY, index)
}

/// POI id of the closing circle for `night` (1 or 2).
#[must_use]
pub fn night_circle_poi(doc: &LayoutDocument, index: &LocationIndex, night: u8) -> Option<PoiId> {
    anchor_poi(doc, &format!("Night {night} Circle"), index)
}

/// Supplies POI facts for a layout identifier.
pub trait PoiSource {
    /// # Errors
    ///
    /// Implementations report unknown layouts or unreadable data.
    fn poi_facts(&self, layout_id: &str) -> Result<Vec<PoiFact>, LayoutError>;
}

/// In-memory layouts sharing one index and coordinate table.
#[derive(Debug, Clone, Default)]
pub struct StaticLayoutSource {
    layouts: BTreeMap<String, LayoutDocument>,
    index: LocationIndex,
    coordinates: CoordinateTable,
}

impl StaticLayoutSource {
    #[must_use]
    pub fn new(index: LocationIndex, coordinates: CoordinateTable) -> Self {
        Self {
            layouts: BTreeMap::new(),
            index,
            coordinates,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout_id: impl Into<String>, doc: LayoutDocument) -> Self {
        self.layouts.insert(layout_id.into(), doc);
        self
    }

    #[must_use]
    pub fn layout(&self, layout_id: &str) -> Option<&LayoutDocument> {
        self.layouts.get(layout_id)
    }

    #[must_use]
    pub const fn index(&self) -> &LocationIndex {
        &self.index
    }
}

impl PoiSource for StaticLayoutSource {
    fn poi_facts(&self, layout_id: &str) -> Result<Vec<PoiFact>, LayoutError> {
        let doc = self
            .layout(layout_id)
            .ok_or_else(|| LayoutError::UnknownLayout {
                layout_id: layout_id.to_string(),
            })?;
        Ok(extract_poi_facts(doc, &self.index, &self.coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LocationIndex {
        [
            (SlotCategory::MajorBase, "Minor Erdtree", 106),
            (SlotCategory::MajorBase, "Groveside", 94),
            (SlotCategory::MinorBase, "Minor Erdtree", 157),
            (SlotCategory::SpawnPoint, "Minor Erdtree", 206),
            (SlotCategory::MinorBase, "Lake", 30),
            (SlotCategory::Evergaol, "Stormhill", 76),
            (SlotCategory::NightCircle, "Gatefront", 180),
        ]
        .into_iter()
        .map(|(category, location, poi_id)| LocationEntry {
            category,
            location: location.to_string(),
            poi_id,
        })
        .collect()
    }

    fn coords() -> CoordinateTable {
        [
            (106, (410.0, 220.0)),
            (94, (300.0, 180.0)),
            (157, (398.0, 240.0)),
            (30, (0.0, 0.0)),
            (76, (150.0, 90.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn slot_keys_classify_by_prefix() {
        assert_eq!(
            SlotCategory::from_slot_key("Major Base - Groveside"),
            SlotCategory::MajorBase
        );
        assert_eq!(SlotCategory::from_slot_key("Spawn Point"), SlotCategory::SpawnPoint);
        assert_eq!(
            SlotCategory::from_slot_key("Night 2 Circle"),
            SlotCategory::NightCircle
        );
        assert_eq!(
            SlotCategory::from_slot_key("Scale-Bearing Merchant"),
            SlotCategory::ScaleBearingMerchant
        );
        assert_eq!(SlotCategory::from_slot_key("Nightlord"), SlotCategory::Other);
    }

    #[test]
    fn same_name_resolves_per_category() {
        let index = index();
        assert_eq!(index.resolve(SlotCategory::MajorBase, "Minor Erdtree"), Some(106));
        assert_eq!(index.resolve(SlotCategory::MinorBase, "Minor Erdtree"), Some(157));
        assert_eq!(index.resolve(SlotCategory::SpawnPoint, "Minor Erdtree"), Some(206));
        assert_eq!(index.resolve(SlotCategory::Evergaol, "Minor Erdtree"), None);
    }

    #[test]
    fn extraction_drops_unplaceable_slots() {
        let doc = LayoutDocument::default()
            .with_slot(
                "Minor Base - Minor Erdtree",
                SlotValue::placed("Minor Erdtree", "Church - Normal"),
            )
            .with_slot(
                "Major Base - Minor Erdtree",
                SlotValue::placed("Minor Erdtree", "Fort - Crystalians"),
            )
            .with_slot("Minor Base - Lake", SlotValue::placed("Lake", "Ruins - Bats"))
            .with_slot(
                "Minor Base - Unknown",
                SlotValue::placed("Nowhere", "Church - Normal"),
            )
            .with_slot(
                "Minor Base - Camp",
                SlotValue::placed("Minor Erdtree", "Small Camp - Dogs"),
            )
            .with_slot("Evergaol - Stormhill", SlotValue::placed("Stormhill", "Crucible Knight"))
            .with_slot("Field Boss - Lake", SlotValue::placed("empty", "empty"));

        let facts = extract_poi_facts(&doc, &index(), &coords());
        let summary: Vec<_> = facts.iter().map(|fact| (fact.id, fact.category)).collect();
        assert_eq!(
            summary,
            vec![
                (106, LandmarkCategory::Fort),
                (157, LandmarkCategory::Church),
                (76, LandmarkCategory::Evergaol),
            ]
        );
        assert_eq!(facts[2].estimated_runes, 12_000);
    }

    #[test]
    fn anchors_resolve_from_text_slots() {
        let doc = LayoutDocument::default()
            .with_slot("Spawn Point", SlotValue::Text("Minor Erdtree".into()))
            .with_slot("Night 1 Circle", SlotValue::Text("Gatefront".into()))
            .with_slot("Night 2 Circle", SlotValue::Text("empty".into()));
        let index = index();
        assert_eq!(spawn_poi(&doc, &index), Some(206));
        assert_eq!(night_circle_poi(&doc, &index, 1), Some(180));
        assert_eq!(night_circle_poi(&doc, &index, 2), None);
    }

    #[test]
    fn documents_parse_mixed_slot_values() {
        let doc = LayoutDocument::from_json(
            r#"{
                "Nightlord": "Gladius",
                "Special Event": "Special Event: empty",
                "Spawn Point": "Minor Erdtree",
                "Major Base - Minor Erdtree": { "location": "Minor Erdtree", "value": "Great Church - Fire Monk" },
                "Pattern": 12
            }"#,
        )
        .expect("valid layout");
        assert_eq!(doc.nightlord(), Some(Nightlord::Gladius));
        assert_eq!(doc.special_event(), None);
        assert!(matches!(doc.slot("Pattern"), Some(SlotValue::Other(_))));
        let facts = extract_poi_facts(&doc, &index(), &coords());
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].category, LandmarkCategory::GreatChurch);
    }

    #[test]
    fn extraction_keeps_document_order_within_a_category() {
        let json = r#"{
            "Minor Base - Minor Erdtree": { "location": "Minor Erdtree", "value": "Church - Normal" },
            "Major Base - Minor Erdtree": { "location": "Minor Erdtree", "value": "Fort - Crystalians" },
            "Major Base - Groveside": { "location": "Groveside", "value": "Fort - Crystalians" }
        }"#;
        let doc = LayoutDocument::from_json(json).expect("valid layout");
        let ids: Vec<_> = extract_poi_facts(&doc, &index(), &coords())
            .iter()
            .map(|fact| fact.id)
            .collect();
        assert_eq!(ids, vec![106, 94, 157]);

        let keys: Vec<_> = doc.slots().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                "Minor Base - Minor Erdtree",
                "Major Base - Minor Erdtree",
                "Major Base - Groveside"
            ]
        );
        let reparsed =
            LayoutDocument::from_json(&serde_json::to_string(&doc).expect("serialize"))
                .expect("reparse");
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn with_slot_replaces_existing_keys_in_place() {
        let doc = LayoutDocument::default()
            .with_slot("Spawn Point", SlotValue::Text("Lake".into()))
            .with_slot("Nightlord", SlotValue::Text("Caligo".into()))
            .with_slot("Spawn Point", SlotValue::Text("Minor Erdtree".into()));
        let keys: Vec<_> = doc.slots().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["Spawn Point", "Nightlord"]);
        assert_eq!(spawn_poi(&doc, &index()), Some(206));
    }

    #[test]
    fn tables_parse_from_json() {
        let index = LocationIndex::from_json(
            r#"[{ "category": "MajorBase", "location": "Groveside", "poi_id": 94 }]"#,
        )
        .expect("index");
        assert_eq!(index.resolve(SlotCategory::MajorBase, "Groveside"), Some(94));
        let coords =
            CoordinateTable::from_json(r#"[{ "id": 94, "coordinates": [512.5, 300.0], "name": "x" }]"#)
                .expect("coords");
        assert_eq!(coords.position(94), Some((512.5, 300.0)));
        assert!(matches!(
            CoordinateTable::from_json("{}"),
            Err(LayoutError::Json { what: "coordinate table", .. })
        ));
    }

    #[test]
    fn static_source_serves_known_layouts() {
        let doc = LayoutDocument::default().with_slot(
            "Major Base - Minor Erdtree",
            SlotValue::placed("Minor Erdtree", "Camp - Fire Demon"),
        );
        let source = StaticLayoutSource::new(index(), coords()).with_layout("7", doc);
        let facts = source.poi_facts("7").expect("known layout");
        assert_eq!(facts[0].category, LandmarkCategory::MainEncampment);
        assert!(matches!(
            source.poi_facts("8"),
            Err(LayoutError::UnknownLayout { .. })
        ));
    }
}

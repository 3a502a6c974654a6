use anyhow::{Context, Result, bail};
use nightreign_route::{
    CoordinateTable, LayoutDocument, LocationIndex, NightfarerClass, Nightlord, PoiFact,
    TeamMember, extract_poi_facts,
};
use std::fs;
use std::path::Path;

use crate::util::split_csv;

const MAX_TEAM_SIZE: usize = 3;

/// Layout plus the lookup tables needed to turn it into POI facts.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub pattern_id: String,
    pub layout: LayoutDocument,
    pub index: LocationIndex,
    pub coordinates: CoordinateTable,
}

impl PlanInputs {
    pub fn load(layout: &Path, locations: &Path, coordinates: &Path) -> Result<Self> {
        let pattern_id = layout
            .file_stem()
            .map_or_else(|| "layout".to_string(), |stem| stem.to_string_lossy().into_owned());
        let layout_doc = LayoutDocument::from_json(&read_file(layout)?)
            .with_context(|| format!("invalid layout {}", layout.display()))?;
        let index = LocationIndex::from_json(&read_file(locations)?)
            .with_context(|| format!("invalid location index {}", locations.display()))?;
        let coordinates = CoordinateTable::from_json(&read_file(coordinates)?)
            .with_context(|| format!("invalid coordinate table {}", coordinates.display()))?;
        log::debug!(
            "loaded layout {pattern_id} with {} indexed locations",
            index.len()
        );
        Ok(Self {
            pattern_id,
            layout: layout_doc,
            index,
            coordinates,
        })
    }

    pub fn facts(&self) -> Vec<PoiFact> {
        extract_poi_facts(&self.layout, &self.index, &self.coordinates)
    }

    /// Explicit choice wins; otherwise the layout's own Nightlord slot.
    pub fn nightlord(&self, explicit: Option<Nightlord>) -> Result<Nightlord> {
        explicit
            .or_else(|| self.layout.nightlord())
            .context("no --nightlord given and the layout does not name one")
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse `wylder:key,guardian,none` into team members.
///
/// Each entry is a class name (or `none`), optionally followed by `:key`
/// when that member starts the expedition holding a stonesword key.
pub fn parse_team(spec: &str) -> Result<Vec<TeamMember>> {
    let entries = split_csv(spec);
    if entries.len() > MAX_TEAM_SIZE {
        bail!(
            "team has {} members; at most {MAX_TEAM_SIZE} are supported",
            entries.len()
        );
    }
    entries
        .iter()
        .zip(1_u32..)
        .map(|(entry, id)| parse_member(entry, id))
        .collect()
}

fn parse_member(entry: &str, id: u32) -> Result<TeamMember> {
    let (class, flag) = entry
        .split_once(':')
        .map_or((entry, None), |(class, flag)| (class, Some(flag.trim())));
    let starts_with_key = match flag {
        None => false,
        Some(flag) if flag.eq_ignore_ascii_case("key") => true,
        Some(other) => bail!("unknown team member flag {other:?} in {entry:?}"),
    };
    let chosen_class = if class.trim().eq_ignore_ascii_case("none") {
        None
    } else {
        Some(
            class
                .parse::<NightfarerClass>()
                .with_context(|| format!("invalid team member {entry:?}"))?,
        )
    };
    Ok(TeamMember::new(id, chosen_class, starts_with_key))
}

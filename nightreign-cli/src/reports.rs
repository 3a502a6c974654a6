use anyhow::Result;
use colored::Colorize;
use nightreign_route::{
    DayRoute, ExpeditionResult, PoiId, RouteCalculation, RouteResult, StepResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Stepped selections collected from a debug session.
#[derive(Debug, Clone, Serialize)]
pub struct StepTrace {
    pub pattern_id: String,
    pub steps: Vec<StepResult>,
    pub route: Vec<PoiId>,
    pub elapsed_time: u32,
}

/// Whatever the selected planning mode produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PlanReport {
    Route(RouteResult),
    Expedition(ExpeditionResult),
    Step(StepTrace),
}

impl PlanReport {
    pub fn success(&self) -> bool {
        match self {
            Self::Route(result) => result.success,
            Self::Expedition(result) => result.success,
            Self::Step(trace) => trace.steps.iter().all(|step| step.success),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Route(result) => result.error.as_deref(),
            Self::Expedition(result) => result.error.as_deref(),
            Self::Step(trace) => trace.steps.iter().find_map(|step| step.error.as_deref()),
        }
    }
}

fn priority_of(priorities: &BTreeMap<PoiId, f64>, poi_id: PoiId) -> String {
    priorities
        .get(&poi_id)
        .map_or_else(|| "anchor".to_string(), |priority| format!("{priority:.1}"))
}

pub fn generate_json_report<W: Write>(writer: &mut W, report: &PlanReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_console_report<W: Write>(writer: &mut W, report: &PlanReport) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "🗺️  Route Plan".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============".cyan())?;

    if let Some(error) = report.error() {
        writeln!(writer, "{} {}", "❌ FAILED".red(), error.red())?;
        return Ok(());
    }

    match report {
        PlanReport::Route(result) => {
            if let Some(route) = &result.route {
                write_console_route(writer, route)?;
            }
            writeln!(
                writer,
                "Candidates scored: {}",
                result.debug_info.priority_calculations.len()
            )?;
            writeln!(writer, "Engine time: {:?}", result.debug_info.execution_time)?;
        }
        PlanReport::Expedition(result) => {
            if let Some(plan) = &result.plan {
                writeln!(writer, "Pattern: {}", plan.pattern_id.bold())?;
                write_console_day(writer, &plan.day_one)?;
                write_console_day(writer, &plan.day_two)?;
                writeln!(writer, "Total runes: {}", plan.total_runes.to_string().green())?;
                writeln!(writer, "Total time: {}s", plan.total_time)?;
                writeln!(
                    writer,
                    "Final level: {}",
                    result.debug_info.state_snapshot.player_level
                )?;
            }
        }
        PlanReport::Step(trace) => {
            writeln!(writer, "Pattern: {}", trace.pattern_id.bold())?;
            for (idx, step) in trace.steps.iter().enumerate() {
                match step.selected_poi {
                    Some(poi_id) => writeln!(writer, "  step {}: POI {}", idx + 1, poi_id)?,
                    None => writeln!(writer, "  step {}: {}", idx + 1, "exhausted".yellow())?,
                }
            }
            writeln!(writer, "Committed time: {}s", trace.elapsed_time)?;
        }
    }
    Ok(())
}

fn write_console_route<W: Write>(writer: &mut W, route: &RouteCalculation) -> Result<()> {
    writeln!(
        writer,
        "Pattern: {} ({})",
        route.pattern_id.bold(),
        route.nightlord
    )?;
    for (idx, poi_id) in route.route.iter().enumerate() {
        writeln!(
            writer,
            "  {}. POI {} (priority {})",
            idx + 1,
            poi_id.to_string().green(),
            priority_of(&route.priorities, *poi_id)
        )?;
    }
    writeln!(writer, "Estimated time: {}s", route.estimated_time)?;
    writeln!(writer, "Total distance: {:.1}", route.total_distance)?;
    if let Some(notes) = &route.notes {
        writeln!(writer, "Notes: {}", notes.dimmed())?;
    }
    Ok(())
}

fn write_console_day<W: Write>(writer: &mut W, day: &DayRoute) -> Result<()> {
    writeln!(writer, "{}", day.day.to_string().bright_yellow().bold())?;
    let stops: Vec<String> = day
        .route
        .iter()
        .map(|poi_id| format!("{poi_id} [{}]", priority_of(&day.priorities, *poi_id)))
        .collect();
    writeln!(writer, "  {}", stops.join(" → "))?;
    writeln!(
        writer,
        "  time {}s, distance {:.1}",
        day.total_time, day.total_distance
    )?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(writer: &mut W, report: &PlanReport) -> Result<()> {
    writeln!(writer, "# Nightreign Route Plan\n")?;
    if let Some(error) = report.error() {
        writeln!(writer, "❌ **Failed**: {error}")?;
        return Ok(());
    }

    match report {
        PlanReport::Route(result) => {
            if let Some(route) = &result.route {
                writeln!(writer, "## Summary\n")?;
                writeln!(writer, "- **Pattern**: {}", route.pattern_id)?;
                writeln!(writer, "- **Nightlord**: {}", route.nightlord)?;
                writeln!(writer, "- **Estimated time**: {}s", route.estimated_time)?;
                writeln!(writer, "- **Total distance**: {:.1}\n", route.total_distance)?;
                write_markdown_stops(writer, &route.route, &route.priorities)?;
            }
        }
        PlanReport::Expedition(result) => {
            if let Some(plan) = &result.plan {
                writeln!(writer, "## Summary\n")?;
                writeln!(writer, "- **Pattern**: {}", plan.pattern_id)?;
                writeln!(writer, "- **Total runes**: {}", plan.total_runes)?;
                writeln!(writer, "- **Total time**: {}s\n", plan.total_time)?;
                for day in [&plan.day_one, &plan.day_two] {
                    writeln!(writer, "## {}\n", day.day)?;
                    write_markdown_stops(writer, &day.route, &day.priorities)?;
                }
            }
        }
        PlanReport::Step(trace) => {
            writeln!(writer, "## Steps\n")?;
            for (idx, step) in trace.steps.iter().enumerate() {
                let selected = step
                    .selected_poi
                    .map_or_else(|| "_exhausted_".to_string(), |poi_id| poi_id.to_string());
                writeln!(writer, "{}. {selected}", idx + 1)?;
            }
            writeln!(writer, "\n- **Committed time**: {}s", trace.elapsed_time)?;
        }
    }
    Ok(())
}

fn write_markdown_stops<W: Write>(
    writer: &mut W,
    route: &[PoiId],
    priorities: &BTreeMap<PoiId, f64>,
) -> Result<()> {
    writeln!(writer, "| # | POI | Priority |")?;
    writeln!(writer, "|---|-----|----------|")?;
    for (idx, poi_id) in route.iter().enumerate() {
        writeln!(
            writer,
            "| {} | {poi_id} | {} |",
            idx + 1,
            priority_of(priorities, *poi_id)
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

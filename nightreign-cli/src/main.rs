mod inputs;
mod reports;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use nightreign_route::{
    Day, DistanceMetric, LayoutContext, Nightlord, PoiFact, RouteCalculator, RoutePolicy,
    RunState, plan_expedition,
};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use inputs::{PlanInputs, parse_team};
use reports::{PlanReport, StepTrace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanMode {
    /// Single route within the remaining time
    Route,
    /// Spawn to night 1 circle, then night 1 to night 2 circle
    Expedition,
    /// Step through the selection loop one POI at a time
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DistanceArg {
    /// Fixed 100-unit leg per selected POI
    Placeholder,
    /// Straight-line distance between consecutive POIs
    Euclidean,
}

impl From<DistanceArg> for DistanceMetric {
    fn from(value: DistanceArg) -> Self {
        match value {
            DistanceArg::Placeholder => Self::Placeholder,
            DistanceArg::Euclidean => Self::Euclidean,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "nightreign-planner", version = "0.1.0")]
#[command(about = "Plan time-bounded Nightreign routes from map layout data")]
struct Args {
    /// Layout JSON document
    #[arg(long)]
    layout: PathBuf,

    /// Location index JSON: [{category, location, poi_id}]
    #[arg(long)]
    locations: PathBuf,

    /// Coordinate table JSON: [{id, coordinates: [x, y]}]
    #[arg(long)]
    coordinates: PathBuf,

    /// Nightlord to target (defaults to the layout's Nightlord slot)
    #[arg(long)]
    nightlord: Option<Nightlord>,

    /// Day to plan in route and step modes (1 or 2)
    #[arg(long, default_value = "1")]
    day: Day,

    /// Team members, comma-separated: class[:key] or none
    #[arg(long, default_value = "")]
    team: String,

    /// Remaining seconds (defaults to a full day cycle)
    #[arg(long)]
    start_time: Option<u32>,

    /// Runes already gained before planning
    #[arg(long, default_value_t = 0)]
    runes: u64,

    /// Planning mode
    #[arg(long, value_enum, default_value_t = PlanMode::Route)]
    mode: PlanMode,

    /// Number of selection steps (step mode only)
    #[arg(long, default_value_t = 3)]
    steps: usize,

    /// How leg distances are accumulated
    #[arg(long, value_enum, default_value_t = DistanceArg::Placeholder)]
    distance: DistanceArg,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if should_announce(&args) {
        announce_banner();
    }

    let start_time = Instant::now();
    let inputs = PlanInputs::load(&args.layout, &args.locations, &args.coordinates)?;
    let report = run_plan(&args, &inputs)?;
    write_reports(&args, &report, start_time)?;

    if !report.success() {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn should_announce(args: &Args) -> bool {
    args.report == "console" || args.output.is_some()
}

fn announce_banner() {
    println!("{}", "🌙 Nightreign Route Planner".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn build_calculator(args: &Args, inputs: &PlanInputs) -> Result<RouteCalculator> {
    let policy = RoutePolicy::default().with_distance(args.distance.into());
    let team = parse_team(&args.team)?;
    let nightlord = inputs.nightlord(args.nightlord)?;
    let start_time = args.start_time.unwrap_or(policy.day_cycle_seconds);
    let state = RunState::new(team, nightlord, args.day, start_time);
    let mut calculator =
        RouteCalculator::with_policy(state, policy).context("invalid route policy")?;
    calculator.add_runes(args.runes);
    Ok(calculator)
}

fn run_plan(args: &Args, inputs: &PlanInputs) -> Result<PlanReport> {
    let mut calculator = build_calculator(args, inputs)?;
    let facts = inputs.facts();
    log::info!("{} candidate POIs in {}", facts.len(), inputs.pattern_id);

    let report = match args.mode {
        PlanMode::Route => {
            PlanReport::Route(calculator.calculate_route(&facts, &inputs.pattern_id))
        }
        PlanMode::Expedition => PlanReport::Expedition(plan_expedition(
            &mut calculator,
            &facts,
            &inputs.layout,
            &inputs.index,
            &inputs.pattern_id,
        )),
        PlanMode::Step => PlanReport::Step(run_steps(&mut calculator, facts, inputs, args.steps)),
    };
    Ok(report)
}

fn run_steps(
    calculator: &mut RouteCalculator,
    facts: Vec<PoiFact>,
    inputs: &PlanInputs,
    steps: usize,
) -> StepTrace {
    let context = LayoutContext::new(inputs.pattern_id.clone()).with_layout(inputs.layout.clone());
    calculator.enable_debug_mode(facts, context);

    let mut results = Vec::with_capacity(steps);
    for _ in 0..steps {
        let step = calculator.execute_next_step();
        let done = !step.success || step.selected_poi.is_none();
        results.push(step);
        if done {
            break;
        }
    }

    let (route, elapsed_time) = calculator
        .debug_session()
        .map_or_else(Default::default, |session| {
            (session.route().to_vec(), session.elapsed_time())
        });
    calculator.disable_debug_mode();
    StepTrace {
        pattern_id: inputs.pattern_id.clone(),
        steps: results,
        route,
        elapsed_time,
    }
}

fn write_reports(args: &Args, report: &PlanReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, report)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, report)?,
        _ => {
            reports::generate_console_report(&mut output_target, report)?;
            let duration = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

//! Possession Markov CLI Application
//!
//! Command-line front end for the possession-markov library. It adds:
//! - TOML configuration with command-line overrides
//! - Reference team lookup by name
//! - Parallel match loading and segmentation
//! - CSV/JSON report generation

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use possession_markov::{
    resolve_team_id, ChainAnalyzer, EventSource, MatchFeed, MatchTransitions, RegistryScope,
    SideFraming, StatsBombFeed, ZoneGranularity,
};
use rayon::prelude::*;
use std::path::PathBuf;

mod config;
mod report;

use config::AppConfig;
use report::{RunOutputs, RunSummary};

/// Possession Markov - Build possession chains from football event feeds
#[derive(Parser, Debug)]
#[command(name = "possession-markov-cli")]
#[command(about = "Estimate a possession Markov chain from match event files", long_about = None)]
#[command(version)]
struct Args {
    /// Match event file (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    events: Vec<PathBuf>,

    /// Directory of match event files (*.json)
    #[arg(long, value_name = "DIR")]
    events_dir: Option<PathBuf>,

    /// Reference team id
    #[arg(long, value_name = "ID")]
    team_id: Option<u64>,

    /// Reference team name (resolved from the events)
    #[arg(long, value_name = "NAME")]
    team: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Smoothing pseudo-count
    #[arg(long, value_name = "ALPHA")]
    alpha: Option<f64>,

    /// Link chains across stoppages instead of cutting them
    #[arg(long)]
    no_cut_on_stop: bool,

    /// Keep raw actions on live turnovers
    #[arg(long)]
    no_coerce: bool,

    /// Number of pitch zones (3 or 9)
    #[arg(long, value_name = "N")]
    zones: Option<u8>,

    /// Frame sides by possession instead of by reference team
    #[arg(long)]
    role_framing: bool,

    /// Append the scoreline situation to states
    #[arg(long)]
    situation: bool,

    /// End chains at shots
    #[arg(long)]
    shot_terminal: bool,

    /// Leave ball receipts out of the chains
    #[arg(long)]
    no_ball_receipts: bool,

    /// Index the matrix by the full state space
    #[arg(long)]
    full_registry: bool,

    /// Skip the dense matrix report
    #[arg(long)]
    no_matrix: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Possession Markov CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using chain library v{}", possession_markov::VERSION);

    let mut app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut app, &args)?;

    run(app)
}

/// Command-line flags win over configuration file values
fn apply_overrides(app: &mut AppConfig, args: &Args) -> Result<()> {
    app.input.files.extend(args.events.iter().cloned());
    if let Some(dir) = &args.events_dir {
        app.input.events_dir = Some(dir.clone());
    }
    // A team flag replaces every team setting from the file
    if let Some(id) = args.team_id {
        app.input.team_id = Some(id);
        app.input.team = None;
        app.chain.reference_team = Some(id);
    } else if let Some(name) = &args.team {
        app.input.team = Some(name.clone());
        app.input.team_id = None;
        app.chain.reference_team = None;
    }
    if let Some(dir) = &args.output {
        app.output.dir = dir.clone();
    }
    if let Some(alpha) = args.alpha {
        app.chain.smoothing_alpha = alpha;
    }
    if args.no_cut_on_stop {
        app.chain.cut_on_stop = false;
    }
    if args.no_coerce {
        app.chain.coerce_turnovers = false;
    }
    if let Some(zones) = args.zones {
        app.chain.zone_granularity = ZoneGranularity::try_from(zones).map_err(anyhow::Error::msg)?;
    }
    if args.role_framing {
        app.chain.side_framing = SideFraming::Role;
    }
    if args.situation {
        app.chain.include_situation = true;
    }
    if args.shot_terminal {
        app.chain.treat_shot_as_terminal = true;
    }
    if args.no_ball_receipts {
        app.chain.include_ball_receipts = false;
    }
    if args.full_registry {
        app.model.registry = RegistryScope::Full;
    }
    if args.no_matrix {
        app.output.matrix = false;
    }
    Ok(())
}

/// Load, segment, estimate and report
fn run(mut app: AppConfig) -> Result<()> {
    let files = app.input.collect_files()?;
    log::info!("Loading {} match files", files.len());

    let feed = StatsBombFeed::new();
    let loaded: Vec<(PathBuf, possession_markov::Result<MatchFeed>)> = files
        .par_iter()
        .map(|path| (path.clone(), feed.load_match(path)))
        .collect();

    let mut matches = Vec::with_capacity(loaded.len());
    let mut failed = 0usize;
    for (path, result) in loaded {
        match result {
            Ok(m) => matches.push(m),
            Err(e) => {
                log::warn!("Skipping {:?}: {}", path, e);
                failed += 1;
            }
        }
    }
    if matches.is_empty() {
        bail!("None of the {} event files could be loaded", files.len());
    }
    let matches_loaded = matches.len();

    // Reference team: explicit id wins, otherwise resolve the name
    if app.chain.reference_team.is_none() {
        app.chain.reference_team = match (app.input.team_id, &app.input.team) {
            (Some(id), _) => Some(id),
            (None, Some(name)) => {
                let id = resolve_team_id(&matches, name)?;
                log::info!("Resolved team '{}' to id {}", name, id);
                Some(id)
            }
            (None, None) => None,
        };
    }
    if let Some(team) = app.chain.reference_team {
        matches.retain(|m| m.involves(team));
        log::info!("{} of {} matches involve team {}", matches.len(), matches_loaded, team);
        if matches.is_empty() {
            bail!("Team {} does not appear in any loaded match", team);
        }
    }

    let analyzer = ChainAnalyzer::new(app.chain.clone()).context("Invalid chain configuration")?;

    let per_match: Vec<MatchTransitions> = matches
        .par_iter()
        .map(|m| analyzer.analyze_match(m))
        .collect();
    let total = analyzer.aggregate(&per_match);

    let model = analyzer.estimate(&total.transitions, app.model.registry);
    let blocks = model.blocks();

    let summary = RunSummary {
        generated_at: Utc::now(),
        library_version: possession_markov::VERSION,
        config: app.chain.clone(),
        registry: app.model.registry,
        matches_loaded,
        matches_used: per_match.len(),
        matches_failed: failed,
        segmentation: total.stats.clone(),
        distinct_transitions: total.transitions.len(),
        total_transitions: total.transitions.total(),
        states: model.len(),
        attack_ids: blocks.attack,
        defense_ids: blocks.defense,
        log_likelihood: model.log_likelihood(),
        perplexity: model.perplexity(),
        flips_by_cause: total
            .flips
            .by_cause()
            .into_iter()
            .map(|(cause, count)| (cause.label().to_string(), count))
            .collect(),
    };

    report::write_reports(
        &app.output.dir,
        &RunOutputs {
            counts: &total.transitions,
            flips: &total.flips,
            model: &model,
            summary: &summary,
            write_matrix: app.output.matrix,
        },
    )?;

    log::info!(
        "{} matches, {} transitions, {} states, perplexity {}",
        summary.matches_used,
        summary.total_transitions,
        summary.states,
        summary
            .perplexity
            .map(|p| format!("{:.4}", p))
            .unwrap_or_else(|| "n/a".to_string())
    );

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

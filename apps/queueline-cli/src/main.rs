//! queueline: resolve free-text player names against the roster and rehearse
//! queue reconciliation runs.

mod config;
mod provider;
mod snapshot;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use queueline_core::{CancelToken, PlayerRecord, Position, Roster, RosterProvider};
use queueline_mock_surface::{MockRow, MockSurface};
use queueline_recon::{ReconEngine, RunSummary};
use queueline_resolve::{resolve_list, MatchOptions, ResolveListResult};

use crate::config::CliConfig;
use crate::provider::HttpRosterProvider;

#[derive(Parser)]
#[command(
    name = "queueline",
    version,
    about = "Resolve player names and reconcile a watch queue"
)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Roster cache operations.
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
    /// Resolve a list of names and print ranked matches.
    Resolve(ResolveArgs),
    /// Compare a list of names against a captured queue.
    Validate(ValidateArgs),
    /// Rehearse an add or clear run against a surface snapshot.
    Plan(PlanArgs),
}

#[derive(Subcommand)]
enum RosterAction {
    /// Show roster counts, fetching or reusing the cache as needed.
    Info,
    /// Force a fresh fetch, bypassing the cache.
    Refresh,
}

#[derive(Args)]
struct MatchArgs {
    /// Include inactive, injured-reserve, and practice-squad players.
    #[arg(long)]
    include_inactive: bool,
    /// Sort active players ahead of others regardless of confidence.
    #[arg(long)]
    prefer_active: bool,
    /// Comma-separated position filter, e.g. QB,RB,WR.
    #[arg(long)]
    positions: Option<String>,
    /// Bypass the roster cache.
    #[arg(long)]
    force_refresh: bool,
}

#[derive(Args)]
struct ResolveArgs {
    /// File with one name per line; "-" reads stdin.
    #[arg(long, default_value = "-")]
    input: String,
    #[command(flatten)]
    matching: MatchArgs,
}

#[derive(Args)]
struct ValidateArgs {
    /// File with one desired name per line; "-" reads stdin.
    #[arg(long, default_value = "-")]
    input: String,
    /// File with one captured queue row text per line.
    #[arg(long)]
    queue: PathBuf,
    #[command(flatten)]
    matching: MatchArgs,
}

#[derive(Args)]
struct PlanArgs {
    /// File with one desired name per line; "-" reads stdin.
    #[arg(long, default_value = "-")]
    input: String,
    /// JSON surface snapshot (pool/queued row texts).
    #[arg(long)]
    snapshot: PathBuf,
    /// Rehearse clearing the queue instead of adding.
    #[arg(long)]
    clear: bool,
    #[command(flatten)]
    matching: MatchArgs,
}

fn read_lines(input: &str) -> Result<Vec<String>> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading names from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };
    Ok(content.lines().map(|l| l.to_string()).collect())
}

fn match_options(args: &MatchArgs) -> Result<MatchOptions> {
    let mut options = MatchOptions::new();
    if args.include_inactive {
        options = options.include_inactive();
    }
    if args.prefer_active {
        options = options.prefer_active_in_ordering();
    }
    if let Some(spec) = &args.positions {
        let mut positions = Vec::new();
        for part in spec.split(',') {
            let position = Position::from_slug(part);
            if position == Position::Unknown {
                bail!("unknown position {:?} in --positions", part.trim());
            }
            positions.push(position);
        }
        options = options.require_position_in(positions);
    }
    Ok(options)
}

async fn load_roster(cfg: &CliConfig, force_refresh: bool) -> Result<Roster> {
    let provider = HttpRosterProvider::new(&cfg.roster);
    let roster = provider
        .all_players(force_refresh)
        .await
        .context("loading roster")?;
    Ok(roster)
}

fn candidate_line(candidate: &queueline_resolve::MatchCandidate) -> String {
    let player = &candidate.player;
    format!(
        "{} ({}, {}) confidence {:.2}",
        player.full_name().unwrap_or_else(|| player.id.clone()),
        player.position.as_str(),
        player.team.as_deref().unwrap_or("FA"),
        candidate.confidence
    )
}

fn print_resolution(result: &ResolveListResult) {
    for candidate in &result.matched {
        println!("matched    {:<24} -> {}", candidate.query, candidate_line(candidate));
    }
    for line in &result.ambiguous {
        println!(
            "ambiguous  {:<24} -> {}",
            line.query,
            candidate_line(&line.best)
        );
        for alt in &line.alternatives {
            println!("            {:<24}    or {}", "", candidate_line(alt));
        }
    }
    for query in &result.unmatched {
        println!("unmatched  {}", query);
    }
    for err in &result.errors {
        println!("error      {:<24} -> {}", err.query, err.message);
    }
    println!(
        "{} matched, {} ambiguous, {} unmatched, {} errors",
        result.matched.len(),
        result.ambiguous.len(),
        result.unmatched.len(),
        result.errors.len()
    );
}

fn print_summary(summary: &RunSummary) {
    for item in &summary.items {
        let detail = match &item.outcome {
            queueline_recon::ReconciliationOutcome::Error(detail) => format!(" ({})", detail),
            _ => String::new(),
        };
        println!("{:<16} {}{}", item.outcome.as_str(), item.label, detail);
    }
    println!("{} of {} succeeded", summary.succeeded(), summary.len());
}

/// Resolve the desired lines down to concrete add targets, reporting
/// anything the caller must disambiguate first.
fn targets_from_resolution(result: &ResolveListResult) -> Vec<PlayerRecord> {
    for line in &result.ambiguous {
        tracing::warn!(query = %line.query, "ambiguous, skipped; re-run resolve to review");
    }
    for query in &result.unmatched {
        tracing::warn!(query = %query, "no roster match, skipped");
    }
    result.matched.iter().map(|c| c.player.clone()).collect()
}

async fn run_resolve(cfg: &CliConfig, args: &ResolveArgs) -> Result<()> {
    let lines = read_lines(&args.input)?;
    let options = match_options(&args.matching)?;
    let roster = load_roster(cfg, args.matching.force_refresh).await?;
    let result = resolve_list(&lines, &roster, &options, &CancelToken::new());
    print_resolution(&result);
    Ok(())
}

async fn run_validate(cfg: &CliConfig, args: &ValidateArgs) -> Result<()> {
    let lines = read_lines(&args.input)?;
    let options = match_options(&args.matching)?;
    let roster = load_roster(cfg, args.matching.force_refresh).await?;
    let queue_rows: Vec<MockRow> = std::fs::read_to_string(&args.queue)
        .with_context(|| format!("reading queue capture {}", args.queue.display()))?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, text)| MockRow::new(format!("queued-{}", i), text.to_string()))
        .collect();
    let surface = Arc::new(MockSurface::new().with_queued(queue_rows));
    let engine = ReconEngine::new(surface, cfg.recon.to_recon_config());
    let report = engine
        .validate_against_queue(&lines, &roster, &options, &CancelToken::new())
        .await
        .context("scanning captured queue")?;
    for line in &report.in_queue {
        println!("in queue       {}", line);
    }
    for line in &report.not_in_queue {
        println!("not in queue   {}", line);
    }
    for line in &report.invalid {
        println!("invalid        {}", line);
    }
    Ok(())
}

async fn run_plan(cfg: &CliConfig, args: &PlanArgs) -> Result<()> {
    let snapshot = snapshot::load_snapshot(&args.snapshot)?;
    let surface = Arc::new(snapshot::surface_from_snapshot(&snapshot));
    let engine = ReconEngine::new(surface.clone(), cfg.recon.to_recon_config());
    let cancel = CancelToken::new();
    if args.clear {
        let summary = engine.clear_queue(&cancel).await;
        print_summary(&summary);
        return Ok(());
    }
    let lines = read_lines(&args.input)?;
    let options = match_options(&args.matching)?;
    let roster = load_roster(cfg, args.matching.force_refresh).await?;
    let result = resolve_list(&lines, &roster, &options, &cancel);
    let targets = targets_from_resolution(&result);
    if targets.is_empty() {
        bail!("no input line resolved to a roster player");
    }
    let summary = engine.add_players(&targets, &cancel).await;
    print_summary(&summary);
    println!(
        "queue after rehearsal: {} entries",
        surface.queued_keys().await.len()
    );
    Ok(())
}

async fn run_roster(cfg: &CliConfig, action: &RosterAction) -> Result<()> {
    let force = matches!(action, RosterAction::Refresh);
    let roster = load_roster(cfg, force).await?;
    let active = roster.values().filter(|p| p.status.is_active()).count();
    let named = roster.values().filter(|p| p.full_name().is_some()).count();
    println!(
        "{} players ({} active, {} with full names), cache at {}",
        roster.len(),
        active,
        named,
        cfg.roster.cache_path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Roster { action } => run_roster(&cfg, action).await,
        Command::Resolve(args) => run_resolve(&cfg, args).await,
        Command::Validate(args) => run_validate(&cfg, args).await,
        Command::Plan(args) => run_plan(&cfg, args).await,
    }
}

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use payout_core::money::parse_amount;
use payout_core::{
    BrokerageTransaction, MemberStatement, PayoutCalculator, StatementPeriod, TeamMember,
};
use payout_data::{PayoutSettings, TransactionLoader, init_logging};
use tracing::{debug, info, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Brokerage payout calculator.
///
/// Splits gross brokerage across the partner hierarchy using a TOML sharing
/// configuration and transaction CSV files.
#[derive(Debug, Parser)]
#[command(name = "payout-calc", version, about, long_about = None)]
struct Cli {
    /// Log level or filter directive (e.g. `debug`, `warn,payout_core=trace`).
    /// Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Attach payout breakdowns to every mapped transaction.
    Breakdown {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep breakdowns already present in the input instead of
        /// recomputing them.
        #[arg(long, default_value_t = false)]
        backfill: bool,
    },

    /// Monthly statement for one team member.
    Statement {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        input: PathBuf,

        /// Team member id from the settings file.
        #[arg(short, long)]
        member: String,

        /// Statement month, `YYYY-MM`.
        #[arg(long)]
        month: StatementPeriod,
    },

    /// Show how a gross amount would be split, including level 0.
    Simulate {
        #[arg(short, long)]
        config: PathBuf,

        /// Gross brokerage; registrar formatting such as `₹1,23,456.78` is accepted.
        #[arg(short, long)]
        gross: String,

        /// Apply this member's level override.
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Check the sharing configuration and every override.
    ValidateConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn load_settings(path: &Path) -> Result<PayoutSettings> {
    PayoutSettings::load(path)
        .with_context(|| format!("Failed to load settings: {}", path.display()))
}

fn load_transactions(path: &Path) -> Result<Vec<BrokerageTransaction>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let transactions = TransactionLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
    info!(path = %path.display(), count = transactions.len(), "Loaded transactions");
    Ok(transactions)
}

fn find_member<'a>(
    settings: &'a PayoutSettings,
    id: &str,
) -> Result<&'a TeamMember> {
    settings
        .member(id)
        .with_context(|| format!("No team member '{id}' in settings"))
}

// ─── commands ────────────────────────────────────────────────────────────────

fn run_breakdown(
    config: &Path,
    input: &Path,
    output: Option<&Path>,
    backfill: bool,
) -> Result<()> {
    let settings = load_settings(config)?;
    let calculator = PayoutCalculator::new(settings.sharing);
    let transactions = load_transactions(input)?;

    let processed = if backfill {
        calculator.backfill_breakdowns(&transactions)
    } else {
        calculator.compute_for_batch(&transactions)
    }
    .context("Failed to compute breakdowns")?;

    let unmapped = processed.iter().filter(|tx| !tx.is_mapped()).count();
    if unmapped > 0 {
        warn!(unmapped, "Unmapped transactions left without a breakdown");
    }

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            TransactionLoader::write(BufWriter::new(file), &processed)
                .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
            info!(path = %path.display(), count = processed.len(), "Wrote breakdowns");
        }
        None => TransactionLoader::write(io::stdout().lock(), &processed)
            .context("Failed to write CSV to stdout")?,
    }
    Ok(())
}

fn run_statement(
    config: &Path,
    input: &Path,
    member_id: &str,
    period: StatementPeriod,
) -> Result<()> {
    let settings = load_settings(config)?;
    let member = find_member(&settings, member_id)?;
    let calculator = PayoutCalculator::new(settings.sharing.clone());
    let transactions = load_transactions(input)?;

    let statement = MemberStatement::build(&calculator, member, &transactions, period)
        .context("Failed to build statement")?;

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} ({}) - {} - {}",
        statement.member_name,
        statement.member_id,
        settings.sharing.level_names.label(statement.level),
        statement.period
    )?;
    for line in &statement.lines {
        writeln!(
            out,
            "  {}  {:<12} {:>14} {:>14}  {:?}",
            line.trade_date, line.transaction_id, line.gross, line.share, line.source
        )?;
    }
    writeln!(out, "Total: {}", statement.total_share)?;
    writeln!(
        out,
        "Lines: {} stored, {} estimated, {} unmapped skipped",
        statement.stored_lines(),
        statement.estimated_lines(),
        statement.skipped_unmapped
    )?;
    Ok(())
}

fn run_simulate(
    config: &Path,
    gross: &str,
    member_id: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config)?;
    let gross = parse_amount(gross).with_context(|| format!("Invalid gross amount: {gross}"))?;
    let member = member_id
        .map(|id| find_member(&settings, id))
        .transpose()?;
    let calculator = PayoutCalculator::new(settings.sharing.clone());

    let simulation = calculator
        .simulate(gross, member)
        .context("Failed to simulate payout")?;
    let breakdown = &simulation.breakdown;

    let mut out = io::stdout().lock();
    writeln!(out, "Gross:   {}", breakdown.gross)?;
    writeln!(out, "Expense: {}", breakdown.expense_amount)?;
    writeln!(out, "Net:     {}", breakdown.net_pool)?;
    writeln!(out)?;
    for row in &simulation.rows {
        let payout = row
            .payout
            .map_or_else(|| "(not paid)".to_string(), |amount| amount.to_string());
        writeln!(
            out,
            "  L{} {:<22} {:>6}% {:>14} {:>14}",
            row.level.index(),
            row.label,
            row.pct,
            row.what_if_amount,
            payout
        )?;
    }
    if !simulation.unassigned_pct.is_zero() {
        writeln!(out)?;
        writeln!(
            out,
            "Warning: level percentages leave {}% unassigned",
            simulation.unassigned_pct
        )?;
    }
    Ok(())
}

fn run_validate(config: &Path) -> Result<()> {
    let settings = load_settings(config)?;
    if let Err(error) = settings.validate() {
        bail!("{}: {error}", config.display());
    }
    println!(
        "{}: OK ({} team members)",
        config.display(),
        settings.members.len()
    );
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;
    debug!(command = ?cli.command, "Starting");

    match cli.command {
        Command::Breakdown {
            config,
            input,
            output,
            backfill,
        } => run_breakdown(&config, &input, output.as_deref(), backfill),
        Command::Statement {
            config,
            input,
            member,
            month,
        } => run_statement(&config, &input, &member, month),
        Command::Simulate {
            config,
            gross,
            member,
        } => run_simulate(&config, &gross, member.as_deref()),
        Command::ValidateConfig { config } => run_validate(&config),
    }
}

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finance_tracker::{AppConfig, Overrides, Tracker};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "finance-tracker", version, about = "Personal income/expense ledger")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the spreadsheet file holding the ledger.
    #[arg(long, env = "FINANCE_TRACKER_DATA_FILE")]
    data_file: Option<PathBuf>,
    /// Override the currency symbol used for display.
    #[arg(long)]
    currency: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print every transaction
    List,
    /// Record a transaction dated now; negative amounts are expenses
    Add {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Delete a transaction by id
    Delete { id: u64 },
    /// Total income, total expense and net balance
    Summary,
    /// Current balance
    Balance,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(
        cli.config.as_deref(),
        Overrides {
            data_file: cli.data_file,
            currency_symbol: cli.currency,
            log_level: cli.log_level,
        },
    )
    .context("Failed to load configuration")?;

    let command = cli.command.unwrap_or(Command::Tui);
    init_logging(&config, matches!(command, Command::Tui))?;

    let mut tracker = Tracker::open(&config)
        .with_context(|| format!("Failed to load {}", config.data_file.display()))?;

    match command {
        Command::Tui => run_ui_mode(tracker)?,
        Command::List => print_list(&tracker),
        Command::Add { description, amount } => {
            let tx = tracker.add(&description, &amount)?;
            println!("✓ Added #{} {} {}", tx.id, tx.description, tracker.money(tx.amount));
            println!("✓ {}", tracker.save()?);
            println!("{}", tracker.balance_text());
        }
        Command::Delete { id } => {
            let tx = tracker.delete_selected(Some(id))?;
            println!("✓ Deleted #{} {}", tx.id, tx.description);
            println!("✓ {}", tracker.save()?);
            println!("{}", tracker.balance_text());
        }
        Command::Summary => {
            for line in tracker.summary_report().lines() {
                println!("{line}");
            }
        }
        Command::Balance => println!("{}", tracker.balance_text()),
    }

    Ok(())
}

fn init_logging(config: &AppConfig, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("finance_tracker={}", config.log_level)));

    // The TUI owns the terminal, so it only logs to a file
    match (&config.log_file, tui) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, false) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        (None, true) => {}
    }
    Ok(())
}

fn print_list(tracker: &Tracker) {
    let ledger = tracker.ledger();
    if ledger.is_empty() {
        println!("No transactions yet.");
        return;
    }

    println!("{:>5}  {:<32} {:>14}  {}", "Id", "Description", "Amount", "Date");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for tx in ledger.transactions() {
        println!(
            "{:>5}  {:<32} {:>14}  {}",
            tx.id,
            tx.description,
            tracker.money(tx.amount),
            tx.date.format("%d.%m.%Y")
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", tracker.balance_text());
}

#[cfg(feature = "tui")]
fn run_ui_mode(tracker: Tracker) -> Result<()> {
    let mut app = ui::App::new(tracker);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_tracker: Tracker) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a command: finance-tracker list | add | delete | summary | balance");
    std::process::exit(1);
}

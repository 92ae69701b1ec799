//! Digit Trading Bot
//!
//! CLI for running backtests over recorded observations and inspecting the
//! live trade ledger.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use deriv_bot::{
    backtest::{run_backtest, BacktestParams, EntryRule},
    config::AppConfig,
    storage::TradeStore,
    strategy::{DigitOverRule, FallRule, RiseRule},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deriv-bot")]
#[command(about = "Digit trading bot: backtests, stake policies and session statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over a recorded observation file
    Backtest {
        /// JSON file holding an array of observed values
        data: String,
        /// Entry rule: digit-over, rise or fall
        #[arg(long, default_value = "digit-over")]
        rule: String,
    },
    /// Show per-interval statistics for a date
    Stats {
        /// Date (YYYY-MM-DD); defaults to the current ledger date
        date: Option<String>,
    },
    /// Show one two-hour interval across the last recorded days
    Compare {
        /// Hour of day (0-23)
        hour: u32,
    },
    /// Show recent sequence windows
    Windows {
        /// Number of windows to list
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Backtest { data, rule } => run_backtest_file(config, &data, &rule),
        Commands::Stats { date } => show_stats(config, date).await,
        Commands::Compare { hour } => show_comparison(config, hour).await,
        Commands::Windows { limit } => show_windows(config, limit).await,
    }
}

fn run_backtest_file(config: AppConfig, path: &str, rule_name: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let observations: Vec<f64> = serde_json::from_str(&raw)?;
    tracing::info!(observations = observations.len(), path, "loaded observation file");

    let rule: Box<dyn EntryRule> = match rule_name {
        "rise" => Box::new(RiseRule),
        "fall" => Box::new(FallRule),
        _ => Box::new(DigitOverRule::new(
            config.backtest.entry_digit.unwrap_or(3),
            config.backtest.compare_digit,
        )),
    };

    let params = BacktestParams {
        scan: config.backtest.clone(),
        stake: config.stake.clone(),
    };
    let report = run_backtest(rule.as_ref(), &observations, &params)?;

    println!("\n📊 Backtest: {}\n", rule.name());
    println!(
        "{:>5} {:>8} {:>8} {:>8} {:>9} {:>8} {:>8}",
        "ticks", "trades", "wins", "losses", "win rate", "max W", "max L"
    );
    println!("{}", "-".repeat(60));
    for horizon in &report.horizons {
        let a = &horizon.analysis;
        println!(
            "{:>5} {:>8} {:>8} {:>8} {:>8.1}% {:>8} {:>8}",
            a.ticks,
            a.total_trades,
            a.wins,
            a.losses,
            a.win_rate,
            a.max_consecutive_wins,
            a.max_consecutive_losses
        );
    }

    if let Some(equity) = &report.equity {
        println!("\n💰 Equity ({} policy, {} tick horizon)", config.stake.kind, params.scan.target_horizon);
        println!("  Initial balance: {:.2}", equity.initial_balance);
        println!("  Final balance:   {:.2}", equity.final_balance);
        println!("  Total volume:    {:.2}", equity.total_volume);
        println!("  Max drawdown:    {:.2}%", equity.max_drawdown_pct);
        println!(
            "  Max stake:       {:.2} (trade #{})",
            equity.max_stake_used.stake, equity.max_stake_used.trade_number
        );
        if let Some(reason) = equity.stopped {
            println!("  Stopped early:   {reason}");
        }
    }

    if let Some(digits) = &report.digit_stats {
        println!(
            "\n🔢 Digit {}: {} trades, {:.1}% win rate, {} sequences captured",
            digits.digit,
            digits.trades,
            digits.win_rate,
            digits.history.len()
        );
    }

    Ok(())
}

async fn show_stats(config: AppConfig, date: Option<String>) -> anyhow::Result<()> {
    let store = TradeStore::open(&config.database).await?;
    let date = date.unwrap_or_else(|| ledger_date(config.database.utc_offset_hours));

    let stats = store.hourly_stats(&date).await?;
    if stats.is_empty() {
        println!("No trades recorded on {date}");
        return Ok(());
    }

    println!("\n📅 {date}\n");
    println!(
        "{:>5} {:>8} {:>6} {:>9} {:>10} {:>6} {:>6}",
        "hour", "trades", "wins", "win rate", "profit", "max W", "max L"
    );
    println!("{}", "-".repeat(56));
    for interval in &stats {
        println!(
            "{:>2}-{:<2} {:>8} {:>6} {:>8.1}% {:>10.2} {:>6} {:>6}",
            interval.hour,
            interval.hour + 2,
            interval.total_trades,
            interval.wins,
            interval.win_rate,
            interval.total_profit,
            interval.max_consecutive_wins,
            interval.max_consecutive_losses
        );
    }
    Ok(())
}

async fn show_comparison(config: AppConfig, hour: u32) -> anyhow::Result<()> {
    let store = TradeStore::open(&config.database).await?;
    let stats = store.comparison_stats(hour).await?;
    if stats.is_empty() {
        println!("No recorded days for that interval");
        return Ok(());
    }

    println!("\n🕑 Interval {}-{} across recent days\n", hour / 2 * 2, hour / 2 * 2 + 2);
    for interval in &stats {
        println!(
            "  {}  {:>4} trades  {:>5.1}%  profit {:>8.2}",
            interval.date, interval.total_trades, interval.win_rate, interval.total_profit
        );
    }
    Ok(())
}

async fn show_windows(config: AppConfig, limit: i64) -> anyhow::Result<()> {
    let store = TradeStore::open(&config.database).await?;
    let windows = store.recent_windows(limit).await?;
    if windows.is_empty() {
        println!("No sequence windows recorded yet");
        return Ok(());
    }

    println!("\n🪟 Recent sequence windows\n");
    for window in &windows {
        let id = window.id.unwrap_or_default();
        let state = if window.is_completed { "done" } else { "open" };
        let reference = window
            .reference_win_rate
            .map(|r| format!(" ref {r:.1}%"))
            .unwrap_or_default();
        println!(
            "  #{id:<4} {:<7} {state}  {:>2} trades  {:>5.1}%{reference}",
            window.kind.to_string(),
            window.trades_count,
            window.win_rate
        );
    }
    Ok(())
}

/// Date string in the ledger's local timezone.
fn ledger_date(utc_offset_hours: i32) -> String {
    let local = Utc::now() + Duration::hours(i64::from(utc_offset_hours));
    local.format("%Y-%m-%d").to_string()
}

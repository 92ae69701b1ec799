//! Trade ledger persistence
//!
//! SQLite-backed store for executed trades, per-interval statistics and
//! sequence windows. Dates and hour buckets use the configured UTC offset,
//! and hours are grouped into two-hour intervals so comparisons across days
//! line up. Hourly statistics are recomputed from the trade rows on every
//! insert rather than maintained incrementally.


use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::monitor::{SequenceWindow, WindowKind};
use crate::types::TradeResult;
use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

/// Aggregated outcomes for one date + two-hour interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyStats {
    pub date: String,
    pub hour: i64,
    pub total_trades: i64,
    pub wins: i64,
    /// Percentage, two decimals
    pub win_rate: f64,
    pub total_profit: f64,
    pub max_consecutive_wins: i64,
    pub max_consecutive_losses: i64,
    pub current_consecutive_wins: i64,
    pub current_consecutive_losses: i64,
}

/// SQLite store for trades, hourly statistics and sequence windows.
pub struct TradeStore {
    pool: SqlitePool,
    utc_offset_hours: i32,
}

impl TradeStore {
    /// Connect and create the schema if needed.
    ///
    /// A single connection is enough for the bot's write rate and keeps
    /// in-memory databases usable in tests.
    pub async fn connect(url: &str, utc_offset_hours: i32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        let store = Self {
            pool,
            utc_offset_hours,
        };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let url = format!("sqlite://{}?mode=rwc", config.path);
        Self::connect(&url, config.utc_offset_hours).await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                date TEXT NOT NULL,
                hour INTEGER NOT NULL,
                is_win BOOLEAN NOT NULL,
                stake REAL NOT NULL,
                profit REAL NOT NULL,
                balance_after REAL NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hourly_stats (
                date TEXT NOT NULL,
                hour INTEGER NOT NULL,
                total_trades INTEGER DEFAULT 0,
                wins INTEGER DEFAULT 0,
                win_rate REAL DEFAULT 0,
                total_profit REAL DEFAULT 0,
                max_consecutive_wins INTEGER DEFAULT 0,
                max_consecutive_losses INTEGER DEFAULT 0,
                current_consecutive_wins INTEGER DEFAULT 0,
                current_consecutive_losses INTEGER DEFAULT 0,
                PRIMARY KEY (date, hour)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sequence_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_timestamp INTEGER NOT NULL,
                end_timestamp INTEGER NOT NULL,
                date TEXT NOT NULL,
                sequence_type TEXT NOT NULL,
                trades_count INTEGER DEFAULT 0,
                wins INTEGER DEFAULT 0,
                win_rate REAL DEFAULT 0,
                is_completed BOOLEAN DEFAULT 0,
                reference_win_rate REAL,
                completed_win_rate REAL
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("trade ledger schema ready");
        Ok(())
    }

    fn local_now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::hours(i64::from(self.utc_offset_hours))
    }

    /// Two-hour interval a local hour falls into (14 -> 14, 15 -> 14).
    fn bucket(hour: u32) -> i64 {
        i64::from(hour / 2 * 2)
    }

    /// Persist one executed trade and refresh its interval's statistics.
    pub async fn record_trade(&self, trade: &TradeResult) -> Result<()> {
        let local = self.local_now();
        let date = local.format("%Y-%m-%d").to_string();
        let hour = Self::bucket(local.hour());

        sqlx::query(
            "INSERT INTO trades (timestamp, date, hour, is_win, stake, profit, balance_after)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Utc::now().timestamp_millis())
        .bind(&date)
        .bind(hour)
        .bind(trade.success)
        .bind(trade.stake.to_f64().unwrap_or_default())
        .bind(trade.profit.to_f64().unwrap_or_default())
        .bind(trade.balance_after.to_f64().unwrap_or_default())
        .execute(&self.pool)
        .await?;

        self.refresh_hourly_stats(&date, hour).await
    }

    /// Recompute one interval's statistics from its trade rows.
    async fn refresh_hourly_stats(&self, date: &str, hour: i64) -> Result<()> {
        let rows: Vec<(bool, f64)> = sqlx::query_as(
            "SELECT is_win, profit FROM trades
             WHERE date = ? AND hour = ?
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(date)
        .bind(hour)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = HourlyStats {
            date: date.to_string(),
            hour,
            total_trades: rows.len() as i64,
            ..HourlyStats::default()
        };
        for (is_win, profit) in &rows {
            stats.total_profit += profit;
            if *is_win {
                stats.wins += 1;
                stats.current_consecutive_wins += 1;
                stats.current_consecutive_losses = 0;
                stats.max_consecutive_wins = stats
                    .max_consecutive_wins
                    .max(stats.current_consecutive_wins);
            } else {
                stats.current_consecutive_losses += 1;
                stats.current_consecutive_wins = 0;
                stats.max_consecutive_losses = stats
                    .max_consecutive_losses
                    .max(stats.current_consecutive_losses);
            }
        }
        if stats.total_trades > 0 {
            stats.win_rate =
                (stats.wins as f64 / stats.total_trades as f64 * 10_000.0).round() / 100.0;
        }
        stats.total_profit = (stats.total_profit * 100.0).round() / 100.0;

        sqlx::query(
            "INSERT OR REPLACE INTO hourly_stats
             (date, hour, total_trades, wins, win_rate, total_profit,
              max_consecutive_wins, max_consecutive_losses,
              current_consecutive_wins, current_consecutive_losses)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&stats.date)
        .bind(stats.hour)
        .bind(stats.total_trades)
        .bind(stats.wins)
        .bind(stats.win_rate)
        .bind(stats.total_profit)
        .bind(stats.max_consecutive_wins)
        .bind(stats.max_consecutive_losses)
        .bind(stats.current_consecutive_wins)
        .bind(stats.current_consecutive_losses)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Statistics for one date, every interval in hour order.
    pub async fn hourly_stats(&self, date: &str) -> Result<Vec<HourlyStats>> {
        let rows: Vec<HourlyRow> = sqlx::query_as(
            "SELECT date, hour, total_trades, wins, win_rate, total_profit,
                    max_consecutive_wins, max_consecutive_losses,
                    current_consecutive_wins, current_consecutive_losses
             FROM hourly_stats WHERE date = ? ORDER BY hour ASC",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HourlyStats::from).collect())
    }

    /// The same two-hour interval across the last seven recorded days.
    pub async fn comparison_stats(&self, target_hour: u32) -> Result<Vec<HourlyStats>> {
        let hour = Self::bucket(target_hour);
        let rows: Vec<HourlyRow> = sqlx::query_as(
            "SELECT date, hour, total_trades, wins, win_rate, total_profit,
                    max_consecutive_wins, max_consecutive_losses,
                    current_consecutive_wins, current_consecutive_losses
             FROM hourly_stats WHERE hour = ?
             ORDER BY date DESC LIMIT 7",
        )
        .bind(hour)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HourlyStats::from).collect())
    }

    /// Insert or update a sequence window, writing the row id back.
    pub async fn save_window(&self, window: &mut SequenceWindow) -> Result<()> {
        match window.id {
            None => {
                let result = sqlx::query(
                    "INSERT INTO sequence_stats
                     (start_timestamp, end_timestamp, date, sequence_type,
                      trades_count, wins, win_rate, is_completed,
                      reference_win_rate, completed_win_rate)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(window.started_at.timestamp_millis())
                .bind(window.ended_at.timestamp_millis())
                .bind(self.local_now().format("%Y-%m-%d").to_string())
                .bind(window.kind.to_string())
                .bind(window.trades_count as i64)
                .bind(window.wins as i64)
                .bind(window.win_rate)
                .bind(window.is_completed)
                .bind(window.reference_win_rate)
                .bind(window.completed_win_rate)
                .execute(&self.pool)
                .await?;
                window.id = Some(result.last_insert_rowid());
            }
            Some(id) => {
                sqlx::query(
                    "UPDATE sequence_stats
                     SET end_timestamp = ?, trades_count = ?, wins = ?,
                         win_rate = ?, is_completed = ?, completed_win_rate = ?
                     WHERE id = ?",
                )
                .bind(window.ended_at.timestamp_millis())
                .bind(window.trades_count as i64)
                .bind(window.wins as i64)
                .bind(window.win_rate)
                .bind(window.is_completed)
                .bind(window.completed_win_rate)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Newest open window of each kind, for monitor restore at startup.
    pub async fn open_windows(&self) -> Result<(Option<SequenceWindow>, Option<SequenceWindow>)> {
        let current = self.latest_open_window(WindowKind::Current).await?;
        let next = self.latest_open_window(WindowKind::Next).await?;
        if current.is_some() || next.is_some() {
            info!(
                current = current.is_some(),
                next = next.is_some(),
                "restoring open sequence windows"
            );
        }
        Ok((current, next))
    }

    async fn latest_open_window(&self, kind: WindowKind) -> Result<Option<SequenceWindow>> {
        let row: Option<WindowRow> = sqlx::query_as(
            "SELECT id, start_timestamp, end_timestamp, sequence_type,
                    trades_count, wins, win_rate, is_completed,
                    reference_win_rate, completed_win_rate
             FROM sequence_stats
             WHERE sequence_type = ? AND is_completed = 0
             ORDER BY id DESC LIMIT 1",
        )
        .bind(kind.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SequenceWindow::try_from).transpose()
    }

    /// Most recent windows, open or closed, newest first.
    pub async fn recent_windows(&self, limit: i64) -> Result<Vec<SequenceWindow>> {
        let rows: Vec<WindowRow> = sqlx::query_as(
            "SELECT id, start_timestamp, end_timestamp, sequence_type,
                    trades_count, wins, win_rate, is_completed,
                    reference_win_rate, completed_win_rate
             FROM sequence_stats ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SequenceWindow::try_from).collect()
    }
}

type HourlyRow = (String, i64, i64, i64, f64, f64, i64, i64, i64, i64);

impl From<HourlyRow> for HourlyStats {
    fn from(row: HourlyRow) -> Self {
        let (
            date,
            hour,
            total_trades,
            wins,
            win_rate,
            total_profit,
            max_consecutive_wins,
            max_consecutive_losses,
            current_consecutive_wins,
            current_consecutive_losses,
        ) = row;
        Self {
            date,
            hour,
            total_trades,
            wins,
            win_rate,
            total_profit,
            max_consecutive_wins,
            max_consecutive_losses,
            current_consecutive_wins,
            current_consecutive_losses,
        }
    }
}

type WindowRow = (
    i64,
    i64,
    i64,
    String,
    i64,
    i64,
    f64,
    bool,
    Option<f64>,
    Option<f64>,
);

impl TryFrom<WindowRow> for SequenceWindow {
    type Error = Error;

    fn try_from(row: WindowRow) -> Result<Self> {
        let (id, start, end, kind, trades_count, wins, win_rate, is_completed, reference, completed) =
            row;
        let kind = match kind.as_str() {
            "current" => WindowKind::Current,
            "next" => WindowKind::Next,
            other => {
                return Err(Error::Data(format!("unknown sequence type: {other}")));
            }
        };
        Ok(Self {
            id: Some(id),
            kind,
            trades_count: trades_count as usize,
            wins: wins as usize,
            win_rate,
            is_completed,
            completed_win_rate: completed,
            reference_win_rate: reference,
            started_at: DateTime::from_timestamp_millis(start).unwrap_or_default(),
            ended_at: DateTime::from_timestamp_millis(end).unwrap_or_default(),
        })
    }
}

//! Sequence-window monitoring
//!
//! Tracks live win rates over fixed-size trade windows. A completed window
//! scoring below the probation threshold opens a probation window that
//! carries the weak rate as its reference; while the probation window runs,
//! the live rate dropping below that reference abandons it and starts a
//! fresh one. Persistence is the caller's concern: the monitor hands closed
//! windows out and accepts restored ones at startup.


use crate::config::MonitorConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Role a window plays in the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// The rolling window every trade lands in
    Current,
    /// Probation window opened after a weak completed window
    Next,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Current => write!(f, "current"),
            WindowKind::Next => write!(f, "next"),
        }
    }
}

/// One fixed-size window of trade outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceWindow {
    /// Ledger row id once persisted
    pub id: Option<i64>,
    pub kind: WindowKind,
    pub trades_count: usize,
    pub wins: usize,
    /// Percentage over the trades counted so far
    pub win_rate: f64,
    pub is_completed: bool,
    /// Final score, present only when the window ran its full course;
    /// abandoned probation windows close without one
    pub completed_win_rate: Option<f64>,
    /// Rate of the weak window that opened this probation window
    pub reference_win_rate: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SequenceWindow {
    fn open(kind: WindowKind, is_win: bool, reference: Option<f64>, at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            kind,
            trades_count: 1,
            wins: usize::from(is_win),
            win_rate: if is_win { 100.0 } else { 0.0 },
            is_completed: false,
            completed_win_rate: None,
            reference_win_rate: reference,
            started_at: at,
            ended_at: at,
        }
    }

    fn apply(&mut self, is_win: bool, at: DateTime<Utc>, window_size: usize) {
        self.trades_count += 1;
        self.wins += usize::from(is_win);
        self.win_rate = self.wins as f64 / self.trades_count as f64 * 100.0;
        self.ended_at = at;
        if self.trades_count >= window_size {
            self.is_completed = true;
            self.completed_win_rate = Some(self.win_rate);
        }
    }
}

/// What a recorded outcome did to the window state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MonitorEvent {
    WindowCompleted { kind: WindowKind, win_rate: f64 },
    ProbationOpened { reference_win_rate: f64 },
    ProbationAbandoned {
        reference_win_rate: f64,
        current_win_rate: f64,
    },
}

/// Win-rate window tracker.
///
/// At most one open current and one open probation window exist at a time.
pub struct SequenceMonitor {
    config: MonitorConfig,
    current: Option<SequenceWindow>,
    next: Option<SequenceWindow>,
    /// Windows closed since the last drain, completion order
    closed: Vec<SequenceWindow>,
}

impl SequenceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            current: None,
            next: None,
            closed: Vec::new(),
        }
    }

    /// Resume from persisted open windows.
    pub fn restore(
        config: MonitorConfig,
        current: Option<SequenceWindow>,
        next: Option<SequenceWindow>,
    ) -> Self {
        Self {
            config,
            current,
            next,
            closed: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&SequenceWindow> {
        self.current.as_ref()
    }

    pub fn next(&self) -> Option<&SequenceWindow> {
        self.next.as_ref()
    }

    /// Mutable access for the persistence layer to write row ids back.
    pub fn current_mut(&mut self) -> Option<&mut SequenceWindow> {
        self.current.as_mut()
    }

    pub fn next_mut(&mut self) -> Option<&mut SequenceWindow> {
        self.next.as_mut()
    }

    /// Closed windows accumulated since the last call.
    pub fn drain_closed(&mut self) -> Vec<SequenceWindow> {
        std::mem::take(&mut self.closed)
    }

    /// Feed one resolved trade through the window state machine.
    ///
    /// A trade that completes the current window also seeds its replacement
    /// (and the probation window, when one opens), so it is counted in both.
    pub fn record_outcome(&mut self, is_win: bool) -> Vec<MonitorEvent> {
        let now = Utc::now();
        let mut events = Vec::new();

        let Some(current) = self.current.as_mut() else {
            self.current = Some(SequenceWindow::open(WindowKind::Current, is_win, None, now));
            return events;
        };

        current.apply(is_win, now, self.config.window_size);
        let current_rate = current.win_rate;

        if current.is_completed {
            info!(
                win_rate = current_rate,
                trades = current.trades_count,
                "current window completed"
            );
            events.push(MonitorEvent::WindowCompleted {
                kind: WindowKind::Current,
                win_rate: current_rate,
            });
            if let Some(finished) = self.current.take() {
                self.closed.push(finished);
            }
            self.current = Some(SequenceWindow::open(WindowKind::Current, is_win, None, now));

            if current_rate < self.config.probation_threshold {
                if let Some(mut stale) = self.next.take() {
                    stale.is_completed = true;
                    self.closed.push(stale);
                }
                info!(reference = current_rate, "weak window, opening probation");
                self.next = Some(SequenceWindow::open(
                    WindowKind::Next,
                    is_win,
                    Some(current_rate),
                    now,
                ));
                events.push(MonitorEvent::ProbationOpened {
                    reference_win_rate: current_rate,
                });
            }
            return events;
        }

        if let Some(reference) = self.next.as_ref().and_then(|n| n.reference_win_rate) {
            if current_rate < reference {
                debug!(
                    reference,
                    current_rate, "live rate fell below reference, reseeding probation"
                );
                if let Some(mut abandoned) = self.next.take() {
                    abandoned.is_completed = true;
                    self.closed.push(abandoned);
                }
                events.push(MonitorEvent::ProbationAbandoned {
                    reference_win_rate: reference,
                    current_win_rate: current_rate,
                });
                self.next = Some(SequenceWindow::open(
                    WindowKind::Next,
                    is_win,
                    Some(current_rate),
                    now,
                ));
                events.push(MonitorEvent::ProbationOpened {
                    reference_win_rate: current_rate,
                });
            } else if let Some(next) = self.next.as_mut() {
                next.apply(is_win, now, self.config.window_size);
                if next.is_completed {
                    let rate = next.win_rate;
                    info!(win_rate = rate, "probation window completed");
                    events.push(MonitorEvent::WindowCompleted {
                        kind: WindowKind::Next,
                        win_rate: rate,
                    });
                    if let Some(finished) = self.next.take() {
                        self.closed.push(finished);
                    }
                }
            }
        }

        events
    }
}

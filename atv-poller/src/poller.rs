//! Status polling task
//!
//! A single tokio task ticks at a fixed interval. Each tick consults the
//! [`PollSchedule`] and the shared [`PendingUpdateBudget`], and when a fetch
//! is due runs it on the blocking pool (the device call goes through the
//! command gate and may wait for it).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use atv_control::{ControlError, GatedChannel};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::budget::PendingUpdateBudget;
use crate::config::PollerConfig;
use crate::error::{PollError, PollResult};
use crate::schedule::{PollDecision, PollSchedule};

/// Something that can ask the device for its status
pub trait StatusFetch: Send + Sync + 'static {
    fn fetch_status(&self) -> Result<(), ControlError>;
}

impl StatusFetch for GatedChannel {
    fn fetch_status(&self) -> Result<(), ControlError> {
        GatedChannel::fetch_status(self)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped,
    Fetched(PollDecision),
    Failed(PollDecision),
}

/// Counters describing what the poller has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub forced: u64,
    pub natural: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    ticks: AtomicU64,
    forced: AtomicU64,
    natural: AtomicU64,
    failed: AtomicU64,
}

impl StatsCounters {
    fn record(&self, outcome: TickOutcome) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        match outcome {
            TickOutcome::Skipped => {}
            TickOutcome::Fetched(PollDecision::Forced) => {
                self.forced.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Fetched(_) => {
                self.natural.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self) -> PollStats {
        PollStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            forced: self.forced.load(Ordering::Relaxed),
            natural: self.natural.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Tick state machine shared by the async task and synchronous callers
pub struct PollCycle {
    schedule: PollSchedule,
    budget: Arc<PendingUpdateBudget>,
    fetcher: Arc<dyn StatusFetch>,
}

impl PollCycle {
    pub fn new(skip_count: u32, budget: Arc<PendingUpdateBudget>, fetcher: Arc<dyn StatusFetch>) -> Self {
        Self {
            schedule: PollSchedule::new(skip_count),
            budget,
            fetcher,
        }
    }

    /// Advance the schedule
    pub fn decide(&mut self) -> PollDecision {
        self.schedule.tick(self.budget.has_pending())
    }

    /// Record a fetch result; a successful forced fetch consumes one unit of budget
    pub fn complete(&self, decision: PollDecision, result: Result<(), PollError>) -> TickOutcome {
        match result {
            Ok(()) => {
                if decision == PollDecision::Forced {
                    self.budget.consume_one();
                }
                trace!("{:?} status fetch done, {} pending", decision, self.budget.pending());
                TickOutcome::Fetched(decision)
            }
            Err(e) => {
                warn!("{:?} status fetch failed: {}", decision, e);
                TickOutcome::Failed(decision)
            }
        }
    }

    /// Run one tick on the current thread, blocking on the fetch
    pub fn run_once(&mut self) -> TickOutcome {
        let decision = self.decide();
        if !decision.fetches() {
            return TickOutcome::Skipped;
        }
        let result = self.fetcher.fetch_status().map_err(PollError::from);
        self.complete(decision, result)
    }

    fn fetcher(&self) -> Arc<dyn StatusFetch> {
        Arc::clone(&self.fetcher)
    }
}

struct PollingTask {
    handle: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
}

/// Periodic status poller for one device
pub struct StatusPoller {
    config: PollerConfig,
    budget: Arc<PendingUpdateBudget>,
    fetcher: Arc<dyn StatusFetch>,
    stats: Arc<StatsCounters>,
    task: Mutex<Option<PollingTask>>,
}

impl StatusPoller {
    pub fn new(config: PollerConfig, budget: Arc<PendingUpdateBudget>, fetcher: Arc<dyn StatusFetch>) -> Self {
        Self {
            config,
            budget,
            fetcher,
            stats: Arc::new(StatsCounters::default()),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn budget(&self) -> &Arc<PendingUpdateBudget> {
        &self.budget
    }

    /// Queue the configured burst of forced polls
    pub fn request_burst(&self) {
        self.budget.add(self.config.force_burst);
    }

    pub fn stats(&self) -> PollStats {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// Start polling on the current tokio runtime
    ///
    /// Does nothing if the poller is already running.
    pub fn start(&self) -> PollResult<()> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| PollError::NoRuntime)?;

        let mut task = self.task.lock();
        if let Some(existing) = task.as_ref() {
            if !existing.handle.is_finished() {
                debug!("Status poller already running");
                return Ok(());
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let cycle = PollCycle::new(self.config.skip_count, Arc::clone(&self.budget), Arc::clone(&self.fetcher));
        let handle = runtime.spawn(poll_loop(
            cycle,
            self.config,
            Arc::clone(&shutdown),
            Arc::clone(&self.stats),
        ));

        info!(
            "Status poller started (interval {:?}, skip {}, burst {})",
            self.config.interval, self.config.skip_count, self.config.force_burst
        );
        *task = Some(PollingTask { handle, shutdown });
        Ok(())
    }

    /// Stop polling; no tick starts after this returns
    ///
    /// A fetch already running on the blocking pool is allowed to finish.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.shutdown.store(true, Ordering::Release);
            task.handle.abort();
            info!("Status poller stopped");
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    mut cycle: PollCycle,
    config: PollerConfig,
    shutdown: Arc<AtomicBool>,
    stats: Arc<StatsCounters>,
) {
    let mut ticker = time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        let decision = cycle.decide();
        let outcome = if decision.fetches() {
            let fetcher = cycle.fetcher();
            let result = match tokio::task::spawn_blocking(move || fetcher.fetch_status()).await {
                Ok(result) => result.map_err(PollError::from),
                Err(e) => Err(PollError::Task(e.to_string())),
            };
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            cycle.complete(decision, result)
        } else {
            TickOutcome::Skipped
        };
        stats.record(outcome);
    }

    debug!("Status poll loop exited");
}

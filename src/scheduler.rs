//! Background accrual ticker.
//!
//! Runs [`Ledger::run_accrual_tick`] on a dedicated thread once per interval.
//! The thread sleeps by waiting on a stop channel, so a stop request wakes it
//! immediately; a tick that has already started always runs to completion.

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Periodic accrual task over a shared [`Ledger`].
///
/// Stopped explicitly with [`AccrualScheduler::stop`] or implicitly on drop.
#[derive(Debug)]
pub struct AccrualScheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
    interval: Duration,
}

impl AccrualScheduler {
    /// Starts ticking at the ledger's configured interval.
    pub fn start(ledger: Arc<Ledger>) -> Result<Self> {
        let interval = ledger.tick_interval();
        Self::start_with_interval(ledger, interval)
    }

    /// Starts ticking at `interval`.
    pub fn start_with_interval(ledger: Arc<Ledger>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(LedgerError::Config("tick interval must be positive".into()));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticks = Arc::new(AtomicU64::new(0));
        let thread_ticks = Arc::clone(&ticks);

        let handle = thread::Builder::new()
            .name("accrual-ticker".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        ledger.run_accrual_tick();
                        thread_ticks.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        info!("Accrual ticker started, interval {:?}", interval);
        Ok(AccrualScheduler {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            ticks,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks completed by this scheduler.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the ticker and waits for its thread to exit.
    ///
    /// Returns once any in-flight tick has finished; no tick starts afterwards.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // the receiver is gone only if the thread already exited
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Accrual ticker thread panicked");
            }
            info!("Accrual ticker stopped after {} tick(s)", self.ticks());
        }
    }
}

impl Drop for AccrualScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

//! # Polling Engine
//!
//! Periodically re-reads every tag registered on one connection.
//!
//! A tick checks the connection state, logs transitions, then reads the tags
//! one after another in registration order. Each tag does its own retrying
//! and change notification. Ticks never overlap: a tick that starts while
//! the previous one is still running is dropped, not queued.
//!
//! With the `runtime` feature, [`PollEngine::start`] drives ticks from a
//! tokio timer:
//!
//! ```rust
//! use std::sync::Arc;
//! use voltage_s7::{sim::MemoryPlc, ConnectionConfig, PlcConnection, PollEngine};
//!
//! # tokio_test::block_on(async {
//! let config = ConnectionConfig::new().with_poll_interval_ms(20);
//! let plc = MemoryPlc::new().with_block(1, 16);
//! let connection = Arc::new(PlcConnection::with_config("plc", plc, config));
//!
//! let engine = Arc::new(PollEngine::new(connection));
//! let level = engine.add_address("level", "DB1,INT0").unwrap();
//! level.on_change(|tag| println!("{} = {}", tag, tag.value()));
//!
//! let handle = engine.start().expect("polling enabled");
//! tokio::time::sleep(std::time::Duration::from_millis(200)).await;
//! assert!(handle.stop().await);
//! # });
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::client::{PlcClient, PlcConnection};
use crate::error::ParseError;
use crate::tag::Tag;

/// Result of one tick that ran to the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Tags read successfully
    pub succeeded: usize,
    /// Tags whose attempts were exhausted
    pub failed: usize,
}

/// What happened to a tick request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every tag was visited.
    Completed(PollSummary),
    /// Another tick was still running.
    Skipped,
    /// The tick panicked; the panic was logged.
    Failed,
}

/// Polling engine for the tags of one connection.
pub struct PollEngine<C: PlcClient> {
    connection: Arc<PlcConnection<C>>,
    tags: RwLock<Vec<Arc<Tag<C>>>>,
    poll_active: AtomicBool,
    last_connected: AtomicBool,
}

impl<C: PlcClient> PollEngine<C> {
    pub fn new(connection: Arc<PlcConnection<C>>) -> Self {
        Self {
            connection,
            tags: RwLock::new(Vec::new()),
            poll_active: AtomicBool::new(false),
            last_connected: AtomicBool::new(false),
        }
    }

    pub fn connection(&self) -> &Arc<PlcConnection<C>> {
        &self.connection
    }

    /// Append a tag to the poll set.
    pub fn add_tag(&self, tag: Arc<Tag<C>>) {
        if !Arc::ptr_eq(tag.connection(), &self.connection) {
            warn!(
                tag = %tag.name(),
                address = %self.connection.address(),
                "tag bound to another connection"
            );
        }
        self.tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tag);
    }

    /// Parse an address into a tag on this connection and register it.
    pub fn add_address(&self, name: &str, address: &str) -> Result<Arc<Tag<C>>, ParseError> {
        let tag = Arc::new(Tag::new(self.connection.clone(), name, address)?);
        self.add_tag(tag.clone());
        Ok(tag)
    }

    /// Registered tags in poll order.
    pub fn tags(&self) -> Vec<Arc<Tag<C>>> {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.tags.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a tick is running right now.
    pub fn is_polling(&self) -> bool {
        self.poll_active.load(Ordering::Acquire)
    }

    /// Run one poll cycle on the calling thread.
    pub fn tick(&self) -> TickOutcome {
        if self
            .poll_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(address = %self.connection.address(), "poll tick skipped, previous tick still running");
            return TickOutcome::Skipped;
        }
        let _active = ActiveGuard(&self.poll_active);

        match panic::catch_unwind(AssertUnwindSafe(|| self.poll_once())) {
            Ok(summary) => TickOutcome::Completed(summary),
            Err(payload) => {
                error!(
                    address = %self.connection.address(),
                    "poll tick panicked: {}",
                    panic_message(payload.as_ref())
                );
                TickOutcome::Failed
            }
        }
    }

    fn poll_once(&self) -> PollSummary {
        let connected = self.connection.is_connected();
        let was_connected = self.last_connected.swap(connected, Ordering::AcqRel);
        if connected != was_connected {
            if connected {
                info!(address = %self.connection.address(), "PLC connected");
            } else {
                info!(address = %self.connection.address(), "PLC disconnected");
            }
        }

        let mut summary = PollSummary::default();
        for tag in self.tags() {
            if tag.read_from_device() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }
}

/// Clears the re-entrancy flag however the tick ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

// ============================================================================
// Timer
// ============================================================================

#[cfg(feature = "runtime")]
mod timer {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::watch;
    use tokio::task::JoinHandle;
    use tokio::time::{self, Instant, MissedTickBehavior};
    use tracing::{debug, info};

    use super::PollEngine;
    use crate::client::PlcClient;

    /// Upper bound on waiting for the timer task in [`PollHandle::stop`].
    const STOP_TIMEOUT: Duration = Duration::from_secs(1);

    /// Running poll timer.
    pub struct PollHandle {
        stop_tx: watch::Sender<bool>,
        join: JoinHandle<()>,
    }

    impl PollHandle {
        /// Stop the timer. Returns `true` when the task ended within one
        /// second. A tick already running finishes on its own.
        pub async fn stop(self) -> bool {
            let _ = self.stop_tx.send(true);
            match time::timeout(STOP_TIMEOUT, self.join).await {
                Ok(join_result) => join_result.is_ok(),
                Err(_) => false,
            }
        }

        pub fn is_finished(&self) -> bool {
            self.join.is_finished()
        }
    }

    impl<C: PlcClient + 'static> PollEngine<C> {
        /// Start the periodic timer on the current tokio runtime.
        ///
        /// The first tick fires one interval after the call. Ticks run on the
        /// blocking pool and are not awaited, so a slow tick causes the next
        /// fire to be skipped by the re-entrancy guard. Returns `None` when
        /// the configured poll interval is zero.
        pub fn start(self: &Arc<Self>) -> Option<PollHandle> {
            let interval = self.connection.config().poll_interval()?;
            let (stop_tx, mut stop_rx) = watch::channel(false);
            let engine = Arc::clone(self);

            info!(
                address = %self.connection.address(),
                interval_ms = self.connection.config().poll_interval_ms,
                tags = self.len(),
                "polling started"
            );

            let join = tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        changed = stop_rx.changed() => {
                            if changed.is_err() || *stop_rx.borrow() {
                                break;
                            }
                        }
                        _ = ticker.tick() => {
                            if *stop_rx.borrow() {
                                break;
                            }
                            let engine = Arc::clone(&engine);
                            let _ = tokio::task::spawn_blocking(move || engine.tick());
                        }
                    }
                }

                debug!(address = %engine.connection.address(), "polling stopped");
            });

            Some(PollHandle { stop_tx, join })
        }
    }
}

#[cfg(feature = "runtime")]
pub use timer::PollHandle;

// ============================================================================
// Tests
// ============================================================================

//! Detached event logging.
//!
//! Call sites that must not wait on the broker hand records to an
//! [`EventSink`]; a single [`EventDispatcher`] task publishes them in order.
//!
//! # Design Decisions
//! - Bounded channel: a full channel drops the record instead of blocking
//! - Publish failures never reach the emitter; they are counted, traced and
//!   exported as metrics
//! - On shutdown the dispatcher stops accepting and flushes what is queued

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::events::logger::EventLogger;
use crate::events::record::{LogRecord, LogType};
use crate::observability::metrics;

/// Counters shared by the sink and the dispatcher.
#[derive(Debug, Default)]
struct DispatchCounters {
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time view of the dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub published: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Cheap, cloneable handle for emitting events without awaiting the broker.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<LogRecord>,
    logger: EventLogger,
    counters: Arc<DispatchCounters>,
    enabled: bool,
}

impl EventSink {
    /// A disabled sink accepts and discards every record.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Stamp a record now and queue it for publication.
    pub fn emit(
        &self,
        log_type: LogType,
        url: &str,
        correlation_id: &str,
        message: impl Into<String>,
    ) {
        if !self.enabled {
            return;
        }
        let record = self.logger.record(log_type, url, correlation_id, message);
        if let Err(e) = self.tx.try_send(record) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::record_event_log_dropped();
            match e {
                mpsc::error::TrySendError::Full(record) => tracing::warn!(
                    correlation_id = %record.correlation_id(),
                    "Event dispatch queue full, dropping record"
                ),
                mpsc::error::TrySendError::Closed(record) => tracing::debug!(
                    correlation_id = %record.correlation_id(),
                    "Event dispatcher stopped, dropping record"
                ),
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            published: self.counters.published.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Background task that owns the receiving end of the sink.
pub struct EventDispatcher {
    rx: mpsc::Receiver<LogRecord>,
    logger: EventLogger,
    counters: Arc<DispatchCounters>,
}

/// Create a connected sink/dispatcher pair.
pub fn channel(logger: EventLogger, capacity: usize) -> (EventSink, EventDispatcher) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let counters = Arc::new(DispatchCounters::default());
    (
        EventSink {
            tx,
            logger: logger.clone(),
            counters: counters.clone(),
            enabled: true,
        },
        EventDispatcher {
            rx,
            logger,
            counters,
        },
    )
}

impl EventDispatcher {
    /// Publish queued records until every sink is dropped or shutdown fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Event dispatcher starting");

        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(record) => self.deliver(record).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    let mut flushed = 0usize;
                    while let Some(record) = self.rx.recv().await {
                        self.deliver(record).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Event dispatcher received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Event dispatcher stopped");
    }

    async fn deliver(&self, record: LogRecord) {
        match self.logger.publish(&record).await {
            Ok(()) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                metrics::record_event_log_failure();
                tracing::warn!(
                    correlation_id = %record.correlation_id(),
                    log_type = %record.log_type(),
                    error = %e,
                    "Error logging event"
                );
            }
        }
    }
}

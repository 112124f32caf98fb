//! In-process broker.
//!
//! FIFO queues behind a mutex with the same contract as the AMQP backend:
//! publish appends to the queue its route is bound to, `fetch_one` pops a
//! relay message and acknowledges it in one step. Used for local development
//! and for tests that must not depend on RabbitMQ.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::broker::types::{BrokerError, BrokerResult, Route, Topology};
use crate::broker::MessageBroker;

#[derive(Debug)]
pub struct InMemoryBroker {
    topology: Topology,
    messages: Mutex<VecDeque<Vec<u8>>>,
    events: Mutex<VecDeque<Vec<u8>>>,
    offline: AtomicBool,
}

impl InMemoryBroker {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            messages: Mutex::new(VecDeque::new()),
            events: Mutex::new(VecDeque::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate a broker outage: while offline every operation fails with
    /// [`BrokerError::NotAvailable`] and queued messages are kept.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of relay messages waiting, regardless of the offline switch.
    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of event-log records waiting in the event queue.
    pub fn events_len(&self) -> usize {
        self.events().len()
    }

    /// Pop the oldest event-log record. Nothing in the relay reads this
    /// queue; it exists for whoever collects the records.
    pub fn take_event(&self) -> Option<Vec<u8>> {
        self.events().pop_front()
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<Vec<u8>>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<Vec<u8>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> BrokerResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BrokerError::NotAvailable(format!(
                "in-memory broker for queue '{}' is offline",
                self.topology.queue
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, route: Route, payload: &[u8]) -> BrokerResult<()> {
        self.ensure_online()?;
        let mut queue = match route {
            Route::Messages => self.messages(),
            Route::Events => self.events(),
        };
        queue.push_back(payload.to_vec());
        Ok(())
    }

    async fn queue_depth(&self) -> BrokerResult<u32> {
        self.ensure_online()?;
        Ok(u32::try_from(self.len()).unwrap_or(u32::MAX))
    }

    async fn fetch_one(&self) -> BrokerResult<Option<Vec<u8>>> {
        self.ensure_online()?;
        Ok(self.messages().pop_front())
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }
}

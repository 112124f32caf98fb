//! Pull-based consumption from the configured queue.
//!
//! # Design Decisions
//! - Depth is checked once per call; a drain takes at most the depth seen then
//! - Consumers in this process take turns through a mutex, other processes
//!   may still race, so a drain is a best-effort snapshot
//! - An empty queue is `None` / an empty vector, never an error

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::broker::types::BrokerResult;
use crate::broker::MessageBroker;
use crate::observability::metrics;

/// Pulls and acknowledges messages from the bound queue.
#[derive(Debug)]
pub struct Consumer {
    broker: Arc<dyn MessageBroker>,
    turn: Mutex<()>,
}

impl Consumer {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            broker,
            turn: Mutex::new(()),
        }
    }

    /// Take the next message, if there is one.
    pub async fn pull(&self) -> BrokerResult<Option<String>> {
        let _turn = self.turn.lock().await;

        if self.broker.queue_depth().await? == 0 {
            return Ok(None);
        }
        let message = self.take_one().await?;
        if message.is_none() {
            tracing::debug!(
                queue = %self.broker.topology().queue,
                "Queue emptied between depth check and pull"
            );
        }
        Ok(message)
    }

    /// Take every message that was queued when the call started, oldest first.
    ///
    /// Each message is acknowledged as it is taken. If a later fetch fails,
    /// the error is returned and the messages already taken are lost: they
    /// have left the queue and are not handed back.
    pub async fn drain(&self) -> BrokerResult<Vec<String>> {
        let _turn = self.turn.lock().await;

        let depth = self.broker.queue_depth().await?;
        let mut messages = Vec::with_capacity(depth as usize);
        for _ in 0..depth {
            match self.take_one().await {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                Err(e) => {
                    if !messages.is_empty() {
                        tracing::warn!(
                            queue = %self.broker.topology().queue,
                            lost = messages.len(),
                            error = %e,
                            "Drain failed after acknowledging messages"
                        );
                    }
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            queue = %self.broker.topology().queue,
            observed_depth = depth,
            drained = messages.len(),
            "Queue drained"
        );
        Ok(messages)
    }

    /// Current queue depth.
    pub async fn depth(&self) -> BrokerResult<u32> {
        self.broker.queue_depth().await
    }

    async fn take_one(&self) -> BrokerResult<Option<String>> {
        let Some(payload) = self.broker.fetch_one().await? else {
            return Ok(None);
        };
        metrics::record_consumed(&self.broker.topology().queue);
        Ok(Some(match String::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }))
    }
}

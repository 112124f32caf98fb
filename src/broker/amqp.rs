//! AMQP broker connector.
//!
//! # Responsibilities
//! - Open one connection and one channel
//! - Declare the durable direct exchange, the relay queue and the event queue
//! - Bind each queue to the exchange with its own routing key
//! - Publish with confirms; a nack is an error
//! - Bound every broker call with the configured operation timeout

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lapin::options::{
    BasicAckOptions, BasicGetOptions, BasicPublishOptions, ConfirmSelectOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::time::timeout;

use crate::broker::types::{BrokerError, BrokerResult, Route, Topology};
use crate::broker::MessageBroker;
use crate::config::BrokerConfig;
use crate::observability::metrics;

/// Reply code sent with a normal channel/connection close.
const REPLY_SUCCESS: u16 = 200;

/// A connected AMQP channel with its exchange/queue already declared.
pub struct AmqpBroker {
    connection: Connection,
    channel: Channel,
    topology: Topology,
    timeout_duration: Duration,
}

impl AmqpBroker {
    /// Connect and declare the topology described by `config`.
    ///
    /// # Returns
    /// A ready handle, or the first connection/declaration error.
    pub async fn connect(config: &BrokerConfig) -> BrokerResult<Self> {
        let timeout_duration = Duration::from_millis(config.operation_timeout_ms);
        let topology = Topology::from(config);

        let connection = bounded(
            "connect",
            timeout_duration,
            Connection::connect(&config.url, ConnectionProperties::default()),
        )
        .await?;
        let channel = bounded("create_channel", timeout_duration, connection.create_channel()).await?;

        bounded(
            "exchange_declare",
            timeout_duration,
            channel.exchange_declare(
                &topology.exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            ),
        )
        .await?;

        declare_bound_queue(
            &channel,
            &topology.exchange,
            &topology.queue,
            &topology.routing_key,
            timeout_duration,
        )
        .await?;
        declare_bound_queue(
            &channel,
            &topology.exchange,
            &topology.event_queue,
            &topology.event_routing_key,
            timeout_duration,
        )
        .await?;

        // Confirms make every publish wait for the broker's ack or nack.
        bounded(
            "confirm_select",
            timeout_duration,
            channel.confirm_select(ConfirmSelectOptions::default()),
        )
        .await?;

        tracing::info!(
            exchange = %topology.exchange,
            queue = %topology.queue,
            routing_key = %topology.routing_key,
            event_queue = %topology.event_queue,
            event_routing_key = %topology.event_routing_key,
            "AMQP broker connected"
        );

        Ok(Self {
            connection,
            channel,
            topology,
            timeout_duration,
        })
    }
}

#[async_trait]
impl MessageBroker for AmqpBroker {
    async fn publish(&self, route: Route, payload: &[u8]) -> BrokerResult<()> {
        let start = Instant::now();
        let confirmation = bounded("publish", self.timeout_duration, async {
            self.channel
                .basic_publish(
                    &self.topology.exchange,
                    self.topology.routing_key_for(route),
                    BasicPublishOptions::default(),
                    payload,
                    BasicProperties::default(),
                )
                .await?
                .await
        })
        .await;
        metrics::record_broker_operation("publish", start);

        if confirmation?.is_nack() {
            return Err(BrokerError::Rejected {
                exchange: self.topology.exchange.clone(),
            });
        }
        Ok(())
    }

    async fn queue_depth(&self) -> BrokerResult<u32> {
        let start = Instant::now();
        // Passive declare only inspects the queue.
        let queue = bounded(
            "check_queue",
            self.timeout_duration,
            self.channel.queue_declare(
                &self.topology.queue,
                QueueDeclareOptions {
                    passive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            ),
        )
        .await;
        metrics::record_broker_operation("check_queue", start);
        Ok(queue?.message_count())
    }

    async fn fetch_one(&self) -> BrokerResult<Option<Vec<u8>>> {
        let start = Instant::now();
        let message = bounded(
            "get",
            self.timeout_duration,
            self.channel
                .basic_get(&self.topology.queue, BasicGetOptions::default()),
        )
        .await;
        metrics::record_broker_operation("get", start);

        let Some(message) = message? else {
            return Ok(None);
        };
        let delivery = message.delivery;
        bounded(
            "ack",
            self.timeout_duration,
            delivery.acker.ack(BasicAckOptions::default()),
        )
        .await?;

        Ok(Some(delivery.data))
    }

    async fn close(&self) -> BrokerResult<()> {
        bounded(
            "close_channel",
            self.timeout_duration,
            self.channel.close(REPLY_SUCCESS, "OK"),
        )
        .await?;
        bounded(
            "close_connection",
            self.timeout_duration,
            self.connection.close(REPLY_SUCCESS, "OK"),
        )
        .await?;
        tracing::info!(queue = %self.topology.queue, "AMQP broker connection closed");
        Ok(())
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }
}

impl std::fmt::Debug for AmqpBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpBroker")
            .field("exchange", &self.topology.exchange)
            .field("queue", &self.topology.queue)
            .field("routing_key", &self.topology.routing_key)
            .field("event_queue", &self.topology.event_queue)
            .field("timeout_ms", &self.timeout_duration.as_millis())
            .finish()
    }
}

/// Declare a durable queue and bind it to `exchange` under `routing_key`.
async fn declare_bound_queue(
    channel: &Channel,
    exchange: &str,
    queue: &str,
    routing_key: &str,
    limit: Duration,
) -> BrokerResult<()> {
    bounded(
        "queue_declare",
        limit,
        channel.queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        ),
    )
    .await?;

    bounded(
        "queue_bind",
        limit,
        channel.queue_bind(
            queue,
            exchange,
            routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        ),
    )
    .await?;
    Ok(())
}

/// Run one lapin future under the operation timeout.
async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> BrokerResult<T>
where
    F: Future<Output = Result<T, lapin::Error>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(BrokerError::from),
        Err(_) => Err(BrokerError::Timeout {
            operation,
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

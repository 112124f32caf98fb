//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use broker_relay::broker::{InMemoryBroker, MessageBroker, Topology};
use broker_relay::config::{BrokerBackend, RelayConfig};
use broker_relay::events::LogRecord;
use broker_relay::{Service, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A relay serving on a loopback port, backed by an in-memory broker.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub broker: Arc<InMemoryBroker>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the service to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("relay did not stop")
            .expect("relay task panicked")
            .expect("relay returned an error");
    }
}

/// Start a relay; `configure` may adjust the defaults before wiring.
pub async fn start_relay<F>(configure: F) -> TestRelay
where
    F: FnOnce(&mut RelayConfig),
{
    let mut config = RelayConfig::default();
    config.broker.backend = BrokerBackend::Memory;
    config.listener.bind_address = "127.0.0.1:0".to_string();
    configure(&mut config);

    let broker = Arc::new(InMemoryBroker::new(Topology::from(&config.broker)));
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Service::with_broker(config, broker.clone());
    let shutdown = service.shutdown();
    let handle = tokio::spawn(service.run(listener));

    TestRelay {
        addr,
        broker,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Every relay message queued right now, oldest first.
#[allow(dead_code)]
pub async fn take_all(broker: &InMemoryBroker) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(payload) = broker.fetch_one().await.unwrap() {
        out.push(String::from_utf8(payload).unwrap());
    }
    out
}

/// Every event-log record queued right now, oldest first.
#[allow(dead_code)]
pub fn take_events(broker: &InMemoryBroker) -> Vec<LogRecord> {
    std::iter::from_fn(|| broker.take_event())
        .map(|payload| serde_json::from_slice(&payload).unwrap())
        .collect()
}

/// Poll until the event queue holds at least `count` records.
#[allow(dead_code)]
pub async fn wait_for_events(broker: &InMemoryBroker, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while broker.events_len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("event queue never reached expected depth");
}

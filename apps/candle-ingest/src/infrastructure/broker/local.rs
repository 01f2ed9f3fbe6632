//! In-Process Broker
//!
//! Channel-backed implementation of [`SubscriptionService`] and
//! [`SubscriberFactory`]. Suitable for development and integration tests;
//! not a durable broker.
//!
//! Semantics mirror what the pipeline expects from a real broker:
//!
//! - every queue bound to an exchange receives each published payload;
//! - deliveries within one subscription are sequential, subscriptions run
//!   concurrently;
//! - a failed delivery is retried after the policy's fixed delay and routed
//!   to the dead-letter exchange once the attempts are exhausted, so a
//!   poison message never blocks the queue.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    DeliveryErrorPolicy, ManagedSubscription, MessageHandler, SubscriberFactory,
    SubscriptionError, SubscriptionService, SubscriptionSettings,
};

struct Inner {
    exchanges: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl Inner {
    fn publish(&self, exchange: &str, payload: &[u8]) {
        let mut exchanges = self.exchanges.lock();
        if let Some(queues) = exchanges.get_mut(exchange) {
            queues.retain(|queue| queue.send(payload.to_vec()).is_ok());
        }
    }

    fn bind(&self, exchange: &str) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.exchanges
            .lock()
            .entry(exchange.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

/// In-process broker distributing payloads from exchanges to subscriptions.
pub struct LocalBroker {
    inner: Arc<Inner>,
    default_policy: DeliveryErrorPolicy,
}

impl LocalBroker {
    /// Create a broker whose factory subscriptions use `default_policy`.
    #[must_use]
    pub fn new(default_policy: DeliveryErrorPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                exchanges: Mutex::new(HashMap::new()),
            }),
            default_policy,
        }
    }

    /// Publish a payload to every queue bound to `exchange`.
    pub fn publish(&self, exchange: &str, payload: &[u8]) {
        self.inner.publish(exchange, payload);
    }

    fn spawn_subscription(
        &self,
        exchange: &str,
        policy: DeliveryErrorPolicy,
        handler: MessageHandler,
    ) -> LocalSubscription {
        let rx = self.inner.bind(exchange);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(deliver(
            Arc::clone(&self.inner),
            rx,
            handler,
            policy,
            cancel.clone(),
        ));

        LocalSubscription {
            cancel,
            task: Some(task),
        }
    }
}

#[async_trait]
impl SubscriptionService for LocalBroker {
    async fn subscribe(
        &self,
        settings: SubscriptionSettings,
        handler: MessageHandler,
    ) -> Result<Box<dyn ManagedSubscription>, SubscriptionError> {
        let policy = settings
            .error_policy
            .unwrap_or_else(|| self.default_policy.clone());

        Ok(Box::new(self.spawn_subscription(
            &settings.exchange,
            policy,
            handler,
        )))
    }
}

#[async_trait]
impl SubscriberFactory for LocalBroker {
    async fn create(
        &self,
        _connection: &str,
        namespace: &str,
        source: &str,
        handler: MessageHandler,
    ) -> Result<Box<dyn ManagedSubscription>, SubscriptionError> {
        let exchange = format!("{namespace}.{source}");
        Ok(Box::new(self.spawn_subscription(
            &exchange,
            self.default_policy.clone(),
            handler,
        )))
    }
}

/// One running local subscription; dropping it without `stop` leaves the
/// delivery task to drain until the broker goes away.
struct LocalSubscription {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl ManagedSubscription for LocalSubscription {
    async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn deliver(
    inner: Arc<Inner>,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    handler: MessageHandler,
    policy: DeliveryErrorPolicy,
    cancel: CancellationToken,
) {
    loop {
        let payload = tokio::select! {
            () = cancel.cancelled() => return,
            payload = rx.recv() => match payload {
                Some(payload) => payload,
                None => return,
            },
        };

        let mut attempts: u32 = 0;
        loop {
            match handler(payload.clone()).await {
                Ok(()) => break,
                Err(e) => {
                    attempts += 1;
                    if attempts >= policy.max_attempts {
                        tracing::warn!(
                            attempts,
                            dead_letter_exchange = %policy.dead_letter_exchange,
                            error = %e,
                            "Delivery failed repeatedly, routing message to dead-letter exchange"
                        );
                        inner.publish(&policy.dead_letter_exchange, &payload);
                        break;
                    }

                    tracing::warn!(
                        attempt = attempts,
                        retry_delay_ms = policy.retry_delay.as_millis(),
                        error = %e,
                        "Delivery failed, retrying after timeout"
                    );

                    tokio::select! {
                        () = cancel.cancelled() => return,
                        () = tokio::time::sleep(policy.retry_delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DeliveryError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(max_attempts: u32) -> DeliveryErrorPolicy {
        DeliveryErrorPolicy {
            retry_delay: Duration::from_millis(10),
            max_attempts,
            dead_letter_exchange: "dead".to_string(),
        }
    }

    fn settings(exchange: &str, error_policy: DeliveryErrorPolicy) -> SubscriptionSettings {
        SubscriptionSettings {
            connection: "local".to_string(),
            exchange: exchange.to_string(),
            queue: format!("{exchange}.test"),
            routing_key: String::new(),
            durable: true,
            error_policy: Some(error_policy),
        }
    }

    fn recording_handler(seen: Arc<Mutex<Vec<Vec<u8>>>>) -> MessageHandler {
        Arc::new(move |payload| {
            let seen = Arc::clone(&seen);
            Box::pin(async move {
                seen.lock().push(payload);
                Ok(())
            })
        })
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within timeout");
    }

    #[tokio::test]
    async fn publishes_to_bound_subscription() {
        let broker = LocalBroker::new(policy(3));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut subscription = broker
            .create("local", "markets", "quotefeed", recording_handler(seen.clone()))
            .await
            .unwrap();

        broker.publish("markets.quotefeed", b"tick");
        wait_until(|| !seen.lock().is_empty()).await;
        assert_eq!(seen.lock()[0], b"tick");

        subscription.stop().await;
    }

    #[tokio::test]
    async fn poison_message_dead_letters_without_blocking_queue() {
        let broker = LocalBroker::new(policy(2));

        let failures = Arc::new(AtomicU32::new(0));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let failures_in_handler = Arc::clone(&failures);
        let delivered_in_handler = Arc::clone(&delivered);
        let handler: MessageHandler = Arc::new(move |payload: Vec<u8>| {
            let failures = Arc::clone(&failures_in_handler);
            let delivered = Arc::clone(&delivered_in_handler);
            Box::pin(async move {
                if payload == b"poison" {
                    failures.fetch_add(1, Ordering::SeqCst);
                    return Err(DeliveryError("cannot process".to_string()));
                }
                delivered.lock().push(payload);
                Ok(())
            })
        });

        let dead = Arc::new(Mutex::new(Vec::new()));
        let mut dead_subscription = broker
            .subscribe(
                settings("dead", policy(1)),
                recording_handler(dead.clone()),
            )
            .await
            .unwrap();

        let mut subscription = broker
            .subscribe(settings("ticks", policy(2)), handler)
            .await
            .unwrap();

        broker.publish("ticks", b"poison");
        broker.publish("ticks", b"good");

        wait_until(|| !delivered.lock().is_empty()).await;
        wait_until(|| !dead.lock().is_empty()).await;

        assert_eq!(failures.load(Ordering::SeqCst), 2);
        assert_eq!(delivered.lock()[0], b"good");
        assert_eq!(dead.lock()[0], b"poison");

        subscription.stop().await;
        dead_subscription.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let broker = LocalBroker::new(policy(3));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut subscription = broker
            .create("local", "markets", "quotefeed", recording_handler(seen))
            .await
            .unwrap();

        subscription.stop().await;
        subscription.stop().await;
    }
}

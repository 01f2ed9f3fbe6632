//! Two-Way Quote Feed Adapter
//!
//! Owns one durable subscription on a named queue bound to a named exchange,
//! with dead-letter routing configured through the subscription settings.
//! Each valid message fans out into two canonical quotes: the buy side at
//! the bid price and the sell side at the ask price, sharing instrument and
//! timestamp.
//!
//! Failure policy: validation failures and per-quote dispatch failures are
//! logged and the message is still considered handled; the broker never
//! redelivers on their account. Only a subscription that cannot be
//! established is fatal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{
    DeliveryError, DeliveryErrorPolicy, FeedError, ManagedSubscription, MessageHandler,
    QuoteProcessor, QuoteSource, RawPayload, SubscriptionService, SubscriptionSettings,
};
use crate::application::services::dispatcher::{DispatchFailurePolicy, QuoteDispatcher};
use crate::domain::quote::Quote;
use crate::infrastructure::config::ConnectionString;
use crate::infrastructure::feeds::messages::TwoWayQuoteMessage;
use crate::infrastructure::feeds::validation;

/// Suffix appended to the exchange name to form this consumer's queue.
const QUEUE_SUFFIX: &str = "candle-ingest";

/// Settings for the two-way feed subscription.
#[derive(Debug, Clone)]
pub struct TwoWayFeedSettings {
    /// Broker connection target.
    pub connection: ConnectionString,
    /// Exchange the upstream publishes two-way quotes on.
    pub exchange: String,
    /// Exchange receiving messages that exhausted their delivery attempts.
    pub dead_letter_exchange: String,
    /// Fixed delay before a failed delivery is retried.
    pub retry_delay: Duration,
    /// Delivery attempts before dead-lettering.
    pub max_delivery_attempts: u32,
}

impl TwoWayFeedSettings {
    /// Queue name derived from the exchange.
    #[must_use]
    pub fn queue(&self) -> String {
        format!("{}.{QUEUE_SUFFIX}", self.exchange)
    }
}

/// Quote source consuming the two-way (bid/ask) feed.
pub struct TwoWayQuoteFeed {
    settings: TwoWayFeedSettings,
    subscriber: Arc<dyn SubscriptionService>,
    dispatcher: Arc<QuoteDispatcher>,
    subscription: Option<Box<dyn ManagedSubscription>>,
}

impl TwoWayQuoteFeed {
    /// Create the feed. The dispatch policy is fixed to log-and-continue.
    pub fn new(
        settings: TwoWayFeedSettings,
        subscriber: Arc<dyn SubscriptionService>,
        processor: Arc<dyn QuoteProcessor>,
    ) -> Self {
        Self {
            settings,
            subscriber,
            dispatcher: Arc::new(QuoteDispatcher::new(
                processor,
                DispatchFailurePolicy::ContinueOnFailure,
            )),
            subscription: None,
        }
    }

    fn subscription_settings(&self) -> SubscriptionSettings {
        SubscriptionSettings {
            connection: self.settings.connection.as_str().to_string(),
            exchange: self.settings.exchange.clone(),
            queue: self.settings.queue(),
            routing_key: String::new(),
            durable: true,
            error_policy: Some(DeliveryErrorPolicy {
                retry_delay: self.settings.retry_delay,
                max_attempts: self.settings.max_delivery_attempts,
                dead_letter_exchange: self.settings.dead_letter_exchange.clone(),
            }),
        }
    }

    fn handler(&self) -> MessageHandler {
        let dispatcher = Arc::clone(&self.dispatcher);
        Arc::new(move |payload: RawPayload| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move { handle_message(&dispatcher, &payload).await })
        })
    }
}

#[async_trait]
impl QuoteSource for TwoWayQuoteFeed {
    async fn start(&mut self) -> Result<(), FeedError> {
        let settings = self.subscription_settings();
        let queue = settings.queue.clone();

        match self.subscriber.subscribe(settings, self.handler()).await {
            Ok(subscription) => {
                tracing::info!(queue = %queue, "Two-way quote feed started");
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    queue = %queue,
                    error = %e,
                    "Failed to start the two-way quote feed"
                );
                Err(e.into())
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop().await;
            tracing::info!("Two-way quote feed stopped");
        }
    }
}

async fn handle_message(
    dispatcher: &QuoteDispatcher,
    payload: &[u8],
) -> Result<(), DeliveryError> {
    let context = String::from_utf8_lossy(payload);

    let message = match serde_json::from_slice::<Option<TwoWayQuoteMessage>>(payload) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                context = %context,
                error = %e,
                "Dropping undecodable two-way quote message"
            );
            return Ok(());
        }
    };

    let violations = validation::validate_two_way(message.as_ref());
    if !violations.is_empty() {
        tracing::warn!(
            context = %context,
            violations = %violations.join("; "),
            "Dropping invalid two-way quote message"
        );
        return Ok(());
    }

    // A candidate that passed validation is necessarily present.
    let Some(message) = message else {
        return Ok(());
    };

    let timestamp = message.date.with_timezone(&Utc);
    let quotes = vec![
        Quote::buy(message.instrument.clone(), message.bid, timestamp),
        Quote::sell(message.instrument, message.ask, timestamp),
    ];

    dispatcher
        .dispatch(quotes, &context)
        .await
        .map_err(|e| DeliveryError(e.to_string()))
}

//! Spot Quote Feed Adapter
//!
//! Obtains its subscription from a shared [`SubscriberFactory`]; retry,
//! acknowledgement, and dead-lettering belong to the factory's subscription,
//! not to this adapter. One valid message maps to one canonical quote.
//!
//! Failure policy: validation failures are logged and the message dropped,
//! but a dispatch failure on a valid quote is logged and re-raised so the
//! owning subscription's redelivery policy can act on it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{
    DeliveryError, FeedError, ManagedSubscription, MessageHandler, QuoteProcessor, QuoteSource,
    RawPayload, SubscriberFactory,
};
use crate::application::services::dispatcher::{DispatchFailurePolicy, QuoteDispatcher};
use crate::domain::quote::Quote;
use crate::infrastructure::config::ConnectionString;
use crate::infrastructure::feeds::messages::SpotQuoteMessage;
use crate::infrastructure::feeds::validation;

/// Settings for the spot feed subscription.
#[derive(Debug, Clone)]
pub struct SpotFeedSettings {
    /// Broker connection target.
    pub connection: ConnectionString,
    /// Logical exchange namespace the factory subscribes under.
    pub namespace: String,
    /// Source name within the namespace.
    pub source: String,
}

/// Quote source consuming the single-sided spot feed.
pub struct SpotQuoteFeed {
    settings: SpotFeedSettings,
    factory: Arc<dyn SubscriberFactory>,
    dispatcher: Arc<QuoteDispatcher>,
    subscription: Option<Box<dyn ManagedSubscription>>,
}

impl SpotQuoteFeed {
    /// Create the feed. The dispatch policy is fixed to log-and-propagate.
    pub fn new(
        settings: SpotFeedSettings,
        factory: Arc<dyn SubscriberFactory>,
        processor: Arc<dyn QuoteProcessor>,
    ) -> Self {
        Self {
            settings,
            factory,
            dispatcher: Arc::new(QuoteDispatcher::new(
                processor,
                DispatchFailurePolicy::PropagateOnFailure,
            )),
            subscription: None,
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
impl QuoteSource for SpotQuoteFeed {
    async fn start(&mut self) -> Result<(), FeedError> {
        let subscription = self
            .factory
            .create(
                self.settings.connection.as_str(),
                &self.settings.namespace,
                &self.settings.source,
                self.handler(),
            )
            .await?;

        tracing::info!(
            namespace = %self.settings.namespace,
            source = %self.settings.source,
            "Spot quote feed started"
        );
        self.subscription = Some(subscription);
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop().await;
            tracing::info!("Spot quote feed stopped");
        }
    }
}

async fn handle_message(
    dispatcher: &QuoteDispatcher,
    payload: &[u8],
) -> Result<(), DeliveryError> {
    let context = String::from_utf8_lossy(payload);

    let message = match serde_json::from_slice::<Option<SpotQuoteMessage>>(payload) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                context = %context,
                error = %e,
                "Dropping undecodable spot quote message"
            );
            return Ok(());
        }
    };

    let violations = validation::validate_spot(message.as_ref());
    if !violations.is_empty() {
        tracing::warn!(
            context = %context,
            violations = %violations.join("; "),
            "Dropping invalid spot quote message"
        );
        return Ok(());
    }

    // A candidate that passed validation is necessarily present.
    let Some(message) = message else {
        return Ok(());
    };

    let quote = Quote {
        asset_pair: message.asset_pair,
        is_buy: message.is_buy,
        price: message.price,
        timestamp: message.timestamp.with_timezone(&Utc),
    };

    dispatcher
        .dispatch(vec![quote], &context)
        .await
        .map_err(|e| DeliveryError(e.to_string()))
}

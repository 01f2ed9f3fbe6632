//! Ingestion Dispatcher
//!
//! Terminal step of every feed adapter: forward validated quotes to the
//! aggregation engine. The two feeds diverge in how a processing failure is
//! handled, and that divergence is explicit configuration here rather than
//! ad-hoc exception handling in each adapter.

use std::sync::Arc;

use crate::application::ports::{ProcessQuoteError, QuoteProcessor};
use crate::domain::quote::Quote;

/// What to do when the aggregation engine fails on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFailurePolicy {
    /// Log the failure and continue with the remaining quotes. The delivery
    /// is still considered handled; the message is not redelivered.
    ContinueOnFailure,

    /// Log a warning and propagate the failure to the caller, so the owning
    /// subscription's redelivery/dead-letter policy governs the outcome.
    PropagateOnFailure,
}

/// A quote was dispatched but the aggregation engine failed on it.
#[derive(Debug, thiserror::Error)]
#[error("dispatch failed for '{asset_pair}': {source}")]
pub struct DispatchError {
    /// Instrument of the failed quote.
    pub asset_pair: String,
    /// Engine-reported failure.
    #[source]
    pub source: ProcessQuoteError,
}

/// Forwards validated quotes to the aggregation engine, applying the
/// configured failure policy.
pub struct QuoteDispatcher {
    processor: Arc<dyn QuoteProcessor>,
    policy: DispatchFailurePolicy,
}

impl QuoteDispatcher {
    /// Create a dispatcher with the given failure policy.
    pub fn new(processor: Arc<dyn QuoteProcessor>, policy: DispatchFailurePolicy) -> Self {
        Self { processor, policy }
    }

    /// The configured failure policy.
    #[must_use]
    pub const fn policy(&self) -> DispatchFailurePolicy {
        self.policy
    }

    /// Dispatch quotes sequentially.
    ///
    /// Under [`DispatchFailurePolicy::ContinueOnFailure`] every quote is
    /// attempted and the call always succeeds. Under
    /// [`DispatchFailurePolicy::PropagateOnFailure`] the first failure is
    /// returned and the remaining quotes are not attempted.
    ///
    /// `context` is the raw source payload, carried into the logs.
    pub async fn dispatch(
        &self,
        quotes: Vec<Quote>,
        context: &str,
    ) -> Result<(), DispatchError> {
        for quote in quotes {
            let asset_pair = quote.asset_pair.clone();
            if let Err(e) = self.processor.process_quote(quote).await {
                match self.policy {
                    DispatchFailurePolicy::ContinueOnFailure => {
                        tracing::error!(
                            asset_pair = %asset_pair,
                            context = %context,
                            error = %e,
                            "Failed to process quote"
                        );
                    }
                    DispatchFailurePolicy::PropagateOnFailure => {
                        tracing::warn!(
                            asset_pair = %asset_pair,
                            context = %context,
                            "Failed to process quote"
                        );
                        return Err(DispatchError {
                            asset_pair,
                            source: e,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockQuoteProcessor;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn quote(asset_pair: &str) -> Quote {
        Quote::buy(asset_pair.to_string(), Decimal::ONE, Utc::now())
    }

    #[tokio::test]
    async fn continue_policy_attempts_every_quote() {
        let mut processor = MockQuoteProcessor::new();
        processor
            .expect_process_quote()
            .times(2)
            .returning(|_| Err(ProcessQuoteError("engine down".to_string())));

        let dispatcher = QuoteDispatcher::new(
            Arc::new(processor),
            DispatchFailurePolicy::ContinueOnFailure,
        );

        let result = dispatcher
            .dispatch(vec![quote("EURUSD"), quote("GBPUSD")], "{}")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn propagate_policy_stops_at_first_failure() {
        let mut processor = MockQuoteProcessor::new();
        processor
            .expect_process_quote()
            .times(1)
            .returning(|_| Err(ProcessQuoteError("engine down".to_string())));

        let dispatcher = QuoteDispatcher::new(
            Arc::new(processor),
            DispatchFailurePolicy::PropagateOnFailure,
        );

        let result = dispatcher
            .dispatch(vec![quote("EURUSD"), quote("GBPUSD")], "{}")
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.asset_pair, "EURUSD");
    }

    #[tokio::test]
    async fn success_dispatches_in_order() {
        let mut processor = MockQuoteProcessor::new();
        processor
            .expect_process_quote()
            .times(2)
            .returning(|_| Ok(()));

        let dispatcher = QuoteDispatcher::new(
            Arc::new(processor),
            DispatchFailurePolicy::PropagateOnFailure,
        );

        let result = dispatcher
            .dispatch(vec![quote("EURUSD"), quote("GBPUSD")], "{}")
            .await;

        assert!(result.is_ok());
    }
}

//! Query-side event consumer.
//!
//! Subscribes to the account topics, hands each delivery to the projection,
//! and acknowledges it once the read model has absorbed it. A projection
//! failure leaves the delivery unacknowledged so the substrate redelivers
//! it later.

use ledgerbank_core::bus::EventSubscription;
use ledgerbank_core::error::DomainError;

use crate::application::projections::AccountProjection;

/// Drives a subscription into the account projection.
pub struct AccountEventConsumer {
    projection: AccountProjection,
}

impl AccountEventConsumer {
    /// Creates a consumer feeding `projection`.
    #[must_use]
    pub fn new(projection: AccountProjection) -> Self {
        Self { projection }
    }

    /// Consumes deliveries until the subscription ends.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the subscription itself
    /// fails; projection failures are logged and the delivery is left
    /// unacknowledged.
    pub async fn run<S: EventSubscription>(&self, mut subscription: S) -> Result<(), DomainError> {
        while let Some(delivery) = subscription.next().await? {
            match self.projection.on_event(&delivery.event).await {
                Ok(()) => subscription.ack(&delivery).await?,
                Err(err) => {
                    tracing::error!(
                        topic = %delivery.topic,
                        aggregate_id = %delivery.event.aggregate_id,
                        version = delivery.event.version,
                        error = %err,
                        "projection failed, leaving delivery unacknowledged"
                    );
                }
            }
        }
        Ok(())
    }
}

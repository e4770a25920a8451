use async_trait::async_trait;

use crate::domain::error::DomainError;

/// Payment authorization created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    /// Opaque secret the client uses to confirm the charge.
    pub client_secret: String,
}

/// Transport-agnostic port to the external payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a card payment intent for `amount` in the smallest currency unit.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError>;
}

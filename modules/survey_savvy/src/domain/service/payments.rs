use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::db_err;
use crate::contract::model::{NewPayment, Payment};
use crate::domain::error::DomainError;
use crate::domain::ports::PaymentProvider;
use crate::domain::repo::PaymentsRepository;

/// Payment intents through the provider plus the payment ledger.
#[derive(Clone)]
pub struct PaymentService {
    repo: Arc<dyn PaymentsRepository>,
    provider: Arc<dyn PaymentProvider>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        repo: Arc<dyn PaymentsRepository>,
        provider: Arc<dyn PaymentProvider>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            provider,
            currency: currency.into(),
        }
    }

    /// Returns the client secret of a new card payment intent for `price`.
    #[instrument(name = "survey_savvy.service.create_payment_intent", skip(self))]
    pub async fn create_payment_intent(&self, price: f64) -> Result<String, DomainError> {
        let amount = to_minor_units(price)?;
        info!(amount, currency = %self.currency, "Creating payment intent");
        let intent = self
            .provider
            .create_payment_intent(amount, &self.currency)
            .await?;
        debug!(intent_id = %intent.id, "Payment intent created");
        Ok(intent.client_secret)
    }

    #[instrument(name = "survey_savvy.service.record_payment", skip_all)]
    pub async fn record_payment(&self, new_payment: NewPayment) -> Result<Uuid, DomainError> {
        info!("Recording payment");
        let payment = Payment {
            id: Uuid::new_v4(),
            email: new_payment.email,
            price: new_payment.price,
            transaction_id: new_payment.transaction_id,
            date: new_payment.date,
            survey_id: new_payment.survey_id,
            attributes: new_payment.attributes,
            created_at: Utc::now(),
        };
        let id = payment.id;
        self.repo.insert(payment).await.map_err(db_err)?;
        info!("Successfully recorded payment with id={}", id);
        Ok(id)
    }

    #[instrument(name = "survey_savvy.service.list_payments", skip(self))]
    pub async fn list_payments(&self) -> Result<Vec<Payment>, DomainError> {
        debug!("Listing payments");
        self.repo.list_all().await.map_err(db_err)
    }
}

/// Convert a price in currency units into the smallest unit, truncating.
///
/// Works on the decimal rendering of `price`, so `19.99` becomes `1999`.
pub fn to_minor_units(price: f64) -> Result<i64, DomainError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(DomainError::validation("price", "must be a positive amount"));
    }
    let out_of_range = || DomainError::validation("price", "amount is out of range");
    let minor = Decimal::from_str(&price.to_string())
        .map_err(|_| out_of_range())?
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(out_of_range)?
        .trunc()
        .to_i64()
        .ok_or_else(out_of_range)?;
    if minor < 1 {
        return Err(DomainError::validation(
            "price",
            "amount is below the smallest currency unit",
        ));
    }
    Ok(minor)
}

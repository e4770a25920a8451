use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::ports::{PaymentIntent, PaymentProvider};

/// HTTP adapter for the Stripe payment intents API.
pub struct StripePaymentProvider {
    client: reqwest::Client,
    api_base: Url,
    secret_key: String,
}

#[derive(Deserialize)]
struct IntentBody {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripePaymentProvider {
    pub fn new(
        api_base_url: &str,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let api_base = Url::parse(api_base_url)
            .with_context(|| format!("invalid payments api_base_url '{api_base_url}'"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build payments HTTP client")?;
        Ok(Self {
            client,
            api_base,
            secret_key: secret_key.into(),
        })
    }

    fn intents_url(&self) -> Result<Url, DomainError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::payment_provider("invalid payments base URL"))?
            .pop_if_empty()
            .extend(&["v1", "payment_intents"]);
        Ok(url)
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentProvider {
    #[instrument(
        name = "survey_savvy.http.stripe.create_payment_intent",
        skip_all,
        fields(api_base = %self.api_base, amount = amount, currency = %currency)
    )]
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError> {
        let url = self.intents_url()?;
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                DomainError::payment_provider(format!("POST /v1/payment_intents: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_default();
            warn!(status = status.as_u16(), detail = %detail, "Payment intent rejected");
            return Err(DomainError::payment_provider(format!("HTTP {status}")));
        }

        let body: IntentBody = response
            .json()
            .await
            .map_err(|e| DomainError::payment_provider(format!("unexpected response: {e}")))?;

        Ok(PaymentIntent {
            id: body.id,
            client_secret: body.client_secret,
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::api::rest::routes::{register_routes, RestState};
use crate::config::SurveySavvyConfig;
use crate::domain::ports::PaymentProvider;
use crate::domain::service::{AccountService, PaymentService, SurveyService};
use crate::domain::token::TokenAuthority;
use crate::infra::payments::StripePaymentProvider;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{
    SeaOrmAccountsRepository, SeaOrmPaymentsRepository, SeaOrmSurveysRepository,
};

/// Wired survey_savvy module: services over SeaORM repositories plus the REST surface.
#[derive(Clone)]
pub struct SurveySavvy {
    state: RestState,
}

impl SurveySavvy {
    /// Build the module with the Stripe payment provider from `cfg.payments`.
    pub fn init(db: DatabaseConnection, cfg: &SurveySavvyConfig) -> anyhow::Result<Self> {
        if cfg.payments.secret_key.trim().is_empty() {
            warn!("modules.survey_savvy.payments.secret_key is empty; payment intents will be rejected by the provider");
        }
        let provider = StripePaymentProvider::new(
            &cfg.payments.api_base_url,
            cfg.payments.secret_key.clone(),
            Duration::from_secs(cfg.payments.timeout_secs),
        )
        .context("failed to build payment provider")?;
        Self::with_provider(db, cfg, Arc::new(provider))
    }

    /// Build the module around an explicit payment provider.
    pub fn with_provider(
        db: DatabaseConnection,
        cfg: &SurveySavvyConfig,
        provider: Arc<dyn PaymentProvider>,
    ) -> anyhow::Result<Self> {
        if cfg.auth.token_secret.trim().is_empty() {
            bail!("modules.survey_savvy.auth.token_secret must be set");
        }
        if cfg.auth.token_ttl_secs <= 0 {
            bail!("modules.survey_savvy.auth.token_ttl_secs must be positive");
        }

        let accounts = AccountService::new(Arc::new(SeaOrmAccountsRepository::new(db.clone())));
        let surveys = SurveyService::new(Arc::new(SeaOrmSurveysRepository::new(db.clone())));
        let payments = PaymentService::new(
            Arc::new(SeaOrmPaymentsRepository::new(db)),
            provider,
            cfg.payments.currency.clone(),
        );
        let tokens = TokenAuthority::new(&cfg.auth.token_secret, cfg.auth.token_ttl_secs);

        info!(
            currency = %cfg.payments.currency,
            token_ttl_secs = cfg.auth.token_ttl_secs,
            "survey_savvy module initialized"
        );

        Ok(Self {
            state: RestState {
                accounts: Arc::new(accounts),
                surveys: Arc::new(surveys),
                payments: Arc::new(payments),
                tokens: Arc::new(tokens),
            },
        })
    }

    /// Apply all pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        Migrator::up(db, None)
            .await
            .context("survey_savvy migrations failed")?;
        info!("survey_savvy migrations applied");
        Ok(())
    }

    /// Add the module's routes to `router`.
    pub fn register_rest(&self, router: Router) -> Router {
        register_routes(router, &self.state)
    }

    pub fn accounts(&self) -> &AccountService {
        &self.state.accounts
    }

    pub fn surveys(&self) -> &SurveyService {
        &self.state.surveys
    }

    pub fn payments(&self) -> &PaymentService {
        &self.state.payments
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.state.tokens
    }
}

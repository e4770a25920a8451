use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Account, Payment, Role, Survey, SurveyUpdate, UpdateOutcome};

/// Persistence port for accounts.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Every account, oldest first.
    async fn list_all(&self) -> anyhow::Result<Vec<Account>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    /// Insert a fully-formed account.
    ///
    /// Service computes id/timestamps/validation; repo persists.
    async fn insert(&self, account: Account) -> anyhow::Result<()>;
    /// Overwrite the role. Returns true if a row was updated.
    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<bool>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Persistence port for surveys and their appended records.
#[async_trait]
pub trait SurveysRepository: Send + Sync {
    /// Every survey with its voters, comments and reports in append order.
    async fn list_all(&self) -> anyhow::Result<Vec<Survey>>;
    async fn insert(&self, survey: Survey) -> anyhow::Result<()>;
    /// Apply scalar assignments and list appends atomically.
    async fn apply_update(&self, id: Uuid, update: SurveyUpdate) -> anyhow::Result<UpdateOutcome>;
}

/// Persistence port for payment records.
#[async_trait]
pub trait PaymentsRepository: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<Payment>>;
    async fn insert(&self, payment: Payment) -> anyhow::Result<()>;
}

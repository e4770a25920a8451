use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::db_err;
use crate::contract::model::{Account, AccountCreation, Identity, NewAccount, Role, UpdateOutcome};
use crate::domain::error::DomainError;
use crate::domain::repo::AccountsRepository;

/// Account store and the admin check built on it.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn AccountsRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountsRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "survey_savvy.service.list_accounts", skip(self))]
    pub async fn list_accounts(&self) -> Result<Vec<Account>, DomainError> {
        debug!("Listing accounts");
        let accounts = self.repo.list_all().await.map_err(db_err)?;
        debug!("Listed {} accounts", accounts.len());
        Ok(accounts)
    }

    /// Create the account unless one already exists for the email.
    #[instrument(
        name = "survey_savvy.service.create_account",
        skip(self, new_account),
        fields(email = %new_account.email)
    )]
    pub async fn create_account(
        &self,
        new_account: NewAccount,
    ) -> Result<AccountCreation, DomainError> {
        info!("Creating account");
        validate_email(&new_account.email)?;

        if self
            .repo
            .find_by_email(&new_account.email)
            .await
            .map_err(db_err)?
            .is_some()
        {
            debug!("Account already exists");
            return Ok(AccountCreation::AlreadyExists);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: new_account.email,
            name: new_account.name,
            image: new_account.image,
            role: Role::Default,
            created_at: Utc::now(),
        };
        let id = account.id;
        let email = account.email.clone();

        if let Err(e) = self.repo.insert(account).await {
            // A concurrent create for the same email trips the unique index.
            if self
                .repo
                .find_by_email(&email)
                .await
                .map_err(db_err)?
                .is_some()
            {
                warn!("Account was created concurrently");
                return Ok(AccountCreation::AlreadyExists);
            }
            return Err(db_err(e));
        }

        info!("Successfully created account with id={}", id);
        Ok(AccountCreation::Created(id))
    }

    /// Role lookup restricted to the caller's own account.
    #[instrument(
        name = "survey_savvy.service.role_of",
        skip(self, caller, email),
        fields(email = %email)
    )]
    pub async fn role_of(&self, caller: &Identity, email: &str) -> Result<Role, DomainError> {
        debug!("Looking up role");
        if caller.email.as_deref() != Some(email) {
            return Err(DomainError::Forbidden);
        }
        let account = self
            .repo
            .find_by_email(email)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::account_not_found(email))?;
        Ok(account.role)
    }

    #[instrument(
        name = "survey_savvy.service.set_role",
        skip(self, id, role),
        fields(account_id = %id, role = %role)
    )]
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<UpdateOutcome, DomainError> {
        info!("Setting account role");
        let Some(current) = self.repo.find_by_id(id).await.map_err(db_err)? else {
            debug!("No account matched");
            return Ok(UpdateOutcome::unmatched());
        };
        if current.role == role {
            return Ok(UpdateOutcome::matched(false));
        }
        let updated = self.repo.update_role(id, role).await.map_err(db_err)?;
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(updated),
        })
    }

    /// Returns the number of deleted accounts (0 or 1).
    #[instrument(
        name = "survey_savvy.service.delete_account",
        skip(self, id),
        fields(account_id = %id)
    )]
    pub async fn delete_account(&self, id: Uuid) -> Result<u64, DomainError> {
        info!("Deleting account");
        let deleted = self.repo.delete(id).await.map_err(db_err)?;
        Ok(u64::from(deleted))
    }

    /// Allow only callers whose account has the admin role.
    #[instrument(name = "survey_savvy.service.require_admin", skip_all)]
    pub async fn require_admin(&self, caller: &Identity) -> Result<(), DomainError> {
        let Some(email) = caller.email.as_deref() else {
            debug!("Identity carries no email");
            return Err(DomainError::Forbidden);
        };
        match self.repo.find_by_email(email).await.map_err(db_err)? {
            Some(account) if account.role == Role::Admin => Ok(()),
            _ => {
                debug!(email = %email, "Caller is not an admin");
                Err(DomainError::Forbidden)
            }
        }
    }
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::validation("email", "must not be empty"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("email", "must contain '@'"));
    }
    Ok(())
}

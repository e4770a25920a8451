use std::sync::Arc;

use api_ingress::error::AppError;
use axum::{extract::Path, response::Json, Extension};
use tracing::{error, info};

use crate::api::rest::dto::{
    AccountDto, ClientSecretDto, CreateAccountReq, CreatePaymentReq, CreateSurveyReq,
    DeleteResultDto, InsertResultDto, PaymentDto, PaymentIntentReq, RoleDto, SetRoleReq,
    SurveyDto, SurveyPatchReq, TokenDto, TokenReq, UpdateResultDto,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::extract::JsonBody;
use crate::contract::model::{AccountCreation, Identity, Role};
use crate::domain::error::DomainError;
use crate::domain::service::{parse_id, AccountService, PaymentService, SurveyService};
use crate::domain::token::TokenAuthority;

type ApiResult<T> = Result<T, AppError>;

/// Liveness text for the root path
pub async fn root() -> &'static str {
    "survey savvy server is running"
}

/// Issue a bearer token for the posted identity
pub async fn issue_token(
    Extension(tokens): Extension<Arc<TokenAuthority>>,
    JsonBody(req): JsonBody<TokenReq>,
) -> ApiResult<Json<TokenDto>> {
    let identity = Identity::from(req);
    match tokens.issue(&identity) {
        Ok(token) => Ok(Json(TokenDto { token })),
        Err(e) => {
            error!("Failed to issue token: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// List all accounts
pub async fn list_accounts(
    Extension(svc): Extension<Arc<AccountService>>,
) -> ApiResult<Json<Vec<AccountDto>>> {
    match svc.list_accounts().await {
        Ok(accounts) => Ok(Json(accounts.into_iter().map(AccountDto::from).collect())),
        Err(e) => {
            error!("Failed to list accounts: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// Create an account unless one exists for the email
pub async fn create_account(
    Extension(svc): Extension<Arc<AccountService>>,
    JsonBody(req): JsonBody<CreateAccountReq>,
) -> ApiResult<Json<InsertResultDto>> {
    info!("Creating account for {}", req.email);

    match svc.create_account(req.into()).await {
        Ok(AccountCreation::Created(id)) => Ok(Json(InsertResultDto::inserted(id))),
        Ok(AccountCreation::AlreadyExists) => {
            Ok(Json(InsertResultDto::skipped("user already exists")))
        }
        Err(e) => {
            error!("Failed to create account: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// Role of the caller's own account
pub async fn get_role(
    Extension(svc): Extension<Arc<AccountService>>,
    Extension(caller): Extension<Identity>,
    Path(email): Path<String>,
) -> ApiResult<Json<RoleDto>> {
    match svc.role_of(&caller, &email).await {
        Ok(role) => Ok(Json(RoleDto {
            role: role.to_string(),
        })),
        Err(e) => Err(map_domain_error(e)),
    }
}

/// Overwrite the role of an account
pub async fn set_role(
    Extension(svc): Extension<Arc<AccountService>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SetRoleReq>,
) -> ApiResult<Json<UpdateResultDto>> {
    let id = parse_id(&id).map_err(map_domain_error)?;
    let role = req
        .role
        .parse::<Role>()
        .map_err(|e| map_domain_error(DomainError::validation("role", e.to_string())))?;
    info!("Setting role of account {} to {}", id, role);

    match svc.set_role(id, role).await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) => {
            error!("Failed to set role of account {}: {}", id, e);
            Err(map_domain_error(e))
        }
    }
}

/// Delete an account by id
pub async fn delete_account(
    Extension(svc): Extension<Arc<AccountService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResultDto>> {
    let id = parse_id(&id).map_err(map_domain_error)?;
    info!("Deleting account {}", id);

    match svc.delete_account(id).await {
        Ok(deleted) => Ok(Json(DeleteResultDto::new(deleted))),
        Err(e) => {
            error!("Failed to delete account {}: {}", id, e);
            Err(map_domain_error(e))
        }
    }
}

/// List all surveys
pub async fn list_surveys(
    Extension(svc): Extension<Arc<SurveyService>>,
) -> ApiResult<Json<Vec<SurveyDto>>> {
    match svc.list_surveys().await {
        Ok(surveys) => Ok(Json(surveys.into_iter().map(SurveyDto::from).collect())),
        Err(e) => {
            error!("Failed to list surveys: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// Create a survey
pub async fn create_survey(
    Extension(svc): Extension<Arc<SurveyService>>,
    JsonBody(req): JsonBody<CreateSurveyReq>,
) -> ApiResult<Json<InsertResultDto>> {
    match svc.create_survey(req.into()).await {
        Ok(id) => Ok(Json(InsertResultDto::inserted(id))),
        Err(e) => {
            error!("Failed to create survey: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// Apply a sparse update to a survey
pub async fn update_survey(
    Extension(svc): Extension<Arc<SurveyService>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SurveyPatchReq>,
) -> ApiResult<Json<UpdateResultDto>> {
    let id = parse_id(&id).map_err(map_domain_error)?;

    match svc.update_survey(id, req.into()).await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) => {
            error!("Failed to update survey {}: {}", id, e);
            Err(map_domain_error(e))
        }
    }
}

/// Create a card payment intent for the posted price
pub async fn create_payment_intent(
    Extension(svc): Extension<Arc<PaymentService>>,
    JsonBody(req): JsonBody<PaymentIntentReq>,
) -> ApiResult<Json<ClientSecretDto>> {
    match svc.create_payment_intent(req.price).await {
        Ok(client_secret) => Ok(Json(ClientSecretDto { client_secret })),
        Err(e) => Err(map_domain_error(e)),
    }
}

/// Record a completed payment
pub async fn record_payment(
    Extension(svc): Extension<Arc<PaymentService>>,
    JsonBody(req): JsonBody<CreatePaymentReq>,
) -> ApiResult<Json<InsertResultDto>> {
    match svc.record_payment(req.into()).await {
        Ok(id) => Ok(Json(InsertResultDto::inserted(id))),
        Err(e) => {
            error!("Failed to record payment: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// List all recorded payments
pub async fn list_payments(
    Extension(svc): Extension<Arc<PaymentService>>,
) -> ApiResult<Json<Vec<PaymentDto>>> {
    match svc.list_payments().await {
        Ok(payments) => Ok(Json(payments.into_iter().map(PaymentDto::from).collect())),
        Err(e) => {
            error!("Failed to list payments: {}", e);
            Err(map_domain_error(e))
        }
    }
}

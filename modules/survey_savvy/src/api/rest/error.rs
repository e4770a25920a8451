use api_ingress::error::AppError;

use crate::domain::error::DomainError;

/// Map domain error to the HTTP error type served by api_ingress.
pub fn map_domain_error(e: DomainError) -> AppError {
    match e {
        DomainError::MissingToken => AppError::Unauthorized("unauthorized access ".to_string()),
        DomainError::InvalidToken { reason } => {
            tracing::debug!(%reason, "token rejected");
            AppError::Unauthorized("unauthorized access".to_string())
        }
        DomainError::Forbidden => AppError::Forbidden("forbidden access".to_string()),
        DomainError::AccountNotFound { .. } => AppError::NotFound("user not found".to_string()),
        DomainError::InvalidId { value } => AppError::BadRequest(format!("invalid id '{value}'")),
        e @ DomainError::Validation { .. } => AppError::BadRequest(e.to_string()),
        DomainError::PaymentProvider { message } => {
            tracing::error!(%message, "payment provider call failed");
            AppError::BadGateway("payment provider error".to_string())
        }
        DomainError::TokenSigning { message } => {
            AppError::Internal(anyhow::anyhow!("token signing failed: {message}"))
        }
        DomainError::Database { message } => {
            AppError::Internal(anyhow::anyhow!("database error: {message}"))
        }
    }
}

use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Authorization header is missing")]
    MissingToken,

    #[error("Bearer token rejected: {reason}")]
    InvalidToken { reason: String },

    #[error("Caller is not allowed to perform this operation")]
    Forbidden,

    #[error("Account not found: {email}")]
    AccountNotFound { email: String },

    #[error("Invalid identifier: '{value}'")]
    InvalidId { value: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Payment provider error: {message}")]
    PaymentProvider { message: String },

    #[error("Token signing failed: {message}")]
    TokenSigning { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    pub fn account_not_found(email: impl Into<String>) -> Self {
        Self::AccountNotFound {
            email: email.into(),
        }
    }

    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        Self::PaymentProvider {
            message: message.into(),
        }
    }

    pub fn token_signing(message: impl Into<String>) -> Self {
        Self::TokenSigning {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

//! Request gates. Each one either forwards the request or answers it itself,
//! in which case no handler runs.

use std::sync::Arc;

use api_ingress::error::AppError;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::map_domain_error;
use crate::contract::model::Identity;
use crate::domain::service::AccountService;
use crate::domain::token::TokenAuthority;

/// Verify the bearer token and expose the decoded [`Identity`] to later layers.
pub async fn require_token(
    State(tokens): State<Arc<TokenAuthority>>,
    mut req: Request,
    next: Next,
) -> Response {
    // a header that is not valid UTF-8 counts as present but malformed
    let verdict = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => tokens.verify_header(Some(value.to_str().unwrap_or_default())),
        None => tokens.verify_header(None),
    };

    match verdict {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => map_domain_error(e).into_response(),
    }
}

/// Allow only callers whose account has the admin role. Must run after [`require_token`].
pub async fn require_admin(
    State(accounts): State<Arc<AccountService>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(identity) = req.extensions().get::<Identity>().cloned() else {
        return AppError::Unauthorized("unauthorized access".to_string()).into_response();
    };

    match accounts.require_admin(&identity).await {
        Ok(()) => next.run(req).await,
        Err(e) => map_domain_error(e).into_response(),
    }
}

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Router};

use crate::api::rest::{auth, handlers};
use crate::domain::service::{AccountService, PaymentService, SurveyService};
use crate::domain::token::TokenAuthority;

/// Everything the REST handlers and gates need.
#[derive(Clone)]
pub struct RestState {
    pub accounts: Arc<AccountService>,
    pub surveys: Arc<SurveyService>,
    pub payments: Arc<PaymentService>,
    pub tokens: Arc<TokenAuthority>,
}

/// Bind every route onto `router` with its gates.
///
/// `route_layer` calls stack outside-in, so on admin routes the last added
/// layer (the token gate) runs first.
pub fn register_routes(router: Router, state: &RestState) -> Router {
    let token = from_fn_with_state(state.tokens.clone(), auth::require_token);
    let admin = from_fn_with_state(state.accounts.clone(), auth::require_admin);

    router
        .route("/", get(handlers::root))
        .route("/jwt", post(handlers::issue_token))
        .route(
            "/users",
            get(handlers::list_accounts)
                .route_layer(token.clone())
                .merge(post(handlers::create_account)),
        )
        .route(
            "/users/role/{key}",
            get(handlers::get_role).route_layer(token.clone()).merge(
                patch(handlers::set_role)
                    .route_layer(admin.clone())
                    .route_layer(token.clone()),
            ),
        )
        .route(
            "/users/{id}",
            delete(handlers::delete_account)
                .route_layer(admin)
                .route_layer(token.clone()),
        )
        .route(
            "/surveys",
            get(handlers::list_surveys)
                .merge(post(handlers::create_survey).route_layer(token.clone())),
        )
        .route(
            "/surveys/{id}",
            patch(handlers::update_survey).route_layer(token.clone()),
        )
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route(
            "/payments",
            get(handlers::list_payments).merge(post(handlers::record_payment).route_layer(token)),
        )
        .layer(Extension(state.accounts.clone()))
        .layer(Extension(state.surveys.clone()))
        .layer(Extension(state.payments.clone()))
        .layer(Extension(state.tokens.clone()))
}

use api_ingress::error::AppError;
use axum::extract::FromRequest;

/// JSON body extractor whose rejection renders as an [`AppError`] (400, `bad_request`).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

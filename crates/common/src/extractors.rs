//! Custom axum extractors for Planpal

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::Error;

/// JSON extractor whose rejections use the common error envelope.
///
/// Malformed or mistyped bodies return 400 via `Error::MalformedUpdate`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

/// Rejection type for `JsonBody`
#[derive(Debug)]
pub struct JsonBodyRejection(JsonRejection);

impl IntoResponse for JsonBodyRejection {
    fn into_response(self) -> Response {
        Error::MalformedUpdate(self.0.body_text()).into_response()
    }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonBodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(JsonBodyRejection)?;
        Ok(JsonBody(value))
    }
}

//! JSON body extractor answering in the API envelope.

use crate::responses::AppError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use dianping_core::DianpingError;
use serde::de::DeserializeOwned;

/// Like [`Json`], but malformed bodies are rejected as a 400 with `errorMsg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T> std::ops::Deref for ApiJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                AppError(DianpingError::validation(format!(
                    "Invalid JSON: {}",
                    rejection.body_text()
                )))
            })?;
        Ok(ApiJson(value))
    }
}

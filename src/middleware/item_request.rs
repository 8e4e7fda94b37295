use axum::{
    Json,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};

use crate::error::TrackerError;
use crate::types::ItemDraft;

/// JSON item body that has already passed field validation.
///
/// Body rejections (bad JSON, wrong types, missing content type) are
/// reported as validation errors so clients see one error shape.
pub struct ValidItem(pub ItemDraft);

impl<S> FromRequest<S> for ValidItem
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(draft) = match Json::<ItemDraft>::from_request(req, state).await {
            Ok(v) => v,
            Err(rejection) => {
                return Err(TrackerError::Validation(rejection.body_text()).into_response());
            }
        };

        if let Err(e) = draft.validate() {
            return Err(e.into_response());
        }
        Ok(ValidItem(draft))
    }
}

//! Request body extraction.

use crate::model::RawPayload;
use crate::server::ApiFailure;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;

/// A decoded request body.
///
/// JSON content types are parsed as a JSON object; anything else is read as
/// a URL-encoded form. An empty body is an empty payload whatever its
/// content type. A body over the size limit is rejected with 413; any other
/// read failure with 400.
#[derive(Debug, Clone, Default)]
pub struct Payload(pub RawPayload);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_json_content_type);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiFailure::payload_too_large(rejection.body_text())
                } else {
                    ApiFailure::invalid_payload(rejection.body_text())
                }
            })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(RawPayload::new()));
        }

        if json {
            RawPayload::from_json(&body)
                .map(Self)
                .map_err(|err| ApiFailure::invalid_payload(err.to_string()))
        } else {
            Ok(Self(RawPayload::from_form(&body)))
        }
    }
}

/// `application/json` or any `+json` media type, parameters ignored.
#[must_use]
pub fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

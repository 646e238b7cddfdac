use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::api::{ApiEnvelope, RateLimitInfo};
use crate::error::ClientError;

/// Map a transport failure to a `Network` error.
pub fn classify_transport(error: &reqwest::Error) -> ClientError {
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        format!("request failed: {error}")
    };
    ClientError::network(message)
}

/// Turn one HTTP response into a successful envelope or a classified error.
///
/// Rate-limit headers are attached to every error produced here.
pub fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ApiEnvelope, ClientError> {
    let rate_limit = RateLimitInfo::from_headers(headers);
    let attach = |error: ClientError| match rate_limit.clone() {
        Some(info) => error.with_rate_limit(info),
        None => error,
    };
    let envelope = serde_json::from_slice::<ApiEnvelope>(body).ok();
    let code = i64::from(status.as_u16());

    if status == StatusCode::TOO_MANY_REQUESTS {
        let description = envelope.as_ref().and_then(|e| e.description.clone());
        let retry_after = crate::api::parse_retry_after(headers);
        return Err(attach(
            ClientError::rate_limit("rate limit exceeded", retry_after)
                .with_description(description),
        ));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let description = envelope.as_ref().and_then(|e| e.description.clone());
        return Err(attach(
            ClientError::auth(code, "authentication failed").with_description(description),
        ));
    }
    if !status.is_success() {
        return Err(attach(match envelope {
            Some(envelope) => ClientError::api(
                envelope.error_code.unwrap_or(code),
                envelope.description_or("request failed").to_string(),
            ),
            None if status.is_server_error() => ClientError::api(code, "server error"),
            None => ClientError::api(code, "failed to parse response"),
        }));
    }

    let Some(envelope) = envelope else {
        return Err(attach(ClientError::api(code, "failed to parse response")));
    };
    if !envelope.ok {
        return Err(attach(classify_envelope(&envelope)));
    }
    Ok(envelope)
}

/// Classify an `ok: false` envelope by its `error_code`.
pub fn classify_envelope(envelope: &ApiEnvelope) -> ClientError {
    let description = envelope.description.clone();
    match envelope.error_code {
        Some(429) => {
            ClientError::rate_limit("rate limit exceeded", None).with_description(description)
        }
        Some(code @ (401 | 403)) => {
            ClientError::auth(code, "authentication failed").with_description(description)
        }
        code => ClientError::api(
            code.unwrap_or_default(),
            envelope.description_or("unknown Bot API error").to_string(),
        ),
    }
}

// src/submit/http.rs

//! Response handling for the solver endpoint.
//!
//! Success statuses pass through. Anything else becomes
//! [`SubmitError::Rejected`] carrying the remote message: the body's `error`
//! field when the body is a JSON object that has one, the raw text otherwise.
//! An empty or unreadable body falls back to the status's reason phrase.

use super::error::SubmitError;
use reqwest::StatusCode;
use std::fmt::Display;
use tracing::warn;

/// Checks the status of a solver response.
///
/// # Errors
/// [`SubmitError::Rejected`] for any non-success status.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SubmitError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = rejection_message(status, resp.text().await);
    Err(SubmitError::Rejected { status: status.as_u16(), message })
}

fn rejection_message<E: Display>(status: StatusCode, body: Result<String, E>) -> String {
    let reason = || status.canonical_reason().unwrap_or_default().to_string();
    match body {
        Ok(body) if body.trim().is_empty() => reason(),
        Ok(body) => error_message(&body),
        Err(err) => {
            warn!(status = status.as_u16(), error = %err, "failed to read rejection body");
            reason()
        }
    }
}

/// Reads a success body as JSON.
///
/// # Errors
/// [`SubmitError::Transport`] if the body cannot be read,
/// [`SubmitError::MalformedResponse`] if it is not JSON.
pub async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, SubmitError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|err| SubmitError::MalformedResponse { message: err.to_string() })
}

/// The `error` field of a JSON body, or the body itself.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(fields)) => match fields.get("error") {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(::http::Response::builder().status(status).body(body).unwrap())
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = check_response(mock_response(200, "{}")).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn rejection_carries_error_field() {
        let err = check_response(mock_response(400, r#"{"error": "Missing 'variables'"}"#))
            .await
            .unwrap_err();
        match err {
            SubmitError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing 'variables'");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_without_json_keeps_raw_text() {
        let err = check_response(mock_response(502, "Bad Gateway")).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Solver rejected the document (502): Bad Gateway");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_transport_failure() {
        let err = read_json(mock_response(200, "<html>")).await.unwrap_err();
        assert!(matches!(err, SubmitError::MalformedResponse { .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn success_body_is_returned_verbatim() {
        let value = read_json(mock_response(200, r#"{"qubo": {}, "offset": 1}"#)).await.unwrap();
        assert_eq!(value, serde_json::json!({"qubo": {}, "offset": 1}));
    }

    #[tokio::test]
    async fn empty_rejection_uses_reason_phrase() {
        let err = check_response(mock_response(503, "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Solver rejected the document (503): Service Unavailable");
    }

    #[test]
    fn unreadable_rejection_body_uses_reason_phrase() {
        let body: Result<String, &str> = Err("connection reset");
        assert_eq!(rejection_message(StatusCode::BAD_GATEWAY, body), "Bad Gateway");
        assert_eq!(rejection_message(StatusCode::from_u16(599).unwrap(), Err("eof")), "");
    }

    #[test]
    fn error_message_variants() {
        assert_eq!(error_message(r#"{"error": "boom"}"#), "boom");
        assert_eq!(error_message(r#"{"error": {"code": 3}}"#), r#"{"code":3}"#);
        assert_eq!(error_message(r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
        assert_eq!(error_message(""), "");
    }
}

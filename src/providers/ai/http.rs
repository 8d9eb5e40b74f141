//! HTTP plumbing shared by the LLM providers.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{LlmError, LlmResult};

/// `{"error": {...}}` body both supported APIs return on failure.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorDetail,
}

/// The interesting part of an API error body.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDetail {
    pub message: String,
    /// OpenAI sends a string here, Gemini a number.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    /// Gemini's canonical status, e.g. `UNAUTHENTICATED`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Decides whether an error response means the credential was rejected.
pub(super) type AuthCheck = fn(u16, &ApiErrorDetail) -> bool;

/// Posts `body` as JSON and decodes a successful response as `R`.
pub(super) async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    body: &B,
    is_auth_failure: AuthCheck,
) -> LlmResult<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    tracing::debug!(url, "LLM request");
    let response = client.post(url).headers(headers).json(body).send().await?;

    if !response.status().is_success() {
        let err = error_from_response(response, is_auth_failure).await;
        tracing::warn!(url, error = %err, "LLM request rejected");
        return Err(err);
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::InvalidResponse(format!("failed to decode response: {e}")))
}

async fn error_from_response(response: reqwest::Response, is_auth_failure: AuthCheck) -> LlmError {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return LlmError::RateLimited { retry_after_secs };
    }

    match response.json::<ErrorEnvelope>().await {
        Ok(body) if is_auth_failure(status, &body.error) => {
            LlmError::Authentication(body.error.message)
        }
        Ok(body) => LlmError::Api {
            status,
            message: body.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            message: format!("HTTP {status}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    fn never_auth(_: u16, _: &ApiErrorDetail) -> bool {
        false
    }

    #[test]
    fn error_detail_accepts_both_code_shapes() {
        let openai: ErrorEnvelope =
            serde_json::from_str(r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#)
                .unwrap();
        assert_eq!(openai.error.code, Some(serde_json::json!("invalid_api_key")));

        let gemini: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#,
        )
        .unwrap();
        assert_eq!(gemini.error.status.as_deref(), Some("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn success_is_decoded() {
        let server = StubServer::serve(vec![(200, r#"{"ok":true}"#)]).await;
        let client = reqwest::Client::new();

        let pong: Pong = post_json(
            &client,
            &format!("{}/ping", server.base_url),
            HeaderMap::new(),
            &serde_json::json!({"ping": 1}),
            never_auth,
        )
        .await
        .unwrap();

        assert!(pong.ok);
        assert!(server.requests()[0].contains(r#"{"ping":1}"#));
    }

    #[tokio::test]
    async fn unparseable_error_body_keeps_status() {
        let server = StubServer::serve(vec![(502, "<html>bad gateway</html>")]).await;
        let client = reqwest::Client::new();

        let result: LlmResult<Pong> = post_json(
            &client,
            &server.base_url,
            HeaderMap::new(),
            &serde_json::json!({}),
            never_auth,
        )
        .await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let server = StubServer::serve(vec![(429, r#"{"error":{"message":"slow down"}}"#)]).await;
        let client = reqwest::Client::new();

        let result: LlmResult<Pong> = post_json(
            &client,
            &server.base_url,
            HeaderMap::new(),
            &serde_json::json!({}),
            never_auth,
        )
        .await;

        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
    }
}

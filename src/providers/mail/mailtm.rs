//! mail.tm REST provider.
//!
//! Endpoints used:
//!
//! - `GET /domains`
//! - `POST /accounts`, `POST /token`
//! - `GET /messages`, `GET /messages/{id}`, `DELETE /messages/{id}` (bearer auth)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::traits::{Collection, MailError, MailProvider, Result};
use crate::domain::{Account, Domain, Message, MessageDetail, MessageId};

/// Default base URL for the mail.tm API.
pub const MAILTM_BASE_URL: &str = "https://api.mail.tm";

/// Credentials body shared by account creation and token requests.
#[derive(Debug, Serialize)]
struct Credentials<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Provider for the mail.tm disposable mail API.
#[derive(Debug, Clone)]
pub struct MailTmProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for MailTmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MailTmProvider {
    /// Creates a provider against the public mail.tm API.
    pub fn new() -> Self {
        Self::with_base_url(MAILTM_BASE_URL)
    }

    /// Creates a provider against a compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Overrides the HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| MailError::Network(format!("invalid token header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Sends a request, mapping transport failures to [`MailError::Network`].
    async fn send(&self, path: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        tracing::debug!(path, "mail.tm request");
        request.send().await.map_err(|e| {
            tracing::warn!(path, error = %e, "mail.tm request failed");
            MailError::Network(e.to_string())
        })
    }

    /// Decodes a successful JSON response; any other status is a network error.
    async fn read_json<T: for<'de> Deserialize<'de>>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "mail.tm returned an error status");
            return Err(MailError::Network(format!("{} returned {}", path, status)));
        }

        response
            .json()
            .await
            .map_err(|e| MailError::Network(format!("parse {} response: {}", path, e)))
    }

    async fn get_authorized<T: for<'de> Deserialize<'de>>(&self, path: &str, token: &str) -> Result<T> {
        let request = self
            .client
            .get(self.url(path))
            .headers(Self::auth_headers(token)?);
        let response = self.send(path, request).await?;
        Self::read_json(path, response).await
    }

    async fn post_credentials(
        &self,
        path: &str,
        address: &str,
        password: &str,
    ) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(self.url(path))
            .json(&Credentials { address, password });
        self.send(path, request).await
    }
}

#[async_trait]
impl MailProvider for MailTmProvider {
    async fn list_domains(&self) -> Result<Vec<Domain>> {
        let path = "/domains";
        let response = self.send(path, self.client.get(self.url(path))).await?;
        let collection: Collection<Domain> = Self::read_json(path, response).await?;
        Ok(collection.member)
    }

    async fn create_account(&self, address: &str, password: &str) -> Result<Account> {
        let path = "/accounts";
        let response = self.post_credentials(path, address, password).await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(address, status = status.as_u16(), "account creation rejected");
            return Err(MailError::ConflictOrUnavailable {
                status: status.as_u16(),
            });
        }

        Self::read_json(path, response).await
    }

    async fn obtain_token(&self, address: &str, password: &str) -> Result<String> {
        let path = "/token";
        let response = self.post_credentials(path, address, password).await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(address, status = status.as_u16(), "token request rejected");
            return Err(MailError::Authentication {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = Self::read_json(path, response).await?;
        Ok(body.token)
    }

    async fn list_messages(&self, token: &str) -> Result<Vec<Message>> {
        let collection: Collection<serde_json::Value> =
            self.get_authorized("/messages", token).await?;

        // One malformed entry must not hide the rest of the inbox.
        let messages = collection
            .member
            .into_iter()
            .filter_map(|raw| {
                serde_json::from_value::<Message>(raw)
                    .inspect_err(|e| tracing::warn!(error = %e, "skipping malformed message"))
                    .ok()
            })
            .collect();
        Ok(messages)
    }

    async fn get_message_detail(&self, id: &MessageId, token: &str) -> Result<MessageDetail> {
        self.get_authorized(&format!("/messages/{}", id), token).await
    }

    async fn delete_message(&self, id: &MessageId, token: &str) -> Result<bool> {
        let path = format!("/messages/{}", id);
        let request = self
            .client
            .delete(self.url(&path))
            .headers(Self::auth_headers(token)?);
        let response = self.send(&path, request).await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;

    const DOMAINS: &str = r#"{"hydra:member":[
        {"id":"d1","domain":"mail.com","isActive":true,"isPrivate":false},
        {"id":"d2","domain":"uni.edu","isActive":true,"isPrivate":false}
    ]}"#;

    const MESSAGES: &str = r#"{"hydra:member":[
        {"id":"m2","from":{"address":"b@x.com","name":"B"},"subject":"Second","intro":"..","seen":false,"createdAt":"2024-03-02T00:00:00+00:00"},
        {"id":"m1","from":{"address":"a@x.com","name":""},"subject":"First","intro":"..","seen":true,"createdAt":"2024-03-01T00:00:00+00:00"}
    ]}"#;

    #[test]
    fn trailing_slash_removal() {
        let provider = MailTmProvider::with_base_url("http://localhost:8080/");
        assert_eq!(provider.base_url(), "http://localhost:8080");
        assert_eq!(MailTmProvider::new().base_url(), MAILTM_BASE_URL);
    }

    #[test]
    fn credentials_serialization() {
        let json = serde_json::to_string(&Credentials {
            address: "janedoe@uni.edu",
            password: "pass42",
        })
        .unwrap();
        assert_eq!(json, r#"{"address":"janedoe@uni.edu","password":"pass42"}"#);
    }

    #[tokio::test]
    async fn list_domains_keeps_provider_order() {
        let server = StubServer::serve(vec![(200, DOMAINS)]).await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let domains = provider.list_domains().await.unwrap();
        let names: Vec<_> = domains.iter().map(|d| d.domain.as_str()).collect();
        assert_eq!(names, ["mail.com", "uni.edu"]);
        assert!(server.requests()[0].starts_with("GET /domains "));
    }

    #[tokio::test]
    async fn list_domains_error_status_is_network_error() {
        let server = StubServer::serve(vec![(503, "{}")]).await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let result = provider.list_domains().await;
        assert!(matches!(result, Err(MailError::Network(_))));
    }

    #[tokio::test]
    async fn create_account_rejection_is_conflict_or_unavailable() {
        let server = StubServer::serve(vec![(422, r#"{"detail":"address: This value is already used."}"#)]).await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let result = provider.create_account("taken@uni.edu", "pw").await;
        assert!(matches!(
            result,
            Err(MailError::ConflictOrUnavailable { status: 422 })
        ));

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /accounts "));
        assert!(request.contains(r#""address":"taken@uni.edu""#));
    }

    #[tokio::test]
    async fn obtain_token_success_and_failure() {
        let server = StubServer::serve(vec![
            (200, r#"{"id":"acc1","token":"jwt-123"}"#),
            (401, r#"{"code":401,"message":"Invalid credentials."}"#),
        ])
        .await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let token = provider.obtain_token("a@uni.edu", "pw").await.unwrap();
        assert_eq!(token, "jwt-123");

        let result = provider.obtain_token("a@uni.edu", "wrong").await;
        assert!(matches!(result, Err(MailError::Authentication { status: 401 })));
    }

    #[tokio::test]
    async fn list_messages_sends_bearer_token() {
        let server = StubServer::serve(vec![(200, MESSAGES)]).await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let messages = provider.list_messages("jwt-123").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, MessageId::from("m2"));

        let request = server.requests()[0].to_lowercase();
        assert!(request.starts_with("get /messages "));
        assert!(request.contains("authorization: bearer jwt-123"));
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let server = StubServer::serve(vec![(
            200,
            r#"{"hydra:member":[
                {"id":"m3","subject":"no sender"},
                {"id":"m2","from":{"address":"b@x.com"},"subject":"Odd date","createdAt":"yesterday"},
                {"id":"m1","from":{"address":"a@x.com"},"subject":"First","createdAt":"2024-03-01T00:00:00+00:00"}
            ]}"#,
        )])
        .await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let messages = provider.list_messages("jwt").await.unwrap();

        let ids: Vec<_> = messages.iter().map(|m| m.id.0.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(messages[0].created_at, chrono::DateTime::<chrono::Utc>::default());
    }

    #[tokio::test]
    async fn unauthorized_listing_is_network_error() {
        let server = StubServer::serve(vec![(401, r#"{"code":401}"#)]).await;
        let provider = MailTmProvider::with_base_url(&server.base_url);

        let result = provider.list_messages("expired").await;
        assert!(matches!(result, Err(MailError::Network(_))));
    }

    #[tokio::test]
    async fn message_detail_and_delete() {
        let server = StubServer::serve(vec![
            (
                200,
                r#"{"id":"m1","from":{"address":"a@x.com","name":"A"},"subject":"Hi","createdAt":"2024-03-01T00:00:00+00:00","text":"hello","html":[]}"#,
            ),
            (204, ""),
            (404, r#"{"code":404}"#),
        ])
        .await;
        let provider = MailTmProvider::with_base_url(&server.base_url);
        let id = MessageId::from("m1");

        let detail = provider.get_message_detail(&id, "tok").await.unwrap();
        assert_eq!(detail.text, "hello");

        assert!(provider.delete_message(&id, "tok").await.unwrap());
        assert!(!provider.delete_message(&id, "tok").await.unwrap());

        let requests = server.requests();
        assert!(requests[0].starts_with("GET /messages/m1 "));
        assert!(requests[1].starts_with("DELETE /messages/m1 "));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 on localhost is the discard service and is almost never open.
        let provider = MailTmProvider::with_base_url("http://127.0.0.1:9");
        let result = provider.list_domains().await;
        assert!(matches!(result, Err(MailError::Network(_))));
    }
}

use reqwest::{Client, Response};
use tracing::warn;

use crate::{prelude::*, Error};

/// Thin wrapper around a shared `reqwest::Client` bound to one endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub client: Client,
    pub base_url: String,
}

async fn parse_response(response: Response) -> Result<String> {
    let status_code = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| Error::GenericRequest(e.to_string()))?;

    if status_code < 400 {
        return Ok(text);
    }
    if (400..500).contains(&status_code) {
        return Err(Error::client_error(status_code, text));
    }
    Err(Error::server_error(status_code, text))
}

impl HttpClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// POST a JSON body to the endpoint. One request, no retries: the
    /// dispatcher's `RetryPolicy` decides whether a failure is tried again.
    pub async fn post_json(&self, body: String) -> Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::GenericRequest(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 429 {
            warn!(url = %self.base_url, "Endpoint rate limited the request");
        }
        parse_response(response).await
    }

    /// GET the endpoint as plain text.
    pub async fn get_text(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| Error::GenericRequest(e.to_string()))?;
        parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::stub_server::StubServer;
    use crate::HttpErrorKind;

    #[tokio::test]
    async fn test_post_json_sends_one_request() {
        let server = StubServer::start(vec![(503, "busy".into())]).await;
        let http = HttpClient::new(Client::new(), server.url());
        let err = http.post_json("{}".into()).await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 503, .. }));
        assert!(err.is_transient());
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_endpoint_hit_once_per_policy_attempt() {
        let server = StubServer::start(vec![(503, "busy".into())]).await;
        let http = HttpClient::new(Client::new(), server.url());
        let policy = RetryPolicy::new(3, 1, 1, 0.0);

        let (result, attempts) = policy
            .retry_async(|_| http.post_json("{}".to_string()), |e: &Error| e.is_transient())
            .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
        assert_eq!(server.request_count(), 3);
    }

    #[tokio::test]
    async fn test_client_error_keeps_body() {
        let server = StubServer::start(vec![(400, "bad params".into())]).await;
        let http = HttpClient::new(Client::new(), server.url());
        match http.post_json("{}".into()).await.unwrap_err() {
            Error::Http {
                status,
                kind: HttpErrorKind::Client { message },
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad params");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_text() {
        let server = StubServer::start(vec![(200, "h0,h1\neth,ABC".into())]).await;
        let http = HttpClient::new(Client::new(), server.url());
        assert_eq!(http.get_text().await.unwrap(), "h0,h1\neth,ABC");
    }
}

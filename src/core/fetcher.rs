use crate::domain::model::FetchOutcome;
use crate::domain::ports::Fetcher;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// GET-based fetcher; the timeout covers connect through the end of the body.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        tracing::debug!("GET {} (timeout {:?})", url, timeout);

        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        match response.status() {
            StatusCode::OK => match response.bytes().await {
                Ok(body) => FetchOutcome::Success(body.to_vec()),
                Err(e) => FetchOutcome::TransportError(e.to_string()),
            },
            StatusCode::NOT_FOUND => FetchOutcome::NotFound,
            status => FetchOutcome::HttpError(status.as_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/trip-data/a.parquet");
            then.status(200).body("PAR1payload");
        });

        let outcome = HttpFetcher::new()
            .fetch(&server.url("/trip-data/a.parquet"), TIMEOUT)
            .await;

        mock.assert();
        assert_eq!(outcome, FetchOutcome::Success(b"PAR1payload".to_vec()));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.parquet");
            then.status(404);
        });

        let outcome = HttpFetcher::new()
            .fetch(&server.url("/missing.parquet"), TIMEOUT)
            .await;
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_other_status_is_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/forbidden.parquet");
            then.status(403);
        });

        let outcome = HttpFetcher::new()
            .fetch(&server.url("/forbidden.parquet"), TIMEOUT)
            .await;
        assert_eq!(outcome, FetchOutcome::HttpError(403));
    }

    #[tokio::test]
    async fn test_fetch_non_200_success_is_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/partial.parquet");
            then.status(206).body("PAR1");
        });

        let outcome = HttpFetcher::new()
            .fetch(&server.url("/partial.parquet"), TIMEOUT)
            .await;
        assert_eq!(outcome, FetchOutcome::HttpError(206));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow.parquet");
            then.status(200).delay(Duration::from_millis(500)).body("late");
        });

        let outcome = HttpFetcher::new()
            .fetch(&server.url("/slow.parquet"), Duration::from_millis(50))
            .await;
        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let outcome = HttpFetcher::new()
            .fetch("http://127.0.0.1:1/a.parquet", TIMEOUT)
            .await;
        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
    }
}

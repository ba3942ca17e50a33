//! Crate-wide error type.
//!
//! Errors only travel through the collaborator adapters (chat model, search
//! engine, fetcher, embeddings) and the answer assistants. Inside the
//! retrieval pipeline they are logged and turned into "no evidence" outcomes,
//! so callers of [`Retriever::retrieve`](crate::retrieval::Retriever::retrieve)
//! never see them.

use std::time::Duration;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, reset...).
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The API returned a well-formed error payload.
    #[error("API error: {0}")]
    Api(String),

    /// A collaborator call exceeded its deadline.
    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Vector index ingest or query failure.
    #[error("vector index error: {0}")]
    Index(String),
}

impl Error {
    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Rate limits, server errors, network failures and timeouts are
    /// transient. Client errors (400/401/403/404/422), parse failures and
    /// configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http { status, .. } => *status == 429 || (500..=504).contains(status),
            Error::Request(_) | Error::Timeout(_) => true,
            Error::Parse(_) | Error::Api(_) | Error::Config(_) | Error::Index(_) => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Parse(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Run `fut` with a deadline, mapping expiry to [`Error::Timeout`].
pub async fn with_timeout<T>(
    limit: Duration,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = Error::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
    }

    #[test]
    fn permanent_statuses() {
        for status in [400, 401, 403, 404, 422] {
            let err = Error::Http {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "{status} should be permanent");
        }
        assert!(!Error::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn network_and_timeout_are_transient() {
        assert!(Error::Request("connection reset".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(5)).is_transient());
    }

    #[test]
    fn display_formats() {
        let err = Error::Http {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert_eq!(
            Error::Timeout(Duration::from_millis(1500)).to_string(),
            "timed out after 1.5s"
        );
    }

    #[tokio::test]
    async fn with_timeout_maps_expiry() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn with_timeout_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}

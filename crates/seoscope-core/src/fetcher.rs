//! Page fetching
//!
//! One bounded GET per invocation, redirects followed automatically, no
//! retries and no caching. Retry policy belongs to the caller.

use std::time::Duration;

/// Design default; analyses against slow origins fail rather than hang.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; seoscope/0.1; +https://github.com/seoscope/seoscope)";

/// Transport-level failure kinds, kept distinct so operators can tell a dead
/// origin from a slow one from an unhappy one.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("too many redirects while fetching {url}")]
    TooManyRedirects { url: String },

    #[error("server returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetch the raw HTML for a target URL.
pub async fn fetch_page(url: &str) -> Result<String, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

    tracing::debug!(url, "fetching page");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    response.text().await.map_err(|e| classify(url, e))
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_redirect() {
        FetchError::TooManyRedirects {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_url() {
        let err = FetchError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(err.to_string().contains("https://example.com"));

        let err = FetchError::HttpStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_error() {
        // Port 9 (discard) is not listening.
        let err = fetch_page("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}

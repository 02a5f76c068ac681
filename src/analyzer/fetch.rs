// src/analyzer/fetch.rs
// =============================================================================
// This module fetches pages and sitemaps over HTTP(S).
//
// Key functionality:
// - One shared reqwest Client (connection pooling is reqwest's business)
// - Per-request timeout and redirect limit taken from the CrawlConfig
// - Every failure is sorted into a FetchError kind: timeout, DNS, connection,
//   redirect loop, non-2xx status, non-HTML content
//
// Nothing here panics or aborts the crawl; the caller records the error.
// =============================================================================

use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use std::error::Error as StdError;
use tracing::debug;
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{ConfigError, FetchError};

/// A successful (2xx) response with its body read.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// Where the content was finally served from, after redirects
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

/// The HTTP capability used by the analyzer and the sitemap resolver.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// GET an HTML page. Non-2xx and non-HTML responses are errors, and their
    /// bodies are never downloaded.
    pub async fn fetch_html(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.get(url, true).await
    }

    /// GET any document (sitemaps are XML or plain text). Non-2xx is an error.
    pub async fn fetch_document(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.get(url, false).await
    }

    async fn get(&self, url: &Url, require_html: bool) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(%url, %final_url, status = status.as_u16(), "fetched");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        if require_html {
            if let Some(ct) = content_type.as_deref() {
                if !is_html_content_type(ct) {
                    return Err(FetchError::NotHtml {
                        content_type: ct.to_string(),
                    });
                }
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body {
                    message: error_chain(&e),
                }
            }
        })?;

        Ok(FetchedPage {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}

// Servers that send no content-type at all are given the benefit of the doubt
// by the caller; anything declared must be an HTML type.
fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - Connection refused / reset, TLS handshake failure
// - Too many redirects
fn categorize_error(error: reqwest::Error) -> FetchError {
    let message = error_chain(&error);

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        if looks_like_dns_failure(&message) {
            FetchError::Dns { message }
        } else {
            FetchError::Connect { message }
        }
    } else {
        FetchError::Other { message }
    }
}

// hyper reports resolver failures as connect errors; the only way to tell
// them apart is the wording of the underlying io error.
fn looks_like_dns_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("dns")
        || lower.contains("failed to lookup")
        || lower.contains("name or service not known")
        || lower.contains("nodename nor servname")
        || lower.contains("no such host")
}

// reqwest's Display only shows the outermost layer ("error sending request"),
// so the sources are joined to keep the useful part.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzeOptions;
    use mockito::Server;

    fn fetcher() -> Fetcher {
        let config =
            CrawlConfig::from_options("http://127.0.0.1/", None, AnalyzeOptions::default()).unwrap();
        Fetcher::new(&config).unwrap()
    }

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("Text/HTML; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("text/plain"));
    }

    #[test]
    fn test_dns_wording() {
        assert!(looks_like_dns_failure("error trying to connect: dns error: failed to lookup address"));
        assert!(!looks_like_dns_failure("error trying to connect: Connection refused"));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<title>Hi</title>")
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let page = fetcher().fetch_html(&url).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<title>Hi</title>");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_final_url_follows_redirects() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;
        let _m = server
            .mock("GET", "/new")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>moved</p>")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/old", server.url())).unwrap();
        let page = fetcher().fetch_html(&url).await.unwrap();
        assert_eq!(page.final_url.path(), "/new");
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let mut server = Server::new_async().await;
        let _m = server.mock("GET", "/missing").with_status(404).create_async().await;

        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetcher().fetch_html(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Status { status: 404 });
    }

    #[tokio::test]
    async fn test_non_html_content_is_rejected() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/file.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/file.pdf", server.url())).unwrap();
        let err = fetcher().fetch_html(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::NotHtml { .. }));

        // documents are accepted whatever their type
        let page = fetcher().fetch_document(&url).await.unwrap();
        assert_eq!(page.body, "%PDF-1.4");
    }

    #[tokio::test]
    async fn test_silent_server_is_timeout() {
        // Accepts connections (kernel backlog) but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/", silent.local_addr().unwrap())).unwrap();

        let options = AnalyzeOptions {
            request_timeout: std::time::Duration::from_millis(300),
            ..AnalyzeOptions::default()
        };
        let config = CrawlConfig::from_options("http://127.0.0.1/", None, options).unwrap();
        let fetcher = Fetcher::new(&config).unwrap();

        let err = fetcher.fetch_html(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout);
        drop(silent);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Grab a free port, then close it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetcher().fetch_html(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }), "got {:?}", err);
    }
}

//! # Spreadsheet download
//!
//! Retrieves the workbook bytes from the configured source. Remote sources
//! are fetched with a single blocking GET; local paths and `file://` URLs are
//! read from disk.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const SHAREPOINT_MARKER: &str = "sharepoint";
const DIRECT_DOWNLOAD_QUERY: &str = "?download=1";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No spreadsheet URL configured")]
    EmptyUrl,

    #[error("Failed to fetch data from '{url}': HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to fetch data from '{url}': {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No data from '{0}'")]
    NoData(String),
}

/// Rewrites SharePoint sharing links into their direct-download form: the
/// query string is dropped and `?download=1` appended. Other URLs are
/// returned unchanged.
pub fn normalize_url(url: &str) -> String {
    if url.to_lowercase().contains(SHAREPOINT_MARKER) {
        let base = url.split('?').next().unwrap_or(url);
        format!("{base}{DIRECT_DOWNLOAD_QUERY}")
    } else {
        url.to_owned()
    }
}

/// Checks if a source names a remote resource rather than a local file.
pub fn is_remote_url(source: &str) -> bool {
    match Url::parse(source) {
        Ok(url) => url.scheme() != "file",
        Err(_) => false,
    }
}

/// A source of spreadsheet bytes.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches over HTTP(S) with a request timeout; reads local paths from disk.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher { client })
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_owned(),
            source,
        };
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            })?;
        }
        let bytes = response.bytes().map_err(transport)?;
        Ok(bytes.to_vec())
    }

    fn fetch_local(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        let path = Url::parse(source)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(source));
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            Err(FetchError::EmptyUrl)?;
        }
        let target = normalize_url(url);
        let bytes = if is_remote_url(&target) {
            tracing::debug!(url = %target, "fetching spreadsheet");
            self.fetch_remote(&target)?
        } else {
            tracing::debug!(path = %target, "reading local spreadsheet");
            self.fetch_local(&target)?
        };
        if bytes.is_empty() {
            Err(FetchError::NoData(target))?;
        }
        tracing::debug!(bytes = bytes.len(), "spreadsheet fetched");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::thread::JoinHandle;

    /// Serves one HTTP response on a local port. The handle yields the
    /// request line the client sent.
    fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let Ok((mut socket, _peer)) = listener.accept() else {
                return String::new();
            };
            let mut buf = [0u8; 1024];
            let mut request = Vec::new();
            loop {
                match socket.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") || request.len() > 16 * 1024 {
                            break;
                        }
                    }
                }
            }
            let headers = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(headers.as_bytes());
            let _ = socket.write_all(body);
            let _ = socket.flush();
            String::from_utf8_lossy(&request).lines().next().unwrap_or_default().to_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn downloads_remote_bytes() {
        let (base, server) = serve_once("200 OK", b"PK\x03\x04workbook");
        let bytes = fetcher().fetch(&format!("{base}/files/plan.xlsx")).unwrap();
        assert_eq!(bytes, b"PK\x03\x04workbook".to_vec());
        assert_eq!(server.join().unwrap(), "GET /files/plan.xlsx HTTP/1.1");
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (base, server) = serve_once("404 Not Found", b"missing");
        let url = format!("{base}/plan.xlsx");
        match fetcher().fetch(&url) {
            Err(FetchError::Status { url: failed, status }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn requests_the_direct_download_link() {
        let (base, server) = serve_once("200 OK", b"PK\x03\x04");
        fetcher().fetch(&format!("{base}/sites/sharepoint/plan.xlsx?web=1&csf=1")).unwrap();
        assert_eq!(server.join().unwrap(), "GET /sites/sharepoint/plan.xlsx?download=1 HTTP/1.1");
    }

    #[test]
    fn empty_body_is_no_data() {
        let (base, server) = serve_once("200 OK", b"");
        let error = fetcher().fetch(&format!("{base}/plan.xlsx")).unwrap_err();
        assert!(matches!(error, FetchError::NoData(_)));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let addr = TcpListener::bind(("127.0.0.1", 0)).unwrap().local_addr().unwrap();
        let error = fetcher().fetch(&format!("http://{addr}/plan.xlsx")).unwrap_err();
        assert!(matches!(error, FetchError::Transport { .. }), "unexpected error: {error}");
    }

    #[test]
    fn rewrites_sharepoint_links() {
        assert_eq!(
            normalize_url("https://contoso.sharepoint.com/:x:/r/sites/qa/plan.xlsx?d=w123&csf=1&web=1"),
            "https://contoso.sharepoint.com/:x:/r/sites/qa/plan.xlsx?download=1"
        );
        assert_eq!(
            normalize_url("https://Contoso.SharePoint.com/plan.xlsx"),
            "https://Contoso.SharePoint.com/plan.xlsx?download=1"
        );
    }

    #[test]
    fn leaves_other_urls_alone() {
        let url = "https://example.com/files/plan.xlsx?token=abc";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn rewritten_links_end_with_exactly_one_download_query() {
        for url in [
            "https://x.sharepoint.com/a?b=1",
            "https://x.sharepoint.com/a?download=1",
            "https://x.sharepoint.com/a",
        ] {
            let rewritten = normalize_url(url);
            assert!(rewritten.ends_with("?download=1"));
            assert_eq!(rewritten.matches('?').count(), 1);
        }
    }

    #[test]
    fn detects_remote_sources() {
        assert!(is_remote_url("https://example.com/plan.xlsx"));
        assert!(is_remote_url("http://example.com/plan.xlsx"));
        assert!(!is_remote_url("plan.xlsx"));
        assert!(!is_remote_url("/srv/data/plan.xlsx"));
        assert!(!is_remote_url("file:///srv/data/plan.xlsx"));
    }

    #[test]
    fn empty_url_is_rejected() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(fetcher.fetch("  "), Err(FetchError::EmptyUrl)));
    }

    #[test]
    fn reads_local_files() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let bytes = fetcher.fetch("Cargo.toml").unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("inspection_board"));

        let error = fetcher.fetch("does/not/exist.xlsx").unwrap_err();
        assert!(matches!(error, FetchError::Io { .. }));
    }
}

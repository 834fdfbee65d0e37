use std::error::Error as StdError;
use std::time::Duration;

use tracing::debug;

/// Failures which prevented any HTTP answer from the bridge.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Could not connect to JVB API: Connection timeout")]
    Timeout,
    #[error("Could not connect to JVB API: Certificate validation failed")]
    Tls,
    #[error("Could not connect to JVB API: Failed to resolve hostname or service is not listening")]
    Connect,
    #[error("Request to JVB API failed: {0}")]
    Request(String),
    #[error("Could not set up HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Performs a single GET request. Implementations must not retry.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport with bounded connect and read timeouts.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("check-jitsi/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        debug!(%url, status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    debug!(error = ?err, "request failed");

    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if is_certificate_error(&err) {
        return TransportError::Tls;
    }
    if err.is_connect() {
        return TransportError::Connect;
    }
    TransportError::Request(err.to_string())
}

// reqwest does not expose TLS failures as a kind, so look through the source chain.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if e.to_string().to_lowercase().contains("certificate") {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::net::TcpListener;

    use super::*;

    fn closed_port() -> u16 {
        // Bind to an ephemeral port and release it again so nothing listens there.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_connection_refused() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let url = format!("http://127.0.0.1:{}/about/health", closed_port());

        let err = transport.get(&url).unwrap_err();
        assert!(matches!(err, TransportError::Connect), "{err:?}");
        assert!(err.to_string().starts_with("Could not connect to JVB API"));
    }

    #[test]
    fn test_timeout() {
        // The kernel accepts the connection, but nobody ever answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/colibri/stats", listener.local_addr().unwrap());
        let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();

        let err = transport.get(&url).unwrap_err();
        assert!(matches!(err, TransportError::Timeout), "{err:?}");
        assert_eq!(
            err.to_string(),
            "Could not connect to JVB API: Connection timeout"
        );
        drop(listener);
    }

    #[derive(Debug)]
    struct Chained(&'static str, Option<Box<Chained>>);

    impl fmt::Display for Chained {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Chained {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.1.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_certificate_error() {
        let tls = Chained(
            "error sending request",
            Some(Box::new(Chained(
                "client error (Connect)",
                Some(Box::new(Chained("invalid peer certificate: UnknownIssuer", None))),
            ))),
        );
        assert!(is_certificate_error(&tls));

        let refused = Chained(
            "error sending request",
            Some(Box::new(Chained("Connection refused (os error 111)", None))),
        );
        assert!(!is_certificate_error(&refused));

        // only the sources are inspected
        assert!(!is_certificate_error(&Chained("certificate", None)));
    }

    #[test]
    fn test_response_is_ok() {
        let ok = HttpResponse {
            status: 200,
            body: String::new(),
        };
        let unavailable = HttpResponse {
            status: 503,
            body: String::new(),
        };
        assert!(ok.is_ok());
        assert!(!unavailable.is_ok());
    }
}

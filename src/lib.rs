//!
//! Library for producing capacity reports from an ONTAP cluster.
//!
//! ## Client
//! A [`Client`] is built from a host and credentials
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), ontap_report::Error> {
//!     use ontap_report::{ClientBuilder, Credentials};
//!
//!     // API CA certificate loaded
//!     let ca_cert = Vec::new();
//!
//!     let client = ClientBuilder::new()
//!         .add_root_certificate(&ca_cert)?
//!         .build("cluster1.example.net", Credentials::basic("admin", "secret"))?;
//!
//!     let cluster = ontap_report::api::cluster(&client).await?;
//!     println!("{}", cluster.name());
//!     Ok(())
//! }
//! ```
//!
//! ## Reports
//! ### Write the aggregate capacity report
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), ontap_report::Error> {
//!     use ontap_report::report::{self, ReportKind, ReportOptions};
//!     use ontap_report::{ClientBuilder, Credentials};
//!
//!     let client = ClientBuilder::new()
//!         .danger_accept_invalid_certs()
//!         .build("https://10.1.2.3", Credentials::token("secret token"))?;
//!
//!     let outcome = report::generate(&client, ReportKind::Aggregates, &ReportOptions::default()).await?;
//!     println!("wrote {} rows to {}", outcome.rows, outcome.path.display());
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::missing_errors_doc)]
use serde::Deserialize;

pub mod api;
pub mod config;
pub mod extract;
pub mod report;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;

/// Error document returned by the REST API
#[derive(Debug, Deserialize)]
pub struct RESTError {
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Error code, ONTAP sends these as strings
    #[serde(default)]
    pub code: Option<String>,
    /// Field the error refers to
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RESTErrorBody {
    error: RESTError,
}

/// Error returned by client functions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed returned by the HTTP server, with the response body
    #[error("HTTP failed {0}, {1}")]
    WebServer(u16, String),

    /// This error is returned from the REST API, this typically means the client did something
    /// wrong or lacks permissions.
    #[error("REST error {status}: {}", .error.message)]
    REST {
        /// HTTP status
        status: u16,
        /// Decoded error document
        error: RESTError,
    },

    /// JSON serialization/deserialization error
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL: {0}")]
    URL(#[from] url::ParseError),

    /// HTTP client error
    #[error("Reqwest: {0}")]
    HTTPClient(#[from] reqwest::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    CSV(#[from] csv::Error),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO Errors
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// HTTP status of a failed API call, if this error came from one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::WebServer(status, _) | Self::REST { status, .. } => Some(*status),
            Self::HTTPClient(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    fn from_response(status: u16, body: String) -> Self {
        match serde_json::from_str::<RESTErrorBody>(&body) {
            Ok(doc) => Self::REST {
                status,
                error: doc.error,
            },
            Err(_) => Self::WebServer(status, body),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication material sent with every request
#[derive(Clone)]
pub enum Credentials {
    /// HTTP basic authentication
    Basic {
        /// Cluster user
        username: String,
        /// Password for `username`
        password: String,
    },
    /// Bearer token
    Token(String),
}

impl Credentials {
    /// Basic authentication credentials
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        Self::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Bearer token credentials
    #[must_use]
    pub fn token(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Token(_) => f.write_str("Token(..)"),
        }
    }
}

/// Builder for a [`Client`]
#[derive(Clone)]
pub struct ClientBuilder {
    reqwest_ca: Vec<reqwest::Certificate>,
    disable_cert_verification: bool,
    disable_proxy: bool,
    timeout: Option<std::time::Duration>,
}

impl ClientBuilder {
    /// Create a new builder instance
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reqwest_ca: Vec::new(),
            disable_cert_verification: false,
            disable_proxy: false,
            timeout: None,
        }
    }

    /// Add a root certificate for API certificate verification
    pub fn add_root_certificate(mut self, cert: &[u8]) -> Result<Self> {
        let r_ca = reqwest::Certificate::from_pem(cert)?;
        self.reqwest_ca.push(r_ca);
        Ok(self)
    }

    /// Disable certificate verification
    #[must_use]
    pub fn danger_accept_invalid_certs(self) -> Self {
        Self {
            disable_cert_verification: true,
            ..self
        }
    }

    /// Connect directly, ignoring proxy settings from the environment
    #[must_use]
    pub fn no_proxy(self) -> Self {
        Self {
            disable_proxy: true,
            ..self
        }
    }

    /// Give up on a request after `timeout`. Without this requests wait for as long as the
    /// server keeps the connection open.
    #[must_use]
    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Create a client for `host`, either a bare host name (HTTPS is assumed) or a full URL.
    pub fn build(&self, host: &str, credentials: Credentials) -> Result<Client> {
        let base_url = base_url(host)?;
        let client = reqwest::Client::builder();

        // Add CA certificates
        let client = self
            .reqwest_ca
            .iter()
            .fold(client, |client, ca| client.add_root_certificate(ca.clone()));

        let client = client.danger_accept_invalid_certs(self.disable_cert_verification);

        let client = if self.disable_proxy {
            client.no_proxy()
        } else {
            client
        };

        let client = match self.timeout {
            Some(timeout) => client.timeout(timeout),
            None => client,
        };

        if self.disable_cert_verification {
            tracing::debug!("certificate verification disabled for {}", base_url);
        }

        Ok(Client {
            base_url,
            credentials,
            client: client.build()?,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn base_url(host: &str) -> Result<url::Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::Config("empty host".into()));
    }

    let mut url = if host.contains("://") {
        url::Url::parse(host)?
    } else {
        url::Url::parse(&format!("https://{host}"))?
    };

    // Endpoint paths are joined relative to the base
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// The `Client` is used for all interaction with the cluster management API.
#[derive(Clone)]
pub struct Client {
    base_url: url::Url,
    credentials: Credentials,
    client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("client", &self.client)
            .finish()
    }
}

impl Client {
    /// Create a Client builder
    #[must_use]
    pub const fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Base URL all API paths are resolved against
    #[must_use]
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// GET a json payload from the REST API.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;

        tracing::debug!("GET {} {:?}", url, query_params);

        let mut builder = self
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        builder = match &self.credentials {
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credentials::Token(token) => builder.bearer_auth(token),
        };
        if let Some(qp) = query_params {
            builder = builder.query(qp);
        }

        let result = builder.send().await?;
        let status = result.status();
        let text = result.text().await?;

        if status.is_success() {
            tracing::trace!("GET {} returned {}", url, text);
            Ok(serde_json::from_str(&text)?)
        } else {
            tracing::debug!("GET {} failed {}: {}", url, status, text);
            Err(Error::from_response(status.as_u16(), text))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_url_forms() {
        let url = base_url("cluster1.example.net").unwrap();
        assert_eq!(url.as_str(), "https://cluster1.example.net/");

        let url = base_url("https://1.2.3.4:8443").unwrap();
        assert_eq!(url.as_str(), "https://1.2.3.4:8443/");

        let url = base_url("http://127.0.0.1:9000/proxy").unwrap();
        assert_eq!(url.join("api/cluster").unwrap().as_str(), "http://127.0.0.1:9000/proxy/api/cluster");

        assert!(matches!(base_url("  "), Err(Error::Config(_))));
    }

    #[test]
    fn error_from_response() {
        let body = r#"{"error":{"message":"not authorized for that command","code":"6"}}"#;
        match Error::from_response(401, body.to_string()) {
            Error::REST { status, error } => {
                assert_eq!(status, 401);
                assert_eq!(error.message, "not authorized for that command");
                assert_eq!(error.code.as_deref(), Some("6"));
            }
            e => panic!("unexpected {e:?}"),
        }

        let err = Error::from_response(500, "<html>oops</html>".to_string());
        assert!(matches!(&err, Error::WebServer(500, body) if body == "<html>oops</html>"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let basic = format!("{:?}", Credentials::basic("admin", "hunter2"));
        assert!(basic.contains("admin"));
        assert!(!basic.contains("hunter2"));

        let token = format!("{:?}", Credentials::token("abc123"));
        assert!(!token.contains("abc123"));
    }
}

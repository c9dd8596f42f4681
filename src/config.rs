//!
//! Run configuration, read from a JSON file and/or the environment.
//!
//! Environment variables override file values:
//! * `ONTAP_HOST` - cluster management host or URL
//! * `ONTAP_USER` / `ONTAP_PASSWORD` - basic authentication
//! * `ONTAP_TOKEN` - bearer token, preferred over username/password
//! * `ONTAP_VERIFY_TLS` - `false` disables certificate verification
//! * `ONTAP_CA_CERT` - path to an extra PEM CA certificate
//! * `ONTAP_OUTPUT_DIR` - directory the reports are written to
//! * `ONTAP_METRICS_CONCURRENCY` - concurrent volume metrics requests
//! * `ONTAP_TIMEOUT_SECS` - per request timeout
use crate::{Client, ClientBuilder, Credentials, Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Report generator configuration
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Cluster management host or URL
    pub host: Option<String>,
    /// Basic auth user
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Bearer token
    pub token: Option<String>,
    /// Verify the API certificate
    pub verify_tls: bool,
    /// Extra CA certificate (PEM)
    pub ca_cert: Option<PathBuf>,
    /// Report output directory
    pub output_dir: PathBuf,
    /// Concurrent volume metrics requests
    pub metrics_concurrency: usize,
    /// Per request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            token: None,
            verify_tls: true,
            ca_cert: None,
            output_dir: PathBuf::from("."),
            metrics_concurrency: 1,
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("verify_tls", &self.verify_tls)
            .field("ca_cert", &self.ca_cert)
            .field("output_dir", &self.output_dir)
            .field("metrics_concurrency", &self.metrics_concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{var}: expected a boolean, got '{value}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{var}: expected a number, got '{value}'")))
}

impl Config {
    /// Read a JSON configuration file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        let cfg = serde_json::from_slice(&data)?;
        Ok(cfg)
    }

    /// Configuration from the environment only
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|var| std::env::var(var).ok())
    }

    /// Read `path` if given, then apply the environment on top
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(path) => {
                tracing::debug!("Reading configuration from {}", path.display());
                Self::from_file(path).await?
            }
            None => Self::default(),
        };
        cfg.overlay(|var| std::env::var(var).ok())
    }

    /// Override fields with the variables `lookup` knows about
    pub fn overlay<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Result<Self> {
        if let Some(v) = lookup("ONTAP_HOST") {
            self.host = Some(v);
        }
        if let Some(v) = lookup("ONTAP_USER") {
            self.username = Some(v);
        }
        if let Some(v) = lookup("ONTAP_PASSWORD") {
            self.password = Some(v);
        }
        if let Some(v) = lookup("ONTAP_TOKEN") {
            self.token = Some(v);
        }
        if let Some(v) = lookup("ONTAP_VERIFY_TLS") {
            self.verify_tls = parse_bool("ONTAP_VERIFY_TLS", &v)?;
        }
        if let Some(v) = lookup("ONTAP_CA_CERT") {
            self.ca_cert = Some(v.into());
        }
        if let Some(v) = lookup("ONTAP_OUTPUT_DIR") {
            self.output_dir = v.into();
        }
        if let Some(v) = lookup("ONTAP_METRICS_CONCURRENCY") {
            self.metrics_concurrency = parse_number("ONTAP_METRICS_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("ONTAP_TIMEOUT_SECS") {
            self.timeout_secs = Some(parse_number("ONTAP_TIMEOUT_SECS", &v)?);
        }
        Ok(self)
    }

    /// Cluster host, required
    pub fn host(&self) -> Result<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::Config("no host configured (ONTAP_HOST)".into()))
    }

    /// Token if set, otherwise username and password
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token {
            return Ok(Credentials::token(token));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::basic(username, password)),
            (Some(_), None) => Err(Error::Config(
                "username set without a password (ONTAP_PASSWORD)".into(),
            )),
            _ => Err(Error::Config(
                "no credentials configured (ONTAP_TOKEN or ONTAP_USER/ONTAP_PASSWORD)".into(),
            )),
        }
    }

    /// Client builder carrying the TLS and timeout policy
    pub async fn client_builder(&self) -> Result<ClientBuilder> {
        let mut builder = ClientBuilder::new();
        if let Some(ca) = &self.ca_cert {
            let pem = tokio::fs::read(ca).await?;
            builder = builder.add_root_certificate(&pem)?;
        }
        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs();
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(builder)
    }

    /// Connect a client according to this configuration
    pub async fn client(&self) -> Result<Client> {
        let host = self.host()?;
        let credentials = self.credentials()?;
        self.client_builder().await?.build(host, credentials)
    }
}

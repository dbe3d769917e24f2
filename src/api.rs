//! Python package index JSON API client.
//!
//! [`PypiApi`] answers the two questions the formula updater asks: which
//! release is the latest, and what source archive belongs to a given release.
//! Every request carries a bounded timeout. There is no retry and no caching;
//! each invocation issues at most two requests.
//!
//! # Examples
//!
//! ```no_run
//! use brewtap::PypiApi;
//!
//! #[tokio::main]
//! async fn main() -> brewtap::Result<()> {
//!     let api = PypiApi::new()?;
//!
//!     let version = api.resolve_latest_version("kpf").await?;
//!     let release = api.fetch_release("kpf", &version).await?;
//!     println!("{} {}", release.url, release.sha256);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{FormulaError, Result};
use crate::release::{ProjectResponse, ReleaseMetadata, ReleaseResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const PYPI_BASE_URL: &str = "https://pypi.org/pypi";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Package index client
#[derive(Clone)]
pub struct PypiApi {
    client: reqwest::Client,
    base_url: String,
}

impl PypiApi {
    /// Client for pypi.org with the default 30 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(PYPI_BASE_URL, REQUEST_TIMEOUT)
    }

    /// Client for any index serving the PyPI JSON API layout.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("brewtap/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Latest published version of `package`, read from `info.version`.
    ///
    /// # Errors
    ///
    /// [`FormulaError::Network`] on transport failure or timeout,
    /// [`FormulaError::NotFound`] when the index has no such project and
    /// [`FormulaError::MalformedResponse`] when the body lacks the version field.
    pub async fn resolve_latest_version(&self, package: &str) -> Result<String> {
        let url = format!("{}/{}/json", self.base_url, package);
        let project: ProjectResponse = self.get_json(&url, package).await?;

        tracing::debug!(package, version = %project.info.version, "resolved latest version");
        Ok(project.info.version)
    }

    /// Source distribution metadata for `package` at `version`.
    ///
    /// # Errors
    ///
    /// As [`resolve_latest_version`](Self::resolve_latest_version), plus
    /// [`FormulaError::NoSourceDistribution`] when the release only ships
    /// prebuilt artifacts.
    pub async fn fetch_release(&self, package: &str, version: &str) -> Result<ReleaseMetadata> {
        let url = format!("{}/{}/{}/json", self.base_url, package, version);
        let release: ReleaseResponse = self
            .get_json(&url, &format!("{package} {version}"))
            .await?;

        tracing::debug!(
            package,
            version,
            files = release.urls.len(),
            "fetched release file list"
        );
        ReleaseMetadata::from_release(package, version, &release)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        tracing::debug!(url, "querying package index");

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FormulaError::NotFound(what.to_string()));
        }

        let body = response.error_for_status()?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FormulaError::MalformedResponse(e.to_string()))
    }
}

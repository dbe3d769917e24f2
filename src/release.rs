//! Release metadata and the package index response schemas it is built from.
//!
//! The index is decoded into explicit serde structures. Anything that does not
//! fit the expected shape is reported as a single
//! [`FormulaError::MalformedResponse`] by the caller, so construction here only
//! has to deal with well-typed data.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Description written into the formula and every emitted record.
pub const DESCRIPTION: &str =
    "Kubernetes utility to improve kubectl port-forward reliability and usability";

/// Homepage used when the index reports neither `home_page` nor a `Homepage` project URL.
pub const FALLBACK_HOMEPAGE: &str = "https://github.com/jessegoodier/kpf";

/// Package type marking a source distribution in the index's file list.
const SDIST: &str = "sdist";

/// Everything needed to render a formula for one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub version: String,
    /// Source archive location
    pub url: String,
    /// Hex sha256 digest of the source archive
    pub sha256: String,
    pub homepage: String,
    pub description: String,
}

/// Project-level info block shared by both index endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub version: String,
    #[serde(default)]
    pub home_page: Option<String>,
    #[serde(default)]
    pub project_urls: Option<HashMap<String, String>>,
}

/// `GET {index}/{package}/json`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    pub info: ProjectInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Digests {
    pub sha256: String,
}

/// One downloadable artifact of a release
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionFile {
    pub packagetype: String,
    pub url: String,
    pub digests: Digests,
}

/// `GET {index}/{package}/{version}/json`
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseResponse {
    pub info: ProjectInfo,
    pub urls: Vec<DistributionFile>,
}

impl ProjectInfo {
    /// Homepage resolution: `home_page`, then `project_urls.Homepage`, then the fallback.
    ///
    /// Empty strings count as absent; the index reports unset fields that way.
    pub fn homepage(&self) -> String {
        self.home_page
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| {
                self.project_urls
                    .as_ref()
                    .and_then(|urls| urls.get("Homepage"))
                    .map(String::as_str)
                    .filter(|h| !h.trim().is_empty())
            })
            .unwrap_or(FALLBACK_HOMEPAGE)
            .to_string()
    }
}

impl ReleaseMetadata {
    /// Build the record for `version` from a decoded release response.
    ///
    /// Picks the first source distribution. Prebuilt artifacts are never used
    /// as a substitute.
    pub fn from_release(package: &str, version: &str, release: &ReleaseResponse) -> Result<Self> {
        let sdist = release
            .urls
            .iter()
            .find(|file| file.packagetype == SDIST)
            .ok_or_else(|| FormulaError::NoSourceDistribution {
                package: package.to_string(),
                version: version.to_string(),
            })?;

        if !is_sha256_hex(&sdist.digests.sha256) {
            return Err(FormulaError::MalformedResponse(format!(
                "sha256 digest for {} is not 64 hex characters: {:?}",
                sdist.url, sdist.digests.sha256
            )));
        }

        Ok(Self {
            version: version.to_string(),
            url: sdist.url.clone(),
            sha256: sdist.digests.sha256.clone(),
            homepage: release.info.homepage(),
            description: DESCRIPTION.to_string(),
        })
    }

    /// Field names and values in emission order.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("version", self.version.as_str()),
            ("url", self.url.as_str()),
            ("sha256", self.sha256.as_str()),
            ("homepage", self.homepage.as_str()),
            ("description", self.description.as_str()),
        ]
    }
}

fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

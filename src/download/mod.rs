use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::path::Path;

use crate::formula::{ArtifactEntry, DownloadStrategy};
use crate::github::{GetReleases, ReleaseAssetLocation};
use crate::http::HttpClient;
use crate::runtime::Runtime;

const OCTET_STREAM: &str = "application/octet-stream";

/// Fetches an artifact to a local path according to its download strategy.
pub struct ArtifactDownloader<G: GetReleases> {
    http_client: HttpClient,
    github: G,
    authenticated: bool,
}

impl<G: GetReleases> ArtifactDownloader<G> {
    /// `authenticated` tells whether the HTTP client carries a GitHub token;
    /// only then is the releases API used to reach private assets.
    pub fn new(http_client: HttpClient, github: G, authenticated: bool) -> Self {
        Self {
            http_client,
            github,
            authenticated,
        }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn github(&self) -> &G {
        &self.github
    }

    /// Download `entry` to `dest`, returning the number of bytes written.
    #[tracing::instrument(skip(self, runtime, entry), fields(url = %entry.url))]
    pub async fn download<R: Runtime>(
        &self,
        runtime: &R,
        entry: &ArtifactEntry,
        dest: &Path,
    ) -> Result<u64> {
        let (url, accept) = match entry.strategy {
            DownloadStrategy::GitHubRelease if self.authenticated => {
                (self.resolve_asset_url(&entry.url).await?, Some(OCTET_STREAM))
            }
            DownloadStrategy::GitHubRelease | DownloadStrategy::Direct => {
                (entry.url.clone(), None)
            }
        };

        info!("Downloading {}...", url);
        let dest = dest.to_path_buf();
        let bytes = self
            .http_client
            .download_file(&url, accept, || {
                runtime
                    .create_file(&dest)
                    .with_context(|| format!("Failed to create download file at {:?}", dest))
            })
            .await?;

        info!("Download complete ({} bytes).", bytes);
        Ok(bytes)
    }

    /// Map a public release download URL to the API URL of the same asset
    async fn resolve_asset_url(&self, url: &str) -> Result<String> {
        let location: ReleaseAssetLocation = url.parse()?;
        let release = self
            .github
            .release_by_tag(&location.repo, &location.tag)
            .await?;

        let asset = release.find_asset(&location.file_name).ok_or_else(|| {
            anyhow!(
                "Release {} of {} has no asset named {}",
                location.tag,
                location.repo,
                location.file_name
            )
        })?;

        debug!("Resolved {} to asset {} ({})", url, asset.id, asset.url);
        Ok(asset.url.clone())
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::repo::GitHubRepo;
use super::types::Release;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GetReleases: Send + Sync {
    /// First page of releases, newest first
    async fn list_releases(&self, repo: &GitHubRepo, per_page: u32) -> Result<Vec<Release>>;
    async fn release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Release>;
    fn api_url(&self) -> &str;
}

pub struct GitHub {
    http_client: HttpClient,
    api_url: String,
}

impl GitHub {
    pub fn new(http_client: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            http_client,
            api_url,
        }
    }
}

#[async_trait]
impl GetReleases for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, repo: &GitHubRepo, per_page: u32) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        debug!("Fetching releases of {} from {}...", repo, url);

        let per_page = per_page.to_string();
        self.http_client
            .get_json(&url, &[("per_page", per_page.as_str()), ("page", "1")])
            .await
            .with_context(|| format!("Failed to list releases of {}", repo))
    }

    #[tracing::instrument(skip(self))]
    async fn release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.api_url, repo.owner, repo.repo, tag
        );
        debug!("Fetching release {} of {} from {}...", tag, repo, url);

        self.http_client
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to fetch release {} of {}", tag, repo))
    }

    fn api_url(&self) -> &str {
        &self.api_url
    }
}

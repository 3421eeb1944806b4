use anyhow::{Result, anyhow};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl GitHubRepo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for GitHubRepo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Ok(GitHubRepo::new(*owner, *repo))
            }
            _ => Err(anyhow!("Invalid repository format. Expected 'owner/repo'.")),
        }
    }
}

/// The pieces of a `https://github.com/{owner}/{repo}/releases/download/{tag}/{file}` URL
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReleaseAssetLocation {
    pub repo: GitHubRepo,
    pub tag: String,
    pub file_name: String,
}

impl FromStr for ReleaseAssetLocation {
    type Err = anyhow::Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let path = url
            .strip_prefix("https://github.com/")
            .ok_or_else(|| anyhow!("Not a github.com release URL: {}", url))?;

        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo, "releases", "download", tag, file_name]
                if [owner, repo, tag, file_name].iter().all(|s| !s.is_empty()) =>
            {
                Ok(Self {
                    repo: GitHubRepo::new(*owner, *repo),
                    tag: tag.to_string(),
                    file_name: file_name.to_string(),
                })
            }
            _ => Err(anyhow!("Not a github.com release download URL: {}", url)),
        }
    }
}

//! Upgrade check against the latest stable `ybm-cli` release.
//!
//! The latest tag is looked up at most once a day; the answer is cached in
//! `{config_dir}/ybm-tap/release.json`.

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::github::{GetReleases, GitHubRepo};
use crate::runtime::Runtime;

pub const RELEASES_PER_PAGE: u32 = 10;
pub const CACHE_TTL_SECS: i64 = 60 * 60 * 24;
const CACHE_FILE: &str = "release.json";

pub fn ybm_cli_repo() -> GitHubRepo {
    GitHubRepo::new("yugabyte", "ybm-cli")
}

/// Tag of the newest release that is neither a prerelease nor a draft
#[tracing::instrument(skip(github))]
pub async fn fetch_latest_release<G: GetReleases>(github: &G, repo: &GitHubRepo) -> Result<String> {
    debug!("Fetching the latest release of {}", repo);
    let releases = github.list_releases(repo, RELEASES_PER_PAGE).await?;

    for release in releases {
        debug!(
            "Found release: {}, prerelease: {}",
            release.tag_name, release.prerelease
        );
        if !release.prerelease && !release.draft {
            return Ok(release.tag_name);
        }
    }

    Err(anyhow!(
        "No stable release among the latest {} releases of {}",
        RELEASES_PER_PAGE,
        repo
    ))
}

/// Whether a cached answer recorded at `last_checked` is stale at `now`.
pub fn should_fetch(last_checked: &str, now: i64) -> Result<bool> {
    let last: i64 = last_checked
        .trim()
        .parse()
        .with_context(|| format!("Invalid last checked time: {:?}", last_checked))?;
    Ok(now > last.saturating_add(CACHE_TTL_SECS))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCache {
    /// Unix seconds, stored as text
    pub last_checked_time: String,
    /// Release tag, `v` prefixed
    pub last_version_available: String,
}

impl ReleaseCache {
    pub fn new(now: i64, version: impl Into<String>) -> Self {
        Self {
            last_checked_time: now.to_string(),
            last_version_available: version.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let version = &self.last_version_available;
        match version.strip_prefix('v') {
            Some(rest) if parse_version(rest).is_some() => {}
            _ => bail!("Invalid cached version {:?}: expected vMAJOR[.MINOR[.PATCH]]", version),
        }

        if self.last_checked_time.parse::<u64>().is_err() {
            bail!(
                "Invalid cached check time {:?}: expected a non-negative integer",
                self.last_checked_time
            );
        }
        Ok(())
    }

    pub fn path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
        runtime
            .config_dir()
            .map(|dir| dir.join("ybm-tap").join(CACHE_FILE))
            .context("Could not determine config directory")
    }

    /// `None` when no cache has been written yet
    pub fn load<R: Runtime>(runtime: &R) -> Result<Option<Self>> {
        let path = Self::path(runtime)?;
        if !runtime.exists(&path) {
            return Ok(None);
        }

        let content = runtime.read_to_string(&path)?;
        let cache: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse release cache {:?}", path))?;
        cache.validate()?;
        Ok(Some(cache))
    }

    /// Refuses to write a cache that `load` would reject
    pub fn save<R: Runtime>(&self, runtime: &R) -> Result<()> {
        self.validate()?;
        let path = Self::path(runtime)?;
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        runtime.write(&path, &json)?;
        debug!("Saved release cache to {:?}", path);
        Ok(())
    }
}

/// Latest stable tag, served from the cache while it is fresh.
///
/// A missing or unreadable cache is replaced by a fresh lookup.
#[tracing::instrument(skip(runtime, github))]
pub async fn latest_release<R: Runtime, G: GetReleases>(
    runtime: &R,
    github: &G,
    repo: &GitHubRepo,
    now: i64,
) -> Result<String> {
    match ReleaseCache::load(runtime) {
        Ok(Some(cache)) => {
            if !should_fetch(&cache.last_checked_time, now)? {
                debug!("Using cached release {}", cache.last_version_available);
                return Ok(cache.last_version_available);
            }
        }
        Ok(None) => debug!("No release cache yet"),
        Err(e) => debug!("Ignoring release cache: {:#}", e),
    }

    let latest = fetch_latest_release(github, repo).await?;
    ReleaseCache::new(now, latest.clone()).save(runtime)?;
    Ok(latest)
}

/// Parse `MAJOR[.MINOR[.PATCH]][-PRE][+BUILD]`.
///
/// Missing minor and patch parts count as zero, but only on a bare core
/// (`1.2` is `1.2.0`, `1.2-rc1` is invalid).
fn parse_version(version: &str) -> Option<Version> {
    if version.contains(['-', '+']) {
        return Version::parse(version).ok();
    }
    match version.split('.').count() {
        1 => Version::parse(&format!("{}.0.0", version)).ok(),
        2 => Version::parse(&format!("{}.0", version)).ok(),
        _ => Version::parse(version).ok(),
    }
}

fn parse_loose(version: &str) -> Option<Version> {
    parse_version(version.trim_start_matches('v'))
}

/// `true` when `latest` is strictly newer than `current`.
///
/// Any number of leading `v`s is ignored. Invalid versions sort below every
/// valid one and equal to each other.
pub fn should_upgrade(current: &str, latest: &str) -> bool {
    let ordering = match (parse_loose(current), parse_loose(latest)) {
        (Some(current), Some(latest)) => current.cmp(&latest),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    debug!("Current version {} vs latest {}: {:?}", current, latest, ordering);
    ordering == Ordering::Less
}

/// The newer tag if one exists. Lookup failures are logged and ignored.
pub async fn check_for_update<R: Runtime, G: GetReleases>(
    runtime: &R,
    github: &G,
    current: &Version,
    now: i64,
) -> Option<String> {
    match latest_release(runtime, github, &ybm_cli_repo(), now).await {
        Ok(latest) if should_upgrade(&current.to_string(), &latest) => Some(latest),
        Ok(_) => None,
        Err(e) => {
            debug!("Could not check for a newer release: {:#}", e);
            None
        }
    }
}

//! Package descriptor: metadata plus a flat platform → artifact table.
//!
//! A [`Formula`] is static data. The only logic is [`Formula::resolve`],
//! a pure scan of the table, and [`Formula::validate`], which rejects tables
//! that could select two entries for one platform.

mod resolve;
mod ybm_cli;

use anyhow::{Result, bail};
use semver::Version;
use std::fmt;

use crate::checksum::Sha256Digest;
use crate::platform::PlatformKey;

pub use ybm_cli::ybm_cli;

/// Archive formats an artifact can be shipped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// How the artifact URL is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// Plain GET of the URL
    Direct,
    /// GitHub release asset. With a token, the asset is looked up through
    /// the releases API and fetched as `application/octet-stream`, which
    /// also works for private repositories.
    GitHubRelease,
}

/// One downloadable build of the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub platform: PlatformKey,
    pub url: String,
    pub sha256: Sha256Digest,
    pub archive: ArchiveFormat,
    /// File name of the executable inside the archive, also its installed name
    pub binary: String,
    pub strategy: DownloadStrategy,
}

impl ArtifactEntry {
    /// Last path segment of the URL
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Platform-independent package facts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub version: Version,
    pub license: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub metadata: PackageMetadata,
    /// Scanned in order by `resolve`
    pub entries: Vec<ArtifactEntry>,
}

impl Formula {
    /// Check the table invariants.
    ///
    /// Every URL must be https, every binary name non-empty and free of path
    /// separators, and no two entries may match the same concrete platform.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.name.is_empty() {
            bail!("Formula has an empty package name");
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.url.starts_with("https://") || entry.url.len() <= "https://".len() {
                bail!(
                    "Entry for {} has a non-https URL: {}",
                    entry.platform,
                    entry.url
                );
            }
            if entry.binary.is_empty() || entry.binary.contains(['/', '\\']) {
                bail!(
                    "Entry for {} has an invalid binary name: {:?}",
                    entry.platform,
                    entry.binary
                );
            }
            for other in &self.entries[i + 1..] {
                if entry.platform.overlaps(&other.platform) {
                    bail!(
                        "Entries for {} and {} overlap",
                        entry.platform,
                        other.platform
                    );
                }
            }
        }

        Ok(())
    }
}

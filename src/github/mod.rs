//! Minimal GitHub releases API client.
//!
//! Used for two things: looking up the asset id behind a release download
//! URL (authenticated downloads), and finding the latest stable release for
//! the upgrade check.

mod client;
mod repo;
mod types;

pub use client::{DEFAULT_API_URL, GetReleases, GitHub};
#[cfg(test)]
pub use client::MockGetReleases;
pub use repo::{GitHubRepo, ReleaseAssetLocation};
pub use types::{Release, ReleaseAsset};

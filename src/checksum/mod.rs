//! SHA-256 digests: validated descriptor values and file verification.

use anyhow::{Context, Result};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::IntegrityError;
use crate::runtime::Runtime;

const BUFFER_SIZE: usize = 64 * 1024;

/// A validated SHA-256 digest: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Validate a digest string.
    ///
    /// Accepts an optional `sha256:` prefix and any hex case.
    pub fn new(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref().trim();
        let hex = s.strip_prefix("sha256:").unwrap_or(s);

        if hex.len() != 64 {
            anyhow::bail!(
                "Invalid SHA256 digest: expected 64 hex characters, got {} in '{}'",
                hex.len(),
                s
            );
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid SHA256 digest: contains non-hex characters in '{}'", s);
        }

        Ok(Self(hex.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash everything a reader yields
pub fn sha256_reader(reader: &mut dyn Read) -> Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer).context("Failed to read data for hashing")?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Sha256Digest(hex::encode(hasher.finalize())))
}

/// Compute the SHA-256 of a file (streaming)
#[tracing::instrument(skip(runtime))]
pub fn sha256_file<R: Runtime>(runtime: &R, path: &Path) -> Result<Sha256Digest> {
    let mut file = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for hashing", path))?;
    sha256_reader(&mut file)
}

/// Check a downloaded file against the descriptor's digest.
///
/// A mismatch comes back as an [`IntegrityError`] inside the `anyhow::Error`
/// so callers can `downcast_ref` it.
#[tracing::instrument(skip(runtime, expected))]
pub fn verify_file<R: Runtime>(
    runtime: &R,
    path: &Path,
    expected: &Sha256Digest,
    url: &str,
) -> Result<()> {
    let actual = sha256_file(runtime, path)?;
    debug!("sha256 of {:?}: {}", path, actual);

    if &actual != expected {
        return Err(IntegrityError {
            url: url.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }

    info!("Checksum verified: {}", actual);
    Ok(())
}

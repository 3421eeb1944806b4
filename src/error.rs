use thiserror::Error;

/// No descriptor entry matches the detected platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported platform: os={os:?}, arch={arch:?}, bits={}", display_bits(.bits))]
pub struct UnsupportedPlatformError {
    pub os: String,
    pub arch: String,
    pub bits: Option<u8>,
}

/// Downloaded bytes do not hash to the recorded digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Checksum mismatch for {url}: expected sha256 {expected}, got {actual}")]
pub struct IntegrityError {
    pub url: String,
    pub expected: String,
    pub actual: String,
}

fn display_bits(bits: &Option<u8>) -> String {
    bits.map_or_else(|| "unknown".to_string(), |b| b.to_string())
}

//! Platform detection and lookup keys
//!
//! `detection` reports what the host looks like as plain strings, the way a
//! package manager's hardware facility would. `key` turns those strings into
//! the typed [`PlatformKey`] used by the descriptor table.

mod detection;
mod key;

pub use detection::{DefaultPlatformDetector, Platform, PlatformDetector};
pub use key::{Arch, Bits, OsFamily, PlatformKey};

use log::debug;

use super::{ArtifactEntry, Formula};
use crate::error::UnsupportedPlatformError;
use crate::platform::{Arch, Bits, OsFamily, Platform};

impl Formula {
    /// Select the artifact for a detected platform.
    ///
    /// `bits` only matters where the table constrains the word size (Linux
    /// arm). When absent it is implied by the architecture name where
    /// possible, so `aarch64` counts as 64-bit.
    pub fn resolve(
        &self,
        os: &str,
        arch: &str,
        bits: Option<u8>,
    ) -> Result<&ArtifactEntry, UnsupportedPlatformError> {
        let unsupported = || UnsupportedPlatformError {
            os: os.to_string(),
            arch: arch.to_string(),
            bits,
        };

        let os_family = OsFamily::parse(os).ok_or_else(unsupported)?;
        let (arch_family, implied_bits) = Arch::parse(arch).ok_or_else(unsupported)?;
        // A width outside 32/64 can only satisfy entries without a constraint
        let word_size = match bits {
            Some(b) => Bits::from_u8(b),
            None => implied_bits,
        };

        let entry = self
            .entries
            .iter()
            .find(|e| e.platform.matches(os_family, arch_family, word_size))
            .ok_or_else(unsupported)?;

        debug!("Resolved {}/{} to {}", os, arch, entry.url);
        Ok(entry)
    }

    pub fn resolve_platform(
        &self,
        platform: &Platform,
    ) -> Result<&ArtifactEntry, UnsupportedPlatformError> {
        self.resolve(&platform.os, &platform.arch, platform.bits)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::UnsupportedPlatformError;
    use crate::formula::ybm_cli;
    use crate::platform::{Arch, Bits, OsFamily, Platform, PlatformKey};

    #[test]
    fn test_resolve_every_table_entry_to_itself() {
        let f = ybm_cli().unwrap();

        let cases = [
            ("macos", "x86_64", Some(64), PlatformKey::new(OsFamily::MacOs, Arch::X86_64, None)),
            ("macos", "arm64", Some(64), PlatformKey::new(OsFamily::MacOs, Arch::Arm, None)),
            ("linux", "x86_64", Some(64), PlatformKey::new(OsFamily::Linux, Arch::X86_64, None)),
            (
                "linux",
                "aarch64",
                Some(64),
                PlatformKey::new(OsFamily::Linux, Arch::Arm, Some(Bits::B64)),
            ),
        ];

        for (os, arch, bits, key) in cases {
            let entry = f.resolve(os, arch, bits).unwrap();
            assert_eq!(entry.platform, key, "{}/{}", os, arch);
        }
    }

    #[test]
    fn test_resolve_macos_arm64() {
        let f = ybm_cli().unwrap();
        let entry = f.resolve("macos", "arm64", None).unwrap();
        assert!(entry.url.ends_with("ybm_0.0.5_darwin_arm64.zip"));
        assert_eq!(entry.binary, "ybm-cli");
    }

    #[test]
    fn test_resolve_aliases() {
        let f = ybm_cli().unwrap();
        let darwin = f.resolve("Darwin", "aarch64", None).unwrap();
        assert!(darwin.url.ends_with("darwin_arm64.zip"));

        let amd64 = f.resolve("linux", "amd64", None).unwrap();
        assert!(amd64.url.ends_with("linux_x86_64.zip"));
    }

    #[test]
    fn test_resolve_macos_arm_ignores_word_size() {
        let f = ybm_cli().unwrap();
        let entry = f.resolve("macos", "arm", Some(32)).unwrap();
        assert!(entry.url.ends_with("darwin_arm64.zip"));
    }

    #[test]
    fn test_resolve_linux_arm_uses_bits() {
        let f = ybm_cli().unwrap();

        let entry = f.resolve("linux", "arm", Some(64)).unwrap();
        assert!(entry.url.ends_with("linux_arm64.zip"));

        let err = f.resolve("linux", "arm", Some(32)).unwrap_err();
        assert_eq!(err.bits, Some(32));

        // armv7l implies 32-bit
        assert!(f.resolve("linux", "armv7l", None).is_err());
    }

    #[test]
    fn test_resolve_unsupported_carries_input() {
        let f = ybm_cli().unwrap();
        let err = f.resolve("windows", "x86_64", Some(64)).unwrap_err();
        assert_eq!(
            err,
            UnsupportedPlatformError {
                os: "windows".into(),
                arch: "x86_64".into(),
                bits: Some(64),
            }
        );

        assert!(f.resolve("freebsd", "x86_64", None).is_err());
        assert!(f.resolve("linux", "i686", Some(32)).is_err());
    }

    #[test]
    fn test_resolve_odd_word_size_only_matches_unconstrained_entries() {
        let f = ybm_cli().unwrap();

        let entry = f.resolve("macos", "arm64", Some(16)).unwrap();
        assert!(entry.url.ends_with("darwin_arm64.zip"));
        let entry = f.resolve("linux", "x86_64", Some(16)).unwrap();
        assert!(entry.url.ends_with("linux_x86_64.zip"));

        // Linux arm needs 64-bit; the implied width does not apply
        let err = f.resolve("linux", "aarch64", Some(16)).unwrap_err();
        assert_eq!(err.bits, Some(16));
    }

    #[test]
    fn test_resolve_empty_input_is_unsupported() {
        let f = ybm_cli().unwrap();
        assert!(f.resolve("", "x86_64", None).is_err());
        assert!(f.resolve("linux", "", None).is_err());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let f = ybm_cli().unwrap();
        let first = f.resolve("linux", "x86_64", Some(64)).unwrap().clone();
        let second = f.resolve("linux", "x86_64", Some(64)).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_platform() {
        let f = ybm_cli().unwrap();
        let platform = Platform::new("linux", "aarch64", Some(64));
        let entry = f.resolve_platform(&platform).unwrap();
        assert!(entry.url.ends_with("linux_arm64.zip"));
    }
}

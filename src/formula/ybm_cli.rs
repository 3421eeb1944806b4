use anyhow::Result;
use semver::Version;

use super::{ArchiveFormat, ArtifactEntry, DownloadStrategy, Formula, PackageMetadata};
use crate::checksum::Sha256Digest;
use crate::platform::{Arch, Bits, OsFamily, PlatformKey};

const VERSION: &str = "0.0.5";
const BINARY: &str = "ybm-cli";
const RELEASE_BASE: &str = "https://github.com/yugabyte/ybm-cli/releases/download";

const TABLE: &[(OsFamily, Arch, Option<Bits>, &str, &str)] = &[
    (
        OsFamily::MacOs,
        Arch::X86_64,
        None,
        "darwin_x86_64",
        "871890402221c8cdde1f8ba1c87f0d15981dce1029983ccc07b347f2e1425f72",
    ),
    (
        OsFamily::MacOs,
        Arch::Arm,
        None,
        "darwin_arm64",
        "aa4c2fb3bf4362be7615b225ebc475c2947dbe27a2b90c4d041cb205735ce204",
    ),
    (
        OsFamily::Linux,
        Arch::X86_64,
        None,
        "linux_x86_64",
        "290cf8a1929a115c34818d2c7bf02048261dc75b0fd9420a031f3f415f669499",
    ),
    (
        OsFamily::Linux,
        Arch::Arm,
        Some(Bits::B64),
        "linux_arm64",
        "46f844efed7a7acf931a2e78e8d2f8335f8c3b5a291e1eb52a0ed1464f339f2d",
    ),
];

/// Descriptor for the YugabyteDB Managed CLI release
pub fn ybm_cli() -> Result<Formula> {
    let version = Version::parse(VERSION)?;

    let entries = TABLE
        .iter()
        .map(|&(os, arch, bits, suffix, sha256)| {
            Ok(ArtifactEntry {
                platform: PlatformKey::new(os, arch, bits),
                url: format!("{RELEASE_BASE}/v{VERSION}/ybm_{VERSION}_{suffix}.zip"),
                sha256: Sha256Digest::new(sha256)?,
                archive: ArchiveFormat::Zip,
                binary: BINARY.to_string(),
                strategy: DownloadStrategy::GitHubRelease,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let formula = Formula {
        metadata: PackageMetadata {
            name: "ybm-cli".to_string(),
            description: "YugabyteDB Managed CLI".to_string(),
            homepage: "https://github.com/yugabyte/ybm-cli".to_string(),
            version,
            license: "Apache".to_string(),
        },
        entries,
    };
    formula.validate()?;
    Ok(formula)
}

mod zip;

use anyhow::{Result, anyhow, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::formula::ArchiveFormat;
use crate::runtime::Runtime;

pub use zip::ZipExtractor;

/// Unpack an artifact according to its declared archive format.
pub fn extract<R: Runtime>(
    runtime: &R,
    format: ArchiveFormat,
    archive_path: &Path,
    extract_to: &Path,
) -> Result<usize> {
    match format {
        ArchiveFormat::Zip => ZipExtractor.extract(runtime, archive_path, extract_to),
    }
}

/// Locate the executable `name` inside an extracted archive.
///
/// Release archives carry the binary either at the root or under a single
/// top-level directory. Exactly one match is accepted.
#[tracing::instrument(skip(runtime))]
pub fn find_binary<R: Runtime>(runtime: &R, dir: &Path, name: &str) -> Result<PathBuf> {
    let candidate = dir.join(name);
    if runtime.exists(&candidate) && !runtime.is_dir(&candidate) {
        return Ok(candidate);
    }

    let mut found = Vec::new();
    for entry in runtime.read_dir(dir)? {
        if !runtime.is_dir(&entry) {
            continue;
        }
        let candidate = entry.join(name);
        if runtime.exists(&candidate) && !runtime.is_dir(&candidate) {
            found.push(candidate);
        }
    }

    match found.len() {
        0 => Err(anyhow!("Executable '{}' not found in archive", name)),
        1 => {
            let path = found.remove(0);
            debug!("Found executable at {:?}", path);
            Ok(path)
        }
        _ => bail!(
            "Executable '{}' is ambiguous in archive: {:?}",
            name,
            found
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_binary_at_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ybm-cli"), "bin").unwrap();

        let path = find_binary(&RealRuntime, dir.path(), "ybm-cli").unwrap();
        assert_eq!(path, dir.path().join("ybm-cli"));
    }

    #[test]
    fn test_find_binary_under_top_level_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("ybm_0.0.5_linux_x86_64")).unwrap();
        fs::write(dir.path().join("ybm_0.0.5_linux_x86_64/ybm-cli"), "bin").unwrap();

        let path = find_binary(&RealRuntime, dir.path(), "ybm-cli").unwrap();
        assert_eq!(path, dir.path().join("ybm_0.0.5_linux_x86_64/ybm-cli"));
    }

    #[test]
    fn test_find_binary_missing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();

        let err = find_binary(&RealRuntime, dir.path(), "ybm-cli").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_find_binary_ambiguous() {
        let dir = tempdir().unwrap();
        for sub in ["a", "b"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("ybm-cli"), "bin").unwrap();
        }

        let err = find_binary(&RealRuntime, dir.path(), "ybm-cli").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_find_binary_ignores_directory_named_like_binary() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/work/out");
        runtime
            .expect_exists()
            .with(eq(root.join("ybm-cli")))
            .returning(|_| true);
        runtime
            .expect_is_dir()
            .with(eq(root.join("ybm-cli")))
            .returning(|_| true);
        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(|_| Ok(vec![]));

        assert!(find_binary(&runtime, &root, "ybm-cli").is_err());
    }

    #[test]
    fn test_extract_dispatches_zip() {
        use ::zip::ZipWriter;
        use ::zip::write::FileOptions;
        use std::io::Write;

        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("ybm.zip");
        {
            let mut zip = ZipWriter::new(fs::File::create(&archive_path).unwrap());
            let options: FileOptions<()> = FileOptions::default();
            zip.start_file("ybm-cli", options).unwrap();
            zip.write_all(b"bin").unwrap();
            zip.finish().unwrap();
        }

        let out = dir.path().join("out");
        let count = extract(&RealRuntime, ArchiveFormat::Zip, &archive_path, &out).unwrap();
        assert_eq!(count, 1);
        assert!(out.join("ybm-cli").exists());
    }
}

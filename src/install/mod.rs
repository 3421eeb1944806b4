//! Install step: download, verify, extract and place one artifact.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    archive,
    checksum::verify_file,
    cleanup::{CleanupGuard, SharedCleanupContext},
    config::Config,
    download::ArtifactDownloader,
    error::IntegrityError,
    formula::ArtifactEntry,
    github::GetReleases,
    runtime::Runtime,
};

static WORK_DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Install `entry` into `bin_dir` (or the default bin directory).
#[tracing::instrument(skip(runtime, entry, api_url, cleanup_ctx), fields(url = %entry.url))]
pub async fn install<R: Runtime>(
    runtime: R,
    entry: &ArtifactEntry,
    bin_dir: Option<PathBuf>,
    api_url: Option<String>,
    cleanup_ctx: SharedCleanupContext,
) -> Result<PathBuf> {
    let config = Config::new(runtime, bin_dir, api_url)?;
    Installer::new(&config.runtime, &config.downloader, cleanup_ctx)
        .install(entry, &config.bin_dir)
        .await
}

pub struct Installer<'a, R: Runtime, G: GetReleases> {
    runtime: &'a R,
    downloader: &'a ArtifactDownloader<G>,
    cleanup_ctx: SharedCleanupContext,
}

impl<'a, R: Runtime, G: GetReleases> Installer<'a, R, G> {
    pub fn new(
        runtime: &'a R,
        downloader: &'a ArtifactDownloader<G>,
        cleanup_ctx: SharedCleanupContext,
    ) -> Self {
        Self {
            runtime,
            downloader,
            cleanup_ctx,
        }
    }

    /// Returns the path of the installed executable.
    ///
    /// The work directory is removed whether or not the install succeeds.
    /// A checksum mismatch fails with [`IntegrityError`] before anything is
    /// extracted or placed.
    #[tracing::instrument(skip(self, entry), fields(url = %entry.url))]
    pub async fn install(&self, entry: &ArtifactEntry, bin_dir: &Path) -> Result<PathBuf> {
        let work_dir = self.runtime.temp_dir().join(format!(
            "ybm-tap-{}-{}",
            std::process::id(),
            WORK_DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        if self.runtime.exists(&work_dir) {
            self.runtime.remove_dir_all(&work_dir)?;
        }
        self.runtime.create_dir_all(&work_dir)?;
        let work_guard = CleanupGuard::new(Arc::clone(&self.cleanup_ctx), work_dir.clone());

        let result = self.install_in(entry, bin_dir, &work_dir).await;

        if let Err(e) = self.runtime.remove_dir_all(&work_dir) {
            warn!("Failed to remove work directory {:?}: {}", work_dir, e);
        }
        work_guard.success();

        result
    }

    async fn install_in(
        &self,
        entry: &ArtifactEntry,
        bin_dir: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let archive_path = work_dir.join(entry.file_name());
        self.downloader
            .download(self.runtime, entry, &archive_path)
            .await?;

        if let Err(e) = verify_file(self.runtime, &archive_path, &entry.sha256, &entry.url) {
            if e.downcast_ref::<IntegrityError>().is_some() {
                debug!("Removing rejected download {:?}", archive_path);
                let _ = self.runtime.remove_file(&archive_path);
            }
            return Err(e);
        }

        let extract_dir = work_dir.join("extracted");
        archive::extract(self.runtime, entry.archive, &archive_path, &extract_dir)?;
        let binary = archive::find_binary(self.runtime, &extract_dir, &entry.binary)?;

        self.place(&binary, bin_dir, &entry.binary)
    }

    /// Copy next to the target, then rename over it
    fn place(&self, binary: &Path, bin_dir: &Path, name: &str) -> Result<PathBuf> {
        self.runtime
            .create_dir_all(bin_dir)
            .with_context(|| format!("Failed to create bin directory {:?}", bin_dir))?;

        let target = bin_dir.join(name);
        let staging = bin_dir.join(format!(".{}.ybm-tap.tmp", name));
        let staging_guard = CleanupGuard::new(Arc::clone(&self.cleanup_ctx), staging.clone());

        if let Err(e) = self.stage(binary, &staging, &target) {
            if self.runtime.exists(&staging)
                && let Err(rm) = self.runtime.remove_file(&staging)
            {
                warn!("Failed to remove staging file {:?}: {}", staging, rm);
            }
            staging_guard.success();
            return Err(e);
        }
        staging_guard.success();

        info!("Installed {:?}", target);
        Ok(target)
    }

    fn stage(&self, binary: &Path, staging: &Path, target: &Path) -> Result<()> {
        self.runtime.copy(binary, staging)?;
        #[cfg(unix)]
        self.runtime.set_permissions(staging, 0o755)?;
        self.runtime.rename(staging, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Sha256Digest;
    use crate::cleanup;
    use crate::formula::{ArchiveFormat, DownloadStrategy};
    use crate::github::MockGetReleases;
    use crate::http::HttpClient;
    use crate::platform::{Arch, OsFamily, PlatformKey};
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use reqwest::Client;
    use sha2::{Digest, Sha256};
    use std::fs;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> = FileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn entry(url: String, sha256: &str) -> ArtifactEntry {
        ArtifactEntry {
            platform: PlatformKey::new(OsFamily::Linux, Arch::X86_64, None),
            url,
            sha256: Sha256Digest::new(sha256).unwrap(),
            archive: ArchiveFormat::Zip,
            binary: "ybm-cli".into(),
            strategy: DownloadStrategy::Direct,
        }
    }

    fn downloader() -> ArtifactDownloader<MockGetReleases> {
        ArtifactDownloader::new(HttpClient::new(Client::new()), MockGetReleases::new(), false)
    }

    async fn serve(server: &mut mockito::Server, path: &str, body: Vec<u8>) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    #[test_log::test(tokio::test)]
    async fn test_install_places_executable() {
        let body = zip_bytes(&[("ybm_0.0.5/ybm-cli", "#!/bin/sh\necho ybm\n")]);
        let digest = hex::encode(Sha256::digest(&body));

        let mut server = mockito::Server::new_async().await;
        let mock = serve(&mut server, "/ybm_0.0.5_linux_x86_64.zip", body).await;

        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        let ctx = cleanup::new_shared();
        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, Arc::clone(&ctx));

        let e = entry(
            format!("{}/ybm_0.0.5_linux_x86_64.zip", server.url()),
            &digest,
        );
        let installed = installer.install(&e, &bin_dir).await.unwrap();

        mock.assert_async().await;
        assert_eq!(installed, bin_dir.join("ybm-cli"));
        assert_eq!(
            fs::read_to_string(&installed).unwrap(),
            "#!/bin/sh\necho ybm\n"
        );
        assert!(!bin_dir.join(".ybm-cli.ybm-tap.tmp").exists());
        assert!(cleanup::lock(&ctx).paths().is_empty());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_install_overwrites_existing_binary() {
        let body = zip_bytes(&[("ybm-cli", "new")]);
        let digest = hex::encode(Sha256::digest(&body));

        let mut server = mockito::Server::new_async().await;
        let _mock = serve(&mut server, "/ybm.zip", body).await;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ybm-cli"), "old").unwrap();

        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, cleanup::new_shared());
        let e = entry(format!("{}/ybm.zip", server.url()), &digest);
        installer.install(&e, dir.path()).await.unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("ybm-cli")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_install_checksum_mismatch_leaves_nothing() {
        let body = zip_bytes(&[("ybm-cli", "tampered")]);

        let mut server = mockito::Server::new_async().await;
        let _mock = serve(&mut server, "/ybm.zip", body).await;

        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        let ctx = cleanup::new_shared();
        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, Arc::clone(&ctx));

        let e = entry(format!("{}/ybm.zip", server.url()), &"0".repeat(64));
        let err = installer.install(&e, &bin_dir).await.unwrap_err();

        let integrity = err.downcast_ref::<IntegrityError>().unwrap();
        assert_eq!(integrity.expected, "0".repeat(64));
        assert_eq!(integrity.url, e.url);
        assert!(!bin_dir.join("ybm-cli").exists());
        assert!(cleanup::lock(&ctx).paths().is_empty());
    }

    #[tokio::test]
    async fn test_install_missing_binary_in_archive() {
        let body = zip_bytes(&[("README.md", "no binary here")]);
        let digest = hex::encode(Sha256::digest(&body));

        let mut server = mockito::Server::new_async().await;
        let _mock = serve(&mut server, "/ybm.zip", body).await;

        let dir = tempdir().unwrap();
        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, cleanup::new_shared());

        let e = entry(format!("{}/ybm.zip", server.url()), &digest);
        let err = installer.install(&e, dir.path()).await.unwrap_err();

        assert!(err.to_string().contains("not found"));
        assert!(!dir.path().join("ybm-cli").exists());
    }

    #[test]
    fn test_place_failed_rename_removes_staging_file() {
        let bin_dir = PathBuf::from("/home/user/.local/bin");
        let staging = bin_dir.join(".ybm-cli.ybm-tap.tmp");

        let mut runtime = MockRuntime::new();
        runtime
            .expect_create_dir_all()
            .with(eq(bin_dir.clone()))
            .returning(|_| Ok(()));
        runtime
            .expect_copy()
            .with(eq(PathBuf::from("/tmp/work/ybm-cli")), eq(staging.clone()))
            .returning(|_, _| Ok(3));
        runtime.expect_set_permissions().returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .returning(|_, _| Err(anyhow::anyhow!("rename denied")));
        runtime
            .expect_exists()
            .with(eq(staging.clone()))
            .returning(|_| true);
        runtime
            .expect_remove_file()
            .with(eq(staging.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let ctx = cleanup::new_shared();
        let downloader = downloader();
        let installer = Installer::new(&runtime, &downloader, Arc::clone(&ctx));

        let err = installer
            .place(Path::new("/tmp/work/ybm-cli"), &bin_dir, "ybm-cli")
            .unwrap_err();

        assert!(err.to_string().contains("rename denied"));
        assert!(cleanup::lock(&ctx).paths().is_empty());
    }

    #[test]
    fn test_place_failed_copy_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        let ctx = cleanup::new_shared();
        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, Arc::clone(&ctx));

        let result = installer.place(&dir.path().join("missing"), &bin_dir, "ybm-cli");

        assert!(result.is_err());
        assert_eq!(fs::read_dir(&bin_dir).unwrap().count(), 0);
        assert!(cleanup::lock(&ctx).paths().is_empty());
    }

    #[tokio::test]
    async fn test_install_download_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ybm.zip")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let downloader = downloader();
        let installer = Installer::new(&RealRuntime, &downloader, cleanup::new_shared());

        let e = entry(format!("{}/ybm.zip", server.url()), &"0".repeat(64));
        assert!(installer.install(&e, dir.path()).await.is_err());
        assert!(!dir.path().join("ybm-cli").exists());
    }
}

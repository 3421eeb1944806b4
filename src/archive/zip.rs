use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::runtime::Runtime;

/// Extractor for .zip release archives
pub struct ZipExtractor;

impl ZipExtractor {
    /// Unpack every entry of `archive_path` below `extract_to`.
    ///
    /// Entries whose names would escape `extract_to` are skipped. An archive
    /// with no entries is an error.
    #[tracing::instrument(skip(self, runtime))]
    pub fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<usize> {
        debug!("Extracting zip archive {:?} to {:?}...", archive_path, extract_to);
        let mut file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // ZipArchive needs Seek; Runtime::open hands out a plain reader
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        let mut archive = ZipArchive::new(Cursor::new(buffer))
            .with_context(|| format!("Failed to parse ZIP archive {:?}", archive_path))?;
        if archive.is_empty() {
            bail!("Archive {:?} is empty", archive_path);
        }

        runtime.create_dir_all(extract_to)?;

        let mut extracted = 0;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let Some(entry_path) = entry.enclosed_name() else {
                debug!("Skipping entry with unsafe path: {}", entry.name());
                continue;
            };
            let full_path = extract_to.join(entry_path);

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }
            let mut dest_file = runtime.create_file(&full_path)?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;
            extracted += 1;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        info!("Extracted {} files.", extracted);
        Ok(extracted)
    }
}

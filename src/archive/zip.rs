use anyhow::{Context, Result};
use log::debug;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::runtime::Runtime;

use super::{Unpack, safe_join};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
// An archive with no entries starts with the end-of-central-directory record
const EMPTY_ZIP_MAGIC: &[u8] = b"PK\x05\x06";

/// Extractor for .zip archives (the snapshot format of tag and branch downloads)
#[derive(Default)]
pub struct ZipExtractor;

impl Unpack for ZipExtractor {
    fn can_handle(&self, archive: &[u8]) -> bool {
        archive.starts_with(ZIP_MAGIC) || archive.starts_with(EMPTY_ZIP_MAGIC)
    }

    fn unpack(&self, runtime: &dyn Runtime, archive: &[u8], into: &Path) -> Result<()> {
        let mut archive =
            ZipArchive::new(Cursor::new(archive)).context("Failed to parse ZIP archive")?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let Some(full_path) = entry
                .enclosed_name()
                .and_then(|name| safe_join(into, &name))
            else {
                debug!("Skipping entry with invalid path: {}", entry.name());
                continue;
            };

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

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        Ok(())
    }
}

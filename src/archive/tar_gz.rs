use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::path::Path;
use tar::{Archive, EntryType};

use crate::runtime::Runtime;

use super::{Unpack, safe_join};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Extractor for gzip-compressed tarballs
#[derive(Default)]
pub struct TarGzExtractor;

impl Unpack for TarGzExtractor {
    fn can_handle(&self, archive: &[u8]) -> bool {
        archive.starts_with(GZIP_MAGIC)
    }

    fn unpack(&self, runtime: &dyn Runtime, archive: &[u8], into: &Path) -> Result<()> {
        let mut archive = Archive::new(GzDecoder::new(archive));

        for entry in archive.entries().context("Failed to read tar archive")? {
            let mut entry = entry.context("Failed to read tar entry")?;
            let entry_path = entry.path().context("Invalid tar entry path")?.into_owned();

            let Some(full_path) = safe_join(into, &entry_path) else {
                debug!("Skipping entry with invalid path: {:?}", entry_path);
                continue;
            };

            match entry.header().entry_type() {
                EntryType::Directory => runtime.create_dir_all(&full_path)?,
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path)?;
                    std::io::copy(&mut entry, &mut dest_file)
                        .with_context(|| format!("Failed to extract file {:?}", full_path))?;

                    if let Ok(mode) = entry.header().mode()
                        && let Err(e) = runtime.set_permissions(&full_path, mode)
                    {
                        debug!("Failed to set permissions on {:?}: {}", full_path, e);
                    }
                }
                other => debug!("Skipping {:?} entry {:?}", other, entry_path),
            }
        }

        Ok(())
    }
}

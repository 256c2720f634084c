//! Archive Extractor: unpack downloaded bytes, stripping the wrapper directory
//! that source-hosting snapshots put around the repository contents.

mod tar_gz;
mod zip;

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::path::{Component, Path, PathBuf};

use crate::runtime::Runtime;

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Trait for extracting an in-memory archive into a directory.
#[cfg_attr(test, mockall::automock)]
pub trait Extractor: Send + Sync {
    /// Extract `archive` so that the contents of its single top-level directory
    /// (or the archive root, when there is no such wrapper) end up directly in `dest`.
    fn extract(&self, runtime: &dyn Runtime, archive: &[u8], dest: &Path) -> Result<()>;
}

/// Format-specific unpacking, without wrapper handling.
trait Unpack {
    fn can_handle(&self, archive: &[u8]) -> bool;
    fn unpack(&self, runtime: &dyn Runtime, archive: &[u8], into: &Path) -> Result<()>;
}

/// Dispatcher that sniffs the archive format from its leading bytes.
#[derive(Default)]
pub struct ArchiveExtractorImpl {
    zip: ZipExtractor,
    tar_gz: TarGzExtractor,
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self::default()
    }

    fn unpacker(&self, archive: &[u8]) -> Option<&dyn Unpack> {
        if self.zip.can_handle(archive) {
            Some(&self.zip)
        } else if self.tar_gz.can_handle(archive) {
            Some(&self.tar_gz)
        } else {
            None
        }
    }
}

impl Extractor for ArchiveExtractorImpl {
    #[tracing::instrument(skip(self, runtime, archive))]
    fn extract(&self, runtime: &dyn Runtime, archive: &[u8], dest: &Path) -> Result<()> {
        let unpacker = self
            .unpacker(archive)
            .ok_or_else(|| anyhow!("Unsupported archive format"))?;

        let parent = dest
            .parent()
            .ok_or_else(|| anyhow!("Extraction target {:?} has no parent", dest))?;
        let staging = runtime.temp_dir_in(parent, ".extract-")?;

        debug!("Unpacking to staging dir: {:?}", staging.path());
        unpacker.unpack(runtime, archive, staging.path())?;

        let entries = runtime
            .read_dir(staging.path())
            .context("Failed to read staging directory")?;

        let source_dir = match entries.as_slice() {
            [] => return Err(anyhow!("Archive appears to be empty.")),
            [single] if runtime.is_dir(single) => single.clone(),
            _ => staging.path().to_path_buf(),
        };

        runtime.create_dir_all(dest)?;
        debug!("Moving contents from {:?} to {:?}", source_dir, dest);
        for item in runtime.read_dir(&source_dir)? {
            let Some(file_name) = item.file_name() else {
                continue;
            };
            runtime.rename(&item, &dest.join(file_name))?;
        }

        Ok(())
    }
}

/// Join an archive entry path onto `root`, refusing anything that would escape it.
fn safe_join(root: &Path, entry: &Path) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (out != root).then_some(out)
}

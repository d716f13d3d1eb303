use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::install::error::ResolveError;

/// Upper bound on the buffer reserved up front for an entry.
const PREALLOCATE_LIMIT: u64 = 64 << 20;

/// The executable entry pulled out of a release archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Whether an archive entry is the `variant` executable: either its full
/// name is the variant, or it is a file whose base name is.
pub fn entry_matches(name: &str, is_dir: bool, variant: &str) -> bool {
    if name == variant {
        return true;
    }
    !is_dir && name.rsplit('/').next() == Some(variant)
}

/// Read the first entry matching `variant` from the ZIP at `archive_path`.
pub fn read_entry(archive_path: &Path, variant: &str) -> Result<ArchiveEntry, ResolveError> {
    let file = File::open(archive_path).map_err(ResolveError::filesystem(archive_path))?;
    let corrupt = |e: zip::result::ZipError| ResolveError::Archive {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut archive = ZipArchive::new(file).map_err(corrupt)?;

    let mut found = None;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(corrupt)?;
        if entry_matches(entry.name(), entry.is_dir(), variant) {
            found = Some(index);
            break;
        }
    }

    let Some(index) = found else {
        return Err(ResolveError::NotFound(format!(
            "no '{variant}' executable inside {}",
            archive_path.display()
        )));
    };

    let mut entry = archive.by_index(index).map_err(corrupt)?;
    // The declared size comes from the archive header and is only a hint.
    let mut bytes = Vec::with_capacity(entry.size().min(PREALLOCATE_LIMIT) as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ResolveError::Archive {
            path: archive_path.to_path_buf(),
            reason: format!("failed to decompress '{}': {e}", entry.name()),
        })?;

    Ok(ArchiveEntry {
        name: entry.name().to_string(),
        bytes,
    })
}

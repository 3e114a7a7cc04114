//! Model card layer scanning.
//!
//! A model card layer is a tar archive (optionally gzip-compressed) that is
//! expected to hold exactly one markdown file. Entries that are not
//! documentation are drained without being buffered, so memory stays bounded
//! by the largest documentation entry rather than the archive size.

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use modelcar_core::error::{ModelcarError, Result};
use tar::Archive;

/// Media type marker for gzip-compressed layers.
const GZIP_MARKER: &str = "gzip";

/// The single documentation file found in a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFile {
    /// Entry name as recorded in the archive
    pub name: String,
    /// Normalized relative path, safe to join onto an output directory
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
}

/// Scan a layer blob for its single documentation file.
///
/// Returns `Ok(None)` when the archive holds zero or several entries ending in
/// `extension`. Scanning stops as soon as a second match is seen. Every name
/// ending in `extension` counts, including absolute names and names escaping
/// via `..`; such an entry is never returned, so a lone unsafe match also
/// yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`ModelcarError::ArchiveError`] if the payload cannot be
/// decompressed or read as a tar archive.
pub fn scan_doc_archive<R: Read>(
    reader: R,
    media_type: &str,
    extension: &str,
) -> Result<Option<DocFile>> {
    if media_type.contains(GZIP_MARKER) {
        tracing::debug!(media_type, "Decompressing gzip layer");
        scan_tar(GzDecoder::new(reader), extension)
    } else {
        scan_tar(reader, extension)
    }
}

fn scan_tar<R: Read>(reader: R, extension: &str) -> Result<Option<DocFile>> {
    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| ModelcarError::ArchiveError(format!("Failed to read archive: {}", e)))?;

    let mut matches = 0usize;
    let mut found: Option<DocFile> = None;
    let mut first_match: Option<String> = None;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| ModelcarError::ArchiveError(format!("Failed to read entry: {}", e)))?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let size = entry.header().size().unwrap_or(0);

        tracing::debug!(name = %name, size, "Archive entry");

        if !name.ends_with(extension) {
            drain(&mut entry, &name)?;
            continue;
        }

        matches += 1;
        if matches > 1 {
            tracing::info!(
                first = first_match.as_deref().unwrap_or_default(),
                second = %name,
                "Multiple documentation files in layer"
            );
            return Ok(None);
        }
        first_match = Some(name.clone());

        let Some(relative_path) = sanitize_entry_path(&name) else {
            tracing::warn!(name = %name, "Skipping unsafe archive entry path");
            drain(&mut entry, &name)?;
            continue;
        };

        let mut content = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(1 << 20));
        entry.read_to_end(&mut content).map_err(|e| {
            ModelcarError::ArchiveError(format!("Failed to read {}: {}", name, e))
        })?;

        found = Some(DocFile {
            name,
            relative_path,
            content,
        });
    }

    if found.is_none() {
        tracing::info!("No documentation file in layer");
    }
    Ok(found)
}

/// Copy an entry's payload to nowhere, reading it in bounded chunks.
fn drain<R: Read>(entry: &mut R, name: &str) -> Result<()> {
    io::copy(entry, &mut io::sink())
        .map(|_| ())
        .map_err(|e| ModelcarError::ArchiveError(format!("Failed to skip {}: {}", name, e)))
}

/// Normalize an archive entry name into a relative path.
///
/// Returns `None` for absolute names, names that climb above their root
/// through `..`, and names that normalize to nothing.
pub fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Resolve `name` under `dest`, rejecting anything that would land outside it.
///
/// The returned path is `dest` itself or one of its descendants.
pub fn resolve_within(dest: &Path, name: &str) -> Result<PathBuf> {
    let relative = sanitize_entry_path(name)
        .ok_or_else(|| ModelcarError::UnsafePath(name.to_string()))?;
    let resolved = dest.join(relative);

    if !resolved.starts_with(dest) {
        return Err(ModelcarError::UnsafePath(name.to_string()));
    }
    Ok(resolved)
}

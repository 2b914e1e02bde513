// ABOUTME: Packs a build context directory into an uncompressed tar archive.
// ABOUTME: The whole tree is sent; the daemon applies .dockerignore itself.

use super::error::DaemonError;
use std::path::Path;

/// Tar up everything under `dir`, with paths relative to it.
///
/// Symlinks are stored as links rather than followed. Top-level entries are
/// appended in name order so the same tree always packs to the same bytes.
pub fn pack_context(dir: &Path) -> Result<Vec<u8>, DaemonError> {
    let archive_err = |source| DaemonError::Archive {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(archive_err)?;
    entries.sort_by_key(|e| e.file_name());

    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(false);

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let file_type = entry.file_type().map_err(archive_err)?;

        if file_type.is_dir() {
            builder.append_dir_all(&name, &path).map_err(archive_err)?;
        } else {
            builder
                .append_path_with_name(&path, &name)
                .map_err(archive_err)?;
        }
    }

    builder.into_inner().map_err(archive_err)
}

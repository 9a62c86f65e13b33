//! Gzip-compressed tar archives for archive-mode cache entries
//!
//! Entry names are recorded relative to a source root, which the cache
//! store sets to the parent of the cache source. Extracting into that same
//! parent therefore recreates the cache source in place.

use crate::error::{CadirError, CadirResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `entries` into a new gzip tar archive at `archive_path`
///
/// Every entry must live under `source_root`; its name in the archive is
/// the path relative to that root. Symlinks are stored as symlinks with
/// their target string. File contents are streamed, so memory use does not
/// grow with the size of the tree.
pub fn write_archive(
    source_root: &Path,
    entries: &[PathBuf],
    archive_path: &Path,
) -> CadirResult<()> {
    let file = File::create(archive_path)
        .map_err(|e| CadirError::archive("creating archive", archive_path, e))?;

    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for path in entries {
        let name = path.strip_prefix(source_root).map_err(|_| {
            CadirError::archive(
                "entry outside source root",
                path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not under {}", path.display(), source_root.display()),
                ),
            )
        })?;

        builder
            .append_path_with_name(path, name)
            .map_err(|e| CadirError::archive("writing entry", path, e))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| CadirError::archive("finishing tar stream", archive_path, e))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| CadirError::archive("finishing gzip stream", archive_path, e))?;
    writer
        .flush()
        .map_err(|e| CadirError::archive("flushing archive", archive_path, e))?;

    debug!(
        "Wrote {} entries to {}",
        entries.len(),
        archive_path.display()
    );
    Ok(())
}

/// Extract the archive at `archive_path` below `destination`
///
/// Restores permission bits, modification times and extended attributes
/// (which carry ACLs and file flags on platforms that support them).
/// Existing files are overwritten.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> CadirResult<()> {
    let file = File::open(archive_path)
        .map_err(|e| CadirError::archive("opening archive", archive_path, e))?;

    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_unpack_xattrs(true);
    archive.set_overwrite(true);

    archive
        .unpack(destination)
        .map_err(|e| CadirError::archive("extracting archive", archive_path, e))?;

    debug!(
        "Extracted {} into {}",
        archive_path.display(),
        destination.display()
    );
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cache::tree::{collect_entries, create_symlink};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn list_entries(archive_path: &Path) -> Vec<String> {
        let file = File::open(archive_path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    fn sample_source(parent: &Path) -> PathBuf {
        let source = parent.join("node_modules");
        fs::create_dir_all(source.join("left-pad/bin")).unwrap();
        fs::write(source.join("left-pad/index.js"), "pad").unwrap();
        fs::write(source.join("left-pad/bin/cli"), "#!/bin/sh\necho pad\n").unwrap();
        fs::set_permissions(
            source.join("left-pad/bin/cli"),
            fs::Permissions::from_mode(0o750),
        )
        .unwrap();
        create_symlink(
            Path::new("left-pad/bin/cli"),
            &source.join("pad"),
        )
        .unwrap();
        source
    }

    #[test]
    fn entries_are_relative_to_source_root() {
        let dir = TempDir::new().unwrap();
        let source = sample_source(dir.path());
        let archive = dir.path().join("out.tar.gz");

        write_archive(dir.path(), &collect_entries(&source).unwrap(), &archive).unwrap();

        let names = list_entries(&archive);
        assert!(names.iter().all(|n| n.starts_with("node_modules")));
        assert!(names.contains(&"node_modules/left-pad/index.js".to_string()));
        assert!(names.contains(&"node_modules/pad".to_string()));
    }

    #[test]
    fn extract_restores_contents_modes_and_links() {
        let dir = TempDir::new().unwrap();
        let source = sample_source(dir.path());
        let archive = dir.path().join("out.tar.gz");
        write_archive(dir.path(), &collect_entries(&source).unwrap(), &archive).unwrap();

        let restore_root = dir.path().join("restore");
        extract_archive(&archive, &restore_root).unwrap();

        let restored = restore_root.join("node_modules");
        assert_eq!(
            fs::read_to_string(restored.join("left-pad/index.js")).unwrap(),
            "pad"
        );
        let mode = fs::metadata(restored.join("left-pad/bin/cli"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
        assert_eq!(
            fs::read_link(restored.join("pad")).unwrap(),
            Path::new("left-pad/bin/cli")
        );
    }

    #[test]
    fn extract_overwrites_in_place() {
        let dir = TempDir::new().unwrap();
        let source = sample_source(dir.path());
        let archive = dir.path().join("out.tar.gz");
        write_archive(dir.path(), &collect_entries(&source).unwrap(), &archive).unwrap();

        fs::write(source.join("left-pad/index.js"), "changed").unwrap();
        extract_archive(&archive, dir.path()).unwrap();

        assert_eq!(
            fs::read_to_string(source.join("left-pad/index.js")).unwrap(),
            "pad"
        );
    }

    #[test]
    fn entry_outside_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = sample_source(dir.path());
        let other = TempDir::new().unwrap();

        let err = write_archive(
            other.path(),
            &collect_entries(&source).unwrap(),
            &dir.path().join("out.tar.gz"),
        )
        .unwrap_err();

        assert!(matches!(err, CadirError::Archive { .. }));
    }

    #[test]
    fn unwritable_destination_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let source = sample_source(dir.path());

        let err = write_archive(
            dir.path(),
            &collect_entries(&source).unwrap(),
            &dir.path().join("missing/dir/out.tar.gz"),
        )
        .unwrap_err();

        assert!(matches!(err, CadirError::Archive { .. }));
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let err = extract_archive(&archive, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, CadirError::Archive { .. }));
    }

    #[test]
    fn missing_archive_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let err = extract_archive(&dir.path().join("nope.tar.gz"), dir.path()).unwrap_err();
        assert!(matches!(err, CadirError::Archive { .. }));
    }
}

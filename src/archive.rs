//! ZIP archive extraction with all-or-nothing semantics.
//!
//! Entries are streamed to disk one at a time. A failure at any point after
//! the destination directory was created removes the whole destination, so
//! callers never observe a half-extracted tree.

use crate::constants::{EXTRACT_BUFFER_SIZE, MACOS_METADATA_DIR};
use crate::error::{EaipError, Result, is_storage_full};
use crate::models::ExtractStats;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

/// Progress callback receiving `(entries_done, entries_total)`
pub type ExtractProgress<'a> = &'a mut dyn FnMut(usize, usize);

/// Extract `archive_path` into `destination`.
///
/// `destination` (and its parents) is created before writing and exists
/// afterwards only if extraction succeeded. Progress is reported at most
/// once per 1% of entries, plus a final `(total, total)` call.
pub fn extract(
    archive_path: &Path,
    destination: &Path,
    password: Option<&str>,
    mut on_progress: Option<ExtractProgress<'_>>,
) -> Result<ExtractStats> {
    if !archive_path.is_file() {
        return Err(EaipError::NotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let mut archive = open_archive(archive_path)?;
    let required = uncompressed_size(&mut archive, archive_path)?;
    ensure_free_space(destination, required)?;

    let created_root = first_missing_ancestor(destination);
    fs::create_dir_all(destination)?;

    info!(
        "Extracting {} entries ({} bytes) from {} to {}",
        archive.len(),
        required,
        archive_path.display(),
        destination.display()
    );

    match extract_entries(
        &mut archive,
        archive_path,
        destination,
        password,
        &mut on_progress,
    ) {
        Ok(stats) => {
            debug!(
                "Extracted {} files, skipped {} entries",
                stats.files_written, stats.entries_skipped
            );
            Ok(stats)
        }
        Err(e) => {
            warn!("Extraction failed, removing {}: {}", destination.display(), e);
            let cleanup_root = created_root.unwrap_or_else(|| destination.to_path_buf());
            if let Err(cleanup_err) = fs::remove_dir_all(&cleanup_root) {
                warn!(
                    "Failed to clean up {}: {}",
                    cleanup_root.display(),
                    cleanup_err
                );
            }
            Err(e)
        }
    }
}

/// List entry names of an archive
pub fn list_contents(archive_path: &Path) -> Result<Vec<String>> {
    if !archive_path.is_file() {
        return Err(EaipError::NotFound {
            path: archive_path.to_path_buf(),
        });
    }
    let archive = open_archive(archive_path)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Check whether a file is a readable ZIP archive
pub fn is_valid_zip(archive_path: &Path) -> bool {
    archive_path.is_file() && open_archive(archive_path).is_ok()
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path)?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| EaipError::CorruptArchive {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn uncompressed_size(archive: &mut ZipArchive<BufReader<File>>, archive_path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| zip_error(e, archive_path))?;
        total = total.saturating_add(entry.size());
    }
    Ok(total)
}

/// Fail early when the disk holding `destination` cannot take `required` bytes
fn ensure_free_space(destination: &Path, required: u64) -> Result<()> {
    let Some(anchor) = existing_ancestor(destination) else {
        return Ok(());
    };
    let anchor = anchor.canonicalize().unwrap_or(anchor);

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|disk| anchor.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len());

    match disk {
        Some(disk) if disk.total_space() > 0 && disk.available_space() < required => {
            Err(EaipError::DiskFull {
                path: destination.to_path_buf(),
                reason: format!(
                    "archive needs {} bytes, {} available on {}",
                    required,
                    disk.available_space(),
                    disk.mount_point().display()
                ),
            })
        }
        Some(disk) => {
            debug!(
                "{} bytes available on {} for {} bytes of charts",
                disk.available_space(),
                disk.mount_point().display(),
                required
            );
            Ok(())
        }
        None => Ok(()),
    }
}

fn existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
}

/// Topmost directory `create_dir_all(path)` would create
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .last()
        .map(Path::to_path_buf)
}

fn extract_entries(
    archive: &mut ZipArchive<BufReader<File>>,
    archive_path: &Path,
    destination: &Path,
    password: Option<&str>,
    on_progress: &mut Option<ExtractProgress<'_>>,
) -> Result<ExtractStats> {
    let total = archive.len();
    let report_every = (total / 100).max(1);
    let mut stats = ExtractStats {
        entries: total,
        ..Default::default()
    };
    let mut buffer = vec![0u8; EXTRACT_BUFFER_SIZE];

    for i in 0..total {
        let mut entry = match password {
            Some(password) => archive.by_index_decrypt(i, password.as_bytes()),
            None => archive.by_index(i),
        }
        .map_err(|e| zip_error(e, archive_path))?;

        let name = entry.name().to_string();
        let relative = match entry.enclosed_name() {
            Some(path) if !path.starts_with(MACOS_METADATA_DIR) => path,
            Some(_) => {
                stats.entries_skipped += 1;
                continue;
            }
            None => {
                warn!("Skipping entry with unsafe path: {}", name);
                stats.entries_skipped += 1;
                continue;
            }
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| write_error(e, destination))?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| write_error(e, destination))?;
            }
            let outfile = File::create(&out_path).map_err(|e| write_error(e, destination))?;
            let mut writer = BufWriter::new(outfile);
            let written = copy_entry(&mut entry, &mut writer, &mut buffer)
                .map_err(|e| e.into_error(archive_path, destination, &name))?;
            writer
                .flush()
                .map_err(|e| write_error(e, destination))?;

            stats.files_written += 1;
            stats.bytes_written += written;
        }

        let done = i + 1;
        if done % report_every == 0 && done < total {
            if let Some(callback) = on_progress.as_mut() {
                callback(done, total);
            }
        }
    }

    if let Some(callback) = on_progress.as_mut() {
        callback(total, total);
    }

    Ok(stats)
}

/// Failure while streaming a single entry, split by side
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl CopyError {
    fn into_error(self, archive_path: &Path, destination: &Path, entry: &str) -> EaipError {
        match self {
            CopyError::Read(e) => EaipError::CorruptArchive {
                path: archive_path.to_path_buf(),
                reason: format!("failed to read entry '{}': {}", entry, e),
            },
            CopyError::Write(e) => write_error(e, destination),
        }
    }
}

fn copy_entry<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut [u8],
) -> std::result::Result<u64, CopyError> {
    let mut written = 0u64;
    loop {
        let n = match reader.read(buffer) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buffer[..n]).map_err(CopyError::Write)?;
        written += n as u64;
    }
}

fn write_error(error: io::Error, destination: &Path) -> EaipError {
    if is_storage_full(&error) {
        EaipError::DiskFull {
            path: destination.to_path_buf(),
            reason: error.to_string(),
        }
    } else {
        EaipError::Io(error)
    }
}

fn zip_error(error: ZipError, archive_path: &Path) -> EaipError {
    match error {
        ZipError::InvalidPassword => EaipError::InvalidPassword {
            path: archive_path.to_path_buf(),
            reason: "invalid password".to_string(),
        },
        ZipError::UnsupportedArchive(message) if message == ZipError::PASSWORD_REQUIRED => {
            EaipError::InvalidPassword {
                path: archive_path.to_path_buf(),
                reason: message.to_string(),
            }
        }
        other => EaipError::CorruptArchive {
            path: archive_path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use zip::CompressionMethod;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_writes_all_entries() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("charts.zip");
        fs::write(
            &archive,
            build_zip(&[
                ("EAIP2025-11/", b""),
                ("EAIP2025-11/Data/a.pdf", b"aaa"),
                ("EAIP2025-11/Data/b.pdf", b"bbbb"),
            ]),
        )
        .unwrap();

        let destination = temp_dir.path().join("out").join("nested");
        let stats = extract(&archive, &destination, None, None).unwrap();

        assert_eq!(stats.entries, 3);
        assert_eq!(stats.files_written, 2);
        assert_eq!(stats.bytes_written, 7);
        assert_eq!(
            fs::read(destination.join("EAIP2025-11/Data/b.pdf")).unwrap(),
            b"bbbb"
        );
    }

    #[test]
    fn test_progress_is_throttled_and_completes() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("many.zip");
        let names: Vec<String> = (0..250).map(|i| format!("root/{i}.pdf")).collect();
        let entries: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), &b"x"[..])).collect();
        fs::write(&archive, build_zip(&entries)).unwrap();

        let mut calls = Vec::new();
        let mut callback = |done: usize, total: usize| calls.push((done, total));
        extract(
            &archive,
            &temp_dir.path().join("out"),
            None,
            Some(&mut callback),
        )
        .unwrap();

        // every 2 entries (1% of 250), final call at completion
        assert_eq!(calls.last(), Some(&(250, 250)));
        assert!(calls.len() <= 101);
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(calls.iter().all(|(_, total)| *total == 250));
    }

    #[test]
    fn test_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out");
        let result = extract(&temp_dir.path().join("nope.zip"), &destination, None, None);

        assert!(matches!(result, Err(EaipError::NotFound { .. })));
        assert!(!destination.exists());
    }

    #[test]
    fn test_corrupt_archive_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("bad.zip");
        fs::write(&archive, b"PK this is not really a zip file").unwrap();

        let destination = temp_dir.path().join("out");
        let result = extract(&archive, &destination, None, None);

        assert!(matches!(result, Err(EaipError::CorruptArchive { .. })));
        assert!(!destination.exists());
        assert!(!is_valid_zip(&archive));
    }

    #[test]
    fn test_damaged_entry_removes_destination() {
        let temp_dir = TempDir::new().unwrap();
        let payload = b"SECOND-ENTRY-PAYLOAD-0123456789";
        let mut bytes = build_zip(&[("root/first.pdf", b"first entry"), ("root/second.pdf", payload)]);

        // flip the stored data of the second entry so its checksum fails mid-stream
        let offset = bytes
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        bytes[offset] ^= 0xFF;
        let archive = temp_dir.path().join("damaged.zip");
        fs::write(&archive, bytes).unwrap();

        let destination = temp_dir.path().join("scratch").join("extracted");
        let result = extract(&archive, &destination, None, None);

        assert!(result.is_err());
        assert!(!destination.exists());
        assert!(!temp_dir.path().join("scratch").exists());
    }

    #[test]
    fn test_list_contents() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("charts.zip");
        fs::write(&archive, build_zip(&[("root/a.pdf", b"a"), ("root/b.pdf", b"b")])).unwrap();

        let mut names = list_contents(&archive).unwrap();
        names.sort();
        assert_eq!(names, vec!["root/a.pdf", "root/b.pdf"]);
        assert!(is_valid_zip(&archive));
    }

    #[test]
    fn test_macos_metadata_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("mac.zip");
        fs::write(
            &archive,
            build_zip(&[("root/a.pdf", b"a"), ("__MACOSX/root/._a.pdf", b"junk")]),
        )
        .unwrap();

        let destination = temp_dir.path().join("out");
        let stats = extract(&archive, &destination, None, None).unwrap();

        assert_eq!(stats.entries_skipped, 1);
        assert!(!destination.join("__MACOSX").exists());
    }

    /// Writer standing in for a destination whose disk is full
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            // ENOSPC
            Err(io::Error::from_raw_os_error(28))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad deflate stream"))
        }
    }

    #[test]
    fn test_write_failure_on_full_disk_is_disk_full() {
        let destination = Path::new("/tmp/out");
        let mut buffer = vec![0u8; 16];

        let error = copy_entry(&mut Cursor::new(b"chart bytes"), &mut FullDisk, &mut buffer)
            .map(|_| ())
            .err()
            .map(|e| e.into_error(Path::new("a.zip"), destination, "root/a.pdf"));

        match error {
            Some(EaipError::DiskFull { path, .. }) => assert_eq!(path, destination),
            other => panic!("expected DiskFull, got {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_is_corrupt_archive() {
        let mut buffer = vec![0u8; 16];

        let error = copy_entry(&mut BrokenReader, &mut Vec::<u8>::new(), &mut buffer)
            .map(|_| ())
            .err()
            .map(|e| e.into_error(Path::new("a.zip"), Path::new("/tmp/out"), "root/a.pdf"));

        assert!(matches!(error, Some(EaipError::CorruptArchive { .. })));
    }

    #[test]
    fn test_free_space_preflight_rejects_oversized_archive() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out");

        // containers may expose no sized disk for the temp dir; the preflight
        // is skipped there
        let anchor = temp_dir.path().canonicalize().unwrap();
        let disks = Disks::new_with_refreshed_list();
        let has_disk = disks
            .list()
            .iter()
            .filter(|disk| anchor.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .is_some_and(|disk| disk.total_space() > 0);
        if !has_disk {
            println!("Skipping preflight test - no disk found for {}", anchor.display());
            return;
        }

        let result = ensure_free_space(&destination, u64::MAX);
        assert!(matches!(result, Err(EaipError::DiskFull { .. })));
        assert!(ensure_free_space(&destination, 0).is_ok());
    }
}

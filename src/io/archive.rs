use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors encountered when extracting a granule archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt archive: {0}")]
    Zip(#[from] ZipError),
    #[error("entry `{0}` would be extracted outside the target directory")]
    UnsafePath(String),
}

/// Counts of what an extraction produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Extract every entry of `zip_path` under `target_dir`, keeping the archive's directory layout.
///
/// All entry names are checked before anything is written: an archive with a single
/// entry that escapes `target_dir` (absolute path or `..` traversal) is rejected whole.
pub fn extract_archive(zip_path: &Path, target_dir: &Path) -> Result<ExtractReport, ArchiveError> {
    info!("Extracting {:?} into {:?}", zip_path, target_dir);
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.enclosed_name().is_none() {
            warn!("Rejecting unsafe archive entry {:?}", entry.name());
            return Err(ArchiveError::UnsafePath(entry.name().to_string()));
        }
    }

    fs::create_dir_all(target_dir)?;
    let mut report = ExtractReport::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafePath(entry.name().to_string()))?;
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            report.directories += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&out_path)?);
        let written = io::copy(&mut entry, &mut writer)?;
        writer.flush()?;
        debug!("Extracted {:?} ({} bytes)", out_path, written);

        report.files += 1;
        report.bytes += written;
    }

    info!(
        "Extracted {} files in {} directories ({} bytes)",
        report.files, report.directories, report.bytes
    );
    Ok(report)
}

/// Extract `zip_path` so that `target_dir` ends up holding exactly the archive's contents.
///
/// Entries are extracted into a staging directory beside `target_dir`, which then
/// replaces any previous `target_dir`. A failed extraction leaves the previous
/// contents in place.
pub fn extract_archive_replacing(
    zip_path: &Path,
    target_dir: &Path,
) -> Result<ExtractReport, ArchiveError> {
    let parent = match target_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(&parent)?;

    let report = extract_archive(zip_path, staging.path())?;

    if target_dir.exists() {
        debug!("Replacing previous extraction {:?}", target_dir);
        fs::remove_dir_all(target_dir)?;
    }
    fs::rename(staging.path(), target_dir)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    fn files_under(dir: &Path) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(d) = stack.pop() {
            for entry in fs::read_dir(&d).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    out.push(path.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    #[test]
    fn preserves_directory_layout() {
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("smap.zip");
        build_zip(
            &zip_path,
            &[
                ("A/", ""),
                ("A/sm_a.tif", "aaaa"),
                ("B/sm_b.tif", "bb"),
            ],
        );
        let target = work.path().join("out");

        let report = extract_archive(&zip_path, &target).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 1);
        assert_eq!(report.bytes, 6);
        assert_eq!(files_under(&target), ["A/sm_a.tif", "B/sm_b.tif"]);
        assert_eq!(fs::read(target.join("A/sm_a.tif")).unwrap(), b"aaaa");
    }

    #[test]
    fn traversal_entries_are_rejected_before_writing() {
        for evil in ["../evil.tif", "A/../../evil.tif", "/tmp/evil.tif"] {
            let work = tempfile::tempdir().unwrap();
            let zip_path = work.path().join("bad.zip");
            build_zip(&zip_path, &[("A/ok.tif", "ok"), (evil, "pwned")]);
            let target = work.path().join("nested").join("out");

            let err = extract_archive(&zip_path, &target).unwrap_err();

            assert!(matches!(err, ArchiveError::UnsafePath(ref name) if name == evil));
            assert!(!target.exists());
            assert!(!work.path().join("nested").join("evil.tif").exists());
            assert!(!work.path().join("evil.tif").exists());
        }
    }

    #[test]
    fn corrupt_archive_fails() {
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("corrupt.zip");
        fs::write(&zip_path, b"PK\x03\x04 definitely not a zip").unwrap();
        let err = extract_archive(&zip_path, &work.path().join("out")).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip(_)));
    }

    #[test]
    fn replacing_extraction_drops_stale_granules() {
        let work = tempfile::tempdir().unwrap();
        let target = work.path().join("extracted").join("SPL3SMP_004_20150331_20150401");

        let first = work.path().join("first.zip");
        build_zip(&first, &[("X/", ""), ("X/a.tif", "a")]);
        extract_archive_replacing(&first, &target).unwrap();

        let second = work.path().join("second.zip");
        build_zip(&second, &[("Y/", ""), ("Y/b.tif", "b")]);
        let report = extract_archive_replacing(&second, &target).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(files_under(&target), ["Y/b.tif"]);
        let tiles = crate::core::discover::discover_tiles(&target).unwrap();
        assert_eq!(tiles.len(), report.files);
        assert_eq!(fs::read_dir(work.path().join("extracted")).unwrap().count(), 1);
    }

    #[test]
    fn failed_replacement_keeps_previous_extraction() {
        let work = tempfile::tempdir().unwrap();
        let target = work.path().join("out");

        let good = work.path().join("good.zip");
        build_zip(&good, &[("X/a.tif", "a")]);
        extract_archive_replacing(&good, &target).unwrap();

        let bad = work.path().join("bad.zip");
        build_zip(&bad, &[("Y/b.tif", "b"), ("../evil.tif", "pwned")]);
        assert!(extract_archive_replacing(&bad, &target).is_err());

        assert_eq!(files_under(&target), ["X/a.tif"]);
        let staging_left = fs::read_dir(work.path())
            .unwrap()
            .any(|e| e.unwrap().file_name().to_string_lossy().starts_with(".extract-"));
        assert!(!staging_left);
    }
}

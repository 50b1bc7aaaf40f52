//! I/O layer: ZIP archive extraction (`archive`), GDAL-backed tile reading
//! (`gdal`), and `writers` for the stacked GeoTIFF and its metadata.
pub mod archive;
pub use archive::{ArchiveError, ExtractReport, extract_archive, extract_archive_replacing};

pub mod gdal;
pub use self::gdal::{RasterError, TileMetadata, TileReader};

pub mod writers;

/// Builder for staging files that are later persisted as final outputs.
///
/// Staging files are created with the mode a plain `File::create` would use
/// (0666 minus the umask) rather than tempfile's owner-only default.
pub(crate) fn staging_builder<'a>(
    prefix: &'a str,
    suffix: &'a str,
) -> tempfile::Builder<'a, 'a> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(suffix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}

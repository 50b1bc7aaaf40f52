use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::io::gdal::RasterError;

/// One raster tile found under the extraction root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub path: PathBuf,
    /// Name of the granule subdirectory holding the tile
    pub granule: String,
    pub file_name: String,
}

impl TileSource {
    /// `granule/file`, used as the band description.
    pub fn label(&self) -> String {
        format!("{}/{}", self.granule, self.file_name)
    }
}

fn is_geotiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}

/// Entries of `dir` accepted by `keep`, sorted by file name.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<(String, PathBuf)>, RasterError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !keep(&path) {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        entries.push((name, path));
    }
    entries.sort();
    Ok(entries)
}

/// Find the tiles to stack under `root`.
///
/// Band order is lexicographic by granule subdirectory name, then by file name
/// within each granule. Only `.tif`/`.tiff` files directly inside an immediate
/// subdirectory of `root` are considered.
pub fn discover_tiles(root: &Path) -> Result<Vec<TileSource>, RasterError> {
    let mut tiles = Vec::new();
    for (granule, dir) in sorted_entries(root, |p| p.is_dir())? {
        for (file_name, path) in sorted_entries(&dir, |p| p.is_file())? {
            if !is_geotiff(&path) {
                debug!("Skipping non-GeoTIFF {:?}", path);
                continue;
            }
            tiles.push(TileSource {
                path,
                granule: granule.clone(),
                file_name,
            });
        }
    }
    if tiles.is_empty() {
        return Err(RasterError::NoTiles(root.to_path_buf()));
    }
    debug!("Discovered {} tiles under {:?}", tiles.len(), root);
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn orders_by_granule_then_file() {
        let root = tempfile::tempdir().unwrap();
        // created out of order on purpose
        touch(&root.path().join("C/sm.tif"));
        touch(&root.path().join("A/sm_pm.tif"));
        touch(&root.path().join("A/sm_am.TIF"));
        touch(&root.path().join("B/sm.tiff"));
        touch(&root.path().join("B/readme.xml"));
        touch(&root.path().join("stray.tif"));

        let labels: Vec<String> = discover_tiles(root.path())
            .unwrap()
            .iter()
            .map(TileSource::label)
            .collect();
        assert_eq!(labels, ["A/sm_am.TIF", "A/sm_pm.tif", "B/sm.tiff", "C/sm.tif"]);
    }

    #[test]
    fn empty_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("A")).unwrap();
        assert!(matches!(
            discover_tiles(root.path()),
            Err(RasterError::NoTiles(_))
        ));
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_tiles(&root.path().join("absent")),
            Err(RasterError::Io(_))
        ));
    }
}

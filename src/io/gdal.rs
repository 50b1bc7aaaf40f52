use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::GeoTransform;

/// Errors encountered while reading tiles or writing the stacked raster
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("cannot open tile {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: GdalCrateError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no GeoTIFF tiles found under {0}")]
    NoTiles(PathBuf),
    #[error("unsupported raster {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
    #[error("{path} has {bands} bands, expected a single-band tile")]
    NotSingleBand { path: PathBuf, bands: usize },
    #[error("dimension mismatch in {path}: expected {}x{}, got {}x{}", .expected.0, .expected.1, .found.0, .found.1)]
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("geotransform mismatch in {path}: expected {expected:?}, got {found:?}")]
    GeoTransformMismatch {
        path: PathBuf,
        expected: GeoTransform,
        found: GeoTransform,
    },
    #[error("projection mismatch in {path}")]
    ProjectionMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("output {0} already exists")]
    OutputExists(PathBuf),
    #[error("band {index} out of range (1..={bands})")]
    BandOutOfRange { index: usize, bands: usize },
}

/// Spatial metadata of one raster tile
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    pub geotransform: GeoTransform,
    /// Spatial reference as returned by GDAL (usually WKT)
    pub projection: String,
    /// Nodata value of the first band, if declared
    pub no_data: Option<f64>,
}

impl TileMetadata {
    /// EPSG code from the projection's outermost authority tag, e.g. `EPSG:4326`.
    pub fn epsg(&self) -> Option<String> {
        const KEY: &str = "AUTHORITY[\"EPSG\",\"";
        if self.projection.starts_with("EPSG:") {
            return Some(self.projection.clone());
        }
        let start = self.projection.rfind(KEY)? + KEY.len();
        let end = self.projection[start..].find('"')?;
        Some(format!("EPSG:{}", &self.projection[start..start + end]))
    }
}

/// Single-band tile opened through GDAL
pub struct TileReader {
    dataset: Dataset,
    pub path: PathBuf,
    pub metadata: TileMetadata,
}

impl TileReader {
    /// Open a GDAL-supported raster (GeoTIFF in practice)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path = path.as_ref().to_path_buf();
        let dataset = Dataset::open(&path).map_err(|source| RasterError::Open {
            path: path.clone(),
            source,
        })?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(RasterError::Unsupported {
                path,
                reason: "no raster bands".into(),
            });
        }
        // Rasters without georeferencing report GDAL's default identity transform
        let geotransform = dataset
            .geo_transform()
            .unwrap_or([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let projection = dataset.projection();
        let no_data = dataset.rasterband(1)?.no_data_value();

        Ok(TileReader {
            dataset,
            path,
            metadata: TileMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
                no_data,
            },
        })
    }

    /// Read a band (1-based index) as an f32 array of shape (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f32>, RasterError> {
        if index == 0 || index > self.metadata.bands {
            return Err(RasterError::BandOutOfRange {
                index,
                bands: self.metadata.bands,
            });
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f32>((0, 0), window, window, None)?;
        let data = buf.data().to_vec();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data).map_err(|e| {
            RasterError::Unsupported {
                path: self.path.clone(),
                reason: format!("unexpected buffer shape: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writers::tiff::write_tile;
    use ndarray::Array2;

    #[test]
    fn reads_back_written_tile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        let data = Array2::from_shape_fn((4, 6), |(r, c)| (r * 10 + c) as f32 + 0.25);
        let gt = [100.0, 0.5, 0.0, 200.0, 0.0, -0.5];
        write_tile(&path, &data, gt, "", Some(-9999.0)).unwrap();

        let reader = TileReader::open(&path).unwrap();
        assert_eq!(reader.metadata.size_x, 6);
        assert_eq!(reader.metadata.size_y, 4);
        assert_eq!(reader.metadata.bands, 1);
        assert_eq!(reader.metadata.geotransform, gt);
        assert_eq!(reader.metadata.no_data, Some(-9999.0));
        assert_eq!(reader.read_band(1).unwrap(), data);
    }

    #[test]
    fn band_index_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        write_tile(&path, &Array2::zeros((2, 2)), [0.0, 1.0, 0.0, 0.0, 0.0, -1.0], "", None)
            .unwrap();
        let reader = TileReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_band(0),
            Err(RasterError::BandOutOfRange { index: 0, bands: 1 })
        ));
        assert!(matches!(
            reader.read_band(2),
            Err(RasterError::BandOutOfRange { index: 2, bands: 1 })
        ));
    }

    #[test]
    fn unreadable_tile_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tif");
        std::fs::write(&path, b"not a tiff").unwrap();
        match TileReader::open(&path) {
            Err(RasterError::Open { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("garbage opened as raster"),
        }
    }

    #[test]
    fn epsg_from_wkt_authority() {
        let meta = TileMetadata {
            size_x: 1,
            size_y: 1,
            bands: 1,
            geotransform: [0.0; 6],
            projection: "GEOGCS[\"WGS 84\",AUTHORITY[\"EPSG\",\"4326\"]]".to_string(),
            no_data: None,
        };
        assert_eq!(meta.epsg().as_deref(), Some("EPSG:4326"));
    }
}

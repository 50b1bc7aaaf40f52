use gdal::raster::{Buffer, ColorInterpretation};
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

use crate::io::gdal::RasterError;
use crate::types::GeoTransform;

fn to_buffer(data: &Array2<f32>) -> Buffer<f32> {
    let (rows, cols) = data.dim();
    Buffer::new((cols, rows), data.iter().copied().collect())
}

fn create_f32(
    output: &Path,
    cols: usize,
    rows: usize,
    bands: usize,
    geotransform: GeoTransform,
    projection: &str,
) -> Result<Dataset, RasterError> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f32, _>(output, cols, rows, bands)?;
    ds.set_geo_transform(&geotransform)?;
    if !projection.is_empty() {
        ds.set_projection(projection)?;
    }
    Ok(ds)
}

/// Write a single-band Float32 GeoTIFF
pub fn write_tile(
    output: &Path,
    data: &Array2<f32>,
    geotransform: GeoTransform,
    projection: &str,
    no_data: Option<f64>,
) -> Result<(), RasterError> {
    let (rows, cols) = data.dim();
    let mut ds = create_f32(output, cols, rows, 1, geotransform, projection)?;
    {
        let mut band = ds.rasterband(1)?;
        if no_data.is_some() {
            band.set_no_data_value(no_data)?;
        }
        band.write((0, 0), (cols, rows), &mut to_buffer(data))?;
    }
    ds.flush_cache()?;
    Ok(())
}

/// Multi-band Float32 GeoTIFF filled one band at a time, in order
pub struct StackWriter {
    dataset: Dataset,
    cols: usize,
    rows: usize,
    bands: usize,
    written: usize,
}

impl StackWriter {
    pub fn create(
        output: &Path,
        cols: usize,
        rows: usize,
        bands: usize,
        geotransform: GeoTransform,
        projection: &str,
    ) -> Result<Self, RasterError> {
        let dataset = create_f32(output, cols, rows, bands, geotransform, projection)?;
        debug!("Created {}x{}x{} Float32 GeoTIFF {:?}", cols, rows, bands, output);
        Ok(Self {
            dataset,
            cols,
            rows,
            bands,
            written: 0,
        })
    }

    /// Number of bands written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write `data` into the next band and return its 1-based index.
    pub fn write_band(
        &mut self,
        data: &Array2<f32>,
        description: &str,
        no_data: Option<f64>,
    ) -> Result<usize, RasterError> {
        let index = self.written + 1;
        if index > self.bands {
            return Err(RasterError::BandOutOfRange {
                index,
                bands: self.bands,
            });
        }
        let (rows, cols) = data.dim();
        if (cols, rows) != (self.cols, self.rows) {
            return Err(RasterError::DimensionMismatch {
                path: description.into(),
                expected: (self.cols, self.rows),
                found: (cols, rows),
            });
        }

        let mut band = self.dataset.rasterband(index)?;
        band.set_color_interpretation(ColorInterpretation::GrayIndex)?;
        band.set_description(description)?;
        if no_data.is_some() {
            band.set_no_data_value(no_data)?;
        }
        band.write((0, 0), (cols, rows), &mut to_buffer(data))?;

        self.written = index;
        Ok(index)
    }

    /// Set dataset-level metadata items in the default domain.
    pub fn set_metadata(&mut self, items: &[(String, String)]) -> Result<(), RasterError> {
        for (key, value) in items {
            self.dataset.set_metadata_item(key, value, "")?;
        }
        Ok(())
    }

    /// Flush to disk and release the dataset. Every band must have been written.
    pub fn finish(mut self) -> Result<(), RasterError> {
        if self.written != self.bands {
            return Err(RasterError::BandOutOfRange {
                index: self.written,
                bands: self.bands,
            });
        }
        self.dataset.flush_cache()?;
        Ok(())
    }
}

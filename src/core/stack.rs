use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::discover::TileSource;
use crate::io::gdal::{RasterError, TileMetadata, TileReader};
use crate::io::staging_builder;
use crate::io::writers::metadata::stack_metadata_items;
use crate::io::writers::tiff::StackWriter;
use crate::net::request::DataRequest;

/// Options controlling how the stacked raster is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackOptions {
    /// Replace an existing output file
    pub overwrite: bool,
}

/// Outcome of a successful stacking run
#[derive(Debug, Clone, PartialEq)]
pub struct StackReport {
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    /// Tile written to each band; band `i + 1` came from `bands[i]`
    pub bands: Vec<TileSource>,
    pub reference: TileMetadata,
}

/// Check that every tile is single-band and shares the first tile's grid.
///
/// Returns the reference metadata (the first tile's) when all tiles agree.
pub fn check_compatibility<'a>(
    tiles: &[(&'a Path, &'a TileMetadata)],
) -> Result<&'a TileMetadata, RasterError> {
    let Some(&(_, reference)) = tiles.first() else {
        return Err(RasterError::NoTiles(PathBuf::new()));
    };
    for &(path, meta) in tiles {
        if meta.bands != 1 {
            return Err(RasterError::NotSingleBand {
                path: path.to_path_buf(),
                bands: meta.bands,
            });
        }
        if (meta.size_x, meta.size_y) != (reference.size_x, reference.size_y) {
            return Err(RasterError::DimensionMismatch {
                path: path.to_path_buf(),
                expected: (reference.size_x, reference.size_y),
                found: (meta.size_x, meta.size_y),
            });
        }
        if meta.geotransform != reference.geotransform {
            return Err(RasterError::GeoTransformMismatch {
                path: path.to_path_buf(),
                expected: reference.geotransform,
                found: meta.geotransform,
            });
        }
        if meta.projection != reference.projection {
            return Err(RasterError::ProjectionMismatch {
                path: path.to_path_buf(),
                expected: reference.projection.clone(),
                found: meta.projection.clone(),
            });
        }
    }
    Ok(reference)
}

/// Stack `tiles` into one Float32 GeoTIFF at `output`, one band per tile, in slice order.
///
/// The raster is built under a temporary name beside `output` and renamed into
/// place only after every band is written and flushed; on failure the
/// temporary file is removed and `output` is left as it was.
pub fn stack_tiles(
    tiles: &[TileSource],
    output: &Path,
    options: &StackOptions,
    request: Option<&DataRequest>,
) -> Result<StackReport, RasterError> {
    if tiles.is_empty() {
        return Err(RasterError::NoTiles(PathBuf::new()));
    }
    if output.exists() && !options.overwrite {
        return Err(RasterError::OutputExists(output.to_path_buf()));
    }

    let metas = tiles
        .iter()
        .map(|t| TileReader::open(&t.path).map(|r| r.metadata))
        .collect::<Result<Vec<_>, _>>()?;
    let pairs: Vec<(&Path, &TileMetadata)> = tiles
        .iter()
        .map(|t| t.path.as_path())
        .zip(metas.iter())
        .collect();
    let reference = check_compatibility(&pairs)?.clone();
    info!(
        "Stacking {} tiles of {}x{} ({})",
        tiles.len(),
        reference.size_x,
        reference.size_y,
        reference.epsg().as_deref().unwrap_or("unknown CRS")
    );

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let staging = staging_builder(".stack-", ".tif")
        .tempfile_in(&parent)?
        .into_temp_path();

    {
        let mut writer = StackWriter::create(
            &staging,
            reference.size_x,
            reference.size_y,
            tiles.len(),
            reference.geotransform,
            &reference.projection,
        )?;
        for tile in tiles {
            let reader = TileReader::open(&tile.path)?;
            let data = reader.read_band(1)?;
            let index = writer.write_band(&data, &tile.label(), reader.metadata.no_data)?;
            debug!("Band {} <- {}", index, tile.label());
        }
        writer.set_metadata(&stack_metadata_items(tiles, request))?;
        writer.finish()?;
    }

    let persisted = if options.overwrite {
        staging.persist(output)
    } else {
        staging.persist_noclobber(output)
    };
    persisted.map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            RasterError::OutputExists(output.to_path_buf())
        } else {
            RasterError::Io(e.error)
        }
    })?;
    info!("Wrote {} bands to {:?}", tiles.len(), output);

    Ok(StackReport {
        output: output.to_path_buf(),
        width: reference.size_x,
        height: reference.size_y,
        bands: tiles.to_vec(),
        reference,
    })
}

//! Provenance metadata embedded into the stacked GeoTIFF.
//!
//! Items are written to the default GDAL metadata domain, so `gdalinfo` shows
//! which granule and file each band came from. No timestamps are recorded;
//! stacking the same tiles twice yields the same bytes.
use crate::core::discover::TileSource;
use crate::net::request::DataRequest;

pub const KEY_BAND_COUNT: &str = "STACK_BAND_COUNT";
pub const KEY_SOURCES: &str = "STACK_SOURCES";
pub const KEY_TOOL: &str = "STACK_TOOL";
pub const KEY_DATASET: &str = "STACK_DATASET";
pub const KEY_VERSION: &str = "STACK_VERSION";
pub const KEY_TIME_RANGE: &str = "STACK_TIME_RANGE";
pub const KEY_COVERAGE: &str = "STACK_COVERAGE";

/// Metadata describing a stack built from `tiles`, optionally tagged with the request that produced them.
pub fn stack_metadata_items(
    tiles: &[TileSource],
    request: Option<&DataRequest>,
) -> Vec<(String, String)> {
    let mut items = vec![
        (KEY_BAND_COUNT.to_string(), tiles.len().to_string()),
        (
            KEY_SOURCES.to_string(),
            tiles
                .iter()
                .map(TileSource::label)
                .collect::<Vec<_>>()
                .join(";"),
        ),
        (
            KEY_TOOL.to_string(),
            format!("smapstack {}", env!("CARGO_PKG_VERSION")),
        ),
    ];
    if let Some(req) = request {
        items.push((KEY_DATASET.to_string(), req.short_name.clone()));
        items.push((KEY_VERSION.to_string(), req.version.clone()));
        items.push((KEY_TIME_RANGE.to_string(), req.time_range.to_string()));
        items.push((KEY_COVERAGE.to_string(), req.coverage.clone()));
    }
    items
}

//! Writers for the stacked output: the Float32 GeoTIFF itself (`tiff`) and the
//! provenance metadata embedded into it (`metadata`).
pub mod metadata;
pub mod tiff;

#![doc = r#"
smapstack: fetch SMAP soil-moisture granules and stack their tiles.

This crate authenticates against the NSIDC/CMR data distribution service, requests a
subsetted ZIP archive of single-band GeoTIFF tiles, extracts it safely, and assembles
every tile into one Float32 multi-band GeoTIFF with consistent georeferencing. It powers
the `smapstack` CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Run the whole pipeline from a config file
-----------------------------------------
```rust,no_run
use std::path::Path;
use smapstack::{PipelineConfig, run_pipeline};

fn main() -> smapstack::Result<()> {
    let mut config = PipelineConfig::from_file(Path::new("smap.json"))?;
    // SMAPSTACK_USERNAME / SMAPSTACK_PASSWORD / ... override the file
    config.apply_env();

    let report = run_pipeline(&config)?;
    println!("{} bands written to {:?}", report.stack.bands.len(), report.stack.output);
    Ok(())
}
```

Stack an already extracted archive
----------------------------------
```rust,no_run
use std::path::Path;
use smapstack::{StackOptions, stack_directory};

fn main() -> smapstack::Result<()> {
    let report = stack_directory(
        Path::new("extracted/5000000"),
        Path::new("stack.tif"),
        &StackOptions { overwrite: true },
    )?;
    for (i, tile) in report.bands.iter().enumerate() {
        println!("band {} <- {}", i + 1, tile.label());
    }
    Ok(())
}
```

Band order
----------
Bands follow the lexicographic order of granule subdirectory names, then of file
names within each granule. Every tile must share the first tile's size,
geotransform and projection; a mismatch fails with [`RasterError`] before any
output is allocated. The output is written under a temporary name and renamed
into place only on success.

Error handling
--------------
All public functions return `smapstack::Result<T>`; every `smapstack::Error` variant
names the pipeline stage that failed.

```rust,no_run
use smapstack::{Error, PipelineConfig, fetch};

fn main() {
    let config = PipelineConfig::default();
    match fetch(&config) {
        Ok(report) => println!("extracted into {:?}", report.extract_dir),
        Err(Error::Auth(e)) => eprintln!("authentication failed: {e}"),
        Err(Error::Request(e)) => eprintln!("data request failed: {e}"),
        Err(other) => eprintln!("{} stage failed: {other}", other.stage()),
    }
}
```

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`net`]: token exchange, request URLs, and streamed downloads.
- [`io`]: archive extraction and GDAL readers/writers.
- [`core`]: configuration, tile discovery, and stack assembly.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod net;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::discover::TileSource;
pub use crate::core::params::{Credentials, PipelineConfig};
pub use error::{Error, Result};
pub use types::{GeoTransform, TimeRange};

// Stage errors
pub use error::{ArchiveError, AuthError, ConfigError, RasterError, RequestError};

// Readers
pub use io::gdal::{TileMetadata, TileReader};

// High-level API re-exports
pub use api::{
    FetchReport, PipelineReport, StackOptions, StackReport, authenticate, fetch, run_pipeline,
    stack_directory,
};

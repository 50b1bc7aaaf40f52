//! High-level, ergonomic library API: exchange credentials for a token, fetch and
//! extract a granule archive, stack a directory of tiles, or run the whole pipeline
//! from a `PipelineConfig`. Prefer these entrypoints over the lower-level modules.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::discover::discover_tiles;
use crate::core::params::PipelineConfig;
use crate::core::stack::stack_tiles;
use crate::error::Result;
use crate::io::archive::{ExtractReport, extract_archive_replacing};
use crate::io::gdal::RasterError;
use crate::net::request::DataRequest;
use crate::net::{AuthError, RequestError, Token, build_client, download_archive, request_token};

pub use crate::core::stack::{StackOptions, StackReport};

/// Result of the download and extraction stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub archive: PathBuf,
    pub bytes: u64,
    /// Directory the archive was extracted into; its subdirectories are the granules
    pub extract_dir: PathBuf,
    pub extracted: ExtractReport,
}

/// Result of a full pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub fetch: FetchReport,
    pub stack: StackReport,
}

/// Exchange the configured credentials for a token.
pub fn authenticate(config: &PipelineConfig) -> Result<Token> {
    config.validate_credentials()?;
    let client = build_client(config.timeout()).map_err(AuthError::from)?;
    Ok(request_token(&client, &config.auth_url, &config.credentials())?)
}

/// Authenticate, download the requested archive, and extract it.
///
/// The archive lands in `download_dir`; its contents replace a subdirectory of
/// `extract_dir` named after the archive, so granules from earlier runs never
/// mix into this one.
pub fn fetch(config: &PipelineConfig) -> Result<FetchReport> {
    config.validate()?;
    let request = config.data_request()?;
    let client = build_client(config.timeout()).map_err(RequestError::from)?;

    let token = request_token(&client, &config.auth_url, &config.credentials())?;
    let url = request.to_url(&config.data_url, &token)?;
    let download = download_archive(
        &client,
        &url,
        &config.download_dir,
        &request.fallback_archive_name(),
    )?;

    let extract_dir = extraction_dir(&config.extract_dir, &download.path);
    let extracted = extract_archive_replacing(&download.path, &extract_dir)?;

    Ok(FetchReport {
        archive: download.path,
        bytes: download.bytes,
        extract_dir,
        extracted,
    })
}

fn extraction_dir(root: &Path, archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    root.join(stem)
}

/// Stack every tile found under `input_dir` into `output`.
pub fn stack_directory(
    input_dir: &Path,
    output: &Path,
    options: &StackOptions,
) -> Result<StackReport> {
    stack_directory_with_request(input_dir, output, options, None)
}

fn stack_directory_with_request(
    input_dir: &Path,
    output: &Path,
    options: &StackOptions,
    request: Option<&DataRequest>,
) -> Result<StackReport> {
    let tiles = discover_tiles(input_dir)?;
    Ok(stack_tiles(&tiles, output, options, request)?)
}

/// Run credential exchange, download, extraction, and stacking in sequence.
///
/// An existing `output` without `overwrite` fails before any network request.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    if !config.overwrite && config.output.exists() {
        return Err(RasterError::OutputExists(config.output.clone()).into());
    }
    let fetch = fetch(config)?;
    let request = config.data_request()?;
    let options = StackOptions {
        overwrite: config.overwrite,
    };
    let stack = stack_directory_with_request(
        &fetch.extract_dir,
        &config.output,
        &options,
        Some(&request),
    )?;
    info!(
        "Pipeline complete: {} bands -> {:?}",
        stack.bands.len(),
        stack.output
    );
    Ok(PipelineReport { fetch, stack })
}

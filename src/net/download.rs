use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::{debug, info, warn};

use super::RequestError;
use crate::io::staging_builder;

/// Size of each chunk copied from the response body to disk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A downloaded archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Extract a bare file name from a `Content-Disposition` header value.
///
/// An RFC 5987 `filename*` parameter takes precedence over `filename` and is
/// percent-decoded. Directory components are stripped.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw.trim().trim_matches('"').to_string()),
            // charset'lang'value
            "filename*" => {
                extended = raw
                    .trim()
                    .trim_matches('"')
                    .rsplit('\'')
                    .next()
                    .and_then(percent_decode)
            }
            _ => {}
        }
    }
    let name = extended.or(plain)?;
    let name = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Scheme, host and path of `url`; the query carries the token and is never logged.
fn display_url(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.path()
    )
}

/// Stream the archive at `url` into `dest_dir`.
///
/// The body is written to a staging file first and renamed once the stream
/// completes, so an interrupted transfer leaves nothing behind.
pub fn download_archive(
    client: &Client,
    url: &Url,
    dest_dir: &Path,
    fallback_name: &str,
) -> Result<Download, RequestError> {
    fs::create_dir_all(dest_dir)?;
    info!("Requesting archive from {}", display_url(url));

    let mut response = client.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        let body = match response.text() {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read error response body: {}", e);
                format!("<unreadable response body: {}>", e)
            }
        };
        warn!("Data request rejected with HTTP {}", status.as_u16());
        return Err(RequestError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let name = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| fallback_name.to_string());
    let target = dest_dir.join(&name);

    let staging = staging_builder(".download-", ".part").tempfile_in(dest_dir)?;
    let (file, staging_path) = staging.into_parts();
    let mut writer = BufWriter::new(file);

    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = response.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        writer.write_all(&chunk[..n])?;
        bytes += n as u64;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    staging_path.persist(&target).map_err(|e| e.error)?;
    debug!("Wrote {} bytes", bytes);
    info!("Archive saved to {:?}", target);

    Ok(Download {
        path: target,
        bytes,
    })
}

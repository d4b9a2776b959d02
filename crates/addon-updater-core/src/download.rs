use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::{debug, info};
use tokio::io::AsyncWriteExt;

use crate::error::UpdateError;

const SNIPPET_CHARS: usize = 160;

/// GET `url` and return the response body as text.
pub(crate) async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    context: &'static str,
) -> Result<String, UpdateError> {
    debug!("Fetching {}", redact_url(url));
    let response = send_checked(client, url, context).await?;
    response
        .text()
        .await
        .map_err(|error| UpdateError::network(context, error))
}

/// Stream `url` into a temporary file next to the install target, then
/// atomically move it over the target.
///
/// The target is only touched by the final rename, so any failure before it
/// leaves the existing file exactly as it was. A symlinked `dest` is resolved
/// first so the link's target is updated and the link itself is kept.
pub(crate) async fn download_and_persist(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, UpdateError> {
    const CONTEXT: &str = "add-on source download";

    let target = install_target(dest);
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    info!("Downloading add-on source from {}", redact_url(url));
    let response = send_checked(client, url, CONTEXT).await?;

    let temp = tempfile::Builder::new()
        .prefix(".addon-update")
        .tempfile_in(parent)
        .map_err(|error| UpdateError::io("failed to create temporary file", parent, error))?;
    let handle = temp
        .reopen()
        .map_err(|error| UpdateError::io("failed to open temporary file", temp.path(), error))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| UpdateError::network("download stream error", error))?;
        file.write_all(&chunk).await.map_err(|error| {
            UpdateError::io("failed to write download data", temp.path(), error)
        })?;
        downloaded += chunk.len() as u64;
    }

    if downloaded == 0 {
        return Err(UpdateError::Invalid(
            "downloaded add-on source is empty; refusing to replace the installed file"
                .to_string(),
        ));
    }

    file.flush()
        .await
        .map_err(|error| UpdateError::io("failed to flush download file", temp.path(), error))?;
    file.sync_all()
        .await
        .map_err(|error| UpdateError::io("failed to sync download file", temp.path(), error))?;
    drop(file);

    if let Ok(metadata) = tokio::fs::metadata(&target).await {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|error| {
                UpdateError::io("failed to copy file permissions", temp.path(), error)
            })?;
    }

    temp.persist(&target).map_err(|error| {
        UpdateError::io("failed to replace installed add-on", &target, error.error)
    })?;

    info!("Wrote {downloaded} bytes to {}", target.display());
    Ok(downloaded)
}

/// The real file behind `dest`, or `dest` itself when it does not exist yet.
fn install_target(dest: &Path) -> PathBuf {
    match std::fs::canonicalize(dest) {
        Ok(resolved) => {
            if resolved != dest {
                debug!("Add-on path {} resolves to {}", dest.display(), resolved.display());
            }
            resolved
        }
        Err(_) => dest.to_path_buf(),
    }
}

async fn send_checked(
    client: &reqwest::Client,
    url: &str,
    context: &'static str,
) -> Result<reqwest::Response, UpdateError> {
    let response = client
        .get(url)
        .header("User-Agent", "addon-updater")
        .send()
        .await
        .map_err(|error| UpdateError::network(context, error))?;

    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body_snippet = response
        .text()
        .await
        .ok()
        .map(|body| response_snippet(&body, SNIPPET_CHARS))
        .unwrap_or_default();
    Err(UpdateError::HttpStatus {
        context,
        status,
        body_snippet,
    })
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.trim().chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

/// Drop the query string and fragment so URL-embedded tokens stay out of logs.
#[must_use]
pub fn redact_url(url: &str) -> String {
    match url.find(['?', '#']) {
        Some(idx) => {
            let (base, rest) = url.split_at(idx);
            format!("{base}{}<redacted>", &rest[..1])
        }
        None => url.to_string(),
    }
}

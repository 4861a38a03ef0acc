//! Blocking HTTP client for the heatmap backend, plus the on-disk heatmap cache.

use crate::app_core::geometry::CellIndex;
use crate::error::{DashboardError, Result};
use crate::model::{CellDetail, DashboardSummary, ResultsInfo, VideoEntry};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rendered heatmaps never change once a video is processed, but the backend
/// may re-run analysis under the same id.
pub const HEATMAP_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

pub struct ApiClient {
    base: Url,
    http: reqwest::blocking::Client,
    cache_dir: Option<PathBuf>,
    force: bool,
}

impl ApiClient {
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let base = parse_base_url(server)?;
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base,
            http,
            cache_dir: None,
            force: false,
        })
    }

    /// Enables the heatmap image cache. `force` skips cached copies.
    pub fn with_cache(mut self, cache_dir: PathBuf, force: bool) -> Self {
        self.cache_dir = Some(cache_dir);
        self.force = force;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves a server-relative URL (as returned in `snaps` or
    /// `global_heatmap`) against the base URL. Absolute URLs pass through.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| DashboardError::InvalidUrl(format!("{}: {}", path, err)))
    }

    pub fn fetch_dashboard(&self, video_id: u64) -> Result<DashboardSummary> {
        self.get_json(&dashboard_path(video_id))
    }

    /// Fetches a cell's history. Snapshot URLs come back resolved.
    pub fn fetch_cell(&self, video_id: u64, cell: CellIndex) -> Result<CellDetail> {
        let mut detail: CellDetail = self.get_json(&cell_path(video_id, cell))?;
        detail.snaps = detail
            .snaps
            .into_iter()
            .map(|snap| match self.resolve(&snap) {
                Ok(url) => url.to_string(),
                Err(_) => snap,
            })
            .collect();
        Ok(detail)
    }

    pub fn fetch_videos(&self) -> Result<Vec<VideoEntry>> {
        self.get_json("api/videos")
    }

    pub fn fetch_results(&self, video_id: u64) -> Result<ResultsInfo> {
        self.get_json(&format!("api/results/{}", video_id))
    }

    /// Returns the encoded global heatmap image for `video_id`, from the cache
    /// when a fresh copy exists.
    pub fn fetch_heatmap(&self, video_id: u64) -> Result<Vec<u8>> {
        let cached = self
            .cache_dir
            .as_ref()
            .map(|dir| heatmap_cache_path(dir, video_id));

        if let Some(path) = &cached
            && !self.force
            && is_fresh(path, HEATMAP_CACHE_TTL)
        {
            tracing::debug!(path = %path.display(), "using cached heatmap");
            return Ok(fs::read(path)?);
        }

        let results = self.fetch_results(video_id)?;
        let url = self.resolve(&results.global_heatmap)?;

        match cached {
            Some(path) => {
                self.download_to_path(&url, &path)?;
                Ok(fs::read(&path)?)
            }
            None => self.get_bytes(&url),
        }
    }

    /// Downloads one snapshot image. `url` may be absolute or server-relative.
    pub fn fetch_snapshot(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url)?;
        self.get_bytes(&url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.resolve(path)?;
        tracing::debug!(%url, "GET");
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::debug!(%url, "GET");
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    /// Streams `url` into `path`. The file only appears once complete.
    fn download_to_path(&self, url: &Url, path: &Path) -> Result<()> {
        tracing::debug!(%url, path = %path.display(), "downloading");
        let mut response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        // Unique partial file per download; concurrent fetches of one video
        // only meet at the final rename.
        let mut file = tempfile::Builder::new()
            .prefix(".heatmap-")
            .suffix(".part")
            .tempfile_in(parent)?;
        let mut buffer = [0u8; 65536];
        let mut downloaded = 0u64;
        loop {
            let read = response.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            downloaded += read as u64;
        }
        file.flush()?;
        file.persist(path).map_err(|err| err.error)?;
        tracing::info!(bytes = downloaded, path = %path.display(), "heatmap cached");
        Ok(())
    }
}

/// Parses the server URL and makes sure it ends in `/` so relative joins
/// append instead of replacing the last path segment.
pub fn parse_base_url(server: &str) -> Result<Url> {
    let trimmed = server.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash)
        .map_err(|err| DashboardError::InvalidUrl(format!("{}: {}", server, err)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(DashboardError::InvalidUrl(format!(
            "{}: expected an http(s) base URL",
            server
        )));
    }
    Ok(url)
}

pub fn dashboard_path(video_id: u64) -> String {
    format!("api/dashboard/{}", video_id)
}

pub fn cell_path(video_id: u64, cell: CellIndex) -> String {
    format!("api/cell/{}/{}/{}", video_id, cell.gx, cell.gy)
}

pub fn heatmap_cache_path(cache_dir: &Path, video_id: u64) -> PathBuf {
    cache_dir
        .join("heatmaps")
        .join(format!("global_heatmap_{}.png", video_id))
}

fn is_fresh(path: &Path, ttl: Duration) -> bool {
    if let Ok(metadata) = fs::metadata(path)
        && let Ok(modified) = metadata.modified()
    {
        // An mtime in the future counts as fresh.
        return modified.elapsed().map(|elapsed| elapsed <= ttl).unwrap_or(true);
    }
    false
}

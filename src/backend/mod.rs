pub mod scope;

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::analysis::AnalysisResult;

pub use scope::{CancelToken, Scoped, ViewScope};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("{url} returned HTTP {code}")]
    Status { url: String, code: u16 },
    #[error("Failed to parse JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Backend endpoints, passed explicitly to each client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the analysis service (`GET {base}/results/{task_id}`).
    pub analysis_base_url: String,
    /// Base URL of the media service (song metadata, audio, notation, covers).
    pub media_base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            analysis_base_url: "http://localhost:8000".to_string(),
            media_base_url: "http://localhost:8080".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Anything that can produce the analysis result for a task.
pub trait ResultSource: Send + Sync {
    fn fetch_result(&self, task_id: &str) -> Result<AnalysisResult>;
}

/// Client for the analysis backend.
pub struct AnalysisClient {
    base_url: String,
    agent: ureq::Agent,
}

impl AnalysisClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            base_url: trim_base(&config.analysis_base_url),
            agent: build_agent(config.timeout_secs),
        }
    }

    pub fn result_url(&self, task_id: &str) -> Result<String> {
        Ok(format!("{}/results/{}", self.base_url, encode_segment(task_id)?))
    }
}

impl ResultSource for AnalysisClient {
    fn fetch_result(&self, task_id: &str) -> Result<AnalysisResult> {
        let url = self.result_url(task_id)?;
        log::info!("Fetching analysis result {task_id}");
        get_json(&self.agent, &url)
    }
}

/// Song metadata from the media backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    /// Cover image path, relative to the media base or absolute.
    pub thumbnail: String,
    /// Reference audio path, relative to the media base or absolute.
    pub audio: String,
}

/// Client for the media backend.
pub struct MediaClient {
    base_url: String,
    agent: ureq::Agent,
}

impl MediaClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            base_url: trim_base(&config.media_base_url),
            agent: build_agent(config.timeout_secs),
        }
    }

    /// Fetch `GET {media}/songs/{song_id}`.
    pub fn song(&self, song_id: &str) -> Result<SongMetadata> {
        let url = format!("{}/songs/{}", self.base_url, encode_segment(song_id)?);
        log::info!("Fetching song metadata {song_id}");
        get_json(&self.agent, &url)
    }

    /// Downloadable reference audio for a song.
    pub fn audio_url(&self, song_id: &str) -> Result<String> {
        Ok(format!("{}/songs/{}/audio", self.base_url, encode_segment(song_id)?))
    }

    /// Downloadable notation file for a song.
    pub fn notation_url(&self, song_id: &str) -> Result<String> {
        Ok(format!("{}/songs/{}/notation", self.base_url, encode_segment(song_id)?))
    }

    /// Resolve a thumbnail or audio path from metadata against the media base.
    /// Absolute URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub fn cover_url(&self, song: &SongMetadata) -> String {
        self.resolve(&song.thumbnail)
    }
}

fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build()
        .into()
}

fn get_json<T: DeserializeOwned>(agent: &ureq::Agent, url: &str) -> Result<T> {
    log::debug!("GET {url}");
    let mut response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(code) => BackendError::Status {
            url: url.to_string(),
            code,
        },
        other => BackendError::Http {
            url: url.to_string(),
            source: other,
        },
    })?;

    response
        .body_mut()
        .read_json::<T>()
        .map_err(|source| BackendError::Decode {
            url: url.to_string(),
            source,
        })
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Percent-encode an identifier for use as one URL path segment.
fn encode_segment(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(BackendError::InvalidId(id.to_string()));
    }

    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    Ok(out)
}

use super::{RecognizeError, Recognizer, Track};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

// AudD reports undecodable input with error code 300.
const FORMAT_ERROR_CODE: i64 = 300;

#[derive(Deserialize)]
struct AuddResponse {
    status: String,
    result: Option<AuddTrack>,
    error: Option<AuddError>,
}

#[derive(Deserialize)]
struct AuddTrack {
    title: String,
    artist: String,
    spotify: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    album: Option<SpotifyAlbum>,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Deserialize)]
struct AuddError {
    error_code: i64,
    error_message: String,
}

fn parse_response(body: &str) -> Result<Option<Track>, RecognizeError> {
    let response: AuddResponse = serde_json::from_str(body)?;

    if response.status != "success" {
        return Err(match response.error {
            Some(e) if e.error_code == FORMAT_ERROR_CODE => RecognizeError::Format(e.error_message),
            Some(e) => RecognizeError::Api(format!("{} (code {})", e.error_message, e.error_code)),
            None => RecognizeError::Api(format!("status {}", response.status)),
        });
    }

    Ok(response.result.map(|track| Track {
        cover_url: track
            .spotify
            .and_then(|s| s.album)
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url),
        title: track.title,
        performer: track.artist,
    }))
}

/// Recognition through the AudD HTTP API.
#[derive(Debug, Clone)]
pub struct Audd {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl Audd {
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl Recognizer for Audd {
    async fn recognize(&self, path: &Path) -> Result<Option<Track>, RecognizeError> {
        let data = tokio::fs::read(path).await?;
        info!("Starting AudD recognition for {} bytes", data.len());

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.ogg".to_string());

        let file_part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| RecognizeError::Api(format!("Failed to create audio part: {}", e)))?;

        let form = Form::new()
            .text("api_token", self.api_token.clone())
            .text("return", "spotify")
            .part("file", file_part);

        debug!("Sending multipart request to AudD");

        let response = self.client.post(&self.api_url).multipart(form).send().await?;

        let status = response.status();
        debug!("AudD response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(RecognizeError::Api(format!("HTTP {}: {}", status, body)));
        }

        parse_response(&body)
    }
}

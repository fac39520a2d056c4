use super::{RecognizeError, Recognizer, Track};
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Deserialize)]
struct ShazamResponse {
    track: Option<ShazamTrack>,
}

#[derive(Deserialize)]
struct ShazamTrack {
    title: String,
    #[serde(default)]
    subtitle: String,
    images: Option<ShazamImages>,
}

#[derive(Deserialize)]
struct ShazamImages {
    coverart: Option<String>,
}

fn parse_response(json: &str) -> Result<Option<Track>, RecognizeError> {
    let response: ShazamResponse = serde_json::from_str(json)?;
    Ok(response.track.map(|track| Track {
        title: track.title,
        performer: track.subtitle,
        cover_url: track
            .images
            .and_then(|images| images.coverart)
            .filter(|url| !url.is_empty()),
    }))
}

/// Shazam lookups through the `songrec` CLI, which fingerprints a local file.
#[derive(Debug, Clone)]
pub struct Songrec {
    binary: String,
}

impl Songrec {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Recognizer for Songrec {
    async fn recognize(&self, path: &Path) -> Result<Option<Track>, RecognizeError> {
        info!("Recognizing {} with songrec", path.display());

        let mut cmd = Command::new(&self.binary);
        cmd.arg("audio-file-to-recognized-song")
            .arg(path)
            .stdin(Stdio::null());

        debug!("Running songrec command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RecognizeError::NotInstalled(self.binary.clone())
            } else {
                RecognizeError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognizeError::Format(stderr.trim().to_string()));
        }

        let track = parse_response(&String::from_utf8_lossy(&output.stdout))?;
        match &track {
            Some(t) => info!("songrec matched {:?} by {:?}", t.title, t.performer),
            None => info!("songrec found no match for {}", path.display()),
        }
        Ok(track)
    }
}

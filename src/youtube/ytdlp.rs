use super::{
    MediaStream, SearchProvider, SearchResult, StreamProducer, VideoError, VideoHost, VideoInfo,
    default_thumbnail, format_duration, watch_url,
};
use crate::payload::MediaFormat;
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;

const AUDIO_SELECTOR: &str = "bestaudio[ext=m4a]/bestaudio";
// 18 is the 360p mp4 with audio muxed in; higher tiers need a local merge.
const VIDEO_SELECTOR: &str = "18/best[ext=mp4][height<=360]/best";

#[derive(Deserialize, Debug)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize, Debug)]
struct Entry {
    id: String,
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
}

impl Entry {
    fn thumbnail_url(&self) -> String {
        self.thumbnail
            .clone()
            .or_else(|| self.thumbnails.last().map(|t| t.url.clone()))
            .unwrap_or_else(|| default_thumbnail(&self.id))
    }

    fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.clone())
    }

    fn into_search_result(self) -> SearchResult {
        SearchResult {
            title: self.title(),
            author: self
                .channel
                .clone()
                .or_else(|| self.uploader.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            thumbnail_url: self.thumbnail_url(),
            duration_label: format_duration(self.duration),
            page_url: self
                .webpage_url
                .clone()
                .unwrap_or_else(|| watch_url(&self.id)),
            video_id: self.id,
        }
    }

    fn into_video_info(self) -> VideoInfo {
        VideoInfo {
            title: self.title(),
            thumbnail_url: self.thumbnail_url(),
            video_id: self.id,
        }
    }
}

#[derive(Deserialize, Debug)]
struct Playlist {
    #[serde(default)]
    entries: Vec<Entry>,
}

fn parse_search_output(json: &str) -> Result<Vec<SearchResult>, VideoError> {
    let playlist: Playlist = serde_json::from_str(json)?;
    Ok(playlist
        .entries
        .into_iter()
        .map(Entry::into_search_result)
        .collect())
}

fn parse_info_output(json: &str) -> Result<VideoInfo, VideoError> {
    let entry: Entry = serde_json::from_str(json)?;
    Ok(entry.into_video_info())
}

/// Backend for both search and streaming, driving the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings").arg("--quiet");
        cmd
    }

    async fn run_json(&self, mut cmd: Command) -> Result<String, VideoError> {
        debug!("Running yt-dlp command: {:?}", cmd);

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Process(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn_error(&self, e: std::io::Error) -> VideoError {
        if e.kind() == ErrorKind::NotFound {
            VideoError::NotInstalled(self.binary.clone())
        } else {
            VideoError::Io(e)
        }
    }
}

#[async_trait]
impl SearchProvider for YtDlp {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, VideoError> {
        info!("Searching YouTube for {:?}", query);

        let mut cmd = self.command();
        cmd.arg("--dump-single-json")
            .arg("--flat-playlist")
            .arg(format!("ytsearch{}:{}", limit.max(1), query));

        let json = self.run_json(cmd).await?;
        let results = parse_search_output(&json)?;

        info!("Search for {:?} returned {} results", query, results.len());
        Ok(results)
    }
}

#[async_trait]
impl VideoHost for YtDlp {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, VideoError> {
        info!("Fetching video metadata for {}", url);

        let mut cmd = self.command();
        cmd.arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--skip-download")
            .arg("--")
            .arg(url);

        let json = self.run_json(cmd).await?;
        parse_info_output(&json)
    }

    async fn open_stream(
        &self,
        video_id: &str,
        format: MediaFormat,
    ) -> Result<MediaStream, VideoError> {
        let (selector, extension) = match format {
            MediaFormat::Audio => (AUDIO_SELECTOR, "m4a"),
            MediaFormat::Video => (VIDEO_SELECTOR, "mp4"),
        };

        let mut cmd = self.command();
        cmd.arg("--no-playlist")
            .arg("-f")
            .arg(selector)
            .arg("-o")
            .arg("-")
            .arg("--")
            .arg(watch_url(video_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning yt-dlp stream: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VideoError::Process("stdout was not captured".to_string()))?;

        Ok(MediaStream {
            reader: Box::new(stdout),
            file_name: format!("{}.{}", video_id, extension),
            process: Some(StreamProducer::new(child)),
        })
    }
}

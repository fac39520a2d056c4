use crate::recognize::RecognizerProvider;
use crate::{BotError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_KEEPALIVE_SECS: u64 = 14 * 60;
const DEFAULT_MAX_RECOGNITION_BYTES: u64 = 20 * 1024 * 1024;
const DEFAULT_AUDD_API_URL: &str = "https://api.audd.io/";

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub telegram_token: String,
    pub port: u16,
    pub keepalive_url: Option<String>,
    pub keepalive_interval: Duration,
    pub recognizer: RecognizerProvider,
    pub audd_api_token: Option<String>,
    pub audd_api_url: String,
    pub songrec_bin: String,
    pub ytdlp_bin: String,
    pub max_recognition_bytes: u64,
    pub temp_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let telegram_token = var("TELEGRAM_BOT_TOKEN")
            .or_else(|| var("BOT_TOKEN"))
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| BotError::Config(format!("Invalid PORT: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let keepalive_secs = match var("KEEPALIVE_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    BotError::Config(format!("Invalid KEEPALIVE_INTERVAL_SECS: {}", raw))
                })?,
            None => DEFAULT_KEEPALIVE_SECS,
        };

        let recognizer = match var("RECOGNIZER").as_deref().unwrap_or("songrec") {
            "songrec" => RecognizerProvider::Songrec,
            "audd" => RecognizerProvider::Audd,
            _ => return Err(BotError::Config("Invalid RECOGNIZER".to_string())),
        };

        let audd_api_token = var("AUDD_API_TOKEN");
        if recognizer == RecognizerProvider::Audd && audd_api_token.is_none() {
            return Err(BotError::Config(
                "AUDD_API_TOKEN required for AudD".to_string(),
            ));
        }

        let max_recognition_bytes = match var("MAX_RECOGNITION_BYTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| BotError::Config(format!("Invalid MAX_RECOGNITION_BYTES: {}", raw)))?,
            None => DEFAULT_MAX_RECOGNITION_BYTES,
        };

        Ok(BotConfig {
            telegram_token,
            port,
            keepalive_url: var("KEEPALIVE_URL").or_else(|| var("RENDER_URL")),
            keepalive_interval: Duration::from_secs(keepalive_secs),
            recognizer,
            audd_api_token,
            audd_api_url: var("AUDD_API_URL").unwrap_or_else(|| DEFAULT_AUDD_API_URL.to_string()),
            songrec_bin: var("SONGREC_BIN").unwrap_or_else(|| "songrec".to_string()),
            ytdlp_bin: var("YTDLP_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            max_recognition_bytes,
            temp_dir: var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        })
    }
}

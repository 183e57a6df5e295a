//! Application-level configuration loading: storage location, question source
//! settings and the motivational quotes shown between rounds.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use rand::{rng, seq::IndexedRandom};
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HAFALAN_QUIZ_CONFIG_PATH";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    data_dir: PathBuf,
    poll_interval: Duration,
    ephemeral: bool,
    gemini_base_url: String,
    gemini_model: String,
    retry_attempts: u32,
    retry_delay: Duration,
    quotes: Vec<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        data_dir = %app_config.data_dir.display(),
                        ephemeral = app_config.ephemeral,
                        quotes = app_config.quotes.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Directory holding one JSON file per persisted slot.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// How often the data directory is checked for changes made by other processes.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Keep everything in memory instead of the data directory.
    pub fn ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Base URL of the Gemini API.
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    /// Gemini model generating the questions.
    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    /// Attempts per question batch, the first one included.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Pause between two attempts.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Pick a motivational quote at random.
    pub fn random_quote(&self) -> String {
        self.quotes
            .choose(&mut rng())
            .cloned()
            .unwrap_or_default()
    }

    /// Configuration for tests: in-memory storage and defaults elsewhere.
    #[cfg(test)]
    pub fn ephemeral_defaults() -> Self {
        Self {
            ephemeral: true,
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            ephemeral: false,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            quotes: default_quotes(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    data_dir: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    ephemeral: Option<bool>,
    gemini: RawGemini,
    quotes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGemini {
    base_url: Option<String>,
    model: Option<String>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let quotes = value
            .quotes
            .filter(|quotes| !quotes.is_empty())
            .unwrap_or(defaults.quotes);

        Self {
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            poll_interval: value
                .poll_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            ephemeral: value.ephemeral.unwrap_or(defaults.ephemeral),
            gemini_base_url: value.gemini.base_url.unwrap_or(defaults.gemini_base_url),
            gemini_model: value.gemini.model.unwrap_or(defaults.gemini_model),
            retry_attempts: value
                .gemini
                .retry_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.retry_attempts),
            retry_delay: value
                .gemini
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            quotes,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Quotes shipped with the binary.
fn default_quotes() -> Vec<String> {
    [
        "Setiap ayat yang kau hafal adalah cahaya yang menerangi jalanmu.",
        "Al-Quran adalah sahabat terbaik di dunia dan akhirat. Jangan pernah meninggalkannya.",
        "Menghafal Al-Quran adalah perjalanan, nikmati setiap langkahnya.",
        "Kesabaran dalam menghafal akan berbuah manisnya iman.",
        "Jangan pernah menyerah, setiap pengulanganmu dicatat sebagai amal kebaikan.",
        "Jadikan Al-Quran sebagai penyejuk hatimu di kala gundah.",
        "Semakin dekat engkau dengan Al-Quran, semakin dekat engkau dengan-Nya.",
        "Keberkahan hidup datang bersama Al-Quran di dalam dada.",
        "Biarkan setiap huruf Al-Quran yang kau hafal menjadi saksi di hari kiamat.",
        "Menghafal Al-Quran bukan tentang kecepatan, tapi tentang ketekunan dan keikhlasan.",
        "Di setiap kesulitan menghafal, ada ampunan dosa yang terhapus.",
        "Hatimu adalah istana, dan Al-Quran adalah mahkotanya.",
        "Jadikan muraja'ah (pengulangan) sebagai zikir harianmu, maka hafalan akan selalu terjaga.",
        "Orang yang menghafal Al-Quran akan diberikan mahkota kemuliaan kepada orang tuanya di hari kiamat.",
        "Jangan biarkan kesibukan dunia melupakanmu dari nikmatnya berinteraksi dengan Al-Quran.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "data_dir": "/tmp/hafalan", "gemini": { "retry_attempts": 5 } }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.data_dir(), &PathBuf::from("/tmp/hafalan"));
        assert_eq!(config.retry_attempts(), 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.gemini_model(), "gemini-2.5-flash");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(!config.ephemeral());
    }

    #[test]
    fn empty_quote_list_falls_back_to_builtin() {
        let raw: RawConfig = serde_json::from_str(r#"{ "quotes": [] }"#).unwrap();
        let config = AppConfig::from(raw);
        assert!(default_quotes().contains(&config.random_quote()));
    }

    #[test]
    fn custom_quotes_are_used() {
        let raw: RawConfig = serde_json::from_str(r#"{ "quotes": ["Tetap semangat"] }"#).unwrap();
        assert_eq!(AppConfig::from(raw).random_quote(), "Tetap semangat");
    }
}

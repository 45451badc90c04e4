//! Configuration for the Nova assistant
//!
//! Everything is supplied through the CLI / environment; the only files the
//! assistant reads at startup are its JSON state files (executable cache,
//! custom commands, daily-text cache) which live in the data directory.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::{Error, Result};

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake detection settings
    pub wake: WakeConfig,

    /// Voice capture / STT / TTS settings
    pub voice: VoiceConfig,

    /// Executable search settings
    pub search: SearchConfig,

    /// Daily scheduler settings
    pub schedule: ScheduleConfig,

    /// Path to data directory (state files)
    pub data_dir: PathBuf,

    /// Path to the persisted executable cache
    pub exec_cache_path: PathBuf,

    /// Path to the user's custom commands file
    pub custom_commands_path: PathBuf,

    /// Path to the once-per-day announcement text cache
    pub daily_text_path: PathBuf,

    /// Suppress spoken output (log utterances instead)
    pub mute: bool,
}

/// Wake detection settings
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Phrase aliases stripped from the front of a transcript, tried in order
    pub phrase_aliases: Vec<String>,

    /// Detection sensitivity in `[0.0, 1.0]`; higher triggers more easily
    pub sensitivity: f32,

    /// Optional keyword model file; must exist when set
    pub keyword_model: Option<PathBuf>,
}

/// Voice capture and speech service settings
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Credential for the speech-to-text service
    pub stt_api_key: String,

    /// STT model identifier (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// Seconds to wait for speech onset after the wake phrase
    pub listen_timeout_secs: u64,

    /// Maximum seconds of utterance recorded after onset
    pub max_phrase_secs: u64,
}

/// Executable search settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Root directories scanned by the bounded search
    pub roots: Vec<PathBuf>,

    /// Maximum directory depth below each root
    pub max_depth: usize,

    /// Suffix appended to a bare application guess ("" on unix, ".exe" on windows)
    pub default_suffix: String,
}

/// Daily scheduler settings
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Enable the daily announcement loop
    pub enabled: bool,

    /// First hour (local time, inclusive) of the announcement window
    pub window_start_hour: u32,

    /// Last hour (local time, exclusive) of the announcement window
    pub window_end_hour: u32,

    /// Poll interval in seconds
    pub interval_secs: u64,
}

/// CLI-supplied overrides consumed by [`Config::load`]
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub stt_api_key: Option<String>,
    pub keyword_model: Option<PathBuf>,
    pub search_roots: Vec<PathBuf>,
    pub search_depth: Option<usize>,
    pub data_dir: Option<PathBuf>,
    pub wake_phrase: Option<String>,
    pub sensitivity: Option<f32>,
    pub mute: bool,
    pub no_schedule: bool,
}

/// Default directory depth for the bounded executable search
pub const DEFAULT_SEARCH_DEPTH: usize = 6;

impl Config {
    /// Load configuration, validating startup prerequisites
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the STT credential is missing or a
    /// configured keyword model file does not exist. These are the
    /// startup-fatal conditions; the main loop must not start without them.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let stt_api_key = overrides
            .stt_api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config("STT API key required (set NOVA_STT_API_KEY)".to_string())
            })?;

        if let Some(model) = &overrides.keyword_model {
            if !model.exists() {
                return Err(Error::Config(format!(
                    "keyword model not found: {}",
                    model.display()
                )));
            }
        }

        let data_dir = match overrides.data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&data_dir)?;

        let wake_phrase = overrides
            .wake_phrase
            .unwrap_or_else(|| "hey nova".to_string())
            .to_lowercase();
        let phrase_aliases = wake_aliases(&wake_phrase);

        let roots = if overrides.search_roots.is_empty() {
            default_search_roots()
        } else {
            overrides.search_roots
        };

        Ok(Self {
            wake: WakeConfig {
                phrase_aliases,
                sensitivity: overrides.sensitivity.unwrap_or(0.7).clamp(0.0, 1.0),
                keyword_model: overrides.keyword_model,
            },
            voice: VoiceConfig {
                stt_api_key,
                stt_model: "whisper-1".to_string(),
                tts_model: "tts-1".to_string(),
                tts_voice: "alloy".to_string(),
                tts_speed: 1.0,
                listen_timeout_secs: 4,
                max_phrase_secs: 6,
            },
            search: SearchConfig {
                roots,
                max_depth: overrides.search_depth.unwrap_or(DEFAULT_SEARCH_DEPTH),
                default_suffix: std::env::consts::EXE_SUFFIX.to_string(),
            },
            schedule: ScheduleConfig {
                enabled: !overrides.no_schedule,
                window_start_hour: 7,
                window_end_hour: 10,
                interval_secs: 30,
            },
            exec_cache_path: data_dir.join("exe_cache.json"),
            custom_commands_path: data_dir.join("custom_commands.json"),
            daily_text_path: data_dir.join("daily_text.json"),
            data_dir,
            mute: overrides.mute,
        })
    }
}

/// Aliases stripped from the front of a transcript: the full phrase first,
/// then its individual words (e.g. "hey nova" → ["hey nova", "nova", "hey"])
fn wake_aliases(phrase: &str) -> Vec<String> {
    let mut aliases = vec![phrase.to_string()];
    for word in phrase.split_whitespace().rev() {
        if !aliases.iter().any(|a| a == word) {
            aliases.push(word.to_string());
        }
    }
    aliases
}

fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "nova", "nova")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Config("could not determine data directory".to_string()))
}

#[cfg(windows)]
fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from(r"C:\Program Files"),
        PathBuf::from(r"C:\Program Files (x86)"),
    ];
    if let Ok(home) = std::env::var("USERPROFILE") {
        roots.push(PathBuf::from(home));
    }
    roots
}

#[cfg(not(windows))]
fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from("/usr/bin"),
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/opt"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        roots.push(PathBuf::from(home));
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_fatal() {
        let err = Config::load(Overrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_keyword_model_is_fatal() {
        let overrides = Overrides {
            stt_api_key: Some("test-key".to_string()),
            keyword_model: Some(PathBuf::from("/nonexistent/model.bin")),
            data_dir: Some(std::env::temp_dir().join("nova-config-test")),
            ..Overrides::default()
        };
        let err = Config::load(overrides).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn wake_aliases_full_phrase_first() {
        let aliases = wake_aliases("hey nova");
        assert_eq!(aliases, vec!["hey nova", "nova", "hey"]);
    }
}

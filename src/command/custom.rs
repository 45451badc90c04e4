//! User-defined custom commands
//!
//! Loaded once at startup from `custom_commands.json` and read-only for the
//! process lifetime. A misconfigured entry is reported by phrase and
//! skipped; the rest of the table is unaffected.

use std::path::Path;

use serde::Deserialize;

use crate::Result;

/// On-disk shape: `{"commands": [...]}`
#[derive(Debug, Deserialize)]
struct CustomCommandsFile {
    #[serde(default)]
    commands: Vec<RawCustomCommand>,
}

/// One raw entry before validation
#[derive(Debug, Deserialize)]
struct RawCustomCommand {
    #[serde(default)]
    phrase: String,
    #[serde(default)]
    action: String,
    exe_name: Option<String>,
    app_name: Option<String>,
    url: Option<String>,
    shell_cmd: Option<String>,
    response: Option<String>,
}

/// Validated custom action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomAction {
    /// Resolve and launch an executable
    Launch { exe_name: String, app_name: String },
    /// Open a URL in the browser
    Url { url: String },
    /// Run a shell command line, fire-and-forget
    Shell { shell_cmd: String },
}

/// A validated user-declared command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCommand {
    /// Trigger phrase, matched exactly against the normalized command
    pub phrase: String,
    pub action: CustomAction,
    /// Optional spoken confirmation
    pub response: Option<String>,
}

/// Load and validate the custom commands file
///
/// A missing file yields an empty table. A file that fails to parse is
/// reported and also yields an empty table; startup proceeds either way.
///
/// # Errors
///
/// Returns `Error::Io` only when the file exists but cannot be read.
pub fn load_custom_commands(path: &Path) -> Result<Vec<CustomCommand>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no custom commands file");
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let file: CustomCommandsFile = match serde_json::from_str(&raw) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "custom commands file unreadable");
            return Ok(Vec::new());
        }
    };

    let commands = validate(file.commands);
    tracing::info!(count = commands.len(), "custom commands loaded");
    Ok(commands)
}

/// Drop malformed entries, keeping the rest
fn validate(raw: Vec<RawCustomCommand>) -> Vec<CustomCommand> {
    let mut commands = Vec::with_capacity(raw.len());

    for entry in raw {
        let phrase = entry.phrase.trim().to_lowercase();
        if phrase.is_empty() {
            tracing::warn!("custom command with empty phrase skipped");
            continue;
        }

        let action = match entry.action.as_str() {
            "launch_executable" => match entry.exe_name {
                Some(exe_name) if !exe_name.is_empty() => CustomAction::Launch {
                    app_name: entry.app_name.unwrap_or_else(|| exe_name.clone()),
                    exe_name,
                },
                _ => {
                    tracing::warn!(phrase, "launch_executable missing exe_name, skipped");
                    continue;
                }
            },
            "url" => match entry.url {
                Some(url) if !url.is_empty() => CustomAction::Url { url },
                _ => {
                    tracing::warn!(phrase, "url action missing url, skipped");
                    continue;
                }
            },
            "shell" => match entry.shell_cmd {
                Some(shell_cmd) if !shell_cmd.is_empty() => CustomAction::Shell { shell_cmd },
                _ => {
                    tracing::warn!(phrase, "shell action missing shell_cmd, skipped");
                    continue;
                }
            },
            other => {
                tracing::warn!(phrase, action = other, "unknown custom action, skipped");
                continue;
            }
        };

        commands.push(CustomCommand {
            phrase,
            action,
            response: entry.response.filter(|r| !r.is_empty()),
        });
    }

    commands
}

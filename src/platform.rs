//! OS-level collaborators: process launch, browser open, shell execution
//!
//! These are the seams between the dispatch pipeline and the operating
//! system; tests substitute mock implementations.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// Launches a resolved executable as a detached OS process
pub trait AppLauncher: Send + Sync {
    /// Launch the executable at `path`
    ///
    /// # Errors
    ///
    /// Returns `Error::Launch` if the OS refuses to start the process.
    fn launch(&self, path: &Path) -> Result<()>;
}

/// Opens a URL in the default browser
pub trait UrlOpener: Send + Sync {
    /// Open `url` in the user's browser
    ///
    /// # Errors
    ///
    /// Returns `Error::Launch` if the opener process cannot be started.
    fn open(&self, url: &str) -> Result<()>;
}

/// Runs a user-supplied shell command line, fire-and-forget
pub trait ShellRunner: Send + Sync {
    /// Spawn `command_line` under the platform shell without waiting
    ///
    /// # Errors
    ///
    /// Returns `Error::Launch` if the shell cannot be spawned.
    fn run(&self, command_line: &str) -> Result<()>;
}

/// Default launcher backed by `std::process::Command`
pub struct SystemLauncher;

impl AppLauncher for SystemLauncher {
    fn launch(&self, path: &Path) -> Result<()> {
        #[cfg(windows)]
        let spawn = Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        #[cfg(not(windows))]
        let spawn = Command::new(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        spawn
            .map(|child| {
                tracing::info!(path = %path.display(), pid = child.id(), "launched");
            })
            .map_err(|e| Error::Launch(format!("{}: {e}", path.display())))
    }
}

/// Default browser opener using the platform open command
pub struct SystemUrlOpener;

impl UrlOpener for SystemUrlOpener {
    fn open(&self, url: &str) -> Result<()> {
        #[cfg(target_os = "windows")]
        let spawn = Command::new("cmd").args(["/C", "start", "", url]).spawn();

        #[cfg(target_os = "macos")]
        let spawn = Command::new("open").arg(url).spawn();

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let spawn = Command::new("xdg-open").arg(url).spawn();

        spawn
            .map(|_| tracing::info!(url, "opened in browser"))
            .map_err(|e| Error::Launch(format!("browser open failed: {e}")))
    }
}

/// Default shell runner; spawns and does not wait
pub struct SystemShellRunner;

impl ShellRunner for SystemShellRunner {
    fn run(&self, command_line: &str) -> Result<()> {
        #[cfg(windows)]
        let spawn = Command::new("cmd")
            .args(["/C", command_line])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        #[cfg(not(windows))]
        let spawn = Command::new("sh")
            .args(["-c", command_line])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        spawn
            .map(|child| {
                tracing::info!(command_line, pid = child.id(), "shell command spawned");
            })
            .map_err(|e| Error::Launch(format!("shell spawn failed: {e}")))
    }
}

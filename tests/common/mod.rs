//! Shared mock collaborators for integration tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nova_assistant::Result;
use nova_assistant::launch::Resolve;
use nova_assistant::platform::{AppLauncher, ShellRunner, UrlOpener};
use nova_assistant::speech::{Speaker, SpeechSink};

/// Speaker that records utterances instead of speaking
pub struct CollectingSpeaker(pub Arc<Mutex<Vec<String>>>);

impl Speaker for CollectingSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Spawn a speech sink that collects into the returned buffer
pub async fn collecting_sink() -> (SpeechSink, Arc<Mutex<Vec<String>>>) {
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let slot = Arc::clone(&spoken);
    let sink = SpeechSink::spawn(move || Ok(Box::new(CollectingSpeaker(slot)) as Box<dyn Speaker>))
        .await
        .unwrap();
    (sink, spoken)
}

/// Launcher that records launch attempts; optionally refuses every launch
#[derive(Default)]
pub struct MockLauncher {
    pub launched: Mutex<Vec<PathBuf>>,
    pub fail: AtomicBool,
}

impl MockLauncher {
    pub fn failing() -> Self {
        let launcher = Self::default();
        launcher.fail.store(true, Ordering::SeqCst);
        launcher
    }

    pub fn launch_count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }
}

impl AppLauncher for MockLauncher {
    fn launch(&self, path: &Path) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(nova_assistant::Error::Launch("refused".to_string()));
        }
        self.launched.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Browser opener that records URLs
#[derive(Default)]
pub struct MockUrlOpener {
    pub opened: Mutex<Vec<String>>,
}

impl UrlOpener for MockUrlOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Shell runner that records command lines
#[derive(Default)]
pub struct MockShellRunner {
    pub commands: Mutex<Vec<String>>,
}

impl ShellRunner for MockShellRunner {
    fn run(&self, command_line: &str) -> Result<()> {
        self.commands.lock().unwrap().push(command_line.to_string());
        Ok(())
    }
}

/// Resolver that counts full resolutions and answers after a delay
pub struct SlowResolver {
    pub result: Option<PathBuf>,
    pub delay: Duration,
    pub resolutions: AtomicUsize,
}

impl SlowResolver {
    pub fn returning(result: Option<PathBuf>, delay: Duration) -> Self {
        Self {
            result,
            delay,
            resolutions: AtomicUsize::new(0),
        }
    }
}

impl Resolve for SlowResolver {
    fn cached(&self, _name: &str) -> Option<PathBuf> {
        None
    }

    fn resolve(&self, _name: &str) -> Option<PathBuf> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.result.clone()
    }

    fn invalidate(&self, _name: &str) {}
}

/// Poll `predicate` until it holds or the timeout elapses
pub async fn wait_for(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

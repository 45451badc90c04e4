//! Asynchronous search-and-launch supervision
//!
//! The foreground loop must never block on a filesystem search. A cached,
//! still-valid path launches inline; anything else is announced and handed
//! to a bounded worker pool. Concurrent requests for the same executable
//! are coalesced into one search through a per-key in-flight map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Semaphore, watch};

use super::resolver::Resolve;
use crate::platform::AppLauncher;
use crate::speech::SpeechHandle;

/// Maximum concurrent search/launch workers
const MAX_WORKERS: usize = 4;

/// Terminal state of one search-and-launch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Resolved and launched
    Launched,
    /// Not found anywhere in the search roots
    NotFound,
    /// Resolved but the OS refused to execute it
    LaunchFailed,
}

struct Inner {
    resolver: Arc<dyn Resolve>,
    launcher: Arc<dyn AppLauncher>,
    speech: SpeechHandle,
    permits: Arc<Semaphore>,
    in_flight: Mutex<HashMap<String, watch::Receiver<Option<LaunchOutcome>>>>,
}

/// Handle for dispatching launch requests; cheap to clone
#[derive(Clone)]
pub struct LaunchSupervisor {
    inner: Arc<Inner>,
}

impl LaunchSupervisor {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn Resolve>,
        launcher: Arc<dyn AppLauncher>,
        speech: SpeechHandle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                launcher,
                speech,
                permits: Arc::new(Semaphore::new(MAX_WORKERS)),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Launch `exe`, announcing progress as `label`
    ///
    /// Returns `true` when a cached path launched inline; `false` when the
    /// request went to a background worker (or was coalesced into one
    /// already in flight).
    pub async fn launch(&self, exe: &str, label: &str) -> bool {
        let key = exe.trim().to_lowercase();

        if let Some(path) = self.inner.resolver.cached(&key) {
            match self.inner.launcher.launch(&path) {
                Ok(()) => {
                    self.inner.speech.say(format!("Opening {label}.")).await;
                    return true;
                }
                Err(e) => {
                    // Known-bad path: invalidate so the next attempt
                    // re-searches instead of retrying it
                    tracing::error!(error = %e, path = %path.display(), "cached launch failed");
                    self.inner.resolver.invalidate(&key);
                    self.inner
                        .speech
                        .say(format!("I couldn't open {label}."))
                        .await;
                    return false;
                }
            }
        }

        self.inner
            .speech
            .say(format!("Searching for {label}, please wait."))
            .await;

        let leader = {
            let mut in_flight = match self.inner.in_flight.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if in_flight.contains_key(&key) {
                tracing::debug!(exe = %key, "search already in flight, coalescing");
                None
            } else {
                let (tx, rx) = watch::channel(None);
                in_flight.insert(key.clone(), rx);
                Some(tx)
            }
        };

        if let Some(tx) = leader {
            let inner = Arc::clone(&self.inner);
            let label = label.to_string();
            tokio::spawn(async move {
                let outcome = run_worker(&inner, &key, &label).await;
                let _ = tx.send(Some(outcome));
                if let Ok(mut in_flight) = inner.in_flight.lock() {
                    in_flight.remove(&key);
                }
            });
        }

        false
    }

    /// Number of searches currently in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().map_or(0, |map| map.len())
    }
}

/// One worker: bounded by the pool, resolves off the async runtime, then
/// launches and announces the outcome.
async fn run_worker(inner: &Arc<Inner>, key: &str, label: &str) -> LaunchOutcome {
    let _permit = inner.permits.clone().acquire_owned().await.ok();

    let resolver = Arc::clone(&inner.resolver);
    let name = key.to_string();
    let found = match tokio::task::spawn_blocking(move || resolver.resolve(&name)).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(error = %e, "search worker panicked");
            None
        }
    };

    match found {
        Some(path) => match inner.launcher.launch(&path) {
            Ok(()) => {
                inner
                    .speech
                    .say(format!("Found and opening {label}."))
                    .await;
                LaunchOutcome::Launched
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "launch failed");
                inner.resolver.invalidate(key);
                inner
                    .speech
                    .say(format!("I found {label} but couldn't open it."))
                    .await;
                LaunchOutcome::LaunchFailed
            }
        },
        None => {
            inner
                .speech
                .say(format!("Sorry, I couldn't find {label}."))
                .await;
            LaunchOutcome::NotFound
        }
    }
}

//! The Nova daemon
//!
//! Wires the pipeline together and runs the foreground detection loop:
//! frames → wake engine → bounded capture → normalization → dispatch. The
//! scheduler and launch workers run concurrently; all spoken output goes
//! through the single speech sink. Only startup-fatal conditions stop the
//! process before the loop begins; everything after that is handled locally.

use std::sync::Arc;
use std::time::Duration;

use crate::command::{Dispatcher, Effects, Normalized, load_custom_commands, normalize};
use crate::config::Config;
use crate::launch::{ExecCache, ExecutableResolver, LaunchSupervisor, Resolve};
use crate::platform::{AppLauncher, SystemLauncher, SystemShellRunner, SystemUrlOpener};
use crate::speech::{MutedSpeaker, Speaker, SpeechSink, TtsSpeaker};
use crate::voice::{
    AudioPlayback, CommandCapture, EnergyWakeEngine, FrameSource, HttpStt, SAMPLE_RATE,
    TextToSpeech, Transcript, WakeEngine,
};
use crate::{Error, Result};

/// Foreground poll interval between buffer drains
const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// Pause after a transient frame error before the loop resumes
const ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// The assistant daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until interrupted
    ///
    /// # Errors
    ///
    /// Returns an error only for startup-fatal conditions (no audio input,
    /// invalid credentials); per-command failures are spoken and absorbed.
    pub async fn run(self) -> Result<()> {
        let config = &self.config;

        // Speech sink: the one consumer of all spoken output. The speaker is
        // built on the sink thread; its blocking HTTP client must never be
        // created inside the runtime.
        let mute = config.mute;
        let voice = config.voice.clone();
        let sink = SpeechSink::spawn(move || {
            if mute {
                Ok(Box::new(MutedSpeaker) as Box<dyn Speaker>)
            } else {
                let tts = TextToSpeech::new(
                    voice.stt_api_key,
                    voice.tts_model,
                    voice.tts_voice,
                    voice.tts_speed,
                )?;
                Ok(Box::new(TtsSpeaker::new(tts, AudioPlayback::new()?)) as Box<dyn Speaker>)
            }
        })
        .await?;
        let speech = sink.handle();

        // Launch pipeline: cache → resolver → bounded supervisor
        let cache = ExecCache::load(config.exec_cache_path.clone());
        let resolver: Arc<dyn Resolve> = Arc::new(ExecutableResolver::new(
            cache,
            config.search.roots.clone(),
            config.search.max_depth,
        ));
        let launcher: Arc<dyn AppLauncher> = Arc::new(SystemLauncher);
        let supervisor = LaunchSupervisor::new(resolver, launcher, speech.clone());

        // Dispatch tables, read-only from here on
        let custom = load_custom_commands(&config.custom_commands_path)?;
        let dispatcher = Dispatcher::new(custom, config.search.default_suffix.clone());
        let fx = Effects {
            speech: speech.clone(),
            launcher: supervisor,
            urls: Arc::new(SystemUrlOpener),
            shell: Arc::new(SystemShellRunner),
        };

        let scheduler = config.schedule.enabled.then(|| {
            crate::scheduler::spawn(
                speech.clone(),
                config.schedule.clone(),
                config.daily_text_path.clone(),
            )
        });

        // Voice pipeline
        let stt = HttpStt::new(
            config.voice.stt_api_key.clone(),
            config.voice.stt_model.clone(),
        )?;
        let mut engine = EnergyWakeEngine::new(SAMPLE_RATE, config.wake.sensitivity);
        let mut source = FrameSource::new()?;
        source.start()?;

        let wake_phrase = config
            .wake
            .phrase_aliases
            .first()
            .cloned()
            .ok_or_else(|| Error::Config("no wake phrase configured".to_string()))?;

        speech
            .say(format!("Nova ready. Say '{wake_phrase}' to begin."))
            .await;
        tracing::info!(wake_phrase, "listening for wake phrase");

        let listen_timeout = Duration::from_secs(config.voice.listen_timeout_secs);
        let max_phrase = Duration::from_secs(config.voice.max_phrase_secs);
        let mut pending: Vec<i16> = Vec::new();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received, shutting down");
                    break;
                }
                () = tokio::time::sleep(POLL_INTERVAL) => {
                    if !pump_frames(&source, &mut engine, &mut pending).await {
                        continue;
                    }

                    tracing::info!("wake phrase detected");
                    // The prompt (and any queued speech) must finish before
                    // the window opens, or the mic records it
                    speech.say_and_wait("Yes?").await;

                    let capture = CommandCapture::new(&source, &stt);
                    let transcript = capture.capture(listen_timeout, max_phrase).await;

                    match transcript {
                        Transcript::Text(raw) => {
                            match normalize(&raw, &config.wake.phrase_aliases) {
                                Normalized::Command(command) => {
                                    dispatcher.dispatch(&command, &fx).await;
                                }
                                Normalized::Dismissed => speech.say("Alright.").await,
                                Normalized::Empty => speech.say("Say that again?").await,
                            }
                        }
                        failure => {
                            if let Some(message) = failure.failure_message() {
                                speech.say(message).await;
                            }
                        }
                    }

                    // Fresh window for the next wake cycle
                    pending.clear();
                    source.clear_buffer();
                    tracing::debug!("returning to idle");
                }
            }
        }

        if let Some(scheduler) = scheduler {
            scheduler.abort();
        }
        source.stop();
        speech.say("Goodbye.").await;
        sink.shutdown().await;

        Ok(())
    }
}

/// Drain buffered audio into engine-sized frames; returns `true` on trigger
///
/// A frame the engine rejects is discarded and the loop continues after a
/// short pause; transient errors never exit the idle state.
async fn pump_frames(
    source: &FrameSource,
    engine: &mut EnergyWakeEngine,
    pending: &mut Vec<i16>,
) -> bool {
    pending.extend(source.take_buffer());

    let frame_length = engine.frame_length();
    while pending.len() >= frame_length {
        let frame: Vec<i16> = pending.drain(..frame_length).collect();
        match engine.process(&frame) {
            Ok(true) => {
                pending.clear();
                return true;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "frame discarded");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }

    false
}

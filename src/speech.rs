//! Serialized spoken output
//!
//! All producers (foreground loop, launch workers, scheduler) enqueue
//! utterances through a cloneable [`SpeechHandle`]; a single consumer thread
//! drains the queue and speaks one utterance at a time, so speech is never
//! interleaved. No ordering across producers is guaranteed beyond that.
//!
//! The speaker is constructed on the consumer thread itself: speakers backed
//! by `reqwest::blocking` must never be created or driven inside the async
//! runtime.

use tokio::sync::{mpsc, oneshot};

use crate::voice::{AudioPlayback, TextToSpeech};
use crate::{Error, Result};

/// Queue depth before producers start awaiting
const QUEUE_CAPACITY: usize = 32;

/// Synchronous speech backend driven by the sink's consumer thread
pub trait Speaker: Send {
    /// Speak one utterance, blocking until it has been spoken
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis or playback fails; the sink logs it and
    /// moves on to the next utterance.
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Speaker backed by HTTP TTS and local playback
pub struct TtsSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl TtsSpeaker {
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

impl Speaker for TtsSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text)?;
        self.playback.play_mp3(&audio)
    }
}

/// Speaker that logs instead of speaking (--mute / headless)
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        tracing::info!(utterance = text, "muted speech");
        Ok(())
    }
}

enum Message {
    Say(String, Option<oneshot::Sender<()>>),
    Shutdown,
}

/// Cloneable producer side of the speech queue
#[derive(Clone)]
pub struct SpeechHandle {
    tx: mpsc::Sender<Message>,
}

impl SpeechHandle {
    /// Enqueue an utterance; it will be spoken after everything already
    /// queued. Dropped silently if the sink has shut down.
    pub async fn say(&self, text: impl Into<String>) {
        if self.tx.send(Message::Say(text.into(), None)).await.is_err() {
            tracing::debug!("speech sink closed, utterance dropped");
        }
    }

    /// Enqueue an utterance and wait until it has actually been spoken
    ///
    /// Everything already queued is spoken first, so when this returns the
    /// output channel is quiet. The foreground loop uses this for the prompt
    /// before opening the microphone window.
    pub async fn say_and_wait(&self, text: impl Into<String>) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .tx
            .send(Message::Say(text.into(), Some(ack_tx)))
            .await
            .is_err()
        {
            tracing::debug!("speech sink closed, utterance dropped");
            return;
        }
        let _ = ack_rx.await;
    }
}

/// The owning side of the speech queue
pub struct SpeechSink {
    handle: SpeechHandle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SpeechSink {
    /// Spawn the consumer thread; `builder` runs on that thread, outside the
    /// async runtime, and its speaker stays there for the sink's lifetime.
    ///
    /// # Errors
    ///
    /// Returns the builder's error, or `Error::Io` if the thread cannot be
    /// spawned.
    pub async fn spawn<F>(builder: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn Speaker>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Message>(QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("speech-sink".to_string())
            .spawn(move || {
                let mut speaker = match builder() {
                    Ok(speaker) => {
                        let _ = ready_tx.send(Ok(()));
                        speaker
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Some(message) = rx.blocking_recv() {
                    match message {
                        Message::Say(text, ack) => {
                            tracing::debug!(utterance = %text, "speaking");
                            if let Err(e) = speaker.speak(&text) {
                                tracing::error!(error = %e, "speech failed");
                            }
                            if let Some(ack) = ack {
                                let _ = ack.send(());
                            }
                        }
                        Message::Shutdown => break,
                    }
                }
                tracing::debug!("speech sink stopped");
            })?;

        ready_rx
            .await
            .map_err(|_| Error::Audio("speech sink thread died during startup".to_string()))??;

        Ok(Self {
            handle: SpeechHandle { tx },
            thread: Some(thread),
        })
    }

    /// Get a producer handle
    #[must_use]
    pub fn handle(&self) -> SpeechHandle {
        self.handle.clone()
    }

    /// Speak everything queued so far, then stop the consumer
    ///
    /// Utterances enqueued before the call are spoken in order; the sentinel
    /// ensures a farewell queued last still goes out.
    pub async fn shutdown(mut self) {
        let _ = self.handle.tx.send(Message::Shutdown).await;
        if let Some(thread) = self.thread.take() {
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }
    }
}

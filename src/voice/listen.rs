//! Bounded utterance capture
//!
//! After a wake trigger, opens a listening window: wait up to a timeout for
//! speech onset, record up to a maximum duration, hand the buffer to the
//! STT collaborator. Every negative outcome is non-fatal and maps to a
//! fixed spoken phrase.

use std::time::{Duration, Instant};

use super::capture::{FrameSource, samples_to_wav};
use super::stt::SttClient;
use super::wake::rms_energy;
use crate::Result;

/// Buffered sample supply the listening window drains
pub trait SampleSource {
    /// Discard anything buffered so far
    fn clear_buffer(&self);

    /// Take everything buffered since the last call
    fn take_buffer(&self) -> Vec<i16>;

    /// Sample rate of the buffered audio
    fn sample_rate(&self) -> u32;
}

impl SampleSource for FrameSource {
    fn clear_buffer(&self) {
        Self::clear_buffer(self);
    }

    fn take_buffer(&self) -> Vec<i16> {
        Self::take_buffer(self)
    }

    fn sample_rate(&self) -> u32 {
        Self::sample_rate(self)
    }
}

/// Poll interval while the window is open
const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// RMS energy above which a chunk counts as speech onset
const ONSET_THRESHOLD: f32 = 0.02;

/// Trailing silence that ends the utterance early
const TRAILING_SILENCE: Duration = Duration::from_millis(900);

/// Outcome of one utterance capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized text
    Text(String),
    /// No speech arrived within the listen timeout
    TimedOut,
    /// Audio was captured but nothing recognizable came back
    Unintelligible,
    /// The speech service was unreachable or rejected the request
    ServiceUnavailable,
}

impl Transcript {
    /// Fixed spoken phrase for a negative outcome
    #[must_use]
    pub const fn failure_message(&self) -> Option<&'static str> {
        match self {
            Self::Text(_) => None,
            Self::TimedOut => Some("I didn't hear anything."),
            Self::Unintelligible => Some("Sorry, I didn't catch that."),
            Self::ServiceUnavailable => Some("It seems I'm offline."),
        }
    }
}

/// Captures one bounded utterance and transcribes it
pub struct CommandCapture<'a> {
    source: &'a dyn SampleSource,
    stt: &'a dyn SttClient,
}

impl<'a> CommandCapture<'a> {
    pub fn new(source: &'a dyn SampleSource, stt: &'a dyn SttClient) -> Self {
        Self { source, stt }
    }

    /// Open the listening window
    ///
    /// Waits up to `timeout` for speech onset, then records until
    /// `max_duration` elapses or trailing silence closes the utterance.
    pub async fn capture(&self, timeout: Duration, max_duration: Duration) -> Transcript {
        self.source.clear_buffer();

        let sample_rate = self.source.sample_rate();
        let silence_limit = samples_for(TRAILING_SILENCE, sample_rate);

        let window_start = Instant::now();
        let mut recorded: Vec<i16> = Vec::new();
        let mut onset: Option<Instant> = None;
        let mut trailing_silence = 0usize;

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let chunk = self.source.take_buffer();
            if !chunk.is_empty() {
                let voiced = rms_energy(&chunk) > ONSET_THRESHOLD;
                recorded.extend_from_slice(&chunk);

                if onset.is_none() {
                    if voiced {
                        onset = Some(Instant::now());
                        tracing::debug!(buffered = recorded.len(), "speech onset");
                    }
                } else if voiced {
                    trailing_silence = 0;
                } else {
                    trailing_silence += chunk.len();
                }
            }

            match onset {
                None => {
                    if window_start.elapsed() >= timeout {
                        tracing::debug!("listen window timed out");
                        return Transcript::TimedOut;
                    }
                }
                Some(started) => {
                    if started.elapsed() >= max_duration || trailing_silence >= silence_limit {
                        break;
                    }
                }
            }
        }

        tracing::debug!(samples = recorded.len(), "utterance complete");
        let outcome = self.transcribe(recorded, sample_rate).await;
        transcript_from(outcome)
    }

    async fn transcribe(&self, samples: Vec<i16>, sample_rate: u32) -> Result<String> {
        let wav = samples_to_wav(&samples, sample_rate)?;
        self.stt.transcribe(wav).await
    }
}

/// Map the STT result onto the transcript taxonomy: blank text is
/// unintelligible, any error is a service failure.
fn transcript_from(result: Result<String>) -> Transcript {
    match result {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Transcript::Unintelligible
            } else {
                Transcript::Text(trimmed.to_string())
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "speech service failure");
            Transcript::ServiceUnavailable
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_millis() as usize * sample_rate as usize) / 1000
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::Error;

    /// Source that replays scripted chunks, then silence
    struct ScriptedSource {
        chunks: Mutex<VecDeque<Vec<i16>>>,
    }

    impl ScriptedSource {
        fn new(chunks: Vec<Vec<i16>>) -> Self {
            Self {
                chunks: Mutex::new(chunks.into()),
            }
        }

        fn silent() -> Self {
            Self::new(Vec::new())
        }
    }

    impl SampleSource for ScriptedSource {
        fn clear_buffer(&self) {}

        fn take_buffer(&self) -> Vec<i16> {
            self.chunks
                .lock()
                .unwrap()
                .pop_front()
                // Once the script runs out, the room is quiet
                .unwrap_or_else(|| vec![0i16; 8000])
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    struct FixedStt(String);

    #[async_trait]
    impl SttClient for FixedStt {
        async fn transcribe(&self, _wav: Vec<u8>) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn silence_times_out_without_transcription() {
        let source = ScriptedSource::silent();
        let stt = FixedStt("should never be produced".to_string());
        let capture = CommandCapture::new(&source, &stt);

        let transcript = capture
            .capture(Duration::from_millis(120), Duration::from_secs(2))
            .await;
        assert_eq!(transcript, Transcript::TimedOut);
    }

    #[tokio::test]
    async fn voiced_burst_is_captured_and_transcribed() {
        // One loud chunk, then the scripted silence closes the utterance
        let source = ScriptedSource::new(vec![vec![8000i16; 2000]]);
        let stt = FixedStt("open chrome".to_string());
        let capture = CommandCapture::new(&source, &stt);

        let transcript = capture
            .capture(Duration::from_secs(2), Duration::from_secs(5))
            .await;
        assert_eq!(transcript, Transcript::Text("open chrome".to_string()));
    }

    #[test]
    fn blank_text_is_unintelligible() {
        assert_eq!(
            transcript_from(Ok("   ".to_string())),
            Transcript::Unintelligible
        );
    }

    #[test]
    fn errors_map_to_service_unavailable() {
        assert_eq!(
            transcript_from(Err(Error::Stt("503".to_string()))),
            Transcript::ServiceUnavailable
        );
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(
            transcript_from(Ok("  open chrome \n".to_string())),
            Transcript::Text("open chrome".to_string())
        );
    }

    #[test]
    fn negative_outcomes_have_distinct_messages() {
        let msgs = [
            Transcript::TimedOut.failure_message().unwrap(),
            Transcript::Unintelligible.failure_message().unwrap(),
            Transcript::ServiceUnavailable.failure_message().unwrap(),
        ];
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0] != msgs[1] && msgs[1] != msgs[2] && msgs[0] != msgs[2]);
        assert!(Transcript::Text("hi".to_string()).failure_message().is_none());
    }
}

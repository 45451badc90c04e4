//! Wake detection
//!
//! The spotting engine is a collaborator behind [`WakeEngine`]; the built-in
//! implementation is an energy/silence state machine tuned for a short
//! spoken trigger phrase. Frame length and sample rate are part of the
//! engine contract and are checked on every call.

use crate::{Error, Result};

/// Frame length consumed by the built-in engine, in samples
pub const FRAME_LENGTH: usize = 512;

/// Base RMS energy threshold at sensitivity 0.5
const BASE_ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum voiced samples for a burst to count as the wake phrase (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that closes a burst (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Wake-phrase spotting engine contract
///
/// `process` consumes exactly one frame of `frame_length()` samples at
/// `sample_rate()` and reports whether the wake phrase completed in it.
pub trait WakeEngine: Send {
    /// Required input sample rate
    fn sample_rate(&self) -> u32;

    /// Required frame length in samples
    fn frame_length(&self) -> usize;

    /// Feed one frame; returns `true` when the wake phrase is recognized
    ///
    /// # Errors
    ///
    /// Returns `Error::WakeWord` if the frame does not match the engine's
    /// configured length.
    fn process(&mut self, frame: &[i16]) -> Result<bool>;
}

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Accumulating a potential wake burst
    Listening,
}

/// Built-in energy-based wake engine
///
/// Idle → Listening on energy above threshold; triggers once a sufficiently
/// long voiced burst is followed by trailing silence. Resets to Idle after
/// every trigger or timeout.
pub struct EnergyWakeEngine {
    sample_rate: u32,
    frame_length: usize,
    threshold: f32,
    state: DetectorState,
    voiced_samples: usize,
    silence_samples: usize,
}

impl EnergyWakeEngine {
    /// Create an engine with the given sensitivity in `[0.0, 1.0]`
    #[must_use]
    pub fn new(sample_rate: u32, sensitivity: f32) -> Self {
        // Sensitivity scales the threshold: 1.0 halves it, 0.0 triples it
        let scale = 3.0 - 2.5 * sensitivity.clamp(0.0, 1.0);
        Self {
            sample_rate,
            frame_length: FRAME_LENGTH,
            threshold: BASE_ENERGY_THRESHOLD * scale,
            state: DetectorState::Idle,
            voiced_samples: 0,
            silence_samples: 0,
        }
    }

    fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.voiced_samples = 0;
        self.silence_samples = 0;
    }
}

impl WakeEngine for EnergyWakeEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_length(&self) -> usize {
        self.frame_length
    }

    fn process(&mut self, frame: &[i16]) -> Result<bool> {
        if frame.len() != self.frame_length {
            return Err(Error::WakeWord(format!(
                "frame length {} does not match engine requirement {}",
                frame.len(),
                self.frame_length
            )));
        }

        let energy = rms_energy(frame);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.voiced_samples = frame.len();
                    self.silence_samples = 0;
                    tracing::trace!(energy, "speech onset");
                }
            }
            DetectorState::Listening => {
                if is_speech {
                    self.voiced_samples += frame.len();
                    self.silence_samples = 0;
                } else {
                    self.silence_samples += frame.len();
                }

                if self.silence_samples > SILENCE_SAMPLES {
                    let triggered = self.voiced_samples > MIN_SPEECH_SAMPLES;
                    tracing::debug!(
                        voiced = self.voiced_samples,
                        triggered,
                        "speech burst complete"
                    );
                    self.reset();
                    return Ok(triggered);
                }
            }
        }

        Ok(false)
    }
}

/// RMS energy of a frame, normalized to `[0.0, 1.0]`
#[allow(clippy::cast_precision_loss)]
pub fn rms_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let f = f32::from(s) / 32768.0;
            f * f
        })
        .sum();
    (sum_squares / samples.len() as f32).sqrt()
}

//! Voice pipeline: frame capture, wake detection, bounded utterance capture,
//! speech-to-text, speech synthesis, playback.

mod capture;
mod listen;
mod playback;
mod stt;
mod tts;
mod wake;

pub use capture::{FrameSource, SAMPLE_RATE, samples_to_wav};
pub use listen::{CommandCapture, SampleSource, Transcript};
pub use playback::AudioPlayback;
pub use stt::{HttpStt, SttClient};
pub use tts::TextToSpeech;
pub use wake::{EnergyWakeEngine, FRAME_LENGTH, WakeEngine, rms_energy};

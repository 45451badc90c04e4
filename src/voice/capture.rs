//! Microphone frame source
//!
//! Continuous capture from the default input device, buffered as signed
//! 16-bit samples at the wake engine's required rate. The foreground loop
//! drains the buffer and feeds fixed-length frames to the engine.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate required by the wake engine (16kHz speech band)
pub const SAMPLE_RATE: u32 = 16_000;

/// Hard cap on buffered audio; beyond this the buffer is dropped whole.
/// Corresponds to roughly 30 seconds at 16kHz.
const MAX_BUFFERED_SAMPLES: usize = SAMPLE_RATE as usize * 30;

/// Captures audio frames from the default input device
pub struct FrameSource {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<i16>>>,
    stream: Option<Stream>,
}

impl FrameSource {
    /// Create a new frame source
    ///
    /// # Errors
    ///
    /// Returns `Error::Audio` if no input device is available or no mono
    /// 16kHz configuration exists. This is a startup-fatal condition.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "frame source initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns `Error::Audio` if the input stream cannot be built or started.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        // Overflow policy: drop the backlog, keep capturing
                        if buf.len() > MAX_BUFFERED_SAMPLES {
                            tracing::warn!(dropped = buf.len(), "input overflow, dropping buffer");
                            buf.clear();
                        }
                        buf.extend(data.iter().map(|&s| sample_to_i16(s)));
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("frame source started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("frame source stopped");
        }
    }

    /// Take everything captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<i16> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Discard any buffered audio
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Convert a normalized f32 sample to i16
#[allow(clippy::cast_possible_truncation)]
fn sample_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Encode i16 samples as WAV bytes for the STT service
///
/// # Errors
///
/// Returns `Error::Audio` if WAV encoding fails
pub fn samples_to_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

//! Nova - voice-triggered local command assistant
//!
//! Continuously monitors the microphone for a wake phrase, captures a
//! bounded follow-up utterance, transcribes it through an external speech
//! service, and dispatches the result: built-in actions, a
//! search-and-launch flow for applications, or user-defined custom
//! commands.
//!
//! # Architecture
//!
//! ```text
//! FrameSource ─▶ WakeEngine ─▶ CommandCapture ─▶ Normalizer ─▶ Dispatcher
//!                                                                 │
//!                              ┌──────────────┬───────────────────┤
//!                              ▼              ▼                   ▼
//!                        built-in      LaunchSupervisor      custom cmds
//!                        handlers      (worker pool +
//!                                       exec cache)
//!                              │              │                   │
//!                              └──────────────┴───────┬───────────┘
//!                                                     ▼
//!                         Scheduler ───────────▶ SpeechSink (one consumer)
//! ```

pub mod command;
pub mod config;
pub mod daemon;
pub mod error;
pub mod launch;
pub mod platform;
pub mod scheduler;
pub mod speech;
pub mod voice;

pub use config::{Config, Overrides};
pub use daemon::Daemon;
pub use error::{Error, Result};

//! Command interpretation: normalization, custom command tables, and the
//! ordered multi-tier dispatcher.

mod custom;
mod dispatch;
mod normalize;

pub use custom::{CustomAction, CustomCommand, load_custom_commands};
pub use dispatch::{BuiltinAction, Dispatcher, Effects, Matched, spoken_time};
pub use normalize::{Normalized, normalize};

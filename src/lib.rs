//! Batch video conversion core: validates encode options, compiles ffmpeg
//! argument lists, supervises the ffmpeg subprocess per input file and parses
//! its stderr into structured progress events.

pub mod capability;
pub mod codec;
pub mod command;
pub mod encoder;
pub mod error;
pub mod options;
pub mod probe;
pub mod progress;
pub mod scanner;

pub use encoder::Encoder;
pub use error::{ConfigError, EncodeError, ProbeError};
pub use options::{EncodingOptions, QualityMode};
pub use progress::EncodingProgress;

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the encoding options themselves. Always detected before any
/// subprocess is spawned and fatal to the whole job.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported video format: {0}")]
    UnsupportedFormat(String),
    #[error("unsupported codec {codec} for format {format}")]
    UnsupportedCodec { codec: String, format: String },
    #[error("quality value {value} out of range [{min}-{max}] for codec {codec}")]
    QualityOutOfRange {
        value: i32,
        min: i32,
        max: i32,
        codec: String,
    },
    #[error("2-pass encoding is only available with bitrate mode")]
    TwoPassRequiresBitrate,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid encoding options: {0}")]
    Config(#[from] ConfigError),
    #[error("ffmpeg is not installed or not on PATH")]
    FfmpegNotFound,
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),
    #[error("failed to start ffmpeg for {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// ffmpeg exited abnormally; `log` is its captured stderr, verbatim.
    #[error("ffmpeg exited with {code:?} while encoding {}\n{log}", .path.display())]
    Subprocess {
        path: PathBuf,
        code: Option<i32>,
        log: String,
    },
    #[error("encoded file not found: {}", .0.display())]
    OutputMissing(PathBuf),
    #[error("i/o error while supervising ffmpeg: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe: {0}")]
    Launch(#[from] std::io::Error),
    #[error("ffprobe did not exit successfully for {}", .0.display())]
    Failed(PathBuf),
    #[error("failed to parse ffprobe output for {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

use std::io::Read;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_COMPLETED: &str = "completed";

static FRAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"frame=\s*(\d+)").unwrap());
static FPS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"fps=\s*(\d+)").unwrap());
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d{2}:\d{2}:\d{2}\.\d{2})").unwrap());
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"size=\s*(\d+)kB").unwrap());
static BITRATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bitrate=\s*(\d+\.\d+)kbits/s").unwrap());
static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"speed=\s*(\d+\.\d+)x").unwrap());

/// One snapshot of ffmpeg's status at a point in its stderr stream. Each
/// snapshot is built from a single line; fields the line did not carry stay
/// at their zero values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EncodingProgress {
    pub filename: String,
    pub frame: u64,
    pub fps: u64,
    pub time: String,
    pub size: u64,
    pub bitrate: f64,
    pub speed: f64,
    pub status: String,
}

impl EncodingProgress {
    /// Synthetic "file started" snapshot emitted by the supervisor.
    pub fn started(filename: &str) -> Self {
        EncodingProgress {
            filename: String::from(filename),
            status: String::from(STATUS_PROCESSING),
            ..Default::default()
        }
    }

    /// Synthetic "file done" snapshot emitted by the supervisor.
    pub fn completed(filename: &str) -> Self {
        EncodingProgress {
            filename: String::from(filename),
            status: String::from(STATUS_COMPLETED),
            ..Default::default()
        }
    }
}

/// Incremental tokenizer/parser for ffmpeg's stderr. ffmpeg overwrites its
/// status line with carriage returns instead of newlines, and the pipe
/// delivers bytes in arbitrary chunks, so lines are cut on the first `\r` or
/// `\n` in the buffered bytes and an incomplete tail is kept until more data
/// arrives.
pub struct ProgressParser<F: FnMut(EncodingProgress)> {
    filename: String,
    callback: F,
    buf: Vec<u8>,
    last: Option<EncodingProgress>,
}

impl<F: FnMut(EncodingProgress)> ProgressParser<F> {
    pub fn new(filename: &str, callback: F) -> Self {
        ProgressParser {
            filename: String::from(filename),
            callback,
            buf: Vec::new(),
            last: None,
        }
    }

    /// Feeds one chunk of raw bytes, emitting a snapshot for every complete
    /// line it finishes.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        while let Some(i) = self.buf.iter().position(|&b| b == b'\r' || b == b'\n') {
            let chunk: Vec<u8> = self.buf.drain(..=i).collect();
            let line = String::from_utf8_lossy(&chunk[..i]).into_owned();
            self.handle_line(&line);
        }
    }

    /// Flushes a trailing unterminated line once the stream is known to be
    /// finished.
    pub fn finish(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let tail = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&tail).into_owned();
        self.handle_line(&line);
    }

    /// Drains a reader to the end in 4 KiB chunks, parsing as it goes.
    /// Returns everything read, verbatim, for failure diagnostics. Read
    /// errors end the stream the same way EOF does.
    pub fn consume<R: Read>(&mut self, mut reader: R) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    raw.extend_from_slice(&chunk[..n]);
                    self.push(&chunk[..n]);
                }
            }
        }
        self.finish();
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Most recent emitted snapshot, kept as bookkeeping for end-of-phase
    /// reporting. Snapshots are never merged.
    pub fn last(&self) -> Option<&EncodingProgress> {
        self.last.as_ref()
    }

    fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let mut progress = EncodingProgress {
            filename: self.filename.clone(),
            status: String::from(STATUS_PROCESSING),
            ..Default::default()
        };

        if let Some(caps) = FRAME_RE.captures(line) {
            progress.frame = caps[1].parse().unwrap_or(0);
        }
        if let Some(caps) = FPS_RE.captures(line) {
            progress.fps = caps[1].parse().unwrap_or(0);
        }
        if let Some(caps) = TIME_RE.captures(line) {
            progress.time = String::from(&caps[1]);
        }
        if let Some(caps) = SIZE_RE.captures(line) {
            progress.size = caps[1].parse().unwrap_or(0);
        }
        if let Some(caps) = BITRATE_RE.captures(line) {
            progress.bitrate = caps[1].parse().unwrap_or(0.0);
        }
        if let Some(caps) = SPEED_RE.captures(line) {
            progress.speed = caps[1].parse().unwrap_or(0.0);
        }

        // Lines carrying neither a frame counter nor a timestamp are banner
        // or configuration chatter.
        if !progress.time.is_empty() || progress.frame > 0 {
            (self.callback)(progress.clone());
            self.last = Some(progress);
        }
    }
}

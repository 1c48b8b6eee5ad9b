use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use which::which;

use crate::command::{build_args, build_two_pass_args};
use crate::error::EncodeError;
use crate::options::{EncodingOptions, QualityMode};
use crate::progress::{EncodingProgress, ProgressParser};

/// Supervises one ffmpeg invocation per phase per input file and republishes
/// its stderr chatter as structured [`EncodingProgress`] events.
pub struct Encoder {}

impl Encoder {
    pub fn new() -> Self {
        Encoder {}
    }

    /// Encodes every path in `paths` with the same options, sequentially and
    /// fail-fast: the first file-level error aborts the remaining files.
    /// Options are validated and default-filled exactly once, up front;
    /// every error here is raised before any subprocess is spawned.
    pub fn start_encoding(
        &self,
        paths: &[PathBuf],
        options: &mut EncodingOptions,
        progress_tx: Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        options.validate()?;

        // resolved once per job, not per file
        let ffmpeg = which("ffmpeg").map_err(|_| EncodeError::FfmpegNotFound)?;
        debug!("using ffmpeg at {}", ffmpeg.display());

        self.encode_all(&ffmpeg, paths, options, &progress_tx)
    }

    fn encode_all(
        &self,
        ffmpeg: &Path,
        paths: &[PathBuf],
        options: &EncodingOptions,
        progress_tx: &Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        for input in paths {
            self.encode_file(ffmpeg, input, options, progress_tx)?;
        }

        Ok(())
    }

    /// Per-file state machine: bookend start event, preconditions, one or
    /// two encoding phases, output postcondition, bookend end event. On
    /// failure no `completed` event is emitted for this file.
    fn encode_file(
        &self,
        ffmpeg: &Path,
        input: &Path,
        options: &EncodingOptions,
        progress_tx: &Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        let filename = match input.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => input.to_string_lossy().into_owned(),
        };

        let _ = progress_tx.send(EncodingProgress::started(&filename));

        if !input.is_file() {
            return Err(EncodeError::InputNotFound(input.to_path_buf()));
        }

        let output = options.output_path(input);

        if let Some(output_dir) = output.parent() {
            fs::create_dir_all(output_dir).map_err(|source| EncodeError::CreateOutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;
        }

        // refuse to overwrite existing output
        if output.exists() {
            return Err(EncodeError::OutputExists(output));
        }

        info!("encoding {} -> {}", input.display(), output.display());

        if options.use_two_pass && options.quality_mode == QualityMode::Bitrate {
            self.run_two_pass(ffmpeg, input, &output, options, progress_tx)?;
        } else {
            self.run_single_pass(ffmpeg, input, &output, options, progress_tx)?;
        }

        // a zero exit without an output file is an ffmpeg anomaly, not a
        // clean failure
        if !output.is_file() {
            return Err(EncodeError::OutputMissing(output));
        }

        info!("finished {}", input.display());
        let _ = progress_tx.send(EncodingProgress::completed(&filename));

        Ok(())
    }

    fn run_single_pass(
        &self,
        ffmpeg: &Path,
        input: &Path,
        output: &Path,
        options: &EncodingOptions,
        progress_tx: &Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        let mut args = build_args(options, input);
        args.push(output.as_os_str().to_os_string());

        self.run_ffmpeg(ffmpeg, input, args, progress_tx)
    }

    fn run_two_pass(
        &self,
        ffmpeg: &Path,
        input: &Path,
        output: &Path,
        options: &EncodingOptions,
        progress_tx: &Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        let pass_log = two_pass_log_path();
        let (pass1_args, mut pass2_args) = build_two_pass_args(options, input, &pass_log);

        let result = (|| {
            info!("first pass (analysis) for {}", input.display());
            self.run_ffmpeg(ffmpeg, input, pass1_args, progress_tx)?;

            info!("second pass (encode) for {}", input.display());
            pass2_args.push(output.as_os_str().to_os_string());
            self.run_ffmpeg(ffmpeg, input, pass2_args, progress_tx)
        })();

        // the log artifacts are cleaned up whether the passes succeeded or
        // not; missing files are not an error
        for suffix in ["-0.log", "-0.log.mbtree"] {
            let mut artifact = pass_log.clone().into_os_string();
            artifact.push(suffix);
            let _ = fs::remove_file(PathBuf::from(artifact));
        }

        result
    }

    /// Runs one ffmpeg phase. A spawned thread drains stderr through a fresh
    /// progress parser while this thread blocks on exit; without the drain,
    /// ffmpeg stalls once the pipe buffer fills. The captured stderr is
    /// attached verbatim to an abnormal-exit error.
    fn run_ffmpeg(
        &self,
        ffmpeg: &Path,
        input: &Path,
        args: Vec<OsString>,
        progress_tx: &Sender<EncodingProgress>,
    ) -> Result<(), EncodeError> {
        debug!("ffmpeg {:?}", args);

        let mut child = Command::new(ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EncodeError::Spawn {
                path: input.to_path_buf(),
                source,
            })?;

        let stderr = child.stderr.take().unwrap();
        let filename = match input.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => input.to_string_lossy().into_owned(),
        };
        let tx = progress_tx.clone();
        let reader = thread::spawn(move || {
            let mut parser = ProgressParser::new(&filename, move |progress| {
                let _ = tx.send(progress);
            });
            parser.consume(stderr)
        });

        let status = child.wait()?;
        let log = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(EncodeError::Subprocess {
                path: input.to_path_buf(),
                code: status.code(),
                log,
            });
        }

        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

/// Unique pass-log base path for one two-pass run. The two phases share this
/// file, so it must never collide with another run: the pid guards against
/// concurrent processes, the counter against concurrent files within this
/// one, the timestamp against repeated runs.
fn two_pass_log_path() -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "ffmpeg2pass_{}_{}_{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed),
        nanos
    ))
}

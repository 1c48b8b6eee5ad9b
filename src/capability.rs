use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;

/// One encoder the current machine can actually use.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodecInfo {
    pub name: String,
    pub display_name: String,
    pub hardware: String,
    pub formats: Vec<String>,
}

impl CodecInfo {
    fn new(name: &str, display_name: &str, hardware: &str, formats: &[&str]) -> Self {
        CodecInfo {
            name: String::from(name),
            display_name: String::from(display_name),
            hardware: String::from(hardware),
            formats: formats.iter().map(|f| String::from(*f)).collect(),
        }
    }
}

/// Enumerates the codecs available on this system: the CPU baseline plus
/// hardware-accelerated variants gated on the OS, the detected GPU vendor
/// and ffmpeg's advertised encoder list. Probe failures degrade to the
/// baseline instead of erroring.
pub fn available_codecs() -> Vec<CodecInfo> {
    let mut codecs = vec![
        CodecInfo::new("h264", "H.264 (CPU)", "cpu", &["mp4"]),
        CodecInfo::new("hevc", "HEVC (CPU)", "cpu", &["mp4"]),
    ];

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-encoders");
    let encoder_list = match run_with_timeout(cmd, Duration::from_secs(5)) {
        Some(list) => list,
        None => {
            warn!("failed to get ffmpeg encoder list, using default codecs only");
            return codecs;
        }
    };

    if cfg!(target_os = "macos") {
        check_mac_codecs(&mut codecs, &encoder_list);
    } else if cfg!(target_os = "windows") || cfg!(target_os = "linux") {
        check_windows_linux_codecs(&mut codecs, &encoder_list);
    }

    check_vp_codecs(&mut codecs, &encoder_list);

    codecs
}

fn check_mac_codecs(codecs: &mut Vec<CodecInfo>, encoder_list: &str) {
    if encoder_list.contains("hevc_videotoolbox") {
        codecs.push(CodecInfo::new(
            "hevc_videotoolbox",
            "HEVC (Apple Silicon/Intel)",
            "apple",
            &["mp4"],
        ));
    }
    if encoder_list.contains("h264_videotoolbox") {
        codecs.push(CodecInfo::new(
            "h264_videotoolbox",
            "H.264 (Apple Silicon/Intel)",
            "apple",
            &["mp4"],
        ));
    }
}

fn check_windows_linux_codecs(codecs: &mut Vec<CodecInfo>, encoder_list: &str) {
    if has_nvidia_gpu() {
        if encoder_list.contains("hevc_nvenc") {
            codecs.push(CodecInfo::new("hevc_nvenc", "HEVC (NVIDIA GPU)", "nvidia", &["mp4"]));
        }
        if encoder_list.contains("h264_nvenc") {
            codecs.push(CodecInfo::new("h264_nvenc", "H.264 (NVIDIA GPU)", "nvidia", &["mp4"]));
        }
    }

    if has_intel_gpu() {
        if encoder_list.contains("hevc_qsv") {
            codecs.push(CodecInfo::new("hevc_qsv", "HEVC (Intel QuickSync)", "intel", &["mp4"]));
        }
        if encoder_list.contains("h264_qsv") {
            codecs.push(CodecInfo::new("h264_qsv", "H.264 (Intel QuickSync)", "intel", &["mp4"]));
        }
    }
}

fn check_vp_codecs(codecs: &mut Vec<CodecInfo>, encoder_list: &str) {
    if encoder_list.contains("libvpx") {
        codecs.push(CodecInfo::new("vp8", "VP8", "cpu", &["webm"]));
    }
    if encoder_list.contains("libvpx-vp9") {
        codecs.push(CodecInfo::new("vp9", "VP9", "cpu", &["webm"]));
    }
}

fn has_nvidia_gpu() -> bool {
    if cfg!(target_os = "windows") {
        run_with_timeout(Command::new("nvidia-smi"), Duration::from_secs(2)).is_some()
    } else if cfg!(target_os = "linux") {
        match run_with_timeout(Command::new("lspci"), Duration::from_secs(2)) {
            Some(output) => output.to_lowercase().contains("nvidia"),
            None => false,
        }
    } else {
        false
    }
}

fn has_intel_gpu() -> bool {
    let output = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("wmic");
        cmd.args(["path", "win32_VideoController", "get", "name"]);
        run_with_timeout(cmd, Duration::from_secs(2))
    } else if cfg!(target_os = "linux") {
        run_with_timeout(Command::new("lspci"), Duration::from_secs(2))
    } else {
        None
    };

    match output {
        Some(output) => {
            let output = output.to_lowercase();
            output.contains("intel") && output.contains("graphics")
        }
        None => false,
    }
}

/// Runs a probing command with a deadline so that a missing tool or a hung
/// kernel device cannot stall the caller. The child is killed on expiry.
/// Returns stdout on a clean exit, None otherwise.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Option<String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().ok()?;
    let mut stdout = child.stdout.take()?;
    // drained on its own thread so a chatty child cannot fill the pipe
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let buf = reader.join().unwrap_or_default();
                if status.success() {
                    return Some(String::from_utf8_lossy(&buf).into_owned());
                }
                return None;
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    debug!("probe command timed out after {:?}: {:?}", timeout, cmd);
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return None;
                }
                thread::sleep(Duration::from_millis(25));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = reader.join();
                return None;
            }
        }
    }
}

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Metadata for one video file, as reported by ffprobe.
#[derive(Clone, Debug, Serialize)]
pub struct VideoMetadata {
    pub name: String,
    pub size: u64,
    pub duration: f64,
    pub format: String,
    pub codec: String,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FfprobeReport {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    format_name: Option<String>,
}

/// Runs ffprobe against one file and parses its JSON report.
pub fn probe_video(path: &Path) -> Result<VideoMetadata, ProbeError> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(ProbeError::Failed(path.to_path_buf()));
    }

    parse_report(path, &String::from_utf8_lossy(&output.stdout))
}

fn parse_report(path: &Path, json: &str) -> Result<VideoMetadata, ProbeError> {
    let report: FfprobeReport = serde_json::from_str(json).map_err(|source| ProbeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => String::new(),
    };

    // ffprobe reports size/duration as strings; absent or malformed values
    // degrade to zero rather than failing the whole probe.
    let size = report
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let duration = report
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);

    // format_name is a comma-separated alias list; keep the first entry
    let format = match report.format.format_name.as_deref() {
        Some(names) => names.split(',').next().unwrap_or("").to_string(),
        None => String::new(),
    };

    let codec = report
        .streams
        .iter()
        .filter_map(|s| s.codec_name.as_deref())
        .find(|c| !c.is_empty())
        .unwrap_or("")
        .to_string();

    Ok(VideoMetadata {
        name,
        size,
        duration,
        format,
        codec,
        path: path.to_path_buf(),
    })
}

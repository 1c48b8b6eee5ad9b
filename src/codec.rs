use crate::options::QualityMode;

/// Codecs accepted for each target container.
pub fn supported_codecs(format: &str) -> Option<&'static [&'static str]> {
    match format {
        "mp4" => Some(&[
            "h264",
            "h264_nvenc",
            "h264_qsv",
            "hevc",
            "hevc_nvenc",
            "hevc_qsv",
            "hevc_videotoolbox",
        ]),
        "webm" => Some(&["vp8", "vp9"]),
        _ => None,
    }
}

/// Hardware-accelerated variants (`h264_nvenc`, `hevc_qsv`, ...) share the
/// quality table of their base codec.
pub fn base_codec(codec: &str) -> &str {
    match codec.split_once('_') {
        Some((base, _)) => base,
        None => codec,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CodecSettings {
    pub default_mode: QualityMode,
    pub min: i32,
    pub max: i32,
    pub default_value: i32,
}

/// Per-codec quality ranges and defaults. Codecs without an entry skip range
/// validation entirely.
pub fn codec_settings(base: &str) -> Option<CodecSettings> {
    match base {
        "h264" => Some(CodecSettings {
            default_mode: QualityMode::Crf,
            min: 0,
            max: 51,
            default_value: 23,
        }),
        "hevc" => Some(CodecSettings {
            default_mode: QualityMode::Crf,
            min: 0,
            max: 51,
            default_value: 28,
        }),
        "vp9" => Some(CodecSettings {
            default_mode: QualityMode::Crf,
            min: 0,
            max: 63,
            default_value: 31,
        }),
        _ => None,
    }
}

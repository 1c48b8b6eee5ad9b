use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::{base_codec, codec_settings, supported_codecs};
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    #[default]
    Crf,
    Bitrate,
}

/// Per-job configuration, applied to every input file of a job.
///
/// `quality_value == 0` is a sentinel meaning "unset"; [`validate`] replaces
/// it with the codec's default. Field names keep the wire spelling of the
/// JSON payload (`videoformat`, `qualityvalue`, ...).
///
/// [`validate`]: EncodingOptions::validate
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EncodingOptions {
    #[serde(rename = "videoformat")]
    pub video_format: String,
    #[serde(rename = "videocodec")]
    pub video_codec: String,
    #[serde(rename = "qualitymode", default)]
    pub quality_mode: QualityMode,
    #[serde(rename = "qualityvalue", default)]
    pub quality_value: i32,
    #[serde(rename = "use2pass", default)]
    pub use_two_pass: bool,

    #[serde(rename = "isresize", default)]
    pub is_resize: bool,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,

    #[serde(rename = "outputpath", default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub postfix: String,

    #[serde(rename = "audiocodec", default)]
    pub audio_codec: Option<String>,
    #[serde(rename = "audiobitrate", default)]
    pub audio_bitrate: i32,
    #[serde(rename = "audiosamplerate", default)]
    pub audio_samplerate: i32,
}

impl EncodingOptions {
    /// Checks the options against the format/codec tables and fills in the
    /// codec's default quality when the sentinel 0 is present. Normalization
    /// happens in place and at most once; callers see resolved values
    /// afterwards. Idempotent once `quality_value` is non-zero.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let codecs = supported_codecs(&self.video_format)
            .ok_or_else(|| ConfigError::UnsupportedFormat(self.video_format.clone()))?;

        if !codecs.contains(&self.video_codec.as_str()) {
            return Err(ConfigError::UnsupportedCodec {
                codec: self.video_codec.clone(),
                format: self.video_format.clone(),
            });
        }

        // Hardware/experimental codecs without a settings entry skip range
        // validation.
        if let Some(settings) = codec_settings(base_codec(&self.video_codec)) {
            if self.quality_value == 0 {
                self.quality_mode = settings.default_mode;
                self.quality_value = settings.default_value;
            }

            if self.quality_value < settings.min || self.quality_value > settings.max {
                return Err(ConfigError::QualityOutOfRange {
                    value: self.quality_value,
                    min: settings.min,
                    max: settings.max,
                    codec: self.video_codec.clone(),
                });
            }
        }

        if self.use_two_pass && self.quality_mode != QualityMode::Bitrate {
            return Err(ConfigError::TwoPassRequiresBitrate);
        }

        Ok(())
    }

    /// Derives the output path for one input file. An explicit `output_path`
    /// wins; otherwise the input's directory and stem are combined with
    /// `prefix`/`postfix` and the target format's extension. No I/O and no
    /// existence checks here.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }

        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        let stem = match input.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => String::new(),
        };

        dir.join(format!(
            "{}{}{}.{}",
            self.prefix, stem, self.postfix, self.video_format
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp4_h264() -> EncodingOptions {
        EncodingOptions {
            video_format: String::from("mp4"),
            video_codec: String::from("h264"),
            quality_mode: QualityMode::Crf,
            quality_value: 23,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        let mut options = mp4_h264();
        assert!(options.validate().is_ok());
        assert_eq!(options.quality_value, 23);
    }

    #[test]
    fn test_validate_unsupported_format() {
        let mut options = mp4_h264();
        options.video_format = String::from("avi");
        assert_eq!(
            options.validate(),
            Err(ConfigError::UnsupportedFormat(String::from("avi")))
        );
    }

    #[test]
    fn test_validate_unsupported_codec() {
        let mut options = mp4_h264();
        options.video_codec = String::from("vp9");
        assert_eq!(
            options.validate(),
            Err(ConfigError::UnsupportedCodec {
                codec: String::from("vp9"),
                format: String::from("mp4"),
            })
        );
        // rejected before any default filling
        assert_eq!(options.quality_value, 23);
    }

    #[test]
    fn test_validate_fills_codec_default() {
        let mut options = mp4_h264();
        options.quality_mode = QualityMode::Bitrate;
        options.quality_value = 0;
        assert!(options.validate().is_ok());
        assert_eq!(options.quality_mode, QualityMode::Crf);
        assert_eq!(options.quality_value, 23);

        let mut options = mp4_h264();
        options.video_codec = String::from("hevc");
        options.quality_value = 0;
        assert!(options.validate().is_ok());
        assert_eq!(options.quality_value, 28);
    }

    #[test]
    fn test_validate_out_of_range_leaves_value() {
        let mut options = mp4_h264();
        options.quality_value = 99;
        assert_eq!(
            options.validate(),
            Err(ConfigError::QualityOutOfRange {
                value: 99,
                min: 0,
                max: 51,
                codec: String::from("h264"),
            })
        );
        assert_eq!(options.quality_value, 99);
    }

    #[test]
    fn test_validate_hardware_variant_inherits_base_range() {
        let mut options = mp4_h264();
        options.video_codec = String::from("h264_nvenc");
        options.quality_value = 77;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::QualityOutOfRange { max: 51, .. })
        ));
    }

    #[test]
    fn test_validate_unknown_base_skips_range() {
        let mut options = EncodingOptions {
            video_format: String::from("webm"),
            video_codec: String::from("vp8"),
            quality_mode: QualityMode::Crf,
            quality_value: 9000,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
        assert_eq!(options.quality_value, 9000);
    }

    #[test]
    fn test_validate_two_pass_requires_bitrate() {
        let mut options = mp4_h264();
        options.use_two_pass = true;
        assert_eq!(options.validate(), Err(ConfigError::TwoPassRequiresBitrate));

        options.quality_mode = QualityMode::Bitrate;
        options.quality_value = 2500;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_idempotent() {
        let mut options = mp4_h264();
        options.quality_value = 0;
        assert!(options.validate().is_ok());
        let resolved = options.quality_value;
        assert!(options.validate().is_ok());
        assert_eq!(options.quality_value, resolved);
    }

    #[test]
    fn test_output_path_derivation() {
        let options = EncodingOptions {
            video_format: String::from("mp4"),
            prefix: String::from("x_"),
            postfix: String::from("_y"),
            ..Default::default()
        };
        assert_eq!(
            options.output_path(Path::new("/a/b/clip.mov")),
            PathBuf::from("/a/b/x_clip_y.mp4")
        );
    }

    #[test]
    fn test_output_path_no_affixes() {
        let options = EncodingOptions {
            video_format: String::from("webm"),
            ..Default::default()
        };
        assert_eq!(
            options.output_path(Path::new("/videos/raw.mkv")),
            PathBuf::from("/videos/raw.webm")
        );
    }

    #[test]
    fn test_output_path_explicit_wins() {
        let options = EncodingOptions {
            video_format: String::from("mp4"),
            output_path: Some(PathBuf::from("/tmp/out.mp4")),
            prefix: String::from("x_"),
            ..Default::default()
        };
        assert_eq!(
            options.output_path(Path::new("/a/b/clip.mov")),
            PathBuf::from("/tmp/out.mp4")
        );
    }

    #[test]
    fn test_options_json_field_names() {
        let options: EncodingOptions = serde_json::from_str(
            r#"{
                "videoformat": "mp4",
                "videocodec": "hevc",
                "qualitymode": "bitrate",
                "qualityvalue": 2000,
                "use2pass": true,
                "audiobitrate": 128
            }"#,
        )
        .unwrap();
        assert_eq!(options.video_codec, "hevc");
        assert_eq!(options.quality_mode, QualityMode::Bitrate);
        assert!(options.use_two_pass);
        assert_eq!(options.audio_bitrate, 128);
        assert!(options.audio_codec.is_none());
    }
}

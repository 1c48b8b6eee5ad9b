use std::ffi::OsString;
use std::path::Path;

use crate::options::{EncodingOptions, QualityMode};

fn os(s: &str) -> OsString {
    OsString::from(s)
}

fn null_sink() -> OsString {
    if cfg!(windows) { os("NUL") } else { os("/dev/null") }
}

fn push_scale(args: &mut Vec<OsString>, options: &EncodingOptions) {
    if options.is_resize && options.width > 0 && options.height > 0 {
        args.push(os("-vf"));
        args.push(os(&format!("scale={}:{}", options.width, options.height)));
    }
}

fn push_audio(args: &mut Vec<OsString>, options: &EncodingOptions) {
    match &options.audio_codec {
        Some(codec) => {
            args.push(os("-c:a"));
            args.push(os(codec));
        }
        None => {
            args.push(os("-c:a"));
            args.push(os("copy"));
        }
    }
    if options.audio_bitrate > 0 {
        args.push(os("-b:a"));
        args.push(os(&format!("{}k", options.audio_bitrate)));
    }
    if options.audio_samplerate > 0 {
        args.push(os("-ar"));
        args.push(os(&options.audio_samplerate.to_string()));
    }
}

/// Compiles the single-pass argument list for one input file. Flag order
/// matters to ffmpeg and is fixed: input, video codec, exactly one quality
/// flag, optional scale filter, audio flags. The output path is appended by
/// the supervisor.
pub fn build_args(options: &EncodingOptions, input: &Path) -> Vec<OsString> {
    let mut args = vec![os("-i"), input.as_os_str().to_os_string()];

    args.push(os("-c:v"));
    args.push(os(&options.video_codec));

    match options.quality_mode {
        QualityMode::Crf => {
            args.push(os("-crf"));
            args.push(os(&options.quality_value.to_string()));
        }
        QualityMode::Bitrate => {
            args.push(os("-b:v"));
            args.push(os(&format!("{}k", options.quality_value)));
        }
    }

    push_scale(&mut args, options);
    push_audio(&mut args, options);

    args
}

/// Compiles both phases of a two-pass bitrate encode. Pass 1 analyzes only:
/// no audio stream, statistics to `pass_log`, encoded bytes to the null
/// sink. Pass 2 reads the same log and carries the full scale/audio flags;
/// the real output path is appended by the supervisor.
pub fn build_two_pass_args(
    options: &EncodingOptions,
    input: &Path,
    pass_log: &Path,
) -> (Vec<OsString>, Vec<OsString>) {
    let mut pass1 = vec![
        os("-i"),
        input.as_os_str().to_os_string(),
        os("-c:v"),
        os(&options.video_codec),
        os("-b:v"),
        os(&format!("{}k", options.quality_value)),
        os("-pass"),
        os("1"),
        os("-passlogfile"),
        pass_log.as_os_str().to_os_string(),
        os("-an"),
        os("-f"),
        os("null"),
    ];
    push_scale(&mut pass1, options);
    pass1.push(null_sink());

    let mut pass2 = vec![
        os("-i"),
        input.as_os_str().to_os_string(),
        os("-c:v"),
        os(&options.video_codec),
        os("-b:v"),
        os(&format!("{}k", options.quality_value)),
        os("-pass"),
        os("2"),
        os("-passlogfile"),
        pass_log.as_os_str().to_os_string(),
    ];
    push_scale(&mut pass2, options);
    push_audio(&mut pass2, options);

    (pass1, pass2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> EncodingOptions {
        EncodingOptions {
            video_format: String::from("mp4"),
            video_codec: String::from("h264"),
            quality_mode: QualityMode::Crf,
            quality_value: 23,
            ..Default::default()
        }
    }

    fn strs(args: &[OsString]) -> Vec<&str> {
        args.iter().filter_map(|a| a.to_str()).collect()
    }

    #[test]
    fn test_build_args_crf_order() {
        let args = build_args(&options(), Path::new("/a/in.mov"));
        assert_eq!(
            strs(&args),
            vec!["-i", "/a/in.mov", "-c:v", "h264", "-crf", "23", "-c:a", "copy"]
        );
    }

    #[test]
    fn test_build_args_bitrate() {
        let mut opts = options();
        opts.quality_mode = QualityMode::Bitrate;
        opts.quality_value = 2500;
        let built = build_args(&opts, Path::new("in.mp4"));
        let args = strs(&built);
        assert!(args.windows(2).any(|w| w == ["-b:v", "2500k"]));
        assert!(!args.contains(&"-crf"));
    }

    #[test]
    fn test_build_args_resize() {
        let mut opts = options();
        opts.is_resize = true;
        opts.width = 1280;
        opts.height = 720;
        let built = build_args(&opts, Path::new("in.mp4"));
        let args = strs(&built);
        assert!(args.windows(2).any(|w| w == ["-vf", "scale=1280:720"]));
    }

    #[test]
    fn test_build_args_resize_needs_both_dimensions() {
        let mut opts = options();
        opts.is_resize = true;
        opts.width = 1280;
        let built = build_args(&opts, Path::new("in.mp4"));
        let args = strs(&built);
        assert!(!args.contains(&"-vf"));
    }

    #[test]
    fn test_build_args_audio() {
        let mut opts = options();
        opts.audio_codec = Some(String::from("aac"));
        opts.audio_bitrate = 128;
        opts.audio_samplerate = 48000;
        let built = build_args(&opts, Path::new("in.mp4"));
        let args = strs(&built);
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "48000"]));
    }

    #[test]
    fn test_two_pass_phase_one_has_no_audio() {
        let mut opts = options();
        opts.quality_mode = QualityMode::Bitrate;
        opts.quality_value = 2000;
        opts.audio_codec = Some(String::from("aac"));
        let (pass1, pass2) =
            build_two_pass_args(&opts, Path::new("in.mp4"), Path::new("/tmp/2pass"));

        let pass1 = strs(&pass1);
        assert!(pass1.contains(&"-an"));
        assert!(!pass1.contains(&"-c:a"));
        assert!(pass1.windows(2).any(|w| w == ["-pass", "1"]));
        assert!(pass1.windows(2).any(|w| w == ["-f", "null"]));
        assert!(pass1.windows(2).any(|w| w == ["-passlogfile", "/tmp/2pass"]));

        let pass2 = strs(&pass2);
        assert!(!pass2.contains(&"-an"));
        assert!(pass2.windows(2).any(|w| w == ["-pass", "2"]));
        assert!(pass2.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(pass2.windows(2).any(|w| w == ["-passlogfile", "/tmp/2pass"]));
    }

    #[test]
    fn test_two_pass_scale_on_both_phases() {
        let mut opts = options();
        opts.quality_mode = QualityMode::Bitrate;
        opts.quality_value = 1500;
        opts.is_resize = true;
        opts.width = 640;
        opts.height = 360;
        let (pass1, pass2) =
            build_two_pass_args(&opts, Path::new("in.mp4"), Path::new("/tmp/2pass"));
        for pass in [&pass1, &pass2] {
            let args = strs(pass);
            assert!(args.windows(2).any(|w| w == ["-vf", "scale=640:360"]));
        }
    }
}

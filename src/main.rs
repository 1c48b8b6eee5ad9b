use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use human_repr::HumanCount;
use kdam::{BarExt, term, tqdm};
use rustop::opts;

use batchenc::capability::available_codecs;
use batchenc::probe::probe_video;
use batchenc::progress::{STATUS_COMPLETED, STATUS_PROCESSING};
use batchenc::scanner::find_video_files;
use batchenc::{Encoder, EncodingOptions, QualityMode};

fn main() -> ExitCode {
    env_logger::init();

    let (args, _rest) = opts! {
        synopsis "Batch-convert video files with ffmpeg.";
        opt list_codecs:bool=false, short:'L', desc:"List available encoders and exit.";
        opt format:String=String::from("mp4"), short:'f', desc:"Output container. [mp4, webm]";
        opt codec:String=String::from("h264"), short:'c', desc:"Video codec. [h264, hevc, vp8, vp9, h264_nvenc, ...]";
        opt mode:String=String::from("crf"), short:'m', desc:"Quality mode. [crf, bitrate]";
        opt quality:i32=0, short:'q', desc:"CRF value or target bitrate in kbit/s; 0 uses the codec default.";
        opt two_pass:bool=false, short:'t', desc:"Two-pass bitrate encoding.";
        opt width:i32=0, short:'w', desc:"Scale output to this width.";
        opt height:i32=0, short:'H', desc:"Scale output to this height.";
        opt prefix:String=String::new(), short:'p', desc:"Prepended to output file names.";
        opt postfix:String=String::new(), short:'P', desc:"Appended to output file names.";
        opt output:Option<String>, short:'o', desc:"Explicit output path (single input only).";
        opt audio_codec:Option<String>, short:'a', desc:"Audio codec; omit to stream-copy audio.";
        opt audio_bitrate:i32=0, short:'b', desc:"Audio bitrate in kbit/s.";
        opt audio_samplerate:i32=0, short:'r', desc:"Audio sample rate in Hz.";
        param input:Option<String>, desc:"Input video file or directory.";
    }
    .parse_or_exit();

    if args.list_codecs {
        for codec in available_codecs() {
            println!(
                "{:<18} {:<28} {:<8} {}",
                codec.name,
                codec.display_name,
                codec.hardware,
                codec.formats.join(",")
            );
        }
        return ExitCode::SUCCESS;
    }

    let input = match &args.input {
        Some(input) => PathBuf::from(input),
        None => {
            println!("No input given; see --help.");
            return ExitCode::FAILURE;
        }
    };

    let quality_mode = match args.mode.as_str() {
        "crf" => QualityMode::Crf,
        "bitrate" => QualityMode::Bitrate,
        other => {
            println!("Unknown quality mode {:?}; expected crf or bitrate.", other);
            return ExitCode::FAILURE;
        }
    };

    let inputs = match find_video_files(&input) {
        Ok(inputs) => inputs,
        Err(err) => {
            println!("Unable to read {:?}: {}", input, err);
            return ExitCode::FAILURE;
        }
    };
    if inputs.is_empty() {
        println!("No video files found under {:?}.", input);
        return ExitCode::FAILURE;
    }

    for path in &inputs {
        match probe_video(path) {
            Ok(meta) => println!(
                "{:<9} {:<8} {:>7.1}s {} {}",
                meta.size.human_count_bytes().to_string(),
                meta.codec,
                meta.duration,
                meta.format,
                meta.name
            ),
            Err(err) => println!("warning: {}", err),
        }
    }

    let mut options = EncodingOptions {
        video_format: args.format,
        video_codec: args.codec,
        quality_mode,
        quality_value: args.quality,
        use_two_pass: args.two_pass,
        is_resize: args.width > 0 && args.height > 0,
        width: args.width,
        height: args.height,
        output_path: args.output.map(PathBuf::from),
        prefix: args.prefix,
        postfix: args.postfix,
        audio_codec: args.audio_codec,
        audio_bitrate: args.audio_bitrate,
        audio_samplerate: args.audio_samplerate,
    };

    let (tx, rx) = mpsc::channel();
    let encoder_thread = thread::spawn(move || {
        let encoder = Encoder::new();
        encoder.start_encoding(&inputs, &mut options, tx)
    });

    term::init(false);
    let mut pbar = tqdm!(
        total = 0,
        desc = "encoding",
        position = 0,
        force_refresh = true
    );
    for progress in rx {
        match progress.status.as_str() {
            // parsed snapshots always carry a frame or a time, so a bare
            // processing event can only be the encoder's start bookend
            STATUS_PROCESSING if progress.frame == 0 && progress.time.is_empty() => {
                let _ = pbar.write(format!("encoding {}", progress.filename));
            }
            STATUS_COMPLETED => {
                let _ = pbar.write(format!("finished {}", progress.filename));
            }
            _ => {
                pbar.set_postfix(format!(
                    "{} time={} bitrate={}kbits/s speed={}x",
                    (progress.size * 1024).human_count_bytes(),
                    progress.time,
                    progress.bitrate,
                    progress.speed
                ));
                let _ = pbar.update_to(progress.frame as usize);
            }
        }
    }

    match encoder_thread.join() {
        Ok(Ok(())) => {
            println!("Success! ^__^");
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            println!("Failure -__-\n{}", err);
            ExitCode::FAILURE
        }
        Err(_) => {
            println!("Failure -__-\nencoder thread panicked");
            ExitCode::FAILURE
        }
    }
}

#![deny(clippy::all)]

use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use glint::{
    write_image, Animator, AsyncWriter, Color, SamplingMode, Scene, ScriptAnimator, VideoPipe,
    WriteJob,
};
use log::info;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

struct AnimationOptions {
    script: PathBuf,
    frames: u32,
    framerate: u32,
    skip: u32,
    save_frames: bool,
    encode_video: bool,
    ffmpeg: String,
    blur: bool,
    serial: bool,
    use_progress: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("glint")
        .about("An offline ray tracer")
        .arg(
            Arg::with_name("scene")
                .index(1)
                .required(true)
                .takes_value(true)
                .help("Input scene as a json file"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("Override the output file named by the scene"),
        )
        .arg(
            Arg::with_name("super")
                .long("super")
                .takes_value(true)
                .help("Jittered supersampling with NxN subpixels"),
        )
        .arg(
            Arg::with_name("dof")
                .long("dof")
                .takes_value(true)
                .help("Depth of field with N extra lens rays per sample"),
        )
        .arg(
            Arg::with_name("anim")
                .short("a")
                .long("anim")
                .takes_value(true)
                .help("Render an animation driven by the given script"),
        )
        .arg(
            Arg::with_name("blur")
                .short("b")
                .long("blur")
                .takes_value(true)
                .conflicts_with("anim")
                .help("Average script-driven frames into one motion-blurred image"),
        )
        .arg(
            Arg::with_name("frames")
                .long("frames")
                .takes_value(true)
                .default_value("30")
                .help("Amount of frames"),
        )
        .arg(
            Arg::with_name("framerate")
                .long("framerate")
                .takes_value(true)
                .default_value("30")
                .help("Frames per second of scene time and video output"),
        )
        .arg(
            Arg::with_name("skip")
                .long("skip")
                .takes_value(true)
                .default_value("0")
                .help("Advance the script over the first N frames without rendering"),
        )
        .arg(
            Arg::with_name("save-frames")
                .long("save-frames")
                .help("Save animation frames as numbered images in temp/"),
        )
        .arg(
            Arg::with_name("no-ffmpeg")
                .long("no-ffmpeg")
                .help("Do not pipe animation frames to ffmpeg"),
        )
        .arg(
            Arg::with_name("ffmpeg")
                .long("ffmpeg")
                .takes_value(true)
                .default_value("ffmpeg")
                .help("Path of the ffmpeg binary"),
        )
        .arg(
            Arg::with_name("serial")
                .long("serial")
                .help("Render on one thread instead of one task per column"),
        )
        .arg(
            Arg::with_name("no-progress")
                .long("no-progress")
                .help("Hide progress bar"),
        )
        .get_matches();

    let scene_path = Path::new(matches.value_of("scene").unwrap());
    let mut scene = Scene::from_file(scene_path)?;

    let now = Instant::now();
    scene.load_assets(scene_path.parent().unwrap_or_else(|| Path::new("")));
    info!("assets loaded in {:?}", now.elapsed());

    if let Some(subdivisions) = matches.value_of("super") {
        let subdivisions = subdivisions.parse().context("--super expects a number")?;
        scene.set_supersampling(SamplingMode::Jitter, subdivisions);
    }
    if let Some(rays) = matches.value_of("dof") {
        scene.set_dof_rays(rays.parse().context("--dof expects a number")?);
    }
    if let Some(output) = matches.value_of("output") {
        scene.set_output_file(output);
    }

    let serial = matches.is_present("serial");
    let use_progress = !matches.is_present("no-progress");

    match animation_options(&matches)? {
        Some(options) => animate(scene, &options),
        None => render_single(scene, serial, use_progress),
    }
}

fn animation_options(matches: &ArgMatches) -> Result<Option<AnimationOptions>> {
    let blur = matches.is_present("blur");
    let script = match matches.value_of("anim").or_else(|| matches.value_of("blur")) {
        Some(script) => PathBuf::from(script),
        None => return Ok(None),
    };

    let no_ffmpeg = matches.is_present("no-ffmpeg");
    let encode_video = !blur && !no_ffmpeg;

    Ok(Some(AnimationOptions {
        script,
        frames: parse_arg(matches, "frames")?,
        framerate: parse_arg(matches, "framerate")?,
        skip: parse_arg(matches, "skip")?,
        // With the encoder disabled the frames are the only output left.
        save_frames: matches.is_present("save-frames") || (!blur && no_ffmpeg),
        encode_video,
        ffmpeg: matches.value_of("ffmpeg").unwrap().to_string(),
        blur,
        serial: matches.is_present("serial"),
        use_progress: !matches.is_present("no-progress"),
    }))
}

fn parse_arg(matches: &ArgMatches, name: &str) -> Result<u32> {
    matches
        .value_of(name)
        .unwrap()
        .parse()
        .with_context(|| format!("--{} expects a number", name))
}

fn render_single(mut scene: Scene, serial: bool, use_progress: bool) -> Result<()> {
    let now = Instant::now();
    let columns = if serial {
        scene.render()?
    } else {
        scene.render_parallel(use_progress)?
    };
    info!("rendered in {:?}", now.elapsed());

    let output = PathBuf::from(scene.output_file());
    write_image(&columns, &output)?;
    println!("Output written to {}", output.display());

    Ok(())
}

fn animate(scene: Scene, options: &AnimationOptions) -> Result<()> {
    let output = PathBuf::from(scene.output_file());
    let scene = Rc::new(RefCell::new(scene));
    let mut animator = ScriptAnimator::from_file(&options.script, &scene)?;

    let pipe = if options.encode_video {
        Some(VideoPipe::open(
            &options.ffmpeg,
            options.framerate,
            &output.with_extension("mp4"),
        )?)
    } else {
        None
    };
    let writer = AsyncWriter::spawn(pipe);

    if options.save_frames {
        std::fs::create_dir_all("temp")?;
    }

    let frame_time = 1.0 / f64::from(options.framerate);
    let total = options.frames + options.skip;
    let mut accumulated: Option<Vec<Vec<Color>>> = None;
    let mut rendered = 0u32;

    for frame in 0..total {
        // Scripts see absolute scene time; they keep no state across calls.
        if animator.tick(f64::from(frame + 1) * frame_time)? {
            break;
        }
        if frame < options.skip {
            continue;
        }

        let start = Instant::now();
        let columns = if options.serial {
            scene.borrow_mut().render()?
        } else {
            scene.borrow_mut().render_parallel(options.use_progress)?
        };
        info!(
            "frame {}/{} rendered in {:?}",
            frame + 1,
            total,
            start.elapsed()
        );

        if options.save_frames {
            writer.submit(WriteJob::Image {
                columns: columns.clone(),
                path: PathBuf::from(format!("temp/img{:04}.png", frame)),
            })?;
        }
        if options.blur {
            accumulate(&mut accumulated, &columns);
            rendered += 1;
        }
        if options.encode_video {
            writer.submit(WriteJob::Frame(columns))?;
        }
    }

    if let Some(mut sum) = accumulated {
        for column in &mut sum {
            for pixel in column.iter_mut() {
                *pixel /= f64::from(rendered);
            }
        }
        write_image(&sum, &output)?;
        println!("Output written to {}", output.display());
    }

    writer.finish()?;

    Ok(())
}

fn accumulate(accumulated: &mut Option<Vec<Vec<Color>>>, columns: &[Vec<Color>]) {
    match accumulated.as_mut() {
        Some(sum) => {
            for (sum_column, column) in sum.iter_mut().zip(columns) {
                for (sum_pixel, pixel) in sum_column.iter_mut().zip(column) {
                    *sum_pixel += *pixel;
                }
            }
        }
        None => *accumulated = Some(columns.to_vec()),
    }
}

use crate::core::Color;
use crate::error::Error;
use image::png::PngEncoder;
use image::{ColorType, RgbImage};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;

// Upper bound on queued frames; submitting past it blocks the renderer
// instead of buffering without limit.
const PENDING_WRITES: usize = 8;

/// Pack render columns into an image buffer. Columns arrive left to right,
/// each already ordered top to bottom.
pub fn to_image(columns: &[Vec<Color>]) -> RgbImage {
    let width = columns.len() as u32;
    let height = columns.first().map_or(0, Vec::len) as u32;

    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb(columns[x as usize][y as usize].to_rgb8())
    })
}

pub fn write_image(columns: &[Vec<Color>], path: &Path) -> Result<(), Error> {
    to_image(columns).save(path)?;
    info!("image written to {}", path.display());

    Ok(())
}

fn encode_png(columns: &[Vec<Color>]) -> Result<Vec<u8>, Error> {
    let image = to_image(columns);
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded).encode(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;

    Ok(encoded)
}

/// Stdin of an external encoder process, fed one PNG-encoded frame at a
/// time (`-f image2pipe`).
#[derive(Debug)]
pub struct VideoPipe {
    child: Child,
}

impl VideoPipe {
    pub fn open(ffmpeg: &str, framerate: u32, output: &Path) -> Result<Self, Error> {
        let child = Command::new(ffmpeg)
            .args(&["-y", "-framerate", &framerate.to_string()])
            .args(&["-f", "image2pipe", "-i", "-"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| Error::Encoder(format!("could not start {}: {}", ffmpeg, err)))?;

        Ok(Self { child })
    }

    pub fn write_frame(&mut self, columns: &[Vec<Color>]) -> Result<(), Error> {
        let frame = encode_png(columns)?;
        let stdin = self
            .child
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Encoder(String::from("encoder stdin is closed")))?;
        stdin.write_all(&frame)?;

        Ok(())
    }

    /// Close the pipe and wait for the encoder to finish the container.
    pub fn finish(mut self) -> Result<(), Error> {
        drop(self.child.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::Encoder(format!("encoder exited with {}", status)));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum WriteJob {
    /// Save a frame as an image file.
    Image {
        columns: Vec<Vec<Color>>,
        path: PathBuf,
    },
    /// Feed a frame to the video encoder.
    Frame(Vec<Vec<Color>>),
}

/// Single writer thread behind a bounded channel, so rendering the next
/// frame overlaps with encoding the previous one without unbounded
/// buffering. The first write error ends the thread and is reported by
/// `finish`.
#[derive(Debug)]
pub struct AsyncWriter {
    sender: mpsc::SyncSender<WriteJob>,
    worker: thread::JoinHandle<Result<(), Error>>,
}

impl AsyncWriter {
    pub fn spawn(pipe: Option<VideoPipe>) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<WriteJob>(PENDING_WRITES);
        let worker = thread::spawn(move || {
            let mut pipe = pipe;
            for job in receiver {
                match job {
                    WriteJob::Image { columns, path } => write_image(&columns, &path)?,
                    WriteJob::Frame(columns) => match pipe.as_mut() {
                        Some(pipe) => pipe.write_frame(&columns)?,
                        None => {
                            return Err(Error::Encoder(String::from(
                                "no video encoder attached",
                            )))
                        }
                    },
                }
            }

            match pipe {
                Some(pipe) => pipe.finish(),
                None => Ok(()),
            }
        });

        Self { sender, worker }
    }

    /// Queue a write. Blocks while the queue is full; fails once the writer
    /// has stopped (call `finish` for its error).
    pub fn submit(&self, job: WriteJob) -> Result<(), Error> {
        self.sender.send(job).map_err(|_| Error::WriterClosed)
    }

    /// Drain the queue, close the encoder and surface the first error.
    pub fn finish(self) -> Result<(), Error> {
        drop(self.sender);
        self.worker.join().map_err(|_| Error::WriterClosed)?
    }
}

//! vrstereo-io - Frame I/O
//!
//! - [`png`]: color frames and grayscale planes
//! - [`gif`]: looping animated previews
//! - [`sequence`]: `<index:06>.png` frame directories
//!
//! The free functions below are path-based conveniences over the
//! reader/writer functions in those modules.

mod error;
pub mod gif;
pub mod png;
pub mod sequence;

pub use error::{IoError, IoResult};
pub use sequence::{
    FrameSequence, frame_file_name, parse_frame_index, read_sequence, write_sequence,
};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use vrstereo_core::{Frame, Plane};

/// Read a PNG file as a frame with the given sequence index
pub fn read_png<P: AsRef<Path>>(path: P, index: u32) -> IoResult<Frame> {
    let reader = BufReader::new(File::open(path)?);
    png::decode_frame(reader, index)
}

/// Write a frame to a PNG file
pub fn write_png<P: AsRef<Path>>(frame: &Frame, path: P) -> IoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    png::encode_frame(frame, writer)
}

/// Read a grayscale PNG file as raw sample values
pub fn read_gray_png<P: AsRef<Path>>(path: P) -> IoResult<Plane> {
    let reader = BufReader::new(File::open(path)?);
    png::decode_gray(reader)
}

/// Write a `[0, 1]` plane to an 8-bit grayscale PNG file
pub fn write_gray_png<P: AsRef<Path>>(plane: &Plane, path: P) -> IoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    png::encode_gray(plane, writer)
}

/// Write frames to a looping animated GIF file
pub fn write_gif<P: AsRef<Path>>(frames: &[Frame], delay_cs: u16, path: P) -> IoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    gif::write_animated_gif(frames, delay_cs, writer)
}

/// Read every frame of a GIF file
pub fn read_gif<P: AsRef<Path>>(path: P) -> IoResult<Vec<Frame>> {
    let reader = BufReader::new(File::open(path)?);
    gif::read_gif_frames(reader)
}

//! Frame-sequence directories
//!
//! A sequence directory holds one PNG per frame named `<index:06>.png`.
//! Reading parses the index from each name and requires the indices to be
//! exactly `0..n`; directory listing order is never used.
//!
//! [`FrameSequence`] decodes frames one at a time, so a long video never
//! has to be held in memory.

use crate::{IoResult, png};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use vrstereo_core::{Error, Frame, FrameArena};

/// File name of the frame with the given index
pub fn frame_file_name(index: u32) -> String {
    format!("{:06}.png", index)
}

/// Parse the index out of a sequence file name
///
/// Accepts exactly six or more ASCII digits followed by `.png`.
pub fn parse_frame_index(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(".png")?;
    if stem.len() < 6 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Write every frame to `dir/<index:06>.png`, creating `dir` if needed
///
/// Returns the written paths in the order of `frames`.
pub fn write_sequence<P: AsRef<Path>>(dir: P, frames: &[Frame]) -> IoResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    frames
        .iter()
        .map(|f| {
            let path = dir.join(frame_file_name(f.index()));
            write_frame_file(f, &path)?;
            Ok(path)
        })
        .collect()
}

/// Write one frame into its slot in a sequence directory
pub fn write_frame_file(frame: &Frame, path: &Path) -> IoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    png::encode_frame(frame, writer)
}

/// Sequence entries of `dir`, sorted by parsed index
pub fn list_sequence<P: AsRef<Path>>(dir: P) -> IoResult<Vec<(u32, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(index) = name.to_str().and_then(parse_frame_index) {
            entries.push((index, entry.path()));
        }
    }
    entries.sort_by_key(|(i, _)| *i);
    Ok(entries)
}

/// A sequence directory whose frames are decoded on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    dir: PathBuf,
    len: u32,
}

impl FrameSequence {
    /// Open a sequence directory
    ///
    /// # Errors
    ///
    /// Returns [`crate::IoError::Core`] wrapping `NonContiguousIndex` when
    /// the parsed indices are not exactly `0..n`.
    pub fn open<P: AsRef<Path>>(dir: P) -> IoResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let entries = list_sequence(&dir)?;
        for (expected, &(found, _)) in entries.iter().enumerate() {
            if found != expected as u32 {
                return Err(Error::NonContiguousIndex {
                    expected: expected as u32,
                    found,
                }
                .into());
            }
        }
        Ok(FrameSequence {
            dir,
            len: entries.len() as u32,
        })
    }

    /// Directory holding the frames
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// File of frame `index`
    pub fn path(&self, index: u32) -> PathBuf {
        self.dir.join(frame_file_name(index))
    }

    /// Decode frame `index`
    ///
    /// # Errors
    ///
    /// Returns [`crate::IoError::Core`] wrapping `IndexOutOfBounds` for an
    /// index past the end, and decode errors from the file.
    pub fn load(&self, index: u32) -> IoResult<Frame> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index: index as usize,
                len: self.len as usize,
            }
            .into());
        }
        let reader = BufReader::new(File::open(self.path(index))?);
        png::decode_frame(reader, index)
    }

    /// Decode every frame into an arena
    pub fn load_all(&self) -> IoResult<FrameArena> {
        let mut arena = FrameArena::with_capacity(self.len());
        for index in 0..self.len {
            arena.push(self.load(index)?)?;
        }
        Ok(arena)
    }
}

/// Read a sequence directory into an arena
///
/// # Errors
///
/// Returns [`crate::IoError::Core`] wrapping `NonContiguousIndex` when the
/// parsed indices are not exactly `0..n`, and decode errors from any frame.
pub fn read_sequence<P: AsRef<Path>>(dir: P) -> IoResult<FrameArena> {
    FrameSequence::open(dir)?.load_all()
}

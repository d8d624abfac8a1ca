//! Animated GIF preview
//!
//! The preview shows the first few side-by-side frames of a job, looping,
//! shrunk to a modest width. Pairs are decoded from disk one at a time.

use crate::config::MAX_PREVIEW_FRAMES;
use crate::{JobError, JobResult, Stage, Violation};
use std::path::Path;
use tracing::info;
use vrstereo_core::Frame;
use vrstereo_io::FrameSequence;
use vrstereo_transform::{ScaleMethod, hconcat, scale_to_size};

/// Delay between preview frames, in hundredths of a second
pub const PREVIEW_DELAY_CS: u16 = 6;

/// Preview frames wider than this are shrunk
pub const PREVIEW_MAX_WIDTH: u32 = 960;

fn preview_frame(left: &Frame, right: &Frame) -> JobResult<Frame> {
    let scaled = hconcat(left, right).and_then(|sbs| {
        if sbs.width() <= PREVIEW_MAX_WIDTH {
            return Ok(sbs);
        }
        let h = (sbs.height() as u64 * PREVIEW_MAX_WIDTH as u64 / sbs.width() as u64).max(1);
        scale_to_size(&sbs, PREVIEW_MAX_WIDTH, h as u32, ScaleMethod::Auto)
    });
    scaled.map_err(|e| JobError::from_transform(Stage::Preview, e))
}

/// Write a side-by-side preview of the first `max_frames` pairs
///
/// At most [`MAX_PREVIEW_FRAMES`] pairs are used whatever `max_frames`
/// asks for. Returns `false` without writing anything when `max_frames`
/// is 0.
///
/// # Errors
///
/// [`JobError::Contract`] at [`Stage::Preview`] for unpaired sequences,
/// [`JobError::Image`] if a frame cannot be read or the GIF written.
pub fn write_preview(
    left: &FrameSequence,
    right: &FrameSequence,
    max_frames: usize,
    path: &Path,
) -> JobResult<bool> {
    if max_frames == 0 {
        return Ok(false);
    }
    if left.len() != right.len() {
        return Err(JobError::contract(
            Stage::Preview,
            Violation::CountMismatch {
                left: left.len(),
                right: right.len(),
            },
        ));
    }
    if left.is_empty() {
        return Err(JobError::contract(Stage::Preview, Violation::EmptySequence));
    }

    let n = max_frames.min(MAX_PREVIEW_FRAMES).min(left.len());
    let load = |seq: &FrameSequence, i: u32| {
        seq.load(i)
            .map_err(|e| JobError::from_io(Stage::Preview, e))
    };
    let frames = (0..n as u32)
        .map(|i| preview_frame(&load(left, i)?, &load(right, i)?))
        .collect::<JobResult<Vec<_>>>()?;

    info!(path = %path.display(), frames = n, "writing preview");
    vrstereo_io::write_gif(&frames, PREVIEW_DELAY_CS, path)
        .map_err(|e| JobError::from_io(Stage::Preview, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrstereo_core::color;
    use vrstereo_io::write_sequence;

    fn seq(tag: &str, n: u32, w: u32, h: u32) -> FrameSequence {
        let dir = std::env::temp_dir().join(format!("vrstereo-preview-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let frames: Vec<Frame> = (0..n)
            .map(|i| Frame::new_filled(i, w, h, color::compose_rgb((i * 5) as u8, 0, 0)).unwrap())
            .collect();
        write_sequence(&dir, &frames).unwrap();
        FrameSequence::open(&dir).unwrap()
    }

    fn cleanup(seqs: &[&FrameSequence]) {
        for s in seqs {
            let _ = std::fs::remove_dir_all(s.dir());
        }
    }

    #[test]
    fn test_preview_takes_first_frames() {
        let path = std::env::temp_dir().join(format!("vrstereo-preview-{}.gif", std::process::id()));
        let (l, r) = (seq("l", 5, 8, 4), seq("r", 5, 8, 4));
        assert!(write_preview(&l, &r, 3, &path).unwrap());
        let frames = vrstereo_io::read_gif(&path).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].dimensions(), (16, 4));
        let _ = std::fs::remove_file(&path);
        cleanup(&[&l, &r]);
    }

    #[test]
    fn test_preview_never_exceeds_cap() {
        let path = std::env::temp_dir().join(format!("vrstereo-preview-cap-{}.gif", std::process::id()));
        let (l, r) = (seq("capl", 45, 2, 2), seq("capr", 45, 2, 2));
        assert!(write_preview(&l, &r, 100, &path).unwrap());
        let frames = vrstereo_io::read_gif(&path).unwrap();
        assert_eq!(frames.len(), MAX_PREVIEW_FRAMES);
        let _ = std::fs::remove_file(&path);
        cleanup(&[&l, &r]);
    }

    #[test]
    fn test_preview_disabled() {
        let path = std::env::temp_dir().join("vrstereo-preview-disabled.gif");
        let (l, r) = (seq("dl", 2, 4, 4), seq("dr", 2, 4, 4));
        assert!(!write_preview(&l, &r, 0, &path).unwrap());
        assert!(!path.exists());
        cleanup(&[&l, &r]);
    }

    #[test]
    fn test_preview_unpaired() {
        let path = std::env::temp_dir().join("vrstereo-preview-unpaired.gif");
        let (l, r) = (seq("ul", 3, 4, 4), seq("ur", 2, 4, 4));
        let err = write_preview(&l, &r, 4, &path).unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::CountMismatch { left: 3, right: 2 }));
        assert!(!path.exists());
        cleanup(&[&l, &r]);
    }

    #[test]
    fn test_preview_shrinks_wide_frames() {
        let path = std::env::temp_dir().join(format!("vrstereo-preview-wide-{}.gif", std::process::id()));
        let (l, r) = (seq("wl", 1, 1280, 20), seq("wr", 1, 1280, 20));
        write_preview(&l, &r, 40, &path).unwrap();
        let frames = vrstereo_io::read_gif(&path).unwrap();
        assert_eq!(frames[0].dimensions(), (960, 7));
        let _ = std::fs::remove_file(&path);
        cleanup(&[&l, &r]);
    }
}

//! FrameArena - index-addressed frame sequence
//!
//! An arena holds frames `0..n` where `frames[i].index() == i`. Order is
//! decided by the index carried on each frame, never by the order in which
//! frames were discovered or produced.

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Contiguous, index-addressed sequence of frames
#[derive(Debug, Clone, Default)]
pub struct FrameArena {
    frames: Vec<Frame>,
}

impl FrameArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty arena with room for `n` frames
    pub fn with_capacity(n: usize) -> Self {
        FrameArena {
            frames: Vec::with_capacity(n),
        }
    }

    /// Adopt an unordered batch of frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonContiguousIndex`] unless the indices are exactly
    /// `0..n` with no duplicates.
    pub fn from_unordered(mut frames: Vec<Frame>) -> Result<Self> {
        frames.sort_by_key(Frame::index);
        for (expected, f) in frames.iter().enumerate() {
            if f.index() != expected as u32 {
                return Err(Error::NonContiguousIndex {
                    expected: expected as u32,
                    found: f.index(),
                });
            }
        }
        Ok(FrameArena { frames })
    }

    /// Append the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonContiguousIndex`] if `frame.index() != len()`.
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        let expected = self.frames.len() as u32;
        if frame.index() != expected {
            return Err(Error::NonContiguousIndex {
                expected,
                found: frame.index(),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Get the frame at `index`
    pub fn get(&self, index: u32) -> Option<&Frame> {
        self.frames.get(index as usize)
    }

    /// Number of frames
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the arena holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate frames in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Frames in index order
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Consume the arena, returning its frames in index order
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Dimensions shared by every frame.
    ///
    /// Returns `Ok(None)` for an empty arena.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] at the first frame whose size
    /// differs from frame 0.
    pub fn dimensions(&self) -> Result<Option<(u32, u32)>> {
        let Some(first) = self.frames.first() else {
            return Ok(None);
        };
        let expected = first.dimensions();
        for f in &self.frames[1..] {
            if f.dimensions() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: f.dimensions(),
                });
            }
        }
        Ok(Some(expected))
    }
}

impl<'a> IntoIterator for &'a FrameArena {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(i: u32) -> Frame {
        Frame::new(i, 2, 2).unwrap()
    }

    #[test]
    fn test_push_in_order() {
        let mut a = FrameArena::new();
        a.push(frame(0)).unwrap();
        a.push(frame(1)).unwrap();
        assert!(matches!(
            a.push(frame(3)),
            Err(Error::NonContiguousIndex {
                expected: 2,
                found: 3
            })
        ));
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(1).map(Frame::index), Some(1));
    }

    #[test]
    fn test_from_unordered() {
        let a = FrameArena::from_unordered(vec![frame(2), frame(0), frame(1)]).unwrap();
        let idx: Vec<u32> = a.iter().map(Frame::index).collect();
        assert_eq!(idx, vec![0, 1, 2]);

        assert!(FrameArena::from_unordered(vec![frame(0), frame(2)]).is_err());
        assert!(FrameArena::from_unordered(vec![frame(0), frame(0)]).is_err());
    }

    #[test]
    fn test_dimensions() {
        let mut a = FrameArena::new();
        assert_eq!(a.dimensions().unwrap(), None);
        a.push(frame(0)).unwrap();
        a.push(Frame::new(1, 3, 2).unwrap()).unwrap();
        assert!(matches!(
            a.dimensions(),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}

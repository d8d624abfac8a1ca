//! Fast-marching inpainting
//!
//! Fills masked pixels from the hole boundary inward, in order of their
//! arrival distance `T` from the boundary. Each newly reached pixel takes a
//! weighted average of the already-known pixels within `radius`:
//!
//! ```text
//! w = |dir| * dst * lev
//! dir = r . grad(T)          (direction: favours pixels along the normal)
//! dst = 1 / |r|^3            (inverse distance)
//! lev = 1 / (1 + |T(q) - T(p)|)   (level-set proximity)
//! ```
//!
//! where `r = p - q` points from the known pixel `q` to the pixel `p`
//! being filled.
//!
//! # Notes
//!
//! Filled pixels become valid. A masked pixel with no valid pixel within
//! reach keeps validity 0; this only happens when a whole connected hole
//! region has no valid boundary at all.

use crate::RegionResult;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use vrstereo_core::{Error, Frame, HoleMask, color};

/// Arrival time of pixels not yet reached
const FAR: f32 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Value is final
    Known,
    /// On the marching front
    Band,
    /// Not reached yet
    Inside,
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest `t` first
#[derive(Debug, Clone, Copy)]
struct Node {
    t: f32,
    idx: usize,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

struct March {
    w: usize,
    h: usize,
    state: Vec<State>,
    t: Vec<f32>,
    pixels: Vec<u32>,
}

impl March {
    fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> {
        let (w, h) = (self.w, self.h);
        let (x, y) = (idx % w, idx / w);
        let mut out = [None; 4];
        if x > 0 {
            out[0] = Some(idx - 1);
        }
        if x + 1 < w {
            out[1] = Some(idx + 1);
        }
        if y > 0 {
            out[2] = Some(idx - w);
        }
        if y + 1 < h {
            out[3] = Some(idx + w);
        }
        out.into_iter().flatten()
    }

    fn at(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            None
        } else {
            Some(y as usize * self.w + x as usize)
        }
    }

    /// Eikonal update from two perpendicular neighbors
    fn solve(&self, a: Option<usize>, b: Option<usize>) -> f32 {
        let known = |i: Option<usize>| i.filter(|&i| self.state[i] == State::Known);
        match (known(a), known(b)) {
            (Some(a), Some(b)) => {
                let (t1, t2) = (self.t[a], self.t[b]);
                let d = t1 - t2;
                if d.abs() >= std::f32::consts::SQRT_2 {
                    return 1.0 + t1.min(t2);
                }
                let r = (2.0 - d * d).sqrt();
                let s = (t1 + t2 - r) * 0.5;
                if s >= t1 && s >= t2 {
                    s
                } else {
                    let s = s + r;
                    if s >= t1 && s >= t2 { s } else { FAR }
                }
            }
            (Some(a), None) => 1.0 + self.t[a],
            (None, Some(b)) => 1.0 + self.t[b],
            (None, None) => FAR,
        }
    }

    fn arrival(&self, x: isize, y: isize) -> f32 {
        let (l, r) = (self.at(x - 1, y), self.at(x + 1, y));
        let (u, d) = (self.at(x, y - 1), self.at(x, y + 1));
        self.solve(l, u)
            .min(self.solve(r, u))
            .min(self.solve(l, d))
            .min(self.solve(r, d))
    }

    fn reached(&self, i: Option<usize>) -> Option<usize> {
        i.filter(|&i| self.state[i] != State::Inside)
    }

    /// One-sided or central difference of `T` along one axis
    fn grad_axis(&self, center: usize, prev: Option<usize>, next: Option<usize>) -> f32 {
        match (self.reached(prev), self.reached(next)) {
            (Some(p), Some(n)) => (self.t[n] - self.t[p]) * 0.5,
            (None, Some(n)) => self.t[n] - self.t[center],
            (Some(p), None) => self.t[center] - self.t[p],
            (None, None) => 0.0,
        }
    }

    /// Weighted average of reached, valid pixels within `radius`
    fn fill_value(&self, idx: usize, radius: i32) -> Option<u32> {
        let (x, y) = ((idx % self.w) as isize, (idx / self.w) as isize);
        let gx = self.grad_axis(idx, self.at(x - 1, y), self.at(x + 1, y));
        let gy = self.grad_axis(idx, self.at(x, y - 1), self.at(x, y + 1));
        let tp = self.t[idx];

        let (mut r_acc, mut g_acc, mut b_acc, mut wsum) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        let rad = radius as isize;
        for dy in -rad..=rad {
            for dx in -rad..=rad {
                let len2 = (dx * dx + dy * dy) as f32;
                if len2 == 0.0 || len2 > (radius * radius) as f32 {
                    continue;
                }
                let Some(q) = self.reached(self.at(x + dx, y + dy)) else {
                    continue;
                };
                let p = self.pixels[q];
                if !color::is_valid(p) {
                    continue;
                }
                // r = p - q
                let (rx, ry) = (-dx as f32, -dy as f32);
                let mut dir = rx * gx + ry * gy;
                if dir.abs() <= 0.01 {
                    dir = 1.0e-6;
                }
                let dst = 1.0 / (len2 * len2.sqrt());
                let lev = 1.0 / (1.0 + (self.t[q] - tp).abs());
                let w = (dir * dst * lev).abs();
                let (pr, pg, pb) = color::extract_rgb(p);
                r_acc += w * pr as f32;
                g_acc += w * pg as f32;
                b_acc += w * pb as f32;
                wsum += w;
            }
        }
        if wsum <= 0.0 {
            return None;
        }
        let ch = |v: f32| (v / wsum).round().clamp(0.0, 255.0) as u8;
        Some(color::compose_rgb(ch(r_acc), ch(g_acc), ch(b_acc)))
    }
}

/// Fill the masked pixels of `frame`
///
/// # Arguments
///
/// * `frame` - Eye image; pixels outside the mask are never changed
/// * `mask` - Pixels to fill, same size as `frame`
/// * `radius` - Neighborhood radius in pixels; `0` returns the input as is
///
/// # Errors
///
/// Returns a wrapped [`Error::DimensionMismatch`] if mask and frame sizes
/// differ.
pub fn inpaint_telea(frame: &Frame, mask: &HoleMask, radius: u32) -> RegionResult<Frame> {
    if mask.dimensions() != frame.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: frame.dimensions(),
            actual: mask.dimensions(),
        }
        .into());
    }
    if radius == 0 || mask.is_empty() {
        return Ok(frame.clone());
    }

    let (w, h) = frame.dimensions();
    let mut m = March {
        w: w as usize,
        h: h as usize,
        state: mask
            .bits()
            .iter()
            .map(|&hole| if hole { State::Inside } else { State::Known })
            .collect(),
        t: mask
            .bits()
            .iter()
            .map(|&hole| if hole { FAR } else { 0.0 })
            .collect(),
        pixels: frame.data().to_vec(),
    };

    // Initial front: known pixels touching the hole
    let mut heap = BinaryHeap::new();
    for idx in 0..m.state.len() {
        if m.state[idx] == State::Known
            && m.neighbors(idx).any(|n| m.state[n] == State::Inside)
        {
            m.state[idx] = State::Band;
            heap.push(Node { t: 0.0, idx });
        }
    }

    let radius = radius.min(i32::MAX as u32) as i32;
    while let Some(Node { idx, .. }) = heap.pop() {
        m.state[idx] = State::Known;
        let next: Vec<usize> = m
            .neighbors(idx)
            .filter(|&n| m.state[n] == State::Inside)
            .collect();
        for n in next {
            let (x, y) = ((n % m.w) as isize, (n / m.w) as isize);
            let t = m.arrival(x, y);
            m.t[n] = t;
            if let Some(p) = m.fill_value(n, radius) {
                m.pixels[n] = p;
            }
            m.state[n] = State::Band;
            heap.push(Node { t, idx: n });
        }
    }

    Ok(Frame::from_pixels(frame.index(), w, h, m.pixels)?)
}

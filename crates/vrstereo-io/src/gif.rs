//! Animated GIF support
//!
//! Frames are quantized independently with median cut to at most 256
//! colors and written with a local palette each. The animation loops
//! forever.

use crate::{IoError, IoResult};
use gif::{ColorOutput, DecodeOptions, Encoder, Repeat};
use std::collections::HashMap;
use std::io::{Read, Write};
use vrstereo_core::{Frame, color};

/// Largest side length a GIF can describe
const GIF_MAX_SIDE: u32 = u16::MAX as u32;

/// Write `frames` as a looping animated GIF
///
/// # Arguments
///
/// * `frames` - Frames in display order, all of the same size
/// * `delay_cs` - Display time of each frame in hundredths of a second
/// * `writer` - Output sink
///
/// # Errors
///
/// Returns [`IoError::InvalidData`] for an empty list, mixed frame sizes or
/// frames too large for the format.
pub fn write_animated_gif<W: Write>(frames: &[Frame], delay_cs: u16, writer: W) -> IoResult<()> {
    let first = frames
        .first()
        .ok_or_else(|| IoError::InvalidData("no frames for GIF".to_string()))?;
    let (w, h) = first.dimensions();
    if w > GIF_MAX_SIDE || h > GIF_MAX_SIDE {
        return Err(IoError::InvalidData(format!(
            "frame {}x{} too large for GIF",
            w, h
        )));
    }
    if let Some(f) = frames.iter().find(|f| f.dimensions() != (w, h)) {
        return Err(IoError::InvalidData(format!(
            "GIF frame {} is {}x{}, expected {}x{}",
            f.index(),
            f.width(),
            f.height(),
            w,
            h
        )));
    }

    let mut encoder = Encoder::new(writer, w as u16, h as u16, &[])
        .map_err(|e| IoError::EncodeError(format!("GIF encoder error: {}", e)))?;
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| IoError::EncodeError(format!("GIF repeat error: {}", e)))?;

    for frame in frames {
        let (indices, palette) = quantize(frame);
        let mut gif_frame = gif::Frame::from_indexed_pixels(w as u16, h as u16, indices, None);
        gif_frame.palette = Some(palette);
        gif_frame.delay = delay_cs;
        encoder
            .write_frame(&gif_frame)
            .map_err(|e| IoError::EncodeError(format!("GIF frame write error: {}", e)))?;
    }

    Ok(())
}

/// Decode every frame of a GIF into full-canvas color frames
///
/// Frame `i` of the animation gets sequence index `i`.
pub fn read_gif_frames<R: Read>(reader: R) -> IoResult<Vec<Frame>> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    let mut decoder = options
        .read_info(reader)
        .map_err(|e| IoError::DecodeError(format!("GIF decode error: {}", e)))?;

    let (w, h) = (decoder.width() as u32, decoder.height() as u32);
    let mut canvas = vec![color::BLACK; (w as usize) * (h as usize)];
    let mut out = Vec::new();

    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| IoError::DecodeError(format!("GIF frame error: {}", e)))?
    {
        let (fl, ft) = (frame.left as usize, frame.top as usize);
        let fw = frame.width as usize;
        for (i, px) in frame.buffer.chunks_exact(4).enumerate() {
            let (x, y) = (fl + i % fw, ft + i / fw);
            if x < w as usize && y < h as usize && px[3] != 0 {
                canvas[y * w as usize + x] = color::compose_rgb(px[0], px[1], px[2]);
            }
        }
        out.push(Frame::from_pixels(out.len() as u32, w, h, canvas.clone())?);
    }

    if out.is_empty() {
        return Err(IoError::InvalidData("no frames in GIF".to_string()));
    }
    Ok(out)
}

/// Quantize a frame to a palette of at most 256 colors
///
/// Returns per-pixel palette indices and the flat `r, g, b, ...` palette,
/// padded to a power of two entries.
fn quantize(frame: &Frame) -> (Vec<u8>, Vec<u8>) {
    let total = frame.data().len();
    let max_samples: usize = 100_000;
    let stride = total.div_ceil(total.min(max_samples).max(1));

    let samples: Vec<[u8; 3]> = frame
        .data()
        .iter()
        .step_by(stride)
        .map(|&p| {
            let (r, g, b) = color::extract_rgb(p);
            [r, g, b]
        })
        .collect();
    let palette = median_cut(&samples, 256);

    let mut cache: HashMap<u32, u8> = HashMap::new();
    let indices = frame
        .data()
        .iter()
        .map(|&p| {
            let key = p >> 8;
            *cache.entry(key).or_insert_with(|| {
                let (r, g, b) = color::extract_rgb(p);
                find_nearest_color(&palette, r, g, b) as u8
            })
        })
        .collect();

    let size = palette.len().next_power_of_two().max(2);
    let mut flat = Vec::with_capacity(size * 3);
    for &[r, g, b] in &palette {
        flat.extend_from_slice(&[r, g, b]);
    }
    flat.resize(size * 3, 0);
    (indices, flat)
}

/// Find nearest color index in palette
fn find_nearest_color(palette: &[[u8; 3]], r: u8, g: u8, b: u8) -> usize {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, &[pr, pg, pb]) in palette.iter().enumerate() {
        let dr = (r as i32 - pr as i32).unsigned_abs();
        let dg = (g as i32 - pg as i32).unsigned_abs();
        let db = (b as i32 - pb as i32).unsigned_abs();
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best = i;
            if dist == 0 {
                break;
            }
        }
    }
    best
}

/// Median-cut color quantization
fn median_cut(pixels: &[[u8; 3]], max_colors: usize) -> Vec<[u8; 3]> {
    if pixels.is_empty() {
        return vec![[0, 0, 0]];
    }

    let mut boxes: Vec<Vec<[u8; 3]>> = vec![pixels.to_vec()];

    while boxes.len() < max_colors {
        let mut best_box_idx = 0;
        let mut best_range = 0u32;
        for (i, b) in boxes.iter().enumerate() {
            if b.len() < 2 {
                continue;
            }
            let (_, range) = widest_axis(b);
            if range > best_range {
                best_range = range;
                best_box_idx = i;
            }
        }
        if best_range == 0 {
            break;
        }

        let mut pixels = boxes.swap_remove(best_box_idx);
        let (axis, _) = widest_axis(&pixels);
        pixels.sort_unstable_by_key(|p| p[axis]);
        let right = pixels.split_off(pixels.len() / 2);
        boxes.push(pixels);
        boxes.push(right);
    }

    boxes.iter().map(|b| box_average(b)).collect()
}

/// Channel with the largest spread and that spread
fn widest_axis(pixels: &[[u8; 3]]) -> (usize, u32) {
    let mut lo = [255u8; 3];
    let mut hi = [0u8; 3];
    for p in pixels {
        for c in 0..3 {
            lo[c] = lo[c].min(p[c]);
            hi[c] = hi[c].max(p[c]);
        }
    }
    (0..3)
        .map(|c| (c, (hi[c] - lo[c]) as u32))
        .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
}

/// Average color of a box
fn box_average(pixels: &[[u8; 3]]) -> [u8; 3] {
    if pixels.is_empty() {
        return [0, 0, 0];
    }
    let mut sum = [0u64; 3];
    for p in pixels {
        for c in 0..3 {
            sum[c] += p[c] as u64;
        }
    }
    let n = pixels.len() as u64;
    [(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8]
}

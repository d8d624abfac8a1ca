//! PNG image format support
//!
//! Color frames are written as 8-bit RGB; the validity channel is not
//! persisted, so holes come out black. When reading, an alpha channel of 0
//! marks a hole and any other alpha is a valid sample.
//!
//! Grayscale planes are read at their native 8- or 16-bit precision and
//! returned as raw values, which is what depth oracles emit.

use crate::{IoError, IoResult};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Seek, Write};
use vrstereo_core::{Frame, FrameMut, Plane, color};

struct Decoded {
    width: u32,
    height: u32,
    color_type: ColorType,
    bit_depth: BitDepth,
    line_size: usize,
    data: Vec<u8>,
}

fn decode<R: BufRead + Seek>(reader: R) -> IoResult<Decoded> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let (color_type, bit_depth) = reader.output_color_type();
    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;
    buf.truncate(output_info.buffer_size());

    Ok(Decoded {
        width: output_info.width,
        height: output_info.height,
        color_type,
        bit_depth,
        line_size: output_info.line_size,
        data: buf,
    })
}

/// Read a PNG image as a color frame with the given sequence index
///
/// Grayscale images are replicated into all three channels.
pub fn decode_frame<R: BufRead + Seek>(reader: R, index: u32) -> IoResult<Frame> {
    let img = decode(reader)?;
    let samples = match img.color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        ColorType::Indexed => {
            return Err(IoError::UnsupportedFormat(
                "indexed PNG was not expanded".to_string(),
            ));
        }
    };
    let bytes_per_sample = match img.bit_depth {
        BitDepth::Eight => 1,
        BitDepth::Sixteen => 2,
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNG bit depth after expansion: {:?}",
                other
            )));
        }
    };
    let stride = samples * bytes_per_sample;

    let mut frame = FrameMut::new_filled(index, img.width, img.height, color::BLACK)?;
    for y in 0..img.height {
        let row = &img.data[y as usize * img.line_size..];
        let out = frame.row_mut(y);
        for (x, px) in out.iter_mut().enumerate() {
            // High byte of each sample; 16-bit PNG is big-endian
            let s = |k: usize| row[x * stride + k * bytes_per_sample];
            *px = match samples {
                1 => color::compose_rgb(s(0), s(0), s(0)),
                2 => validity(color::compose_rgb(s(0), s(0), s(0)), s(1)),
                3 => color::compose_rgb(s(0), s(1), s(2)),
                _ => validity(color::compose_rgb(s(0), s(1), s(2)), s(3)),
            };
        }
    }
    Ok(frame.into())
}

fn validity(pixel: u32, alpha: u8) -> u32 {
    if alpha == 0 {
        pixel & !0xff
    } else {
        pixel
    }
}

/// Read a grayscale PNG as a plane of raw sample values
///
/// 8-bit images give values in `[0, 255]`, 16-bit in `[0, 65535]`. Color
/// images are reduced to luma.
pub fn decode_gray<R: BufRead + Seek>(reader: R) -> IoResult<Plane> {
    let img = decode(reader)?;
    let (samples, sixteen) = match (img.color_type, img.bit_depth) {
        (ColorType::Grayscale, BitDepth::Eight) => (1, false),
        (ColorType::Grayscale, BitDepth::Sixteen) => (1, true),
        (ColorType::GrayscaleAlpha, BitDepth::Eight) => (2, false),
        (ColorType::GrayscaleAlpha, BitDepth::Sixteen) => (2, true),
        (ColorType::Rgb, BitDepth::Eight) => (3, false),
        (ColorType::Rgb, BitDepth::Sixteen) => (3, true),
        (ColorType::Rgba, BitDepth::Eight) => (4, false),
        (ColorType::Rgba, BitDepth::Sixteen) => (4, true),
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNG format for depth: {:?} {:?}",
                color_type, bit_depth
            )));
        }
    };
    let bps = if sixteen { 2 } else { 1 };
    let stride = samples * bps;

    let mut plane = Plane::new(img.width, img.height)?;
    for y in 0..img.height {
        let row = &img.data[y as usize * img.line_size..];
        let out = plane.row_mut(y);
        for (x, v) in out.iter_mut().enumerate() {
            let sample = |k: usize| -> f32 {
                let i = x * stride + k * bps;
                if sixteen {
                    u16::from_be_bytes([row[i], row[i + 1]]) as f32
                } else {
                    row[i] as f32
                }
            };
            *v = if samples >= 3 {
                0.299 * sample(0) + 0.587 * sample(1) + 0.114 * sample(2)
            } else {
                sample(0)
            };
        }
    }
    Ok(plane)
}

/// Write a frame as an 8-bit RGB PNG
pub fn encode_frame<W: Write>(frame: &Frame, writer: W) -> IoResult<()> {
    let mut encoder = Encoder::new(writer, frame.width(), frame.height());
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    writer
        .write_image_data(&frame.to_rgb_bytes())
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}

/// Write a plane of `[0, 1]` values as an 8-bit grayscale PNG
///
/// Values are clamped, scaled by 255 and rounded.
pub fn encode_gray<W: Write>(plane: &Plane, writer: W) -> IoResult<()> {
    let mut encoder = Encoder::new(writer, plane.width(), plane.height());
    encoder.set_color(ColorType::Grayscale);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let data: Vec<u8> = plane
        .data()
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_png_roundtrip_rgb() {
        let mut m = FrameMut::new_filled(0, 5, 5, color::BLACK).unwrap();
        m.set_rgb(0, 0, 255, 0, 0).unwrap();
        m.set_rgb(1, 1, 0, 255, 0).unwrap();
        m.set_rgb(2, 2, 0, 0, 255).unwrap();
        let frame: Frame = m.into();

        let mut buffer = Vec::new();
        encode_frame(&frame, &mut buffer).unwrap();
        let back = decode_frame(Cursor::new(buffer), 4).unwrap();

        assert_eq!(back.index(), 4);
        assert_eq!(back.dimensions(), (5, 5));
        assert_eq!(back.data(), frame.data());
    }

    #[test]
    fn test_holes_written_black() {
        let mut m = FrameMut::new_filled(0, 2, 1, color::compose_rgb(9, 9, 9)).unwrap();
        m.set_pixel(1, 0, color::HOLE_PIXEL).unwrap();
        let mut buffer = Vec::new();
        encode_frame(&m.into(), &mut buffer).unwrap();
        let back = decode_frame(Cursor::new(buffer), 0).unwrap();
        assert_eq!(back.get_rgb(1, 0), Some((0, 0, 0)));
        assert!(back.is_valid(1, 0));
    }

    #[test]
    fn test_gray_roundtrip() {
        let plane = Plane::from_data(3, 1, vec![0.0, 0.5, 1.0]).unwrap();
        let mut buffer = Vec::new();
        encode_gray(&plane, &mut buffer).unwrap();
        let raw = decode_gray(Cursor::new(buffer)).unwrap();
        assert_eq!(raw.data(), &[0.0, 128.0, 255.0]);
    }

    #[test]
    fn test_decode_gray_sixteen_bit() {
        let mut buffer = Vec::new();
        {
            let mut encoder = Encoder::new(&mut buffer, 2, 1);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(BitDepth::Sixteen);
            let mut w = encoder.write_header().unwrap();
            w.write_image_data(&[0x01, 0x00, 0xff, 0xff]).unwrap();
        }
        let raw = decode_gray(Cursor::new(buffer)).unwrap();
        assert_eq!(raw.data(), &[256.0, 65535.0]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_frame(Cursor::new(vec![1u8, 2, 3]), 0).unwrap_err();
        assert!(matches!(err, IoError::DecodeError(_)));
    }
}

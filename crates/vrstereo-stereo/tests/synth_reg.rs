//! Stereo synthesis regression test
//!
//! Checks the screen plane, the zero-baseline case and the direction of
//! the eye shifts on a depth ramp.

use vrstereo_core::color;
use vrstereo_stereo::{Eye, StereoParams, build_disparity, raw_disparity, synthesize};
use vrstereo_test::{RegParams, fixtures};
use vrstereo_transform::curvature_warp;

#[test]
fn synth_reg() {
    let mut rp = RegParams::new("synth");

    // --- Test 1: uniform 0.5 depth is the screen plane ---
    let src = fixtures::textured_frame(3, 48, 24, 11).expect("textured");
    let depth = fixtures::constant_depth(48, 24, 0.5).expect("depth");
    let params = StereoParams {
        baseline: 6.0,
        curvature: 0.35,
        inpaint_radius: 3,
    };
    let disparity = build_disparity(&depth, params.baseline).expect("disparity");
    rp.compare_values(0.0, disparity.max_abs() as f64, 0.0);
    let pair = synthesize(&src, &depth, &params).expect("synthesize");
    let warped = curvature_warp(&src, params.curvature).expect("warp");
    rp.compare_frames(&warped, pair.left());
    rp.compare_frames(&warped, pair.right());
    rp.compare_values(0.0, pair.holes(Eye::Left).found as f64, 0.0);
    rp.compare_values(0.0, pair.holes(Eye::Right).found as f64, 0.0);
    rp.compare_values(3.0, pair.index() as f64, 0.0);

    // --- Test 2: zero baseline gives identical eyes ---
    let ramp = fixtures::horizontal_ramp_depth(48, 24).expect("ramp");
    let flat = StereoParams {
        baseline: 0.0,
        ..params
    };
    let pair = synthesize(&src, &ramp, &flat).expect("synthesize");
    rp.compare_frames(pair.left(), pair.right());
    rp.compare_frames(&warped, pair.left());

    // --- Test 3: raw disparity before smoothing ---
    let raw = raw_disparity(&ramp, 6.0).expect("raw");
    let mut max_err = 0.0f32;
    for y in 0..24 {
        for x in 0..48 {
            let d = ramp.get(x, y).expect("depth");
            let want = 6.0 * (d - 0.5);
            max_err = max_err.max((raw.shift_unchecked(x, y) - want).abs());
        }
    }
    rp.compare_values(0.0, max_err as f64, 1e-6);

    // --- Test 4: ramp disparity reaches about -3 / +3 at the edges ---
    let ramp64 = fixtures::horizontal_ramp_depth(64, 8).expect("ramp");
    let field = build_disparity(&ramp64, 6.0).expect("disparity");
    rp.compare_values(-3.0, field.shift_unchecked(0, 4) as f64, 0.15);
    rp.compare_values(3.0, field.shift_unchecked(63, 4) as f64, 0.15);

    // --- Test 5: sampling direction on the ramp, no filling ---
    // Source red channel equals the column, so each eye pixel reports the
    // source column it sampled.
    let data: Vec<u32> = (0..64 * 8)
        .map(|i| color::compose_rgb((i % 64) as u8 * 2, 0, 0))
        .collect();
    let cols = vrstereo_core::Frame::from_pixels(0, 64, 8, data).expect("frame");
    let raw_params = StereoParams {
        baseline: 6.0,
        curvature: 0.0,
        inpaint_radius: 0,
    };
    let pair = synthesize(&cols, &ramp64, &raw_params).expect("synthesize");
    let src_col = |f: &vrstereo_core::Frame, x: u32| f.get_rgb(x, 4).map(|(r, _, _)| r as f64 / 2.0);
    let d0 = field.shift_unchecked(0, 4) as f64;
    let d63 = field.shift_unchecked(63, 4) as f64;
    // Left edge: left eye samples x + 3, right eye x - 3 falls off the frame
    rp.compare_values(-d0, src_col(pair.left(), 0).unwrap_or(-1.0), 0.51);
    rp.check(!pair.right().is_valid(0, 4), "right eye hole at left edge");
    // Right edge mirrored: left eye samples x - 3, right eye x + 3
    rp.compare_values(63.0 - d63, src_col(pair.left(), 63).unwrap_or(-1.0), 0.51);
    rp.check(!pair.right().is_valid(63, 4), "right eye hole at right edge");
    // The left eye only compresses the ramp inward, so it never runs out
    rp.compare_values(0.0, pair.holes(Eye::Left).found as f64, 0.0);
    rp.check(pair.holes(Eye::Right).found > 0, "right eye has holes");
    rp.compare_values(
        pair.holes(Eye::Right).found as f64,
        pair.holes(Eye::Right).unfilled as f64,
        0.0,
    );
    rp.write_frame(pair.left(), "ramp_left").expect("write");
    rp.write_frame(pair.right(), "ramp_right").expect("write");

    // --- Test 6: filling removes the ramp holes ---
    let filled = synthesize(&cols, &ramp64, &StereoParams { inpaint_radius: 3, ..raw_params })
        .expect("synthesize");
    rp.compare_values(0.0, filled.left().count_holes() as f64, 0.0);
    rp.compare_values(0.0, filled.right().count_holes() as f64, 0.0);
    rp.check(
        filled.holes(Eye::Right).found == pair.holes(Eye::Right).found,
        "same holes found with and without filling",
    );

    assert!(rp.cleanup(), "synth regression test failed");
}

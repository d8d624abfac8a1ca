//! Curvature warp regression test
//!
//! Flat-screen identity, hole-free output and fixed points of the bend.

use vrstereo_test::{RegParams, fixtures};
use vrstereo_transform::{curvature_columns, curvature_is_monotonic, curvature_warp};

#[test]
fn curvature_reg() {
    let mut rp = RegParams::new("curvature");

    let src = fixtures::textured_frame(0, 65, 24, 7).expect("textured");
    rp.write_frame(&src, "source").expect("write");

    // --- Test 1: c = 0 is pixel-identical ---
    let flat = curvature_warp(&src, 0.0).expect("flat warp");
    rp.compare_frames(&src, &flat);

    // --- Test 2: every accepted curvature keeps size and fills every pixel ---
    for c in [0.1f32, 0.35, 0.6] {
        let out = curvature_warp(&src, c).expect("warp");
        rp.compare_values(65.0, out.width() as f64, 0.0);
        rp.compare_values(24.0, out.height() as f64, 0.0);
        rp.compare_values(0.0, out.count_holes() as f64, 0.0);
        rp.check(curvature_is_monotonic(c), "accepted curvature is fold-free");

        // Edges and center are fixed points of the bend
        for y in [0u32, 11, 23] {
            for x in [0u32, 32, 64] {
                rp.check(
                    out.get_pixel(x, y) == src.get_pixel(x, y),
                    "fixed point of the bend",
                );
            }
        }
        rp.write_frame(&out, &format!("c{:.2}", c)).expect("write");
    }

    // --- Test 3: the column map is strictly increasing ---
    let cols = curvature_columns(640, 0.6);
    rp.check(cols.windows(2).all(|p| p[1] > p[0]), "monotonic columns");
    rp.compare_values(639.0, cols[639] as f64, 1e-3);

    // --- Test 4: out-of-range curvature is rejected ---
    rp.check(curvature_warp(&src, 0.7).is_err(), "reject c > 0.6");
    rp.check(curvature_warp(&src, -0.01).is_err(), "reject c < 0");

    assert!(rp.cleanup(), "curvature regression test failed");
}

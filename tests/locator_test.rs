// Whitespace locator tests: literal placement scenarios and invariants.

use std::sync::{Arc, Mutex};

use image::{GrayImage, Luma, Rgb, RgbImage};
use stampwise::locate::integral::IntegralMask;
use stampwise::locate::{
    ContentMasks, DebugEvent, DebugSink, LocatorError, LocatorOptions, OverlayDebugSink,
    Placement, PlacementQuality, build_masks, find_placement, locate_stamp,
};
use stampwise::raster::PageRaster;

fn white_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

fn black_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
}

fn fill_rect(page: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
    for y in y0..y1 {
        for x in x0..x1 {
            page.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
}

fn raster(page: RgbImage, dpi: u32) -> PageRaster {
    PageRaster::new(page, dpi).expect("valid raster")
}

fn opts_at(dpi: u32) -> LocatorOptions {
    LocatorOptions {
        working_dpi: dpi,
        ..LocatorOptions::default()
    }
}

// ---- literal scenarios ----

/// Blank A4 at 300 DPI: maximum stamp in the top-right corner.
#[test]
fn test_blank_a4_at_300dpi_gets_max_stamp_top_right() {
    let placement = locate_stamp(&raster(white_page(2480, 3508), 300), &opts_at(300))
        .expect("placement on blank page");

    assert_eq!(placement.size, 450, "300px at ref DPI scales to 450");
    assert_eq!((placement.x, placement.y), (2480 - 450 - 60, 60));
    assert_eq!(placement.overlap_fraction, 0.0);
    assert_eq!(placement.quality, PlacementQuality::Acceptable);
}

/// A page that is all content never raises; it degrades.
#[test]
fn test_fully_covered_page_degrades() {
    let placement = locate_stamp(&raster(black_page(600, 600), 200), &opts_at(200))
        .expect("degraded placement");

    assert_eq!(placement.quality, PlacementQuality::Degraded);
    assert_eq!(placement.overlap_fraction, 1.0);
}

/// Smaller than the minimum stamp plus margins: the one real failure.
#[test]
fn test_page_too_small() {
    let err = locate_stamp(&raster(white_page(150, 150), 200), &opts_at(200))
        .expect_err("should not fit");
    assert!(matches!(err, LocatorError::PageTooSmall { .. }));
}

/// A centered matrix code leaves the corners free for a full-size stamp.
#[test]
fn test_centered_matrix_code_keeps_corners_free() {
    let mut page = white_page(1654, 2339);
    // Solid 400px square with a hole grid: connected, near-square, high
    // variance, like a large QR code.
    fill_rect(&mut page, 627, 969, 1027, 1369);
    let mut hy = 989u32;
    while hy + 10 < 1349 {
        let mut hx = 647u32;
        while hx + 10 < 1007 {
            for y in hy..hy + 10 {
                for x in hx..hx + 10 {
                    page.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
            hx += 40;
        }
        hy += 40;
    }

    let placement = locate_stamp(&raster(page, 200), &opts_at(200)).expect("placement");

    assert_eq!(placement.size, 300);
    assert_eq!((placement.x, placement.y), (1654 - 300 - 40, 40), "top-right corner");
    assert!(placement.overlap_fraction <= 0.02);
}

/// Corner logos push the stamp into the top-center gutter.
#[test]
fn test_occupied_corners_fall_back_to_gutter() {
    let mut page = white_page(1654, 2339);
    fill_rect(&mut page, 40, 40, 440, 340); // top-left logo
    fill_rect(&mut page, 1214, 40, 1614, 340); // top-right logo
    fill_rect(&mut page, 40, 500, 1614, 2300); // body

    let placement =
        locate_stamp(&raster(page, 200), &opts_at(200)).expect("placement in gutter");

    assert_eq!(placement.size, 300, "the gutter fits a full-size stamp");
    assert_eq!(placement.quality, PlacementQuality::Acceptable);
    assert_eq!(placement.y, 40, "stamp sits at the top margin");
    assert!(
        (460..=900).contains(&placement.x),
        "stamp lands between the logos, got x={}",
        placement.x
    );
}

/// Only a 90px pocket at 8% overlap exists: fallback, smallest size.
#[test]
fn test_fallback_pocket_at_min_size() {
    let mut text = GrayImage::from_pixel(600, 600, Luma([255]));
    // Clear a 90x90 pocket, then re-cover 8% of it.
    for y in 200..290 {
        for x in 200..290 {
            text.put_pixel(x, y, Luma([0]));
        }
    }
    for y in 200..208 {
        for x in 200..281 {
            text.put_pixel(x, y, Luma([255]));
        }
    }
    let masks = ContentMasks::new(
        text,
        GrayImage::new(600, 600),
        GrayImage::new(600, 600),
    );

    let placement = find_placement(&masks, &opts_at(200)).expect("fallback placement");

    assert_eq!(placement.quality, PlacementQuality::Fallback);
    assert_eq!(placement.size, 90);
    assert_eq!((placement.x, placement.y), (200, 200));
    assert!((placement.overlap_fraction - 0.08).abs() < 1e-9);
}

// ---- invariants ----

#[test]
fn test_blank_union_gives_max_size_corner() {
    let placement =
        locate_stamp(&raster(white_page(1000, 1000), 200), &opts_at(200)).expect("placement");
    assert_eq!(placement.size, 300);
    assert_eq!((placement.x, placement.y), (1000 - 300 - 40, 40));
    assert_eq!(placement.overlap_fraction, 0.0);
}

#[test]
fn test_blank_without_corner_preference_still_max_size() {
    let opts = LocatorOptions {
        prefer_corners: false,
        ..opts_at(200)
    };
    let placement =
        locate_stamp(&raster(white_page(1000, 1000), 200), &opts).expect("placement");
    assert_eq!(placement.size, 300);
    assert_eq!(placement.overlap_fraction, 0.0);
}

#[test]
fn test_placement_respects_margin_bounds() {
    let mut page = white_page(900, 700);
    fill_rect(&mut page, 0, 0, 900, 350);
    let r = raster(page, 200);
    let placement = locate_stamp(&r, &opts_at(200)).expect("placement");

    assert!(placement.x >= 40 && placement.y >= 40);
    assert!(placement.x + placement.size + 40 <= r.width());
    assert!(placement.y + placement.size + 40 <= r.height());
}

#[test]
fn test_determinism_bitwise_equal_placements() {
    let mut page = white_page(1200, 1600);
    fill_rect(&mut page, 100, 100, 700, 900);
    fill_rect(&mut page, 150, 1000, 1100, 1500);
    let r = raster(page, 200);

    let a = locate_stamp(&r, &opts_at(200)).expect("first run");
    let b = locate_stamp(&r, &opts_at(200)).expect("second run");
    assert_eq!(a, b);
}

#[test]
fn test_reported_overlap_matches_naive_recount() {
    let mut page = white_page(1200, 1600);
    fill_rect(&mut page, 100, 100, 1100, 700);
    fill_rect(&mut page, 100, 800, 500, 1550);
    let r = raster(page, 200);
    let opts = opts_at(200);

    let masks = build_masks(&r, &opts).expect("masks");
    let placement = locate_stamp(&r, &opts).expect("placement");

    let mut forbidden = 0u64;
    for y in placement.y..placement.y + placement.size {
        for x in placement.x..placement.x + placement.size {
            let hit = masks.text.get_pixel(x, y)[0] != 0
                || masks.image.get_pixel(x, y)[0] != 0
                || masks.qr.get_pixel(x, y)[0] != 0;
            if hit {
                forbidden += 1;
            }
        }
    }
    let naive = forbidden as f64 / (placement.size as f64 * placement.size as f64);
    assert!(
        (placement.overlap_fraction - naive).abs() < 1e-12,
        "reported {} vs recounted {}",
        placement.overlap_fraction,
        naive
    );
}

/// Doubling the DPI doubles the placement, geometry otherwise unchanged.
#[test]
fn test_dpi_scaling_scales_the_placement() {
    let mut small = white_page(1000, 1400);
    fill_rect(&mut small, 200, 300, 400, 600);
    let mut large = white_page(2000, 2800);
    fill_rect(&mut large, 400, 600, 800, 1200);

    let p1 = locate_stamp(&raster(small, 200), &opts_at(200)).expect("placement at 200");
    let p2 = locate_stamp(&raster(large, 400), &opts_at(400)).expect("placement at 400");

    assert_eq!(p2.size, p1.size * 2);
    assert_eq!(p2.x, p1.x * 2);
    assert_eq!(p2.y, p1.y * 2);
}

#[test]
fn test_monotone_mask_growth_never_lowers_overlap() {
    let mut a = GrayImage::new(800, 800);
    for y in 100..300 {
        for x in 100..500 {
            a.put_pixel(x, y, Luma([255]));
        }
    }
    let mut b = a.clone();
    for y in 50..700 {
        for x in 60..200 {
            b.put_pixel(x, y, Luma([255]));
        }
    }

    let ia = IntegralMask::from_mask(&a);
    let ib = IntegralMask::from_mask(&b);
    for (x, y) in [(40, 40), (100, 100), (300, 250), (460, 460)] {
        for size in [90, 140, 300] {
            assert!(
                ib.overlap_fraction(x, y, size) >= ia.overlap_fraction(x, y, size),
                "overlap dropped after mask growth at ({x},{y}) size {size}"
            );
        }
    }
}

// ---- option validation ----

#[test]
fn test_rejects_ascending_size_sequence() {
    let opts = LocatorOptions {
        size_sequence: vec![90, 140, 300],
        ..LocatorOptions::default()
    };
    let err = locate_stamp(&raster(white_page(600, 600), 200), &opts).expect_err("ascending");
    assert!(matches!(err, LocatorError::InvalidOptions(_)));
}

#[test]
fn test_rejects_out_of_range_sizes() {
    let opts = LocatorOptions {
        size_sequence: vec![400, 300],
        ..LocatorOptions::default()
    };
    let err = locate_stamp(&raster(white_page(600, 600), 200), &opts).expect_err("oversized");
    assert!(matches!(err, LocatorError::InvalidOptions(_)));
}

#[test]
fn test_rejects_inverted_thresholds() {
    let opts = LocatorOptions {
        acceptable_overlap: 0.2,
        fallback_overlap: 0.1,
        ..LocatorOptions::default()
    };
    let err = locate_stamp(&raster(white_page(600, 600), 200), &opts).expect_err("inverted");
    assert!(matches!(err, LocatorError::InvalidOptions(_)));
}

#[test]
fn test_rejects_invalid_rasters() {
    assert!(matches!(
        PageRaster::new(RgbImage::new(0, 100), 200),
        Err(LocatorError::InvalidRaster(_))
    ));
    assert!(matches!(
        PageRaster::new(RgbImage::new(100, 100), 0),
        Err(LocatorError::InvalidRaster(_))
    ));
    let gray = image::DynamicImage::new_luma8(100, 100);
    assert!(matches!(
        PageRaster::from_dynamic(gray, 200),
        Err(LocatorError::InvalidRaster(_))
    ));
}

// ---- debug sink ----

struct CapturingSink {
    seen: Mutex<Option<(Placement, f64, f64, f64)>>,
}

impl DebugSink for CapturingSink {
    fn on_page(&self, event: &DebugEvent<'_>) {
        *self.seen.lock().unwrap() = Some((
            event.placement,
            event.overlap_by_mask.text,
            event.overlap_by_mask.image,
            event.overlap_by_mask.qr,
        ));
    }
}

#[test]
fn test_debug_sink_receives_one_event_with_breakdown() {
    let sink = Arc::new(CapturingSink {
        seen: Mutex::new(None),
    });
    let opts = LocatorOptions {
        debug_sink: Some(sink.clone()),
        ..opts_at(200)
    };

    let placement =
        locate_stamp(&raster(white_page(800, 800), 200), &opts).expect("placement");

    let seen = sink.seen.lock().unwrap().expect("sink saw the page");
    assert_eq!(seen.0, placement);
    assert_eq!((seen.1, seen.2, seen.3), (0.0, 0.0, 0.0));
}

#[test]
fn test_overlay_sink_writes_a_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = LocatorOptions {
        debug_sink: Some(Arc::new(OverlayDebugSink::new(dir.path(), 3))),
        ..opts_at(200)
    };

    locate_stamp(&raster(white_page(500, 500), 200), &opts).expect("placement");

    let overlay = dir.path().join("page_0003_overlay.png");
    assert!(overlay.exists(), "overlay PNG written");
    let decoded = image::open(&overlay).expect("overlay decodes");
    assert_eq!((decoded.width(), decoded.height()), (500, 500));
}

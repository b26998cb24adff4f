// Stamp compositor tests: scaling, alpha compositing, plan bounds.

use image::{Rgba, RgbaImage};
use stampwise::locate::StampPlan;
use stampwise::stamp::{Compositor, StampCompositor};

fn white_page(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}

fn red_stamp(side: u32) -> RgbaImage {
    RgbaImage::from_pixel(side, side, Rgba([200, 30, 30, 255]))
}

#[test]
fn test_stamp_is_scaled_and_composited_at_plan() {
    let compositor = StampCompositor::from_image(red_stamp(8));
    let mut page = white_page(400, 400);
    let plan = StampPlan { page_number: 1, x: 50, y: 60, size: 100 };

    compositor.apply(&mut page, &plan, "Pièce n° DOC-1").expect("apply");

    // Inside the stamp square: red.
    let inside = page.get_pixel(100, 110);
    assert!(inside[0] > 150 && inside[1] < 90, "stamp pixel {:?}", inside);
    // Just outside the square: untouched white.
    assert_eq!(page.get_pixel(40, 110), &Rgba([255, 255, 255, 255]));
    assert_eq!(page.get_pixel(300, 300), &Rgba([255, 255, 255, 255]));
}

#[test]
fn test_transparent_stamp_regions_keep_the_page() {
    let mut stamp = red_stamp(8);
    // Left half fully transparent.
    for y in 0..8 {
        for x in 0..4 {
            stamp.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    let compositor = StampCompositor::from_image(stamp);
    let mut page = white_page(300, 300);
    let plan = StampPlan { page_number: 1, x: 100, y: 100, size: 80 };

    compositor.apply(&mut page, &plan, "").expect("apply");

    // Transparent half leaves white; opaque half is red.
    let left = page.get_pixel(110, 140);
    let right = page.get_pixel(170, 140);
    assert!(left[0] > 240 && left[1] > 240, "transparent side {:?}", left);
    assert!(right[0] > 150 && right[1] < 90, "opaque side {:?}", right);
}

#[test]
fn test_plan_outside_page_is_rejected() {
    let compositor = StampCompositor::from_image(red_stamp(8));
    let mut page = white_page(200, 200);
    let plan = StampPlan { page_number: 1, x: 150, y: 150, size: 100 };

    assert!(compositor.apply(&mut page, &plan, "").is_err());
}

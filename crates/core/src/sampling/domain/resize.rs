use image::imageops::{self, FilterType};
use image::RgbImage;

/// Dimensions that fit `width x height` inside a `max_side` square while
/// keeping the aspect ratio. Never upscales; each side stays at least 1.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width <= max_side && height <= max_side {
        return (width, height);
    }
    let (w, h, m) = (width as u64, height as u64, max_side as u64);
    if w >= h {
        let scaled_h = ((h * m + w / 2) / w).max(1);
        (max_side, scaled_h as u32)
    } else {
        let scaled_w = ((w * m + h / 2) / h).max(1);
        (scaled_w as u32, max_side)
    }
}

/// Shrinks `image` so neither side exceeds `max_side`. Images already within
/// bounds are returned untouched.
pub fn downsample(image: RgbImage, max_side: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = fit_within(width, height, max_side);
    if (target_w, target_h) == (width, height) {
        return image;
    }
    imageops::resize(&image, target_w, target_h, FilterType::Triangle)
}

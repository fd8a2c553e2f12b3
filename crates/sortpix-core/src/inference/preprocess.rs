//! Image preprocessing for the detector and the classifier.
//!
//! Both models take an RGB NCHW tensor `[1, 3, size, size]`:
//! - Detector: pixels scaled to [0, 1], no mean/std shift
//! - Classifier: pixels scaled to [0, 1] then normalized with ImageNet mean/std

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// ImageNet per-channel mean.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel std.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocess an image for the detector: resize, scale to [0, 1].
pub fn detector_input(image: &DynamicImage, size: u32) -> Array4<f32> {
    to_nchw(image, size, [0.0; 3], [1.0; 3])
}

/// Preprocess an image for the classifier: resize, ImageNet normalization.
pub fn classifier_input(image: &DynamicImage, size: u32) -> Array4<f32> {
    to_nchw(image, size, IMAGENET_MEAN, IMAGENET_STD)
}

fn to_nchw(image: &DynamicImage, image_size: u32, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let resized = image.resize_exact(
        image_size,
        image_size,
        image::imageops::FilterType::Triangle,
    );
    let rgb = resized.to_rgb8();

    let size = image_size as usize;
    let plane = size * size;
    let mut data = vec![0.0f32; CHANNELS * plane];

    // Write straight into the flat NCHW buffer instead of 4D indexing.
    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        for (c, &val) in pixel.iter().enumerate() {
            data[c * plane + i] = (val as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    Array4::from_shape_vec((1, CHANNELS, size, size), data)
        .unwrap_or_else(|_| Array4::zeros((1, CHANNELS, size, size)))
}

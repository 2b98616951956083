//! Photo fixtures shared by the unit tests.

use crate::models::Photo;
use image::{DynamicImage, Rgb, RgbImage};

/// Deterministic pseudo-random noise, which JPEG compresses poorly.
pub fn noisy(width: u32, height: u32) -> DynamicImage {
    let mut seed: u32 = 0x9E37_79B9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    }))
}

pub fn flat(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 120, 200])))
}

pub fn png(image: &DynamicImage) -> Photo {
    Photo::encode_png(image).unwrap()
}

/// JPEG carrying an APP1 EXIF block with a single orientation tag.
pub fn jpeg_with_orientation(image: &DynamicImage, orientation: u16) -> Vec<u8> {
    let jpeg = Photo::encode_jpeg(image, 90).unwrap();
    let bytes = jpeg.bytes();

    let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
    tiff.extend_from_slice(&1u16.to_le_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes()); // count
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(bytes.len() + payload.len() + 4);
    out.extend_from_slice(&bytes[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&bytes[2..]);
    out
}

/// PNG whose header is intact but whose pixel data is cut off.
pub fn truncated_png(width: u32, height: u32) -> Photo {
    let full = png(&noisy(width, height));
    let cut = full.bytes()[..full.encoded_len() / 3].to_vec();
    Photo::from_bytes(cut).unwrap()
}

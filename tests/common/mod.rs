//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use photoclean::Photo;

/// Gradient with per-pixel jitter so JPEG has something to chew on.
pub fn textured(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let jitter = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 97;
        Rgb([
            ((x * 255 / width.max(1)) as u8).wrapping_add(jitter as u8),
            ((y * 255 / height.max(1)) as u8).wrapping_sub(jitter as u8),
            (jitter * 2) as u8,
        ])
    }))
}

pub fn png_photo(width: u32, height: u32) -> Photo {
    Photo::encode_png(&textured(width, height)).unwrap()
}

/// PNG bytes cut short: the header probes fine, decoding fails.
pub fn corrupt_photo() -> Photo {
    let full = png_photo(48, 48);
    let len = full.encoded_len();
    Photo::from_bytes(full.bytes()[..len / 2].to_vec()).unwrap()
}

/// JPEG with a big-endian EXIF block holding only a Make tag.
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let jpeg = Photo::encode_jpeg(&textured(width, height), 85).unwrap();
    let body = jpeg.bytes();

    let make = b"Test\0";
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x010Fu16.to_be_bytes()); // Make
    tiff.extend_from_slice(&2u16.to_be_bytes()); // ASCII
    tiff.extend_from_slice(&(make.len() as u32).to_be_bytes());
    tiff.extend_from_slice(&26u32.to_be_bytes()); // value offset
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(make);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);

    [&body[..2], &segment[..], &body[2..]].concat()
}

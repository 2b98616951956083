//! The three image transform steps of the cleaning pipeline.
//!
//! Each step takes a [`Photo`] and produces a new one. Strip and noise
//! reduction never fail: on any internal error they hand back the input so
//! the pipeline keeps going. Compression is the only step that can fail, and
//! only when the photo cannot be decoded or encoded at all.

use crate::models::{CompressionSettings, NoiseSettings, Photo};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Gaussian sigma per unit of `noise_level` (0.02 → sigma 1.0).
const NOISE_SIGMA_SCALE: f32 = 50.0;

/// Unsharp-mask sigma per unit of `sharpness` (0.4 → sigma 1.0).
const SHARPEN_SIGMA_SCALE: f32 = 2.5;

/// Differences below this are not sharpened, so smoothed noise stays smooth.
const SHARPEN_THRESHOLD: i32 = 2;

/// Error raised by a transform step that could not produce output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{step} failed: {reason}")]
    TransformFailed { step: &'static str, reason: String },
}

impl TransformError {
    fn failed(step: &'static str, reason: impl ToString) -> Self {
        Self::TransformFailed {
            step,
            reason: reason.to_string(),
        }
    }
}

/// Outcome of [`compress_to_target`].
#[derive(Debug, Clone)]
pub struct Compression {
    pub photo: Photo,
    /// Quality of the returned encoding, 0..1
    pub quality: f32,
    /// Number of encodes performed
    pub attempts: usize,
}

impl Compression {
    pub fn within_target(&self, target_bytes: usize) -> bool {
        self.photo.encoded_len() <= target_bytes
    }
}

/// Re-encode `photo` without any EXIF, location or orientation tags.
///
/// The EXIF orientation is applied to the pixels first so the photo still
/// displays upright once the tag is gone. Falls back to the input if the
/// photo cannot be decoded or re-encoded.
pub fn strip_metadata(photo: &Photo) -> Photo {
    let orientation = photo.orientation();

    let decoded = match photo.decode() {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("Metadata strip skipped, photo could not be decoded: {}", e);
            return photo.clone();
        }
    };

    let upright = apply_orientation(decoded, orientation);

    match Photo::encode_png(&upright) {
        Ok(stripped) => {
            tracing::debug!(
                "Stripped metadata: {} -> {} bytes (orientation {})",
                photo.encoded_len(),
                stripped.encoded_len(),
                orientation
            );
            stripped
        }
        Err(e) => {
            tracing::warn!("Metadata strip skipped, re-encode failed: {}", e);
            photo.clone()
        }
    }
}

/// Smooth out sensor noise, then restore edges with a light unsharp mask.
///
/// Falls back to the input on any failure.
pub fn reduce_noise(photo: &Photo, settings: &NoiseSettings) -> Photo {
    let decoded = match photo.decode() {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("Noise reduction skipped, photo could not be decoded: {}", e);
            return photo.clone();
        }
    };

    let filtered = denoise(&decoded, settings);

    match Photo::encode_png(&filtered) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Noise reduction skipped, re-encode failed: {}", e);
            photo.clone()
        }
    }
}

/// Encode as JPEG, lowering quality step by step until the result fits
/// `target_bytes` or the quality floor is reached.
///
/// Returns the last encoding even when it is still above target.
pub fn compress_to_target(
    photo: &Photo,
    settings: &CompressionSettings,
) -> Result<Compression, TransformError> {
    compress_within(photo, settings, settings.target_bytes)
}

/// Same as [`compress_to_target`] with an explicit size bound in place of
/// `target_bytes`.
pub fn compress_within(
    photo: &Photo,
    settings: &CompressionSettings,
    limit_bytes: usize,
) -> Result<Compression, TransformError> {
    let decoded = photo
        .decode()
        .map_err(|e| TransformError::failed("compression", e))?;

    let mut best: Option<Compression> = None;

    for (index, quality) in quality_schedule(settings).into_iter().enumerate() {
        let encoded = Photo::encode_jpeg(&decoded, quality)
            .map_err(|e| TransformError::failed("compression", e))?;

        let size = encoded.encoded_len();
        tracing::debug!("Encoded at quality {}: {} bytes", quality, size);

        best = Some(Compression {
            photo: encoded,
            quality: f32::from(quality) / 100.0,
            attempts: index + 1,
        });

        if size <= limit_bytes {
            break;
        }
    }

    best.ok_or_else(|| TransformError::failed("compression", "empty quality schedule"))
}

/// JPEG qualities (percent) tried by [`compress_to_target`], highest first.
///
/// Computed in whole percent. The schedule has at most
/// `ceil((start - min) / step) + 1` entries and none below `min_quality`.
/// A non-positive step yields the start quality only.
pub fn quality_schedule(settings: &CompressionSettings) -> Vec<u8> {
    let start = to_percent(settings.start_quality);
    let floor = to_percent(settings.min_quality).min(start);
    let step = to_percent(settings.quality_step);

    if step == 0 {
        return vec![start];
    }

    let mut schedule = Vec::new();
    let mut quality = start;
    loop {
        schedule.push(quality);
        match quality.checked_sub(step) {
            Some(next) if next >= floor => quality = next,
            _ => break,
        }
    }
    schedule
}

/// Drop the APP1..APP15 and comment segments of an upright JPEG without
/// touching the compressed image data.
///
/// Returns `None` for other formats, for photos whose orientation tag would
/// be lost, and for streams that do not parse.
pub fn strip_jpeg_segments(photo: &Photo) -> Option<Photo> {
    if photo.format() != ImageFormat::Jpeg || photo.orientation() != 1 {
        return None;
    }

    let bytes = photo.bytes();
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..2]);
    let mut pos = 2;

    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        // Fill bytes may pad any marker
        while *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = bytes[pos + 1];

        // Start of scan: the rest is entropy-coded data
        if marker == 0xDA {
            out.extend_from_slice(&bytes[pos..]);
            break;
        }

        let length = bytes.get(pos + 2..pos + 4)?;
        let end = pos + 2 + usize::from(u16::from_be_bytes([length[0], length[1]]));
        let segment = bytes.get(pos..end)?;

        if !matches!(marker, 0xE1..=0xEF | 0xFE) {
            out.extend_from_slice(segment);
        }
        pos = end;
    }

    tracing::debug!("Stripped JPEG segments: {} -> {} bytes", bytes.len(), out.len());
    Photo::from_bytes(out).ok()
}

fn to_percent(fraction: f32) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn denoise(image: &DynamicImage, settings: &NoiseSettings) -> DynamicImage {
    let blur_sigma = settings.noise_level * NOISE_SIGMA_SCALE;
    let smoothed = if blur_sigma > 0.0 {
        image.blur(blur_sigma)
    } else {
        image.clone()
    };

    let sharpen_sigma = settings.sharpness * SHARPEN_SIGMA_SCALE;
    if sharpen_sigma > 0.0 {
        smoothed.unsharpen(sharpen_sigma, SHARPEN_THRESHOLD)
    } else {
        smoothed
    }
}

/// Rotate/flip pixels according to an EXIF orientation value.
///
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// Number of bytes in one megabyte as reported to users.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// The photo header could not be read, so nothing can be done with it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Image could not be decoded: {reason}")]
pub struct InvalidImage {
    pub reason: String,
}

/// An encoded photo.
///
/// This is the handle every cleaning step consumes and produces. It holds the
/// encoded container bytes (shared, so clones are cheap) together with the
/// format and dimensions probed from the header. A `Photo` is never mutated;
/// transforms always build a new one.
#[derive(Clone, Debug)]
pub struct Photo {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl Photo {
    /// Wrap encoded bytes after probing the header for format and dimensions.
    ///
    /// Only the header is read here. A photo whose pixel data is damaged is
    /// accepted and fails later, when a step actually decodes it.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, InvalidImage> {
        let bytes: Vec<u8> = bytes.into();

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| InvalidImage {
                reason: e.to_string(),
            })?;

        let format = reader.format().ok_or_else(|| InvalidImage {
            reason: "unrecognized image format".to_string(),
        })?;

        let (width, height) = reader.into_dimensions().map_err(|e| InvalidImage {
            reason: e.to_string(),
        })?;

        Ok(Self {
            bytes: bytes.into(),
            format,
            width,
            height,
        })
    }

    /// Encode pixels as lossless PNG. The PNG encoder writes no EXIF data.
    pub fn encode_png(image: &DynamicImage) -> ImageResult<Self> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;

        Ok(Self {
            bytes: buffer.into_inner().into(),
            format: ImageFormat::Png,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Encode pixels as baseline JPEG at `quality` percent (1..=100).
    ///
    /// JPEG has no alpha channel, so the pixels are flattened to RGB first.
    pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Self> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)?;

        Ok(Self {
            bytes: buffer.into_inner().into(),
            format: ImageFormat::Jpeg,
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Decode the full pixel data.
    pub fn decode(&self) -> ImageResult<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format)
    }

    /// Read the EXIF block embedded in the container, if any.
    pub fn exif(&self) -> Option<exif::Exif> {
        let mut cursor = Cursor::new(&self.bytes[..]);
        exif::Reader::new().read_from_container(&mut cursor).ok()
    }

    /// True when the container carries a non-empty EXIF block.
    pub fn has_metadata(&self) -> bool {
        self.exif()
            .map(|data| data.fields().next().is_some())
            .unwrap_or(false)
    }

    /// EXIF orientation (tag 0x0112). 1 when absent.
    pub fn orientation(&self) -> u32 {
        self.exif()
            .and_then(|data| {
                data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .unwrap_or(1)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the encoded representation in bytes.
    pub fn encoded_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / BYTES_PER_MB
    }
}

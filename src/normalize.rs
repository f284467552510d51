use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageError, ImageResult};
use std::io::Cursor;

/// Color model of a page as it will be embedded in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageColor {
    Gray,
    Rgb,
}

impl PageColor {
    pub fn pdf_color_space(&self) -> &'static str {
        match self {
            PageColor::Gray => "DeviceGray",
            PageColor::Rgb => "DeviceRGB",
        }
    }
}

/// A decoded page with no alpha channel, 8 bits per component.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    image: DynamicImage,
    color: PageColor,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color(&self) -> PageColor {
        self.color
    }

    /// Encode as baseline JPEG at `quality` (1-100).
    pub fn to_jpeg(&self, quality: u8) -> ImageResult<Vec<u8>> {
        let color_type = match self.color {
            PageColor::Gray => ColorType::L8,
            PageColor::Rgb => ColorType::Rgb8,
        };

        let mut buf = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder.encode(
            self.image.as_bytes(),
            self.image.width(),
            self.image.height(),
            color_type,
        )?;

        Ok(buf.into_inner())
    }
}

/// Decode raw bytes, sniffing the format from its magic number.
pub fn decode(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory(bytes)
}

/// 8-bit gray and 8-bit RGB pass through untouched; everything else (alpha,
/// 16-bit, float) is flattened to 8-bit RGB. Palette images arrive here already
/// expanded by the decoder.
pub fn normalize(image: DynamicImage) -> NormalizedImage {
    match image {
        DynamicImage::ImageLuma8(_) => NormalizedImage {
            image,
            color: PageColor::Gray,
        },
        DynamicImage::ImageRgb8(_) => NormalizedImage {
            image,
            color: PageColor::Rgb,
        },
        other => NormalizedImage {
            image: DynamicImage::ImageRgb8(other.to_rgb8()),
            color: PageColor::Rgb,
        },
    }
}

/// A page ready for staging.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color: PageColor,
}

#[derive(Debug)]
pub enum PrepareError {
    /// The bytes are not an image; the page can be skipped.
    Decode(ImageError),
    /// A decoded image could not be written back out.
    Encode(ImageError),
}

/// Decode, normalize and re-encode one fetched image. CPU bound, so callers on
/// an async runtime run it through `spawn_blocking`.
pub fn prepare(bytes: &[u8], quality: u8) -> Result<EncodedPage, PrepareError> {
    let page = normalize(decode(bytes).map_err(PrepareError::Decode)?);
    let jpeg = page.to_jpeg(quality).map_err(PrepareError::Encode)?;

    Ok(EncodedPage {
        jpeg,
        width: page.width(),
        height: page.height(),
        color: page.color(),
    })
}

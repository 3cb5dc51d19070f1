//! Scales uploaded images down to thumbnails that fit inside a bounding box.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{PipelineError, Result};
use crate::key::{ImageFormat, ImageKey};
use crate::store::ObjectStore;
use crate::trigger::ObjectRef;

const JPEG_QUALITY: u8 = 75;

// products this close to a whole number are treated as that number before ceil
const CEIL_TOLERANCE: f64 = 1e-9;

/// Maximum thumbnail width and height, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    max_width: f64,
    max_height: f64,
}

impl Bounds {
    pub fn new(max_width: f64, max_height: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(max_width) || !valid(max_height) {
            return Err(PipelineError::validation(format!(
                "thumbnail bounds must be positive, got {max_width}x{max_height}"
            )));
        }
        Ok(Self {
            max_width,
            max_height,
        })
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            max_width: 80.0,
            max_height: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scales `src` by `min(maxW/srcW, maxH/srcH)`, rounding each side up.
///
/// Each side stays within `[1, ceil(max)]`.
pub fn fit_dimensions(src: Dimensions, bounds: Bounds) -> Dimensions {
    let ratio = f64::min(
        bounds.max_width / f64::from(src.width),
        bounds.max_height / f64::from(src.height),
    );
    let scale = |side: u32, max: f64| {
        let scaled = (f64::from(side) * ratio - CEIL_TOLERANCE).ceil();
        scaled.clamp(1.0, max.ceil()) as u32
    };
    Dimensions::new(
        scale(src.width, bounds.max_width),
        scale(src.height, bounds.max_height),
    )
}

/// An encoded thumbnail ready to be written to the store.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Decodes `source`, scales it to fit `bounds` and re-encodes it as `format`.
pub fn render(source: &[u8], format: ImageFormat, bounds: Bounds) -> Result<Thumbnail> {
    let img = image::load_from_memory(source)?;
    let original = Dimensions::new(img.width(), img.height());
    if original.width == 0 || original.height == 0 {
        return Err(PipelineError::validation("source image has no pixels"));
    }

    let dimensions = fit_dimensions(original, bounds);
    tracing::info!(
        original_width = original.width,
        original_height = original.height,
        thumbnail_width = dimensions.width,
        thumbnail_height = dimensions.height,
        "scaling image"
    );

    let resized = img.resize_exact(dimensions.width, dimensions.height, FilterType::Lanczos3);
    let bytes = encode(&resized, format)?;
    Ok(Thumbnail { bytes, dimensions })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpg => {
            // jpeg has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
        }
        ImageFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buf))?,
    }
    Ok(buf)
}

/// Renders `source` and writes the thumbnail next to the other thumbnails.
#[tracing::instrument(skip(store, key, source), fields(key = %key))]
pub async fn publish(
    store: &ObjectStore,
    bucket: &str,
    key: &ImageKey,
    source: &[u8],
    bounds: Bounds,
) -> Result<ObjectRef> {
    let thumbnail = render(source, key.format(), bounds)?;
    let thumbnail_key = key.thumbnail_key();
    store.put(bucket, &thumbnail_key, thumbnail.bytes).await?;
    Ok(ObjectRef::new(bucket, thumbnail_key))
}

/// Reads `object` from the store and publishes its thumbnail.
///
/// The key must name a `jpg` or `png` file; anything else is rejected before the read.
/// Keys already under `thumbs/` are skipped and yield `None`, so a bucket-wide
/// notification cannot feed thumbnails back into itself.
pub async fn create_thumbnail(
    store: &ObjectStore,
    object: &ObjectRef,
    bounds: Bounds,
) -> Result<Option<ObjectRef>> {
    let key = ImageKey::parse(&object.key)?;
    if key.is_thumbnail() {
        tracing::warn!(key = %object.key, "skipping object that is already a thumbnail");
        return Ok(None);
    }
    let source = store.get(&object.bucket, &object.key).await?;
    publish(store, &object.bucket, &key, &source, bounds)
        .await
        .map(Some)
}

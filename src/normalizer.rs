use crate::{
    catalog::ProviderCatalog,
    error::{BedrockError, Result},
    geometry::{GeometryResolver, ResolvedGeometry},
    models::{NormalizedImage, ProviderFamily, ReferenceImage, TaskType},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::sync::Arc;

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

const TEXT_IMAGE_CEILING: u32 = 1024;
const TEXT_IMAGE_EXTENDED_CEILING: u32 = 1408;
const IMAGE_VARIATION_CEILING: u32 = 4096;
const EDIT_CEILING: u32 = 1024;

/// Resamples reference images to a size the target provider accepts and
/// encodes them as base64 JPEG.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    catalog: Arc<ProviderCatalog>,
    resolver: GeometryResolver,
    jpeg_quality: u8,
}

impl ImageNormalizer {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self {
            resolver: GeometryResolver::new(catalog.clone()),
            catalog,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Longest side allowed for a task, `None` when unbounded.
    pub fn size_ceiling(&self, task_type: TaskType, model_id: &str) -> Option<u32> {
        match task_type {
            TaskType::TextImage if self.catalog.has_extended_ceiling(model_id) => {
                Some(TEXT_IMAGE_EXTENDED_CEILING)
            }
            TaskType::TextImage => Some(TEXT_IMAGE_CEILING),
            TaskType::ImageVariation => Some(IMAGE_VARIATION_CEILING),
            TaskType::Inpainting
            | TaskType::Outpainting
            | TaskType::ColorGuidedGeneration
            | TaskType::BackgroundRemoval => Some(EDIT_CEILING),
            TaskType::None => None,
        }
    }

    pub fn target_geometry(
        &self,
        width: u32,
        height: u32,
        task_type: TaskType,
        family: ProviderFamily,
        model_id: &str,
    ) -> Result<ResolvedGeometry> {
        let (width, height) = match self.size_ceiling(task_type, model_id) {
            Some(ceiling) => cap_dimensions(width, height, ceiling),
            None => (width, height),
        };
        self.resolver.resolve(width, height, family)
    }

    pub fn normalize(
        &self,
        image: &ReferenceImage,
        task_type: TaskType,
        family: ProviderFamily,
        model_id: &str,
    ) -> Result<NormalizedImage> {
        log::debug!(
            "Original image size WxH: {} x {} ({})",
            image.width(),
            image.height(),
            image.media_type()
        );

        let target =
            self.target_geometry(image.width(), image.height(), task_type, family, model_id)?;

        let source = image::load_from_memory(image.bytes())
            .map_err(|e| BedrockError::ImageDecode(e.to_string()))?
            .to_rgb8();
        let resampled = resample_nearest(&source, target.width, target.height)?;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode_image(&resampled)
            .map_err(|e| BedrockError::ImageEncode(e.to_string()))?;

        log::info!("New image size WxH: {} x {}", target.width, target.height);

        Ok(NormalizedImage {
            data: STANDARD.encode(&jpeg),
            width: target.width,
            height: target.height,
            media_type: "image/jpeg".to_string(),
        })
    }
}

/// Shrinks both sides proportionally so the longer one fits `ceiling`.
/// Never enlarges.
pub fn cap_dimensions(width: u32, height: u32, ceiling: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= ceiling || longer == 0 {
        return (width, height);
    }
    let scale = ceiling as f64 / longer as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Point sampling: destination `(x, y)` reads source
/// `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`.
fn resample_nearest(source: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_w, src_h) = source.dimensions();
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return Err(BedrockError::InvalidGeometry(format!(
            "cannot resample {}x{} to {}x{}",
            src_w, src_h, width, height
        )));
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let sx = (x as u64 * src_w as u64 / width as u64) as u32;
        let sy = (y as u64 * src_h as u64 / height as u64) as u32;
        *source.get_pixel(sx, sy)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(Arc::new(ProviderCatalog::builtin().unwrap()))
    }

    fn png_image(width: u32, height: u32) -> ReferenceImage {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ReferenceImage::from_bytes(bytes, "image/png").unwrap()
    }

    #[test]
    fn test_size_ceilings() {
        let n = normalizer();
        assert_eq!(n.size_ceiling(TaskType::TextImage, "amazon.titan-image-generator-v1"), Some(1408));
        assert_eq!(n.size_ceiling(TaskType::TextImage, "stability.sd3-large-v1:0"), Some(1024));
        assert_eq!(n.size_ceiling(TaskType::ImageVariation, "stability.sd3-large-v1:0"), Some(4096));
        assert_eq!(n.size_ceiling(TaskType::Inpainting, "amazon.titan-image-generator-v1"), Some(1024));
        assert_eq!(n.size_ceiling(TaskType::BackgroundRemoval, "amazon.titan-image-generator-v1"), Some(1024));
        assert_eq!(n.size_ceiling(TaskType::None, "anthropic.claude-3-sonnet"), None);
    }

    #[test]
    fn test_cap_dimensions_only_shrinks() {
        assert_eq!(cap_dimensions(2048, 1024, 1024), (1024, 512));
        assert_eq!(cap_dimensions(1000, 3000, 1500), (500, 1500));
        assert_eq!(cap_dimensions(800, 600, 1024), (800, 600));
        assert_eq!(cap_dimensions(5000, 1, 1000), (1000, 1));
    }

    #[test]
    fn test_ceiling_feeds_resolver() {
        let n = normalizer();
        let model = "amazon.titan-image-generator-v1";
        let capped = n
            .target_geometry(2048, 1024, TaskType::Inpainting, ProviderFamily::TitanImage, model)
            .unwrap();
        assert_eq!((capped.width, capped.height), (1152, 640));

        let uncapped = n
            .target_geometry(2048, 1024, TaskType::ImageVariation, ProviderFamily::TitanImage, model)
            .unwrap();
        assert_eq!((uncapped.width, uncapped.height), (1408, 768));
    }

    #[test]
    fn test_resample_nearest_point_sampling() {
        let mut source = RgbImage::new(2, 2);
        source.put_pixel(0, 0, Rgb([1, 1, 1]));
        source.put_pixel(1, 0, Rgb([2, 2, 2]));
        source.put_pixel(0, 1, Rgb([3, 3, 3]));
        source.put_pixel(1, 1, Rgb([4, 4, 4]));

        let up = resample_nearest(&source, 4, 4).unwrap();
        assert_eq!(up.get_pixel(1, 1), &Rgb([1, 1, 1]));
        assert_eq!(up.get_pixel(2, 0), &Rgb([2, 2, 2]));
        assert_eq!(up.get_pixel(0, 3), &Rgb([3, 3, 3]));
        assert_eq!(up.get_pixel(3, 3), &Rgb([4, 4, 4]));

        let down = resample_nearest(&source, 1, 1).unwrap();
        assert_eq!(down.get_pixel(0, 0), &Rgb([1, 1, 1]));

        assert!(matches!(
            resample_nearest(&source, 0, 4),
            Err(BedrockError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_normalize_outputs_rgb_jpeg_at_resolved_size() {
        let n = normalizer();
        let normalized = n
            .normalize(&png_image(40, 30), TaskType::None, ProviderFamily::TextChat, "anthropic.claude-3-sonnet")
            .unwrap();
        assert_eq!((normalized.width, normalized.height), (512, 512));
        assert_eq!(normalized.media_type, "image/jpeg");

        let bytes = STANDARD.decode(&normalized.data).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 512));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_normalize_is_idempotent_on_supported_sizes() {
        let n = normalizer();
        let model = "stability.sd3-large-v1:0";
        let first = n
            .normalize(&png_image(512, 512), TaskType::ImageVariation, ProviderFamily::Sd3, model)
            .unwrap();
        assert_eq!((first.width, first.height), (512, 512));

        let again = ReferenceImage::from_bytes(STANDARD.decode(&first.data).unwrap(), "image/jpeg").unwrap();
        let second = n
            .normalize(&again, TaskType::ImageVariation, ProviderFamily::Sd3, model)
            .unwrap();
        assert_eq!((second.width, second.height), (first.width, first.height));
    }

    #[test]
    fn test_corrupt_image_fails_decode() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(16, 16))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        // Keep the headers so dimensions may still read, cut into the pixel data.
        bytes.truncate(bytes.len() - 20);

        let err = match ReferenceImage::from_bytes(bytes, "image/png") {
            Ok(image) => normalizer()
                .normalize(&image, TaskType::None, ProviderFamily::TextChat, "anthropic.claude-3-sonnet")
                .unwrap_err(),
            Err(err) => err,
        };
        assert!(matches!(err, BedrockError::ImageDecode(_)));
    }
}

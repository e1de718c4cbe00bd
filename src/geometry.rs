use crate::{
    catalog::{ImageSize, ProviderCatalog},
    error::{BedrockError, Result},
    models::ProviderFamily,
};
use std::sync::Arc;

/// A size guaranteed to be listed in the provider's size table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGeometry {
    pub width: u32,
    pub height: u32,
}

impl From<ImageSize> for ResolvedGeometry {
    fn from(size: ImageSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// Nearest-size lookup against a provider size table.
///
/// The search runs in three independent passes over the table: closest
/// aspect ratio, closest width, then the size minimizing
/// `|w - closest.w| + |h - closest.w / ratio|`. Ties go to the earlier entry.
/// Existing callers depend on these exact picks, so the passes must not be
/// merged into a single distance.
#[derive(Debug, Clone)]
pub struct GeometryResolver {
    catalog: Arc<ProviderCatalog>,
}

impl GeometryResolver {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self { catalog }
    }

    pub fn resolve(
        &self,
        input_width: u32,
        input_height: u32,
        family: ProviderFamily,
    ) -> Result<ResolvedGeometry> {
        if input_width == 0 || input_height == 0 {
            return Err(BedrockError::InvalidGeometry(format!(
                "cannot resolve a {}x{} image",
                input_width, input_height
            )));
        }

        let table = self.catalog.sizes_for(family)?;
        let aspect_ratio = input_width as f64 / input_height as f64;

        let closest_aspect_ratio = first_min_by(&table.aspect_ratios, |r| (r - aspect_ratio).abs())
            .copied()
            .ok_or_else(|| empty_table(&table.name))?;
        let closest_width = first_min_by(&table.sizes, |s| {
            (s.width as f64 - input_width as f64).abs()
        })
        .copied()
        .ok_or_else(|| empty_table(&table.name))?;
        let candidate_height = closest_width.width as f64 / closest_aspect_ratio;

        let closest_match = first_min_by(&table.sizes, |s| {
            (s.width as f64 - closest_width.width as f64).abs()
                + (s.height as f64 - candidate_height).abs()
        })
        .copied()
        .ok_or_else(|| empty_table(&table.name))?;

        log::debug!(
            "Closest aspect ratio: {}, closest width: {}x{}, supported size: {}x{}",
            closest_aspect_ratio,
            closest_width.width,
            closest_width.height,
            closest_match.width,
            closest_match.height
        );

        Ok(closest_match.into())
    }
}

/// `min_by` keeps the first of equal elements, matching table-order tie breaking.
fn first_min_by<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    items.iter().min_by(|a, b| key(*a).total_cmp(&key(*b)))
}

fn empty_table(name: &str) -> BedrockError {
    BedrockError::ConfigError(format!("size table '{}' is empty", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> GeometryResolver {
        GeometryResolver::new(Arc::new(ProviderCatalog::builtin().unwrap()))
    }

    fn resolve(width: u32, height: u32, family: ProviderFamily) -> (u32, u32) {
        let g = resolver().resolve(width, height, family).unwrap();
        (g.width, g.height)
    }

    #[test]
    fn test_stability_landscape_ties_keep_first_entry() {
        // ratio 1.28 and width 1024 give candidate height 800; 1024x1024,
        // 1152x896 and 1216x832 all sit at distance 224.
        assert_eq!(resolve(800, 600, ProviderFamily::Sd3), (1024, 1024));
    }

    #[test]
    fn test_stability_resolutions() {
        assert_eq!(resolve(1920, 1080, ProviderFamily::Sd3), (1536, 640));
        assert_eq!(resolve(1408, 768, ProviderFamily::StableDiffusion), (1344, 768));
        assert_eq!(resolve(512, 512, ProviderFamily::Sd3), (512, 512));
        assert_eq!(resolve(600, 800, ProviderFamily::TextChat), (512, 512));
    }

    #[test]
    fn test_titan_resolutions() {
        assert_eq!(resolve(800, 600, ProviderFamily::TitanImage), (768, 768));
        assert_eq!(resolve(1920, 1080, ProviderFamily::TitanImage), (1408, 768));
        assert_eq!(resolve(1080, 1920, ProviderFamily::TitanImage), (768, 1408));
        assert_eq!(resolve(3000, 1000, ProviderFamily::TitanImage), (1408, 640));
        assert_eq!(resolve(1, 1, ProviderFamily::TitanImage), (384, 576));
    }

    #[test]
    fn test_resolved_size_is_always_supported() {
        let resolver = resolver();
        let catalog = ProviderCatalog::builtin().unwrap();
        let families = [
            ProviderFamily::TextChat,
            ProviderFamily::Sd3,
            ProviderFamily::StableDiffusion,
            ProviderFamily::TitanImage,
        ];
        let dims = [1u32, 7, 64, 333, 512, 640, 799, 1024, 1173, 1500, 2048, 4096, 9000];

        for family in families {
            let table = catalog.sizes_for(family).unwrap();
            for &w in &dims {
                for &h in &dims {
                    let g = resolver.resolve(w, h, family).unwrap();
                    assert!(g.width > 0 && g.height > 0);
                    assert!(table.contains(g.width, g.height), "{}x{} -> {:?}", w, h, g);
                }
            }
        }
    }

    #[test]
    fn test_supported_sizes_are_fixed_points() {
        let resolver = resolver();
        let catalog = ProviderCatalog::builtin().unwrap();
        for family in [ProviderFamily::Sd3, ProviderFamily::TitanImage] {
            for size in &catalog.sizes_for(family).unwrap().sizes {
                let g = resolver.resolve(size.width, size.height, family).unwrap();
                assert_eq!((g.width, g.height), (size.width, size.height));
            }
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = resolver().resolve(800, 0, ProviderFamily::Sd3).unwrap_err();
        assert!(matches!(err, BedrockError::InvalidGeometry(_)));
        assert!(resolver().resolve(0, 600, ProviderFamily::TitanImage).is_err());
    }

    #[test]
    fn test_unregistered_family() {
        let catalog = ProviderCatalog::from_json(
            r#"{"tables": [{"name": "titan", "families": ["titan-image"], "aspect_ratios": [1.0], "sizes": [[512, 512]]}]}"#,
        )
        .unwrap();
        let err = GeometryResolver::new(Arc::new(catalog))
            .resolve(100, 100, ProviderFamily::TextChat)
            .unwrap_err();
        assert!(matches!(err, BedrockError::UnknownProvider(_)));
    }
}

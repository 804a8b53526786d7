pub mod bundled;
pub mod cache;
pub mod image;
pub mod source;

use std::path::Path;

pub use bundled::{Icon, BUNDLED_PREFIX};
pub use cache::{AssetBytes, AssetCache, ResolvedAssets};
pub use self::image::{decode_image, DecodedImage, ImageFilter, ImageSet};
pub use source::AssetLoader;

/// Logo formats tried in order when a record has no explicit logo
pub const LOGO_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "svg"];

/// Candidate logo keys for `slug` under `logo_base`, in lookup order.
///
/// `logo_base` is either an HTTP(S) base URL or a directory.
pub fn logo_candidates(logo_base: &str, slug: &str) -> Vec<String> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Vec::new();
    }

    if logo_base.starts_with("http://") || logo_base.starts_with("https://") {
        let base = if logo_base.ends_with('/') {
            logo_base.to_string()
        } else {
            format!("{}/", logo_base)
        };
        let Ok(base) = url::Url::parse(&base) else {
            return Vec::new();
        };
        let encoded = urlencoding::encode(slug);
        return LOGO_EXTENSIONS
            .iter()
            .filter_map(|ext| base.join(&format!("{}.{}", encoded, ext)).ok())
            .map(String::from)
            .collect();
    }

    LOGO_EXTENSIONS
        .iter()
        .map(|ext| {
            Path::new(logo_base)
                .join(format!("{}.{}", slug, ext))
                .display()
                .to_string()
        })
        .collect()
}

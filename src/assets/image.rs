use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use tracing::warn;

use crate::types::AssetError;

use super::cache::ResolvedAssets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG bytes passed through unchanged
    Dct,
    Flate,
}

/// Raster image ready to be embedded as a PDF image XObject
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit soft mask, present only when some pixel is
    /// not fully opaque
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Height for a given drawn width, preserving aspect ratio
    pub fn height_for_width(&self, width: f32) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        width * self.height as f32 / self.width as f32
    }

    /// Largest size fitting inside `max_width` × `max_height`
    pub fn fit(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        if self.width == 0 || self.height == 0 {
            return (0.0, 0.0);
        }
        let scale = (max_width / self.width as f32).min(max_height / self.height as f32);
        (self.width as f32 * scale, self.height as f32 * scale)
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]).to_ascii_lowercase();
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Decode PNG/JPEG/WebP bytes. SVG sources are not rasterized and come
/// back as a decode error.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, AssetError> {
    if looks_like_svg(bytes) {
        return Err(AssetError::Decode("SVG images are not rasterized".to_string()));
    }

    let format = image::guess_format(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
    let decoded = image::load_from_memory(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    // Gray and YCbCr JPEGs pass through; CMYK and anything unrecognised is
    // re-encoded below, since the decoder hands back converted RGB
    if format == image::ImageFormat::Jpeg {
        let color_space = match jpeg_components(bytes) {
            Some(1) => Some("DeviceGray"),
            Some(3) => Some("DeviceRGB"),
            _ => None,
        };
        if let Some(color_space) = color_space {
            return Ok(DecodedImage {
                width,
                height,
                color_space,
                filter: ImageFilter::Dct,
                data: bytes.to_vec(),
                alpha: None,
            });
        }
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut translucent = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        translucent |= a != 255;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    Ok(DecodedImage {
        width,
        height,
        color_space: "DeviceRGB",
        filter: ImageFilter::Flate,
        data: flate_compress(&rgb)?,
        alpha: if translucent {
            Some(flate_compress(&alpha)?)
        } else {
            None
        },
    })
}

/// Component count from the first SOF segment of a JPEG stream
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    loop {
        // Markers may be preceded by any number of 0xFF fill bytes
        while *bytes.get(pos)? == 0xFF && *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(pos + 1)?;
        match marker {
            0xD9 | 0xDA => return None,
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }
        let len = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // precision, height, width, then the component count
            return bytes.get(pos + 9).copied();
        }
        if len < 2 {
            return None;
        }
        pos += 2 + len;
    }
}

/// Decoded images for one render, keyed like the asset cache
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: BTreeMap<String, DecodedImage>,
}

impl ImageSet {
    /// Decode every image among `keys` that `assets` resolved. Bytes that do
    /// not decode are dropped and the element they back is omitted.
    pub fn decode<'a>(assets: &ResolvedAssets, keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut images = BTreeMap::new();
        for key in keys {
            if images.contains_key(key) {
                continue;
            }
            let Some(bytes) = assets.get(key) else {
                continue;
            };
            match decode_image(bytes) {
                Ok(image) => {
                    images.insert(key.to_string(), image);
                }
                Err(e) => warn!("Skipping image {}: {}", key, e),
            }
        }
        Self { images }
    }

    pub fn get(&self, key: &str) -> Option<&DecodedImage> {
        self.images.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

//! Background template images for the three fixed pages.
//!
//! Templates are read and decoded once at startup. A missing or broken
//! template aborts startup, so rendering never produces a partial sheet.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::sheet::SheetError;

/// File names expected inside the assets directory, in page order.
pub const TEMPLATE_FILES: [&str; 3] = ["page1.png", "page2.png", "page3.png"];

/// A decoded RGB background, ready to embed as an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB samples, row-major.
    pub rgb: Vec<u8>,
}

impl BackgroundImage {
    /// Decodes PNG or JPEG bytes. `name` is only used in error messages.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self, SheetError> {
        let image = image::load_from_memory(bytes).map_err(|e| SheetError::AssetDecode {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        let rgb = image.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
        })
    }
}

/// The three page backgrounds.
#[derive(Debug, Clone)]
pub struct SheetAssets {
    pages: [BackgroundImage; 3],
}

impl SheetAssets {
    pub fn new(pages: [BackgroundImage; 3]) -> Self {
        Self { pages }
    }

    /// Loads `page1.png`, `page2.png` and `page3.png` from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, SheetError> {
        let mut decoded = Vec::with_capacity(TEMPLATE_FILES.len());
        for file in TEMPLATE_FILES {
            let path: PathBuf = dir.join(file);
            let bytes = std::fs::read(&path).map_err(|e| SheetError::AssetRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let image = BackgroundImage::decode(file, &bytes)?;
            info!(
                template = file,
                width = image.width,
                height = image.height,
                "Loaded sheet background"
            );
            decoded.push(image);
        }

        let pages: [BackgroundImage; 3] = decoded
            .try_into()
            .map_err(|_| SheetError::AssetRead {
                path: dir.display().to_string(),
                message: "expected exactly three templates".to_string(),
            })?;
        Ok(Self { pages })
    }

    /// Background of fixed page `index` (0-2).
    pub fn page(&self, index: usize) -> Option<&BackgroundImage> {
        self.pages.get(index)
    }
}

#[cfg(test)]
pub(crate) fn solid_png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[cfg(test)]
pub(crate) fn test_assets() -> SheetAssets {
    let page = |shade| BackgroundImage::decode("test.png", &solid_png(4, 6, shade)).unwrap();
    SheetAssets::new([page(250), page(240), page(230)])
}

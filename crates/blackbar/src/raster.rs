//! Content-addressed cache of rendered page images.
//!
//! High-DPI renders for leakage analysis are expensive; they are cached
//! under the media directory keyed by
//! `sha256(pdf_path)[:16]_p{page}_r{dpi}.png`. Writes are idempotent:
//! concurrent writers race to produce identical files, so no locking is
//! needed around the filesystem.

use std::path::{Path, PathBuf};

use image::GrayImage;
use sha2::{Digest, Sha256};

use crate::error::{BlackbarError, Result};

/// Cache of rendered pages under a media directory.
#[derive(Debug, Clone)]
pub struct RasterCache {
    cache_dir: PathBuf,
}

impl RasterCache {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: media_dir.into().join("pdf_page_cache"),
        }
    }

    /// Cache key for one page render.
    pub fn cache_path(&self, pdf_path: &Path, page_num: u32, dpi: u32) -> PathBuf {
        let digest = Sha256::digest(pdf_path.to_string_lossy().as_bytes());
        let prefix = hex::encode(&digest[..8]);
        self.cache_dir.join(format!("{prefix}_p{page_num}_r{dpi}.png"))
    }

    /// Fetch the grayscale render of `page_num` (1-indexed) at `dpi`,
    /// rendering with `render` on a cache miss.
    pub fn page_raster<F>(
        &self,
        pdf_path: &Path,
        page_num: u32,
        dpi: u32,
        render: F,
    ) -> Result<GrayImage>
    where
        F: FnOnce() -> Result<GrayImage>,
    {
        let path = self.cache_path(pdf_path, page_num, dpi);
        if path.is_file() {
            match image::open(&path) {
                Ok(img) => return Ok(img.into_luma8()),
                Err(err) => {
                    // A truncated file from a killed run: fall through and
                    // re-render over it.
                    tracing::warn!(path = %path.display(), %err, "discarding unreadable cached render");
                }
            }
        }

        let raster = render()?;
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| BlackbarError::io(&self.cache_dir, e))?;
        raster.save(&path)?;
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn cache_key_is_stable_and_distinct_per_page_and_dpi() {
        let cache = RasterCache::new("/tmp/media");
        let a = cache.cache_path(Path::new("/docs/x.pdf"), 1, 300);
        let b = cache.cache_path(Path::new("/docs/x.pdf"), 1, 300);
        let c = cache.cache_path(Path::new("/docs/x.pdf"), 2, 300);
        let d = cache.cache_path(Path::new("/docs/x.pdf"), 1, 150);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.file_name().unwrap().to_string_lossy().ends_with("_p1_r300.png"));
    }

    #[test]
    fn second_fetch_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RasterCache::new(dir.path());
        let pdf = Path::new("/docs/y.pdf");

        let rendered = cache
            .page_raster(pdf, 1, 150, || {
                Ok(GrayImage::from_pixel(10, 10, Luma([128])))
            })
            .unwrap();
        assert_eq!(rendered.width(), 10);

        // The render closure must not run again.
        let cached = cache
            .page_raster(pdf, 1, 150, || panic!("cache miss on second fetch"))
            .unwrap();
        assert_eq!(cached.get_pixel(5, 5).0[0], 128);
    }
}

//! Pre-cropping images so LaTeX only has to include the zoomed region.

use std::path::{Path, PathBuf};

use image::GenericImageView;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::Trim;
use crate::metrics;

/// Default scratch directory for cropped images.
pub const DEFAULT_CROP_DIR: &str = ".cropped";

/// Pixel rectangle `(x, y, width, height)` with y pointing down.
pub fn pixel_rect(width: u32, height: u32, trim: &Trim) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (width as f64, height as f64);
    // LaTeX trims count from the bottom, image rows from the top.
    let left = (w * trim.left).round();
    let top = (h * trim.top).round();
    let right = (w - w * trim.right).round();
    let bottom = (h - h * trim.bottom).round();

    let left = left.clamp(0.0, w);
    let top = top.clamp(0.0, h);
    let right = right.clamp(0.0, w);
    let bottom = bottom.clamp(0.0, h);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Crop `path` by a fractional trim and save the result as PNG at `out`.
pub fn crop_to_file(path: &Path, trim: &Trim, out: &Path) -> Result<()> {
    let img = metrics::open(path)?;
    let (width, height) = img.dimensions();
    let (x, y, w, h) =
        pixel_rect(width, height, trim).ok_or_else(|| Error::EmptyCrop(trim.to_array()))?;
    debug!(x, y, w, h, "crop rectangle for {}", path.display());

    img.crop_imm(x, y, w, h)
        .save_with_format(out, image::ImageFormat::Png)
        .map_err(|source| Error::ImageWrite {
            path: out.to_path_buf(),
            source,
        })
}

/// Numbered scratch files for cropped images: `<dir>/1.png`, `<dir>/2.png`, ...
#[derive(Debug)]
pub struct CropStore {
    dir: PathBuf,
    count: usize,
    precrop: bool,
}

impl CropStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            count: 0,
            precrop: true,
        }
    }

    /// A store that never writes files; trims are left to LaTeX.
    pub fn passthrough() -> Self {
        Self {
            precrop: false,
            ..Self::default()
        }
    }

    /// Whether trims are applied to the files before LaTeX sees them.
    pub fn precrop(&self) -> bool {
        self.precrop
    }

    /// Number of crops written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Crop `path` and return the path of the new file.
    pub fn crop(&mut self, path: &Path, trim: &Trim) -> Result<PathBuf> {
        info!("cropping {}...", path.display());
        std::fs::create_dir_all(&self.dir)?;

        self.count += 1;
        let out = self.dir.join(format!("{}.png", self.count));
        crop_to_file(path, trim, &out)?;
        Ok(out)
    }
}

impl Default for CropStore {
    fn default() -> Self {
        Self::new(DEFAULT_CROP_DIR)
    }
}

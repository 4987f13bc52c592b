//! Full-reference similarity metrics: MSE, PSNR and SSIM over 8-bit samples.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// Side of the square SSIM window.
pub const SSIM_WINDOW: u32 = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
/// Dynamic range of 8-bit samples.
const DATA_RANGE: f64 = 255.0;

/// Similarity of a candidate image to its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub mse: f64,
    pub psnr: f64,
    pub ssim: f64,
}

/// Interleaved 8-bit samples with a fixed channel count.
#[derive(Debug, Clone)]
pub struct Planes {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl Planes {
    /// Convert an image to `channels` samples per pixel (1 = gray,
    /// 2 = gray + alpha, 3 = RGB, 4 = RGBA).
    pub fn from_image(img: &DynamicImage, channels: usize) -> Planes {
        let data = match channels {
            1 => img.to_luma8().into_raw(),
            2 => img.to_luma_alpha8().into_raw(),
            3 => img.to_rgb8().into_raw(),
            _ => img.to_rgba8().into_raw(),
        };
        Planes {
            width: img.width(),
            height: img.height(),
            channels: channels.min(4),
            data,
        }
    }

    /// Samples of one channel in row-major order.
    fn channel(&self, c: usize) -> impl Iterator<Item = u8> + '_ {
        self.data.iter().skip(c).step_by(self.channels).copied()
    }
}

/// Load an image from disk.
pub fn open(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Read only the image header to get `(width, height)`.
pub fn dimensions(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Check from the headers alone that every candidate matches the
/// reference's pixel size.
pub fn check_sizes<P: AsRef<Path>>(reference: &Path, candidates: &[P]) -> Result<()> {
    let expected = dimensions(reference)?;
    for c in candidates {
        let actual = dimensions(c.as_ref())?;
        if actual != expected {
            return Err(Error::SizeMismatch {
                path: c.as_ref().to_path_buf(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Smallest channel layout that holds both images without losing color or
/// alpha.
pub fn common_channels(a: &DynamicImage, b: &DynamicImage) -> usize {
    let color = a.color().has_color() || b.color().has_color();
    let alpha = a.color().has_alpha() || b.color().has_alpha();
    (if color { 3 } else { 1 }) + usize::from(alpha)
}

/// Compute MSE, PSNR and SSIM between two image files.
pub fn similarity(reference: &Path, candidate: &Path) -> Result<Similarity> {
    let reference = open(reference)?;
    similarity_to(&reference, candidate)
}

/// Compute metrics of `candidate` against an already loaded reference.
pub fn similarity_to(reference: &DynamicImage, candidate: &Path) -> Result<Similarity> {
    let img = open(candidate)?;
    if img.dimensions() != reference.dimensions() {
        return Err(Error::SizeMismatch {
            path: candidate.to_path_buf(),
            expected: reference.dimensions(),
            actual: img.dimensions(),
        });
    }

    let channels = common_channels(reference, &img);
    let a = Planes::from_image(reference, channels);
    let b = Planes::from_image(&img, channels);
    compare(&a, &b)
}

/// Metrics for every candidate, in candidate order.
pub fn similarity_all<P: AsRef<Path> + Sync>(
    reference: &Path,
    candidates: &[P],
) -> Result<Vec<Similarity>> {
    let reference = open(reference)?;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        candidates
            .par_iter()
            .map(|c| similarity_to(&reference, c.as_ref()))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        candidates
            .iter()
            .map(|c| similarity_to(&reference, c.as_ref()))
            .collect()
    }
}

/// Compare two sample buffers of identical shape.
pub fn compare(a: &Planes, b: &Planes) -> Result<Similarity> {
    let mse = mse(a, b);
    Ok(Similarity {
        mse,
        psnr: psnr(mse),
        ssim: ssim(a, b)?,
    })
}

/// Mean squared error over all samples.
pub fn mse(a: &Planes, b: &Planes) -> f64 {
    debug_assert_eq!(a.data.len(), b.data.len());
    if a.data.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum();
    sum as f64 / a.data.len() as f64
}

/// Peak signal-to-noise ratio in dB; infinite when `mse` is zero.
pub fn psnr(mse: f64) -> f64 {
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (DATA_RANGE * DATA_RANGE / mse).log10()
}

/// Mean structural similarity, averaged over channels.
///
/// Uses a uniform 7x7 window with sample covariance and averages the SSIM
/// map over the region where the window fits entirely inside the image.
pub fn ssim(a: &Planes, b: &Planes) -> Result<f64> {
    if a.width < SSIM_WINDOW || a.height < SSIM_WINDOW {
        return Err(Error::WindowTooLarge {
            width: a.width,
            height: a.height,
            window: SSIM_WINDOW,
        });
    }

    let total: f64 = (0..a.channels)
        .map(|c| {
            let x: Vec<u8> = a.channel(c).collect();
            let y: Vec<u8> = b.channel(c).collect();
            ssim_channel(&x, &y, a.width as usize, a.height as usize)
        })
        .sum();
    Ok(total / a.channels as f64)
}

/// Summed-area table with one row/column of zero padding.
struct Integral {
    stride: usize,
    sums: Vec<u64>,
}

impl Integral {
    fn new(width: usize, height: usize, value: impl Fn(usize) -> u64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0u64;
            for x in 0..width {
                row += value(y * width + x);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over `[x0, x1) x [y0, y1)`.
    fn window(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let s = &self.sums;
        let v = s[y1 * self.stride + x1] + s[y0 * self.stride + x0]
            - s[y0 * self.stride + x1]
            - s[y1 * self.stride + x0];
        v as f64
    }
}

fn ssim_channel(x: &[u8], y: &[u8], width: usize, height: usize) -> f64 {
    let win = SSIM_WINDOW as usize;
    let pad = (win - 1) / 2;
    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let sx = Integral::new(width, height, |i| x[i] as u64);
    let sy = Integral::new(width, height, |i| y[i] as u64);
    let sxx = Integral::new(width, height, |i| (x[i] as u64) * (x[i] as u64));
    let syy = Integral::new(width, height, |i| (y[i] as u64) * (y[i] as u64));
    let sxy = Integral::new(width, height, |i| (x[i] as u64) * (y[i] as u64));

    let mut total = 0.0;
    let mut count = 0usize;
    for cy in pad..height - pad {
        for cx in pad..width - pad {
            let (x0, y0) = (cx - pad, cy - pad);
            let (x1, y1) = (x0 + win, y0 + win);

            let ux = sx.window(x0, y0, x1, y1) / np;
            let uy = sy.window(x0, y0, x1, y1) / np;
            let uxx = sxx.window(x0, y0, x1, y1) / np;
            let uyy = syy.window(x0, y0, x1, y1) / np;
            let uxy = sxy.window(x0, y0, x1, y1) / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let num = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let den = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += num / den;
            count += 1;
        }
    }

    total / count as f64
}

/// A candidate's row in a metric table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMetrics {
    pub similarity: Similarity,
    /// Mean FLIP error, when FLIP statistics were available.
    pub flip_mean: Option<f64>,
}

/// Best value of each metric across a set of candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Best {
    pub mse: f64,
    pub psnr: f64,
    pub ssim: f64,
    pub flip_mean: Option<f64>,
}

impl Best {
    /// Lowest MSE, highest PSNR, highest SSIM, lowest FLIP mean.
    /// Returns `None` for an empty slice.
    pub fn of(rows: &[CandidateMetrics]) -> Option<Best> {
        let first = rows.first()?;
        let mut best = Best {
            mse: first.similarity.mse,
            psnr: first.similarity.psnr,
            ssim: first.similarity.ssim,
            flip_mean: first.flip_mean,
        };
        for row in &rows[1..] {
            let s = &row.similarity;
            if s.mse < best.mse {
                best.mse = s.mse;
            }
            if s.psnr > best.psnr {
                best.psnr = s.psnr;
            }
            if s.ssim > best.ssim {
                best.ssim = s.ssim;
            }
            if let Some(m) = row.flip_mean {
                if best.flip_mean.map_or(true, |b| m < b) {
                    best.flip_mean = Some(m);
                }
            }
        }
        Some(best)
    }
}

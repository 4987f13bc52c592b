//! Complete comparison figures built from the table layouts.

use std::path::PathBuf;

use tracing::info;

use crate::crop::CropStore;
use crate::error::{Error, Result};
use crate::flip::DiffTool;
use crate::geometry::GRID;
use crate::latex::Latex;
use crate::layout::columns::ColumnPair;
use crate::layout::{self, FigureOptions};
use crate::metrics::{self, CandidateMetrics};

/// An image with an optional column header.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub label: Option<String>,
    pub path: PathBuf,
}

impl LabeledImage {
    pub fn new(label: Option<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label,
            path: path.into(),
        }
    }

    pub fn labeled(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(Some(label.into()), path)
    }

    /// Column header; empty when unlabeled.
    pub fn header(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// A named sequence of candidate images, e.g. one per filter iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub paths: Vec<PathBuf>,
}

impl Series {
    pub fn new(label: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            paths,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    /// Reference and candidates side by side on a single row.
    OneLine {
        reference: LabeledImage,
        candidates: Vec<LabeledImage>,
    },
    /// Reference row, then one column per candidate with its FLIP image and
    /// metric table.
    VerticalFlip {
        reference: LabeledImage,
        candidates: Vec<LabeledImage>,
    },
    /// Reference row, then one row per series with candidate/FLIP pairs per
    /// iteration.
    HorizontalIterations {
        reference: LabeledImage,
        series: Vec<Series>,
    },
}

impl Figure {
    pub fn kind(&self) -> &'static str {
        match self {
            Figure::OneLine { .. } => "one-line",
            Figure::VerticalFlip { .. } => "vertical-flip",
            Figure::HorizontalIterations { .. } => "horizontal-iterations",
        }
    }

    pub fn reference(&self) -> &LabeledImage {
        match self {
            Figure::OneLine { reference, .. }
            | Figure::VerticalFlip { reference, .. }
            | Figure::HorizontalIterations { reference, .. } => reference,
        }
    }

    /// Check the inputs without touching any files.
    pub fn validate(&self, opts: &FigureOptions) -> Result<()> {
        let crop = &opts.ref_crop;
        if GRID - crop.left - crop.right <= 0.0 || GRID - crop.bottom - crop.top <= 0.0 {
            return Err(Error::InvalidFigure(format!(
                "reference crop {:?} leaves nothing visible",
                crop.to_array()
            )));
        }
        if let Some(w) = opts.ref_width {
            if !(w > 0.0 && w < 1.0) {
                return Err(Error::InvalidFigure(format!(
                    "reference width {w} must be between 0 and 1"
                )));
            }
        }

        match self {
            Figure::OneLine { .. } => Ok(()),
            Figure::VerticalFlip { candidates, .. } => {
                if candidates.is_empty() {
                    return Err(Error::InvalidFigure("no comparison images supplied".into()));
                }
                if let Some(c) = candidates.iter().find(|c| c.label.is_none()) {
                    return Err(Error::InvalidFigure(format!(
                        "comparison image {} needs a name",
                        c.path.display()
                    )));
                }
                Ok(())
            }
            Figure::HorizontalIterations { series, .. } => {
                let first = series
                    .first()
                    .ok_or_else(|| Error::InvalidFigure("no comparison images supplied".into()))?;
                if first.paths.is_empty() {
                    return Err(Error::InvalidFigure(format!(
                        "series '{}' has no images",
                        first.label
                    )));
                }
                if let Some(s) = series.iter().find(|s| s.paths.len() != first.paths.len()) {
                    return Err(Error::InvalidFigure(format!(
                        "all comparisons need the same number of images: '{}' has {}, '{}' has {}",
                        first.label,
                        first.paths.len(),
                        s.label,
                        s.paths.len()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Build the figure body. FLIP images and crops are produced on the way.
    pub fn render<D: DiffTool + ?Sized>(
        &self,
        opts: &FigureOptions,
        crops: &mut CropStore,
        diff: &mut D,
    ) -> Result<Rendered> {
        self.validate(opts)?;
        let mut out = Latex::new();
        let mut scores = Vec::new();

        match self {
            Figure::OneLine {
                reference,
                candidates,
            } => {
                let mut images = vec![reference.clone()];
                images.extend(candidates.iter().cloned());
                layout::one_line(&mut out, crops, &images, opts)?;
            }
            Figure::VerticalFlip {
                reference,
                candidates,
            } => {
                let paths: Vec<&std::path::Path> =
                    candidates.iter().map(|c| c.path.as_path()).collect();
                metrics::check_sizes(&reference.path, &paths)?;
                layout::one_line(&mut out, crops, std::slice::from_ref(reference), opts)?;

                let mut pairs = Vec::with_capacity(candidates.len());
                let mut flip_means = Vec::with_capacity(candidates.len());
                for c in candidates {
                    let flip = diff.diff(&reference.path, &c.path)?;
                    flip_means.push(flip.stats.mean);
                    pairs.push(ColumnPair {
                        candidate: c.path.clone(),
                        flip: flip.image,
                    });
                }

                let similarity = metrics::similarity_all(&reference.path, &paths)?;
                for ((c, s), flip_mean) in candidates.iter().zip(similarity).zip(flip_means) {
                    info!(
                        candidate = c.header(),
                        mse = s.mse,
                        psnr = s.psnr,
                        ssim = s.ssim,
                        flip = ?flip_mean,
                        "metrics"
                    );
                    scores.push((
                        c.header().to_string(),
                        CandidateMetrics {
                            similarity: s,
                            flip_mean,
                        },
                    ));
                }

                let headers: Vec<&str> = candidates.iter().map(LabeledImage::header).collect();
                let rows: Vec<CandidateMetrics> = scores.iter().map(|(_, m)| *m).collect();
                layout::columns(&mut out, crops, &pairs, &rows, &headers, opts)?;
            }
            Figure::HorizontalIterations { reference, series } => {
                for s in series {
                    metrics::check_sizes(&reference.path, &s.paths)?;
                }
                layout::one_line(&mut out, crops, std::slice::from_ref(reference), opts)?;

                let mut flips = Vec::with_capacity(series.len());
                for s in series {
                    let row = s
                        .paths
                        .iter()
                        .map(|p| diff.diff(&reference.path, p).map(|f| f.image))
                        .collect::<Result<Vec<_>>>()?;
                    flips.push(row);
                }

                layout::iteration_columns(&mut out, crops, series, &flips, opts)?;
            }
        }

        Ok(Rendered {
            body: out,
            metrics: scores,
        })
    }
}

/// Output of [`Figure::render`].
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: Latex,
    /// Per-candidate metrics, for figures that compute them.
    pub metrics: Vec<(String, CandidateMetrics)>,
}

/// A figure together with its layout options and destination.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureJob {
    /// `.tex` file to write.
    pub output: PathBuf,
    /// Run LaTeX on the written file.
    pub compile: bool,
    pub figure: Figure,
    pub options: FigureOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Trim;

    fn refimg() -> LabeledImage {
        LabeledImage::labeled("ref", "ref.png")
    }

    #[test]
    fn vertical_flip_needs_names() {
        let fig = Figure::VerticalFlip {
            reference: refimg(),
            candidates: vec![LabeledImage::new(None, "a.png")],
        };
        let err = fig.validate(&FigureOptions::default()).unwrap_err();
        assert!(err.to_string().contains("needs a name"));
    }

    #[test]
    fn iterations_need_series() {
        let fig = Figure::HorizontalIterations {
            reference: refimg(),
            series: vec![],
        };
        assert!(fig.validate(&FigureOptions::default()).is_err());
    }

    #[test]
    fn iterations_need_equal_lengths() {
        let fig = Figure::HorizontalIterations {
            reference: refimg(),
            series: vec![
                Series::new("a", vec!["1.png".into(), "2.png".into()]),
                Series::new("b", vec!["1.png".into()]),
            ],
        };
        let err = fig.validate(&FigureOptions::default()).unwrap_err();
        assert!(err.to_string().contains("same number of images"));
    }

    #[test]
    fn crop_must_leave_visible_area() {
        let fig = Figure::OneLine {
            reference: refimg(),
            candidates: vec![],
        };
        let opts = FigureOptions {
            ref_crop: Trim::from([5.0, 0.0, 5.0, 0.0]),
            ..FigureOptions::default()
        };
        assert!(fig.validate(&opts).is_err());
        assert!(fig.validate(&FigureOptions::default()).is_ok());
    }

    #[test]
    fn kinds() {
        let fig = Figure::OneLine {
            reference: refimg(),
            candidates: vec![],
        };
        assert_eq!(fig.kind(), "one-line");
        assert_eq!(fig.reference().header(), "ref");
    }
}

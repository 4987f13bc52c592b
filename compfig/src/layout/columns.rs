use std::path::PathBuf;

use super::FigureOptions;
use crate::crop::CropStore;
use crate::error::{Error, Result};
use crate::geometry;
use crate::latex::{self, metric_cell, Latex, BOX1_COLOR, BOX2_COLOR};
use crate::metrics::{dimensions, Best, CandidateMetrics};

/// A candidate image and its FLIP difference image.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPair {
    pub candidate: PathBuf,
    pub flip: PathBuf,
}

/// One column per candidate: candidate and FLIP squares for the first box,
/// then for the second box, then the candidate's metric table.
///
/// `metrics` is either empty or has one entry per pair.
pub fn columns(
    out: &mut Latex,
    crops: &mut CropStore,
    pairs: &[ColumnPair],
    metrics: &[CandidateMetrics],
    headers: &[&str],
    opts: &FigureOptions,
) -> Result<()> {
    let first = pairs
        .first()
        .ok_or_else(|| Error::InvalidFigure("no comparison images supplied".into()))?;
    if !metrics.is_empty() && metrics.len() != pairs.len() {
        return Err(Error::InvalidFigure(format!(
            "{} metric rows for {} columns",
            metrics.len(),
            pairs.len()
        )));
    }

    let (width, height) = dimensions(&first.candidate)?;
    let aspect = geometry::aspect(width, height);
    let box1_trim = opts.box1.trim(aspect);
    let box2_trim = opts.box2.trim(aspect);

    let n = pairs.len();
    let margin = opts.margin;
    let minipage_width = (1.0 - (n * 2) as f64 * margin) / n as f64;

    latex::begin_table(out, margin, n);
    out.push("      ").push(&headers.join(" & ")).push(r"\\");

    let best = Best::of(metrics);

    for (idx, pair) in pairs.iter().enumerate() {
        if idx > 0 {
            out.push("&");
        }
        latex::begin_minipage(out, minipage_width);

        latex::bordered_square(out, crops, &pair.candidate, &box1_trim, BOX1_COLOR)?;
        latex::bordered_square(out, crops, &pair.flip, &box1_trim, BOX1_COLOR)?;
        latex::bordered_square(out, crops, &pair.candidate, &box2_trim, BOX2_COLOR)?;
        latex::bordered_square(out, crops, &pair.flip, &box2_trim, BOX2_COLOR)?;

        match (metrics.get(idx), &best) {
            (Some(m), Some(best)) => metric_table(out, m, best),
            _ => {
                out.push(r" \vspace{")
                    .num(2.0 * margin)
                    .push(r"\textwidth}");
            }
        }

        out.push(r" \end{minipage}");
    }

    latex::end_table(out);
    Ok(())
}

fn metric_table(out: &mut Latex, m: &CandidateMetrics, best: &Best) {
    let s = &m.similarity;
    out.push(
        r"
         \vspace{0.1cm}
         \begin{tabular}{ l l }
          MSE  &  ",
    )
    .push(&metric_cell(s.mse, s.mse == best.mse))
    .push(
        r"\\
          PSNR &  ",
    )
    .push(&metric_cell(s.psnr, s.psnr == best.psnr))
    .push(
        r"\\
          SSIM &  ",
    )
    .push(&metric_cell(s.ssim, s.ssim == best.ssim));

    if let Some(mean) = m.flip_mean {
        out.push(
            r"\\
          FLIP &  ",
        )
        .push(&metric_cell(mean, Some(mean) == best.flip_mean));
    }

    out.push(
        r"
         \end{tabular}\vspace{0.9cm}",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Similarity;
    use std::path::Path;

    fn pairs(dir: &Path, n: usize) -> Vec<ColumnPair> {
        (0..n)
            .map(|i| {
                let candidate = dir.join(format!("c{i}.png"));
                let flip = dir.join(format!("f{i}.png"));
                image::RgbImage::new(30, 30).save(&candidate).unwrap();
                image::RgbImage::new(30, 30).save(&flip).unwrap();
                ColumnPair { candidate, flip }
            })
            .collect()
    }

    fn row(mse: f64, psnr: f64, ssim: f64, flip_mean: Option<f64>) -> CandidateMetrics {
        CandidateMetrics {
            similarity: Similarity { mse, psnr, ssim },
            flip_mean,
        }
    }

    #[test]
    fn highlights_best_values() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = pairs(dir.path(), 2);
        let metrics = [row(10.0, 38.131, 0.91, Some(0.2)), row(5.0, 41.1, 0.9, Some(0.1))];

        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        columns(&mut out, &mut crops, &pairs, &metrics, &["1 iter", "2 iter"], &FigureOptions::default())
            .unwrap();
        let s = out.as_str();

        assert!(s.contains(r"\begin{tabular}{cc}"));
        assert!(s.contains(r"      1 iter & 2 iter\\"));
        assert!(s.contains(r"MSE  &  10\\"));
        assert!(s.contains(r"MSE  &  \textcolor{blue}{5}\\"));
        assert!(s.contains(r"PSNR &  38.13\\"));
        assert!(s.contains(r"SSIM &  \textcolor{blue}{0.91}"));
        assert!(s.contains(r"FLIP &  \textcolor{blue}{0.1}"));
        // Four squares per column.
        assert_eq!(s.matches(r"\begin{tikzpicture}").count(), 8);
    }

    #[test]
    fn without_metrics_uses_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = pairs(dir.path(), 1);

        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        columns(&mut out, &mut crops, &pairs, &[], &[""], &FigureOptions::default()).unwrap();
        let s = out.as_str();

        assert!(!s.contains("MSE"));
        assert!(s.contains(r" \vspace{0.01\textwidth} \end{minipage}"));
    }

    #[test]
    fn mismatched_metrics_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = pairs(dir.path(), 2);
        let metrics = [row(1.0, 1.0, 1.0, None)];

        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        let err = columns(&mut out, &mut crops, &pairs, &metrics, &["a", "b"], &FigureOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFigure(_)));
    }
}

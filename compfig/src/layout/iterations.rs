use std::path::PathBuf;

use tracing::debug;

use super::FigureOptions;
use crate::crop::CropStore;
use crate::error::{Error, Result};
use crate::figure::Series;
use crate::geometry::{self, interleave};
use crate::latex::{self, Latex, BOX1_COLOR, BOX2_COLOR};
use crate::metrics::dimensions;

/// One row per series, one column pair (candidate, FLIP) per iteration.
///
/// `flips[i]` holds the difference images for `series[i]`, in the same order
/// as its paths.
pub fn iteration_columns(
    out: &mut Latex,
    crops: &mut CropStore,
    series: &[Series],
    flips: &[Vec<PathBuf>],
    opts: &FigureOptions,
) -> Result<()> {
    let first = series
        .first()
        .and_then(|s| s.paths.first())
        .ok_or_else(|| Error::InvalidFigure("no comparison images supplied".into()))?;
    if flips.len() != series.len() {
        return Err(Error::InvalidFigure(format!(
            "{} FLIP rows for {} series",
            flips.len(),
            series.len()
        )));
    }

    let (width, height) = dimensions(first)?;
    let aspect = geometry::aspect(width, height);
    let box1_trim = opts.box1.trim(aspect);
    let box2_trim = opts.box2.trim(aspect);

    let num_columns = flips[0].len() * 2;
    if num_columns == 0 {
        return Err(Error::InvalidFigure("series without iterations".into()));
    }
    let margin = opts.margin;
    let minipage_width = (0.9 - num_columns as f64 * margin) / num_columns as f64;

    latex::begin_table(out, margin, num_columns + 1);
    for i in 0..num_columns / 2 {
        out.push(r"& \multicolumn{2}{c}{iter ")
            .push(&(i + 1).to_string())
            .push("} ");
    }
    out.push(r"\\");

    for (row, flip_row) in series.iter().zip(flips) {
        out.push(r"\rotatebox[origin=c]{90}{")
            .push(&row.label)
            .push("}");

        let squares = interleave(&row.paths, flip_row);
        debug!(series = %row.label, ?squares, "iteration squares");
        for square in &squares {
            out.push("&");
            latex::begin_minipage(out, minipage_width);
            latex::bordered_square(out, crops, square, &box1_trim, BOX1_COLOR)?;
            latex::bordered_square(out, crops, square, &box2_trim, BOX2_COLOR)?;
            out.push(r" \end{minipage}");
        }

        out.push(r"\\");
    }

    latex::end_table(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(20, 20).save(&path).unwrap();
        path
    }

    #[test]
    fn interleaves_candidates_and_flips() {
        let dir = tempfile::tempdir().unwrap();
        let series = vec![
            Series::new("C+P", vec![png(dir.path(), "p1.png"), png(dir.path(), "p2.png")]),
            Series::new("C", vec![png(dir.path(), "c1.png"), png(dir.path(), "c2.png")]),
        ];
        let flips = vec![
            vec![png(dir.path(), "fp1.png"), png(dir.path(), "fp2.png")],
            vec![png(dir.path(), "fc1.png"), png(dir.path(), "fc2.png")],
        ];

        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        iteration_columns(&mut out, &mut crops, &series, &flips, &FigureOptions::default()).unwrap();
        let s = out.as_str();

        assert!(s.contains(r"\begin{tabular}{ccccc}"));
        assert!(s.contains(r"& \multicolumn{2}{c}{iter 1} & \multicolumn{2}{c}{iter 2} \\"));
        assert!(s.contains(r"\rotatebox[origin=c]{90}{C+P}"));
        assert!(s.contains(r"\rotatebox[origin=c]{90}{C}"));

        let p1 = s.find("/p1.png").unwrap();
        let fp1 = s.find("/fp1.png").unwrap();
        let p2 = s.find("/p2.png").unwrap();
        assert!(p1 < fp1 && fp1 < p2);

        // 0.9 - 4 * 0.005 over 4 columns
        assert!(s.contains(&format!(r"\begin{{minipage}}{{{}\textwidth}}", (0.9 - 4.0 * 0.005) / 4.0)));
    }

    #[test]
    fn requires_flip_row_per_series() {
        let dir = tempfile::tempdir().unwrap();
        let series = vec![Series::new("C", vec![png(dir.path(), "c1.png")])];

        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        let err = iteration_columns(&mut out, &mut crops, &series, &[], &FigureOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFigure(_)));
    }
}

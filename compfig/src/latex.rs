//! LaTeX markup fragments: included images, bordered zoom squares and
//! metric cells.

use std::path::Path;

use crate::crop::CropStore;
use crate::error::Result;
use crate::geometry::Trim;

/// Frame color of the first zoom box.
pub const BOX1_COLOR: &str = "orange";
/// Frame color of the second zoom box.
pub const BOX2_COLOR: &str = "blue";

/// Growing LaTeX source buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Latex {
    buf: String,
}

impl Latex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw markup.
    pub fn push(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Append a number in shortest round-trip form.
    pub fn num(&mut self, v: f64) -> &mut Self {
        self.buf.push_str(&v.to_string());
        self
    }

    /// Append a file path.
    pub fn path(&mut self, p: &Path) -> &mut Self {
        self.buf.push_str(&p.display().to_string());
        self
    }

    /// Append a trim as `{l\width} {b\height} {r\width} {t\height}`.
    pub fn trim(&mut self, t: &Trim) -> &mut Self {
        self.push("{")
            .num(t.left)
            .push(r"\width} {")
            .num(t.bottom)
            .push(r"\height} {")
            .num(t.right)
            .push(r"\width} {")
            .num(t.top)
            .push(r"\height}")
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

/// Emit an `\adjincludegraphics` for `path` scaled to `width` of the line.
///
/// A non-zero trim is applied by cropping the file up front when the crop
/// store does so, otherwise it is passed to LaTeX.
pub fn image(
    out: &mut Latex,
    crops: &mut CropStore,
    path: &Path,
    width: f64,
    trim: &Trim,
) -> Result<()> {
    let cropped;
    let (path, trim) = if !trim.is_zero() && crops.precrop() {
        cropped = crops.crop(path, trim)?;
        (cropped.as_path(), Trim::ZERO)
    } else {
        (path, *trim)
    };

    out.push(r"\adjincludegraphics[width=")
        .num(width)
        .push(r"\linewidth,trim={")
        .trim(&trim)
        .push("}, clip]{")
        .path(path)
        .push("}");
    Ok(())
}

/// A zoomed region of `path` framed by a thick rectangle in `color`.
pub fn bordered_square(
    out: &mut Latex,
    crops: &mut CropStore,
    path: &Path,
    trim: &Trim,
    color: &str,
) -> Result<()> {
    out.push(
        r"            \begin{tikzpicture}
              \node[anchor=south west,inner sep=0] at (0,0) {",
    );
    image(out, crops, path, 1.0, trim)?;
    out.push(
        r"};
                \draw[",
    )
    .push(color)
    .push(
        r",ultra thick] (0,0) rectangle (\linewidth, \linewidth);
            \end{tikzpicture} \vspace{0.01\textwidth}",
    );
    Ok(())
}

/// Round to two decimals, halves to even, the precision shown in metric
/// tables.
pub fn round2(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    (v * 100.0).round_ties_even() / 100.0
}

/// A metric table cell; the best value is highlighted in blue.
pub fn metric_cell(value: f64, is_best: bool) -> String {
    let value = round2(value);
    if is_best {
        format!(r"\textcolor{{blue}}{{{value}}}")
    } else {
        value.to_string()
    }
}

/// Table preamble shared by all layouts: centred, tight rows, `columns`
/// centred columns separated by `margin` of the text width.
pub fn begin_table(out: &mut Latex, margin: f64, columns: usize) {
    out.push(
        r"\begin{center}
        \bgroup
        \def\arraystretch{0.9}
        {\setlength{\tabcolsep}{",
    )
    .num(margin)
    .push(
        r"\textwidth}
        \begin{tabular}{",
    )
    .push(&"c".repeat(columns))
    .push(
        "}
    ",
    );
}

pub fn end_table(out: &mut Latex) {
    out.push(
        r"
        \end{tabular}}
        \egroup
      \end{center}
      \vspace*{-1cm}",
    );
}

/// Opening of a table cell minipage of `width` text widths.
pub fn begin_minipage(out: &mut Latex, width: f64) {
    out.push(
        r"
        \begin{minipage}{",
    )
    .num(width)
    .push(r"\textwidth}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_use_shortest_form() {
        let mut out = Latex::new();
        out.num(0.005).push(" ").num(1.0).push(" ").num(0.1 + 0.2);
        assert_eq!(out.as_str(), "0.005 1 0.30000000000000004");
    }

    #[test]
    fn image_without_trim_passes_path_through() {
        let mut out = Latex::new();
        let mut crops = CropStore::new("unused");
        image(&mut out, &mut crops, Path::new("img/a.png"), 1.0, &Trim::ZERO).unwrap();
        assert_eq!(
            out.as_str(),
            r"\adjincludegraphics[width=1\linewidth,trim={{0\width} {0\height} {0\width} {0\height}}, clip]{img/a.png}"
        );
        assert_eq!(crops.count(), 0);
    }

    #[test]
    fn image_trim_at_latex_time() {
        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        let trim = Trim::from([0.1, 0.2, 0.3, 0.4]);
        image(&mut out, &mut crops, Path::new("a.png"), 0.5, &trim).unwrap();
        assert_eq!(
            out.as_str(),
            r"\adjincludegraphics[width=0.5\linewidth,trim={{0.1\width} {0.2\height} {0.3\width} {0.4\height}}, clip]{a.png}"
        );
    }

    #[test]
    fn bordered_square_draws_frame() {
        let mut out = Latex::new();
        let mut crops = CropStore::passthrough();
        bordered_square(&mut out, &mut crops, Path::new("a.png"), &Trim::ZERO, BOX2_COLOR).unwrap();
        let s = out.as_str();
        assert!(s.starts_with(r"            \begin{tikzpicture}"));
        assert!(s.contains(r"\draw[blue,ultra thick] (0,0) rectangle (\linewidth, \linewidth);"));
        assert!(s.ends_with(r"\end{tikzpicture} \vspace{0.01\textwidth}"));
    }

    #[test]
    fn metric_cells() {
        assert_eq!(metric_cell(12.3456, false), "12.35");
        assert_eq!(metric_cell(0.5, true), r"\textcolor{blue}{0.5}");
        assert_eq!(metric_cell(f64::INFINITY, true), r"\textcolor{blue}{inf}");
        // Exact halves round to even.
        assert_eq!(metric_cell(0.125, false), "0.12");
        assert_eq!(metric_cell(0.375, false), "0.38");
    }

    #[test]
    fn table_frame() {
        let mut out = Latex::new();
        begin_table(&mut out, 0.005, 3);
        end_table(&mut out);
        let s = out.as_str();
        assert!(s.contains(r"{\setlength{\tabcolsep}{0.005\textwidth}"));
        assert!(s.contains(r"\begin{tabular}{ccc}"));
        assert!(s.trim_end().ends_with(r"\vspace*{-1cm}"));
    }
}

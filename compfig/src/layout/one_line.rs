use tracing::debug;

use super::FigureOptions;
use crate::crop::CropStore;
use crate::error::{Error, Result};
use crate::figure::LabeledImage;
use crate::geometry::{self, GridBox};
use crate::latex::{self, Latex, BOX1_COLOR, BOX2_COLOR};
use crate::metrics;

/// One table row: the full reference with both zoom boxes marked, followed
/// by a column of two zoom squares for every image in `images`.
///
/// `images[0]` is the reference and also gets its own square column.
pub fn one_line(
    out: &mut Latex,
    crops: &mut CropStore,
    images: &[LabeledImage],
    opts: &FigureOptions,
) -> Result<()> {
    let reference = images
        .first()
        .ok_or_else(|| Error::InvalidFigure("a row needs at least the reference image".into()))?;
    let (width, height) = metrics::dimensions(&reference.path)?;
    let aspect = geometry::aspect(width, height);

    // Squares are cut from the uncropped images.
    let box1_trim = opts.box1.trim(aspect);
    let box2_trim = opts.box2.trim(aspect);

    let crop = opts.ref_crop;
    let aspect = geometry::cropped_aspect(width, height, &crop);
    let box1 = opts.box1.reframe(&crop);
    let box2 = opts.box2.reframe(&crop);
    let ref_trim = crop.grid_to_fraction();
    debug!(?box1, ?box2, ?box1_trim, ?box2_trim, aspect, "reference boxes");

    let n = images.len();
    let margin = opts.margin;
    let ref_width = opts
        .ref_width
        .unwrap_or_else(|| geometry::auto_ref_width(n, aspect, margin));
    let minipage_width = (1.0 - ref_width - ((n + 1) * 2) as f64 * margin) / n as f64;

    latex::begin_table(out, margin, n + 1);
    let headers: Vec<&str> = images.iter().map(LabeledImage::header).collect();
    out.push("      & ").push(&headers.join(" & ")).push(r"\\");

    latex::begin_minipage(out, ref_width);
    out.push(
        r"
            \begin{tikzpicture}
              \node[anchor=south west,inner sep=0] (image)  at (0,0) {\adjincludegraphics[width=\linewidth,trim={",
    )
    .trim(&ref_trim)
    .push("}, clip]{")
    .path(&reference.path)
    .push(
        r"}};
              \begin{scope}[
                 x={($0.1*(image.south east)$)},
                 y={($0.1*(image.north west)$)}]
    ",
    );

    if opts.show_grid {
        out.push(r"     \draw[lightgray,step=1] (image.south west) grid (image.north east);");
    }

    draw_box(out, "          ", BOX1_COLOR, " ", &box1, aspect);
    draw_box(out, "          ", BOX2_COLOR, "   ", &box2, aspect);

    out.push(
        r"         \end{scope}
            \end{tikzpicture}
            \vspace{0.0001\textwidth}
        \end{minipage}
    ",
    );

    for image in images {
        out.push("&");
        latex::begin_minipage(out, minipage_width);
        latex::bordered_square(out, crops, &image.path, &box1_trim, BOX1_COLOR)?;
        latex::bordered_square(out, crops, &image.path, &box2_trim, BOX2_COLOR)?;
        out.push(r" \vspace{")
            .num(2.0 * margin)
            .push(r"\textwidth} \end{minipage}");
    }

    latex::end_table(out);
    Ok(())
}

fn draw_box(out: &mut Latex, indent: &str, color: &str, gap: &str, b: &GridBox, aspect: f64) {
    let (x1, y1) = b.far_corner(aspect);
    out.push(indent)
        .push(r"\draw[")
        .push(color)
        .push(",ultra thick]")
        .push(gap)
        .push("(")
        .num(b.x)
        .push(",")
        .num(b.y)
        .push(") rectangle (")
        .num(x1)
        .push(",")
        .num(y1)
        .push(");");
}
